use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::util::BrokenPipeGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cluster;
mod commands;
mod config;
mod resources;

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "kfx")]
#[command(about = "Declarative apply tool for Konflux delivery resources", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Apply an automation document to the cluster
	Apply(commands::apply::ApplyArgs),

	/// Render the manifests a document produces, without a cluster
	Show(commands::show::ShowArgs),
}

/// Initialize tracing to stderr.
fn init_logger(level: &str) {
	let level = match level.to_lowercase().as_str() {
		"trace" => "trace",
		"debug" => "debug",
		"info" => "info",
		"warn" | "warning" => "warn",
		"error" => "error",
		_ => "info",
	};

	let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

/// Extract log level from command
fn get_log_level(cmd: &Commands) -> &str {
	match cmd {
		Commands::Apply(args) => &args.log_level,
		Commands::Show(args) => &args.log_level,
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	init_logger(get_log_level(&cli.command));

	let stdout = BrokenPipeGuard::new(std::io::stdout());

	match cli.command {
		Commands::Apply(args) => commands::apply::run(args, stdout),
		Commands::Show(args) => commands::show::run(args, stdout),
	}
}
