//! Apply command handler.
//!
//! Loads the automation document, resolves cross-resource references, and
//! create-or-updates every declared resource on the target cluster.

use std::{
	io::Write,
	path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::Args;
use tabwriter::TabWriter;
use tracing::instrument;

use crate::{
	cluster::{
		apply::ApplyEngine,
		client::ClusterConnection,
		report::ApplySummary,
		resolve::resolve,
	},
	config::Document,
};

#[derive(Args)]
pub struct ApplyArgs {
	/// Path to the automation document
	pub path: PathBuf,

	/// Override the namespace defined in the document
	#[arg(long)]
	pub namespace: Option<String>,

	/// Override the kubeconfig context
	#[arg(long)]
	pub context: Option<String>,

	/// Path to the kubeconfig file
	#[arg(long)]
	pub kubeconfig: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info")]
	pub log_level: String,
}

/// Run the apply command.
pub fn run<W: Write>(args: ApplyArgs, writer: W) -> Result<()> {
	// Create a tokio runtime for async operations
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("creating tokio runtime")?;

	runtime.block_on(run_async(args, writer))
}

#[instrument(skip_all, fields(path = %args.path.display()))]
async fn run_async<W: Write>(args: ApplyArgs, writer: W) -> Result<()> {
	let mut document = load_document(&args.path)?;
	if let Some(namespace) = args.namespace {
		document.context.namespace = Some(namespace);
	}
	if let Some(context) = args.context {
		document.context.context = Some(context);
	}
	if let Some(kubeconfig) = args.kubeconfig {
		document.context.kubeconfig = Some(kubeconfig.display().to_string());
	}

	let summary = apply_document(&document, None, writer).await?;
	if !summary.is_success() {
		anyhow::bail!("{} resource(s) failed to apply", summary.failed());
	}
	Ok(())
}

/// Load and parse an automation document from a YAML file.
pub fn load_document(path: &Path) -> Result<Document> {
	let text = std::fs::read_to_string(path)
		.with_context(|| format!("reading document {}", path.display()))?;
	let value: serde_json::Value = serde_yaml_with_quirks::from_str(&text)
		.with_context(|| format!("parsing document {}", path.display()))?;
	Ok(Document::from_value(value)?)
}

/// Apply a document to the cluster.
///
/// Parse and reference errors abort before any cluster call; per-resource
/// apply failures end up inside the returned summary. The summary is also
/// rendered to `writer`.
#[instrument(skip_all)]
pub async fn apply_document<W: Write>(
	document: &Document,
	connection: Option<ClusterConnection>,
	mut writer: W,
) -> Result<ApplySummary> {
	let resources = document.resources()?;
	let ordered = resolve(resources)?;
	tracing::debug!(resource_count = ordered.len(), "resolved apply order");

	if ordered.is_empty() {
		tracing::warn!("document declares no resources");
		writeln!(writer, "Nothing to apply.")?;
		return Ok(ApplySummary::default());
	}

	// Use the provided connection or build one from the document context.
	let connection = match connection {
		Some(connection) => connection,
		None => ClusterConnection::from_context(&document.context)
			.await
			.context("connecting to cluster")?,
	};

	let engine = ApplyEngine::new(connection.client().clone());
	let summary = engine.apply_all(&ordered).await?;
	write_summary(&summary, &mut writer)?;
	Ok(summary)
}

/// Render the per-resource table and outcome counts.
fn write_summary<W: Write>(summary: &ApplySummary, writer: W) -> Result<()> {
	let mut tw = TabWriter::new(writer);
	for result in &summary.results {
		writeln!(
			tw,
			"{}\t{}/{}\t{}",
			result.kind,
			result.namespace,
			result.name,
			result.outcome.label()
		)?;
	}
	writeln!(tw)?;
	writeln!(
		tw,
		"{} created, {} updated, {} unchanged, {} failed",
		summary.created(),
		summary.updated(),
		summary.unchanged(),
		summary.failed()
	)?;
	for result in summary.failures() {
		if let Some(failure) = result.failure() {
			writeln!(
				tw,
				"failed: {} {}/{}: {}",
				result.kind,
				result.namespace,
				result.name,
				error_chain(failure)
			)?;
		}
	}
	tw.flush()?;
	Ok(())
}

/// Format an error with its source chain on one line.
fn error_chain(error: &dyn std::error::Error) -> String {
	let mut message = error.to_string();
	let mut source = error.source();
	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());
		source = cause.source();
	}
	message
}
