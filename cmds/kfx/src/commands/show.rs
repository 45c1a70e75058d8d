//! Show command handler.
//!
//! Renders the resolved, dependency-ordered manifests as a YAML stream
//! without contacting any cluster. Useful for reviewing what an apply run
//! would send.

use std::{io::Write, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;

use super::apply::load_document;
use crate::cluster::resolve::resolve;

#[derive(Args)]
pub struct ShowArgs {
	/// Path to the automation document
	pub path: PathBuf,

	/// Override the namespace defined in the document
	#[arg(long)]
	pub namespace: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info")]
	pub log_level: String,
}

/// Run the show command.
pub fn run<W: Write>(args: ShowArgs, mut writer: W) -> Result<()> {
	let mut document = load_document(&args.path)?;
	if let Some(namespace) = args.namespace {
		document.context.namespace = Some(namespace);
	}

	let ordered = resolve(document.resources()?)?;
	for resource in &ordered {
		let yaml = serde_yaml_with_quirks::to_string(&resource.manifest)
			.context("rendering manifest as YAML")?;
		write!(writer, "{yaml}")?;
	}
	writer.flush()?;
	Ok(())
}
