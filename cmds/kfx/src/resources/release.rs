//! Release resource configuration.
//!
//! Releases have no stable name: the cluster assigns one from
//! `metadata.generateName` at create time, and the object is never updated
//! afterwards.

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{extend_string_entries, resolve_namespace, DeclaredResource, Identity, Reference};
use crate::config::ParseError;

const AUTHOR_LABEL: &str = "release.appstudio.openshift.io/author";

/// Configuration for a Release.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleaseConfig {
	/// Name prefix; the cluster appends a unique suffix.
	pub generate_name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	/// Name of the ReleasePlan driving this release.
	pub release_plan: String,

	/// Snapshot to release.
	pub snapshot: String,

	/// Recorded as the author label on the created object.
	#[serde(default)]
	pub author: Option<String>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ReleaseConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::Release;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.generate_name,
		)?;

		let mut labels = Map::new();
		if let Some(author) = &self.author {
			labels.insert(AUTHOR_LABEL.to_string(), Value::String(author.clone()));
		}
		extend_string_entries(&mut labels, &self.labels);

		let mut metadata = Map::new();
		metadata.insert(
			"generateName".to_string(),
			Value::String(self.generate_name.clone()),
		);
		metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
		if !labels.is_empty() {
			metadata.insert("labels".to_string(), Value::Object(labels));
		}
		if !self.annotations.is_empty() {
			let mut annotations = Map::new();
			extend_string_entries(&mut annotations, &self.annotations);
			metadata.insert("annotations".to_string(), Value::Object(annotations));
		}

		let mut spec = Map::new();
		spec.insert(
			"releasePlan".to_string(),
			Value::String(self.release_plan.clone()),
		);
		spec.insert("snapshot".to_string(), Value::String(self.snapshot.clone()));

		let mut manifest = Map::new();
		manifest.insert(
			"apiVersion".to_string(),
			Value::String(kind.info().api_version.to_string()),
		);
		manifest.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
		manifest.insert("metadata".to_string(), Value::Object(metadata));
		manifest.insert("spec".to_string(), Value::Object(spec));

		Ok(DeclaredResource {
			kind,
			identity: Identity::GeneratePrefix(self.generate_name.clone()),
			namespace,
			manifest: Value::Object(manifest),
			references: vec![Reference {
				field: "releasePlan",
				kind: ManagedKind::ReleasePlan,
				name: self.release_plan.clone(),
			}],
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn uses_generate_name_identity() {
		let config: ReleaseConfig = serde_json::from_value(json!({
			"generateName": "demo-run-",
			"releasePlan": "demo-release",
			"snapshot": "demo-snapshot-1",
			"author": "alice"
		}))
		.unwrap();

		let declared = config.declare(Some("tenant")).unwrap();
		assert!(declared.is_create_only());
		assert_eq!(
			declared.identity,
			Identity::GeneratePrefix("demo-run-".to_string())
		);
		assert_eq!(declared.manifest["metadata"]["generateName"], json!("demo-run-"));
		assert!(declared.manifest["metadata"].get("name").is_none());
		assert_eq!(declared.manifest["metadata"]["labels"][AUTHOR_LABEL], json!("alice"));
		assert_eq!(declared.manifest["spec"]["snapshot"], json!("demo-snapshot-1"));
	}
}
