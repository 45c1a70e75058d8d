//! Application resource configuration.

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{extend_string_entries, resolve_namespace, string_map, DeclaredResource, Identity};
use crate::config::ParseError;

/// Configuration for a Konflux Application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplicationConfig {
	pub name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	#[serde(default)]
	pub display_name: Option<String>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ApplicationConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::Application;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		let mut metadata = Map::new();
		metadata.insert("name".to_string(), Value::String(self.name.clone()));
		metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
		if !self.labels.is_empty() {
			metadata.insert("labels".to_string(), string_map(&self.labels));
		}
		if !self.annotations.is_empty() {
			let mut annotations = Map::new();
			extend_string_entries(&mut annotations, &self.annotations);
			metadata.insert("annotations".to_string(), Value::Object(annotations));
		}

		let mut manifest = Map::new();
		manifest.insert(
			"apiVersion".to_string(),
			Value::String(kind.info().api_version.to_string()),
		);
		manifest.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
		manifest.insert("metadata".to_string(), Value::Object(metadata));

		let mut spec = Map::new();
		if let Some(display_name) = &self.display_name {
			spec.insert("displayName".to_string(), Value::String(display_name.clone()));
		}
		if !spec.is_empty() {
			manifest.insert("spec".to_string(), Value::Object(spec));
		}

		Ok(DeclaredResource {
			kind,
			identity: Identity::Name(self.name.clone()),
			namespace,
			manifest: Value::Object(manifest),
			references: Vec::new(),
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn builds_minimal_manifest() {
		let config = ApplicationConfig {
			name: "demo".to_string(),
			namespace: None,
			display_name: Some("Demo".to_string()),
			labels: BTreeMap::new(),
			annotations: BTreeMap::new(),
		};

		let declared = config.declare(Some("tenant")).unwrap();
		assert_eq!(declared.manifest["metadata"]["name"], json!("demo"));
		assert_eq!(declared.manifest["metadata"]["namespace"], json!("tenant"));
		assert_eq!(declared.manifest["spec"]["displayName"], json!("Demo"));
	}

	#[test]
	fn omits_empty_spec() {
		let config = ApplicationConfig {
			name: "bare".to_string(),
			namespace: Some("tenant".to_string()),
			display_name: None,
			labels: BTreeMap::new(),
			annotations: BTreeMap::new(),
		};

		let declared = config.declare(None).unwrap();
		assert!(declared.manifest.get("spec").is_none());
	}
}
