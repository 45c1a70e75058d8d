//! Secret resource configuration.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{extend_string_entries, resolve_namespace, string_map, DeclaredResource, Identity};
use crate::config::ParseError;

/// Secret type accepted by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SecretType {
	#[default]
	#[serde(rename = "opaque", alias = "Opaque")]
	Opaque,

	#[serde(rename = "dockerconfigjson", alias = "kubernetes.io/dockerconfigjson")]
	DockerConfigJson,
}

impl SecretType {
	fn as_manifest_type(self) -> &'static str {
		match self {
			SecretType::Opaque => "Opaque",
			SecretType::DockerConfigJson => "kubernetes.io/dockerconfigjson",
		}
	}
}

/// Configuration for a Kubernetes Secret.
///
/// Each key lives in exactly one of `data` (base64-encoded values) and
/// `stringData` (plaintext values).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretConfig {
	pub name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	#[serde(default, rename = "type")]
	pub secret_type: SecretType,

	#[serde(default)]
	pub data: BTreeMap<String, String>,

	#[serde(default)]
	pub string_data: BTreeMap<String, String>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl SecretConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::Secret;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		let overlapping: Vec<String> = self
			.data
			.keys()
			.filter(|key| self.string_data.contains_key(*key))
			.cloned()
			.collect();
		if !overlapping.is_empty() {
			return Err(ParseError::OverlappingSecretKeys {
				name: self.name.clone(),
				keys: overlapping,
			});
		}

		for (key, value) in &self.data {
			if let Err(source) = STANDARD.decode(value) {
				return Err(ParseError::InvalidBase64 {
					name: self.name.clone(),
					key: key.clone(),
					source,
				});
			}
		}

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
		manifest.insert(
			"type".to_string(),
			Value::String(self.secret_type.as_manifest_type().to_string()),
		);
		if !self.data.is_empty() {
			manifest.insert("data".to_string(), string_map(&self.data));
		}
		if !self.string_data.is_empty() {
			manifest.insert("stringData".to_string(), string_map(&self.string_data));
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
