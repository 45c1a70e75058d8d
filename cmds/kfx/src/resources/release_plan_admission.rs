//! ReleasePlanAdmission resource configuration.

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{extend_string_entries, resolve_namespace, DeclaredResource, Identity, Reference};
use crate::config::ParseError;

/// Configuration for a ReleasePlanAdmission.
///
/// Admissions live in the target namespace and accept releases from an
/// origin namespace for an ordered list of Applications.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleasePlanAdmissionConfig {
	pub name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	/// Applications admitted by this admission, in order. At least one.
	pub applications: Vec<String>,

	/// Namespace releases originate from.
	pub origin: String,

	#[serde(default)]
	pub environment: Option<String>,

	#[serde(default)]
	pub pipeline_ref: Option<String>,

	#[serde(default)]
	pub service_account: Option<String>,

	#[serde(default)]
	pub policy: Option<String>,

	/// Free-form data block passed through to the release pipeline.
	#[serde(default)]
	pub data: Option<Value>,

	#[serde(default)]
	pub block_releases: bool,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ReleasePlanAdmissionConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::ReleasePlanAdmission;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		if self.applications.is_empty() {
			return Err(ParseError::NoApplications {
				name: self.name.clone(),
			});
		}

		let mut labels = Map::new();
		labels.insert(
			"release.appstudio.openshift.io/block-releases".to_string(),
			Value::String(self.block_releases.to_string()),
		);
		extend_string_entries(&mut labels, &self.labels);

		let mut metadata = Map::new();
		metadata.insert("name".to_string(), Value::String(self.name.clone()));
		metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
		metadata.insert("labels".to_string(), Value::Object(labels));
		if !self.annotations.is_empty() {
			let mut annotations = Map::new();
			extend_string_entries(&mut annotations, &self.annotations);
			metadata.insert("annotations".to_string(), Value::Object(annotations));
		}

		let mut spec = Map::new();
		spec.insert(
			"applications".to_string(),
			Value::Array(
				self.applications
					.iter()
					.map(|name| Value::String(name.clone()))
					.collect(),
			),
		);
		spec.insert("origin".to_string(), Value::String(self.origin.clone()));
		if let Some(environment) = &self.environment {
			spec.insert("environment".to_string(), Value::String(environment.clone()));
		}
		if let Some(pipeline_ref) = &self.pipeline_ref {
			spec.insert("pipelineRef".to_string(), Value::String(pipeline_ref.clone()));
		}
		if let Some(service_account) = &self.service_account {
			spec.insert(
				"serviceAccount".to_string(),
				Value::String(service_account.clone()),
			);
		}
		if let Some(policy) = &self.policy {
			spec.insert("policy".to_string(), Value::String(policy.clone()));
		}
		if let Some(data) = &self.data {
			spec.insert("data".to_string(), data.clone());
		}

		let mut manifest = Map::new();
		manifest.insert(
			"apiVersion".to_string(),
			Value::String(kind.info().api_version.to_string()),
		);
		manifest.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
		manifest.insert("metadata".to_string(), Value::Object(metadata));
		manifest.insert("spec".to_string(), Value::Object(spec));

		let references = self
			.applications
			.iter()
			.map(|application| Reference {
				field: "applications",
				kind: ManagedKind::Application,
				name: application.clone(),
			})
			.collect();

		Ok(DeclaredResource {
			kind,
			identity: Identity::Name(self.name.clone()),
			namespace,
			manifest: Value::Object(manifest),
			references,
		})
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use serde_json::json;

	use super::*;

	#[test]
	fn empty_applications_are_rejected() {
		let config: ReleasePlanAdmissionConfig = serde_json::from_value(json!({
			"name": "prod-admission",
			"applications": [],
			"origin": "tenant"
		}))
		.unwrap();

		let result = config.declare(Some("prod-tenant"));
		assert_matches!(result, Err(ParseError::NoApplications { name }) if name == "prod-admission");
	}

	#[test]
	fn every_admitted_application_is_a_reference() {
		let config: ReleasePlanAdmissionConfig = serde_json::from_value(json!({
			"name": "prod-admission",
			"applications": ["demo", "other"],
			"origin": "tenant",
			"policy": "default-policy"
		}))
		.unwrap();

		let declared = config.declare(Some("prod-tenant")).unwrap();
		assert_eq!(declared.references.len(), 2);
		assert_eq!(declared.manifest["spec"]["applications"], json!(["demo", "other"]));
		assert_eq!(declared.manifest["spec"]["origin"], json!("tenant"));
	}
}
