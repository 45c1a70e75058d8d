//! ReleasePlan resource configuration.

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
	default_true, extend_string_entries, resolve_namespace, DeclaredResource, Identity, Reference,
};
use crate::config::ParseError;

/// Configuration for a ReleasePlan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleasePlanConfig {
	pub name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	/// Name of the Application the plan releases.
	pub application: String,

	/// Namespace releases are admitted into.
	pub target: String,

	#[serde(default = "default_true")]
	pub auto_release: bool,

	#[serde(default = "default_true")]
	pub standing_attribution: bool,

	/// Pin the plan to a specific ReleasePlanAdmission by name.
	#[serde(default)]
	pub release_plan_admission: Option<String>,

	#[serde(default)]
	pub pipeline_ref: Option<String>,

	#[serde(default)]
	pub service_account: Option<String>,

	#[serde(default)]
	pub release_grace_period_days: Option<i64>,

	/// Free-form data block passed through to the release pipeline.
	#[serde(default)]
	pub data: Option<Value>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ReleasePlanConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::ReleasePlan;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		let mut labels = Map::new();
		labels.insert(
			"release.appstudio.openshift.io/auto-release".to_string(),
			Value::String(self.auto_release.to_string()),
		);
		labels.insert(
			"release.appstudio.openshift.io/standing-attribution".to_string(),
			Value::String(self.standing_attribution.to_string()),
		);
		if let Some(admission) = &self.release_plan_admission {
			labels.insert(
				"release.appstudio.openshift.io/releasePlanAdmission".to_string(),
				Value::String(admission.clone()),
			);
		}
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
		spec.insert("application".to_string(), Value::String(self.application.clone()));
		spec.insert("target".to_string(), Value::String(self.target.clone()));
		if let Some(pipeline_ref) = &self.pipeline_ref {
			spec.insert("pipelineRef".to_string(), Value::String(pipeline_ref.clone()));
		}
		if let Some(service_account) = &self.service_account {
			spec.insert(
				"serviceAccount".to_string(),
				Value::String(service_account.clone()),
			);
		}
		if let Some(days) = self.release_grace_period_days {
			spec.insert("releaseGracePeriodDays".to_string(), Value::from(days));
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

		Ok(DeclaredResource {
			kind,
			identity: Identity::Name(self.name.clone()),
			namespace,
			manifest: Value::Object(manifest),
			references: vec![Reference {
				field: "application",
				kind: ManagedKind::Application,
				name: self.application.clone(),
			}],
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn release_toggles_become_labels() {
		let config: ReleasePlanConfig = serde_json::from_value(json!({
			"name": "demo-release",
			"application": "demo",
			"target": "prod-tenant",
			"autoRelease": false
		}))
		.unwrap();

		let declared = config.declare(Some("tenant")).unwrap();
		let labels = &declared.manifest["metadata"]["labels"];
		assert_eq!(labels["release.appstudio.openshift.io/auto-release"], json!("false"));
		assert_eq!(
			labels["release.appstudio.openshift.io/standing-attribution"],
			json!("true")
		);
		assert_eq!(declared.manifest["spec"]["target"], json!("prod-tenant"));
	}
}
