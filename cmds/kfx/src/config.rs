//! Automation document model.
//!
//! The document is the user-authored desired state: a connection context plus
//! one sequence per managed resource kind. Everything is validated eagerly;
//! a structurally invalid document never reaches the cluster.

use k8s::ManagedKind;
use serde::Deserialize;
use thiserror::Error;

use crate::resources::{
	application::ApplicationConfig, component::ComponentConfig,
	image_repository::ImageRepositoryConfig, release::ReleaseConfig,
	release_plan::ReleasePlanConfig, release_plan_admission::ReleasePlanAdmissionConfig,
	secret::SecretConfig, DeclaredResource,
};

/// Connection context for the target cluster.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Context {
	/// Default namespace for resources that do not set their own.
	#[serde(default)]
	pub namespace: Option<String>,

	/// Path to the kubeconfig file. Defaults to the standard lookup.
	#[serde(default)]
	pub kubeconfig: Option<String>,

	/// Kubeconfig context name. Defaults to the current context.
	#[serde(default)]
	pub context: Option<String>,
}

/// The full desired-state document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Document {
	#[serde(default)]
	pub context: Context,

	#[serde(default)]
	pub secrets: Vec<SecretConfig>,

	#[serde(default)]
	pub applications: Vec<ApplicationConfig>,

	#[serde(default)]
	pub components: Vec<ComponentConfig>,

	#[serde(default)]
	pub image_repositories: Vec<ImageRepositoryConfig>,

	#[serde(default)]
	pub release_plan_admissions: Vec<ReleasePlanAdmissionConfig>,

	#[serde(default)]
	pub release_plans: Vec<ReleasePlanConfig>,

	#[serde(default)]
	pub releases: Vec<ReleaseConfig>,
}

impl Document {
	/// Parse a document from an already-loaded value.
	///
	/// The YAML (or JSON) text itself is read and decoded by the caller; the
	/// engine never touches files.
	pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
		serde_json::from_value(value).map_err(ParseError::Document)
	}

	/// Build every declared resource, resolving namespaces against the
	/// document context.
	///
	/// All structural errors surface here, before any cluster call.
	pub fn resources(&self) -> Result<Vec<DeclaredResource>, ParseError> {
		let namespace = self.context.namespace.as_deref();
		let mut declared = Vec::new();
		for secret in &self.secrets {
			declared.push(secret.declare(namespace)?);
		}
		for application in &self.applications {
			declared.push(application.declare(namespace)?);
		}
		for component in &self.components {
			declared.push(component.declare(namespace)?);
		}
		for repository in &self.image_repositories {
			declared.push(repository.declare(namespace)?);
		}
		for admission in &self.release_plan_admissions {
			declared.push(admission.declare(namespace)?);
		}
		for plan in &self.release_plans {
			declared.push(plan.declare(namespace)?);
		}
		for release in &self.releases {
			declared.push(release.declare(namespace)?);
		}
		Ok(declared)
	}
}

/// Errors for structurally invalid documents.
///
/// Fatal: reported before any cluster call is made.
#[derive(Debug, Error)]
pub enum ParseError {
	#[error("configuration document is not valid")]
	Document(#[source] serde_json::Error),

	#[error("{kind} {name}: no namespace set and the document has no context.namespace")]
	MissingNamespace { kind: ManagedKind, name: String },

	#[error("Secret {name}: keys present in both data and stringData: {}", keys.join(", "))]
	OverlappingSecretKeys { name: String, keys: Vec<String> },

	#[error("Secret {name}: data value for {key} is not valid base64")]
	InvalidBase64 {
		name: String,
		key: String,
		#[source]
		source: base64::DecodeError,
	},

	#[error("ReleasePlanAdmission {name}: applications must list at least one Application")]
	NoApplications { name: String },
}
