//! Component resource configuration.

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
	default_true, extend_string_entries, resolve_namespace, string_map, DeclaredResource,
	Identity, Reference,
};
use crate::config::ParseError;

const REQUEST_ANNOTATION: &str = "build.appstudio.openshift.io/request";
const PIPELINE_ANNOTATION: &str = "build.appstudio.openshift.io/pipeline";

/// Git source for a component build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitSource {
	pub url: String,

	#[serde(default)]
	pub revision: Option<String>,

	#[serde(default)]
	pub context: Option<String>,

	#[serde(default, alias = "dockerfileUrl")]
	pub dockerfile: Option<String>,
}

impl GitSource {
	fn to_value(&self) -> Value {
		let mut git = Map::new();
		git.insert("url".to_string(), Value::String(self.url.clone()));
		if let Some(revision) = &self.revision {
			git.insert("revision".to_string(), Value::String(revision.clone()));
		}
		if let Some(context) = &self.context {
			git.insert("context".to_string(), Value::String(context.clone()));
		}
		if let Some(dockerfile) = &self.dockerfile {
			git.insert("dockerfileUrl".to_string(), Value::String(dockerfile.clone()));
		}
		Value::Object(git)
	}
}

/// Pipeline bundle reference, serialized into the build annotation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
	pub name: String,

	#[serde(default = "default_bundle")]
	pub bundle: String,
}

fn default_bundle() -> String {
	"latest".to_string()
}

impl PipelineConfig {
	fn to_annotation(&self) -> String {
		serde_json::json!({"name": self.name, "bundle": self.bundle}).to_string()
	}
}

/// Configuration for a Konflux Component.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComponentConfig {
	pub name: String,

	/// Name of the owning Application.
	pub application: String,

	#[serde(default)]
	pub namespace: Option<String>,

	/// Spec-level component name. Defaults to `name`.
	#[serde(default)]
	pub component_name: Option<String>,

	pub git: GitSource,

	#[serde(default)]
	pub container_image: Option<String>,

	/// Request Pipelines-as-Code provisioning on create.
	#[serde(default = "default_true")]
	pub configure_pac: bool,

	#[serde(default)]
	pub pipeline: Option<PipelineConfig>,

	#[serde(default, rename = "git-provider")]
	pub git_provider: Option<String>,

	#[serde(default, rename = "git-provider-url")]
	pub git_provider_url: Option<String>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ComponentConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::Component;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		// User annotations first; configure-pac only fills the request
		// annotation when the user has not set one, while the pipeline and
		// git-provider annotations always win.
		let mut annotations = Map::new();
		extend_string_entries(&mut annotations, &self.annotations);
		if self.configure_pac {
			annotations
				.entry(REQUEST_ANNOTATION.to_string())
				.or_insert_with(|| Value::String("configure-pac".to_string()));
		}
		if let Some(pipeline) = &self.pipeline {
			annotations.insert(
				PIPELINE_ANNOTATION.to_string(),
				Value::String(pipeline.to_annotation()),
			);
		}
		if let Some(provider) = &self.git_provider {
			annotations.insert("git-provider".to_string(), Value::String(provider.clone()));
		}
		if let Some(provider_url) = &self.git_provider_url {
			annotations.insert(
				"git-provider-url".to_string(),
				Value::String(provider_url.clone()),
			);
		}

		let mut metadata = Map::new();
		metadata.insert("name".to_string(), Value::String(self.name.clone()));
		metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
		if !annotations.is_empty() {
			metadata.insert("annotations".to_string(), Value::Object(annotations));
		}
		if !self.labels.is_empty() {
			metadata.insert("labels".to_string(), string_map(&self.labels));
		}

		let mut source = Map::new();
		source.insert("git".to_string(), self.git.to_value());

		let mut spec = Map::new();
		spec.insert("application".to_string(), Value::String(self.application.clone()));
		spec.insert(
			"componentName".to_string(),
			Value::String(self.component_name.clone().unwrap_or_else(|| self.name.clone())),
		);
		spec.insert("source".to_string(), Value::Object(source));
		if let Some(image) = &self.container_image {
			spec.insert("containerImage".to_string(), Value::String(image.clone()));
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
