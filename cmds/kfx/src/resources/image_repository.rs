//! ImageRepository resource configuration.

use std::{collections::BTreeMap, fmt};

use k8s::ManagedKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
	extend_string_entries, resolve_namespace, DeclaredResource, Identity, Reference,
};
use crate::config::ParseError;

const UPDATE_IMAGE_ANNOTATION: &str =
	"image-controller.appstudio.redhat.com/update-component-image";

/// Repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
	#[default]
	Public,
	Private,
}

impl fmt::Display for Visibility {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Visibility::Public => write!(f, "public"),
			Visibility::Private => write!(f, "private"),
		}
	}
}

/// Notification entry for an image repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationConfig {
	/// Event that triggers the notification, for example `repo_push`.
	pub event: String,

	/// Delivery method, for example `webhook`.
	pub method: String,

	pub title: String,

	pub config: BTreeMap<String, String>,
}

impl NotificationConfig {
	fn to_value(&self) -> Value {
		let mut entry = Map::new();
		entry.insert("event".to_string(), Value::String(self.event.clone()));
		entry.insert("method".to_string(), Value::String(self.method.clone()));
		entry.insert("title".to_string(), Value::String(self.title.clone()));
		let mut config = Map::new();
		extend_string_entries(&mut config, &self.config);
		entry.insert("config".to_string(), Value::Object(config));
		Value::Object(entry)
	}
}

/// Configuration for a Konflux ImageRepository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageRepositoryConfig {
	pub name: String,

	#[serde(default)]
	pub namespace: Option<String>,

	/// Name of the owning Application.
	pub application: String,

	/// Name of the Component the repository stores images for.
	pub component: String,

	/// Repository path inside the registry.
	pub image: String,

	#[serde(default)]
	pub visibility: Visibility,

	#[serde(default)]
	pub notifications: Vec<NotificationConfig>,

	#[serde(default)]
	pub labels: BTreeMap<String, String>,

	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl ImageRepositoryConfig {
	pub(crate) fn declare(
		&self,
		default_namespace: Option<&str>,
	) -> Result<DeclaredResource, ParseError> {
		let kind = ManagedKind::ImageRepository;
		let namespace = resolve_namespace(
			self.namespace.as_deref(),
			default_namespace,
			kind,
			&self.name,
		)?;

		let mut labels = Map::new();
		labels.insert(
			"appstudio.redhat.com/application".to_string(),
			Value::String(self.application.clone()),
		);
		labels.insert(
			"appstudio.redhat.com/component".to_string(),
			Value::String(self.component.clone()),
		);
		extend_string_entries(&mut labels, &self.labels);

		let mut annotations = Map::new();
		annotations.insert(
			UPDATE_IMAGE_ANNOTATION.to_string(),
			Value::String("true".to_string()),
		);
		extend_string_entries(&mut annotations, &self.annotations);

		let mut metadata = Map::new();
		metadata.insert("name".to_string(), Value::String(self.name.clone()));
		metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
		metadata.insert("labels".to_string(), Value::Object(labels));
		metadata.insert("annotations".to_string(), Value::Object(annotations));

		let mut image = Map::new();
		image.insert("name".to_string(), Value::String(self.image.clone()));
		image.insert(
			"visibility".to_string(),
			Value::String(self.visibility.to_string()),
		);

		let mut spec = Map::new();
		spec.insert("image".to_string(), Value::Object(image));
		if !self.notifications.is_empty() {
			spec.insert(
				"notifications".to_string(),
				Value::Array(self.notifications.iter().map(NotificationConfig::to_value).collect()),
			);
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
			references: vec![
				Reference {
					field: "application",
					kind: ManagedKind::Application,
					name: self.application.clone(),
				},
				Reference {
					field: "component",
					kind: ManagedKind::Component,
					name: self.component.clone(),
				},
			],
		})
	}
}
