//! Typed configuration for the managed resource kinds.
//!
//! Each module mirrors one kind: a serde-deserializable `*Config` plus a
//! builder producing the canonical manifest payload as an ordered JSON value.
//! Builders are pure; the cluster is never consulted.

pub mod application;
pub mod component;
pub mod image_repository;
pub mod release;
pub mod release_plan;
pub mod release_plan_admission;
pub mod secret;

use std::collections::BTreeMap;

use k8s::ManagedKind;
use serde_json::{Map, Value};

use crate::config::ParseError;

/// How a declared resource is identified on the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
	/// Stable name; the resource is created or updated in place.
	Name(String),

	/// Name prefix; the cluster assigns the final name at create time, so the
	/// resource is create-only.
	GeneratePrefix(String),
}

impl Identity {
	/// The name, or the generate prefix for resources without a stable name.
	pub fn display(&self) -> &str {
		match self {
			Self::Name(name) => name,
			Self::GeneratePrefix(prefix) => prefix,
		}
	}
}

/// A cross-resource reference by target kind and name.
#[derive(Debug, Clone)]
pub struct Reference {
	/// The document field holding the reference.
	pub field: &'static str,
	pub kind: ManagedKind,
	pub name: String,
}

/// One resource declared by the document, with its payload already built.
#[derive(Debug, Clone)]
pub struct DeclaredResource {
	pub kind: ManagedKind,
	pub identity: Identity,
	pub namespace: String,
	pub manifest: Value,
	pub references: Vec<Reference>,
}

impl DeclaredResource {
	/// Create-only resources are never fetched or merged.
	pub fn is_create_only(&self) -> bool {
		self.kind.is_create_only()
	}

	pub fn name(&self) -> &str {
		self.identity.display()
	}
}

/// Resolve the namespace for a resource, preferring its own setting over the
/// document default. The cluster is never consulted for a namespace.
pub(crate) fn resolve_namespace(
	own: Option<&str>,
	default: Option<&str>,
	kind: ManagedKind,
	name: &str,
) -> Result<String, ParseError> {
	own.or(default)
		.map(str::to_string)
		.ok_or_else(|| ParseError::MissingNamespace {
			kind,
			name: name.to_string(),
		})
}

/// Copy plain string entries into a manifest mapping.
pub(crate) fn extend_string_entries(target: &mut Map<String, Value>, entries: &BTreeMap<String, String>) {
	for (key, value) in entries {
		target.insert(key.clone(), Value::String(value.clone()));
	}
}

/// Convert a string map into a manifest value.
pub(crate) fn string_map(entries: &BTreeMap<String, String>) -> Value {
	let mut map = Map::new();
	extend_string_entries(&mut map, entries);
	Value::Object(map)
}

pub(crate) fn default_true() -> bool {
	true
}
