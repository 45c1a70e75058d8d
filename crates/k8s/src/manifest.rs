//! Accessors over raw manifest values.
//!
//! Manifests travel through kfx as ordered `serde_json::Value` trees; these
//! helpers read the identity fields without forcing a typed representation.

use serde_json::Value;

pub fn api_version(manifest: &Value) -> Option<&str> {
	manifest.get("apiVersion")?.as_str()
}

pub fn kind(manifest: &Value) -> Option<&str> {
	manifest.get("kind")?.as_str()
}

pub fn name(manifest: &Value) -> Option<&str> {
	manifest.pointer("/metadata/name")?.as_str()
}

pub fn generate_name(manifest: &Value) -> Option<&str> {
	manifest.pointer("/metadata/generateName")?.as_str()
}

pub fn namespace(manifest: &Value) -> Option<&str> {
	manifest.pointer("/metadata/namespace")?.as_str()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn reads_identity_fields() {
		let manifest = json!({
			"apiVersion": "appstudio.redhat.com/v1alpha1",
			"kind": "Component",
			"metadata": {"name": "api", "namespace": "tenant"}
		});
		assert_eq!(api_version(&manifest), Some("appstudio.redhat.com/v1alpha1"));
		assert_eq!(kind(&manifest), Some("Component"));
		assert_eq!(name(&manifest), Some("api"));
		assert_eq!(namespace(&manifest), Some("tenant"));
		assert_eq!(generate_name(&manifest), None);
	}

	#[test]
	fn generate_name_manifests_have_no_stable_name() {
		let manifest = json!({
			"apiVersion": "appstudio.redhat.com/v1alpha1",
			"kind": "Release",
			"metadata": {"generateName": "run-", "namespace": "tenant"}
		});
		assert_eq!(name(&manifest), None);
		assert_eq!(generate_name(&manifest), Some("run-"));
	}
}
