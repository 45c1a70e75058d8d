//! Helpers for mock Kubernetes responses.

use serde_json::Value;

/// Build a Kubernetes `Status` failure body.
pub fn status_body(code: u16, reason: &str, message: &str) -> Value {
	serde_json::json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": message,
		"reason": reason,
		"code": code
	})
}

/// Increment `metadata.resourceVersion`, treating a missing or non-numeric
/// value as 0.
pub fn bump_resource_version(manifest: &mut Value) {
	let current = manifest
		.pointer("/metadata/resourceVersion")
		.and_then(Value::as_str)
		.and_then(|v| v.parse::<u64>().ok())
		.unwrap_or(0);
	manifest["metadata"]["resourceVersion"] = Value::String((current + 1).to_string());
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn resource_version_starts_at_one() {
		let mut manifest = json!({"metadata": {"name": "x"}});
		bump_resource_version(&mut manifest);
		assert_eq!(manifest["metadata"]["resourceVersion"], json!("1"));
		bump_resource_version(&mut manifest);
		assert_eq!(manifest["metadata"]["resourceVersion"], json!("2"));
	}
}
