//! Ownership-preserving merge of desired payloads onto existing state.
//!
//! The merge is kind-agnostic: mappings merge key-by-key with the desired
//! side winning per key, while sequences and scalars are replaced wholesale
//! (order and identity inside sequences is caller-significant). Fields only
//! present on the existing side are kept, so a document that sets a single
//! spec field never wipes the rest of the object.

use serde_json::Value;

/// Strip server bookkeeping from an existing object before merging.
///
/// `managedFields` and `status` are owned entirely by the API server and must
/// not be echoed back in a full-payload replace. `resourceVersion`,
/// `creationTimestamp` and `uid` stay: they ride along into the replace
/// payload, and `resourceVersion` is what lets the cluster reject stale
/// writes.
pub fn sanitize_existing(existing: &Value) -> Value {
	let mut sanitized = existing.clone();
	if let Some(metadata) = sanitized.get_mut("metadata").and_then(Value::as_object_mut) {
		metadata.remove("managedFields");
	}
	if let Some(object) = sanitized.as_object_mut() {
		object.remove("status");
	}
	sanitized
}

/// Merge a desired payload over existing state.
///
/// When the result equals the (sanitized) existing state, the caller skips
/// the write entirely. Server-side defaulting can make the existing side
/// richer than anything the document ever sent; those fields are preserved
/// like any other unmanaged field. Defaults the server would only apply to a
/// payload at write time never enter the comparison, so a default applied
/// during a skipped write cannot be observed here.
pub fn merge_payload(desired: &Value, existing: &Value) -> Value {
	deep_merge(existing, desired)
}

fn deep_merge(base: &Value, overlay: &Value) -> Value {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => {
			let mut merged = base.clone();
			for (key, value) in overlay {
				let merged_value = match merged.get(key) {
					Some(existing) => deep_merge(existing, value),
					None => value.clone(),
				};
				merged.insert(key.clone(), merged_value);
			}
			Value::Object(merged)
		}
		(_, overlay) => overlay.clone(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn desired_fields_win_and_existing_fields_survive() {
		let existing = json!({"spec": {"a": 1, "b": 2}});
		let desired = json!({"spec": {"b": 3}});

		let merged = merge_payload(&desired, &existing);
		assert_eq!(merged, json!({"spec": {"a": 1, "b": 3}}));
	}

	#[test]
	fn nested_mappings_merge_key_by_key() {
		let existing = json!({
			"metadata": {
				"annotations": {"a": "1"},
				"labels": {"x": "y"}
			},
			"spec": {"field": "old"}
		});
		let desired = json!({
			"metadata": {"annotations": {"b": "2"}},
			"spec": {"field": "new"}
		});

		let merged = merge_payload(&desired, &existing);
		assert_eq!(merged["metadata"]["annotations"], json!({"a": "1", "b": "2"}));
		assert_eq!(merged["metadata"]["labels"], json!({"x": "y"}));
		assert_eq!(merged["spec"]["field"], json!("new"));
	}

	#[test]
	fn sequences_are_replaced_wholesale() {
		let existing = json!({"spec": {"applications": ["a", "b", "c"]}});
		let desired = json!({"spec": {"applications": ["c", "a"]}});

		let merged = merge_payload(&desired, &existing);
		assert_eq!(merged["spec"]["applications"], json!(["c", "a"]));
	}

	#[test]
	fn cluster_assigned_metadata_is_carried_over() {
		let existing = json!({
			"metadata": {
				"name": "demo",
				"resourceVersion": "42",
				"uid": "1234",
				"creationTimestamp": "2024-01-01T00:00:00Z"
			},
			"spec": {"displayName": "Old"}
		});
		let desired = json!({
			"metadata": {"name": "demo"},
			"spec": {"displayName": "New"}
		});

		let merged = merge_payload(&desired, &existing);
		assert_eq!(merged["metadata"]["resourceVersion"], json!("42"));
		assert_eq!(merged["metadata"]["uid"], json!("1234"));
		assert_eq!(merged["spec"]["displayName"], json!("New"));
	}

	#[test]
	fn identical_payloads_merge_to_the_existing_state() {
		let existing = json!({
			"metadata": {"name": "demo", "resourceVersion": "7"},
			"spec": {"displayName": "Same"}
		});
		let desired = json!({
			"metadata": {"name": "demo"},
			"spec": {"displayName": "Same"}
		});

		assert_eq!(merge_payload(&desired, &existing), existing);
	}

	#[test]
	fn sanitize_drops_server_bookkeeping_only() {
		let existing = json!({
			"metadata": {
				"name": "demo",
				"resourceVersion": "7",
				"managedFields": [{"manager": "kfx"}]
			},
			"spec": {"displayName": "Demo"},
			"status": {"conditions": []}
		});

		let sanitized = sanitize_existing(&existing);
		assert!(sanitized["metadata"].get("managedFields").is_none());
		assert!(sanitized.get("status").is_none());
		assert_eq!(sanitized["metadata"]["resourceVersion"], json!("7"));
	}
}
