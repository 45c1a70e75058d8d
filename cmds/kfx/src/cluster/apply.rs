//! Create-or-update execution against the cluster.
//!
//! Consumes the dependency-ordered resource sequence and issues, per
//! resource, at most one lookup and one write. A failure is recorded against
//! its resource and the rest of the sequence still runs; a partial apply
//! across independent resources is still useful.

use kube::{
	api::{Api, DynamicObject, PostParams},
	core::{ApiResource, GroupVersionKind},
	Client,
};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use super::{
	merge::{merge_payload, sanitize_existing},
	report::{ApplyOutcome, ApplySummary, ResourceResult},
};
use crate::resources::{DeclaredResource, Identity};
use k8s::ManagedKind;

/// Per-resource failure. Recorded in the run summary; never aborts the run.
#[derive(Debug, Error)]
pub enum ApplyFailure {
	/// Transport or auth error while fetching existing state. A missing
	/// object is not a failure; it means "create".
	#[error("looking up {kind}/{name} on the cluster")]
	LookupFailed {
		kind: ManagedKind,
		name: String,
		#[source]
		source: Box<kube::Error>,
	},

	#[error("cluster rejected {verb} of {kind}/{name}")]
	Rejected {
		verb: &'static str,
		kind: ManagedKind,
		name: String,
		#[source]
		source: Box<kube::Error>,
	},

	#[error("converting {kind}/{name} payload")]
	PayloadConversion {
		kind: ManagedKind,
		name: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Fatal engine misuse. Anything here is a bug in the executor, not a
/// problem with user input, and aborts the whole run.
#[derive(Debug, Error)]
pub enum ApplyError {
	#[error("create-only {kind} {name} must never be merged against existing state")]
	InvariantViolation { kind: ManagedKind, name: String },
}

/// Executes the ordered resource sequence, one resource at a time.
pub struct ApplyEngine {
	client: Client,
}

impl ApplyEngine {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	/// Apply every resource in order, collecting per-resource outcomes.
	///
	/// Later resources may depend on earlier ones existing on the cluster, so
	/// the sequence is strictly serial. There is no engine-internal retry: a
	/// stale-state update rejected by the cluster surfaces as that resource's
	/// failure.
	#[instrument(skip_all, fields(resource_count = resources.len()))]
	pub async fn apply_all(
		&self,
		resources: &[DeclaredResource],
	) -> Result<ApplySummary, ApplyError> {
		let mut summary = ApplySummary::default();
		for resource in resources {
			let (name, outcome) = self.apply_resource(resource).await?;
			match &outcome {
				ApplyOutcome::Failed(failure) => {
					tracing::warn!(kind = %resource.kind, name = %name, error = %failure, "apply failed");
				}
				outcome => {
					tracing::info!(kind = %resource.kind, name = %name, outcome = outcome.label(), "applied");
				}
			}
			summary.results.push(ResourceResult {
				kind: resource.kind,
				name,
				namespace: resource.namespace.clone(),
				outcome,
			});
		}
		Ok(summary)
	}

	/// Apply a single resource, returning its (possibly server-assigned)
	/// name and outcome.
	#[instrument(skip_all, fields(kind = %resource.kind, name = resource.name()))]
	async fn apply_resource(
		&self,
		resource: &DeclaredResource,
	) -> Result<(String, ApplyOutcome), ApplyError> {
		// Create-only resources have no stable name to look up; existing
		// state is never fetched for them.
		if resource.is_create_only() {
			return Ok(self.create_fresh(resource).await);
		}

		let name = match &resource.identity {
			Identity::Name(name) => name.clone(),
			Identity::GeneratePrefix(prefix) => {
				return Err(ApplyError::InvariantViolation {
					kind: resource.kind,
					name: prefix.clone(),
				});
			}
		};

		let api = self.api_for(resource);

		let existing = match api.get_opt(&name).await {
			Ok(existing) => existing,
			Err(source) => {
				let failure = ApplyFailure::LookupFailed {
					kind: resource.kind,
					name: name.clone(),
					source: Box::new(source),
				};
				return Ok((name, ApplyOutcome::Failed(failure)));
			}
		};

		let outcome = match existing {
			None => self.create(&api, resource, &name, &resource.manifest).await,
			Some(existing) => self.update(&api, resource, &name, &existing).await?,
		};
		Ok((name, outcome))
	}

	/// Create a resource that does not exist yet.
	async fn create(
		&self,
		api: &Api<DynamicObject>,
		resource: &DeclaredResource,
		name: &str,
		payload: &Value,
	) -> ApplyOutcome {
		let object: DynamicObject = match serde_json::from_value(payload.clone()) {
			Ok(object) => object,
			Err(source) => {
				return ApplyOutcome::Failed(ApplyFailure::PayloadConversion {
					kind: resource.kind,
					name: name.to_string(),
					source,
				});
			}
		};

		match api.create(&PostParams::default(), &object).await {
			Ok(_) => ApplyOutcome::Created,
			Err(source) => ApplyOutcome::Failed(ApplyFailure::Rejected {
				verb: "create",
				kind: resource.kind,
				name: name.to_string(),
				source: Box::new(source),
			}),
		}
	}

	/// Merge the desired payload over existing state; replace when they
	/// differ, report unchanged when they do not.
	async fn update(
		&self,
		api: &Api<DynamicObject>,
		resource: &DeclaredResource,
		name: &str,
		existing: &DynamicObject,
	) -> Result<ApplyOutcome, ApplyError> {
		let existing = match serde_json::to_value(existing) {
			Ok(value) => value,
			Err(source) => {
				return Ok(ApplyOutcome::Failed(ApplyFailure::PayloadConversion {
					kind: resource.kind,
					name: name.to_string(),
					source,
				}));
			}
		};

		let base = sanitize_existing(&existing);
		let merged = merge_for_update(resource, &base)?;
		if merged == base {
			// Idempotent repeat run; skip the write entirely.
			return Ok(ApplyOutcome::Unchanged);
		}

		let object: DynamicObject = match serde_json::from_value(merged) {
			Ok(object) => object,
			Err(source) => {
				return Ok(ApplyOutcome::Failed(ApplyFailure::PayloadConversion {
					kind: resource.kind,
					name: name.to_string(),
					source,
				}));
			}
		};

		// Full-payload replace: the merge already computed the complete
		// object, and the carried resourceVersion makes stale writes fail.
		match api.replace(name, &PostParams::default(), &object).await {
			Ok(_) => Ok(ApplyOutcome::Updated),
			Err(source) => Ok(ApplyOutcome::Failed(ApplyFailure::Rejected {
				verb: "update",
				kind: resource.kind,
				name: name.to_string(),
				source: Box::new(source),
			})),
		}
	}

	/// Create a generate-name resource. Every run makes a fresh object with a
	/// server-assigned name; a previous run's objects are never touched.
	async fn create_fresh(&self, resource: &DeclaredResource) -> (String, ApplyOutcome) {
		let api = self.api_for(resource);
		let prefix = resource.name().to_string();

		let object: DynamicObject = match serde_json::from_value(resource.manifest.clone()) {
			Ok(object) => object,
			Err(source) => {
				let failure = ApplyFailure::PayloadConversion {
					kind: resource.kind,
					name: prefix.clone(),
					source,
				};
				return (prefix, ApplyOutcome::Failed(failure));
			}
		};

		match api.create(&PostParams::default(), &object).await {
			Ok(created) => {
				let assigned = created.metadata.name.unwrap_or(prefix);
				(assigned, ApplyOutcome::Created)
			}
			Err(source) => {
				let failure = ApplyFailure::Rejected {
					verb: "create",
					kind: resource.kind,
					name: prefix.clone(),
					source: Box::new(source),
				};
				(prefix, ApplyOutcome::Failed(failure))
			}
		}
	}

	fn api_for(&self, resource: &DeclaredResource) -> Api<DynamicObject> {
		Api::namespaced_with(self.client.clone(), &resource.namespace, &api_resource(resource.kind))
	}
}

/// Build the dynamic `ApiResource` for a managed kind.
fn api_resource(kind: ManagedKind) -> ApiResource {
	let info = kind.info();
	let (group, version) = info.group_version();
	let gvk = GroupVersionKind::gvk(group, version, info.kind);
	ApiResource::from_gvk_with_plural(&gvk, info.plural)
}

/// Merge the desired payload for an update.
///
/// Calling this for a create-only kind is a bug: those resources have no
/// stable identity to update, and the executor must never have fetched
/// existing state for them.
fn merge_for_update(resource: &DeclaredResource, existing: &Value) -> Result<Value, ApplyError> {
	if resource.is_create_only() {
		return Err(ApplyError::InvariantViolation {
			kind: resource.kind,
			name: resource.name().to_string(),
		});
	}
	Ok(merge_payload(&resource.manifest, existing))
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use serde_json::json;

	use super::*;
	use crate::config::Document;

	#[test]
	fn merging_a_create_only_resource_is_an_invariant_violation() {
		let document = Document::from_value(json!({
			"context": {"namespace": "tenant"},
			"releases": [{
				"generateName": "demo-run-",
				"releasePlan": "demo-release",
				"snapshot": "snap-1"
			}]
		}))
		.unwrap();
		let release = document.resources().unwrap().remove(0);

		let existing = json!({"metadata": {"name": "demo-run-00001"}});
		let result = merge_for_update(&release, &existing);
		assert_matches!(
			result,
			Err(ApplyError::InvariantViolation { kind: ManagedKind::Release, name }) if name == "demo-run-"
		);
	}

	#[test]
	fn merging_a_named_resource_preserves_existing_fields() {
		let document = Document::from_value(json!({
			"context": {"namespace": "tenant"},
			"applications": [{"name": "demo", "displayName": "New"}]
		}))
		.unwrap();
		let application = document.resources().unwrap().remove(0);

		let existing = json!({
			"metadata": {"name": "demo", "namespace": "tenant", "resourceVersion": "3"},
			"spec": {"displayName": "Old", "appModelRepository": {"url": "https://git.example.com/m.git"}}
		});
		let merged = merge_for_update(&application, &existing).unwrap();
		assert_eq!(merged["spec"]["displayName"], json!("New"));
		assert_eq!(
			merged["spec"]["appModelRepository"]["url"],
			json!("https://git.example.com/m.git")
		);
		assert_eq!(merged["metadata"]["resourceVersion"], json!("3"));
	}
}
