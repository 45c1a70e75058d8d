//! Aggregated apply results.

use k8s::ManagedKind;

use super::apply::ApplyFailure;

/// Outcome of applying one resource.
#[derive(Debug)]
pub enum ApplyOutcome {
	/// The resource did not exist and was created.
	Created,

	/// The resource existed and the merged payload differed.
	Updated,

	/// The merged payload matched the existing state; no write was issued.
	Unchanged,

	/// The lookup or write for this resource failed. Other resources are
	/// unaffected.
	Failed(ApplyFailure),
}

impl ApplyOutcome {
	pub fn label(&self) -> &'static str {
		match self {
			ApplyOutcome::Created => "created",
			ApplyOutcome::Updated => "updated",
			ApplyOutcome::Unchanged => "unchanged",
			ApplyOutcome::Failed(_) => "failed",
		}
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, ApplyOutcome::Failed(_))
	}
}

/// Result of applying one resource.
#[derive(Debug)]
pub struct ResourceResult {
	pub kind: ManagedKind,
	/// The resource name; server-assigned for generate-name resources.
	pub name: String,
	pub namespace: String,
	pub outcome: ApplyOutcome,
}

impl ResourceResult {
	pub fn failure(&self) -> Option<&ApplyFailure> {
		match &self.outcome {
			ApplyOutcome::Failed(failure) => Some(failure),
			_ => None,
		}
	}
}

/// Per-resource results for one apply run.
#[derive(Debug, Default)]
pub struct ApplySummary {
	pub results: Vec<ResourceResult>,
}

impl ApplySummary {
	pub fn created(&self) -> usize {
		self.count(|outcome| matches!(outcome, ApplyOutcome::Created))
	}

	pub fn updated(&self) -> usize {
		self.count(|outcome| matches!(outcome, ApplyOutcome::Updated))
	}

	pub fn unchanged(&self) -> usize {
		self.count(|outcome| matches!(outcome, ApplyOutcome::Unchanged))
	}

	pub fn failed(&self) -> usize {
		self.count(|outcome| outcome.is_failed())
	}

	/// Every failed resource, in apply order.
	pub fn failures(&self) -> impl Iterator<Item = &ResourceResult> {
		self.results.iter().filter(|result| result.outcome.is_failed())
	}

	/// True when no resource failed. Re-running after a partial failure is
	/// safe: already-applied resources come back unchanged or merge cleanly.
	pub fn is_success(&self) -> bool {
		self.failed() == 0
	}

	fn count(&self, predicate: impl Fn(&ApplyOutcome) -> bool) -> usize {
		self.results
			.iter()
			.filter(|result| predicate(&result.outcome))
			.count()
	}
}
