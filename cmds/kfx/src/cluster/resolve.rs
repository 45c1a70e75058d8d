//! Cross-resource reference validation and dependency ordering.
//!
//! References are names, not object identities, so they are resolved in one
//! explicit pass over the declared resource list before any mutation begins.
//! Every dangling reference is collected so the user sees all problems at
//! once, not just the first.

use std::{
	collections::{HashMap, HashSet},
	fmt,
};

use k8s::ManagedKind;
use thiserror::Error;

use crate::resources::{DeclaredResource, Identity};

/// A reference that names a resource absent from the document.
#[derive(Debug, Clone, Error)]
#[error("{referrer_kind} {referrer}: {field} references {target_kind} {target}, which is not declared")]
pub struct UnresolvedReference {
	pub referrer_kind: ManagedKind,
	pub referrer: String,
	pub field: &'static str,
	pub target_kind: ManagedKind,
	pub target: String,
}

/// Resolution failure carrying every dangling reference found in one pass.
#[derive(Debug)]
pub struct ResolveError {
	pub unresolved: Vec<UnresolvedReference>,
}

impl fmt::Display for ResolveError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{} unresolved reference(s):", self.unresolved.len())?;
		for reference in &self.unresolved {
			writeln!(f, "  {reference}")?;
		}
		Ok(())
	}
}

impl std::error::Error for ResolveError {}

/// Apply order for a kind.
///
/// A total order consistent with the reference partial order: referenced
/// kinds apply before their referrers. Secrets go first so credentials exist
/// before anything that needs them.
const fn apply_rank(kind: ManagedKind) -> u8 {
	match kind {
		ManagedKind::Secret => 0,
		ManagedKind::Application => 1,
		ManagedKind::Component => 2,
		ManagedKind::ImageRepository => 3,
		ManagedKind::ReleasePlanAdmission => 4,
		ManagedKind::ReleasePlan => 5,
		ManagedKind::Release => 6,
	}
}

/// Validate every reference and produce the dependency-ordered sequence.
///
/// A reference into a kind of which the document declares no instances is
/// assumed to exist on the cluster already; declaring any instance of a kind
/// makes in-document resolution mandatory for that kind. The sort is stable,
/// so declaration order is kept within a kind and repeat runs apply in a
/// reproducible order.
pub fn resolve(resources: Vec<DeclaredResource>) -> Result<Vec<DeclaredResource>, ResolveError> {
	let mut declared: HashMap<ManagedKind, HashSet<&str>> = HashMap::new();
	for resource in &resources {
		if let Identity::Name(name) = &resource.identity {
			declared.entry(resource.kind).or_default().insert(name);
		}
	}

	let mut unresolved = Vec::new();
	for resource in &resources {
		for reference in &resource.references {
			match declared.get(&reference.kind) {
				// The document does not touch this kind at all; the target is
				// taken to pre-exist on the cluster.
				None => {}
				Some(names) if names.contains(reference.name.as_str()) => {}
				Some(_) => unresolved.push(UnresolvedReference {
					referrer_kind: resource.kind,
					referrer: resource.name().to_string(),
					field: reference.field,
					target_kind: reference.kind,
					target: reference.name.clone(),
				}),
			}
		}
	}

	if !unresolved.is_empty() {
		return Err(ResolveError { unresolved });
	}

	let mut ordered = resources;
	ordered.sort_by_key(|resource| apply_rank(resource.kind));
	Ok(ordered)
}
