//! The fixed set of resource kinds managed by kfx.
//!
//! kfx touches a known set of kinds, so API coordinates are a compile-time
//! table instead of runtime discovery against the cluster.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// API coordinates for one managed resource kind.
#[derive(Debug)]
pub struct KindInfo {
	pub api_version: &'static str,
	pub kind: &'static str,
	pub plural: &'static str,
}

impl KindInfo {
	/// Split `api_version` into its group and version parts.
	///
	/// Core resources have an empty group.
	pub fn group_version(&self) -> (&'static str, &'static str) {
		match self.api_version.split_once('/') {
			Some((group, version)) => (group, version),
			None => ("", self.api_version),
		}
	}
}

static SECRET: KindInfo = KindInfo {
	api_version: "v1",
	kind: "Secret",
	plural: "secrets",
};
static APPLICATION: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "Application",
	plural: "applications",
};
static COMPONENT: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "Component",
	plural: "components",
};
static IMAGE_REPOSITORY: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "ImageRepository",
	plural: "imagerepositories",
};
static RELEASE_PLAN_ADMISSION: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "ReleasePlanAdmission",
	plural: "releaseplanadmissions",
};
static RELEASE_PLAN: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "ReleasePlan",
	plural: "releaseplans",
};
static RELEASE: KindInfo = KindInfo {
	api_version: "appstudio.redhat.com/v1alpha1",
	kind: "Release",
	plural: "releases",
};

/// A resource kind kfx knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedKind {
	Secret,
	Application,
	Component,
	ImageRepository,
	ReleasePlanAdmission,
	ReleasePlan,
	Release,
}

static KINDS: phf::Map<&'static str, ManagedKind> = phf::phf_map! {
	"Secret" => ManagedKind::Secret,
	"Application" => ManagedKind::Application,
	"Component" => ManagedKind::Component,
	"ImageRepository" => ManagedKind::ImageRepository,
	"ReleasePlanAdmission" => ManagedKind::ReleasePlanAdmission,
	"ReleasePlan" => ManagedKind::ReleasePlan,
	"Release" => ManagedKind::Release,
};

impl ManagedKind {
	/// API coordinates for this kind. All managed kinds are namespaced.
	pub const fn info(self) -> &'static KindInfo {
		match self {
			Self::Secret => &SECRET,
			Self::Application => &APPLICATION,
			Self::Component => &COMPONENT,
			Self::ImageRepository => &IMAGE_REPOSITORY,
			Self::ReleasePlanAdmission => &RELEASE_PLAN_ADMISSION,
			Self::ReleasePlan => &RELEASE_PLAN,
			Self::Release => &RELEASE,
		}
	}

	pub fn as_str(self) -> &'static str {
		self.info().kind
	}

	/// Create-only kinds have server-assigned names and are never updated.
	pub fn is_create_only(self) -> bool {
		matches!(self, Self::Release)
	}
}

impl fmt::Display for ManagedKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error for a kind string outside the managed set.
#[derive(Debug, Error)]
#[error("unknown resource kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for ManagedKind {
	type Err = UnknownKind;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		KINDS.get(s).copied().ok_or_else(|| UnknownKind(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_by_kind_string() {
		assert_eq!("Component".parse::<ManagedKind>().unwrap(), ManagedKind::Component);
		assert!("Deployment".parse::<ManagedKind>().is_err());
	}

	#[test]
	fn core_and_group_coordinates() {
		assert_eq!(ManagedKind::Secret.info().group_version(), ("", "v1"));
		assert_eq!(
			ManagedKind::Application.info().group_version(),
			("appstudio.redhat.com", "v1alpha1")
		);
	}

	#[test]
	fn only_releases_are_create_only() {
		assert!(ManagedKind::Release.is_create_only());
		assert!(!ManagedKind::ReleasePlan.is_create_only());
	}
}
