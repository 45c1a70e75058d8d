//! HTTP mock Kubernetes server built on wiremock.
//!
//! Serves the subset of the Kubernetes API the kfx engine uses: a version
//! probe, single-resource GET, POST create (with `generateName` support) and
//! PUT replace. Paths are derived from the managed kind table, so the server
//! only has to understand manifests of kinds kfx applies.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, RwLock,
	},
};

use bon::Builder;
use k8s::{manifest, ManagedKind};
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use serde_json::Value;
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

use super::helpers::{bump_resource_version, status_body};

/// Shared mutable resource state, keyed by (collection path, name).
pub type SharedResources = Arc<RwLock<HashMap<(String, String), Value>>>;

/// A mock Kubernetes cluster exposed over HTTP.
#[derive(Builder)]
pub struct MockCluster {
	/// Initial cluster state as raw manifests.
	#[builder(default)]
	resources: Vec<Value>,
	/// Resource names whose create/update calls are rejected with 422.
	#[builder(default)]
	reject_writes: Vec<String>,
	/// Resource names whose GET fails with 500, simulating a transport-level
	/// lookup failure.
	#[builder(default)]
	fail_lookups: Vec<String>,
}

/// A running mock cluster instance.
pub struct RunningMockCluster {
	server: MockServer,
	resources: SharedResources,
}

impl MockCluster {
	/// Start the mock server with the configured state.
	pub async fn start(self) -> RunningMockCluster {
		let server = MockServer::start().await;
		debug!(uri = %server.uri(), "started mock cluster");

		let mut resources: HashMap<(String, String), Value> = HashMap::new();
		for manifest in self.resources {
			if let Some((collection, name)) = storage_key(&manifest) {
				trace!(collection = %collection, name = %name, "seeded resource");
				resources.insert((collection, name), manifest);
			}
		}
		let shared = Arc::new(RwLock::new(resources));

		mount_version(&server).await;
		mount_resources(&server, &shared, self.reject_writes, self.fail_lookups).await;

		RunningMockCluster {
			server,
			resources: shared,
		}
	}
}

/// Derive the storage key for a manifest from the managed kind table.
///
/// Manifests of unknown kinds (or without a name) are ignored.
fn storage_key(manifest: &Value) -> Option<(String, String)> {
	let kind: ManagedKind = manifest::kind(manifest)?.parse().ok()?;
	let namespace = manifest::namespace(manifest).unwrap_or("default");
	let name = manifest::name(manifest)?;
	Some((collection_path(kind, namespace), name.to_string()))
}

/// The collection URL path for a kind in a namespace.
pub fn collection_path(kind: ManagedKind, namespace: &str) -> String {
	let info = kind.info();
	let root = if info.api_version.contains('/') {
		"/apis"
	} else {
		"/api"
	};
	format!(
		"{}/{}/namespaces/{}/{}",
		root, info.api_version, namespace, info.plural
	)
}

impl RunningMockCluster {
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// Create a kubeconfig pointing at this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		self.kubeconfig_with_context("mock-context")
	}

	/// Create a kubeconfig pointing at this mock server with a custom context name.
	pub fn kubeconfig_with_context(&self, context_name: &str) -> Kubeconfig {
		let cluster_name = "mock-cluster";
		let user_name = "mock-user";

		Kubeconfig {
			clusters: vec![NamedCluster {
				name: cluster_name.to_string(),
				cluster: Some(Cluster {
					server: Some(self.uri()),
					insecure_skip_tls_verify: Some(true),
					..Default::default()
				}),
			}],
			contexts: vec![NamedContext {
				name: context_name.to_string(),
				context: Some(Context {
					cluster: cluster_name.to_string(),
					user: Some(user_name.to_string()),
					namespace: Some("default".to_string()),
					..Default::default()
				}),
			}],
			auth_infos: vec![NamedAuthInfo {
				name: user_name.to_string(),
				auth_info: Some(AuthInfo::default()),
			}],
			current_context: Some(context_name.to_string()),
			..Default::default()
		}
	}

	/// Fetch a stored resource for test assertions.
	pub fn get(&self, kind: ManagedKind, namespace: &str, name: &str) -> Option<Value> {
		self.resources
			.read()
			.unwrap()
			.get(&(collection_path(kind, namespace), name.to_string()))
			.cloned()
	}

	/// All stored resources of a kind in a namespace, ordered by name.
	pub fn list(&self, kind: ManagedKind, namespace: &str) -> Vec<Value> {
		let collection = collection_path(kind, namespace);
		let resources = self.resources.read().unwrap();
		let mut entries: Vec<(&String, &Value)> = resources
			.iter()
			.filter(|((stored_collection, _), _)| *stored_collection == collection)
			.map(|((_, name), value)| (name, value))
			.collect();
		entries.sort_by_key(|(name, _)| (*name).clone());
		entries.into_iter().map(|(_, value)| value.clone()).collect()
	}
}

async fn mount_version(server: &MockServer) {
	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"major": "1",
			"minor": "28",
			"gitVersion": "v1.28.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-01-01T00:00:00Z",
			"goVersion": "go1.21.0",
			"compiler": "gc",
			"platform": "linux/amd64"
		})))
		.mount(server)
		.await;
}

async fn mount_resources(
	server: &MockServer,
	resources: &SharedResources,
	reject_writes: Vec<String>,
	fail_lookups: Vec<String>,
) {
	let get_resources = Arc::clone(resources);
	let post_resources = Arc::clone(resources);
	let put_resources = Arc::clone(resources);
	let reject_creates = reject_writes.clone();
	let generated = Arc::new(AtomicU64::new(1));

	// Single-resource GET; 404 Status when absent.
	Mock::given(method("GET"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let (collection, name) = parse_resource_path(req.url.path());
			if fail_lookups.iter().any(|n| n == &name) {
				return ResponseTemplate::new(500).set_body_json(status_body(
					500,
					"InternalError",
					"injected lookup failure",
				));
			}
			let resources = get_resources.read().unwrap();
			match resources.get(&(collection, name)) {
				Some(resource) => ResponseTemplate::new(200).set_body_json(resource.clone()),
				None => ResponseTemplate::new(404).set_body_json(status_body(
					404,
					"NotFound",
					"not found",
				)),
			}
		})
		.mount(server)
		.await;

	// POST create; assigns names for generateName manifests and stamps
	// server-side metadata.
	Mock::given(method("POST"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let collection = req.url.path().trim_end_matches('/').to_string();
			let Ok(mut body) = serde_json::from_slice::<Value>(&req.body) else {
				return ResponseTemplate::new(400).set_body_json(status_body(
					400,
					"BadRequest",
					"request body is not valid JSON",
				));
			};

			let explicit_name = manifest::name(&body).map(str::to_string);
			let generate_prefix = manifest::generate_name(&body).map(str::to_string);
			let name = match (explicit_name, generate_prefix) {
				(Some(name), _) => name,
				(None, Some(prefix)) => {
					let suffix = generated.fetch_add(1, Ordering::SeqCst);
					let name = format!("{}{:05}", prefix, suffix);
					body["metadata"]["name"] = Value::String(name.clone());
					name
				}
				(None, None) => {
					return ResponseTemplate::new(422).set_body_json(status_body(
						422,
						"Invalid",
						"metadata.name or metadata.generateName is required",
					));
				}
			};

			if reject_creates.iter().any(|n| n == &name) {
				return ResponseTemplate::new(422).set_body_json(status_body(
					422,
					"Invalid",
					"injected create rejection",
				));
			}

			let mut resources = post_resources.write().unwrap();
			if resources.contains_key(&(collection.clone(), name.clone())) {
				return ResponseTemplate::new(409).set_body_json(status_body(
					409,
					"AlreadyExists",
					"resource already exists",
				));
			}

			body["metadata"]["uid"] = Value::String(format!("mock-uid-{name}"));
			body["metadata"]["creationTimestamp"] =
				Value::String("2024-01-01T00:00:00Z".to_string());
			bump_resource_version(&mut body);
			resources.insert((collection, name), body.clone());
			ResponseTemplate::new(201).set_body_json(body)
		})
		.mount(server)
		.await;

	// PUT replace; 404 when the resource does not exist.
	Mock::given(method("PUT"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let (collection, name) = parse_resource_path(req.url.path());
			if reject_writes.iter().any(|n| n == &name) {
				return ResponseTemplate::new(422).set_body_json(status_body(
					422,
					"Invalid",
					"injected update rejection",
				));
			}
			let Ok(mut body) = serde_json::from_slice::<Value>(&req.body) else {
				return ResponseTemplate::new(400).set_body_json(status_body(
					400,
					"BadRequest",
					"request body is not valid JSON",
				));
			};

			let mut resources = put_resources.write().unwrap();
			if !resources.contains_key(&(collection.clone(), name.clone())) {
				return ResponseTemplate::new(404).set_body_json(status_body(
					404,
					"NotFound",
					"not found",
				));
			}
			bump_resource_version(&mut body);
			resources.insert((collection, name), body.clone());
			ResponseTemplate::new(200).set_body_json(body)
		})
		.mount(server)
		.await;
}

/// Split a resource URL path into (collection path, resource name).
///
/// `/apis/appstudio.redhat.com/v1alpha1/namespaces/tenant/components/api`
/// becomes (`.../components`, `api`).
fn parse_resource_path(path: &str) -> (String, String) {
	let path = path.trim_end_matches('/');
	match path.rfind('/') {
		Some(last_slash) => (
			path[..last_slash].to_string(),
			path[last_slash + 1..].to_string(),
		),
		None => (path.to_string(), String::new()),
	}
}
