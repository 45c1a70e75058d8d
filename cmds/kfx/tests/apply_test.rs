//! Integration tests for the apply flow using a mock Kubernetes API server.
//!
//! These tests call the actual `apply_document` entrypoint with a mock
//! ClusterConnection, exercising the full flow from document parsing through
//! reference resolution to cluster writes.

use k8s::ManagedKind;
use k8s_mock::{MockCluster, RunningMockCluster};
use kfx::{
	cluster::{apply::ApplyFailure, client::ClusterConnection, report::ApplyOutcome},
	commands::apply::apply_document,
	config::{Context, Document},
};
use serde_json::json;

async fn connect(server: &RunningMockCluster) -> ClusterConnection {
	let context = Context {
		context: Some("mock-context".to_string()),
		..Context::default()
	};
	ClusterConnection::from_context_with_kubeconfig(&context, server.kubeconfig())
		.await
		.expect("failed to create connection")
}

fn document(value: serde_json::Value) -> Document {
	Document::from_value(value).expect("document should parse")
}

/// A document touching five kinds, all cross-references in-document.
fn demo_document() -> Document {
	document(json!({
		"context": {"namespace": "tenant"},
		"secrets": [{
			"name": "pull-secret",
			"type": "dockerconfigjson",
			"stringData": {".dockerconfigjson": "{}"}
		}],
		"applications": [{"name": "demo", "displayName": "Demo"}],
		"components": [{
			"name": "api",
			"application": "demo",
			"git": {"url": "https://github.com/example/api.git", "revision": "main"},
			"containerImage": "quay.io/example/api:latest"
		}],
		"imageRepositories": [{
			"name": "api-repo",
			"application": "demo",
			"component": "api",
			"image": "example/api",
			"visibility": "private"
		}],
		"releasePlans": [{
			"name": "demo-release",
			"application": "demo",
			"target": "prod-tenant"
		}]
	}))
}

#[tokio::test]
async fn first_apply_creates_and_second_is_unchanged() {
	let server = MockCluster::builder().build().start().await;
	let connection = connect(&server).await;
	let document = demo_document();

	let mut output = Vec::new();
	let first = apply_document(&document, Some(connection.clone()), &mut output)
		.await
		.expect("first apply should succeed");
	assert!(first.is_success());
	assert_eq!(first.created(), 5);

	// Dependency order: the secret first, then the application before
	// everything referencing it.
	let kinds: Vec<ManagedKind> = first.results.iter().map(|r| r.kind).collect();
	assert_eq!(
		kinds,
		vec![
			ManagedKind::Secret,
			ManagedKind::Application,
			ManagedKind::Component,
			ManagedKind::ImageRepository,
			ManagedKind::ReleasePlan,
		]
	);

	assert!(server.get(ManagedKind::Component, "tenant", "api").is_some());

	// Applying the identical document again must not issue any write.
	output.clear();
	let second = apply_document(&document, Some(connection), &mut output)
		.await
		.expect("second apply should succeed");
	assert_eq!(second.unchanged(), 5);
	assert!(second
		.results
		.iter()
		.all(|r| matches!(r.outcome, ApplyOutcome::Unchanged)));
}

#[tokio::test]
async fn update_preserves_fields_the_document_does_not_own() {
	let existing = json!({
		"apiVersion": "appstudio.redhat.com/v1alpha1",
		"kind": "Application",
		"metadata": {
			"name": "demo",
			"namespace": "tenant",
			"resourceVersion": "7",
			"uid": "1234",
			"annotations": {"operator.example.com/owned": "yes"}
		},
		"spec": {
			"displayName": "Old name",
			"appModelRepository": {"url": "https://git.example.com/model.git"}
		}
	});
	let server = MockCluster::builder()
		.resources(vec![existing])
		.build()
		.start()
		.await;
	let connection = connect(&server).await;

	let document = document(json!({
		"context": {"namespace": "tenant"},
		"applications": [{"name": "demo", "displayName": "New name"}]
	}));

	let mut output = Vec::new();
	let summary = apply_document(&document, Some(connection.clone()), &mut output)
		.await
		.expect("apply should succeed");
	assert_eq!(summary.updated(), 1);

	let stored = server
		.get(ManagedKind::Application, "tenant", "demo")
		.expect("application should still exist");
	assert_eq!(stored["spec"]["displayName"], json!("New name"));
	// Fields absent from the document survive the update.
	assert_eq!(
		stored["spec"]["appModelRepository"]["url"],
		json!("https://git.example.com/model.git")
	);
	assert_eq!(
		stored["metadata"]["annotations"]["operator.example.com/owned"],
		json!("yes")
	);
	// The replace carried the resourceVersion; the server bumped it.
	assert_eq!(stored["metadata"]["resourceVersion"], json!("8"));

	// A repeat run converges to unchanged.
	output.clear();
	let second = apply_document(&document, Some(connection), &mut output)
		.await
		.expect("second apply should succeed");
	assert_eq!(second.unchanged(), 1);
}

#[tokio::test]
async fn rejected_write_does_not_abort_later_resources() {
	let server = MockCluster::builder()
		.reject_writes(vec!["two".to_string()])
		.build()
		.start()
		.await;
	let connection = connect(&server).await;

	let document = document(json!({
		"context": {"namespace": "tenant"},
		"secrets": [
			{"name": "one", "stringData": {"a": "1"}},
			{"name": "two", "stringData": {"b": "2"}},
			{"name": "three", "stringData": {"c": "3"}}
		]
	}));

	let mut output = Vec::new();
	let summary = apply_document(&document, Some(connection), &mut output)
		.await
		.expect("apply itself should not error");

	assert!(!summary.is_success());
	assert_eq!(summary.created(), 2);
	assert_eq!(summary.failed(), 1);

	let outcomes: Vec<&str> = summary.results.iter().map(|r| r.outcome.label()).collect();
	assert_eq!(outcomes, vec!["created", "failed", "created"]);
	assert!(matches!(
		summary.results[1].outcome,
		ApplyOutcome::Failed(ApplyFailure::Rejected { verb: "create", .. })
	));

	assert!(server.get(ManagedKind::Secret, "tenant", "one").is_some());
	assert!(server.get(ManagedKind::Secret, "tenant", "two").is_none());
	assert!(server.get(ManagedKind::Secret, "tenant", "three").is_some());
}

#[tokio::test]
async fn lookup_transport_failure_is_recorded_per_resource() {
	let server = MockCluster::builder()
		.fail_lookups(vec!["demo".to_string()])
		.build()
		.start()
		.await;
	let connection = connect(&server).await;

	let document = document(json!({
		"context": {"namespace": "tenant"},
		"secrets": [{"name": "pull-secret", "stringData": {"a": "1"}}],
		"applications": [{"name": "demo"}]
	}));

	let mut output = Vec::new();
	let summary = apply_document(&document, Some(connection), &mut output)
		.await
		.expect("apply itself should not error");

	assert_eq!(summary.created(), 1);
	assert_eq!(summary.failed(), 1);
	let failed = summary.failures().next().expect("one failure");
	assert_eq!(failed.kind, ManagedKind::Application);
	assert!(matches!(
		failed.outcome,
		ApplyOutcome::Failed(ApplyFailure::LookupFailed { .. })
	));
}

#[tokio::test]
async fn releases_are_created_fresh_on_every_run() {
	let server = MockCluster::builder().build().start().await;
	let connection = connect(&server).await;

	// The plan's application reference points at a kind the document does
	// not touch, so it is assumed to exist on the cluster.
	let document = document(json!({
		"context": {"namespace": "tenant"},
		"releasePlans": [{
			"name": "demo-release",
			"application": "demo",
			"target": "prod-tenant"
		}],
		"releases": [{
			"generateName": "demo-run-",
			"releasePlan": "demo-release",
			"snapshot": "demo-snapshot-1",
			"author": "alice"
		}]
	}));

	let mut output = Vec::new();
	let first = apply_document(&document, Some(connection.clone()), &mut output)
		.await
		.expect("first apply should succeed");
	assert_eq!(first.created(), 2);

	output.clear();
	let second = apply_document(&document, Some(connection), &mut output)
		.await
		.expect("second apply should succeed");
	// The plan converges; the release is created again with a new name.
	assert_eq!(second.unchanged(), 1);
	assert_eq!(second.created(), 1);

	let releases = server.list(ManagedKind::Release, "tenant");
	assert_eq!(releases.len(), 2);
	let names: Vec<&str> = releases
		.iter()
		.filter_map(|r| r["metadata"]["name"].as_str())
		.collect();
	assert!(names.iter().all(|name| name.starts_with("demo-run-")));
	assert_ne!(names[0], names[1]);
	assert_eq!(
		releases[0]["metadata"]["labels"]["release.appstudio.openshift.io/author"],
		json!("alice")
	);
}

#[tokio::test]
async fn unresolved_references_abort_before_any_cluster_call() {
	let server = MockCluster::builder().build().start().await;
	let connection = connect(&server).await;

	let document = document(json!({
		"context": {"namespace": "tenant"},
		"applications": [{"name": "demo"}],
		"components": [{
			"name": "api",
			"application": "missing",
			"git": {"url": "https://github.com/example/api.git"}
		}]
	}));

	let mut output = Vec::new();
	let result = apply_document(&document, Some(connection), &mut output).await;
	let error = result.expect_err("resolution should fail");
	assert!(error.to_string().contains("unresolved reference"));

	// Nothing was created, not even the valid application.
	assert!(server.get(ManagedKind::Application, "tenant", "demo").is_none());
}
