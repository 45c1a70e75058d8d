//! Mock Kubernetes API server for testing.
//!
//! Provides an HTTP server that can be used with kubeconfig-based
//! connections. The server holds mutable resource state, assigns names for
//! `generateName` creates, and can inject per-resource faults so tests can
//! exercise lookup and write failures.

mod helpers;
pub mod http;

pub use http::{MockCluster, RunningMockCluster};
