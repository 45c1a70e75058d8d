//! Kubernetes cluster connection management.

use std::time::Duration;

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::{
	config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
	Client, Config,
};
use thiserror::Error;
use tracing::instrument;

use crate::config::Context;

/// Default timeout for Kubernetes API requests.
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when connecting to a Kubernetes cluster.
#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error("no context named `{0}` was found. Please check your kubeconfig")]
	ContextNotFound(String),

	#[error(transparent)]
	Kubeconfig(#[from] KubeconfigError),

	#[error(transparent)]
	Kube(#[from] kube::Error),
}

/// Represents a connection to a Kubernetes cluster.
///
/// Encapsulates the kube client and server metadata resolved from the
/// document context.
#[derive(Clone)]
pub struct ClusterConnection {
	client: Client,
	server_version: Info,
	/// Human-readable identifier for the cluster (context name).
	cluster_identifier: String,
}

impl std::fmt::Debug for ClusterConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClusterConnection")
			.field("cluster_identifier", &self.cluster_identifier)
			.field("server_version", &self.server_version)
			.finish_non_exhaustive()
	}
}

impl ClusterConnection {
	/// Connect to the cluster named by the document context.
	///
	/// The kubeconfig is read from `context.kubeconfig` when set, otherwise
	/// from the standard lookup. `context.context` selects the kubeconfig
	/// context; without it the current context is used.
	#[instrument(skip_all)]
	pub async fn from_context(context: &Context) -> Result<Self, ConnectionError> {
		let kubeconfig = match &context.kubeconfig {
			Some(path) => Kubeconfig::read_from(path)?,
			None => Kubeconfig::read()?,
		};
		Self::from_context_with_kubeconfig(context, kubeconfig).await
	}

	/// Connect using an already-loaded kubeconfig.
	#[instrument(skip_all)]
	pub async fn from_context_with_kubeconfig(
		context: &Context,
		kubeconfig: Kubeconfig,
	) -> Result<Self, ConnectionError> {
		if let Some(requested) = &context.context {
			if !kubeconfig.contexts.iter().any(|c| &c.name == requested) {
				return Err(ConnectionError::ContextNotFound(requested.clone()));
			}
		}

		let cluster_identifier = match &context.context {
			Some(name) => format!("context:{name}"),
			None => "current-context".to_string(),
		};

		let options = KubeConfigOptions {
			context: context.context.clone(),
			..Default::default()
		};
		let mut config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
		config.read_timeout = Some(DEFAULT_API_TIMEOUT);
		let client = Client::try_from(config)?;

		// One round trip up front; a bad connection fails here instead of on
		// the first resource.
		let server_version = client.apiserver_version().await?;
		tracing::debug!(
			cluster = %cluster_identifier,
			version = %format!("{}.{}", server_version.major, server_version.minor),
			"connected to cluster"
		);

		Ok(Self {
			client,
			server_version,
			cluster_identifier,
		})
	}

	/// Get a reference to the underlying kube client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// Get the server version.
	pub fn server_version(&self) -> &Info {
		&self.server_version
	}

	/// Get the default namespace from the selected context.
	pub fn default_namespace(&self) -> &str {
		self.client.default_namespace()
	}

	/// Get the cluster identifier.
	pub fn cluster_identifier(&self) -> &str {
		&self.cluster_identifier
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[tokio::test]
	async fn test_connect_context_not_found() {
		let context = Context {
			context: Some("nonexistent".to_string()),
			..Context::default()
		};
		let kubeconfig = Kubeconfig::default();

		let result = ClusterConnection::from_context_with_kubeconfig(&context, kubeconfig).await;
		assert_matches!(
			result,
			Err(ConnectionError::ContextNotFound(name)) if name == "nonexistent"
		);
	}

	#[tokio::test]
	async fn test_connect_empty_kubeconfig_errors() {
		let context = Context::default();
		let kubeconfig = Kubeconfig::default();

		let result = ClusterConnection::from_context_with_kubeconfig(&context, kubeconfig).await;
		assert_matches!(result, Err(ConnectionError::Kubeconfig(_)));
	}
}
