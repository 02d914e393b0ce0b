//! Resource access for condition checks
//!
//! Predicates never talk to the API server directly. They go through a
//! [`ResourceAccessor`], which fetches a typed object by name and namespace
//! and writes it into a caller-owned target.
//!
//! # Example
//!
//! ```ignore
//! use kube_conditions::KubeResources;
//! use k8s_openapi::api::core::v1::Pod;
//!
//! let resources = KubeResources::try_default().await?;
//! let mut pod = Pod::default();
//! resources.get_into("web-0", "default", &mut pod).await?;
//! ```

use async_trait::async_trait;
use kube::api::Api;
use kube::core::NamespaceResourceScope;
use kube::Client;
use tracing::debug;

/// Typed, namespaced Kubernetes object that predicates can fetch into
pub trait Object:
    kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + serde::de::DeserializeOwned
    + std::fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<K> Object for K where
    K: kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// Errors from fetching a resource
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("Failed to decode {kind}: {message}")]
    Decode { kind: String, message: String },

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether the resource is absent from the cluster
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    pub(crate) fn not_found<K: Object>(name: &str, namespace: &str) -> Self {
        FetchError::NotFound {
            kind: K::kind(&()).to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    fn from_kube<K: Object>(err: kube::Error, name: &str, namespace: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => Self::not_found::<K>(name, namespace),
            kube::Error::Api(resp) => FetchError::Api {
                code: resp.code,
                message: resp.message.clone(),
            },
            kube::Error::SerdeError(e) => FetchError::Decode {
                kind: K::kind(&()).to_string(),
                message: e.to_string(),
            },
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Capability to fetch a typed object into a caller-owned buffer
///
/// On success `target` is overwritten with the fetched state. On error it is
/// left as it was.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Fetch `name` in `namespace` into `target`
    async fn get_into<K: Object>(
        &self,
        name: &str,
        namespace: &str,
        target: &mut K,
    ) -> Result<(), FetchError>;
}

/// [`ResourceAccessor`] backed by a live cluster
#[derive(Clone)]
pub struct KubeResources {
    client: Client,
    namespace: String,
}

impl KubeResources {
    /// Wrap a client; `namespace` is used when a target carries none
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Build from the ambient kubeconfig or in-cluster config
    pub async fn try_default() -> Result<Self, FetchError> {
        let client = Client::try_default()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let namespace = client.default_namespace().to_string();
        Ok(Self { client, namespace })
    }

    /// Namespace used for targets without one
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ResourceAccessor for KubeResources {
    async fn get_into<K: Object>(
        &self,
        name: &str,
        namespace: &str,
        target: &mut K,
    ) -> Result<(), FetchError> {
        let namespace = if namespace.is_empty() {
            self.namespace.as_str()
        } else {
            namespace
        };
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let kind = K::kind(&());

        debug!(
            namespace = %namespace,
            name = %name,
            kind = %kind,
            "Fetching resource"
        );

        let fetched = api
            .get(name)
            .await
            .map_err(|e| FetchError::from_kube::<K>(e, name, namespace))?;
        *target = fetched;
        Ok(())
    }
}
