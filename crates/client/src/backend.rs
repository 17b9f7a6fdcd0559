//! Backend trait the client hierarchy talks to, and a tracing decorator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cattlectl_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::ResourceKind;

/// Where a collection lives in the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Cluster {
        cluster_id: String,
    },
    Project {
        cluster_id: String,
        project_id: String,
    },
    Namespace {
        cluster_id: String,
        project_id: String,
        namespace_id: String,
    },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Cluster { cluster_id } => write!(f, "cluster {cluster_id}"),
            Self::Project { project_id, .. } => write!(f, "project {project_id}"),
            Self::Namespace {
                project_id,
                namespace_id,
                ..
            } => write!(f, "namespace {namespace_id} of project {project_id}"),
        }
    }
}

/// A remote object as seen by the hierarchy.
///
/// `labels` are kept apart from `body` so change detection never has to
/// look inside vendor specific payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Server assigned id; `None` until created.
    pub id: Option<String>,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub body: Value,
}

impl RemoteObject {
    /// New unsaved object. String labels found in `body.labels` are lifted
    /// into [`RemoteObject::labels`].
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        let labels = body
            .get("labels")
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: None,
            name: name.into(),
            labels,
            body,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// The four remote calls the engine needs.
///
/// Implementations must be usable behind an `Arc` from a single thread;
/// `Send + Sync` keeps handles shareable.
pub trait RancherBackend: Send + Sync {
    /// Find an object by name in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`cattlectl_core::Error::Backend`] if the call fails. A
    /// missing object is `Ok(None)`, not an error.
    fn find(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Result<Option<RemoteObject>>;

    /// Fetch an object by id.
    ///
    /// # Errors
    ///
    /// Returns [`cattlectl_core::Error::Backend`] if the call fails.
    fn get(&self, kind: ResourceKind, scope: &Scope, id: &str) -> Result<Option<RemoteObject>>;

    /// Create an object; the returned object carries its id.
    ///
    /// # Errors
    ///
    /// Returns [`cattlectl_core::Error::Backend`] if the call fails.
    fn create(&self, kind: ResourceKind, scope: &Scope, object: RemoteObject)
    -> Result<RemoteObject>;

    /// Replace an existing object; `object.id` must be set.
    ///
    /// # Errors
    ///
    /// Returns [`cattlectl_core::Error::Backend`] if the call fails.
    fn update(&self, kind: ResourceKind, scope: &Scope, object: RemoteObject)
    -> Result<RemoteObject>;
}

impl<B: RancherBackend + ?Sized> RancherBackend for Arc<B> {
    fn find(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Result<Option<RemoteObject>> {
        (**self).find(kind, scope, name)
    }

    fn get(&self, kind: ResourceKind, scope: &Scope, id: &str) -> Result<Option<RemoteObject>> {
        (**self).get(kind, scope, id)
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        (**self).create(kind, scope, object)
    }

    fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        (**self).update(kind, scope, object)
    }
}

/// A wrapper that adds tracing to a backend.
pub struct TracingBackend<B: RancherBackend> {
    inner: B,
}

impl<B: RancherBackend> TracingBackend<B> {
    pub const fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: RancherBackend> RancherBackend for TracingBackend<B> {
    fn find(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Result<Option<RemoteObject>> {
        tracing::debug!(kind = %kind, scope = %scope, name, "Finding remote object");
        let result = self.inner.find(kind, scope, name);
        if let Ok(ref found) = result {
            tracing::trace!(found = found.is_some(), "Lookup finished");
        }
        result
    }

    fn get(&self, kind: ResourceKind, scope: &Scope, id: &str) -> Result<Option<RemoteObject>> {
        tracing::debug!(kind = %kind, scope = %scope, id, "Fetching remote object");
        self.inner.get(kind, scope, id)
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        tracing::debug!(
            kind = %kind,
            scope = %scope,
            name = %object.name,
            "Creating remote object"
        );
        let result = self.inner.create(kind, scope, object);
        if let Ok(ref created) = result {
            tracing::trace!(id = ?created.id, "Remote object created");
        }
        result
    }

    fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        tracing::debug!(
            kind = %kind,
            scope = %scope,
            name = %object.name,
            id = ?object.id,
            "Updating remote object"
        );
        self.inner.update(kind, scope, object)
    }
}
