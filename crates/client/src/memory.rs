//! In-memory backend for tests and offline dry runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use cattlectl_core::{Error, Result};
use parking_lot::{Mutex, RwLock};

use crate::backend::{RancherBackend, RemoteObject, Scope};
use crate::kind::ResourceKind;

/// Which backend method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    Find,
    Get,
    Create,
    Update,
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: BackendOperation,
    pub kind: ResourceKind,
    /// Name for finds and writes, id for gets.
    pub target: String,
}

type Collection = Vec<RemoteObject>;

/// Backend keeping every object in memory and recording every call.
///
/// Ids follow the remote API's shape: clusters are `c-N`, projects
/// `<cluster>:p-N`, namespaces use their name, everything else
/// `<collection>-N`.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<BTreeMap<(ResourceKind, Scope), Collection>>,
    calls: Mutex<Vec<BackendCall>>,
    next_id: Mutex<u64>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a cluster and return its id. Not recorded as a call.
    pub fn add_cluster(&self, name: &str) -> String {
        self.seed(
            ResourceKind::Cluster,
            &Scope::Global,
            RemoteObject::new(name, serde_json::json!({ "name": name })),
        )
    }

    /// Store an object without recording a call and return its id.
    pub fn seed(&self, kind: ResourceKind, scope: &Scope, object: RemoteObject) -> String {
        let id = object.id.clone().unwrap_or_else(|| self.allocate_id(kind, scope, &object.name));
        self.collections
            .write()
            .entry((kind, scope.clone()))
            .or_default()
            .push(object.with_id(id.clone()));
        id
    }

    /// Look at a stored object without recording a call.
    pub fn object(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Option<RemoteObject> {
        self.collections
            .read()
            .get(&(kind, scope.clone()))
            .and_then(|objects| objects.iter().find(|o| o.name == name).cloned())
    }

    /// Every object of `kind`, in any scope.
    pub fn objects_of(&self, kind: ResourceKind) -> Vec<RemoteObject> {
        self.collections
            .read()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .flat_map(|(_, objects)| objects.iter().cloned())
            .collect()
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls matching `operation` and `kind`.
    pub fn count(&self, operation: BackendOperation, kind: ResourceKind) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.operation == operation && call.kind == kind)
            .count()
    }

    /// Number of recorded writes (creates and updates).
    pub fn write_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                matches!(
                    call.operation,
                    BackendOperation::Create | BackendOperation::Update
                )
            })
            .count()
    }

    fn record(&self, operation: BackendOperation, kind: ResourceKind, target: &str) {
        self.calls.lock().push(BackendCall {
            operation,
            kind,
            target: target.to_string(),
        });
    }

    fn allocate_id(&self, kind: ResourceKind, scope: &Scope, name: &str) -> String {
        let n = {
            let mut next = self.next_id.lock();
            *next = next.saturating_add(1);
            *next
        };
        match (kind, scope) {
            (ResourceKind::Cluster, _) => format!("c-{n}"),
            (ResourceKind::Project, Scope::Cluster { cluster_id }) => format!("{cluster_id}:p-{n}"),
            (ResourceKind::Namespace, _) => name.to_string(),
            _ => format!("{}-{n}", kind.collection()),
        }
    }
}

impl RancherBackend for InMemoryBackend {
    fn find(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Result<Option<RemoteObject>> {
        self.record(BackendOperation::Find, kind, name);
        Ok(self.object(kind, scope, name))
    }

    fn get(&self, kind: ResourceKind, scope: &Scope, id: &str) -> Result<Option<RemoteObject>> {
        self.record(BackendOperation::Get, kind, id);
        Ok(self
            .collections
            .read()
            .get(&(kind, scope.clone()))
            .and_then(|objects| objects.iter().find(|o| o.id.as_deref() == Some(id)).cloned()))
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        self.record(BackendOperation::Create, kind, &object.name);
        if self.object(kind, scope, &object.name).is_some() {
            return Err(Error::backend(
                "create",
                format!("{kind} '{}' already exists in {scope}", object.name),
            ));
        }

        let id = self.allocate_id(kind, scope, &object.name);
        let created = object.with_id(id);
        self.collections
            .write()
            .entry((kind, scope.clone()))
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        self.record(BackendOperation::Update, kind, &object.name);
        let id = object
            .id
            .clone()
            .ok_or_else(|| {
                Error::backend("update", format!("{kind} '{}' has no id", object.name))
            })?;

        let mut collections = self.collections.write();
        let slot = collections
            .get_mut(&(kind, scope.clone()))
            .and_then(|objects| {
                objects
                    .iter_mut()
                    .find(|o| o.id.as_deref() == Some(id.as_str()))
            })
            .ok_or_else(|| {
                Error::backend("update", format!("{kind} '{id}' does not exist in {scope}"))
            })?;
        *slot = object.clone();
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_then_find() -> Result<()> {
        let backend = InMemoryBackend::new();
        let cluster_id = backend.add_cluster("local");
        let scope = Scope::Cluster {
            cluster_id: cluster_id.clone(),
        };

        let created = backend.create(
            ResourceKind::Project,
            &scope,
            RemoteObject::new("demo", json!({"name": "demo"})),
        )?;
        assert!(
            created
                .id
                .as_deref()
                .is_some_and(|id| id.starts_with(&format!("{cluster_id}:p-")))
        );

        let found = backend.find(ResourceKind::Project, &scope, "demo")?;
        assert_eq!(found, Some(created));
        assert_eq!(backend.count(BackendOperation::Find, ResourceKind::Project), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_create_is_rejected() -> Result<()> {
        let backend = InMemoryBackend::new();
        let object = RemoteObject::new("library", json!({}));
        backend.create(ResourceKind::Catalog, &Scope::Global, object.clone())?;
        assert!(backend.create(ResourceKind::Catalog, &Scope::Global, object).is_err());
        Ok(())
    }

    #[test]
    fn test_update_requires_existing_id() {
        let backend = InMemoryBackend::new();
        let object = RemoteObject::new("library", json!({})).with_id("catalogs-9");
        assert!(backend.update(ResourceKind::Catalog, &Scope::Global, object).is_err());
    }

    #[test]
    fn test_seeding_is_not_recorded() {
        let backend = InMemoryBackend::new();
        backend.add_cluster("local");
        assert!(backend.calls().is_empty());
        assert_eq!(backend.objects_of(ResourceKind::Cluster).len(), 1);
    }
}
