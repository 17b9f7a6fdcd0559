//! Cluster level of the hierarchy.

use std::sync::Arc;

use cattlectl_descriptor::{Catalog, PersistentVolume, StorageClass};

use crate::backend::{RancherBackend, Scope};
use crate::cache::HandleCache;
use crate::kind::ResourceKind;
use crate::project::{ProjectClient, ProjectScope};
use crate::resource::{ClientOptions, Placement, Resource};

/// Identity of an existing cluster, shared with every handle below it.
pub(crate) struct ClusterScope {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) backend: Arc<dyn RancherBackend>,
    pub(crate) options: ClientOptions,
}

impl ClusterScope {
    pub(crate) fn scope(&self) -> Scope {
        Scope::Cluster {
            cluster_id: self.id.clone(),
        }
    }
}

/// An existing cluster. Clusters are looked up, never created.
pub struct ClusterClient {
    scope: Arc<ClusterScope>,
    projects: HandleCache<String, ProjectClient>,
    storage_classes: HandleCache<String, Resource<StorageClass>>,
    persistent_volumes: HandleCache<String, Resource<PersistentVolume>>,
    catalogs: HandleCache<String, Resource<Catalog>>,
}

impl ClusterClient {
    pub(crate) fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        backend: Arc<dyn RancherBackend>,
        options: ClientOptions,
    ) -> Self {
        Self {
            scope: Arc::new(ClusterScope {
                id: id.into(),
                name: name.into(),
                backend,
                options,
            }),
            projects: HandleCache::default(),
            storage_classes: HandleCache::default(),
            persistent_volumes: HandleCache::default(),
            catalogs: HandleCache::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.scope.id
    }

    pub fn name(&self) -> &str {
        &self.scope.name
    }

    /// Project handle; the project is looked up lazily.
    pub fn project(&self, name: &str) -> Arc<ProjectClient> {
        self.projects.get_or_insert_with(name.to_string(), || {
            ProjectClient::new(Arc::new(ProjectScope::new(Arc::clone(&self.scope), name)))
        })
    }

    pub fn storage_class(&self, name: &str) -> Arc<Resource<StorageClass>> {
        self.storage_classes
            .get_or_insert_with(name.to_string(), || self.leaf(ResourceKind::StorageClass, name))
    }

    pub fn persistent_volume(&self, name: &str) -> Arc<Resource<PersistentVolume>> {
        self.persistent_volumes.get_or_insert_with(name.to_string(), || {
            self.leaf(ResourceKind::PersistentVolume, name)
        })
    }

    /// Cluster scoped catalog.
    pub fn catalog(&self, name: &str) -> Arc<Resource<Catalog>> {
        self.catalogs
            .get_or_insert_with(name.to_string(), || self.leaf(ResourceKind::Catalog, name))
    }

    fn leaf<P: crate::resource::Payload>(&self, kind: ResourceKind, name: &str) -> Resource<P> {
        Resource::new(
            kind,
            name,
            Placement::Cluster(Arc::clone(&self.scope)),
            Arc::clone(&self.scope.backend),
            self.scope.options,
        )
    }
}
