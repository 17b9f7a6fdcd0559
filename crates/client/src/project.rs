//! Project level of the hierarchy and lazy namespace resolution.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use cattlectl_core::{Error, Result};
use cattlectl_descriptor::{
    App, Certificate, ConfigMap, DockerCredential, Namespace, Secret, Workload, WorkloadKind,
};
use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, info};

use crate::backend::{RemoteObject, Scope};
use crate::cache::HandleCache;
use crate::cluster::ClusterScope;
use crate::hash::{HASH_LABEL, change_hash};
use crate::kind::ResourceKind;
use crate::resource::{Payload, Placement, Resource, ResourceClient};

/// Identity of a project, shared with every handle below it.
///
/// The project id and namespace ids are cached once found; misses are
/// not cached so that parents created later in the same run are seen.
pub(crate) struct ProjectScope {
    pub(crate) cluster: Arc<ClusterScope>,
    pub(crate) name: String,
    id: OnceLock<String>,
    namespace_ids: RwLock<HashMap<String, String>>,
}

impl ProjectScope {
    pub(crate) fn new(cluster: Arc<ClusterScope>, name: &str) -> Self {
        Self {
            cluster,
            name: name.to_string(),
            id: OnceLock::new(),
            namespace_ids: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn id(&self) -> Result<Option<String>> {
        if let Some(id) = self.id.get() {
            return Ok(Some(id.clone()));
        }
        let found = self
            .cluster
            .backend
            .find(ResourceKind::Project, &self.cluster.scope(), &self.name)?;
        Ok(found
            .and_then(|object| object.id)
            .map(|id| self.id.get_or_init(|| id).clone()))
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.id.get().is_some()
    }

    pub(crate) fn scope(&self) -> Result<Option<Scope>> {
        Ok(self.id()?.map(|project_id| Scope::Project {
            cluster_id: self.cluster.id.clone(),
            project_id,
        }))
    }

    pub(crate) fn namespace_id(&self, namespace: &str) -> Result<Option<String>> {
        if let Some(id) = self.namespace_ids.read().get(namespace) {
            return Ok(Some(id.clone()));
        }
        let Some(scope) = self.scope()? else {
            return Ok(None);
        };

        let found = self
            .cluster
            .backend
            .find(ResourceKind::Namespace, &scope, namespace)?
            .and_then(|object| object.id);
        if let Some(id) = &found {
            debug!(project = %self.name, namespace, id = %id, "Resolved namespace");
            self.namespace_ids
                .write()
                .entry(namespace.to_string())
                .or_insert_with(|| id.clone());
        }
        Ok(found)
    }
}

/// A project and the get-or-create accessors for everything inside it.
pub struct ProjectClient {
    scope: Arc<ProjectScope>,
    namespaces: HandleCache<String, Resource<Namespace>>,
    certificates: HandleCache<(String, Option<String>), Resource<Certificate>>,
    config_maps: HandleCache<(String, String), Resource<ConfigMap>>,
    secrets: HandleCache<(String, Option<String>), Resource<Secret>>,
    docker_credentials: HandleCache<(String, Option<String>), Resource<DockerCredential>>,
    apps: HandleCache<(String, String), Resource<App>>,
    workloads: HandleCache<(WorkloadKind, String, String), Resource<Workload>>,
}

impl ProjectClient {
    pub(crate) fn new(scope: Arc<ProjectScope>) -> Self {
        Self {
            scope,
            namespaces: HandleCache::default(),
            certificates: HandleCache::default(),
            config_maps: HandleCache::default(),
            secrets: HandleCache::default(),
            docker_credentials: HandleCache::default(),
            apps: HandleCache::default(),
            workloads: HandleCache::default(),
        }
    }

    pub fn namespace(&self, name: &str) -> Arc<Resource<Namespace>> {
        self.namespaces.get_or_insert_with(name.to_string(), || {
            self.leaf(
                ResourceKind::Namespace,
                name,
                Placement::Project(Arc::clone(&self.scope)),
            )
        })
    }

    /// Project wide certificate, or one bound to `namespace`.
    pub fn certificate(&self, name: &str, namespace: Option<&str>) -> Arc<Resource<Certificate>> {
        self.certificates
            .get_or_insert_with((name.to_string(), namespace.map(str::to_string)), || {
                self.leaf(
                    ResourceKind::Certificate,
                    name,
                    Placement::in_project(&self.scope, namespace),
                )
            })
    }

    pub fn config_map(&self, name: &str, namespace: &str) -> Arc<Resource<ConfigMap>> {
        self.config_maps
            .get_or_insert_with((name.to_string(), namespace.to_string()), || {
                self.leaf(
                    ResourceKind::ConfigMap,
                    name,
                    Placement::namespaced(&self.scope, namespace),
                )
            })
    }

    pub fn secret(&self, name: &str, namespace: Option<&str>) -> Arc<Resource<Secret>> {
        self.secrets
            .get_or_insert_with((name.to_string(), namespace.map(str::to_string)), || {
                self.leaf(
                    ResourceKind::Secret,
                    name,
                    Placement::in_project(&self.scope, namespace),
                )
            })
    }

    pub fn docker_credential(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Arc<Resource<DockerCredential>> {
        self.docker_credentials
            .get_or_insert_with((name.to_string(), namespace.map(str::to_string)), || {
                self.leaf(
                    ResourceKind::DockerCredential,
                    name,
                    Placement::in_project(&self.scope, namespace),
                )
            })
    }

    pub fn app(&self, name: &str, namespace: &str) -> Arc<Resource<App>> {
        self.apps
            .get_or_insert_with((name.to_string(), namespace.to_string()), || {
                self.leaf(
                    ResourceKind::App,
                    name,
                    Placement::namespaced(&self.scope, namespace),
                )
            })
    }

    pub fn workload(
        &self,
        kind: WorkloadKind,
        name: &str,
        namespace: &str,
    ) -> Arc<Resource<Workload>> {
        self.workloads
            .get_or_insert_with((kind, name.to_string(), namespace.to_string()), || {
                self.leaf(
                    kind.into(),
                    name,
                    Placement::namespaced(&self.scope, namespace),
                )
            })
    }

    /// Id of `namespace` in this project; `None` while it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the lookup fails.
    pub fn namespace_id(&self, namespace: &str) -> Result<Option<String>> {
        self.scope.namespace_id(namespace)
    }

    /// Id of this project, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming this project and `child`.
    pub fn require_existing(&self, child: &str) -> Result<String> {
        self.scope
            .id()?
            .ok_or_else(|| {
                Error::not_found(ResourceKind::Project.as_str(), &self.scope.name, child)
            })
    }

    fn leaf<P: Payload>(
        &self,
        kind: ResourceKind,
        name: &str,
        placement: Placement,
    ) -> Resource<P> {
        Resource::new(
            kind,
            name,
            placement,
            Arc::clone(&self.scope.cluster.backend),
            self.scope.cluster.options,
        )
    }
}

impl ResourceClient for ProjectClient {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    fn name(&self) -> &str {
        &self.scope.name
    }

    fn id(&self) -> Result<String> {
        self.require_existing("id lookup")
    }

    fn exists(&self) -> Result<bool> {
        Ok(self.scope.id()?.is_some())
    }

    fn create(&self, dry_run: bool) -> Result<bool> {
        let cluster = &self.scope.cluster;
        if dry_run {
            info!(project = %self.scope.name, cluster = %cluster.name, "Would create");
            return Ok(true);
        }

        let body = json!({ "name": self.scope.name });
        let object = RemoteObject::new(self.scope.name.clone(), body)
            .with_label(HASH_LABEL, change_hash(&json!({ "name": self.scope.name }))?);
        let created = cluster
            .backend
            .create(ResourceKind::Project, &cluster.scope(), object)?;
        if let Some(id) = created.id {
            let _ = self.scope.id.set(id);
        }
        info!(project = %self.scope.name, cluster = %cluster.name, "Created");
        Ok(true)
    }

    /// Projects declare nothing but their name, so there is never anything
    /// to write.
    fn upgrade(&self, _dry_run: bool) -> Result<bool> {
        debug!(project = %self.scope.name, "Up to date");
        Ok(false)
    }
}
