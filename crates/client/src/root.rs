//! Root of the hierarchy.

use std::sync::Arc;

use cattlectl_core::{Error, RancherConfig, Result};
use cattlectl_descriptor::Catalog;
use tracing::debug;

use crate::backend::{RancherBackend, Scope};
use crate::cache::HandleCache;
use crate::cluster::ClusterClient;
use crate::kind::ResourceKind;
use crate::resource::{ClientOptions, Placement, Resource};

/// Entry point of the client hierarchy. One per run.
///
/// ```ignore
/// let root = RancherClient::new(&config.rancher, backend);
/// let project = root.cluster("local", "Project 'demo'")?.project("demo");
/// ```
pub struct RancherClient {
    backend: Arc<dyn RancherBackend>,
    options: ClientOptions,
    default_cluster_name: Option<String>,
    default_cluster_id: Option<String>,
    clusters: HandleCache<String, ClusterClient>,
    clusters_by_id: HandleCache<String, ClusterClient>,
    catalogs: HandleCache<String, Resource<Catalog>>,
}

impl RancherClient {
    pub fn new(config: &RancherConfig, backend: Arc<dyn RancherBackend>) -> Self {
        Self {
            backend,
            options: ClientOptions::from(config),
            default_cluster_name: config.cluster_name.clone(),
            default_cluster_id: config.cluster_id.clone(),
            clusters: HandleCache::default(),
            clusters_by_id: HandleCache::default(),
            catalogs: HandleCache::default(),
        }
    }

    /// Existing cluster by name. Looked up once per run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the cluster and `required_by`.
    pub fn cluster(&self, name: &str, required_by: &str) -> Result<Arc<ClusterClient>> {
        let cluster = self.clusters.try_get_or_insert_with(name.to_string(), || {
            debug!(cluster = name, "Looking up cluster");
            let object = self
                .backend
                .find(ResourceKind::Cluster, &Scope::Global, name)?
                .ok_or_else(|| {
                    Error::not_found(ResourceKind::Cluster.as_str(), name, required_by)
                })?;
            let id = object.id.ok_or_else(|| {
                Error::backend("find", format!("cluster '{name}' has no id"))
            })?;
            Ok(ClusterClient::new(
                id,
                name,
                Arc::clone(&self.backend),
                self.options,
            ))
        })?;
        self.clusters_by_id.share(cluster.id().to_string(), &cluster);
        Ok(cluster)
    }

    /// Existing cluster by id. Looked up once per run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the cluster and `required_by`.
    pub fn cluster_by_id(&self, id: &str, required_by: &str) -> Result<Arc<ClusterClient>> {
        let cluster = self.clusters_by_id.try_get_or_insert_with(id.to_string(), || {
            debug!(cluster_id = id, "Looking up cluster");
            let object = self
                .backend
                .get(ResourceKind::Cluster, &Scope::Global, id)?
                .ok_or_else(|| Error::not_found(ResourceKind::Cluster.as_str(), id, required_by))?;
            Ok(ClusterClient::new(
                id,
                object.name,
                Arc::clone(&self.backend),
                self.options,
            ))
        })?;
        self.clusters.share(cluster.name().to_string(), &cluster);
        Ok(cluster)
    }

    /// Cluster named by the configuration: `cluster_name` first, then
    /// `cluster_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when neither is configured, or the lookup
    /// error.
    pub fn default_cluster(&self, required_by: &str) -> Result<Arc<ClusterClient>> {
        match (&self.default_cluster_name, &self.default_cluster_id) {
            (Some(name), _) => self.cluster(name, required_by),
            (None, Some(id)) => self.cluster_by_id(id, required_by),
            (None, None) => Err(Error::config(format!(
                "{required_by} names no cluster and no default cluster is configured"
            ))),
        }
    }

    /// Resolve a descriptor's cluster reference, falling back to the
    /// configured default.
    ///
    /// # Errors
    ///
    /// See [`RancherClient::cluster`] and [`RancherClient::default_cluster`].
    pub fn resolve_cluster(
        &self,
        name: Option<&str>,
        id: Option<&str>,
        required_by: &str,
    ) -> Result<Arc<ClusterClient>> {
        match (name, id) {
            (Some(name), _) => self.cluster(name, required_by),
            (None, Some(id)) => self.cluster_by_id(id, required_by),
            (None, None) => self.default_cluster(required_by),
        }
    }

    /// Global catalog.
    pub fn catalog(&self, name: &str) -> Arc<Resource<Catalog>> {
        self.catalogs.get_or_insert_with(name.to_string(), || {
            Resource::new(
                ResourceKind::Catalog,
                name,
                Placement::Global,
                Arc::clone(&self.backend),
                self.options,
            )
        })
    }
}
