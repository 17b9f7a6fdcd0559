//! Turns a parsed descriptor into a converger tree.

use std::sync::Arc;

use cattlectl_client::{Payload, RancherClient, Resource, ResourceKind};
use cattlectl_core::Result;
use cattlectl_descriptor::{
    ClusterDescriptor, Descriptor, ProjectDescriptor, RancherDescriptor, WorkloadDescriptor,
    WorkloadKind,
};
use tracing::debug;

use crate::converger::Converger;

/// Builds converger trees against one client hierarchy.
///
/// Building performs lookups (clusters, and projects for workloads) but
/// never writes.
pub struct TreeBuilder<'a> {
    root: &'a RancherClient,
}

impl<'a> TreeBuilder<'a> {
    pub const fn new(root: &'a RancherClient) -> Self {
        Self { root }
    }

    /// Build the tree for one descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`cattlectl_core::Error::NotFound`] when a cluster, or the
    /// project of a workload, does not exist.
    pub fn build(&self, descriptor: Descriptor) -> Result<Converger> {
        let tree = match descriptor {
            Descriptor::Rancher(rancher) => self.rancher(rancher),
            Descriptor::Cluster(cluster) => self.cluster(cluster)?,
            Descriptor::Project(project) => self.project(*project)?,
            Descriptor::Workload(kind, workload) => self.workload(kind, workload)?,
        };
        debug!(tree = %tree.label(), children = tree.children().len(), "Built converger tree");
        Ok(tree)
    }

    fn rancher(&self, descriptor: RancherDescriptor) -> Converger {
        let label = descriptor
            .metadata
            .name
            .map_or_else(|| "Rancher".to_string(), |name| format!("Rancher '{name}'"));

        Converger::group(label).with_children(
            descriptor
                .catalogs
                .into_iter()
                .map(|catalog| leaf(self.root.catalog(&catalog.name), catalog)),
        )
    }

    fn cluster(&self, descriptor: ClusterDescriptor) -> Result<Converger> {
        let ClusterDescriptor {
            metadata,
            storage_classes,
            persistent_volumes,
            catalogs,
        } = descriptor;
        let label = match (&metadata.name, &metadata.id) {
            (Some(name), _) => format!("{} '{name}'", ResourceKind::Cluster),
            (None, Some(id)) => format!("{} '{id}'", ResourceKind::Cluster),
            (None, None) => "Cluster descriptor".to_string(),
        };
        let cluster =
            self.root
                .resolve_cluster(metadata.name.as_deref(), metadata.id.as_deref(), &label)?;

        let storage_classes = storage_classes
            .into_iter()
            .map(|sc| leaf(cluster.storage_class(&sc.name), sc));
        let persistent_volumes = persistent_volumes
            .into_iter()
            .map(|pv| leaf(cluster.persistent_volume(&pv.name), pv));
        let catalogs = catalogs
            .into_iter()
            .map(|catalog| leaf(cluster.catalog(&catalog.name), catalog));

        Ok(Converger::group(label)
            .with_children(storage_classes)
            .with_children(persistent_volumes)
            .with_children(catalogs))
    }

    /// Project node first, then namespaces, cluster resources, project
    /// resources and apps, each in declaration order.
    fn project(&self, descriptor: ProjectDescriptor) -> Result<Converger> {
        let ProjectDescriptor {
            metadata,
            namespaces,
            resources,
            storage_classes,
            persistent_volumes,
            apps,
        } = descriptor;
        let label = format!("{} '{}'", ResourceKind::Project, metadata.name);
        let cluster = self.root.resolve_cluster(
            metadata.cluster_name.as_deref(),
            metadata.cluster_id.as_deref(),
            &label,
        )?;
        let project = cluster.project(&metadata.name);

        let mut children = Vec::new();
        children.extend(
            namespaces
                .into_iter()
                .map(|ns| leaf(project.namespace(&ns.name), ns)),
        );
        children.extend(
            storage_classes
                .into_iter()
                .map(|sc| leaf(cluster.storage_class(&sc.name), sc)),
        );
        children.extend(
            persistent_volumes
                .into_iter()
                .map(|pv| leaf(cluster.persistent_volume(&pv.name), pv)),
        );
        children.extend(resources.certificates.into_iter().map(|certificate| {
            leaf(
                project.certificate(&certificate.name, certificate.namespace.as_deref()),
                certificate,
            )
        }));
        children.extend(resources.config_maps.into_iter().map(|config_map| {
            leaf(
                project.config_map(&config_map.name, &config_map.namespace),
                config_map,
            )
        }));
        children.extend(resources.docker_credentials.into_iter().map(|credential| {
            leaf(
                project.docker_credential(&credential.name, credential.namespace.as_deref()),
                credential,
            )
        }));
        children.extend(resources.secrets.into_iter().map(|secret| {
            leaf(
                project.secret(&secret.name, secret.namespace.as_deref()),
                secret,
            )
        }));
        children.extend(
            apps.into_iter()
                .map(|app| leaf(project.app(&app.name, &app.namespace), app)),
        );

        Ok(Converger::resource(project).with_children(children))
    }

    fn workload(&self, kind: WorkloadKind, descriptor: WorkloadDescriptor) -> Result<Converger> {
        let WorkloadDescriptor { metadata, spec } = descriptor;
        let label = format!("{kind} '{}'", spec.name);
        let cluster = self
            .root
            .resolve_cluster(metadata.cluster_name.as_deref(), None, &label)?;
        let project = cluster.project(&metadata.project_name);
        project.require_existing(&label)?;

        Ok(leaf(
            project.workload(kind, &spec.name, &metadata.namespace),
            spec,
        ))
    }
}

fn leaf<P: Payload>(handle: Arc<Resource<P>>, payload: P) -> Converger {
    handle.set_desired(payload);
    Converger::resource(handle)
}
