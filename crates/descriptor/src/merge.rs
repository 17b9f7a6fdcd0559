//! Project include merging.
//!
//! Merging is asymmetric: for every tracked collection the result holds all
//! of the parent's entries in their original order, followed by the child's
//! entries whose name the parent does not already use, in the child's order.

use std::collections::HashSet;

use itertools::Itertools;

use crate::model::Named;
use crate::types::{ProjectDescriptor, ProjectResources};

/// Merge `child` into `parent`, parent entries winning on name collisions.
///
/// Metadata (name, cluster, includes) always comes from the parent.
pub fn merge_project(child: &ProjectDescriptor, parent: ProjectDescriptor) -> ProjectDescriptor {
    let ProjectDescriptor {
        metadata,
        namespaces,
        resources,
        storage_classes,
        persistent_volumes,
        apps,
    } = parent;

    ProjectDescriptor {
        metadata,
        namespaces: merge_by_name(&child.namespaces, namespaces),
        resources: ProjectResources {
            certificates: merge_by_name(&child.resources.certificates, resources.certificates),
            config_maps: merge_by_name(&child.resources.config_maps, resources.config_maps),
            docker_credentials: merge_by_name(
                &child.resources.docker_credentials,
                resources.docker_credentials,
            ),
            secrets: merge_by_name(&child.resources.secrets, resources.secrets),
        },
        storage_classes: merge_by_name(&child.storage_classes, storage_classes),
        persistent_volumes: merge_by_name(&child.persistent_volumes, persistent_volumes),
        apps: merge_by_name(&child.apps, apps),
    }
}

/// Parent entries, then child entries with names the parent does not use.
pub fn merge_by_name<T: Named + Clone>(child: &[T], parent: Vec<T>) -> Vec<T> {
    let taken: HashSet<String> = parent.iter().map(|p| p.name().to_string()).collect();
    let additions = child
        .iter()
        .filter(|c| !taken.contains(c.name()))
        .cloned()
        .collect_vec();

    parent.into_iter().chain(additions).collect()
}
