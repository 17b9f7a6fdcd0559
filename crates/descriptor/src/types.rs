//! Typed descriptors and the closed set of descriptor kinds.

use std::fmt;
use std::str::FromStr;

use cattlectl_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::model::{
    App, Catalog, Certificate, ConfigMap, DockerCredential, Namespace, PersistentVolume, Secret,
    StorageClass, Workload,
};

/// Every `kind` a descriptor document may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Rancher,
    Cluster,
    Project,
    Job,
    CronJob,
    Deployment,
    DaemonSet,
    StatefulSet,
}

impl DescriptorKind {
    /// All kinds, in documentation order.
    pub const ALL: [Self; 8] = [
        Self::Rancher,
        Self::Cluster,
        Self::Project,
        Self::Job,
        Self::CronJob,
        Self::Deployment,
        Self::DaemonSet,
        Self::StatefulSet,
    ];

    /// The `kind` string as written in descriptors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rancher => "Rancher",
            Self::Cluster => "Cluster",
            Self::Project => "Project",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Deployment => "Deployment",
            Self::DaemonSet => "DaemonSet",
            Self::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::unsupported_kind(s))
    }
}

/// The workload subset of [`DescriptorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Job,
    CronJob,
    Deployment,
    DaemonSet,
    StatefulSet,
}

impl WorkloadKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Deployment => "Deployment",
            Self::DaemonSet => "DaemonSet",
            Self::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed descriptor document.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Rancher(RancherDescriptor),
    Cluster(ClusterDescriptor),
    Project(Box<ProjectDescriptor>),
    Workload(WorkloadKind, WorkloadDescriptor),
}

impl Descriptor {
    /// Kind this descriptor was parsed from.
    pub const fn kind(&self) -> DescriptorKind {
        match self {
            Self::Rancher(_) => DescriptorKind::Rancher,
            Self::Cluster(_) => DescriptorKind::Cluster,
            Self::Project(_) => DescriptorKind::Project,
            Self::Workload(kind, _) => match kind {
                WorkloadKind::Job => DescriptorKind::Job,
                WorkloadKind::CronJob => DescriptorKind::CronJob,
                WorkloadKind::Deployment => DescriptorKind::Deployment,
                WorkloadKind::DaemonSet => DescriptorKind::DaemonSet,
                WorkloadKind::StatefulSet => DescriptorKind::StatefulSet,
            },
        }
    }
}

// =============================================================================
// Rancher
// =============================================================================

/// Top level descriptor: global catalogs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RancherDescriptor {
    #[serde(default)]
    pub metadata: RancherMetadata,
    #[serde(default)]
    pub catalogs: Vec<Catalog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RancherMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Cluster
// =============================================================================

/// Cluster wide resources of one existing cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    #[serde(default)]
    pub metadata: ClusterMetadata,
    #[serde(default)]
    pub storage_classes: Vec<StorageClass>,
    #[serde(default)]
    pub persistent_volumes: Vec<PersistentVolume>,
    #[serde(default)]
    pub catalogs: Vec<Catalog>,
}

/// Identifies the cluster; falls back to the configured cluster when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

// =============================================================================
// Project
// =============================================================================

/// A project and everything that lives in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub resources: ProjectResources,
    #[serde(default)]
    pub storage_classes: Vec<StorageClass>,
    #[serde(default)]
    pub persistent_volumes: Vec<PersistentVolume>,
    #[serde(default)]
    pub apps: Vec<App>,
}

impl ProjectDescriptor {
    /// An empty project descriptor with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ProjectMetadata {
                name: name.into(),
                cluster_name: None,
                cluster_id: None,
                includes: Vec::new(),
            },
            namespaces: Vec::new(),
            resources: ProjectResources::default(),
            storage_classes: Vec::new(),
            persistent_volumes: Vec::new(),
            apps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub includes: Vec<Include>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResources {
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub config_maps: Vec<ConfigMap>,
    #[serde(default)]
    pub docker_credentials: Vec<DockerCredential>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// Reference to other project descriptor files.
///
/// Exactly one of `file`, `files` (a glob) or `directory` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// A validated [`Include`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeSource<'a> {
    File(&'a str),
    Glob(&'a str),
    Directory(&'a str),
}

impl Include {
    /// Validate that exactly one source is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when none or several sources are set.
    pub fn source(&self) -> Result<IncludeSource<'_>> {
        match (
            self.file.as_deref(),
            self.files.as_deref(),
            self.directory.as_deref(),
        ) {
            (Some(file), None, None) => Ok(IncludeSource::File(file)),
            (None, Some(pattern), None) => Ok(IncludeSource::Glob(pattern)),
            (None, None, Some(dir)) => Ok(IncludeSource::Directory(dir)),
            _ => Err(Error::decode(
                "include must set exactly one of 'file', 'files' or 'directory'",
            )),
        }
    }
}

// =============================================================================
// Workloads
// =============================================================================

/// A single workload placed into a project namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub metadata: WorkloadMetadata,
    pub spec: Workload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadMetadata {
    #[serde(default)]
    pub cluster_name: Option<String>,
    pub project_name: String,
    pub namespace: String,
}
