//! Remote resource kinds.

use std::fmt;

use cattlectl_descriptor::WorkloadKind;
use serde::{Deserialize, Serialize};

/// Every kind of remote object the hierarchy can look up or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Cluster,
    Project,
    Namespace,
    Certificate,
    ConfigMap,
    Secret,
    DockerCredential,
    StorageClass,
    PersistentVolume,
    App,
    Catalog,
    Job,
    CronJob,
    Deployment,
    DaemonSet,
    StatefulSet,
}

impl ResourceKind {
    /// Name used in results and log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cluster => "Cluster",
            Self::Project => "Project",
            Self::Namespace => "Namespace",
            Self::Certificate => "Certificate",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::DockerCredential => "DockerCredential",
            Self::StorageClass => "StorageClass",
            Self::PersistentVolume => "PersistentVolume",
            Self::App => "App",
            Self::Catalog => "Catalog",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Deployment => "Deployment",
            Self::DaemonSet => "DaemonSet",
            Self::StatefulSet => "StatefulSet",
        }
    }

    /// Collection segment of the `/v3` API.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Cluster => "clusters",
            Self::Project => "projects",
            Self::Namespace => "namespaces",
            Self::Certificate => "certificates",
            Self::ConfigMap => "configmaps",
            Self::Secret => "secrets",
            Self::DockerCredential => "dockercredentials",
            Self::StorageClass => "storageclasses",
            Self::PersistentVolume => "persistentvolumes",
            Self::App => "apps",
            Self::Catalog => "catalogs",
            Self::Job => "jobs",
            Self::CronJob => "cronjobs",
            Self::Deployment => "deployments",
            Self::DaemonSet => "daemonsets",
            Self::StatefulSet => "statefulsets",
        }
    }

    pub const fn is_workload(self) -> bool {
        matches!(
            self,
            Self::Job | Self::CronJob | Self::Deployment | Self::DaemonSet | Self::StatefulSet
        )
    }
}

impl From<WorkloadKind> for ResourceKind {
    fn from(kind: WorkloadKind) -> Self {
        match kind {
            WorkloadKind::Job => Self::Job,
            WorkloadKind::CronJob => Self::CronJob,
            WorkloadKind::Deployment => Self::Deployment,
            WorkloadKind::DaemonSet => Self::DaemonSet,
            WorkloadKind::StatefulSet => Self::StatefulSet,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
