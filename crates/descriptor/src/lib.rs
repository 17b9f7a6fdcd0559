#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # cattlectl-descriptor
//!
//! Everything that happens to a descriptor before any remote call is made:
//!
//! - **Decoding**: split a multi-document YAML stream into documents and
//!   reject the ones without `kind`/`api_version` ([`decode`])
//! - **Version gate**: accept only `api_version` values this engine
//!   understands ([`version`])
//! - **Dispatch**: turn a document into one variant of the closed
//!   [`Descriptor`] sum type ([`types`])
//! - **Includes**: load referenced project files and merge them into the
//!   including project, parent entries first ([`include`], [`merge`])
//!
//! ```ignore
//! use cattlectl_descriptor::{ApiVersionGate, DescriptorReader};
//!
//! let gate = ApiVersionGate::engine()?;
//! for document in DescriptorReader::new(text) {
//!     let descriptor = document?.parse(&gate)?;
//!     println!("{}", descriptor.kind());
//! }
//! ```

pub mod decode;
pub mod include;
pub mod merge;
pub mod model;
pub mod types;
pub mod version;

pub use decode::{DescriptorDocument, DescriptorReader};
pub use include::IncludeResolver;
pub use merge::merge_project;
pub use model::{
    App, Catalog, Certificate, ConfigMap, Container, ContainerPort, DockerCredential, Named,
    Namespace, PersistentVolume, RegistryCredential, Secret, StorageClass, Workload,
};
pub use types::{
    ClusterDescriptor, ClusterMetadata, Descriptor, DescriptorKind, Include, IncludeSource,
    ProjectDescriptor, ProjectMetadata, ProjectResources, RancherDescriptor, RancherMetadata,
    WorkloadDescriptor, WorkloadKind, WorkloadMetadata,
};
pub use version::{ApiVersion, ApiVersionGate};
