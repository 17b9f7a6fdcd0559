#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # cattlectl-client
//!
//! Cached, lazily constructed handles onto the remote hierarchy:
//!
//! ```text
//! RancherClient ── cluster(name) ──▶ ClusterClient ── project(name) ──▶ ProjectClient
//!       │                                 │                                  │
//!   catalog(name)          storage_class / persistent_volume /     namespace / config_map /
//!                               catalog(name)                      certificate / secret /
//!                                                                  docker_credential / app /
//!                                                                  workload(kind, name, ns)
//! ```
//!
//! Every accessor returns the cached handle on repeated calls. Leaf
//! handles implement [`ResourceClient`] and decide between create, upgrade
//! and no-op with the content hash in [`hash`].
//!
//! All remote traffic goes through a [`RancherBackend`]: [`RestBackend`]
//! for a live endpoint, [`InMemoryBackend`] for tests, optionally wrapped
//! in a [`TracingBackend`].

pub mod backend;
mod cache;
pub mod cluster;
pub mod hash;
pub mod kind;
pub mod memory;
pub mod project;
pub mod resource;
pub mod rest;
pub mod root;

pub use backend::{RancherBackend, RemoteObject, Scope, TracingBackend};
pub use cluster::ClusterClient;
pub use hash::{HASH_LABEL, change_hash};
pub use kind::ResourceKind;
pub use memory::{BackendCall, BackendOperation, InMemoryBackend};
pub use project::ProjectClient;
pub use resource::{ClientOptions, Payload, Resource, ResourceClient};
pub use rest::RestBackend;
pub use root::RancherClient;

/// Handle onto a namespace of a project.
pub type NamespaceClient = Resource<cattlectl_descriptor::Namespace>;
