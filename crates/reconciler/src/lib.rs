//! Declarative convergence of Rancher resources.
//!
//! This crate walks parsed descriptors against the client hierarchy:
//!
//! - **Build**: turn a descriptor into a tree of [`Converger`] nodes, one
//!   per declared resource ([`builder`])
//! - **Converge**: per node, check existence, then create or upgrade, then
//!   recurse into children ([`converger`])
//! - **Apply**: run a whole descriptor stream, fail fast, keep partial
//!   results ([`applier`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use cattlectl_client::{InMemoryBackend, RancherClient};
//! use cattlectl_core::RancherConfig;
//! use cattlectl_descriptor::ApiVersionGate;
//! use cattlectl_reconciler::Applier;
//!
//! let backend = InMemoryBackend::new_arc();
//! backend.add_cluster("local");
//! let root = RancherClient::new(&RancherConfig::default(), backend);
//! let applier = Applier::new(root, ApiVersionGate::engine()?);
//!
//! let result = applier.apply_str(descriptors)?;
//! println!("changed: {}", result.changed());
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod applier;
pub mod builder;
pub mod converger;
pub mod error;
pub mod types;

// Re-export main types
pub use applier::Applier;
pub use builder::TreeBuilder;
pub use converger::Converger;
pub use error::{ConvergeOutcome, Error, PartialFailure, Result};
pub use types::{ConvergeResult, ResourceDescriptor};
