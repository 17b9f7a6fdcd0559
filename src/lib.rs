#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # cattlectl
//!
//! Declarative apply for Rancher. The binary wires configuration, the REST
//! backend and the reconciler together; this library exposes that wiring so
//! it can be driven against other backends.

pub mod cli;
pub mod commands;
pub mod report;

// Re-export the workspace crates for convenience
pub use cattlectl_client;
pub use cattlectl_core;
pub use cattlectl_descriptor;
pub use cattlectl_reconciler;
