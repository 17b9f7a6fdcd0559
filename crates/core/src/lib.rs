#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # cattlectl-core
//!
//! Error taxonomy, result helpers and the run configuration shared by every
//! cattlectl crate.

pub mod config;
pub mod error;
pub mod result;

pub use config::{CattlectlConfig, ConfigOverrides, RancherConfig};
pub use error::Error;
pub use result::{Result, ResultExt};
