//! API-version gate.
//!
//! A descriptor's `api_version` is accepted iff its `major.minor` is less
//! than or equal to the engine's own `major.minor`. Components compare as
//! numbers, so `1.10` is newer than `1.9`.

use std::fmt;
use std::str::FromStr;

use cattlectl_core::{Error, Result};

/// A `major.minor` version. Patch components are parsed and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u64,
    pub minor: u64,
}

impl ApiVersion {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    /// Parses `1.2`, `v1.2`, `1.2.7` and `1`; a missing minor is `0`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let invalid = || Error::decode(format!("invalid api version '{s}'"));

        let mut parts = digits.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            None => 0,
            Some(p) => p.parse::<u64>().map_err(|_| invalid())?,
        };
        // patch and pre-release suffixes are irrelevant to the gate
        Ok(Self { major, minor })
    }
}

/// Accepts descriptor versions no newer than the engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersionGate {
    supported: ApiVersion,
}

impl ApiVersionGate {
    pub const fn new(supported: ApiVersion) -> Self {
        Self { supported }
    }

    /// Gate for the version this crate was built as.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the package version does not parse.
    pub fn engine() -> Result<Self> {
        env!("CARGO_PKG_VERSION").parse().map(Self::new)
    }

    /// Highest version this gate accepts.
    pub const fn supported(&self) -> ApiVersion {
        self.supported
    }

    /// Check a descriptor's `api_version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedApiVersion`] when `requested` is newer than
    /// the engine, or does not parse as a version at all.
    pub fn check(&self, requested: &str) -> Result<ApiVersion> {
        let version = requested.parse::<ApiVersion>().map_err(|_| {
            Error::unsupported_api_version(requested, self.supported.to_string())
        })?;

        if version > self.supported {
            return Err(Error::unsupported_api_version(
                requested,
                self.supported.to_string(),
            ));
        }
        Ok(version)
    }
}
