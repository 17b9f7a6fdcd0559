//! Error types shared by the decoder, the client hierarchy and the converger.
//!
//! Every variant is fatal for the current unit of work (one descriptor
//! document or one converger subtree). Nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for cattlectl operations.
#[derive(Debug, Error)]
pub enum Error {
    // Descriptor errors
    #[error("failed to decode descriptor: {reason}")]
    Decode { reason: String },

    #[error("descriptor is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("unsupported descriptor kind '{kind}'")]
    UnsupportedKind { kind: String },

    #[error("unsupported api version '{requested}' (this engine supports up to {supported})")]
    UnsupportedApiVersion { requested: String, supported: String },

    // Hierarchy errors
    #[error("{kind} '{name}' not found (required by {required_by})")]
    NotFound {
        kind: String,
        name: String,
        required_by: String,
    },

    #[error("backend call '{operation}' failed: {reason}")]
    Backend { operation: String, reason: String },

    // Ambient errors
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("failed to read file '{path}': {reason}")]
    FileRead { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Create a missing field error.
    pub const fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an unsupported kind error.
    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind { kind: kind.into() }
    }

    /// Create an unsupported api version error.
    pub fn unsupported_api_version(
        requested: impl Into<String>,
        supported: impl Into<String>,
    ) -> Self {
        Self::UnsupportedApiVersion {
            requested: requested.into(),
            supported: supported.into(),
        }
    }

    /// Create a not found error naming the missing parent and its requester.
    pub fn not_found(
        kind: impl Into<String>,
        name: impl Into<String>,
        required_by: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            required_by: required_by.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with identifying context.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the root cause is a missing remote parent.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_parent_and_child() {
        let err = Error::not_found("project", "payments", "Job 'migrate'");
        let msg = err.to_string();
        assert!(msg.contains("project 'payments'"));
        assert!(msg.contains("Job 'migrate'"));
    }

    #[test]
    fn test_context_keeps_root_cause() {
        let err = Error::backend("create", "connection refused")
            .context("ConfigMap 'settings'")
            .context("Project 'demo'");
        assert!(err.to_string().starts_with("Project 'demo': ConfigMap 'settings'"));
        assert!(matches!(err.root_cause(), Error::Backend { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unsupported_api_version_message() {
        let err = Error::unsupported_api_version("1.4", "1.3");
        assert_eq!(
            err.to_string(),
            "unsupported api version '1.4' (this engine supports up to 1.3)"
        );
    }
}
