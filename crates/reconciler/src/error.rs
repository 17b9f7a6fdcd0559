//! Error types for the reconciler crate.

pub use cattlectl_core::{Error, Result};
use thiserror::Error as ThisError;

use crate::types::ConvergeResult;

/// A run that stopped at its first error.
///
/// Everything converged before the error is kept in `partial`.
#[derive(Debug, ThisError)]
#[error("apply stopped after {} change(s)", .partial.len())]
pub struct PartialFailure {
    pub partial: ConvergeResult,
    #[source]
    pub error: Error,
}

impl PartialFailure {
    pub const fn new(partial: ConvergeResult, error: Error) -> Self {
        Self { partial, error }
    }

    /// Failure before anything was converged.
    pub fn empty(error: Error) -> Self {
        Self::new(ConvergeResult::new(), error)
    }

    /// Wrap the underlying error with identifying context.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self {
            partial: self.partial,
            error: self.error.context(context),
        }
    }

    /// Prepend results converged before this failure.
    #[must_use]
    pub fn after(self, mut earlier: ConvergeResult) -> Self {
        earlier.merge(self.partial);
        Self {
            partial: earlier,
            error: self.error,
        }
    }
}

/// Result of a convergence: all changes, or the changes made before the
/// first error together with that error.
pub type ConvergeOutcome = std::result::Result<ConvergeResult, PartialFailure>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use cattlectl_client::ResourceKind;

    use super::*;

    #[test]
    fn test_after_keeps_earlier_results_first() {
        let mut earlier = ConvergeResult::new();
        earlier.record_created(ResourceKind::Namespace, "web");
        let mut partial = ConvergeResult::new();
        partial.record_created(ResourceKind::ConfigMap, "settings");

        let failure = PartialFailure::new(partial, Error::decode("boom")).after(earlier);
        let names: Vec<_> = failure.partial.created.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["web", "settings"]);
    }

    #[test]
    fn test_source_is_the_underlying_error() {
        let failure = PartialFailure::empty(Error::decode("boom")).context("document 2");
        assert_eq!(failure.to_string(), "apply stopped after 0 change(s)");
        let source = failure.source().map(ToString::to_string).unwrap_or_default();
        assert!(source.starts_with("document 2: "));
    }
}
