//! Result type definition and extension traits.

use crate::error::Error;

/// The standard Result type for cattlectl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait attaching identifying context to failed results.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed context string.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`Error::Context`].
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error with a lazily built context string.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`Error::Context`].
    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, context: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, context: F) -> Result<T> {
        self.map_err(|e| e.context(context()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_on_ok_is_identity() {
        let result: Result<i32> = Ok(42);
        assert_eq!(result.context("unused").ok(), Some(42));
    }

    #[test]
    fn test_with_context_is_lazy() {
        let mut called = false;
        let result: Result<i32> = Ok(1);
        let _ = result.with_context(|| {
            called = true;
            "never"
        });
        assert!(!called);
    }

    #[test]
    fn test_with_context_wraps_error() {
        let result: Result<i32> = Err(Error::decode("bad indent"));
        let err = result.with_context(|| "document 2").err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("document 2: failed to decode descriptor: bad indent".to_string())
        );
    }
}
