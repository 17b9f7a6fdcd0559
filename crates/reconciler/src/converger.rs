//! Recursive converger tree.
//!
//! Each node checks its own resource (exists, then create or upgrade) and
//! then walks its children in declaration order. The first error stops the
//! walk; everything converged before it is returned with the error.

use std::fmt;
use std::sync::Arc;

use cattlectl_client::ResourceClient;
use tracing::{debug, info};

use crate::error::{ConvergeOutcome, PartialFailure};
use crate::types::ConvergeResult;

/// A node of the converger tree.
///
/// Grouping nodes (`target == None`) have no remote counterpart and only
/// walk their children.
pub struct Converger {
    label: String,
    target: Option<Arc<dyn ResourceClient>>,
    children: Vec<Converger>,
}

impl Converger {
    /// Node converging `target`.
    pub fn resource(target: Arc<dyn ResourceClient>) -> Self {
        Self {
            label: format!("{} '{}'", target.kind(), target.name()),
            target: Some(target),
            children: Vec::new(),
        }
    }

    /// Node without a remote counterpart.
    pub fn group(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Converge this node, then its children.
    ///
    /// # Errors
    ///
    /// Returns a [`PartialFailure`] holding the results of every node
    /// converged before the failing one.
    pub fn converge(&self, dry_run: bool) -> ConvergeOutcome {
        let mut result = ConvergeResult::new();

        if let Some(target) = &self.target {
            self.converge_target(target.as_ref(), dry_run, &mut result)
                .map_err(|error| PartialFailure::empty(error.context(self.label.clone())))?;
        }

        for child in &self.children {
            match child.converge(dry_run) {
                Ok(child_result) => result.merge(child_result),
                Err(failure) => return Err(failure.after(result)),
            }
        }

        Ok(result)
    }

    fn converge_target(
        &self,
        target: &dyn ResourceClient,
        dry_run: bool,
        result: &mut ConvergeResult,
    ) -> cattlectl_core::Result<()> {
        if target.exists()? {
            if target.upgrade(dry_run)? {
                info!(resource = %self.label, dry_run, "Upgraded");
                result.record_upgraded(target.kind(), target.name());
            } else {
                debug!(resource = %self.label, "Unchanged");
            }
        } else if target.create(dry_run)? {
            info!(resource = %self.label, dry_run, "Created");
            result.record_created(target.kind(), target.name());
        }
        Ok(())
    }
}

impl fmt::Debug for Converger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converger")
            .field("label", &self.label)
            .field("grouping", &self.target.is_none())
            .field("children", &self.children)
            .finish()
    }
}
