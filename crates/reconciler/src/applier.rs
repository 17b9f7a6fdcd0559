//! Applies a descriptor stream document by document.
//!
//! Each document is parsed, its includes resolved, turned into a converger
//! tree and converged before the next document is read. The first failing
//! document stops the stream; results of the documents before it are kept.

use std::io::Read;

use cattlectl_client::RancherClient;
use cattlectl_descriptor::{
    ApiVersionGate, Descriptor, DescriptorDocument, DescriptorReader, IncludeResolver,
};
use tracing::{info, warn};

use crate::builder::TreeBuilder;
use crate::error::{ConvergeOutcome, PartialFailure};
use crate::types::ConvergeResult;

/// Applies descriptor streams against one client hierarchy.
pub struct Applier {
    root: RancherClient,
    gate: ApiVersionGate,
    includes: IncludeResolver,
    dry_run: bool,
}

impl Applier {
    /// Includes resolve relative to the working directory until
    /// [`Applier::with_includes`] says otherwise.
    pub fn new(root: RancherClient, gate: ApiVersionGate) -> Self {
        Self {
            root,
            gate,
            includes: IncludeResolver::new(gate, "."),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_includes(mut self, includes: IncludeResolver) -> Self {
        self.includes = includes;
        self
    }

    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// # Errors
    ///
    /// See [`Applier::apply`].
    pub fn apply_str(&self, text: &str) -> ConvergeOutcome {
        self.apply(DescriptorReader::new(text))
    }

    /// # Errors
    ///
    /// See [`Applier::apply`].
    pub fn apply_reader<R: Read>(&self, reader: R) -> ConvergeOutcome {
        self.apply(DescriptorReader::from_reader(reader))
    }

    /// Apply every document of a stream, in order.
    ///
    /// # Errors
    ///
    /// Returns a [`PartialFailure`] at the first document that fails to
    /// decode, resolve or converge, with the error wrapped as
    /// `document N` and the results of all earlier documents.
    pub fn apply(&self, mut documents: DescriptorReader<'_>) -> ConvergeOutcome {
        let mut total = ConvergeResult::new();

        while let Some(document) = documents.next() {
            let position = documents.position();
            let outcome = document
                .map_err(PartialFailure::empty)
                .and_then(|document| self.apply_document(document));

            match outcome {
                Ok(result) => total.merge(result),
                Err(failure) => {
                    warn!(document = position, error = %failure.error, "Apply stopped");
                    return Err(failure.context(format!("document {position}")).after(total));
                }
            }
        }

        info!(
            created = total.created.len(),
            upgraded = total.upgraded.len(),
            dry_run = self.dry_run,
            "Apply finished"
        );
        Ok(total)
    }

    /// Apply a single decoded document.
    ///
    /// # Errors
    ///
    /// Returns a [`PartialFailure`] for gate, include, lookup and
    /// convergence errors.
    pub fn apply_document(&self, document: DescriptorDocument) -> ConvergeOutcome {
        let descriptor = match document.parse(&self.gate).map_err(PartialFailure::empty)? {
            Descriptor::Project(project) => Descriptor::Project(Box::new(
                self.includes
                    .resolve(*project)
                    .map_err(PartialFailure::empty)?,
            )),
            other => other,
        };

        TreeBuilder::new(&self.root)
            .build(descriptor)
            .map_err(PartialFailure::empty)?
            .converge(self.dry_run)
    }
}
