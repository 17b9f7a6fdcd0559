//! Rendering of apply results.

use std::fmt::Write as _;

use cattlectl_reconciler::{ConvergeOutcome, ConvergeResult, ResourceDescriptor};
use serde::Serialize;

use crate::cli::OutputFormat;

/// What an apply run reports, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub changed: bool,
    #[serde(flatten)]
    pub result: ConvergeResult,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip)]
    pub dry_run: bool,
}

impl ApplyReport {
    /// On failure the partial result is reported together with the full
    /// error chain.
    pub fn from_outcome(outcome: ConvergeOutcome, dry_run: bool) -> Self {
        match outcome {
            Ok(result) => Self {
                changed: result.changed(),
                result,
                failed: false,
                msg: None,
                dry_run,
            },
            Err(failure) => Self {
                changed: failure.partial.changed(),
                msg: Some(failure.error.to_string()),
                result: failure.partial,
                failed: true,
                dry_run,
            },
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Human => Ok(self.render_human()),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    fn render_human(&self) -> String {
        let mut out = String::new();
        let verb = |done: &str| {
            if self.dry_run {
                format!("would be {done}")
            } else {
                done.to_string()
            }
        };

        write_section(&mut out, &verb("created"), &self.result.created);
        write_section(&mut out, &verb("upgraded"), &self.result.upgraded);

        if !self.changed {
            out.push_str("no changes\n");
        }
        if let Some(msg) = &self.msg {
            let _ = writeln!(out, "apply failed: {msg}");
        }
        out
    }
}

fn write_section(out: &mut String, heading: &str, resources: &[ResourceDescriptor]) {
    if resources.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}:");
    for resource in resources {
        let _ = writeln!(out, "  {} {}", resource.kind, resource.name);
    }
}
