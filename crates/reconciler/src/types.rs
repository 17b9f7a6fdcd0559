//! Result types of a convergence run.

use std::fmt;

use cattlectl_client::ResourceKind;
use serde::{Deserialize, Serialize};

/// One create or upgrade event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "Type")]
    pub kind: ResourceKind,
    #[serde(rename = "Name")]
    pub name: String,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Everything a run created or upgraded, in the order it happened.
///
/// Results concatenate: merging is associative and the empty result is
/// its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeResult {
    #[serde(rename = "created_resources", default)]
    pub created: Vec<ResourceDescriptor>,
    #[serde(rename = "upgraded_resources", default)]
    pub upgraded: Vec<ResourceDescriptor>,
}

impl ConvergeResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was (or, in a dry run, would have been) written.
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.upgraded.is_empty()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.created.len() + self.upgraded.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.changed()
    }

    pub fn record_created(&mut self, kind: ResourceKind, name: impl Into<String>) {
        self.created.push(ResourceDescriptor::new(kind, name));
    }

    pub fn record_upgraded(&mut self, kind: ResourceKind, name: impl Into<String>) {
        self.upgraded.push(ResourceDescriptor::new(kind, name));
    }

    /// Append `other` after everything recorded so far.
    pub fn merge(&mut self, other: Self) {
        self.created.extend(other.created);
        self.upgraded.extend(other.upgraded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(created: &[&str], upgraded: &[&str]) -> ConvergeResult {
        ConvergeResult {
            created: created
                .iter()
                .map(|n| ResourceDescriptor::new(ResourceKind::ConfigMap, *n))
                .collect(),
            upgraded: upgraded
                .iter()
                .map(|n| ResourceDescriptor::new(ResourceKind::ConfigMap, *n))
                .collect(),
        }
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let mut total = result(&["a"], &["x"]);
        total.merge(result(&["b"], &[]));
        total.merge(ConvergeResult::new());
        assert_eq!(total, result(&["a", "b"], &["x"]));
        assert_eq!(total.len(), 3);
    }

    #[test]
    fn test_merge_is_associative() {
        let (a, b, c) = (result(&["a"], &[]), result(&[], &["b"]), result(&["c"], &["d"]));

        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        let mut bc = b;
        bc.merge(c);
        let mut right = a;
        right.merge(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn test_changed() {
        assert!(!ConvergeResult::new().changed());
        assert!(result(&[], &["x"]).changed());
    }

    #[test]
    fn test_external_shape() -> Result<(), serde_json::Error> {
        let mut result = ConvergeResult::new();
        result.record_created(ResourceKind::App, "demo");
        let json = serde_json::to_value(&result)?;
        assert_eq!(
            json,
            serde_json::json!({
                "created_resources": [{"Type": "App", "Name": "demo"}],
                "upgraded_resources": []
            })
        );
        Ok(())
    }
}
