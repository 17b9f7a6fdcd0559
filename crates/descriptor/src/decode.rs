//! Multi-document descriptor stream decoder and kind dispatcher.
//!
//! Documents are separated by the YAML `---` marker. Empty documents are
//! skipped. A document without `kind` or `api_version` is an error; the
//! caller decides whether to abort the stream (it always does).

use std::io::Read;

use cattlectl_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::types::{Descriptor, DescriptorKind, WorkloadKind};
use crate::version::ApiVersionGate;

/// One undecoded document: its kind, its api version and the raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorDocument {
    pub kind: String,
    pub api_version: String,
    pub body: Value,
}

impl DescriptorDocument {
    /// Build a document from a decoded YAML value.
    ///
    /// Returns `Ok(None)` for empty documents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] when `kind` or `api_version` is absent
    /// and [`Error::Decode`] when the document is not a mapping or either
    /// field is not a string.
    pub fn from_value(value: Value) -> Result<Option<Self>> {
        let mapping = match value {
            Value::Null => return Ok(None),
            Value::Mapping(mapping) if mapping.is_empty() => return Ok(None),
            Value::Mapping(mapping) => mapping,
            _ => return Err(Error::decode("document is not a mapping")),
        };

        let kind = string_field(&mapping, "kind")?;
        let api_version = string_field(&mapping, "api_version")?;

        Ok(Some(Self {
            kind,
            api_version,
            body: Value::Mapping(mapping),
        }))
    }

    /// Resolve the declared kind against the closed kind enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKind`] for unknown kinds.
    pub fn descriptor_kind(&self) -> Result<DescriptorKind> {
        self.kind.parse()
    }

    /// Check the version gate and parse the body into its typed descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKind`], [`Error::UnsupportedApiVersion`]
    /// or [`Error::Decode`] when the body does not fit the kind's schema.
    pub fn parse(self, gate: &ApiVersionGate) -> Result<Descriptor> {
        let kind = self.descriptor_kind()?;
        gate.check(&self.api_version)?;
        debug!(kind = %kind, api_version = %self.api_version, "Parsing descriptor");

        let body = self.body;
        let descriptor = match kind {
            DescriptorKind::Rancher => Descriptor::Rancher(typed(body, kind)?),
            DescriptorKind::Cluster => Descriptor::Cluster(typed(body, kind)?),
            DescriptorKind::Project => Descriptor::Project(Box::new(typed(body, kind)?)),
            DescriptorKind::Job => Descriptor::Workload(WorkloadKind::Job, typed(body, kind)?),
            DescriptorKind::CronJob => {
                Descriptor::Workload(WorkloadKind::CronJob, typed(body, kind)?)
            }
            DescriptorKind::Deployment => {
                Descriptor::Workload(WorkloadKind::Deployment, typed(body, kind)?)
            }
            DescriptorKind::DaemonSet => {
                Descriptor::Workload(WorkloadKind::DaemonSet, typed(body, kind)?)
            }
            DescriptorKind::StatefulSet => {
                Descriptor::Workload(WorkloadKind::StatefulSet, typed(body, kind)?)
            }
        };
        Ok(descriptor)
    }
}

fn typed<T: DeserializeOwned>(body: Value, kind: DescriptorKind) -> Result<T> {
    serde_yaml::from_value(body)
        .map_err(|e| Error::decode(format!("invalid {kind} descriptor: {e}")))
}

fn string_field(mapping: &Mapping, field: &'static str) -> Result<String> {
    match mapping.get(field) {
        None | Some(Value::Null) => Err(Error::missing_field(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        // an unquoted `1.10` is the float 1.1, so numbers cannot be trusted
        Some(_) => Err(Error::decode(format!("field '{field}' must be a string"))),
    }
}

/// Iterator over the non-empty documents of a descriptor stream.
pub struct DescriptorReader<'de> {
    documents: serde_yaml::Deserializer<'de>,
    position: usize,
}

impl<'de> DescriptorReader<'de> {
    /// Read documents from a string.
    pub fn new(text: &'de str) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_str(text),
            position: 0,
        }
    }

    /// Read documents from a byte stream.
    pub fn from_reader<R: Read + 'de>(reader: R) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_reader(reader),
            position: 0,
        }
    }

    /// 1-based index of the last document returned, empty ones included.
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for DescriptorReader<'_> {
    type Item = Result<DescriptorDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let document = self.documents.next()?;
            self.position = self.position.saturating_add(1);

            let value = match Value::deserialize(document) {
                Ok(value) => value,
                Err(e) => return Some(Err(Error::decode(e.to_string()))),
            };

            match DescriptorDocument::from_value(value) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => {
                    trace!(position = self.position, "Skipping empty document");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
