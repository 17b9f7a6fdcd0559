//! Content hash used for change detection.
//!
//! The digest is SHA-256 over a canonical JSON rendering of the declared
//! payload, hex encoded and cut to [`HASH_LEN`] characters so it fits a
//! label value. Canonical form:
//!
//! - object keys are sorted
//! - arrays whose elements are all objects with a string `name` are sorted
//!   by that name (containers, ports, registries)
//! - every other array keeps its order (`command`, `args`)

use std::fmt::Write as _;

use cattlectl_core::{Error, Result};
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Label key holding the digest on every object the engine writes.
pub const HASH_LABEL: &str = "cattlectl.io/hash";

/// Hex characters kept from the digest.
pub const HASH_LEN: usize = 32;

/// Digest of a payload's declared fields.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the payload cannot be rendered as JSON.
pub fn change_hash<T: Serialize>(payload: &T) -> Result<String> {
    let value = serde_json::to_value(payload)
        .map_err(|e| Error::decode(format!("cannot hash payload: {e}")))?;
    Ok(hash_value(&value))
}

/// Digest of an already rendered value.
pub fn hash_value(value: &Value) -> String {
    let canonical = canonicalize(value).to_string();
    let digest = Sha256::digest(canonical.as_bytes());

    let mut hex = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN / 2) {
        // writing to a String cannot fail
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Canonical form of `value`.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            let items = items.iter().map(canonicalize).collect_vec();
            match items.iter().map(element_name).collect::<Option<Vec<_>>>() {
                Some(names) if !items.is_empty() => {
                    let sorted = names
                        .into_iter()
                        .map(str::to_string)
                        .zip(items.iter().cloned())
                        .sorted_by(|(a, _), (b, _)| a.cmp(b))
                        .map(|(_, item)| item)
                        .collect();
                    Value::Array(sorted)
                }
                _ => Value::Array(items),
            }
        }
        other => other.clone(),
    }
}

fn element_name(value: &Value) -> Option<&str> {
    value.as_object()?.get("name")?.as_str()
}
