use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use xxhash_rust::xxh3::xxh3_128;

use crate::error::Result;

/// Content hash of a canonicalized value, as 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes `value` after sorting every object's keys, so two values that
    /// differ only in map insertion order share a key.
    pub fn for_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let canonical = canonicalize(serde_json::to_value(value)?);
        let bytes = serde_json::to_vec(&canonical)?;
        Ok(Self(format!("{:032x}", xxh3_128(&bytes))))
    }

    /// Accepts an existing key string if it has the hash shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in listings.
    pub fn prefix(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
