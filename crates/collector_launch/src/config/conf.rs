//! Configuration document and the layer merge policy

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

/// Separator that expresses nesting inside a single key, e.g. `processors::batch::timeout`
pub const KEY_DELIMITER: &str = "::";

/// A configuration document (one layer, or the merge of several)
///
/// The root is always a map. Keys containing [`KEY_DELIMITER`] are expanded
/// into nested maps when the document is built, so `a::b: 1` and
/// `a: { b: 1 }` are the same document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conf {
    root: Mapping,
}

impl Conf {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed YAML value
    ///
    /// `null` (an empty file) is an empty document; any other non-map root is rejected.
    pub fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(mapping) => Ok(Self {
                root: expand_keys(mapping),
            }),
            other => Err(ConfError::NotAMap(value_kind(&other))),
        }
    }

    /// Parse a document from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfError> {
        let value: Value = serde_yaml::from_str(content).map_err(ConfError::Parse)?;
        Self::from_value(value)
    }

    /// Merge `other` on top of this document
    ///
    /// Maps are joined key by key; any other value in `other` (scalar,
    /// sequence, null) replaces the existing one wholesale.
    pub fn merge(&mut self, other: Conf) {
        merge_mapping(&mut self.root, other.root);
    }

    /// Look up a value by a `::`-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(KEY_DELIMITER);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether the document has no keys
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Mutable access to the root map, used by converters
    pub fn as_mapping_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Deserialize the document into a typed configuration
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ConfError> {
        serde_yaml::from_value(Value::Mapping(self.root.clone())).map_err(ConfError::Decode)
    }
}

/// Merge `src` into `dst` with the layer policy (maps joined, everything else replaced)
pub fn merge_value(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Mapping(dst), Value::Mapping(src)) => merge_mapping(dst, src),
        (dst, src) => *dst = src,
    }
}

fn merge_mapping(dst: &mut Mapping, src: Mapping) {
    for (key, value) in src {
        match dst.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                dst.insert(key, value);
            }
        }
    }
}

/// Rebuild a map so that every `a::b` key becomes nested maps, recursively
fn expand_keys(mapping: Mapping) -> Mapping {
    let mut expanded = Mapping::new();

    for (key, value) in mapping {
        let value = match value {
            Value::Mapping(inner) => Value::Mapping(expand_keys(inner)),
            other => other,
        };

        let nested = match key.as_str() {
            Some(path) if path.contains(KEY_DELIMITER) => {
                let mut segments: Vec<&str> = path.split(KEY_DELIMITER).collect();
                // split always yields at least one segment
                let last = segments.pop().unwrap_or_default();
                let mut entry = Mapping::new();
                entry.insert(Value::String(last.to_string()), value);
                for segment in segments.into_iter().rev() {
                    let mut parent = Mapping::new();
                    parent.insert(Value::String(segment.to_string()), Value::Mapping(entry));
                    entry = parent;
                }
                entry
            }
            _ => {
                let mut entry = Mapping::new();
                entry.insert(key, value);
                entry
            }
        };

        merge_mapping(&mut expanded, nested);
    }

    expanded
}

/// Short name of a YAML value's type, for error messages
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged value",
    }
}

/// Errors that can occur while building or decoding a document
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    #[error("Failed to parse YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("Configuration root must be a map, found {0}")]
    NotAMap(&'static str),

    #[error("Failed to decode configuration: {0}")]
    Decode(#[source] serde_yaml::Error),
}
