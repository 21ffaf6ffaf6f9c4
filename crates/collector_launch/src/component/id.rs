//! Component identifiers: `type[/name]`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one configured component, e.g. `otlp` or `otlp/internal`
///
/// The type selects the factory; the optional name distinguishes several
/// instances of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId {
    type_name: String,
    name: Option<String>,
}

impl ComponentId {
    /// Create an id without an instance name
    pub fn new(type_name: impl Into<String>) -> Result<Self, IdError> {
        let type_name = type_name.into();
        validate_type(&type_name)?;
        Ok(Self {
            type_name,
            name: None,
        })
    }

    /// Create an id with an instance name
    pub fn with_name(
        type_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, IdError> {
        let mut id = Self::new(type_name)?;
        let name = name.into();
        if name.is_empty() {
            return Err(IdError::EmptyName(format!("{}/", id.type_name)));
        }
        id.name = Some(name);
        Ok(id)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Type names start with a letter and contain letters, digits and underscores
fn validate_type(type_name: &str) -> Result<(), IdError> {
    let mut chars = type_name.chars();
    match chars.next() {
        None => return Err(IdError::EmptyType),
        Some(c) if !c.is_ascii_alphabetic() => {
            return Err(IdError::InvalidType(type_name.to_string()))
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(IdError::InvalidType(type_name.to_string()));
    }
    Ok(())
}

impl FromStr for ComponentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((type_name, name)) => Self::with_name(type_name.trim(), name.trim()),
            None => Self::new(s.trim()),
        }
    }
}

impl TryFrom<String> for ComponentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.type_name, name),
            None => f.write_str(&self.type_name),
        }
    }
}

/// Errors that can occur when parsing a component id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("id must not be empty")]
    EmptyType,

    #[error("invalid character(s) in type '{0}'")]
    InvalidType(String),

    #[error("name part must be specified after '/' in '{0}'")]
    EmptyName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_only() {
        let id: ComponentId = "otlp".parse().unwrap();
        assert_eq!(id.type_name(), "otlp");
        assert_eq!(id.name(), None);
        assert_eq!(id.to_string(), "otlp");
    }

    #[test]
    fn test_parse_type_and_name() {
        let id: ComponentId = "health_check/internal".parse().unwrap();
        assert_eq!(id.type_name(), "health_check");
        assert_eq!(id.name(), Some("internal"));
        assert_eq!(id.to_string(), "health_check/internal");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!("".parse::<ComponentId>(), Err(IdError::EmptyType));
        assert!(matches!(
            "1otlp".parse::<ComponentId>(),
            Err(IdError::InvalidType(_))
        ));
        assert!(matches!(
            "otlp/".parse::<ComponentId>(),
            Err(IdError::EmptyName(_))
        ));
    }

    #[test]
    fn test_deserialize_as_map_key() {
        let map: indexmap::IndexMap<ComponentId, serde_yaml::Value> =
            serde_yaml::from_str("otlp:\notlp/2:\n").unwrap();
        let keys: Vec<String> = map.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["otlp", "otlp/2"]);
    }
}
