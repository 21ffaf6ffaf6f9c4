//! Source locators, the command-line accumulator and `--set` translation

use super::conf::KEY_DELIMITER;
use std::fmt;

/// Scheme of file-based layers
pub const FILE_SCHEME: &str = "file";
/// Scheme of inline YAML layers, as produced by `--set`
pub const YAML_SCHEME: &str = "yaml";
/// Scheme of layers read from an environment variable
pub const ENV_SCHEME: &str = "env";

/// Where one configuration layer comes from, written `scheme:payload`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocator {
    scheme: String,
    payload: String,
}

impl SourceLocator {
    /// Create a locator from its parts
    pub fn new(scheme: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            payload: payload.into(),
        }
    }

    /// Parse a raw locator; strings without a scheme are file paths
    pub fn parse(raw: &str) -> Self {
        match split_scheme(raw) {
            Some((scheme, payload)) => Self::new(scheme, payload),
            None => Self::new(FILE_SCHEME, raw),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.payload)
    }
}

/// Split `scheme:payload` if the prefix is a plausible URI scheme.
///
/// Single letters are rejected so `C:\config.yaml` stays a path.
fn split_scheme(raw: &str) -> Option<(&str, &str)> {
    let (scheme, payload) = raw.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, payload))
}

/// Translate a `dotted.path=value` override into an inline YAML layer.
///
/// Only the first `=` separates path from value. Path and value are trimmed,
/// and every `.` in the path becomes [`KEY_DELIMITER`]:
/// `processors.batch.timeout=2s` becomes `yaml:processors::batch::timeout: 2s`.
pub fn translate_override(expr: &str) -> Result<SourceLocator, OverrideError> {
    let (path, value) = expr.split_once('=').ok_or(OverrideError::MissingEqualSign)?;

    let path = path.trim().replace('.', KEY_DELIMITER);
    if path.is_empty() {
        return Err(OverrideError::EmptyPath(expr.to_string()));
    }

    Ok(SourceLocator::new(
        YAML_SCHEME,
        format!("{}: {}", path, value.trim()),
    ))
}

/// Accumulates `--config` and `--set` occurrences during one argument parse
///
/// Overrides always come after every config source, whatever the order on
/// the command line, so they take precedence when merged.
#[derive(Debug, Clone, Default)]
pub struct SourceList {
    configs: Vec<SourceLocator>,
    overrides: Vec<SourceLocator>,
}

impl SourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a config source. Existence and syntax are checked by the resolver.
    pub fn add(&mut self, locator: &str) {
        self.configs.push(SourceLocator::parse(locator));
    }

    /// Translate and append an override expression
    pub fn add_override(&mut self, expr: &str) -> Result<(), OverrideError> {
        let locator = translate_override(expr)?;
        self.overrides.push(locator);
        Ok(())
    }

    /// Append an already translated override layer
    pub fn push_override(&mut self, locator: SourceLocator) {
        self.overrides.push(locator);
    }

    pub fn len(&self) -> usize {
        self.configs.len() + self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ordered source list: config sources, then overrides
    pub fn into_locators(self) -> Vec<SourceLocator> {
        let mut locators = self.configs;
        locators.extend(self.overrides);
        locators
    }
}

/// A malformed `--set` expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    #[error("missing equal sign")]
    MissingEqualSign,

    #[error("missing property path in '{0}'")]
    EmptyPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_override() {
        let locator = translate_override("processors.batch.timeout=2s").unwrap();
        assert_eq!(locator.to_string(), "yaml:processors::batch::timeout: 2s");
        assert_eq!(locator.scheme(), YAML_SCHEME);
    }

    #[test]
    fn test_translate_override_keeps_equals_in_value() {
        let locator = translate_override("exporters.nop.header=a=b=c").unwrap();
        assert_eq!(locator.payload(), "exporters::nop::header: a=b=c");
    }

    #[test]
    fn test_translate_override_trims() {
        let locator = translate_override("  a.b  =  some value  ").unwrap();
        assert_eq!(locator.payload(), "a::b: some value");
    }

    #[test]
    fn test_translate_override_missing_equal_sign() {
        assert_eq!(
            translate_override("timeout"),
            Err(OverrideError::MissingEqualSign)
        );
        assert_eq!(
            translate_override("processors.batch.timeout").unwrap_err().to_string(),
            "missing equal sign"
        );
    }

    #[test]
    fn test_translate_override_empty_path() {
        assert!(matches!(
            translate_override(" =2s"),
            Err(OverrideError::EmptyPath(_))
        ));
    }

    #[test]
    fn test_parse_locator() {
        let file = SourceLocator::parse("file:/etc/collector.yaml");
        assert_eq!(file.scheme(), "file");
        assert_eq!(file.payload(), "/etc/collector.yaml");

        let bare = SourceLocator::parse("configs/collector.yaml");
        assert_eq!(bare.scheme(), FILE_SCHEME);
        assert_eq!(bare.payload(), "configs/collector.yaml");

        let drive = SourceLocator::parse("C:\\collector.yaml");
        assert_eq!(drive.scheme(), FILE_SCHEME);
        assert_eq!(drive.payload(), "C:\\collector.yaml");

        let inline = SourceLocator::parse("yaml:a::b: 1");
        assert_eq!(inline.scheme(), YAML_SCHEME);
        assert_eq!(inline.payload(), "a::b: 1");
    }

    #[test]
    fn test_overrides_follow_configs() {
        let mut sources = SourceList::new();
        sources.add_override("processors.batch.timeout=2s").unwrap();
        sources.add("file:/a.yaml");
        sources.add("file:/b.yaml");
        sources.add("file:/a.yaml");

        let locators: Vec<String> = sources
            .into_locators()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            locators,
            vec![
                "file:/a.yaml",
                "file:/b.yaml",
                "file:/a.yaml",
                "yaml:processors::batch::timeout: 2s",
            ]
        );
    }
}
