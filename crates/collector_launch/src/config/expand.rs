//! Expansion engine for ${NAME}, ${env:NAME}, $NAME and $$ patterns
//!
//! Expansion runs on each layer before it is merged, so a value can never
//! pick up another layer's raw placeholder. A reference to a variable that
//! is not defined is an error, never an empty string.
//!
//! A scalar that is exactly one reference takes the type of the expanded
//! text, so `${SIZE}` with `SIZE=512` becomes a number. Quoting is lost when
//! the layer is parsed, which means `"${SIZE}"` is re-typed as well. Text
//! around a reference, as in `"${HOST}:${PORT}"`, always stays a string.

use super::conf::Conf;
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `$$`, `${scheme:name}`, `${name}` or `$name`
static EXPANSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$\{(?:(\w+):)?([^}]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A pass applied to every layer after it is loaded and before it is merged
pub trait Converter: Send + Sync {
    /// Short name used in error reports
    fn name(&self) -> &'static str;

    /// Rewrite the layer in place
    fn convert(&self, conf: &mut Conf) -> Result<(), ConvertError>;
}

/// Expands environment variable references in string values
#[derive(Debug, Clone)]
pub struct ExpandConverter {
    /// Variables that take precedence over the process environment
    pub env: HashMap<String, String>,
    /// Whether to fall back to the process environment
    pub use_process_env: bool,
}

impl Default for ExpandConverter {
    fn default() -> Self {
        Self {
            env: HashMap::new(),
            use_process_env: true,
        }
    }
}

impl ExpandConverter {
    /// Create a converter backed by the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter that only sees variables added with [`with_env`](Self::with_env)
    pub fn isolated() -> Self {
        Self {
            env: HashMap::new(),
            use_process_env: false,
        }
    }

    /// Add a variable
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Expand all references in a string
    pub fn expand(&self, input: &str) -> Result<String, ConvertError> {
        let mut error: Option<ConvertError> = None;

        let result = EXPANSION_PATTERN.replace_all(input, |caps: &Captures| {
            if error.is_some() {
                return String::new();
            }

            match self.resolve_capture(caps) {
                Ok(value) => value,
                Err(e) => {
                    error = Some(e);
                    String::new()
                }
            }
        });

        if let Some(e) = error {
            return Err(e);
        }

        Ok(result.into_owned())
    }

    /// Expand a scalar and keep numbers and booleans typed when the whole
    /// scalar was a single reference, e.g. `send_batch_size: ${SIZE}`.
    /// Applies to quoted scalars too.
    fn expand_scalar(&self, input: &str) -> Result<Value, ConvertError> {
        let expanded = self.expand(input)?;

        let whole_reference = EXPANSION_PATTERN
            .find(input)
            .is_some_and(|m| m.start() == 0 && m.end() == input.len() && m.as_str() != "$$");

        if whole_reference {
            if let Ok(typed @ (Value::Bool(_) | Value::Number(_))) =
                serde_yaml::from_str::<Value>(&expanded)
            {
                return Ok(typed);
            }
        }

        Ok(Value::String(expanded))
    }

    fn resolve_capture(&self, caps: &Captures) -> Result<String, ConvertError> {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        if whole == "$$" {
            return Ok("$".to_string());
        }

        // ${scheme:name} or ${name}
        if let Some(name) = caps.get(2) {
            let name = name.as_str().trim();
            return match caps.get(1).map(|m| m.as_str()) {
                None | Some("env") => self.lookup(name, whole),
                Some(other) => Err(ConvertError::UnknownScheme {
                    scheme: other.to_string(),
                    reference: whole.to_string(),
                }),
            };
        }

        // $name
        if let Some(name) = caps.get(3) {
            return self.lookup(name.as_str(), whole);
        }

        Err(ConvertError::InvalidReference(whole.to_string()))
    }

    fn lookup(&self, name: &str, reference: &str) -> Result<String, ConvertError> {
        if !VARIABLE_NAME.is_match(name) {
            return Err(ConvertError::InvalidReference(reference.to_string()));
        }

        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }

        if self.use_process_env {
            if let Ok(value) = std::env::var(name) {
                return Ok(value);
            }
        }

        Err(ConvertError::UndefinedVariable(name.to_string()))
    }

    fn expand_value(&self, value: &mut Value) -> Result<(), ConvertError> {
        match value {
            Value::String(s) => {
                *value = self.expand_scalar(s)?;
            }
            Value::Sequence(items) => {
                for item in items {
                    self.expand_value(item)?;
                }
            }
            Value::Mapping(mapping) => {
                for (_, item) in mapping.iter_mut() {
                    self.expand_value(item)?;
                }
            }
            Value::Tagged(tagged) => self.expand_value(&mut tagged.value)?,
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }
}

impl Converter for ExpandConverter {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn convert(&self, conf: &mut Conf) -> Result<(), ConvertError> {
        for (_, value) in conf.as_mapping_mut().iter_mut() {
            self.expand_value(value)?;
        }
        Ok(())
    }
}

/// Errors that can occur during expansion
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Undefined environment variable: {0}")]
    UndefinedVariable(String),

    #[error("Unknown expansion scheme '{scheme}' in {reference}")]
    UnknownScheme { scheme: String, reference: String },

    #[error("Invalid variable reference: {0}")]
    InvalidReference(String),
}
