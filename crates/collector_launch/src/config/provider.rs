//! Layer loaders, one per locator scheme

use super::conf::{Conf, ConfError};
use super::locator::{SourceLocator, ENV_SCHEME, FILE_SCHEME, YAML_SCHEME};
use std::collections::HashMap;

/// Loads the layer behind a locator of one scheme
pub trait Provider: Send + Sync {
    /// The scheme this provider serves, e.g. `file`
    fn scheme(&self) -> &'static str;

    /// Read and parse the layer
    fn retrieve(&self, locator: &SourceLocator) -> Result<Conf, ProviderError>;
}

/// `file:<path>`: a YAML file on disk
#[derive(Debug, Clone, Default)]
pub struct FileProvider;

impl Provider for FileProvider {
    fn scheme(&self) -> &'static str {
        FILE_SCHEME
    }

    fn retrieve(&self, locator: &SourceLocator) -> Result<Conf, ProviderError> {
        let path = locator.payload();
        let content = std::fs::read_to_string(path).map_err(|e| ProviderError::Io {
            path: path.to_string(),
            source: e,
        })?;
        Conf::from_yaml(&content).map_err(ProviderError::Parse)
    }
}

/// `yaml:<document>`: the payload itself is the layer
#[derive(Debug, Clone, Default)]
pub struct YamlProvider;

impl Provider for YamlProvider {
    fn scheme(&self) -> &'static str {
        YAML_SCHEME
    }

    fn retrieve(&self, locator: &SourceLocator) -> Result<Conf, ProviderError> {
        Conf::from_yaml(locator.payload()).map_err(ProviderError::Parse)
    }
}

/// `env:<NAME>`: the YAML document stored in an environment variable
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    /// Values that take precedence over the process environment
    pub env: HashMap<String, String>,
}

impl EnvProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }
}

impl Provider for EnvProvider {
    fn scheme(&self) -> &'static str {
        ENV_SCHEME
    }

    fn retrieve(&self, locator: &SourceLocator) -> Result<Conf, ProviderError> {
        let name = locator.payload();
        let content = match self.env.get(name) {
            Some(value) => value.clone(),
            None => std::env::var(name)
                .map_err(|_| ProviderError::UndefinedEnv(name.to_string()))?,
        };
        Conf::from_yaml(&content).map_err(ProviderError::Parse)
    }
}

/// The providers available to the command-line launcher
pub fn default_providers() -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(FileProvider),
        Box::new(YamlProvider),
        Box::new(EnvProvider::new()),
    ]
}

/// Errors that can occur when loading a layer
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{0}' is not set")]
    UndefinedEnv(String),

    #[error(transparent)]
    Parse(ConfError),
}
