//! Turns the ordered source list into one merged configuration document

use super::conf::Conf;
use super::expand::{ConvertError, Converter, ExpandConverter};
use super::locator::SourceLocator;
use super::provider::{default_providers, Provider, ProviderError};
use std::collections::HashMap;

/// Inputs of a [`Resolver`]
pub struct ResolverSettings {
    /// Layers in merge order; later ones win
    pub locators: Vec<SourceLocator>,
    /// Loaders, matched by locator scheme
    pub providers: Vec<Box<dyn Provider>>,
    /// Passes applied to each layer before it is merged
    pub converters: Vec<Box<dyn Converter>>,
}

impl ResolverSettings {
    /// Settings with the default providers and the environment expansion pass
    pub fn new(locators: Vec<SourceLocator>) -> Self {
        Self {
            locators,
            providers: default_providers(),
            converters: vec![Box::new(ExpandConverter::new())],
        }
    }

    /// Replace the converters
    pub fn with_converters(mut self, converters: Vec<Box<dyn Converter>>) -> Self {
        self.converters = converters;
        self
    }
}

/// Loads, expands and merges configuration layers
pub struct Resolver {
    locators: Vec<SourceLocator>,
    providers: HashMap<&'static str, Box<dyn Provider>>,
    converters: Vec<Box<dyn Converter>>,
}

impl Resolver {
    /// Create a resolver, checking every locator's scheme before any I/O
    pub fn new(settings: ResolverSettings) -> Result<Self, ResolverError> {
        if settings.locators.is_empty() {
            return Err(ResolverError::NoLocators);
        }

        let mut providers: HashMap<&'static str, Box<dyn Provider>> = HashMap::new();
        for provider in settings.providers {
            let scheme = provider.scheme();
            if providers.insert(scheme, provider).is_some() {
                return Err(ResolverError::DuplicateProvider(scheme.to_string()));
            }
        }

        for locator in &settings.locators {
            if !providers.contains_key(locator.scheme()) {
                return Err(ResolverError::UnsupportedScheme {
                    locator: locator.to_string(),
                    scheme: locator.scheme().to_string(),
                });
            }
        }

        Ok(Self {
            locators: settings.locators,
            providers,
            converters: settings.converters,
        })
    }

    /// Load every layer, expand it, and merge it over the previous ones
    pub fn resolve(&self) -> Result<Conf, ResolverError> {
        let mut merged = Conf::new();

        for locator in &self.locators {
            let provider = self.providers.get(locator.scheme()).ok_or_else(|| {
                ResolverError::UnsupportedScheme {
                    locator: locator.to_string(),
                    scheme: locator.scheme().to_string(),
                }
            })?;

            log::debug!("Loading configuration layer: {}", locator);
            let mut layer = provider
                .retrieve(locator)
                .map_err(|e| ResolverError::Retrieve {
                    locator: locator.to_string(),
                    source: e,
                })?;

            for converter in &self.converters {
                converter
                    .convert(&mut layer)
                    .map_err(|e| ResolverError::Convert {
                        locator: locator.to_string(),
                        converter: converter.name(),
                        source: e,
                    })?;
            }

            merged.merge(layer);
        }

        Ok(merged)
    }
}

/// Errors that can occur while resolving the configuration
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("at least one config flag must be provided")]
    NoLocators,

    #[error("Multiple providers registered for scheme '{0}'")]
    DuplicateProvider(String),

    #[error("Unsupported scheme '{scheme}' in config source '{locator}'")]
    UnsupportedScheme { locator: String, scheme: String },

    #[error("Failed to load config source '{locator}': {source}")]
    Retrieve {
        locator: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to {converter} config source '{locator}': {source}")]
    Convert {
        locator: String,
        converter: &'static str,
        #[source]
        source: ConvertError,
    },
}
