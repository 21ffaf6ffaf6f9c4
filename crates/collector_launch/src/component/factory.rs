//! Factory and component traits

use super::{ComponentId, Kind};
use crate::config::merge_value;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tokio::sync::mpsc;

/// A running pipeline building block
///
/// Resources (listeners, tasks) are acquired in `start` and released in
/// `shutdown`; `shutdown` must join every task the component spawned.
#[async_trait]
pub trait Component: Send {
    /// Acquire resources and begin work
    async fn start(&mut self, host: &Host) -> Result<(), ComponentError>;

    /// Release every resource acquired by `start`
    async fn shutdown(&mut self) -> Result<(), ComponentError>;
}

/// Constructor for one component type
///
/// Factories are shared immutably between the registry and the running
/// collector, hence `Send + Sync`.
pub trait Factory: Send + Sync {
    /// Category this factory builds
    fn kind(&self) -> Kind;

    /// Type name used in configuration, e.g. `otlp`
    fn type_name(&self) -> &'static str;

    /// Configuration used when the user gives none; user values are merged on top
    fn default_config(&self) -> Value {
        Value::Mapping(Mapping::new())
    }

    /// Check a sub-configuration without acquiring any resource
    fn validate(&self, config: &Value) -> Result<(), ComponentError>;

    /// Build a component from a validated sub-configuration
    fn create(&self, id: &ComponentId, config: Value) -> Result<Box<dyn Component>, ComponentError>;
}

/// The factory's default configuration with the user's on top
pub fn effective_config(factory: &dyn Factory, user: &Value) -> Value {
    let mut config = factory.default_config();
    if !user.is_null() {
        merge_value(&mut config, user.clone());
    }
    config
}

/// Deserialize a sub-configuration into a component's typed config
pub fn decode_config<T: DeserializeOwned>(config: &Value) -> Result<T, ComponentError> {
    serde_yaml::from_value(config.clone()).map_err(|e| ComponentError::InvalidConfig(e.to_string()))
}

/// Services the collector offers to running components
#[derive(Debug, Clone)]
pub struct Host {
    reports: mpsc::UnboundedSender<(ComponentId, ComponentError)>,
}

impl Host {
    pub fn new(reports: mpsc::UnboundedSender<(ComponentId, ComponentError)>) -> Self {
        Self { reports }
    }

    /// Report an unrecoverable failure; the collector shuts down in response
    pub fn report_fatal(&self, id: &ComponentId, error: ComponentError) {
        log::error!("[{}] Fatal error: {}", id, error);
        let _ = self.reports.send((id.clone(), error));
    }
}

/// Errors raised by factories and components
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Defaults;

    impl Factory for Defaults {
        fn kind(&self) -> Kind {
            Kind::Extension
        }

        fn type_name(&self) -> &'static str {
            "defaults"
        }

        fn default_config(&self) -> Value {
            serde_yaml::from_str("endpoint: 0.0.0.0:13133\npath: /\n").unwrap()
        }

        fn validate(&self, _config: &Value) -> Result<(), ComponentError> {
            Ok(())
        }

        fn create(&self, _id: &ComponentId, _config: Value) -> Result<Box<dyn Component>, ComponentError> {
            Err(ComponentError::Runtime("not used".into()))
        }
    }

    #[test]
    fn test_effective_config_null_uses_defaults() {
        let config = effective_config(&Defaults, &Value::Null);
        assert_eq!(config, Defaults.default_config());
    }

    #[test]
    fn test_effective_config_merges_user_values() {
        let user: Value = serde_yaml::from_str("path: /health\n").unwrap();
        let config = effective_config(&Defaults, &user);
        assert_eq!(config["endpoint"], Value::from("0.0.0.0:13133"));
        assert_eq!(config["path"], Value::from("/health"));
    }
}
