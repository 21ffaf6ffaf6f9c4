//! Exporter that discards everything it receives

use crate::component::{
    decode_config, Component, ComponentError, ComponentId, Factory, Host, Kind,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;

pub const TYPE_NAME: &str = "nop";

/// Accepts no fields
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NopConfig {}

#[derive(Debug, Default)]
pub struct NopExporterFactory;

impl Factory for NopExporterFactory {
    fn kind(&self) -> Kind {
        Kind::Exporter
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn validate(&self, config: &Value) -> Result<(), ComponentError> {
        decode_config::<NopConfig>(config).map(|_| ())
    }

    fn create(&self, _id: &ComponentId, config: Value) -> Result<Box<dyn Component>, ComponentError> {
        decode_config::<NopConfig>(&config)?;
        Ok(Box::new(NopExporter))
    }
}

pub struct NopExporter;

#[async_trait]
impl Component for NopExporter {
    async fn start(&mut self, _host: &Host) -> Result<(), ComponentError> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::effective_config;

    #[test]
    fn test_empty_config() {
        let config = effective_config(&NopExporterFactory, &Value::Null);
        assert!(NopExporterFactory.validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_fields() {
        let config: Value = serde_yaml::from_str("verbosity: detailed\n").unwrap();
        assert!(NopExporterFactory.validate(&config).is_err());
    }
}
