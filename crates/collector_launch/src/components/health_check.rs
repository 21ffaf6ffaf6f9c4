//! Health check extension
//!
//! Serves a liveness document over HTTP while the collector runs.

use super::http::{validate_endpoint, HttpServer};
use crate::component::{
    decode_config, Component, ComponentError, ComponentId, Factory, Host, Kind,
};
use async_trait::async_trait;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

pub const TYPE_NAME: &str = "health_check";

pub const DEFAULT_ENDPOINT: &str = "0.0.0.0:13133";
pub const DEFAULT_PATH: &str = "/";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthCheckConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_path")]
    pub path: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

impl HealthCheckConfig {
    fn validate(&self) -> Result<(), ComponentError> {
        validate_endpoint(&self.endpoint)?;

        if !self.path.starts_with('/') {
            return Err(ComponentError::InvalidConfig(format!(
                "path '{}' must start with '/'",
                self.path
            )));
        }
        if self.path.contains(['{', '}', '*', ':']) {
            return Err(ComponentError::InvalidConfig(format!(
                "path '{}' must be a literal path",
                self.path
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HealthCheckExtensionFactory;

impl Factory for HealthCheckExtensionFactory {
    fn kind(&self) -> Kind {
        Kind::Extension
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn default_config(&self) -> Value {
        let mut config = Mapping::new();
        config.insert("endpoint".into(), DEFAULT_ENDPOINT.into());
        config.insert("path".into(), DEFAULT_PATH.into());
        Value::Mapping(config)
    }

    fn validate(&self, config: &Value) -> Result<(), ComponentError> {
        decode_config::<HealthCheckConfig>(config)?.validate()
    }

    fn create(&self, id: &ComponentId, config: Value) -> Result<Box<dyn Component>, ComponentError> {
        let config: HealthCheckConfig = decode_config(&config)?;
        config.validate()?;
        Ok(Box::new(HealthCheckExtension {
            id: id.clone(),
            config,
            server: None,
        }))
    }
}

pub struct HealthCheckExtension {
    id: ComponentId,
    config: HealthCheckConfig,
    server: Option<HttpServer>,
}

async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Server available" }))
}

#[async_trait]
impl Component for HealthCheckExtension {
    async fn start(&mut self, host: &Host) -> Result<(), ComponentError> {
        let router = Router::new().route(&self.config.path, get(status));
        self.server = Some(HttpServer::start(&self.id, &self.config.endpoint, router, host).await?);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        if let Some(mut server) = self.server.take() {
            server.stop().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::effective_config;

    fn config(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let merged = effective_config(&HealthCheckExtensionFactory, &Value::Null);
        assert!(HealthCheckExtensionFactory.validate(&merged).is_ok());
    }

    #[test]
    fn test_path_must_be_absolute() {
        let err = HealthCheckExtensionFactory
            .validate(&config("path: health\n"))
            .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_path_must_be_literal() {
        assert!(HealthCheckExtensionFactory
            .validate(&config("path: /health/{id}\n"))
            .is_err());
    }

    #[tokio::test]
    async fn test_serves_status() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let host = Host::new(tx);
        let id: ComponentId = "health_check".parse().unwrap();
        let router = Router::new().route("/health", get(status));

        let mut server = HttpServer::start(&id, "127.0.0.1:0", router, &host)
            .await
            .unwrap();
        let url = format!("http://{}/health", server.local_addr());

        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "Server available");

        server.stop().await.unwrap();
    }
}
