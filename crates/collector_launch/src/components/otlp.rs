//! OTLP receiver (HTTP transport)
//!
//! Accepts OTLP/HTTP export requests on `/v1/traces`, `/v1/metrics` and
//! `/v1/logs` and acknowledges them. Payload decoding and forwarding belong
//! to the pipeline engine, not to this launcher.

use super::http::{validate_endpoint, HttpServer};
use crate::component::{
    decode_config, Component, ComponentError, ComponentId, Factory, Host, Kind,
};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const TYPE_NAME: &str = "otlp";

/// Default OTLP/HTTP endpoint
pub const DEFAULT_HTTP_ENDPOINT: &str = "0.0.0.0:4318";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtlpReceiverConfig {
    #[serde(default)]
    pub protocols: Protocols,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Protocols {
    /// `http:` with no body enables the protocol with its defaults
    #[serde(default, deserialize_with = "enabled_with_defaults")]
    pub http: Option<HttpProtocol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpProtocol {
    #[serde(default = "default_http_endpoint")]
    pub endpoint: String,
}

impl Default for HttpProtocol {
    fn default() -> Self {
        Self {
            endpoint: default_http_endpoint(),
        }
    }
}

fn default_http_endpoint() -> String {
    DEFAULT_HTTP_ENDPOINT.to_string()
}

fn enabled_with_defaults<'de, D>(deserializer: D) -> Result<Option<HttpProtocol>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(
        Option::<HttpProtocol>::deserialize(deserializer)?.unwrap_or_default(),
    ))
}

impl OtlpReceiverConfig {
    fn validate(&self) -> Result<(), ComponentError> {
        match &self.protocols.http {
            Some(http) => validate_endpoint(&http.endpoint),
            None => Err(ComponentError::InvalidConfig(
                "must specify at least one protocol when using the OTLP receiver".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct OtlpReceiverFactory;

impl Factory for OtlpReceiverFactory {
    fn kind(&self) -> Kind {
        Kind::Receiver
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn default_config(&self) -> Value {
        let mut http = Mapping::new();
        http.insert("endpoint".into(), DEFAULT_HTTP_ENDPOINT.into());
        let mut protocols = Mapping::new();
        protocols.insert("http".into(), Value::Mapping(http));
        let mut config = Mapping::new();
        config.insert("protocols".into(), Value::Mapping(protocols));
        Value::Mapping(config)
    }

    fn validate(&self, config: &Value) -> Result<(), ComponentError> {
        decode_config::<OtlpReceiverConfig>(config)?.validate()
    }

    fn create(&self, id: &ComponentId, config: Value) -> Result<Box<dyn Component>, ComponentError> {
        let config: OtlpReceiverConfig = decode_config(&config)?;
        config.validate()?;
        Ok(Box::new(OtlpReceiver {
            id: id.clone(),
            config,
            stats: Arc::new(ReceiverStats::default()),
            server: None,
        }))
    }
}

/// Request counters
#[derive(Debug, Default)]
struct ReceiverStats {
    requests: AtomicU64,
    bytes: AtomicU64,
}

pub struct OtlpReceiver {
    id: ComponentId,
    config: OtlpReceiverConfig,
    stats: Arc<ReceiverStats>,
    server: Option<HttpServer>,
}

async fn accept(State(stats): State<Arc<ReceiverStats>>, body: Bytes) -> Json<serde_json::Value> {
    stats.requests.fetch_add(1, Ordering::Relaxed);
    stats.bytes.fetch_add(body.len() as u64, Ordering::Relaxed);
    Json(serde_json::json!({}))
}

fn routes(stats: Arc<ReceiverStats>) -> Router {
    Router::new()
        .route("/v1/traces", post(accept))
        .route("/v1/metrics", post(accept))
        .route("/v1/logs", post(accept))
        .with_state(stats)
}

#[async_trait]
impl Component for OtlpReceiver {
    async fn start(&mut self, host: &Host) -> Result<(), ComponentError> {
        let Some(http) = &self.config.protocols.http else {
            return Ok(());
        };

        let router = routes(self.stats.clone());
        self.server = Some(HttpServer::start(&self.id, &http.endpoint, router, host).await?);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        if let Some(mut server) = self.server.take() {
            server.stop().await?;
            log::info!(
                "[{}] Stopped after {} requests ({} bytes)",
                self.id,
                self.stats.requests.load(Ordering::Relaxed),
                self.stats.bytes.load(Ordering::Relaxed)
            );
        }
        Ok(())
    }
}
