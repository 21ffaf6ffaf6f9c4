//! Batch processor
//!
//! Only the configuration surface lives here; batching itself is done by the
//! pipeline engine, so the running component is a pass-through.

use crate::component::{
    decode_config, Component, ComponentError, ComponentId, Factory, Host, Kind,
};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::time::Duration;

pub const TYPE_NAME: &str = "batch";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_SEND_BATCH_SIZE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Time after which a batch is sent regardless of size
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Number of items after which a batch is sent regardless of timeout
    #[serde(default = "default_send_batch_size")]
    pub send_batch_size: u32,

    /// Upper bound on batch size; 0 means unbounded
    #[serde(default)]
    pub send_batch_max_size: u32,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_send_batch_size() -> u32 {
    DEFAULT_SEND_BATCH_SIZE
}

/// A duration written as text, or as an integer count of nanoseconds
#[derive(Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Nanos(u64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match DurationValue::deserialize(deserializer)? {
        DurationValue::Nanos(nanos) => Ok(Duration::from_nanos(nanos)),
        DurationValue::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse a duration such as `200ms`, `1.5s` or `1m30s`
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration '{}'", text))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration '{}'", text)),
            other => return Err(format!("unknown unit '{}' in duration '{}'", other, text)),
        };

        total += value * nanos_per_unit;
        rest = tail;
    }

    Ok(Duration::from_nanos(total.round() as u64))
}

impl BatchConfig {
    fn validate(&self) -> Result<(), ComponentError> {
        if self.send_batch_max_size > 0 && self.send_batch_max_size < self.send_batch_size {
            return Err(ComponentError::InvalidConfig(format!(
                "send_batch_max_size ({}) must be greater or equal to send_batch_size ({})",
                self.send_batch_max_size, self.send_batch_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct BatchProcessorFactory;

impl Factory for BatchProcessorFactory {
    fn kind(&self) -> Kind {
        Kind::Processor
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn default_config(&self) -> Value {
        let mut config = Mapping::new();
        config.insert("timeout".into(), "200ms".into());
        config.insert("send_batch_size".into(), DEFAULT_SEND_BATCH_SIZE.into());
        config.insert("send_batch_max_size".into(), 0u32.into());
        Value::Mapping(config)
    }

    fn validate(&self, config: &Value) -> Result<(), ComponentError> {
        decode_config::<BatchConfig>(config)?.validate()
    }

    fn create(&self, id: &ComponentId, config: Value) -> Result<Box<dyn Component>, ComponentError> {
        let config: BatchConfig = decode_config(&config)?;
        config.validate()?;
        Ok(Box::new(BatchProcessor {
            id: id.clone(),
            config,
        }))
    }
}

pub struct BatchProcessor {
    id: ComponentId,
    config: BatchConfig,
}

#[async_trait]
impl Component for BatchProcessor {
    async fn start(&mut self, _host: &Host) -> Result<(), ComponentError> {
        log::info!(
            "[{}] Batching up to {} items every {:?}",
            self.id,
            self.config.send_batch_size,
            self.config.timeout
        );
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}
