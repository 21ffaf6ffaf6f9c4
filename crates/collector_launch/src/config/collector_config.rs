//! Collector configuration schema
//!
//! ```yaml
//! receivers:
//!   otlp:
//!     protocols:
//!       http:
//!         endpoint: 0.0.0.0:4318
//! processors:
//!   batch:
//! exporters:
//!   nop:
//! extensions:
//!   health_check:
//! service:
//!   extensions: [health_check]
//!   pipelines:
//!     traces:
//!       receivers: [otlp]
//!       processors: [batch]
//!       exporters: [nop]
//! ```

use crate::component::{ComponentId, Kind};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

/// Identifies a pipeline; the type is the signal, e.g. `traces` or `metrics/internal`
pub type PipelineId = ComponentId;

/// Root collector configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorConfig {
    /// Receiver sub-configurations (ordered map for deterministic startup)
    #[serde(default)]
    pub receivers: IndexMap<ComponentId, Value>,

    #[serde(default)]
    pub processors: IndexMap<ComponentId, Value>,

    #[serde(default)]
    pub exporters: IndexMap<ComponentId, Value>,

    #[serde(default)]
    pub extensions: IndexMap<ComponentId, Value>,

    /// Which components are wired together and enabled
    #[serde(default)]
    pub service: ServiceConfig,
}

/// The `service` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Extensions to start, in order
    #[serde(default)]
    pub extensions: Vec<ComponentId>,

    #[serde(default)]
    pub pipelines: IndexMap<PipelineId, PipelineConfig>,
}

/// One pipeline: receivers feed processors in order, which feed exporters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub receivers: Vec<ComponentId>,

    #[serde(default)]
    pub processors: Vec<ComponentId>,

    #[serde(default)]
    pub exporters: Vec<ComponentId>,
}

impl PipelineConfig {
    /// References of one kind (extensions are never part of a pipeline)
    pub fn references(&self, kind: Kind) -> &[ComponentId] {
        match kind {
            Kind::Receiver => &self.receivers,
            Kind::Processor => &self.processors,
            Kind::Exporter => &self.exporters,
            Kind::Extension => &[],
        }
    }
}

impl CollectorConfig {
    /// Sub-configurations of one kind
    pub fn section(&self, kind: Kind) -> &IndexMap<ComponentId, Value> {
        match kind {
            Kind::Receiver => &self.receivers,
            Kind::Processor => &self.processors,
            Kind::Exporter => &self.exporters,
            Kind::Extension => &self.extensions,
        }
    }

    /// Every configured component, section by section
    pub fn components(&self) -> impl Iterator<Item = (Kind, &ComponentId, &Value)> {
        Kind::ALL.into_iter().flat_map(move |kind| {
            self.section(kind)
                .iter()
                .map(move |(id, config)| (kind, id, config))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collector_config() {
        let yaml = r#"
receivers:
  otlp:
  otlp/internal:
    protocols:
      http:
        endpoint: 127.0.0.1:4319
exporters:
  nop:
service:
  pipelines:
    traces:
      receivers: [otlp, otlp/internal]
      exporters: [nop]
"#;
        let config: CollectorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.receivers.len(), 2);
        assert!(config.receivers[&"otlp".parse::<ComponentId>().unwrap()].is_null());

        let traces = &config.service.pipelines[&"traces".parse::<PipelineId>().unwrap()];
        assert_eq!(traces.references(Kind::Receiver).len(), 2);
        assert!(traces.references(Kind::Processor).is_empty());

        let kinds: Vec<Kind> = config.components().map(|(kind, _, _)| kind).collect();
        assert_eq!(kinds, vec![Kind::Receiver, Kind::Receiver, Kind::Exporter]);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let yaml = "connectors:\n  forward:\n";
        assert!(serde_yaml::from_str::<CollectorConfig>(yaml).is_err());
    }

    #[test]
    fn test_invalid_component_id_rejected() {
        let yaml = "receivers:\n  \"otlp/\":\n";
        assert!(serde_yaml::from_str::<CollectorConfig>(yaml).is_err());
    }
}
