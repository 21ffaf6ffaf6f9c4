//! Pipeline graph validation and component start ordering

use crate::component::{ComponentError, ComponentId, Kind};
use crate::config::{CollectorConfig, PipelineId};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Signal types a pipeline may carry
pub const SIGNALS: [&str; 3] = ["traces", "metrics", "logs"];

/// Kinds in start order; shutdown walks it backwards
const START_ORDER: [Kind; 4] = [Kind::Extension, Kind::Exporter, Kind::Processor, Kind::Receiver];

/// A component that is used by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub kind: Kind,
    pub id: ComponentId,
    /// Pipelines referencing this component (empty for extensions)
    pub pipelines: Vec<PipelineId>,
}

/// Validated wiring of configured components into pipelines
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    /// Nodes in start order
    nodes: Vec<GraphNode>,
    /// Configured but referenced by nothing
    unused: Vec<(Kind, ComponentId)>,
}

impl PipelineGraph {
    /// Check the `service` section against the configured components
    pub fn build(config: &CollectorConfig) -> Result<Self, ValidationError> {
        if config.service.pipelines.is_empty() {
            return Err(ValidationError::NoPipelines);
        }

        let mut used: IndexMap<(Kind, ComponentId), Vec<PipelineId>> = IndexMap::new();

        let mut seen = HashSet::new();
        for id in &config.service.extensions {
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateExtension(id.clone()));
            }
            if !config.extensions.contains_key(id) {
                return Err(ValidationError::MissingExtension(id.clone()));
            }
            used.entry((Kind::Extension, id.clone())).or_default();
        }

        for (pipeline_id, pipeline) in &config.service.pipelines {
            if !SIGNALS.contains(&pipeline_id.type_name()) {
                return Err(ValidationError::UnknownSignal(pipeline_id.clone()));
            }
            if pipeline.receivers.is_empty() {
                return Err(ValidationError::EmptyReceivers(pipeline_id.clone()));
            }
            if pipeline.exporters.is_empty() {
                return Err(ValidationError::EmptyExporters(pipeline_id.clone()));
            }

            for kind in [Kind::Receiver, Kind::Processor, Kind::Exporter] {
                let mut seen = HashSet::new();
                for id in pipeline.references(kind) {
                    if !seen.insert(id) {
                        return Err(ValidationError::DuplicateReference {
                            pipeline: pipeline_id.clone(),
                            kind,
                            id: id.clone(),
                        });
                    }
                    if !config.section(kind).contains_key(id) {
                        return Err(ValidationError::MissingComponent {
                            pipeline: pipeline_id.clone(),
                            kind,
                            id: id.clone(),
                        });
                    }
                    used.entry((kind, id.clone()))
                        .or_default()
                        .push(pipeline_id.clone());
                }
            }
        }

        // Within a kind, configuration order decides
        let mut nodes = Vec::with_capacity(used.len());
        for kind in START_ORDER {
            for id in config.section(kind).keys() {
                if let Some(pipelines) = used.get(&(kind, id.clone())) {
                    nodes.push(GraphNode {
                        kind,
                        id: id.clone(),
                        pipelines: pipelines.clone(),
                    });
                }
            }
        }

        let unused = config
            .components()
            .filter(|(kind, id, _)| !used.contains_key(&(*kind, (*id).clone())))
            .map(|(kind, id, _)| (kind, id.clone()))
            .collect();

        Ok(Self { nodes, unused })
    }

    /// Extensions, then exporters, processors and receivers
    pub fn start_order(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// Reverse of the start order
    pub fn shutdown_order(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().rev()
    }

    pub fn unused(&self) -> &[(Kind, ComponentId)] {
        &self.unused
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Human-readable summary printed by `--dry-run`
impl fmt::Display for PipelineGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Service Plan")?;
        writeln!(f, "============")?;
        writeln!(f)?;
        writeln!(f, "Components (in start order):")?;
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "  {}. {} {}", i + 1, node.kind, node.id)?;
            if !node.pipelines.is_empty() {
                let pipelines: Vec<String> = node.pipelines.iter().map(ToString::to_string).collect();
                write!(f, " [{}]", pipelines.join(", "))?;
            }
            writeln!(f)?;
        }

        if !self.unused.is_empty() {
            writeln!(f)?;
            writeln!(f, "Not used by the service:")?;
            for (kind, id) in &self.unused {
                writeln!(f, "  {} {}", kind, id)?;
            }
        }

        Ok(())
    }
}

/// Errors found by a dry run
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("service must have at least one pipeline")]
    NoPipelines,

    #[error("pipeline \"{0}\": unknown signal type, expected one of {signals}", signals = SIGNALS.join(", "))]
    UnknownSignal(PipelineId),

    #[error("pipeline \"{0}\" must have at least one receiver")]
    EmptyReceivers(PipelineId),

    #[error("pipeline \"{0}\" must have at least one exporter")]
    EmptyExporters(PipelineId),

    #[error("pipeline \"{pipeline}\" references {kind} \"{id}\" which is not configured")]
    MissingComponent {
        pipeline: PipelineId,
        kind: Kind,
        id: ComponentId,
    },

    #[error("service references extension \"{0}\" which is not configured")]
    MissingExtension(ComponentId),

    #[error("pipeline \"{pipeline}\" references {kind} \"{id}\" more than once")]
    DuplicateReference {
        pipeline: PipelineId,
        kind: Kind,
        id: ComponentId,
    },

    #[error("service references extension \"{0}\" more than once")]
    DuplicateExtension(ComponentId),

    #[error("{kind} \"{id}\" has invalid configuration: {source}")]
    InvalidComponent {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: ComponentError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CollectorConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn id(s: &str) -> ComponentId {
        s.parse().unwrap()
    }

    const BASE: &str = r#"
receivers:
  otlp:
  otlp/unused:
processors:
  batch:
exporters:
  nop:
extensions:
  health_check:
service:
  extensions: [health_check]
  pipelines:
    traces:
      receivers: [otlp]
      processors: [batch]
      exporters: [nop]
    metrics:
      receivers: [otlp]
      exporters: [nop]
"#;

    #[test]
    fn test_start_order() {
        let graph = PipelineGraph::build(&parse(BASE)).unwrap();

        let order: Vec<_> = graph.start_order().map(|n| (n.kind, n.id.to_string())).collect();
        assert_eq!(
            order,
            vec![
                (Kind::Extension, "health_check".to_string()),
                (Kind::Exporter, "nop".to_string()),
                (Kind::Processor, "batch".to_string()),
                (Kind::Receiver, "otlp".to_string()),
            ]
        );

        let shutdown: Vec<_> = graph.shutdown_order().map(|n| n.kind).collect();
        assert_eq!(
            shutdown,
            vec![Kind::Receiver, Kind::Processor, Kind::Exporter, Kind::Extension]
        );
    }

    #[test]
    fn test_shared_component_lists_pipelines() {
        let graph = PipelineGraph::build(&parse(BASE)).unwrap();
        let otlp = graph.start_order().find(|n| n.id == id("otlp")).unwrap();
        assert_eq!(otlp.pipelines, vec![id("traces"), id("metrics")]);
    }

    #[test]
    fn test_unused_components() {
        let graph = PipelineGraph::build(&parse(BASE)).unwrap();
        assert_eq!(graph.unused(), &[(Kind::Receiver, id("otlp/unused"))]);
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_display_plan() {
        let plan = PipelineGraph::build(&parse(BASE)).unwrap().to_string();
        assert!(plan.contains("1. extension health_check"));
        assert!(plan.contains("4. receiver otlp [traces, metrics]"));
        assert!(plan.contains("receiver otlp/unused"));
    }

    #[test]
    fn test_no_pipelines() {
        let result = PipelineGraph::build(&parse("receivers:\n  otlp:\n"));
        assert!(matches!(result, Err(ValidationError::NoPipelines)));
    }

    #[test]
    fn test_unknown_signal() {
        let yaml = r#"
receivers: {otlp: }
exporters: {nop: }
service:
  pipelines:
    profiles:
      receivers: [otlp]
      exporters: [nop]
"#;
        let err = PipelineGraph::build(&parse(yaml)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline \"profiles\": unknown signal type, expected one of traces, metrics, logs"
        );
        assert!(matches!(err, ValidationError::UnknownSignal(p) if p == id("profiles")));
    }

    #[test]
    fn test_named_pipeline_uses_signal_type() {
        let yaml = r#"
receivers: {otlp: }
exporters: {nop: }
service:
  pipelines:
    logs/audit:
      receivers: [otlp]
      exporters: [nop]
"#;
        assert!(PipelineGraph::build(&parse(yaml)).is_ok());
    }

    #[test]
    fn test_missing_exporters() {
        let yaml = r#"
receivers: {otlp: }
service:
  pipelines:
    traces:
      receivers: [otlp]
"#;
        let result = PipelineGraph::build(&parse(yaml));
        assert!(matches!(result, Err(ValidationError::EmptyExporters(_))));
    }

    #[test]
    fn test_reference_not_configured() {
        let yaml = r#"
receivers: {otlp: }
exporters: {nop: }
service:
  pipelines:
    traces:
      receivers: [otlp]
      processors: [batch]
      exporters: [nop]
"#;
        let err = PipelineGraph::build(&parse(yaml)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline \"traces\" references processor \"batch\" which is not configured"
        );
    }

    #[test]
    fn test_duplicate_reference() {
        let yaml = r#"
receivers: {otlp: }
exporters: {nop: }
service:
  pipelines:
    traces:
      receivers: [otlp, otlp]
      exporters: [nop]
"#;
        let result = PipelineGraph::build(&parse(yaml));
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateReference { kind: Kind::Receiver, .. })
        ));
    }

    #[test]
    fn test_missing_extension() {
        let yaml = r#"
receivers: {otlp: }
exporters: {nop: }
service:
  extensions: [health_check]
  pipelines:
    traces:
      receivers: [otlp]
      exporters: [nop]
"#;
        let result = PipelineGraph::build(&parse(yaml));
        assert!(matches!(result, Err(ValidationError::MissingExtension(_))));
    }
}
