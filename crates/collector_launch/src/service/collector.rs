//! Collector lifecycle: build, dry run, run
//!
//! The phases are encoded in the type: [`Collector<Built>`] can only be
//! validated, and only the [`Collector<Validated>`] returned by
//! [`Collector::dry_run`] can be run. Each transition consumes the collector.

use super::graph::{PipelineGraph, ValidationError};
use crate::component::{
    effective_config, Component, ComponentError, ComponentId, Factories, Factory, Host, Kind,
    RegistryErrors,
};
use crate::config::{
    CollectorConfig, Conf, ConfError, Resolver, ResolverError, ResolverSettings, SourceLocator,
};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Everything needed to build a collector
pub struct CollectorSettings {
    pub factories: Arc<Factories>,
    pub resolver: ResolverSettings,
}

impl CollectorSettings {
    /// Default providers and converters over the given locators
    pub fn new(factories: Arc<Factories>, locators: Vec<SourceLocator>) -> Self {
        Self {
            factories,
            resolver: ResolverSettings::new(locators),
        }
    }
}

/// Lifecycle state, for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Built,
    Validated,
    Running,
    Stopped,
    Failed,
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectorState::Built => "built",
            CollectorState::Validated => "validated",
            CollectorState::Running => "running",
            CollectorState::Stopped => "stopped",
            CollectorState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Marker for the phases a [`Collector`] value can be in
pub trait Phase {
    const STATE: CollectorState;
}

/// A configured component bound to its factory
#[derive(Clone)]
struct BoundComponent {
    kind: Kind,
    id: ComponentId,
    factory: Arc<dyn Factory>,
    /// Factory defaults with the user configuration merged on top
    config: Value,
}

/// Configuration decoded and every component bound to a factory
pub struct Built {
    config: CollectorConfig,
    components: Vec<BoundComponent>,
}

/// Configuration checked; nothing acquired yet
pub struct Validated {
    graph: PipelineGraph,
    components: IndexMap<(Kind, ComponentId), BoundComponent>,
}

impl Phase for Built {
    const STATE: CollectorState = CollectorState::Built;
}

impl Phase for Validated {
    const STATE: CollectorState = CollectorState::Validated;
}

pub struct Collector<S> {
    phase: S,
}

impl<S: Phase> Collector<S> {
    pub fn state(&self) -> CollectorState {
        S::STATE
    }
}

impl Collector<Built> {
    /// Resolve the configuration sources and bind every component
    pub fn build(settings: CollectorSettings) -> Result<Self, CollectorError> {
        let resolver = Resolver::new(settings.resolver)?;
        let conf = resolver.resolve()?;
        Ok(Self::from_conf(conf, &settings.factories)?)
    }

    /// Bind an already resolved configuration
    pub fn from_conf(conf: Conf, factories: &Factories) -> Result<Self, BuildError> {
        let config: CollectorConfig = conf.decode()?;

        let mut components = Vec::new();
        for (kind, id, user) in config.components() {
            let factory = factories.lookup(kind, id.type_name()).ok_or_else(|| {
                BuildError::UnknownComponent {
                    kind,
                    type_name: id.type_name().to_string(),
                    id: id.clone(),
                }
            })?;

            components.push(BoundComponent {
                kind,
                id: id.clone(),
                factory: factory.clone(),
                config: effective_config(factory.as_ref(), user),
            });
        }

        log::debug!("Built collector with {} components", components.len());
        Ok(Self {
            phase: Built { config, components },
        })
    }

    /// Validate every component and the pipeline graph without acquiring anything
    pub fn dry_run(self) -> Result<Collector<Validated>, ValidationError> {
        let Built { config, components } = self.phase;

        for component in &components {
            component
                .factory
                .validate(&component.config)
                .map_err(|source| ValidationError::InvalidComponent {
                    kind: component.kind,
                    id: component.id.clone(),
                    source,
                })?;
        }

        let graph = PipelineGraph::build(&config)?;
        for (kind, id) in graph.unused() {
            log::warn!("[{}] {} is configured but not used by the service", id, kind);
        }

        let components = components
            .into_iter()
            .map(|c| ((c.kind, c.id.clone()), c))
            .collect();

        Ok(Collector {
            phase: Validated { graph, components },
        })
    }
}

impl Collector<Validated> {
    pub fn graph(&self) -> &PipelineGraph {
        &self.phase.graph
    }

    /// Start every used component and serve until `shutdown` fires or a component fails
    pub async fn run(self, mut shutdown: watch::Receiver<()>) -> Result<(), RuntimeError> {
        let Validated {
            graph,
            mut components,
        } = self.phase;

        let (reports_tx, mut reports) = mpsc::unbounded_channel();
        let host = Host::new(reports_tx);
        let mut started: Vec<(ComponentId, Box<dyn Component>)> = Vec::with_capacity(graph.len());

        log::info!("Starting {} components...", graph.len());
        for node in graph.start_order() {
            let Some(bound) = components.shift_remove(&(node.kind, node.id.clone())) else {
                continue;
            };

            let mut component = match bound.factory.create(&bound.id, bound.config) {
                Ok(component) => component,
                Err(source) => {
                    shutdown_all(started).await;
                    log::info!("Collector state: {}", CollectorState::Failed);
                    return Err(RuntimeError::CreateFailed {
                        kind: bound.kind,
                        id: bound.id,
                        source,
                    });
                }
            };

            log::info!("[{}] Starting {}", bound.id, bound.kind);
            if let Err(source) = component.start(&host).await {
                shutdown_all(started).await;
                log::info!("Collector state: {}", CollectorState::Failed);
                return Err(RuntimeError::StartFailed {
                    kind: bound.kind,
                    id: bound.id,
                    source,
                });
            }
            started.push((bound.id, component));
        }

        log::info!("Collector state: {}", CollectorState::Running);

        let outcome = tokio::select! {
            _ = shutdown.changed() => {
                log::info!("Shutdown signal received");
                Ok(())
            }
            Some((id, source)) = reports.recv() => {
                Err(RuntimeError::ComponentFailed { id, source })
            }
        };

        let failures = shutdown_all(started).await;
        let outcome = match outcome {
            Ok(()) if !failures.is_empty() => Err(RuntimeError::ShutdownFailed(failures)),
            other => other,
        };

        let state = match outcome {
            Ok(()) => CollectorState::Stopped,
            Err(_) => CollectorState::Failed,
        };
        log::info!("Collector state: {}", state);
        outcome
    }
}

/// Shut components down in reverse start order, collecting failures
async fn shutdown_all(
    started: Vec<(ComponentId, Box<dyn Component>)>,
) -> Vec<(ComponentId, ComponentError)> {
    let mut failures = Vec::new();
    for (id, mut component) in started.into_iter().rev() {
        log::debug!("[{}] Shutting down", id);
        if let Err(e) = component.shutdown().await {
            log::error!("[{}] Error during shutdown: {}", id, e);
            failures.push((id, e));
        }
    }
    failures
}

/// Errors binding a resolved configuration to factories
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfError),

    #[error("unknown {kind} type \"{type_name}\" for \"{id}\"")]
    UnknownComponent {
        kind: Kind,
        type_name: String,
        id: ComponentId,
    },
}

/// Errors while running
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to create {kind} \"{id}\": {source}")]
    CreateFailed {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: ComponentError,
    },

    #[error("failed to start {kind} \"{id}\": {source}")]
    StartFailed {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: ComponentError,
    },

    #[error("component \"{id}\" failed: {source}")]
    ComponentFailed {
        id: ComponentId,
        #[source]
        source: ComponentError,
    },

    #[error("failed to shut down: {}", join_failures(.0))]
    ShutdownFailed(Vec<(ComponentId, ComponentError)>),
}

fn join_failures(failures: &[(ComponentId, ComponentError)]) -> String {
    failures
        .iter()
        .map(|(id, e)| format!("{}: {}", id, e))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Any failure of the launcher, phase by phase
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error(transparent)]
    Registry(#[from] RegistryErrors),

    #[error("failed to resolve config: {0}")]
    Resolve(#[from] ResolverError),

    #[error("failed to build collector: {0}")]
    Build(#[from] BuildError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
