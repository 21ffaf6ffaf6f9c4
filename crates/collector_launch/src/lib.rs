//! Collector Launcher
//!
//! Bootstraps a telemetry collector from layered configuration sources.
//!
//! # Overview
//!
//! The launcher:
//! - collects `--config` locators and `--set` overrides from the command line
//! - resolves them into one configuration, later layers winning
//! - binds every configured component to a registered factory
//! - validates the result with a dry run that acquires nothing
//! - runs the components until Ctrl+C, then shuts them down in reverse order
//!
//! # Example
//!
//! ```text
//! collector_launch --config collector.yaml \
//!     --set receivers.otlp.protocols.http.endpoint=127.0.0.1:4318
//! ```
//!
//! ```yaml
//! receivers:
//!   otlp:
//! processors:
//!   batch:
//!     timeout: ${env:BATCH_TIMEOUT}
//! exporters:
//!   nop:
//! service:
//!   pipelines:
//!     traces:
//!       receivers: [otlp]
//!       processors: [batch]
//!       exporters: [nop]
//! ```

pub mod cli;
pub mod component;
pub mod components;
pub mod config;
pub mod service;

pub use cli::CollectorArgs;
pub use component::{Component, ComponentError, ComponentId, Factories, Factory, Kind};
pub use components::builtin_factories;
pub use config::{Conf, Resolver, ResolverError, ResolverSettings, SourceList, SourceLocator};
pub use service::{
    BuildError, Collector, CollectorError, CollectorSettings, CollectorState, PipelineGraph,
    RuntimeError, ValidationError,
};
