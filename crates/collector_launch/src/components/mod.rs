//! Components compiled into the launcher

pub mod batch;
pub mod health_check;
pub mod http;
pub mod nop;
pub mod otlp;

use crate::component::{Factories, RegistryErrors};
use std::sync::Arc;

/// Registry of every built-in factory
pub fn builtin_factories() -> Result<Factories, RegistryErrors> {
    Factories::new(
        vec![Arc::new(otlp::OtlpReceiverFactory)],
        vec![Arc::new(batch::BatchProcessorFactory)],
        vec![Arc::new(nop::NopExporterFactory)],
        vec![Arc::new(health_check::HealthCheckExtensionFactory)],
    )
}
