//! Component kinds, identifiers, and the factory/component contracts
//!
//! Every pipeline building block (receiver, processor, exporter, extension)
//! is produced by a [`Factory`] registered in [`Factories`]. A factory can
//! validate its own sub-configuration without side effects, and create a
//! [`Component`] that acquires resources only when started.

mod factory;
mod id;
mod registry;

pub use factory::*;
pub use id::*;
pub use registry::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a pipeline building block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Receiver,
    Processor,
    Exporter,
    Extension,
}

impl Kind {
    /// All kinds, in configuration section order
    pub const ALL: [Kind; 4] = [
        Kind::Receiver,
        Kind::Processor,
        Kind::Exporter,
        Kind::Extension,
    ];

    /// Name of the top-level configuration section holding this kind
    pub fn section(&self) -> &'static str {
        match self {
            Kind::Receiver => "receivers",
            Kind::Processor => "processors",
            Kind::Exporter => "exporters",
            Kind::Extension => "extensions",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Receiver => "receiver",
            Kind::Processor => "processor",
            Kind::Exporter => "exporter",
            Kind::Extension => "extension",
        };
        f.write_str(name)
    }
}
