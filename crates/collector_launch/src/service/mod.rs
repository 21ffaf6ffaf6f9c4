//! Collector service: pipeline validation and the component lifecycle

mod collector;
mod graph;

pub use collector::*;
pub use graph::*;
