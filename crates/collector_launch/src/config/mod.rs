//! Configuration sources, layer resolution, and the collector schema

mod collector_config;
mod conf;
mod expand;
mod locator;
mod provider;
mod resolver;

pub use collector_config::*;
pub use conf::*;
pub use expand::*;
pub use locator::*;
pub use provider::*;
pub use resolver::*;
