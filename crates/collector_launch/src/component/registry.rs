//! Static registry of component factories, keyed by kind and type name

use super::{Factory, Kind};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Factories of one kind, keyed by type name
#[derive(Clone)]
pub struct FactoryMap {
    kind: Kind,
    factories: IndexMap<&'static str, Arc<dyn Factory>>,
}

impl FactoryMap {
    /// Build a map, rejecting duplicate type names and factories of another kind
    pub fn make(kind: Kind, factories: Vec<Arc<dyn Factory>>) -> Result<Self, RegistryError> {
        let mut map = IndexMap::new();
        for factory in factories {
            let type_name = factory.type_name();
            if factory.kind() != kind {
                return Err(RegistryError::KindMismatch {
                    expected: kind,
                    found: factory.kind(),
                    type_name: type_name.to_string(),
                });
            }
            if map.insert(type_name, factory).is_some() {
                return Err(RegistryError::Duplicate {
                    kind,
                    type_name: type_name.to_string(),
                });
            }
        }
        Ok(Self {
            kind,
            factories: map,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn Factory>> {
        self.factories.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for FactoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMap")
            .field("kind", &self.kind)
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The complete, read-only factory registry
#[derive(Debug, Clone)]
pub struct Factories {
    pub receivers: FactoryMap,
    pub processors: FactoryMap,
    pub exporters: FactoryMap,
    pub extensions: FactoryMap,
}

impl Factories {
    /// Build all four maps; every failure is collected rather than only the first
    pub fn new(
        receivers: Vec<Arc<dyn Factory>>,
        processors: Vec<Arc<dyn Factory>>,
        exporters: Vec<Arc<dyn Factory>>,
        extensions: Vec<Arc<dyn Factory>>,
    ) -> Result<Self, RegistryErrors> {
        let mut errors = Vec::new();
        let mut make = |kind, list| {
            FactoryMap::make(kind, list)
                .map_err(|e| errors.push(e))
                .ok()
        };

        let receivers = make(Kind::Receiver, receivers);
        let processors = make(Kind::Processor, processors);
        let exporters = make(Kind::Exporter, exporters);
        let extensions = make(Kind::Extension, extensions);

        match (receivers, processors, exporters, extensions) {
            (Some(receivers), Some(processors), Some(exporters), Some(extensions)) => Ok(Self {
                receivers,
                processors,
                exporters,
                extensions,
            }),
            _ => Err(RegistryErrors(errors)),
        }
    }

    /// Factories of one kind
    pub fn of_kind(&self, kind: Kind) -> &FactoryMap {
        match kind {
            Kind::Receiver => &self.receivers,
            Kind::Processor => &self.processors,
            Kind::Exporter => &self.exporters,
            Kind::Extension => &self.extensions,
        }
    }

    /// Find the constructor for a component type
    pub fn lookup(&self, kind: Kind, type_name: &str) -> Option<&Arc<dyn Factory>> {
        self.of_kind(kind).get(type_name)
    }
}

/// Errors in the binary's own factory list, as opposed to user configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} factory \"{type_name}\"")]
    Duplicate { kind: Kind, type_name: String },

    #[error("{found} factory \"{type_name}\" registered as {expected}")]
    KindMismatch {
        expected: Kind,
        found: Kind,
        type_name: String,
    },
}

/// Every registry error found while building [`Factories`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid factory registry: {}", join_errors(.0))]
pub struct RegistryErrors(pub Vec<RegistryError>);

fn join_errors(errors: &[RegistryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
