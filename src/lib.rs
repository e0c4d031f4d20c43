// Re-export core modules for use by game binaries or other consumers
pub mod components;
pub mod content;
pub mod core;
pub mod registry;
pub mod rules;
pub mod simulation;
pub mod systems;

// Expose the main sim wrapper and the types needed for interaction
pub use crate::core::serialization::SaveState;
pub use crate::core::world::{ActionIntent, CultivationSim, CultivatorSummary, Snapshot};
pub use crate::registry::{DefinitionRegistry, LookupTables, RegistryConfig};
pub use crate::simulation::events::{EngineEvent, EventKind, SubscriberId};
