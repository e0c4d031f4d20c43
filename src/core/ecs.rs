use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::content::DefinitionCatalog;
use crate::core::world::{ActionQueue, IdAllocator, RollSource};
use crate::registry::{DefinitionRegistry, LookupTables, RegistryConfig};
use crate::simulation::events::EventBus;
use crate::simulation::executor::{EffectLog, EffectRegistry};
use crate::simulation::time::{advance_time_system, GameTime};
use crate::systems::cast::{cast_intent_system, CastLog};
use crate::systems::caches::refresh_caches_system;
use crate::systems::progression::advance_progression_system;

/// Canonical tick ordering for the simulation.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Simulation,
    Time,
}

/// Build the ECS world with baseline resources around the given catalog.
pub fn create_world(
    catalog: Arc<dyn DefinitionCatalog + Send + Sync>,
    config: RegistryConfig,
    seed: u64,
) -> World {
    let mut world = World::new();
    world.insert_resource(GameTime::default());
    world.insert_resource(ActionQueue::default());
    world.insert_resource(CastLog::default());
    world.insert_resource(EffectLog::default());
    world.insert_resource(EffectRegistry::default());
    world.insert_resource(EventBus::default());
    world.insert_resource(IdAllocator::default());
    world.insert_resource(RollSource::new(seed));
    world.insert_resource(DefinitionRegistry::with_config(catalog, config));
    world.insert_resource(LookupTables::new());
    world
}

/// Build the system schedule in the canonical order: cache refresh, then
/// intents, then per-character advancement, then the clock.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets((TickSet::Intake, TickSet::Simulation, TickSet::Time).chain());

    schedule.add_systems((
        refresh_caches_system.in_set(TickSet::Intake),
        cast_intent_system
            .in_set(TickSet::Intake)
            .after(refresh_caches_system),
        advance_progression_system.in_set(TickSet::Simulation),
        advance_time_system.in_set(TickSet::Time),
    ));

    schedule
}
