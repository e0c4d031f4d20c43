use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::components::{Cultivator, CultivatorId, Name};
use crate::content::DefinitionCatalog;
use crate::core::ecs::{create_schedule, create_world};
use crate::core::serialization::{
    apply_state_to_world, extract_state_from_world, load_state_from_path, save_state_to_path,
    SaveState,
};
use crate::registry::{DefinitionRegistry, RegistryConfig};
use crate::rules::{AbilityId, TalentDef, TalentTier, TechniqueId};
use crate::simulation::abilities::AbilityManager;
use crate::simulation::events::{EngineEvent, EventBus, EventKind, SubscriberId};
use crate::simulation::executor::EffectLog;
use crate::simulation::progression::ProgressionState;
use crate::simulation::time::GameTime;
use crate::systems::cast::CastLog;

/// Intent-driven commands fed into the ECS each tick.
#[derive(Debug, Clone)]
pub enum ActionIntent {
    Cast { cultivator: u32, ability: AbilityId },
    AttemptBreakthrough { cultivator: u32 },
    LearnAbility { cultivator: u32, ability: AbilityId, pay: bool },
    LearnTechnique { cultivator: u32, technique: TechniqueId },
    SetAutoProgression { cultivator: u32, enabled: bool },
    Wait,
}

impl ActionIntent {
    pub fn cultivator(&self) -> Option<u32> {
        match self {
            ActionIntent::Cast { cultivator, .. }
            | ActionIntent::AttemptBreakthrough { cultivator }
            | ActionIntent::LearnAbility { cultivator, .. }
            | ActionIntent::LearnTechnique { cultivator, .. }
            | ActionIntent::SetAutoProgression { cultivator, .. } => Some(*cultivator),
            ActionIntent::Wait => None,
        }
    }
}

/// Resource storing the intents for the next tick.
#[derive(Resource, Default, Debug)]
pub struct ActionQueue(pub Vec<ActionIntent>);

#[derive(Resource, Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn alloc(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn bump_to_at_least(&mut self, floor: u32) {
        if self.next < floor {
            self.next = floor;
        }
    }
}

/// Deterministic roll stream for breakthrough resolution. The engine treats
/// the success chance as data and the roll as an input; this is the default
/// input source.
#[derive(Resource, Debug)]
pub struct RollSource {
    state: u64,
}

impl RollSource {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(0x9E3779B97F4A7C15).max(1),
        }
    }

    /// Uniform value in [0, 1).
    pub fn next_roll(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Data snapshot returned to external consumers after each tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: u64,
    pub day: u32,
    pub cast_log: Vec<String>,
    pub effect_log: Vec<String>,
    pub cultivators: Vec<CultivatorSummary>,
}

#[derive(Debug, Clone)]
pub struct CultivatorSummary {
    pub id: u32,
    pub name: String,
    pub realm: crate::rules::Realm,
    pub stage: u8,
    pub qi: (f64, f64),
    pub progression_points: f64,
    pub ability_points: u32,
    pub learned_abilities: usize,
    pub auto_progression: bool,
}

impl Snapshot {
    fn capture(world: &World) -> Snapshot {
        let time = world.resource::<GameTime>();
        let cast_log = world.resource::<CastLog>().0.clone();
        let effect_log = world.resource::<EffectLog>().0.clone();

        let mut cultivators = Vec::new();
        for entity in world.iter_entities() {
            let Some(id) = entity.get::<CultivatorId>() else {
                continue;
            };
            let Some(state) = entity.get::<ProgressionState>() else {
                continue;
            };
            let Some(manager) = entity.get::<AbilityManager>() else {
                continue;
            };
            let name = entity
                .get::<Name>()
                .map(|n| n.0.clone())
                .unwrap_or_else(|| format!("Cultivator {}", id.0));
            cultivators.push(CultivatorSummary {
                id: id.0,
                name,
                realm: state.realm,
                stage: state.stage,
                qi: (state.current_qi, state.max_qi),
                progression_points: state.progression_points,
                ability_points: manager.ability_points,
                learned_abilities: manager.learned.len(),
                auto_progression: state.auto_progression,
            });
        }
        cultivators.sort_by_key(|c| c.id);

        Snapshot {
            tick: time.tick,
            day: time.day,
            cast_log,
            effect_log,
            cultivators,
        }
    }
}

/// Wrapper around the ECS world and schedule.
pub struct CultivationSim {
    world: World,
    schedule: Schedule,
    seed: u64,
}

impl CultivationSim {
    /// Create a simulation over the given catalog with default cache windows.
    pub fn new(catalog: Arc<dyn DefinitionCatalog + Send + Sync>, seed: u64) -> Self {
        Self::with_config(catalog, RegistryConfig::default(), seed)
    }

    pub fn with_config(
        catalog: Arc<dyn DefinitionCatalog + Send + Sync>,
        config: RegistryConfig,
        seed: u64,
    ) -> Self {
        let world = create_world(catalog, config, seed);
        let schedule = create_schedule();
        Self {
            world,
            schedule,
            seed,
        }
    }

    /// Spawn a cultivator at the first realm and stage with a full qi pool.
    pub fn spawn_cultivator(&mut self, name: &str, talent: TalentTier) -> u32 {
        let uid = self.world.resource_mut::<IdAllocator>().alloc();
        let now = self.world.resource::<GameTime>().tick;

        let mut state = ProgressionState::new(CultivatorId(uid), talent);
        let stats_and_talent = {
            let mut registry = self.world.resource_mut::<DefinitionRegistry>();
            let stats = registry.get_stage_stats(state.realm, state.stage, now);
            let talent_def = registry
                .get_talent(talent, now)
                .cloned()
                .unwrap_or_else(|| TalentDef::neutral(talent));
            stats.map(|stats| (stats, talent_def))
        };
        if let Some((stats, talent_def)) = stats_and_talent {
            let bus = self.world.resource::<EventBus>();
            state.recalculate_stats(&stats, &talent_def, bus);
            state.add_qi(state.max_qi, bus);
        }

        self.world.spawn((
            Cultivator,
            CultivatorId(uid),
            Name(name.to_string()),
            state,
            AbilityManager::new(CultivatorId(uid)),
        ));
        uid
    }

    /// Run a simulation tick with the provided intents and return a snapshot.
    pub fn tick(&mut self, intents: Vec<ActionIntent>) -> Snapshot {
        {
            let mut queue = self.world.resource_mut::<ActionQueue>();
            queue.0 = intents;
        }
        self.schedule.run(&mut self.world);
        Snapshot::capture(&self.world)
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.world
            .resource_mut::<EventBus>()
            .subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.world.resource_mut::<EventBus>().unsubscribe(id)
    }

    /// Cloned progression snapshot for one cultivator.
    pub fn progression(&mut self, uid: u32) -> Option<ProgressionState> {
        self.find(uid).map(|(state, _)| state)
    }

    /// Cloned ability bookkeeping for one cultivator.
    pub fn abilities(&mut self, uid: u32) -> Option<AbilityManager> {
        self.find(uid).map(|(_, manager)| manager)
    }

    fn find(&mut self, uid: u32) -> Option<(ProgressionState, AbilityManager)> {
        let mut query = self
            .world
            .query::<(&CultivatorId, &ProgressionState, &AbilityManager)>();
        query
            .iter(&self.world)
            .find(|(id, _, _)| id.0 == uid)
            .map(|(_, state, manager)| (state.clone(), manager.clone()))
    }

    /// Rebuild both cache tiers immediately, for when the catalog changed.
    pub fn force_refresh_caches(&mut self) {
        let now = self.world.resource::<GameTime>().tick;
        self.world
            .resource_scope(|world, mut registry: Mut<DefinitionRegistry>| {
                let mut lookups = world.resource_mut::<crate::registry::LookupTables>();
                lookups.force_refresh(&mut registry, now);
            });
    }

    /// Extract a serializable save state from the current world.
    pub fn save_state(&self) -> SaveState {
        extract_state_from_world(&self.world, self.seed)
    }

    /// Apply a saved state back into the live world.
    pub fn load_state(&mut self, state: SaveState) {
        self.seed = state.seed;
        apply_state_to_world(state, &mut self.world);
    }

    /// Save state directly to a file path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        save_state_to_path(&self.save_state(), path)
    }

    /// Load state directly from a file path.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let state = load_state_from_path(path)?;
        self.load_state(state);
        Ok(())
    }
}
