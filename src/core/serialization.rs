use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Cultivator, CultivatorId, Name};
use crate::core::world::IdAllocator;
use crate::rules::{AbilityId, Realm, TalentTier, TechniqueId};
use crate::simulation::abilities::{AbilityManager, LearnedAbility};
use crate::simulation::progression::ProgressionState;
use crate::simulation::time::GameTime;

/// Save state capturing the timeline and every cultivator's progression and
/// ability bookkeeping. The cooldown map is stored once and restored into
/// both live stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    #[serde(default = "default_save_version")]
    pub version: u32,
    pub seed: u64,
    pub time: GameTime,
    pub cultivators: Vec<SavedCultivator>,
}

fn default_save_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCultivator {
    pub uid: u32,
    pub name: String,
    pub talent: TalentTier,
    pub realm: Realm,
    pub stage: u8,
    pub current_qi: f64,
    pub max_qi: f64,
    pub progression_points: f64,
    #[serde(default)]
    pub auto_progression: bool,
    #[serde(default)]
    pub known_techniques: HashSet<TechniqueId>,
    #[serde(default)]
    pub cooldowns: HashMap<AbilityId, i64>,
    pub ability_points: u32,
    pub total_experience: f64,
    #[serde(default)]
    pub learned: HashMap<AbilityId, LearnedAbility>,
}

/// Extract a serializable snapshot of the world.
pub fn extract_state_from_world(world: &World, seed: u64) -> SaveState {
    let time = world.resource::<GameTime>().clone();

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
        cultivators.push(SavedCultivator {
            uid: id.0,
            name,
            talent: state.talent,
            realm: state.realm,
            stage: state.stage,
            current_qi: state.current_qi,
            max_qi: state.max_qi,
            progression_points: state.progression_points,
            auto_progression: state.auto_progression,
            known_techniques: state.known_techniques.clone(),
            cooldowns: state.cooldowns.clone(),
            ability_points: manager.ability_points,
            total_experience: manager.total_experience,
            learned: manager.learned.clone(),
        });
    }
    cultivators.sort_by_key(|c| c.uid);

    SaveState {
        version: default_save_version(),
        seed,
        time,
        cultivators,
    }
}

/// Apply a saved state back into the live world, replacing every existing
/// cultivator. Values are re-clamped on the way in so a hand-edited save
/// cannot break the qi invariant.
pub fn apply_state_to_world(state: SaveState, world: &mut World) {
    *world.resource_mut::<GameTime>() = state.time.clone();

    let mut query = world.query_filtered::<Entity, With<CultivatorId>>();
    let to_remove: Vec<Entity> = query.iter(world).collect();
    for entity in to_remove {
        let _ = world.despawn(entity);
    }

    let mut max_uid = 0;
    for saved in state.cultivators {
        max_uid = max_uid.max(saved.uid);
        let id = CultivatorId(saved.uid);

        let max_qi = saved.max_qi.max(0.0);
        let mut progression = ProgressionState::new(id, saved.talent);
        progression.realm = saved.realm;
        progression.stage = saved.stage.max(1);
        progression.max_qi = max_qi;
        progression.current_qi = saved.current_qi.clamp(0.0, max_qi);
        progression.progression_points = saved.progression_points.max(0.0);
        progression.auto_progression = saved.auto_progression;
        progression.known_techniques = saved.known_techniques;

        // expired entries never survive a round trip
        let cooldowns: HashMap<AbilityId, i64> = saved
            .cooldowns
            .into_iter()
            .filter(|(_, ticks)| *ticks > 0)
            .collect();
        progression.cooldowns = cooldowns.clone();

        let mut manager = AbilityManager::new(id);
        manager.ability_points = saved.ability_points;
        manager.total_experience = saved.total_experience;
        manager.learned = saved.learned;
        manager.cooldowns = cooldowns;

        world.spawn((Cultivator, id, Name(saved.name), progression, manager));
    }

    if let Some(mut alloc) = world.get_resource_mut::<IdAllocator>() {
        alloc.bump_to_at_least(max_uid + 1);
    }
}

/// Serialize a save state into JSON for persistence.
pub fn save_state_to_json(state: &SaveState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

/// Deserialize JSON back into a save state.
pub fn load_state_from_json(data: &str) -> serde_json::Result<SaveState> {
    serde_json::from_str(data)
}

/// Write a save state to a file path.
pub fn save_state_to_path<P: AsRef<Path>>(state: &SaveState, path: P) -> std::io::Result<()> {
    let json = save_state_to_json(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Read a save state from a file path.
pub fn load_state_from_path<P: AsRef<Path>>(path: P) -> std::io::Result<SaveState> {
    let data = fs::read_to_string(&path)?;
    load_state_from_json(&data).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(uid: u32) -> SavedCultivator {
        SavedCultivator {
            uid,
            name: format!("c{}", uid),
            talent: TalentTier::Common,
            realm: Realm::QiCondensation,
            stage: 3,
            current_qi: 42.0,
            max_qi: 120.0,
            progression_points: 10.0,
            auto_progression: true,
            known_techniques: HashSet::from([TechniqueId::new("flame_art")]),
            cooldowns: HashMap::from([
                (AbilityId::new("fire_palm"), 25),
                (AbilityId::new("stale"), 0),
            ]),
            ability_points: 2,
            total_experience: 99.0,
            learned: HashMap::from([(
                AbilityId::new("fire_palm"),
                LearnedAbility {
                    level: 2,
                    experience: 4.0,
                },
            )]),
        }
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let state = SaveState {
            version: 1,
            seed: 7,
            time: GameTime { tick: 500, day: 1 },
            cultivators: vec![saved(1)],
        };
        let json = save_state_to_json(&state).unwrap();
        let back = load_state_from_json(&json).unwrap();
        assert_eq!(back.cultivators.len(), 1);
        let c = &back.cultivators[0];
        assert_eq!(c.stage, 3);
        assert_eq!(c.cooldowns.get(&AbilityId::new("fire_palm")), Some(&25));
        assert_eq!(c.learned.len(), 1);
    }

    #[test]
    fn apply_restores_both_cooldown_stores_and_drops_expired() {
        let mut world = World::new();
        world.insert_resource(GameTime::default());
        world.insert_resource(IdAllocator::default());

        let state = SaveState {
            version: 1,
            seed: 7,
            time: GameTime { tick: 500, day: 1 },
            cultivators: vec![saved(4)],
        };
        apply_state_to_world(state, &mut world);

        let mut query = world.query::<(&ProgressionState, &AbilityManager)>();
        let (progression, manager) = query.single(&world);
        let id = AbilityId::new("fire_palm");
        assert_eq!(progression.cooldowns.get(&id), Some(&25));
        assert_eq!(manager.cooldowns.get(&id), Some(&25));
        // the zero-tick entry was logically expired and must not come back
        assert!(!progression.cooldowns.contains_key(&AbilityId::new("stale")));
        assert!(!manager.cooldowns.contains_key(&AbilityId::new("stale")));

        if let Some(alloc) = world.get_resource_mut::<IdAllocator>() {
            let mut alloc = alloc;
            assert_eq!(alloc.alloc(), 5);
        }
    }

    #[test]
    fn apply_clamps_out_of_range_qi() {
        let mut world = World::new();
        world.insert_resource(GameTime::default());
        world.insert_resource(IdAllocator::default());

        let mut cultivator = saved(1);
        cultivator.current_qi = 999.0;
        let state = SaveState {
            version: 1,
            seed: 0,
            time: GameTime::default(),
            cultivators: vec![cultivator],
        };
        apply_state_to_world(state, &mut world);

        let mut query = world.query::<&ProgressionState>();
        let progression = query.single(&world);
        assert_eq!(progression.current_qi, 120.0);
    }
}
