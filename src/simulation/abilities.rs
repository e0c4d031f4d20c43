use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::CultivatorId;
use crate::registry::{DefinitionRegistry, LookupTables};
use crate::rules::{AbilityDef, AbilityId, SynergyDef};
use crate::simulation::events::{EngineEvent, EventBus};
use crate::simulation::progression::ProgressionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedAbility {
    pub level: u8,
    pub experience: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnError {
    AlreadyLearned,
    InsufficientAbilityPoints,
}

impl std::fmt::Display for LearnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnError::AlreadyLearned => write!(f, "ability already learned"),
            LearnError::InsufficientAbilityPoints => write!(f, "not enough ability points"),
        }
    }
}

impl std::error::Error for LearnError {}

/// Learned-ability bookkeeping for one character. Cooldown timing is mirrored
/// from `ProgressionState` on every write so that either component can be read
/// without cross-referencing the other.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct AbilityManager {
    pub owner: CultivatorId,
    pub learned: HashMap<AbilityId, LearnedAbility>,
    pub ability_points: u32,
    pub total_experience: f64,
    /// Must always equal `ProgressionState::cooldowns` for every id present
    /// in either map. `set_cooldown` and `tick_cooldowns` are the only
    /// mutation paths.
    pub cooldowns: HashMap<AbilityId, i64>,
}

impl AbilityManager {
    pub fn new(owner: CultivatorId) -> Self {
        Self {
            owner,
            learned: HashMap::new(),
            ability_points: 0,
            total_experience: 0.0,
            cooldowns: HashMap::new(),
        }
    }

    pub fn has_learned(&self, id: &AbilityId) -> bool {
        self.learned.contains_key(id)
    }

    pub fn learned_level(&self, id: &AbilityId) -> Option<u8> {
        self.learned.get(id).map(|a| a.level)
    }

    pub fn learn_ability(
        &mut self,
        def: &AbilityDef,
        pay_ability_points: bool,
        bus: &EventBus,
    ) -> Result<(), LearnError> {
        if self.learned.contains_key(&def.id) {
            return Err(LearnError::AlreadyLearned);
        }
        if pay_ability_points {
            if self.ability_points == 0 {
                return Err(LearnError::InsufficientAbilityPoints);
            }
            self.ability_points -= 1;
        }
        self.learned.insert(
            def.id.clone(),
            LearnedAbility {
                level: 1,
                experience: 0.0,
            },
        );
        bus.emit(&EngineEvent::AbilityUnlocked {
            cultivator: self.owner,
            ability: def.id.clone(),
        });
        Ok(())
    }

    /// Silently ignores unlearned ids. Levels up each time the per-level
    /// threshold is banked, up to the definition's cap.
    pub fn add_experience(&mut self, id: &AbilityId, amount: f64, def: &AbilityDef) {
        if amount <= 0.0 {
            return;
        }
        let Some(entry) = self.learned.get_mut(id) else {
            return;
        };
        entry.experience += amount;
        self.total_experience += amount;
        while entry.level < def.max_level {
            let threshold = def.xp_per_level * entry.level as f64;
            if entry.experience < threshold {
                break;
            }
            entry.experience -= threshold;
            entry.level += 1;
        }
    }

    pub fn award_ability_points(&mut self, n: u32) {
        self.ability_points += n;
    }

    /// The single write-through path keeping both cooldown stores equal.
    pub fn set_cooldown(&mut self, id: &AbilityId, ticks: i64, state: &mut ProgressionState) {
        if ticks > 0 {
            self.cooldowns.insert(id.clone(), ticks);
            state.cooldowns.insert(id.clone(), ticks);
        } else {
            self.cooldowns.remove(id);
            state.cooldowns.remove(id);
        }
    }

    /// Unlearned abilities the character currently qualifies for.
    pub fn available_abilities(
        &self,
        state: &ProgressionState,
        registry: &mut DefinitionRegistry,
        now: u64,
    ) -> Vec<AbilityDef> {
        registry
            .abilities_up_to(state.realm, state.stage, now)
            .into_iter()
            .filter(|def| !self.learned.contains_key(&def.id))
            .filter(|def| match &def.required_technique {
                Some(technique) => state.knows_technique(technique),
                None => true,
            })
            .collect()
    }

    pub fn all_learned(&self) -> impl Iterator<Item = (&AbilityId, &LearnedAbility)> {
        self.learned.iter()
    }

    /// Synergies fully covered by the learned set, resolved through the
    /// first-required-ability elimination index.
    pub fn qualified_synergies(
        &self,
        registry: &mut DefinitionRegistry,
        lookups: &mut LookupTables,
        now: u64,
    ) -> Vec<SynergyDef> {
        let mut out: Vec<SynergyDef> = Vec::new();
        for id in self.learned.keys() {
            for synergy in lookups.synergies_with_first_ability(registry, id, now) {
                if out.iter().any(|s| s.id == synergy.id) {
                    continue;
                }
                if synergy
                    .required_abilities
                    .iter()
                    .all(|required| self.learned.contains_key(required))
                {
                    out.push(synergy);
                }
            }
        }
        out
    }
}

/// Decrement every active cooldown on both stores in lockstep, removing
/// entries that expire and announcing each expiry once.
pub fn tick_cooldowns(
    state: &mut ProgressionState,
    manager: &mut AbilityManager,
    ticks: i64,
    bus: &EventBus,
) {
    if ticks <= 0 {
        return;
    }
    let mut expired = Vec::new();
    for (id, remaining) in state.cooldowns.iter_mut() {
        *remaining -= ticks;
        if *remaining <= 0 {
            expired.push(id.clone());
        }
    }
    for remaining in manager.cooldowns.values_mut() {
        *remaining -= ticks;
    }
    for id in expired {
        state.cooldowns.remove(&id);
        manager.cooldowns.remove(&id);
        bus.emit(&EngineEvent::CooldownExpired {
            cultivator: state.owner,
            ability: id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EffectKind, Realm, TalentTier};

    fn def(id: &str) -> AbilityDef {
        AbilityDef {
            id: AbilityId::new(id),
            name: id.to_string(),
            required_realm: Realm::BodyRefinement,
            required_stage: 1,
            required_technique: None,
            qi_cost: 10.0,
            cooldown_ticks: 30,
            effect: EffectKind::DirectDamage,
            magnitude: 1.0,
            xp_per_use: 1.0,
            xp_per_level: 10.0,
            max_level: 3,
        }
    }

    fn pair() -> (ProgressionState, AbilityManager) {
        (
            ProgressionState::new(CultivatorId(1), TalentTier::Common),
            AbilityManager::new(CultivatorId(1)),
        )
    }

    #[test]
    fn learning_twice_is_rejected() {
        let bus = EventBus::new();
        let (_, mut manager) = pair();
        let def = def("fire_palm");

        assert!(manager.learn_ability(&def, false, &bus).is_ok());
        assert_eq!(
            manager.learn_ability(&def, false, &bus),
            Err(LearnError::AlreadyLearned)
        );
    }

    #[test]
    fn paid_learning_spends_a_point() {
        let bus = EventBus::new();
        let (_, mut manager) = pair();
        let def = def("fire_palm");

        assert_eq!(
            manager.learn_ability(&def, true, &bus),
            Err(LearnError::InsufficientAbilityPoints)
        );
        manager.award_ability_points(1);
        assert!(manager.learn_ability(&def, true, &bus).is_ok());
        assert_eq!(manager.ability_points, 0);
    }

    #[test]
    fn experience_levels_up_and_respects_cap() {
        let bus = EventBus::new();
        let (_, mut manager) = pair();
        let def = def("fire_palm");
        manager.learn_ability(&def, false, &bus).unwrap();

        // unlearned ids are a silent no-op
        manager.add_experience(&AbilityId::new("ghost"), 100.0, &def);
        assert_eq!(manager.total_experience, 0.0);

        manager.add_experience(&def.id, 10.0, &def);
        assert_eq!(manager.learned_level(&def.id), Some(2));
        manager.add_experience(&def.id, 500.0, &def);
        assert_eq!(manager.learned_level(&def.id), Some(3));
        assert_eq!(manager.total_experience, 510.0);
    }

    #[test]
    fn set_cooldown_writes_through_to_both_stores() {
        let (mut state, mut manager) = pair();
        let id = AbilityId::new("fire_palm");

        manager.set_cooldown(&id, 300, &mut state);
        assert_eq!(state.cooldowns.get(&id), Some(&300));
        assert_eq!(manager.cooldowns.get(&id), Some(&300));

        manager.set_cooldown(&id, 0, &mut state);
        assert!(state.cooldowns.is_empty());
        assert!(manager.cooldowns.is_empty());
    }

    #[test]
    fn cooldowns_expire_from_both_stores_with_one_event() {
        let mut bus = EventBus::new();
        let expired = std::sync::Arc::new(std::sync::Mutex::new(0u32));
        let expired_sub = std::sync::Arc::clone(&expired);
        bus.subscribe(crate::simulation::events::EventKind::CooldownExpired, move |_| {
            *expired_sub.lock().unwrap() += 1;
        });

        let (mut state, mut manager) = pair();
        let id = AbilityId::new("fire_palm");
        manager.set_cooldown(&id, 5, &mut state);

        tick_cooldowns(&mut state, &mut manager, 3, &bus);
        assert_eq!(state.cooldowns.get(&id), Some(&2));
        assert_eq!(manager.cooldowns.get(&id), Some(&2));
        assert_eq!(*expired.lock().unwrap(), 0);

        tick_cooldowns(&mut state, &mut manager, 3, &bus);
        assert!(state.cooldowns.get(&id).is_none());
        assert!(manager.cooldowns.get(&id).is_none());
        assert_eq!(*expired.lock().unwrap(), 1);
    }

    #[test]
    fn only_fully_learned_synergies_qualify() {
        use crate::content::StaticCatalog;
        use crate::registry::LookupTables;
        use crate::rules::{Rarity, SynergyDef, SynergyId};
        use std::sync::Arc;

        let synergy = |id: &str, required: &[&str]| SynergyDef {
            id: SynergyId::new(id),
            name: id.to_string(),
            rarity: Rarity::Common,
            required_realm: Realm::BodyRefinement,
            required_abilities: required.iter().map(|a| AbilityId::new(*a)).collect(),
            bonus_multiplier: 1.2,
            description: String::new(),
        };
        let catalog = Arc::new(StaticCatalog::new(
            vec![def("fire_palm"), def("flame_wave"), def("water_veil")],
            Vec::new(),
            vec![
                synergy("twin_flames", &["fire_palm", "flame_wave"]),
                synergy("steam_burst", &["fire_palm", "water_veil"]),
            ],
            Vec::new(),
            Vec::new(),
        ));
        let mut registry = DefinitionRegistry::new(catalog);
        let mut lookups = LookupTables::new();

        let bus = EventBus::new();
        let (_, mut manager) = pair();
        manager.learn_ability(&def("fire_palm"), false, &bus).unwrap();
        manager.learn_ability(&def("flame_wave"), false, &bus).unwrap();

        let qualified = manager.qualified_synergies(&mut registry, &mut lookups, 0);
        assert_eq!(qualified.len(), 1);
        assert_eq!(qualified[0].id, SynergyId::new("twin_flames"));
    }

    #[test]
    fn available_abilities_honor_technique_prerequisites() {
        use crate::content::StaticCatalog;
        use crate::rules::TechniqueId;
        use std::sync::Arc;

        let mut gated = def("flame_wave");
        gated.required_technique = Some(TechniqueId::new("flame_art"));
        let catalog = Arc::new(StaticCatalog::new(
            vec![def("fire_palm"), gated],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ));
        let mut registry = DefinitionRegistry::new(catalog);
        let (mut state, manager) = pair();

        let open = manager.available_abilities(&state, &mut registry, 0);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, AbilityId::new("fire_palm"));

        state.learn_technique(TechniqueId::new("flame_art"));
        assert_eq!(manager.available_abilities(&state, &mut registry, 0).len(), 2);
    }
}
