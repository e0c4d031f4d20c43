use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::warn;

use crate::content::{ContentError, DefinitionCatalog};
use crate::rules::{
    AbilityDef, AbilityId, Rarity, Realm, RealmProfile, StageStats, SynergyDef, SynergyId,
    TalentDef, TalentTier, TechniqueCategory, TechniqueDef, TechniqueId,
};

/// Staleness windows for the two cache tiers, in ticks. The lookup interval
/// must be the longer of the two; lookups additionally rebuild whenever the
/// registry generation moves underneath them.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    pub registry_interval: u64,
    pub lookup_interval: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_interval: 600,
            lookup_interval: 1800,
        }
    }
}

/// One fully-built cache generation. Built as a whole, swapped in as a whole,
/// so queries never see a half-rebuilt state.
#[derive(Debug, Default)]
pub(crate) struct RegistryIndex {
    pub abilities: HashMap<AbilityId, AbilityDef>,
    pub techniques: HashMap<TechniqueId, TechniqueDef>,
    pub synergies: HashMap<SynergyId, SynergyDef>,
    pub talents: HashMap<TalentTier, TalentDef>,
    pub realm_profiles: HashMap<Realm, RealmProfile>,
    pub abilities_by_realm: HashMap<Realm, Vec<AbilityDef>>,
    pub abilities_by_stage: HashMap<u8, Vec<AbilityDef>>,
    pub techniques_by_realm: HashMap<Realm, Vec<TechniqueDef>>,
    pub techniques_by_category: HashMap<TechniqueCategory, Vec<TechniqueDef>>,
    pub synergies_by_rarity: HashMap<Rarity, Vec<SynergyDef>>,
    pub synergies_by_realm: HashMap<Realm, Vec<SynergyDef>>,
}

impl RegistryIndex {
    fn build(catalog: &dyn DefinitionCatalog) -> Result<Self, ContentError> {
        let abilities = catalog.abilities()?;
        let techniques = catalog.techniques()?;
        let synergies = catalog.synergies()?;
        let talents = catalog.talents()?;
        let realm_profiles = catalog.realm_profiles()?;

        let mut index = RegistryIndex::default();

        for ability in abilities {
            index
                .abilities_by_realm
                .entry(ability.required_realm)
                .or_default()
                .push(ability.clone());
            index
                .abilities_by_stage
                .entry(ability.required_stage)
                .or_default()
                .push(ability.clone());
            index.abilities.insert(ability.id.clone(), ability);
        }
        for technique in techniques {
            index
                .techniques_by_realm
                .entry(technique.required_realm)
                .or_default()
                .push(technique.clone());
            index
                .techniques_by_category
                .entry(technique.category)
                .or_default()
                .push(technique.clone());
            index.techniques.insert(technique.id.clone(), technique);
        }
        for synergy in synergies {
            index
                .synergies_by_rarity
                .entry(synergy.rarity)
                .or_default()
                .push(synergy.clone());
            index
                .synergies_by_realm
                .entry(synergy.required_realm)
                .or_default()
                .push(synergy.clone());
            index.synergies.insert(synergy.id.clone(), synergy);
        }
        for talent in talents {
            index.talents.insert(talent.tier, talent);
        }
        for profile in realm_profiles {
            index.realm_profiles.insert(profile.realm, profile);
        }

        Ok(index)
    }
}

/// Tier-1 cache over the definition catalog. Constructed once at startup and
/// installed as a resource; every consumer goes through it rather than the
/// catalog directly.
#[derive(Resource)]
pub struct DefinitionRegistry {
    catalog: Arc<dyn DefinitionCatalog + Send + Sync>,
    config: RegistryConfig,
    index: Option<RegistryIndex>,
    last_build_tick: u64,
    generation: u64,
}

impl DefinitionRegistry {
    pub fn new(catalog: Arc<dyn DefinitionCatalog + Send + Sync>) -> Self {
        Self::with_config(catalog, RegistryConfig::default())
    }

    pub fn with_config(
        catalog: Arc<dyn DefinitionCatalog + Send + Sync>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            catalog,
            config,
            index: None,
            last_build_tick: 0,
            generation: 0,
        }
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Monotonic counter bumped on every successful rebuild. The lookup tier
    /// keys its own staleness off this.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_build_tick(&self) -> u64 {
        self.last_build_tick
    }

    /// Build the index if it has never been built. Idempotent: a second call
    /// with a fresh index does nothing and leaves `last_build_tick` alone.
    pub fn initialize(&mut self, now: u64) {
        if self.index.is_none() {
            self.rebuild(now);
        }
    }

    /// Rebuild when the staleness window has lapsed. Called internally before
    /// every query.
    pub fn refresh_if_stale(&mut self, now: u64) {
        if self.index.is_none()
            || now.saturating_sub(self.last_build_tick) > self.config.registry_interval
        {
            self.rebuild(now);
        }
    }

    /// Unconditional rebuild, for when the catalog itself changed.
    pub fn force_refresh(&mut self, now: u64) {
        self.rebuild(now);
    }

    fn rebuild(&mut self, now: u64) {
        match RegistryIndex::build(self.catalog.as_ref()) {
            Ok(index) => {
                self.index = Some(index);
                self.generation += 1;
            }
            Err(err) => {
                // Keep the previous generation; advancing the clock means a
                // dead catalog is retried once per interval, not every query.
                warn!("definition registry rebuild failed: {}", err);
            }
        }
        self.last_build_tick = now;
    }

    pub(crate) fn index(&self) -> Option<&RegistryIndex> {
        self.index.as_ref()
    }

    pub fn get_ability(&mut self, id: &AbilityId, now: u64) -> Option<&AbilityDef> {
        self.refresh_if_stale(now);
        self.index()?.abilities.get(id)
    }

    pub fn get_technique(&mut self, id: &TechniqueId, now: u64) -> Option<&TechniqueDef> {
        self.refresh_if_stale(now);
        self.index()?.techniques.get(id)
    }

    pub fn get_synergy(&mut self, id: &SynergyId, now: u64) -> Option<&SynergyDef> {
        self.refresh_if_stale(now);
        self.index()?.synergies.get(id)
    }

    pub fn get_talent(&mut self, tier: TalentTier, now: u64) -> Option<&TalentDef> {
        self.refresh_if_stale(now);
        self.index()?.talents.get(&tier)
    }

    pub fn get_realm_profile(&mut self, realm: Realm, now: u64) -> Option<&RealmProfile> {
        self.refresh_if_stale(now);
        self.index()?.realm_profiles.get(&realm)
    }

    /// Effective stats for a (realm, stage) pair, the snapshot external stat
    /// systems consume.
    pub fn get_stage_stats(&mut self, realm: Realm, stage: u8, now: u64) -> Option<StageStats> {
        self.get_realm_profile(realm, now)
            .map(|profile| profile.stage_stats(stage))
    }

    pub fn abilities_for_realm_and_stage(
        &mut self,
        realm: Realm,
        stage: u8,
        now: u64,
    ) -> Vec<AbilityDef> {
        self.refresh_if_stale(now);
        let Some(index) = self.index() else {
            return Vec::new();
        };
        index
            .abilities_by_realm
            .get(&realm)
            .map(|defs| {
                defs.iter()
                    .filter(|def| def.required_stage == stage)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All abilities whose requirement is at or below (max_realm, max_stage).
    pub fn abilities_up_to(&mut self, max_realm: Realm, max_stage: u8, now: u64) -> Vec<AbilityDef> {
        self.refresh_if_stale(now);
        let Some(index) = self.index() else {
            return Vec::new();
        };
        index
            .abilities
            .values()
            .filter(|def| {
                def.required_realm < max_realm
                    || (def.required_realm == max_realm && def.required_stage <= max_stage)
            })
            .cloned()
            .collect()
    }

    pub fn techniques_for_realm(&mut self, realm: Realm, now: u64) -> Vec<TechniqueDef> {
        self.refresh_if_stale(now);
        self.index()
            .and_then(|index| index.techniques_by_realm.get(&realm).cloned())
            .unwrap_or_default()
    }

    pub fn techniques_by_category(
        &mut self,
        category: TechniqueCategory,
        now: u64,
    ) -> Vec<TechniqueDef> {
        self.refresh_if_stale(now);
        self.index()
            .and_then(|index| index.techniques_by_category.get(&category).cloned())
            .unwrap_or_default()
    }

    pub fn synergies_by_rarity(&mut self, rarity: Rarity, now: u64) -> Vec<SynergyDef> {
        self.refresh_if_stale(now);
        self.index()
            .and_then(|index| index.synergies_by_rarity.get(&rarity).cloned())
            .unwrap_or_default()
    }

    pub fn synergies_for_realm(&mut self, realm: Realm, now: u64) -> Vec<SynergyDef> {
        self.refresh_if_stale(now);
        self.index()
            .and_then(|index| index.synergies_by_realm.get(&realm).cloned())
            .unwrap_or_default()
    }

    pub fn all_abilities(&mut self, now: u64) -> Vec<AbilityDef> {
        self.refresh_if_stale(now);
        self.index()
            .map(|index| index.abilities.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all_techniques(&mut self, now: u64) -> Vec<TechniqueDef> {
        self.refresh_if_stale(now);
        self.index()
            .map(|index| index.techniques.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all_synergies(&mut self, now: u64) -> Vec<SynergyDef> {
        self.refresh_if_stale(now);
        self.index()
            .map(|index| index.synergies.values().cloned().collect())
            .unwrap_or_default()
    }
}
