use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::registry::registry::DefinitionRegistry;
use crate::rules::{
    AbilityDef, AbilityId, CategoryTag, ElementTag, Realm, SynergyDef, TechniqueDef,
};

/// Tier-2 derived indices, built from the registry rather than the catalog.
/// Refreshed on a longer interval than the registry, and immediately after
/// any registry rebuild (tracked through the registry generation).
#[derive(Resource, Default)]
pub struct LookupTables {
    index: Option<LookupIndex>,
    last_build_tick: u64,
    seen_generation: u64,
}

#[derive(Debug, Default)]
struct LookupIndex {
    abilities_by_realm_stage: HashMap<(Realm, u8), Vec<AbilityDef>>,
    abilities_by_element: HashMap<ElementTag, Vec<AbilityDef>>,
    abilities_by_category: HashMap<CategoryTag, Vec<AbilityDef>>,
    techniques_by_element: HashMap<ElementTag, Vec<TechniqueDef>>,
    techniques_by_realm: HashMap<Realm, Vec<TechniqueDef>>,
    synergies_by_realm: HashMap<Realm, Vec<SynergyDef>>,
    synergies_by_count: HashMap<usize, Vec<SynergyDef>>,
    synergies_by_first_ability: HashMap<AbilityId, Vec<SynergyDef>>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_build_tick(&self) -> u64 {
        self.last_build_tick
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    /// Build if never built. Ensures the registry is initialized first.
    pub fn initialize(&mut self, registry: &mut DefinitionRegistry, now: u64) {
        if self.index.is_none() {
            self.rebuild(registry, now);
        }
    }

    /// Rebuild when the lookup window lapsed or the registry moved to a new
    /// generation since our last derivation.
    pub fn refresh_if_stale(&mut self, registry: &mut DefinitionRegistry, now: u64) {
        registry.refresh_if_stale(now);
        let stale = self.index.is_none()
            || now.saturating_sub(self.last_build_tick) > registry.config().lookup_interval
            || self.seen_generation != registry.generation();
        if stale {
            self.rebuild(registry, now);
        }
    }

    pub fn force_refresh(&mut self, registry: &mut DefinitionRegistry, now: u64) {
        registry.force_refresh(now);
        self.rebuild(registry, now);
    }

    fn rebuild(&mut self, registry: &mut DefinitionRegistry, now: u64) {
        registry.initialize(now);
        // A registry with no generation yet has nothing to derive from; keep
        // whatever we had and retry on the next pass.
        if registry.generation() == 0 {
            self.last_build_tick = now;
            return;
        }

        let mut index = LookupIndex::default();

        for ability in registry.all_abilities(now) {
            index
                .abilities_by_realm_stage
                .entry((ability.required_realm, ability.required_stage))
                .or_default()
                .push(ability.clone());
            if let Some(tag) = infer_element(&ability.id.0, &ability.name) {
                index
                    .abilities_by_element
                    .entry(tag)
                    .or_default()
                    .push(ability.clone());
            }
            if let Some(tag) = infer_category(&ability.id.0, &ability.name) {
                index
                    .abilities_by_category
                    .entry(tag)
                    .or_default()
                    .push(ability);
            }
        }

        for technique in registry.all_techniques(now) {
            if let Some(tag) = infer_element(&technique.id.0, &technique.name) {
                index
                    .techniques_by_element
                    .entry(tag)
                    .or_default()
                    .push(technique.clone());
            }
            let realm = estimate_technique_realm(&technique, registry, now);
            index
                .techniques_by_realm
                .entry(realm)
                .or_default()
                .push(technique);
        }

        for synergy in registry.all_synergies(now) {
            index
                .synergies_by_realm
                .entry(synergy.required_realm)
                .or_default()
                .push(synergy.clone());
            index
                .synergies_by_count
                .entry(synergy.required_abilities.len())
                .or_default()
                .push(synergy.clone());
            if let Some(first) = synergy.first_required_ability() {
                index
                    .synergies_by_first_ability
                    .entry(first.clone())
                    .or_default()
                    .push(synergy);
            }
        }

        self.index = Some(index);
        self.last_build_tick = now;
        self.seen_generation = registry.generation();
    }

    pub fn abilities_for_realm_and_stage(
        &mut self,
        registry: &mut DefinitionRegistry,
        realm: Realm,
        stage: u8,
        now: u64,
    ) -> Vec<AbilityDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.abilities_by_realm_stage.get(&(realm, stage)).cloned())
            .unwrap_or_default()
    }

    pub fn abilities_by_element(
        &mut self,
        registry: &mut DefinitionRegistry,
        element: ElementTag,
        now: u64,
    ) -> Vec<AbilityDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.abilities_by_element.get(&element).cloned())
            .unwrap_or_default()
    }

    pub fn abilities_by_category(
        &mut self,
        registry: &mut DefinitionRegistry,
        category: CategoryTag,
        now: u64,
    ) -> Vec<AbilityDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.abilities_by_category.get(&category).cloned())
            .unwrap_or_default()
    }

    pub fn techniques_by_element(
        &mut self,
        registry: &mut DefinitionRegistry,
        element: ElementTag,
        now: u64,
    ) -> Vec<TechniqueDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.techniques_by_element.get(&element).cloned())
            .unwrap_or_default()
    }

    /// Techniques grouped by estimated realm: the higher of the declared
    /// requirement and anything implied by the abilities the technique grants.
    pub fn techniques_for_realm(
        &mut self,
        registry: &mut DefinitionRegistry,
        realm: Realm,
        now: u64,
    ) -> Vec<TechniqueDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.techniques_by_realm.get(&realm).cloned())
            .unwrap_or_default()
    }

    pub fn synergies_for_realm(
        &mut self,
        registry: &mut DefinitionRegistry,
        realm: Realm,
        now: u64,
    ) -> Vec<SynergyDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.synergies_by_realm.get(&realm).cloned())
            .unwrap_or_default()
    }

    pub fn synergies_by_skill_count(
        &mut self,
        registry: &mut DefinitionRegistry,
        count: usize,
        now: u64,
    ) -> Vec<SynergyDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.synergies_by_count.get(&count).cloned())
            .unwrap_or_default()
    }

    /// Fast elimination index: only synergies whose first required ability is
    /// `ability` can possibly qualify once that ability is learned.
    pub fn synergies_with_first_ability(
        &mut self,
        registry: &mut DefinitionRegistry,
        ability: &AbilityId,
        now: u64,
    ) -> Vec<SynergyDef> {
        self.refresh_if_stale(registry, now);
        self.index
            .as_ref()
            .and_then(|index| index.synergies_by_first_ability.get(ability).cloned())
            .unwrap_or_default()
    }
}

fn infer_element(id: &str, name: &str) -> Option<ElementTag> {
    ElementTag::infer(id).or_else(|| ElementTag::infer(name))
}

fn infer_category(id: &str, name: &str) -> Option<CategoryTag> {
    CategoryTag::infer(id).or_else(|| CategoryTag::infer(name))
}

fn estimate_technique_realm(
    technique: &TechniqueDef,
    registry: &mut DefinitionRegistry,
    now: u64,
) -> Realm {
    let mut realm = technique.required_realm;
    for ability_id in &technique.granted_abilities {
        if let Some(ability) = registry.get_ability(ability_id, now) {
            realm = realm.max(ability.required_realm);
        }
    }
    realm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticCatalog;
    use crate::registry::registry::RegistryConfig;
    use crate::rules::{EffectKind, Rarity, SynergyId, TechniqueCategory, TechniqueId};
    use std::sync::Arc;

    fn ability(id: &str, realm: Realm, stage: u8) -> AbilityDef {
        AbilityDef {
            id: AbilityId::new(id),
            name: id.replace('_', " "),
            required_realm: realm,
            required_stage: stage,
            required_technique: None,
            qi_cost: 10.0,
            cooldown_ticks: 20,
            effect: EffectKind::DirectDamage,
            magnitude: 1.0,
            xp_per_use: 1.0,
            xp_per_level: 10.0,
            max_level: 5,
        }
    }

    fn synergy(id: &str, required: &[&str]) -> SynergyDef {
        SynergyDef {
            id: SynergyId::new(id),
            name: id.to_string(),
            rarity: Rarity::Common,
            required_realm: Realm::QiCondensation,
            required_abilities: required.iter().map(|a| AbilityId::new(*a)).collect(),
            bonus_multiplier: 1.1,
            description: String::new(),
        }
    }

    fn setup(
        abilities: Vec<AbilityDef>,
        techniques: Vec<TechniqueDef>,
        synergies: Vec<SynergyDef>,
    ) -> (DefinitionRegistry, LookupTables) {
        let catalog = Arc::new(StaticCatalog::new(
            abilities,
            techniques,
            synergies,
            Vec::new(),
            Vec::new(),
        ));
        let config = RegistryConfig {
            registry_interval: 10,
            lookup_interval: 30,
        };
        (
            DefinitionRegistry::with_config(catalog, config),
            LookupTables::new(),
        )
    }

    #[test]
    fn element_index_uses_identifier_heuristic() {
        let (mut registry, mut lookups) = setup(
            vec![
                ability("fire_palm", Realm::BodyRefinement, 1),
                ability("water_veil", Realm::BodyRefinement, 1),
                ability("iron_body", Realm::BodyRefinement, 1),
            ],
            Vec::new(),
            Vec::new(),
        );

        let fire = lookups.abilities_by_element(&mut registry, ElementTag::Fire, 0);
        assert_eq!(fire.len(), 1);
        assert_eq!(fire[0].id, AbilityId::new("fire_palm"));
        assert!(lookups
            .abilities_by_element(&mut registry, ElementTag::Wood, 0)
            .is_empty());
    }

    #[test]
    fn synergy_count_and_first_ability_indices() {
        let (mut registry, mut lookups) = setup(
            Vec::new(),
            Vec::new(),
            vec![
                synergy("twin_flames", &["fire_palm", "flame_wave"]),
                synergy("trinity", &["fire_palm", "water_veil", "iron_body"]),
            ],
        );

        assert_eq!(
            lookups.synergies_by_skill_count(&mut registry, 2, 0).len(),
            1
        );
        assert_eq!(
            lookups
                .synergies_with_first_ability(&mut registry, &AbilityId::new("fire_palm"), 0)
                .len(),
            2
        );
        assert!(lookups
            .synergies_with_first_ability(&mut registry, &AbilityId::new("water_veil"), 0)
            .is_empty());
    }

    #[test]
    fn registry_rebuild_cascades_into_lookup_rebuild() {
        let (mut registry, mut lookups) = setup(
            vec![ability("fire_palm", Realm::BodyRefinement, 1)],
            Vec::new(),
            Vec::new(),
        );

        lookups.initialize(&mut registry, 0);
        let first_build = lookups.last_build_tick();
        assert_eq!(first_build, 0);

        // Registry goes stale at tick 11 (interval 10); the lookup window
        // (30) has not lapsed, but the generation moved, so lookups rebuild.
        lookups.refresh_if_stale(&mut registry, 11);
        assert_eq!(registry.generation(), 2);
        assert_eq!(lookups.last_build_tick(), 11);
    }

    #[test]
    fn technique_realm_estimated_from_granted_abilities() {
        let technique = TechniqueDef {
            id: TechniqueId::new("flame_art"),
            name: "Flame Art".to_string(),
            required_realm: Realm::BodyRefinement,
            category: TechniqueCategory::Combat,
            granted_abilities: vec![AbilityId::new("flame_wave")],
        };
        let (mut registry, mut lookups) = setup(
            vec![ability("flame_wave", Realm::CoreFormation, 2)],
            vec![technique],
            Vec::new(),
        );

        // The declared realm is BodyRefinement but the granted ability implies
        // CoreFormation, so the estimate lands there.
        assert!(lookups
            .techniques_for_realm(&mut registry, Realm::BodyRefinement, 0)
            .is_empty());
        assert_eq!(
            lookups
                .techniques_for_realm(&mut registry, Realm::CoreFormation, 0)
                .len(),
            1
        );
    }
}
