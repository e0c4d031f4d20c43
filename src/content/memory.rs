use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::catalog::{ContentError, DefinitionCatalog};
use crate::rules::{AbilityDef, RealmProfile, SynergyDef, TalentDef, TechniqueDef};

/// On-disk content file shape. One JSON document carries the full definition
/// set; `schema_version` guards against stale tooling output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    pub schema_version: u32,
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,
    #[serde(default)]
    pub techniques: Vec<TechniqueDef>,
    #[serde(default)]
    pub synergies: Vec<SynergyDef>,
    #[serde(default)]
    pub talents: Vec<TalentDef>,
    #[serde(default)]
    pub realm_profiles: Vec<RealmProfile>,
}

pub const CONTENT_SCHEMA_VERSION: u32 = 1;

impl ContentFile {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.schema_version != CONTENT_SCHEMA_VERSION {
            return Err(ContentError::Validation(format!(
                "unsupported content schema version {}",
                self.schema_version
            )));
        }
        let mut ability_ids = HashSet::new();
        for ability in &self.abilities {
            if ability.id.0.trim().is_empty() {
                return Err(ContentError::Validation(
                    "ability id cannot be empty".to_string(),
                ));
            }
            if !ability_ids.insert(ability.id.clone()) {
                return Err(ContentError::Validation(format!(
                    "duplicate ability id {}",
                    ability.id.0
                )));
            }
            if ability.qi_cost < 0.0 {
                return Err(ContentError::Validation(format!(
                    "ability {} has negative qi cost",
                    ability.id.0
                )));
            }
        }
        let mut technique_ids = HashSet::new();
        for technique in &self.techniques {
            if !technique_ids.insert(technique.id.clone()) {
                return Err(ContentError::Validation(format!(
                    "duplicate technique id {}",
                    technique.id.0
                )));
            }
        }
        let mut synergy_ids = HashSet::new();
        for synergy in &self.synergies {
            if !synergy_ids.insert(synergy.id.clone()) {
                return Err(ContentError::Validation(format!(
                    "duplicate synergy id {}",
                    synergy.id.0
                )));
            }
            if synergy.required_abilities.is_empty() {
                return Err(ContentError::Validation(format!(
                    "synergy {} requires no abilities",
                    synergy.id.0
                )));
            }
        }
        let mut profiled_realms = HashSet::new();
        for profile in &self.realm_profiles {
            if profile.max_stage < 1 {
                return Err(ContentError::Validation(format!(
                    "realm profile {:?} has max_stage 0",
                    profile.realm
                )));
            }
            if !profiled_realms.insert(profile.realm) {
                return Err(ContentError::Validation(format!(
                    "duplicate realm profile {:?}",
                    profile.realm
                )));
            }
        }
        Ok(())
    }
}

/// In-memory catalog. Built programmatically (tests, embedded content) or
/// loaded from a JSON content file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    abilities: Vec<AbilityDef>,
    techniques: Vec<TechniqueDef>,
    synergies: Vec<SynergyDef>,
    talents: Vec<TalentDef>,
    realm_profiles: Vec<RealmProfile>,
}

impl StaticCatalog {
    pub fn new(
        abilities: Vec<AbilityDef>,
        techniques: Vec<TechniqueDef>,
        synergies: Vec<SynergyDef>,
        talents: Vec<TalentDef>,
        realm_profiles: Vec<RealmProfile>,
    ) -> Self {
        Self {
            abilities,
            techniques,
            synergies,
            talents,
            realm_profiles,
        }
    }

    pub fn from_content_file(file: ContentFile) -> Result<Self, ContentError> {
        file.validate()?;
        Ok(Self {
            abilities: file.abilities,
            techniques: file.techniques,
            synergies: file.synergies,
            talents: file.talents,
            realm_profiles: file.realm_profiles,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: ContentFile =
            serde_json::from_str(&raw).map_err(|source| ContentError::Json {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_content_file(file)
    }
}

impl DefinitionCatalog for StaticCatalog {
    fn abilities(&self) -> Result<Vec<AbilityDef>, ContentError> {
        Ok(self.abilities.clone())
    }

    fn techniques(&self) -> Result<Vec<TechniqueDef>, ContentError> {
        Ok(self.techniques.clone())
    }

    fn synergies(&self) -> Result<Vec<SynergyDef>, ContentError> {
        Ok(self.synergies.clone())
    }

    fn talents(&self) -> Result<Vec<TalentDef>, ContentError> {
        Ok(self.talents.clone())
    }

    fn realm_profiles(&self) -> Result<Vec<RealmProfile>, ContentError> {
        Ok(self.realm_profiles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AbilityId, EffectKind, Realm};

    fn ability(id: &str) -> AbilityDef {
        AbilityDef {
            id: AbilityId::new(id),
            name: id.to_string(),
            required_realm: Realm::BodyRefinement,
            required_stage: 1,
            required_technique: None,
            qi_cost: 5.0,
            cooldown_ticks: 10,
            effect: EffectKind::DirectDamage,
            magnitude: 1.0,
            xp_per_use: 1.0,
            xp_per_level: 10.0,
            max_level: 5,
        }
    }

    #[test]
    fn rejects_duplicate_ability_ids() {
        let file = ContentFile {
            schema_version: CONTENT_SCHEMA_VERSION,
            abilities: vec![ability("fire_palm"), ability("fire_palm")],
            techniques: Vec::new(),
            synergies: Vec::new(),
            talents: Vec::new(),
            realm_profiles: Vec::new(),
        };
        assert!(file.validate().is_err());
    }

    #[test]
    fn rejects_zero_stage_realm_profile() {
        let file = ContentFile {
            schema_version: CONTENT_SCHEMA_VERSION,
            abilities: Vec::new(),
            techniques: Vec::new(),
            synergies: Vec::new(),
            talents: Vec::new(),
            realm_profiles: vec![RealmProfile {
                realm: Realm::BodyRefinement,
                max_stage: 0,
                base_max_qi: 100.0,
                qi_per_stage: 10.0,
                base_qi_regen: 1.0,
                regen_per_stage: 0.0,
                base_required_points: 50.0,
                points_per_stage: 0.0,
                base_breakthrough_chance: 0.5,
                chance_decay: 0.0,
                base_progress_rate: 1.0,
                attack_multiplier: 1.0,
                speed_bonus: 0.0,
            }],
        };
        assert!(file.validate().is_err());
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let file = ContentFile {
            schema_version: 99,
            abilities: Vec::new(),
            techniques: Vec::new(),
            synergies: Vec::new(),
            talents: Vec::new(),
            realm_profiles: Vec::new(),
        };
        assert!(file.validate().is_err());
    }
}
