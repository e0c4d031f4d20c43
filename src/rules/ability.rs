use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::realm::Realm;
use crate::rules::technique::TechniqueId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Behavior family an ability dispatches into. One effect handler exists per
/// variant; the handler itself lives outside the definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    DirectDamage,
    Buff,
    AreaEffect,
    ResourceTransfer,
    Movement,
    Utility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDef {
    pub id: AbilityId,
    pub name: String,
    pub required_realm: Realm,
    pub required_stage: u8,
    #[serde(default)]
    pub required_technique: Option<TechniqueId>,
    pub qi_cost: f64,
    pub cooldown_ticks: i64,
    pub effect: EffectKind,
    pub magnitude: f64,
    pub xp_per_use: f64,
    pub xp_per_level: f64,
    pub max_level: u8,
}

#[derive(Debug)]
pub struct ParseEnumError {
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown enum value: {}", self.value)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for EffectKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIRECT_DAMAGE" => Ok(EffectKind::DirectDamage),
            "BUFF" => Ok(EffectKind::Buff),
            "AREA_EFFECT" => Ok(EffectKind::AreaEffect),
            "RESOURCE_TRANSFER" => Ok(EffectKind::ResourceTransfer),
            "MOVEMENT" => Ok(EffectKind::Movement),
            "UTILITY" => Ok(EffectKind::Utility),
            _ => Err(ParseEnumError {
                value: s.to_string(),
            }),
        }
    }
}
