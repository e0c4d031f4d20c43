use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::ability::{AbilityId, ParseEnumError};
use crate::rules::realm::Realm;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynergyId(pub String);

impl SynergyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// A passive bonus unlocked by knowing a qualifying combination of abilities.
/// `required_abilities` keeps authoring order; the first entry doubles as the
/// fast-elimination key in the lookup tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyDef {
    pub id: SynergyId,
    pub name: String,
    pub rarity: Rarity,
    pub required_realm: Realm,
    pub required_abilities: Vec<AbilityId>,
    pub bonus_multiplier: f64,
    #[serde(default)]
    pub description: String,
}

impl SynergyDef {
    pub fn first_required_ability(&self) -> Option<&AbilityId> {
        self.required_abilities.first()
    }
}

impl FromStr for Rarity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMMON" => Ok(Rarity::Common),
            "UNCOMMON" => Ok(Rarity::Uncommon),
            "RARE" => Ok(Rarity::Rare),
            "EPIC" => Ok(Rarity::Epic),
            "LEGENDARY" => Ok(Rarity::Legendary),
            _ => Err(ParseEnumError {
                value: s.to_string(),
            }),
        }
    }
}
