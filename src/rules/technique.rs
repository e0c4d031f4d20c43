use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::ability::{AbilityId, ParseEnumError};
use crate::rules::realm::Realm;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechniqueId(pub String);

impl TechniqueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechniqueCategory {
    Combat,
    Cultivation,
    Movement,
    Support,
    Forbidden,
}

/// A learnable technique. Learning one marks it known on the character and
/// grants its listed abilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueDef {
    pub id: TechniqueId,
    pub name: String,
    pub required_realm: Realm,
    pub category: TechniqueCategory,
    #[serde(default)]
    pub granted_abilities: Vec<AbilityId>,
}

impl FromStr for TechniqueCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMBAT" => Ok(TechniqueCategory::Combat),
            "CULTIVATION" => Ok(TechniqueCategory::Cultivation),
            "MOVEMENT" => Ok(TechniqueCategory::Movement),
            "SUPPORT" => Ok(TechniqueCategory::Support),
            "FORBIDDEN" => Ok(TechniqueCategory::Forbidden),
            _ => Err(ParseEnumError {
                value: s.to_string(),
            }),
        }
    }
}
