use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::ability::ParseEnumError;

/// Innate aptitude tier, fixed at character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TalentTier {
    Mortal,
    Common,
    Blessed,
    Exceptional,
    Heavenly,
}

impl TalentTier {
    pub fn all() -> [TalentTier; 5] {
        [
            TalentTier::Mortal,
            TalentTier::Common,
            TalentTier::Blessed,
            TalentTier::Exceptional,
            TalentTier::Heavenly,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalentDef {
    pub tier: TalentTier,
    /// Scales qi regeneration and progression-point accrual.
    pub gain_multiplier: f64,
    /// Scales the qi pool cap from the stage profile.
    pub qi_multiplier: f64,
    /// Added to the stage's breakthrough chance before the roll.
    pub breakthrough_bonus: f64,
}

impl TalentDef {
    /// Neutral fallback when the catalog carries no entry for a tier.
    pub fn neutral(tier: TalentTier) -> Self {
        Self {
            tier,
            gain_multiplier: 1.0,
            qi_multiplier: 1.0,
            breakthrough_bonus: 0.0,
        }
    }
}

impl FromStr for TalentTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MORTAL" => Ok(TalentTier::Mortal),
            "COMMON" => Ok(TalentTier::Common),
            "BLESSED" => Ok(TalentTier::Blessed),
            "EXCEPTIONAL" => Ok(TalentTier::Exceptional),
            "HEAVENLY" => Ok(TalentTier::Heavenly),
            _ => Err(ParseEnumError {
                value: s.to_string(),
            }),
        }
    }
}
