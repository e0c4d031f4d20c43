use serde::{Deserialize, Serialize};

/// Major cultivation tiers, strictly ordered. A character only ever moves
/// forward through this list; there is no demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Realm {
    BodyRefinement,
    QiCondensation,
    FoundationEstablishment,
    CoreFormation,
    NascentSoul,
    Ascension,
}

impl Realm {
    pub fn all() -> [Realm; 6] {
        [
            Realm::BodyRefinement,
            Realm::QiCondensation,
            Realm::FoundationEstablishment,
            Realm::CoreFormation,
            Realm::NascentSoul,
            Realm::Ascension,
        ]
    }

    pub fn next(self) -> Option<Realm> {
        match self {
            Realm::BodyRefinement => Some(Realm::QiCondensation),
            Realm::QiCondensation => Some(Realm::FoundationEstablishment),
            Realm::FoundationEstablishment => Some(Realm::CoreFormation),
            Realm::CoreFormation => Some(Realm::NascentSoul),
            Realm::NascentSoul => Some(Realm::Ascension),
            Realm::Ascension => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Realm::BodyRefinement => "Body Refinement",
            Realm::QiCondensation => "Qi Condensation",
            Realm::FoundationEstablishment => "Foundation Establishment",
            Realm::CoreFormation => "Core Formation",
            Realm::NascentSoul => "Nascent Soul",
            Realm::Ascension => "Ascension",
        }
    }
}

impl std::str::FromStr for Realm {
    type Err = crate::rules::ability::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BODY_REFINEMENT" => Ok(Realm::BodyRefinement),
            "QI_CONDENSATION" => Ok(Realm::QiCondensation),
            "FOUNDATION_ESTABLISHMENT" => Ok(Realm::FoundationEstablishment),
            "CORE_FORMATION" => Ok(Realm::CoreFormation),
            "NASCENT_SOUL" => Ok(Realm::NascentSoul),
            "ASCENSION" => Ok(Realm::Ascension),
            _ => Err(crate::rules::ability::ParseEnumError {
                value: s.to_string(),
            }),
        }
    }
}

/// Content-driven stat profile for one realm. Per-stage values are linear
/// offsets from the base so authors can tune a realm with a handful of numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmProfile {
    pub realm: Realm,
    pub max_stage: u8,
    pub base_max_qi: f64,
    pub qi_per_stage: f64,
    pub base_qi_regen: f64,
    pub regen_per_stage: f64,
    pub base_required_points: f64,
    pub points_per_stage: f64,
    /// Success chance for a breakthrough at stage 1; drops by `chance_decay`
    /// for each further stage, floored at `MIN_BREAKTHROUGH_CHANCE`.
    pub base_breakthrough_chance: f64,
    pub chance_decay: f64,
    pub base_progress_rate: f64,
    pub attack_multiplier: f64,
    pub speed_bonus: f64,
}

pub const MIN_BREAKTHROUGH_CHANCE: f64 = 0.05;

/// Snapshot of the effective numbers for one (realm, stage) pair. This is the
/// surface handed to external stat-modifier systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageStats {
    pub realm: Realm,
    pub stage: u8,
    pub max_stage: u8,
    pub max_qi: f64,
    pub qi_regen_per_tick: f64,
    pub required_points: f64,
    pub breakthrough_chance: f64,
    pub progress_rate: f64,
    pub attack_multiplier: f64,
    pub speed_bonus: f64,
}

impl RealmProfile {
    /// Effective stats for a stage within this realm. Stages past `max_stage`
    /// are clamped rather than extrapolated. A profile authored with
    /// `max_stage: 0` is treated as a one-stage realm.
    pub fn stage_stats(&self, stage: u8) -> StageStats {
        let max_stage = self.max_stage.max(1);
        let stage = stage.clamp(1, max_stage);
        let steps = (stage - 1) as f64;
        StageStats {
            realm: self.realm,
            stage,
            max_stage,
            max_qi: self.base_max_qi + self.qi_per_stage * steps,
            qi_regen_per_tick: self.base_qi_regen + self.regen_per_stage * steps,
            required_points: self.base_required_points + self.points_per_stage * steps,
            breakthrough_chance: (self.base_breakthrough_chance - self.chance_decay * steps)
                .max(MIN_BREAKTHROUGH_CHANCE),
            progress_rate: self.base_progress_rate,
            attack_multiplier: self.attack_multiplier,
            speed_bonus: self.speed_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_spelling_matches_the_parse_spelling() {
        let json = serde_json::to_string(&Realm::BodyRefinement).unwrap();
        assert_eq!(json, "\"BODY_REFINEMENT\"");
        assert_eq!(json.trim_matches('"').parse::<Realm>().ok(), Some(Realm::BodyRefinement));
    }

    #[test]
    fn realms_are_ordered() {
        let realms = Realm::all();
        for pair in realms.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(Realm::Ascension.next(), None);
    }

    #[test]
    fn stage_stats_clamp_to_max_stage() {
        let profile = RealmProfile {
            realm: Realm::QiCondensation,
            max_stage: 9,
            base_max_qi: 100.0,
            qi_per_stage: 10.0,
            base_qi_regen: 1.0,
            regen_per_stage: 0.1,
            base_required_points: 50.0,
            points_per_stage: 25.0,
            base_breakthrough_chance: 0.9,
            chance_decay: 0.2,
            base_progress_rate: 0.5,
            attack_multiplier: 1.0,
            speed_bonus: 0.0,
        };
        let capped = profile.stage_stats(40);
        assert_eq!(capped.stage, 9);
        assert_eq!(capped.max_qi, 180.0);
        // chance floors instead of going negative
        assert_eq!(capped.breakthrough_chance, MIN_BREAKTHROUGH_CHANCE);
    }

    #[test]
    fn zero_max_stage_profile_acts_as_a_one_stage_realm() {
        let profile = RealmProfile {
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
        };
        let stats = profile.stage_stats(1);
        assert_eq!(stats.stage, 1);
        assert_eq!(stats.max_stage, 1);
        assert_eq!(stats.max_qi, 100.0);
    }
}
