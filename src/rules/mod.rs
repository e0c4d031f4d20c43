pub mod ability;
pub mod realm;
pub mod synergy;
pub mod tags;
pub mod talent;
pub mod technique;

pub use ability::{AbilityDef, AbilityId, EffectKind, ParseEnumError};
pub use realm::{Realm, RealmProfile, StageStats, MIN_BREAKTHROUGH_CHANCE};
pub use synergy::{Rarity, SynergyDef, SynergyId};
pub use tags::{CategoryTag, ElementTag};
pub use talent::{TalentDef, TalentTier};
pub use technique::{TechniqueCategory, TechniqueDef, TechniqueId};
