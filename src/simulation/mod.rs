pub mod abilities;
pub mod events;
pub mod executor;
pub mod progression;
pub mod time;

pub use abilities::{tick_cooldowns, AbilityManager, LearnError, LearnedAbility};
pub use events::{EngineEvent, EventBus, EventKind, SubscriberId};
pub use executor::{
    cast_ability, AbilityEffect, CastError, CastOutcome, EffectContext, EffectError, EffectLog,
    EffectRegistry,
};
pub use progression::{BreakthroughError, BreakthroughOutcome, ProgressionState};
pub use time::{advance_time_system, GameTime, TICKS_PER_DAY};
