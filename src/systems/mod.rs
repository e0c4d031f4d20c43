pub mod caches;
pub mod cast;
pub mod progression;

pub use caches::refresh_caches_system;
pub use cast::{cast_intent_system, CastLog};
pub use progression::advance_progression_system;
