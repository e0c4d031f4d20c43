pub mod cultivator;

pub use cultivator::{Cultivator, CultivatorId, Name};
