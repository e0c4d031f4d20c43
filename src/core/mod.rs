pub mod ecs;
pub mod serialization;
pub mod world;

pub use ecs::{create_schedule, create_world, TickSet};
pub use serialization::{
    apply_state_to_world, extract_state_from_world, load_state_from_path, save_state_to_path,
    SaveState, SavedCultivator,
};
pub use world::{
    ActionIntent, ActionQueue, CultivationSim, CultivatorSummary, IdAllocator, RollSource, Snapshot,
};
