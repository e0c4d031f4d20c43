use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identifier for addressing cultivators externally. Also the id
/// carried on every event the engine raises.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CultivatorId(pub u32);

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

/// Marker component for anything that runs the progression tick.
#[derive(Component, Debug)]
pub struct Cultivator;
