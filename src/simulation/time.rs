use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Global resource tracking the simulation timeline. The raw tick drives the
/// cache staleness clocks and cooldown decay; day bookkeeping exists for
/// external observers.
#[derive(Resource, Debug, Serialize, Deserialize, Clone)]
pub struct GameTime {
    pub tick: u64,
    pub day: u32,
}

pub const TICKS_PER_DAY: u64 = 24_000;

impl Default for GameTime {
    fn default() -> Self {
        Self { tick: 0, day: 1 }
    }
}

impl GameTime {
    pub fn advance(&mut self) {
        self.tick += 1;
        if self.tick % TICKS_PER_DAY == 0 {
            self.day += 1;
        }
    }
}

/// System: advances the clock. One schedule run is one tick.
pub fn advance_time_system(mut time: ResMut<GameTime>) {
    time.advance();
}
