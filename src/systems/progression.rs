use bevy_ecs::prelude::*;

use crate::registry::DefinitionRegistry;
use crate::rules::TalentDef;
use crate::simulation::abilities::{tick_cooldowns, AbilityManager};
use crate::simulation::events::EventBus;
use crate::simulation::progression::ProgressionState;
use crate::simulation::time::GameTime;

/// System: runs one progression step for every cultivator — qi regeneration,
/// auto-progression accrual, and cooldown decay on both stores.
pub fn advance_progression_system(
    mut registry: ResMut<DefinitionRegistry>,
    time: Res<GameTime>,
    bus: Res<EventBus>,
    mut query: Query<(&mut ProgressionState, &mut AbilityManager)>,
) {
    let now = time.tick;
    for (mut state, mut manager) in query.iter_mut() {
        if let Some(stats) = registry.get_stage_stats(state.realm, state.stage, now) {
            let talent = registry
                .get_talent(state.talent, now)
                .cloned()
                .unwrap_or_else(|| TalentDef::neutral(state.talent));
            state.advance(1, &stats, &talent, &bus);
        }
        tick_cooldowns(&mut state, &mut manager, 1, &bus);
    }
}
