use bevy_ecs::prelude::*;

use crate::registry::{DefinitionRegistry, LookupTables};
use crate::simulation::time::GameTime;

/// System: one staleness pass per tick. The lookup refresh pulls the registry
/// refresh in front of it, so both tiers stay ordered.
pub fn refresh_caches_system(
    mut registry: ResMut<DefinitionRegistry>,
    mut lookups: ResMut<LookupTables>,
    time: Res<GameTime>,
) {
    lookups.refresh_if_stale(&mut registry, time.tick);
}
