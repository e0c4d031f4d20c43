use bevy_ecs::prelude::*;

use crate::components::CultivatorId;
use crate::core::world::{ActionIntent, ActionQueue, RollSource};
use crate::registry::DefinitionRegistry;
use crate::rules::TalentDef;
use crate::simulation::abilities::AbilityManager;
use crate::simulation::events::EventBus;
use crate::simulation::executor::{cast_ability, EffectLog, EffectRegistry};
use crate::simulation::progression::{BreakthroughError, BreakthroughOutcome, ProgressionState};
use crate::simulation::time::GameTime;

/// Player-facing rejection/confirmation lines for the intents processed this
/// tick. Cleared at the start of every pass.
#[derive(Resource, Default, Debug)]
pub struct CastLog(pub Vec<String>);

/// System: drains the intent queue and runs each request through the
/// appropriate pipeline. All per-intent failures end up as log lines; none of
/// them abort the tick.
pub fn cast_intent_system(
    mut queue: ResMut<ActionQueue>,
    mut registry: ResMut<DefinitionRegistry>,
    effects: Res<EffectRegistry>,
    mut effect_log: ResMut<EffectLog>,
    mut cast_log: ResMut<CastLog>,
    mut rolls: ResMut<RollSource>,
    time: Res<GameTime>,
    bus: Res<EventBus>,
    mut query: Query<(&CultivatorId, &mut ProgressionState, &mut AbilityManager)>,
) {
    effect_log.0.clear();
    cast_log.0.clear();

    let intents = std::mem::take(&mut queue.0);
    let now = time.tick;

    for intent in intents {
        let target = intent.cultivator();
        let Some(target) = target else {
            continue;
        };
        let Some((_, mut state, mut manager)) = query
            .iter_mut()
            .find(|(id, _, _)| **id == CultivatorId(target))
        else {
            cast_log.0.push(format!("no such cultivator {}", target));
            continue;
        };

        match intent {
            ActionIntent::Cast { ability, .. } => {
                match cast_ability(
                    &mut state,
                    &mut manager,
                    &mut registry,
                    &effects,
                    &mut effect_log,
                    &ability,
                    now,
                    &bus,
                ) {
                    Ok(outcome) => cast_log
                        .0
                        .push(format!("{} cast ({:.0} qi)", outcome.ability.0, outcome.qi_spent)),
                    Err(err) => cast_log.0.push(err.to_string()),
                }
            }
            ActionIntent::AttemptBreakthrough { .. } => {
                let Some(stats) = registry.get_stage_stats(state.realm, state.stage, now) else {
                    cast_log
                        .0
                        .push(format!("no stage profile for {:?}", state.realm));
                    continue;
                };
                let talent = registry
                    .get_talent(state.talent, now)
                    .cloned()
                    .unwrap_or_else(|| TalentDef::neutral(state.talent));
                let roll = rolls.next_roll();
                match state.attempt_breakthrough(&stats, &talent, roll, &bus) {
                    Ok(BreakthroughOutcome::Failed) => {
                        cast_log.0.push("breakthrough failed".to_string());
                    }
                    Ok(_) => {
                        // realm or stage moved; the cap changes with it
                        if let Some(new_stats) =
                            registry.get_stage_stats(state.realm, state.stage, now)
                        {
                            state.recalculate_stats(&new_stats, &talent, &bus);
                        }
                        cast_log.0.push(format!(
                            "breakthrough: {} stage {}",
                            state.realm.display_name(),
                            state.stage
                        ));
                    }
                    Err(BreakthroughError::PreconditionNotMet) => {
                        cast_log.0.push("not ready to break through".to_string());
                    }
                }
            }
            ActionIntent::LearnAbility { ability, pay, .. } => {
                match registry.get_ability(&ability, now).cloned() {
                    Some(def) => match manager.learn_ability(&def, pay, &bus) {
                        Ok(()) => cast_log.0.push(format!("learned {}", def.name)),
                        Err(err) => cast_log.0.push(err.to_string()),
                    },
                    None => cast_log.0.push(format!("unknown ability {}", ability.0)),
                }
            }
            ActionIntent::LearnTechnique { technique, .. } => {
                match registry.get_technique(&technique, now).cloned() {
                    Some(def) => {
                        if !state.learn_technique(def.id.clone()) {
                            cast_log.0.push(format!("{} already known", def.name));
                            continue;
                        }
                        for granted in &def.granted_abilities {
                            if let Some(ability_def) = registry.get_ability(granted, now).cloned() {
                                // techniques grant their abilities for free
                                let _ = manager.learn_ability(&ability_def, false, &bus);
                            }
                        }
                        cast_log.0.push(format!("learned {}", def.name));
                    }
                    None => cast_log
                        .0
                        .push(format!("unknown technique {}", technique.0)),
                }
            }
            ActionIntent::SetAutoProgression { enabled, .. } => {
                state.set_auto_progression(enabled, &bus);
            }
            ActionIntent::Wait => {}
        }
    }
}
