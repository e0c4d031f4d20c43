use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::components::CultivatorId;
use crate::registry::DefinitionRegistry;
use crate::rules::{AbilityDef, AbilityId, EffectKind};
use crate::simulation::abilities::AbilityManager;
use crate::simulation::events::{EngineEvent, EventBus};
use crate::simulation::progression::ProgressionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    UnknownAbility(AbilityId),
    OnCooldown(AbilityId),
    InsufficientQi(AbilityId),
    EffectFailed(String),
}

impl std::fmt::Display for CastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastError::UnknownAbility(id) => write!(f, "unknown ability {}", id.0),
            CastError::OnCooldown(id) => write!(f, "{} is on cooldown", id.0),
            CastError::InsufficientQi(id) => write!(f, "not enough qi for {}", id.0),
            CastError::EffectFailed(message) => write!(f, "effect failed: {}", message),
        }
    }
}

impl std::error::Error for CastError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub ability: AbilityId,
    pub qi_spent: f64,
    pub cooldown_ticks: i64,
}

#[derive(Debug)]
pub struct EffectError(pub String);

/// Gameplay-side sink for effect output. Cleared once per tick by the cast
/// system; external systems read it after the schedule runs.
#[derive(Resource, Default, Debug)]
pub struct EffectLog(pub Vec<String>);

/// What an effect handler is allowed to see. Effects belong to external
/// gameplay systems; the engine only hands them the caster's identity, the
/// learned level, and a place to write output.
pub struct EffectContext<'a> {
    pub caster: CultivatorId,
    pub ability_level: u8,
    pub log: &'a mut EffectLog,
}

/// One implementation per ability behavior family, dispatched by the
/// definition's declared effect kind.
pub trait AbilityEffect: Send + Sync {
    fn apply(&self, ctx: &mut EffectContext, def: &AbilityDef) -> Result<(), EffectError>;
}

/// Effect dispatch table. The defaults only narrate into the `EffectLog`;
/// gameplay code overrides them with real handlers.
#[derive(Resource)]
pub struct EffectRegistry {
    handlers: HashMap<EffectKind, Box<dyn AbilityEffect>>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register(EffectKind::DirectDamage, LoggedEffect("strikes for"));
        registry.register(EffectKind::Buff, LoggedEffect("is bolstered by"));
        registry.register(EffectKind::AreaEffect, LoggedEffect("unleashes"));
        registry.register(EffectKind::ResourceTransfer, LoggedEffect("channels"));
        registry.register(EffectKind::Movement, LoggedEffect("moves with"));
        registry.register(EffectKind::Utility, LoggedEffect("invokes"));
        registry
    }
}

impl EffectRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: EffectKind, effect: impl AbilityEffect + 'static) {
        self.handlers.insert(kind, Box::new(effect));
    }

    pub fn handler(&self, kind: EffectKind) -> Option<&dyn AbilityEffect> {
        self.handlers.get(&kind).map(|h| h.as_ref())
    }
}

struct LoggedEffect(&'static str);

impl AbilityEffect for LoggedEffect {
    fn apply(&self, ctx: &mut EffectContext, def: &AbilityDef) -> Result<(), EffectError> {
        let scaled = def.magnitude * ctx.ability_level as f64;
        ctx.log.0.push(format!(
            "cultivator {} {} {} ({:.1})",
            ctx.caster.0, self.0, def.name, scaled
        ));
        Ok(())
    }
}

/// The only path through which an ability is cast. Checks run in order and
/// short-circuit; nothing is mutated and no event fires until the effect has
/// completed. Qi is never spent for an ability that did not take effect.
pub fn cast_ability(
    state: &mut ProgressionState,
    manager: &mut AbilityManager,
    registry: &mut DefinitionRegistry,
    effects: &EffectRegistry,
    log: &mut EffectLog,
    id: &AbilityId,
    now: u64,
    bus: &EventBus,
) -> Result<CastOutcome, CastError> {
    let def = registry
        .get_ability(id, now)
        .cloned()
        .ok_or_else(|| CastError::UnknownAbility(id.clone()))?;

    if state.is_on_cooldown(id) {
        return Err(CastError::OnCooldown(id.clone()));
    }
    if state.current_qi < def.qi_cost {
        return Err(CastError::InsufficientQi(id.clone()));
    }

    let handler = effects
        .handler(def.effect)
        .ok_or_else(|| CastError::EffectFailed(format!("no handler for {:?}", def.effect)))?;
    let mut ctx = EffectContext {
        caster: state.owner,
        ability_level: manager.learned_level(id).unwrap_or(1),
        log,
    };
    handler
        .apply(&mut ctx, &def)
        .map_err(|EffectError(message)| CastError::EffectFailed(message))?;

    // Effect completed; the bookkeeping below must not fail.
    state.try_consume_qi(def.qi_cost, bus);
    manager.set_cooldown(id, def.cooldown_ticks, state);
    manager.add_experience(id, def.xp_per_use, &def);

    bus.emit(&EngineEvent::AbilityUsed {
        cultivator: state.owner,
        ability: id.clone(),
    });

    Ok(CastOutcome {
        ability: id.clone(),
        qi_spent: def.qi_cost,
        cooldown_ticks: def.cooldown_ticks,
    })
}
