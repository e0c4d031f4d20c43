use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::CultivatorId;
use crate::rules::{AbilityId, Realm, StageStats, TalentDef, TalentTier, TechniqueId};
use crate::simulation::events::{EngineEvent, EventBus};

/// One character's realm, stage, qi pool and cooldown timers. Mutated only by
/// the executor, the tick systems, and the breakthrough path below.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionState {
    pub owner: CultivatorId,
    pub realm: Realm,
    pub stage: u8,
    pub current_qi: f64,
    pub max_qi: f64,
    pub progression_points: f64,
    pub talent: TalentTier,
    pub known_techniques: HashSet<TechniqueId>,
    /// Ticks remaining per ability. Entries at or below zero are removed;
    /// mirrored exactly by `AbilityManager::cooldowns`.
    pub cooldowns: HashMap<AbilityId, i64>,
    pub auto_progression: bool,
}

/// Outcome of a resolved breakthrough attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakthroughOutcome {
    AdvancedStage { realm: Realm, stage: u8 },
    AdvancedRealm { realm: Realm },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakthroughError {
    /// Not enough progression points, or already at the final realm/stage.
    PreconditionNotMet,
}

impl std::fmt::Display for BreakthroughError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakthroughError::PreconditionNotMet => {
                write!(f, "breakthrough preconditions not met")
            }
        }
    }
}

impl std::error::Error for BreakthroughError {}

impl ProgressionState {
    pub fn new(owner: CultivatorId, talent: TalentTier) -> Self {
        Self {
            owner,
            realm: Realm::BodyRefinement,
            stage: 1,
            current_qi: 0.0,
            max_qi: 0.0,
            progression_points: 0.0,
            talent,
            known_techniques: HashSet::new(),
            cooldowns: HashMap::new(),
            auto_progression: false,
        }
    }

    /// One simulation step: qi regeneration, and progression-point accrual
    /// while auto-progression is running. Cooldown decay lives in
    /// `tick_cooldowns` because it has to touch both stores.
    pub fn advance(&mut self, ticks: u64, stats: &StageStats, talent: &TalentDef, bus: &EventBus) {
        let regen = stats.qi_regen_per_tick * talent.gain_multiplier * ticks as f64;
        if regen > 0.0 {
            self.gain_qi(regen, bus);
        }
        if self.auto_progression && self.can_progress(stats) {
            self.progression_points += stats.progress_rate * talent.gain_multiplier * ticks as f64;
        }
    }

    /// Deduct `amount` if the pool covers it. No mutation on failure.
    pub fn try_consume_qi(&mut self, amount: f64, bus: &EventBus) -> bool {
        if amount < 0.0 || self.current_qi < amount {
            return false;
        }
        let was_positive = self.current_qi > 0.0;
        self.current_qi -= amount;
        bus.emit(&EngineEvent::QiChanged {
            cultivator: self.owner,
            current: self.current_qi,
            max: self.max_qi,
        });
        if was_positive && self.current_qi <= 0.0 {
            self.current_qi = 0.0;
            bus.emit(&EngineEvent::ResourceDepleted {
                cultivator: self.owner,
            });
        }
        true
    }

    /// Add up to the cap; returns the amount actually added.
    pub fn add_qi(&mut self, amount: f64, bus: &EventBus) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        self.gain_qi(amount, bus)
    }

    fn gain_qi(&mut self, amount: f64, bus: &EventBus) -> f64 {
        let headroom = (self.max_qi - self.current_qi).max(0.0);
        let added = amount.min(headroom);
        if added <= 0.0 {
            return 0.0;
        }
        let was_full = self.current_qi >= self.max_qi;
        self.current_qi = (self.current_qi + added).min(self.max_qi);
        bus.emit(&EngineEvent::QiChanged {
            cultivator: self.owner,
            current: self.current_qi,
            max: self.max_qi,
        });
        if !was_full && self.current_qi >= self.max_qi {
            bus.emit(&EngineEvent::ResourceRestored {
                cultivator: self.owner,
            });
        }
        added
    }

    pub fn add_progression_points(&mut self, amount: f64) {
        if amount > 0.0 {
            self.progression_points += amount;
        }
    }

    /// Whether further advancement is possible at all from the current
    /// position in the lattice.
    pub fn can_progress(&self, stats: &StageStats) -> bool {
        self.stage < stats.max_stage || self.realm.next().is_some()
    }

    /// Resolve a breakthrough. `roll` is an externally supplied value in
    /// [0, 1); success requires `roll < chance + talent bonus`. Raises
    /// BreakthroughAttempt before resolution in every case.
    pub fn attempt_breakthrough(
        &mut self,
        stats: &StageStats,
        talent: &TalentDef,
        roll: f64,
        bus: &EventBus,
    ) -> Result<BreakthroughOutcome, BreakthroughError> {
        bus.emit(&EngineEvent::BreakthroughAttempt {
            cultivator: self.owner,
            realm: self.realm,
            stage: self.stage,
        });

        if self.progression_points < stats.required_points || !self.can_progress(stats) {
            bus.emit(&EngineEvent::BreakthroughResult {
                cultivator: self.owner,
                success: false,
            });
            return Err(BreakthroughError::PreconditionNotMet);
        }

        let chance = (stats.breakthrough_chance + talent.breakthrough_bonus).clamp(0.0, 1.0);
        if roll >= chance {
            bus.emit(&EngineEvent::BreakthroughResult {
                cultivator: self.owner,
                success: false,
            });
            return Ok(BreakthroughOutcome::Failed);
        }

        self.progression_points = (self.progression_points - stats.required_points).max(0.0);

        let outcome = if self.stage < stats.max_stage {
            self.stage += 1;
            BreakthroughOutcome::AdvancedStage {
                realm: self.realm,
                stage: self.stage,
            }
        } else {
            // can_progress guarantees a next realm exists here
            let next = self.realm.next().unwrap_or(self.realm);
            self.realm = next;
            self.stage = 1;
            BreakthroughOutcome::AdvancedRealm { realm: next }
        };

        bus.emit(&EngineEvent::BreakthroughResult {
            cultivator: self.owner,
            success: true,
        });
        match outcome {
            BreakthroughOutcome::AdvancedRealm { realm } => {
                bus.emit(&EngineEvent::RealmChanged {
                    cultivator: self.owner,
                    realm,
                });
            }
            BreakthroughOutcome::AdvancedStage { realm, stage } => {
                bus.emit(&EngineEvent::StageChanged {
                    cultivator: self.owner,
                    realm,
                    stage,
                });
            }
            BreakthroughOutcome::Failed => {}
        }
        Ok(outcome)
    }

    /// Recompute the qi cap from the stage profile and talent, clamping the
    /// pool immediately so the invariant holds at every observable point.
    pub fn recalculate_stats(&mut self, stats: &StageStats, talent: &TalentDef, bus: &EventBus) {
        self.max_qi = stats.max_qi * talent.qi_multiplier;
        if self.current_qi > self.max_qi {
            self.current_qi = self.max_qi;
            bus.emit(&EngineEvent::QiChanged {
                cultivator: self.owner,
                current: self.current_qi,
                max: self.max_qi,
            });
        }
        bus.emit(&EngineEvent::StatsRecalculated {
            cultivator: self.owner,
            max_qi: self.max_qi,
        });
    }

    pub fn set_auto_progression(&mut self, enabled: bool, bus: &EventBus) {
        if self.auto_progression == enabled {
            return;
        }
        self.auto_progression = enabled;
        let event = if enabled {
            EngineEvent::AutoProgressionStarted {
                cultivator: self.owner,
            }
        } else {
            EngineEvent::AutoProgressionStopped {
                cultivator: self.owner,
            }
        };
        bus.emit(&event);
    }

    pub fn learn_technique(&mut self, id: TechniqueId) -> bool {
        self.known_techniques.insert(id)
    }

    pub fn knows_technique(&self, id: &TechniqueId) -> bool {
        self.known_techniques.contains(id)
    }

    /// A cooldown entry counts only while it is strictly positive.
    pub fn is_on_cooldown(&self, id: &AbilityId) -> bool {
        self.cooldowns.get(id).map(|t| *t > 0).unwrap_or(false)
    }
}
