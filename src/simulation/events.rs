use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::components::CultivatorId;
use crate::rules::{AbilityId, Realm};

/// Everything the engine announces about a cultivator's state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    QiChanged {
        cultivator: CultivatorId,
        current: f64,
        max: f64,
    },
    RealmChanged {
        cultivator: CultivatorId,
        realm: Realm,
    },
    StageChanged {
        cultivator: CultivatorId,
        realm: Realm,
        stage: u8,
    },
    BreakthroughAttempt {
        cultivator: CultivatorId,
        realm: Realm,
        stage: u8,
    },
    BreakthroughResult {
        cultivator: CultivatorId,
        success: bool,
    },
    AbilityUsed {
        cultivator: CultivatorId,
        ability: AbilityId,
    },
    AbilityUnlocked {
        cultivator: CultivatorId,
        ability: AbilityId,
    },
    CooldownExpired {
        cultivator: CultivatorId,
        ability: AbilityId,
    },
    ResourceDepleted {
        cultivator: CultivatorId,
    },
    ResourceRestored {
        cultivator: CultivatorId,
    },
    StatsRecalculated {
        cultivator: CultivatorId,
        max_qi: f64,
    },
    AutoProgressionStarted {
        cultivator: CultivatorId,
    },
    AutoProgressionStopped {
        cultivator: CultivatorId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    QiChanged,
    RealmChanged,
    StageChanged,
    BreakthroughAttempt,
    BreakthroughResult,
    AbilityUsed,
    AbilityUnlocked,
    CooldownExpired,
    ResourceDepleted,
    ResourceRestored,
    StatsRecalculated,
    AutoProgressionStarted,
    AutoProgressionStopped,
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::QiChanged { .. } => EventKind::QiChanged,
            EngineEvent::RealmChanged { .. } => EventKind::RealmChanged,
            EngineEvent::StageChanged { .. } => EventKind::StageChanged,
            EngineEvent::BreakthroughAttempt { .. } => EventKind::BreakthroughAttempt,
            EngineEvent::BreakthroughResult { .. } => EventKind::BreakthroughResult,
            EngineEvent::AbilityUsed { .. } => EventKind::AbilityUsed,
            EngineEvent::AbilityUnlocked { .. } => EventKind::AbilityUnlocked,
            EngineEvent::CooldownExpired { .. } => EventKind::CooldownExpired,
            EngineEvent::ResourceDepleted { .. } => EventKind::ResourceDepleted,
            EngineEvent::ResourceRestored { .. } => EventKind::ResourceRestored,
            EngineEvent::StatsRecalculated { .. } => EventKind::StatsRecalculated,
            EngineEvent::AutoProgressionStarted { .. } => EventKind::AutoProgressionStarted,
            EngineEvent::AutoProgressionStopped { .. } => EventKind::AutoProgressionStopped,
        }
    }

    pub fn cultivator(&self) -> CultivatorId {
        match self {
            EngineEvent::QiChanged { cultivator, .. }
            | EngineEvent::RealmChanged { cultivator, .. }
            | EngineEvent::StageChanged { cultivator, .. }
            | EngineEvent::BreakthroughAttempt { cultivator, .. }
            | EngineEvent::BreakthroughResult { cultivator, .. }
            | EngineEvent::AbilityUsed { cultivator, .. }
            | EngineEvent::AbilityUnlocked { cultivator, .. }
            | EngineEvent::CooldownExpired { cultivator, .. }
            | EngineEvent::ResourceDepleted { cultivator }
            | EngineEvent::ResourceRestored { cultivator }
            | EngineEvent::StatsRecalculated { cultivator, .. }
            | EngineEvent::AutoProgressionStarted { cultivator }
            | EngineEvent::AutoProgressionStopped { cultivator } => *cultivator,
        }
    }
}

/// Handle returned by `subscribe`, used to drop the subscription later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback = Box<dyn Fn(&EngineEvent) + Send + Sync>;

/// Synchronous multicast point. Subscribers per event kind are invoked in
/// registration order on the calling thread. Callbacks must not re-enter the
/// bus for the same event kind; no reentrancy guarantee is made.
#[derive(Resource, Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<(SubscriberId, Callback)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.next_id += 1;
        let id = SubscriberId(self.next_id);
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        for list in self.subscribers.values_mut() {
            if let Some(pos) = list.iter().position(|(sub, _)| *sub == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn emit(&self, event: &EngineEvent) {
        if let Some(list) = self.subscribers.get(&event.kind()) {
            for (_, callback) in list {
                callback(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn subscribers_run_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(EventKind::ResourceDepleted, move |_| {
                seen.lock().unwrap().push(tag);
            });
        }

        bus.emit(&EngineEvent::ResourceDepleted {
            cultivator: CultivatorId(1),
        });
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_subscriber() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0u32));

        let keep = Arc::clone(&count);
        bus.subscribe(EventKind::ResourceRestored, move |_| {
            *keep.lock().unwrap() += 1;
        });
        let gone = Arc::clone(&count);
        let id = bus.subscribe(EventKind::ResourceRestored, move |_| {
            *gone.lock().unwrap() += 10;
        });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        bus.emit(&EngineEvent::ResourceRestored {
            cultivator: CultivatorId(1),
        });
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn events_only_reach_their_own_kind() {
        let mut bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0u32));

        let hits_sub = Arc::clone(&hits);
        bus.subscribe(EventKind::RealmChanged, move |event| {
            assert_eq!(event.kind(), EventKind::RealmChanged);
            *hits_sub.lock().unwrap() += 1;
        });

        bus.emit(&EngineEvent::StageChanged {
            cultivator: CultivatorId(1),
            realm: Realm::QiCondensation,
            stage: 2,
        });
        assert_eq!(*hits.lock().unwrap(), 0);

        bus.emit(&EngineEvent::RealmChanged {
            cultivator: CultivatorId(1),
            realm: Realm::QiCondensation,
        });
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
