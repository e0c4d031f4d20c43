use std::sync::{Arc, Mutex};

use cultivation_engine::content::StaticCatalog;
use cultivation_engine::rules::{
    AbilityDef, AbilityId, EffectKind, Realm, RealmProfile, TalentDef, TalentTier, TechniqueCategory,
    TechniqueDef, TechniqueId,
};
use cultivation_engine::{ActionIntent, CultivationSim, EventKind};

fn profile(realm: Realm) -> RealmProfile {
    RealmProfile {
        realm,
        max_stage: 3,
        base_max_qi: 100.0,
        qi_per_stage: 20.0,
        base_qi_regen: 0.0,
        regen_per_stage: 0.0,
        base_required_points: 50.0,
        points_per_stage: 0.0,
        base_breakthrough_chance: 1.0,
        chance_decay: 0.0,
        base_progress_rate: 10.0,
        attack_multiplier: 1.0,
        speed_bonus: 0.0,
    }
}

fn ability(id: &str, qi_cost: f64, cooldown: i64) -> AbilityDef {
    AbilityDef {
        id: AbilityId::new(id),
        name: id.replace('_', " "),
        required_realm: Realm::BodyRefinement,
        required_stage: 1,
        required_technique: None,
        qi_cost,
        cooldown_ticks: cooldown,
        effect: EffectKind::DirectDamage,
        magnitude: 3.0,
        xp_per_use: 1.0,
        xp_per_level: 10.0,
        max_level: 5,
    }
}

fn catalog() -> Arc<StaticCatalog> {
    let technique = TechniqueDef {
        id: TechniqueId::new("flame_art"),
        name: "Flame Art".to_string(),
        required_realm: Realm::BodyRefinement,
        category: TechniqueCategory::Combat,
        granted_abilities: vec![AbilityId::new("fire_palm")],
    };
    Arc::new(StaticCatalog::new(
        vec![ability("fire_palm", 20.0, 300)],
        vec![technique],
        Vec::new(),
        vec![TalentDef::neutral(TalentTier::Common)],
        vec![profile(Realm::BodyRefinement), profile(Realm::QiCondensation)],
    ))
}

#[test]
fn spawn_starts_with_a_full_pool() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);

    let snapshot = sim.tick(Vec::new());
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.qi, (100.0, 100.0));
    assert_eq!(me.realm, Realm::BodyRefinement);
    assert_eq!(me.stage, 1);
}

#[test]
fn cast_spends_qi_and_blocks_until_cooldown_expires() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);
    let id = AbilityId::new("fire_palm");

    let snapshot = sim.tick(vec![ActionIntent::Cast {
        cultivator: uid,
        ability: id.clone(),
    }]);
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.qi.0, 80.0);
    assert_eq!(snapshot.effect_log.len(), 1);

    // both stores carry the timer
    let progression = sim.progression(uid).unwrap();
    let manager = sim.abilities(uid).unwrap();
    assert_eq!(progression.cooldowns.get(&id), manager.cooldowns.get(&id));
    assert!(progression.is_on_cooldown(&id));

    let snapshot = sim.tick(vec![ActionIntent::Cast {
        cultivator: uid,
        ability: id.clone(),
    }]);
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.qi.0, 80.0, "rejected cast must not spend qi");
    assert!(snapshot.cast_log.iter().any(|line| line.contains("cooldown")));
}

#[test]
fn auto_progression_feeds_a_successful_breakthrough() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);

    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::BreakthroughAttempt,
        EventKind::BreakthroughResult,
        EventKind::StageChanged,
    ] {
        let events = Arc::clone(&events);
        sim.subscribe(kind, move |event| {
            events.lock().unwrap().push(event.kind());
        });
    }

    sim.tick(vec![ActionIntent::SetAutoProgression {
        cultivator: uid,
        enabled: true,
    }]);
    // rate 10/tick against a 50-point threshold
    for _ in 0..5 {
        sim.tick(Vec::new());
    }

    let snapshot = sim.tick(vec![ActionIntent::AttemptBreakthrough { cultivator: uid }]);
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.stage, 2);
    assert!(me.progression_points < 50.0);
    // stage 2 raises the cap
    assert_eq!(me.qi.1, 120.0);

    let seen = events.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            EventKind::BreakthroughAttempt,
            EventKind::BreakthroughResult,
            EventKind::StageChanged,
        ]
    );
}

#[test]
fn learning_a_technique_grants_its_abilities() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);

    let snapshot = sim.tick(vec![ActionIntent::LearnTechnique {
        cultivator: uid,
        technique: TechniqueId::new("flame_art"),
    }]);
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.learned_abilities, 1);

    let progression = sim.progression(uid).unwrap();
    assert!(progression.knows_technique(&TechniqueId::new("flame_art")));
}

#[test]
fn save_and_load_round_trips_cultivators() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);
    let id = AbilityId::new("fire_palm");

    sim.tick(vec![ActionIntent::Cast {
        cultivator: uid,
        ability: id.clone(),
    }]);
    let saved = sim.save_state();

    let mut restored = CultivationSim::new(catalog(), 1);
    restored.load_state(saved);

    let progression = restored.progression(uid).unwrap();
    let manager = restored.abilities(uid).unwrap();
    assert_eq!(progression.current_qi, 80.0);
    assert!(progression.cooldowns.contains_key(&id));
    assert_eq!(progression.cooldowns.get(&id), manager.cooldowns.get(&id));

    let snapshot = restored.tick(Vec::new());
    let me = snapshot.cultivators.iter().find(|c| c.id == uid).unwrap();
    assert_eq!(me.name, "Li Wei");
}

#[test]
fn unknown_ability_surfaces_as_a_rejection_line() {
    let mut sim = CultivationSim::new(catalog(), 1);
    let uid = sim.spawn_cultivator("Li Wei", TalentTier::Common);

    let snapshot = sim.tick(vec![ActionIntent::Cast {
        cultivator: uid,
        ability: AbilityId::new("void_rend"),
    }]);
    assert!(snapshot
        .cast_log
        .iter()
        .any(|line| line.contains("unknown ability")));
}
