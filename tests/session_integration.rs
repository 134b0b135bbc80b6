//! Special-action session integration tests
//!
//! Jump attacks and their failure modes: missing ground, the watchdog,
//! pausing while deactivated, cooldowns and splitting on death.

use beastmind::agent::AgentEvent;
use beastmind::core::config::{ArchetypeConfig, ArenaConfig, CreatureBlueprint, SlimeConfig};
use beastmind::core::types::AgentState;
use beastmind::session::{SessionOutcome, SessionPhase, SpecialActionKind};
use beastmind::simulation::Arena;
use beastmind::world::DamageLedger;
use glam::Vec3;

fn slime(config: SlimeConfig) -> CreatureBlueprint {
    let mut blueprint = CreatureBlueprint::new("slime", ArchetypeConfig::Slime(config));
    blueprint.agent.perception_interval = 0.0;
    blueprint
}

fn ended(events: &[AgentEvent]) -> Vec<SessionOutcome> {
    events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::SpecialActionEnded {
                kind: SpecialActionKind::JumpAttack,
                outcome,
                ..
            } => Some(*outcome),
            _ => None,
        })
        .collect()
}

fn started(events: &[AgentEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AgentEvent::SpecialActionStarted { .. }))
        .count()
}

/// A full jump: crouch, launch, land on the player, settle
#[test]
fn test_jump_lands_and_completes() {
    let mut arena = Arena::new(ArenaConfig::default(), 0.05);
    let player = arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));
    let id = arena.spawn_agent(&slime(SlimeConfig::default()), Vec3::ZERO);

    let mut events = Vec::new();
    for _ in 0..80 {
        events.extend(arena.tick());
    }

    assert_eq!(started(&events), 1);
    assert_eq!(ended(&events), vec![SessionOutcome::Completed]);
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Landed { agent, .. } if *agent == id)));
    assert!(arena.world().health_percentage(player).unwrap() < 1.0);
    assert!(arena.agent(id).unwrap().session().is_none());
}

/// With no floor the jump never lands; the airborne timeout ends it cleanly
#[test]
fn test_no_ground_times_out_without_damage() {
    let config = ArenaConfig {
        ground_height: None,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::new(config, 0.1);
    let player = arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));
    let id = arena.spawn_agent(&slime(SlimeConfig::default()), Vec3::ZERO);

    let mut events = Vec::new();
    for _ in 0..40 {
        events.extend(arena.tick());
    }

    assert_eq!(ended(&events), vec![SessionOutcome::TimedOut]);
    assert!(!events.iter().any(|e| matches!(e, AgentEvent::Landed { .. })));
    assert_eq!(arena.world().health_percentage(player), Some(1.0));
    assert_eq!(arena.agent(id).unwrap().state(), AgentState::Aggressive);
}

/// A session that overruns the watchdog is force-cancelled as timed out
#[test]
fn test_watchdog_cancels_stuck_session() {
    let config = ArenaConfig {
        ground_height: None,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::new(config, 0.1);
    arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));

    let mut blueprint = slime(SlimeConfig {
        airborne_timeout: 20.0,
        ..SlimeConfig::default()
    });
    blueprint.agent.special_action_watchdog = 2.0;
    let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

    let mut events = Vec::new();
    for _ in 0..30 {
        events.extend(arena.tick());
    }

    assert_eq!(ended(&events), vec![SessionOutcome::TimedOut]);
    let agent = arena.agent(id).unwrap();
    assert!(agent.session().is_none());
    assert_eq!(agent.state(), AgentState::Aggressive);
}

/// Coarse steps land exactly on the cap; the session must be gone by then
#[test]
fn test_watchdog_cap_holds_at_coarse_steps() {
    let config = ArenaConfig {
        ground_height: None,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::new(config, 0.5);
    arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));

    let mut blueprint = slime(SlimeConfig {
        airborne_timeout: 20.0,
        ..SlimeConfig::default()
    });
    blueprint.agent.special_action_watchdog = 2.0;
    let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

    let mut events = Vec::new();
    let mut seen = Vec::new();
    for _ in 0..8 {
        events.extend(arena.tick());
        if let Some(session) = arena.agent(id).unwrap().session() {
            seen.push(session.elapsed);
        }
    }

    assert_eq!(ended(&events), vec![SessionOutcome::TimedOut]);
    assert_eq!(seen, vec![0.0, 0.5, 1.0, 1.5]);
}

/// Deactivation freezes the session; reactivation resumes it where it was
#[test]
fn test_session_survives_deactivation() {
    let config = ArenaConfig {
        activation_radius: None,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::new(config, 0.1);
    arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));
    let id = arena.spawn_agent(&slime(SlimeConfig::default()), Vec3::ZERO);

    arena.tick();
    arena.tick();
    let before = arena.agent(id).unwrap().session().unwrap();
    assert_eq!(before.phase, SessionPhase::Prepare);

    arena.set_agent_active(id, false);
    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(arena.tick());
    }
    assert!(events.is_empty());
    assert_eq!(arena.agent(id).unwrap().session(), Some(before));

    arena.set_agent_active(id, true);
    arena.tick();
    let after = arena.agent(id).unwrap().session().unwrap();
    assert!(after.elapsed > before.elapsed);
}

/// The next jump waits out the cooldown counted from the end of the last one
#[test]
fn test_jump_cooldown() {
    let home = Vec3::ZERO;
    let mut arena = Arena::new(ArenaConfig::default(), 0.05);
    let player = arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));
    let id = arena.spawn_agent(&slime(SlimeConfig::default()), home);

    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for _ in 0..160 {
        // Keep the slime at jumping distance between jumps
        arena.world_mut().set_position(player, Vec3::new(5.0, 0.0, 0.0));
        if !arena.agent(id).unwrap().is_acting() {
            arena.world_mut().set_position(id, home);
        }
        let events = arena.tick();
        if started(&events) > 0 {
            starts.push(arena.now());
        }
        if !ended(&events).is_empty() {
            ends.push(arena.now());
        }
    }

    assert!(starts.len() >= 2, "starts at {:?}", starts);
    assert_eq!(starts[0], 0.0);
    let wait = starts[1] - ends[0];
    assert!(wait >= 4.0 - 1e-4, "jumped again after {:.2}s", wait);
    assert!(wait < 4.2, "waited {:.2}s", wait);
}

/// Killing a splitting slime leaves smaller, independent copies behind
#[test]
fn test_split_on_death() {
    let mut config = SlimeConfig::default();
    config.split.enabled = true;
    config.split.count = 3;
    config.split.generations = 1;

    let mut arena = Arena::new(ArenaConfig::default(), 0.1);
    let player = arena.spawn_player(Vec3::new(30.0, 0.0, 0.0));
    let id = arena.spawn_agent(&slime(config), Vec3::ZERO);

    arena.damage(id, 1000.0, Some(player));
    let events = arena.tick();

    assert!(events.contains(&AgentEvent::Died { agent: id }));
    let children = events
        .iter()
        .find_map(|e| match e {
            AgentEvent::Split { parent, children } if *parent == id => Some(children.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(children.len(), 3);
    assert!(arena.agent(id).is_none());
    assert_eq!(arena.agents().len(), 3);

    let child_max = arena.world().max_health(children[0]).unwrap();
    assert!((child_max - 40.0).abs() < 1e-3);

    // The last generation dies for good
    arena.damage(children[0], 1000.0, Some(player));
    let events = arena.tick();
    assert!(events.contains(&AgentEvent::Died { agent: children[0] }));
    assert!(!events.iter().any(|e| matches!(e, AgentEvent::Split { .. })));
    assert_eq!(arena.agents().len(), 2);
}
