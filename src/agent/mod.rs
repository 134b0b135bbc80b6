//! The base behavior state machine
//!
//! One `Agent` drives one creature. Each tick it advances its timers, runs
//! perception, applies the transition rules in priority order and then
//! dispatches to the handler of its current state. Class-specific behavior
//! (extra perception, tactical offsets, special actions, attacks) lives in
//! its `Archetype`; the base machine keeps sole authority over transitions.

pub mod events;
mod flee;
mod movement;
mod perception;
mod wander;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::behavior::{Archetype, Engagement};
use crate::combat::CombatState;
use crate::core::config::{AgentConfig, ArchetypeConfig, CreatureBlueprint};
use crate::core::error::{BeastError, Result};
use crate::core::types::{AgentProfile, AgentState, BehaviorClass, EntityId, FrameTime};
use crate::session::{SessionOutcome, SessionSnapshot};
use crate::spatial::geometry::{forward_from_yaw, planar_distance};
use crate::world::{DamageReport, Environment};

pub use events::AgentEvent;
pub use movement::MoveOutcome;
pub use perception::Sighting;

pub(crate) use movement::Detour;
pub(crate) use wander::Wander;

/// Mixed into the entity bits so agent seeds differ from other id hashes
const SEED_SALT: u64 = 0x5EED_BEA5_7000_0001;

/// Absorbs f32 drift in session time summed from frame deltas
const WATCHDOG_SLACK: f32 = 1e-4;

/// State shared by every archetype
///
/// Archetypes receive it by `&mut` alongside their own private state, which
/// the base machine never reads.
#[derive(Debug, Clone)]
pub struct AgentCore {
    pub(crate) id: EntityId,
    pub(crate) class: BehaviorClass,
    pub(crate) state: AgentState,
    pub(crate) target: Option<EntityId>,
    /// Last position the target (or threat) was seen at
    pub(crate) last_known_target: Option<Vec3>,
    /// Source of the latest hit; forgotten once the agent calms down
    pub(crate) last_damage_source: Option<EntityId>,
    pub(crate) home: Vec3,
    /// Transform cached from the body at the start of each update
    pub(crate) position: Vec3,
    pub(crate) yaw: f32,
    pub(crate) now: f32,
    pub(crate) config: AgentConfig,
    pub(crate) rng: ChaCha8Rng,
    /// Stable per-instance angle for tactical offsets
    pub(crate) offset_angle: f32,
    pub(crate) perception_timer: f32,
    pub(crate) wander: Wander,
    pub(crate) detour: Option<Detour>,
    pub(crate) combat: CombatState,
    pub(crate) events: Vec<AgentEvent>,
}

impl AgentCore {
    pub(crate) fn emit(&mut self, event: AgentEvent) {
        self.events.push(event);
    }

    /// Preferred side around a crowded target, fixed for this agent's life
    pub(crate) fn offset_direction(&self) -> Vec3 {
        forward_from_yaw(self.offset_angle)
    }

    pub(crate) fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    fn sync_transform(&mut self, env: &dyn Environment) {
        if let Some(position) = env.position(self.id) {
            self.position = position;
        }
        if let Some(yaw) = env.yaw(self.id) {
            self.yaw = yaw;
        }
    }

    pub(crate) fn write_transform(&self, env: &mut dyn Environment) {
        env.set_transform(self.id, self.position, self.yaw);
    }

    fn set_state(&mut self, next: AgentState) {
        let from = self.state;
        debug!("Agent {} {:?} -> {:?}", self.id, from, next);
        self.state = next;
        self.emit(AgentEvent::StateChanged {
            agent: self.id,
            from,
            to: next,
        });
    }
}

/// One simulated creature
#[derive(Debug, Clone)]
pub struct Agent {
    core: AgentCore,
    archetype: Archetype,
    /// Set by population management; inactive agents do no work
    active: bool,
    /// Set when a required dependency was missing at initialization
    disabled: bool,
    alive: bool,
}

impl Agent {
    pub fn new(id: EntityId, config: AgentConfig, archetype: &ArchetypeConfig, home: Vec3) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(id.to_bits() ^ SEED_SALT);
        let offset_angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let base_cooldown = match archetype {
            ArchetypeConfig::Ranged(ranged) => ranged.fire_cooldown,
            _ => config.strike.cooldown,
        };

        Self {
            core: AgentCore {
                id,
                class: archetype.class(),
                state: AgentState::Passive,
                target: None,
                last_known_target: None,
                last_damage_source: None,
                home,
                position: home,
                yaw: 0.0,
                now: 0.0,
                config,
                rng,
                offset_angle,
                perception_timer: 0.0,
                wander: Wander::default(),
                detour: None,
                combat: CombatState::new(base_cooldown),
                events: Vec::new(),
            },
            archetype: Archetype::from_config(archetype),
            active: true,
            disabled: false,
            alive: true,
        }
    }

    pub fn from_blueprint(id: EntityId, blueprint: &CreatureBlueprint, home: Vec3) -> Self {
        Self::new(id, blueprint.agent.clone(), &blueprint.archetype, home)
    }

    /// Check external dependencies; a failing agent disables itself entirely
    pub fn initialize(&mut self, env: &dyn Environment) -> Result<()> {
        let id = self.core.id;
        let missing = if !env.is_alive(id) {
            Some("body")
        } else if !env.has_ledger(id) {
            Some("health ledger")
        } else {
            None
        };

        if let Some(what) = missing {
            self.disabled = true;
            let err = BeastError::MissingDependency { entity: id, what };
            warn!("{}; agent disabled", err);
            return Err(err);
        }

        self.core.sync_transform(env);
        self.core.home = self.core.position;
        Ok(())
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn class(&self) -> BehaviorClass {
        self.core.class
    }

    pub fn state(&self) -> AgentState {
        self.core.state
    }

    pub fn target(&self) -> Option<EntityId> {
        self.core.target
    }

    pub fn home(&self) -> Vec3 {
        self.core.home
    }

    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    pub fn combat(&self) -> &CombatState {
        &self.core.combat
    }

    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    pub(crate) fn core(&self) -> &AgentCore {
        &self.core
    }

    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            class: self.core.class,
            state: self.core.state,
        }
    }

    /// The running special action, if any
    pub fn session(&self) -> Option<SessionSnapshot> {
        self.archetype.session()
    }

    /// Busy with a special action or a pending swing
    pub fn is_acting(&self) -> bool {
        self.archetype.session_active() || self.core.combat.swinging()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Population management toggles this; state and sessions are kept as-is
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!("Agent {} active={}", self.core.id, active);
        }
        self.active = active;
    }

    /// Hand the agent over to external control
    pub fn hold(&mut self) {
        self.change_state(AgentState::Idle);
    }

    /// Return from external control to wandering
    pub fn release(&mut self) {
        if self.core.state != AgentState::Idle {
            let err = BeastError::InvalidTransition(format!("release from {:?}", self.core.state));
            debug!("Agent {}: {}", self.core.id, err);
            return;
        }
        self.change_state(AgentState::Passive);
    }

    /// Run one tick. Events produced since the last call are appended to `events`.
    ///
    /// Death is handled even while inactive; everything else waits for
    /// reactivation.
    pub fn update(&mut self, env: &mut dyn Environment, time: FrameTime, events: &mut Vec<AgentEvent>) {
        if self.alive && !self.disabled {
            let id = self.core.id;
            if !env.is_alive(id) || env.is_dead(id) {
                self.core.now = time.now;
                self.core.sync_transform(&*env);
                self.die(env);
            } else if self.active {
                self.step(env, time);
            }
        }
        events.append(&mut self.core.events);
    }

    fn step(&mut self, env: &mut dyn Environment, time: FrameTime) {
        self.core.now = time.now;
        self.core.sync_transform(&*env);
        self.core.perception_timer -= time.dt;

        if self.core.state == AgentState::Idle {
            return;
        }

        let sweep = if self.core.perception_timer <= 0.0 {
            self.core.perception_timer = self.core.config.perception_interval;
            Some(self.core.scan(&*env))
        } else {
            None
        };
        let threat = match sweep {
            Some(_) => self.archetype.detect(&self.core, &*env),
            None => None,
        };

        self.evaluate_transitions(&*env, sweep, threat);

        match self.core.state {
            AgentState::Passive => self.core.wander_step(env, time),
            AgentState::Aggressive => self.engage(env, time),
            AgentState::Fleeing => self.core.flee_step(env, time),
            AgentState::Idle => {}
        }
    }

    /// Transition rules, applied in priority order on the evolving state
    fn evaluate_transitions(&mut self, env: &dyn Environment, sweep: Option<Option<Sighting>>, threat: Option<EntityId>) {
        let threshold = self.core.config.flee_health_threshold;
        let health = env.health_percentage(self.core.id).unwrap_or(1.0) * 100.0;

        // Nothing in sight at all
        if self.core.state == AgentState::Aggressive && matches!(sweep, Some(None)) {
            self.change_state(AgentState::Passive);
        }

        if matches!(self.core.state, AgentState::Passive | AgentState::Aggressive) && health <= threshold {
            let attacker = self.core.last_damage_source.filter(|&id| env.is_alive(id));
            let threat = attacker.or(self.core.target);
            self.enter_fleeing(threat);
        }

        if let Some(threat) = threat {
            if self.core.state == AgentState::Passive {
                self.core.last_known_target = env.position(threat);
                self.enter_fleeing(Some(threat));
            }
        }

        if self.core.state == AgentState::Aggressive && !self.core.validate_target(env) {
            self.change_state(AgentState::Passive);
        }

        if self.core.state == AgentState::Fleeing
            && health > threshold * self.core.config.flee.recovery_factor
            && !self.archetype.keeps_fleeing(&self.core, env)
        {
            self.change_state(AgentState::Passive);
        }

        if self.core.state == AgentState::Passive && self.core.class.can_aggress() {
            if let Some(Some(sighting)) = sweep {
                self.core.target = Some(sighting.entity);
                self.core.last_known_target = Some(sighting.position);
                self.change_state(AgentState::Aggressive);
            }
        }
    }

    fn engage(&mut self, env: &mut dyn Environment, time: FrameTime) {
        let target_pos = self.core.target.and_then(|t| env.position(t));
        let (Some(target), Some(target_pos)) = (self.core.target, target_pos) else {
            self.change_state(AgentState::Passive);
            return;
        };
        let engagement = Engagement {
            target,
            target_pos,
            distance: planar_distance(self.core.position, target_pos),
        };

        if self.archetype.session_active() {
            self.core.face(env, target_pos, time.dt);
            self.archetype.run_special_action(&mut self.core, env, time, &engagement);
            self.enforce_session_watchdog();
            return;
        }

        if self.archetype.can_start_special_action(&mut self.core, &*env, time, &engagement) {
            self.archetype.begin_special_action(&mut self.core, env, time, &engagement);
            return;
        }

        self.archetype.execute_attack(&mut self.core, env, time, &engagement);
    }

    /// Hard cap on session time, checked right after the session advances
    fn enforce_session_watchdog(&mut self) {
        let Some(session) = self.archetype.session() else {
            return;
        };
        if session.elapsed + WATCHDOG_SLACK >= self.core.config.special_action_watchdog {
            let err = BeastError::StuckAction {
                entity: self.core.id,
                elapsed: session.elapsed,
            };
            warn!("{}; forcing cancellation", err);
            self.archetype.cancel_special_action(&mut self.core, SessionOutcome::TimedOut);
        }
    }

    /// Damage-reaction hook, called by the ledger owner as damage lands
    pub fn notify_damage(&mut self, report: DamageReport) {
        if !self.alive || self.disabled {
            return;
        }
        self.core.last_damage_source = report.source;
        if !self.active || self.core.state == AgentState::Idle {
            return;
        }

        self.core.now = report.now;
        self.archetype.on_damaged(&mut self.core, &report);

        let health = report.health_percentage * 100.0;
        if health <= self.core.config.flee_health_threshold {
            if self.core.state != AgentState::Fleeing {
                self.enter_fleeing(report.source.or(self.core.target));
            }
            return;
        }

        let Some(source) = report.source else {
            return;
        };
        if self.core.state == AgentState::Passive {
            if self.core.class.can_aggress() {
                self.core.target = Some(source);
                self.change_state(AgentState::Aggressive);
            } else {
                self.enter_fleeing(Some(source));
            }
        }
    }

    fn enter_fleeing(&mut self, threat: Option<EntityId>) {
        self.change_state(AgentState::Fleeing);
        if threat.is_some() {
            self.core.target = threat;
        }
        if self.core.target.is_none() && self.core.last_known_target.is_none() {
            // Nothing to run from; run from a point behind
            self.core.last_known_target = Some(self.core.position - self.core.forward());
        }
    }

    fn change_state(&mut self, next: AgentState) {
        let prev = self.core.state;
        if prev == next {
            return;
        }

        if prev == AgentState::Aggressive {
            self.archetype.cancel_special_action(&mut self.core, SessionOutcome::Cancelled);
            self.core.combat.cancel_swing();
        }

        match next {
            AgentState::Passive => {
                self.core.target = None;
                self.core.last_damage_source = None;
                self.core.wander.reset();
            }
            AgentState::Aggressive | AgentState::Fleeing => {
                self.core.wander.reset();
            }
            AgentState::Idle => {
                self.core.target = None;
                self.core.last_damage_source = None;
                self.core.wander.reset();
            }
        }
        self.core.detour = None;
        self.core.set_state(next);
    }

    fn die(&mut self, env: &mut dyn Environment) {
        let id = self.core.id;
        self.archetype.cancel_special_action(&mut self.core, SessionOutcome::Cancelled);
        self.core.combat.cancel_swing();
        self.archetype.on_death(&mut self.core, env);
        env.unregister(id);
        self.alive = false;
        info!("Agent {} died", id);
        self.core.emit(AgentEvent::Died { agent: id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ArenaConfig, NeutralConfig, SlimeConfig};
    use crate::core::types::EntityTag;
    use crate::simulation::Arena;
    use crate::world::BodyDesc;

    fn melee() -> CreatureBlueprint {
        let mut blueprint = CreatureBlueprint::new("melee", ArchetypeConfig::Melee);
        blueprint.agent.perception_interval = 0.0;
        blueprint
    }

    #[test]
    fn test_seed_is_stable_per_identity() {
        let id = EntityId::new(5, 2);
        let a = Agent::new(id, AgentConfig::default(), &ArchetypeConfig::Melee, Vec3::ZERO);
        let b = Agent::new(id, AgentConfig::default(), &ArchetypeConfig::Melee, Vec3::ZERO);
        let c = Agent::new(EntityId::new(6, 2), AgentConfig::default(), &ArchetypeConfig::Melee, Vec3::ZERO);
        assert_eq!(a.core.offset_angle, b.core.offset_angle);
        assert_ne!(a.core.offset_angle, c.core.offset_angle);
    }

    #[test]
    fn test_missing_ledger_disables_agent() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let body = arena.spawn_body(BodyDesc {
            position: Vec3::ZERO,
            yaw: 0.0,
            radius: 0.5,
            tag: EntityTag::Creature,
            max_health: None,
        });
        let mut agent = Agent::new(body, AgentConfig::default(), &ArchetypeConfig::Melee, Vec3::ZERO);
        let result = agent.initialize(arena.world());
        assert!(matches!(result, Err(BeastError::MissingDependency { .. })));
        assert!(agent.is_disabled());
    }

    #[test]
    fn test_low_health_flees_next_tick() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let mut blueprint = melee();
        blueprint.agent.flee_health_threshold = 30.0;
        let id = arena.spawn_agent(&blueprint, Vec3::ZERO);
        arena.world_mut().set_health(id, 25.0);

        arena.tick();
        assert_eq!(arena.agent(id).unwrap().state(), AgentState::Fleeing);
    }

    #[test]
    fn test_damage_while_passive_turns_aggressive() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::new(30.0, 0.0, 0.0));
        let id = arena.spawn_agent(&melee(), Vec3::ZERO);

        arena.damage(id, 5.0, Some(player));
        let agent = arena.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Aggressive);
        assert_eq!(agent.target(), Some(player));
    }

    #[test]
    fn test_neutral_runs_when_hit() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::new(30.0, 0.0, 0.0));
        let blueprint = CreatureBlueprint::new("deer", ArchetypeConfig::Neutral(NeutralConfig::default()));
        let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

        arena.damage(id, 5.0, Some(player));
        let agent = arena.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Fleeing);
        assert_eq!(agent.target(), Some(player));
    }

    #[test]
    fn test_hold_and_release() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        arena.spawn_player(Vec3::new(1.0, 0.0, 0.0));
        let id = arena.spawn_agent(&melee(), Vec3::ZERO);

        arena.agent_mut(id).unwrap().hold();
        for _ in 0..5 {
            arena.tick();
        }
        assert_eq!(arena.agent(id).unwrap().state(), AgentState::Idle);

        arena.agent_mut(id).unwrap().release();
        assert_eq!(arena.agent(id).unwrap().state(), AgentState::Passive);
        arena.tick();
        assert_eq!(arena.agent(id).unwrap().state(), AgentState::Aggressive);
    }

    #[test]
    fn test_leaving_aggressive_cancels_session() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::new(5.0, 0.0, 0.0));
        let mut blueprint = CreatureBlueprint::new("slime", ArchetypeConfig::Slime(SlimeConfig::default()));
        blueprint.agent.perception_interval = 0.0;
        let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

        arena.tick();
        arena.tick();
        assert!(arena.agent(id).unwrap().session().is_some());

        arena.despawn(player);
        arena.tick();
        let agent = arena.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Passive);
        assert!(agent.session().is_none());
        assert!(agent.target().is_none());
    }

    #[test]
    fn test_old_attacker_forgotten_after_calming_down() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::new(30.0, 0.0, 0.0));
        let mut blueprint = melee();
        blueprint.agent.flee_health_threshold = 30.0;
        let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

        arena.damage(id, 5.0, Some(player));
        assert_eq!(arena.agent(id).unwrap().target(), Some(player));

        // Out of sight, so the next sweep calms it down
        arena.tick();
        assert_eq!(arena.agent(id).unwrap().state(), AgentState::Passive);

        arena.world_mut().set_health(id, 25.0);
        arena.tick();
        let agent = arena.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Fleeing);
        assert_eq!(agent.target(), None);
    }

    #[test]
    fn test_inactive_agent_still_dies() {
        let config = ArenaConfig {
            activation_radius: None,
            ..ArenaConfig::default()
        };
        let mut arena = Arena::new(config, 0.1);
        let id = arena.spawn_agent(&melee(), Vec3::ZERO);
        arena.set_agent_active(id, false);

        arena.damage(id, 1000.0, None);
        let events = arena.tick();
        assert!(events.contains(&AgentEvent::Died { agent: id }));
        assert!(arena.agent(id).is_none());
    }
}
