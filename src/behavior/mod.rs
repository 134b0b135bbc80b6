//! Archetypes: class-specific behavior plugged into the base state machine
//!
//! An archetype can add perception, pick a tactical approach point, run a
//! special action and decide how to attack. It can never change the
//! agent's state directly; the base machine owns transitions and asks the
//! archetype through these hooks.

pub mod melee;
pub mod neutral;
pub mod ranged;
pub mod slime;

use glam::Vec3;
use tracing::debug;

use crate::agent::{AgentCore, AgentEvent};
use crate::core::config::ArchetypeConfig;
use crate::core::types::{BehaviorClass, EntityId, FrameTime};
use crate::session::{SessionOutcome, SessionSnapshot, SessionStep, SpecialActionKind};
use crate::tactics::SpreadRule;
use crate::world::{DamageReport, Environment};

pub use neutral::NeutralKit;
pub use ranged::RangedKit;
pub use slime::SlimeKit;

/// The current target as resolved at the start of an engage tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    pub target: EntityId,
    pub target_pos: Vec3,
    /// Planar distance from the agent
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub enum Archetype {
    Melee,
    Ranged(RangedKit),
    Slime(SlimeKit),
    Neutral(NeutralKit),
}

impl Archetype {
    pub fn from_config(config: &ArchetypeConfig) -> Self {
        match config {
            ArchetypeConfig::Melee => Archetype::Melee,
            ArchetypeConfig::Ranged(c) => Archetype::Ranged(RangedKit::new(c.clone())),
            ArchetypeConfig::Slime(c) => Archetype::Slime(SlimeKit::new(c.clone())),
            ArchetypeConfig::Neutral(c) => Archetype::Neutral(NeutralKit::new(c.clone())),
        }
    }

    pub fn class(&self) -> BehaviorClass {
        match self {
            Archetype::Melee | Archetype::Slime(_) => BehaviorClass::Melee,
            Archetype::Ranged(_) => BehaviorClass::Ranged,
            Archetype::Neutral(_) => BehaviorClass::Neutral,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Melee => "melee",
            Archetype::Ranged(_) => "ranged",
            Archetype::Slime(_) => "slime",
            Archetype::Neutral(_) => "neutral",
        }
    }

    /// Extra perception on sweep ticks; returns a threat to flee from
    pub(crate) fn detect(&self, core: &AgentCore, env: &dyn Environment) -> Option<EntityId> {
        match self {
            Archetype::Neutral(kit) => kit.detect(core, env),
            _ => None,
        }
    }

    /// Veto on leaving Fleeing once health has recovered
    pub(crate) fn keeps_fleeing(&self, core: &AgentCore, env: &dyn Environment) -> bool {
        match self {
            Archetype::Neutral(kit) => kit.threat_nearby(core, env),
            _ => false,
        }
    }

    pub fn session(&self) -> Option<SessionSnapshot> {
        match self {
            Archetype::Slime(kit) => kit.session.as_ref().map(|s| s.snapshot()),
            Archetype::Ranged(kit) => kit.session.as_ref().map(|s| s.snapshot()),
            _ => None,
        }
    }

    pub fn session_active(&self) -> bool {
        match self {
            Archetype::Slime(kit) => kit.session.is_some(),
            Archetype::Ranged(kit) => kit.session.is_some(),
            _ => false,
        }
    }

    pub(crate) fn can_start_special_action(
        &self,
        core: &mut AgentCore,
        _env: &dyn Environment,
        time: FrameTime,
        engagement: &Engagement,
    ) -> bool {
        match self {
            Archetype::Slime(kit) => kit.can_jump(core, time, engagement),
            Archetype::Ranged(kit) => kit.can_charge(core, time, engagement),
            _ => false,
        }
    }

    pub(crate) fn begin_special_action(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        engagement: &Engagement,
    ) {
        let kind = match self {
            Archetype::Slime(kit) => {
                kit.begin(engagement.target);
                SpecialActionKind::JumpAttack
            }
            Archetype::Ranged(kit) => {
                kit.begin(engagement.target);
                SpecialActionKind::ChargeShot
            }
            _ => return,
        };
        core.face(env, engagement.target_pos, time.dt);
        debug!("Agent {} started {:?} on {}", core.id, kind, engagement.target);
        core.emit(AgentEvent::SpecialActionStarted { agent: core.id, kind });
    }

    /// Advance the running session by one tick
    pub(crate) fn run_special_action(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        _engagement: &Engagement,
    ) {
        let (kind, step) = match self {
            Archetype::Slime(kit) => match kit.session.as_mut() {
                Some(session) => (SpecialActionKind::JumpAttack, session.step(core, env, time, &kit.config)),
                None => return,
            },
            Archetype::Ranged(kit) => match kit.session.as_mut() {
                Some(session) => (SpecialActionKind::ChargeShot, session.step(core, env, time, &kit.config)),
                None => return,
            },
            _ => return,
        };
        if let SessionStep::Finished(outcome) = step {
            self.end_session(core, kind, outcome);
        }
    }

    /// Stop any running session; a no-op when there is none
    pub(crate) fn cancel_special_action(&mut self, core: &mut AgentCore, outcome: SessionOutcome) {
        let kind = match self.session() {
            Some(snapshot) => snapshot.kind,
            None => return,
        };
        self.end_session(core, kind, outcome);
    }

    fn end_session(&mut self, core: &mut AgentCore, kind: SpecialActionKind, outcome: SessionOutcome) {
        match self {
            Archetype::Slime(kit) => kit.finish(core.now),
            Archetype::Ranged(kit) => kit.finish(core.now),
            _ => return,
        }
        debug!("Agent {} {:?} ended: {:?}", core.id, kind, outcome);
        core.emit(AgentEvent::SpecialActionEnded {
            agent: core.id,
            kind,
            outcome,
        });
    }

    /// Regular attack when no special action is running or starting
    pub(crate) fn execute_attack(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        engagement: &Engagement,
    ) {
        match self {
            Archetype::Melee => {
                let rule = SpreadRule::FixedOffset {
                    spread: core.config.tactics.melee_spread,
                };
                melee::close_and_strike(core, env, time, engagement, rule);
            }
            Archetype::Slime(_) => {
                let rule = SpreadRule::AwayFromTarget {
                    spread: core.config.tactics.jump_spread,
                };
                melee::close_and_strike(core, env, time, engagement, rule);
            }
            Archetype::Ranged(kit) => kit.hold_band(core, env, time, engagement),
            Archetype::Neutral(_) => {}
        }
    }

    pub(crate) fn on_damaged(&mut self, core: &mut AgentCore, _report: &DamageReport) {
        if let Archetype::Ranged(_) = self {
            // Taking a hit spoils the charge
            self.cancel_special_action(core, SessionOutcome::Cancelled);
        }
    }

    pub(crate) fn on_death(&mut self, core: &mut AgentCore, env: &mut dyn Environment) {
        if let Archetype::Slime(kit) = self {
            kit.split(core, env);
        }
    }
}
