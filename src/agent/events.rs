//! Events emitted by agents during an update
//!
//! These are the hook for animation, audio and UI collaborators; the
//! decision core itself never reads them back.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentState, EntityId};
use crate::session::{SessionOutcome, SpecialActionKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    StateChanged {
        agent: EntityId,
        from: AgentState,
        to: AgentState,
    },
    /// A melee swing started; damage lands after the windup
    AttackStarted {
        agent: EntityId,
        target: EntityId,
    },
    StrikeLanded {
        agent: EntityId,
        target: EntityId,
        damage: f32,
        /// Combo counter after this hit (0 when combos are off or wrapped)
        combo: u32,
    },
    ProjectileFired {
        agent: EntityId,
        target: EntityId,
        damage: f32,
        charged: bool,
    },
    SpecialActionStarted {
        agent: EntityId,
        kind: SpecialActionKind,
    },
    SpecialActionEnded {
        agent: EntityId,
        kind: SpecialActionKind,
        outcome: SessionOutcome,
    },
    /// Jump landing; `hits` is the number of targets damaged
    Landed {
        agent: EntityId,
        position: Vec3,
        hits: usize,
    },
    Split {
        parent: EntityId,
        children: Vec<EntityId>,
    },
    Died {
        agent: EntityId,
    },
}

impl AgentEvent {
    /// Short label, used for tallies
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::StateChanged { .. } => "state_changed",
            AgentEvent::AttackStarted { .. } => "attack_started",
            AgentEvent::StrikeLanded { .. } => "strike_landed",
            AgentEvent::ProjectileFired { .. } => "projectile_fired",
            AgentEvent::SpecialActionStarted { .. } => "special_action_started",
            AgentEvent::SpecialActionEnded { .. } => "special_action_ended",
            AgentEvent::Landed { .. } => "landed",
            AgentEvent::Split { .. } => "split",
            AgentEvent::Died { .. } => "died",
        }
    }

    /// The agent that produced the event
    pub fn agent(&self) -> EntityId {
        match self {
            AgentEvent::StateChanged { agent, .. }
            | AgentEvent::AttackStarted { agent, .. }
            | AgentEvent::StrikeLanded { agent, .. }
            | AgentEvent::ProjectileFired { agent, .. }
            | AgentEvent::SpecialActionStarted { agent, .. }
            | AgentEvent::SpecialActionEnded { agent, .. }
            | AgentEvent::Landed { agent, .. }
            | AgentEvent::Died { agent } => *agent,
            AgentEvent::Split { parent, .. } => *parent,
        }
    }
}
