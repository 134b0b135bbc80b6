//! Per-agent combat bookkeeping
//!
//! Every agent has combat state (mandatory but minimal).

use serde::{Deserialize, Serialize};

use crate::combat::combo::ComboTracker;
use crate::core::types::EntityId;

/// A melee swing between its start and its damage frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    pub target: EntityId,
    pub elapsed: f32,
    pub windup: f32,
}

impl Swing {
    pub fn due(&self) -> bool {
        self.elapsed >= self.windup
    }
}

/// Combat state component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// Time the last attack started; negative infinity before the first
    pub last_attack: f32,
    /// Cooldown in force for the next attempt (combo may shorten it)
    pub cooldown: f32,
    pub combo: ComboTracker,
    pub swing: Option<Swing>,
}

impl CombatState {
    pub fn new(base_cooldown: f32) -> Self {
        Self {
            last_attack: f32::NEG_INFINITY,
            cooldown: base_cooldown,
            combo: ComboTracker::new(),
            swing: None,
        }
    }

    /// Has the cooldown elapsed?
    pub fn ready(&self, now: f32) -> bool {
        now - self.last_attack >= self.cooldown
    }

    pub fn swinging(&self) -> bool {
        self.swing.is_some()
    }

    /// Start a swing if the cooldown allows; attempts during cooldown are ignored
    pub fn begin_swing(&mut self, target: EntityId, now: f32, windup: f32) -> bool {
        if self.swinging() || !self.ready(now) {
            return false;
        }
        self.last_attack = now;
        self.swing = Some(Swing {
            target,
            elapsed: 0.0,
            windup,
        });
        true
    }

    /// Advance a pending swing, returning it once its damage frame is due
    pub fn advance_swing(&mut self, dt: f32) -> Option<Swing> {
        let swing = self.swing.as_mut()?;
        swing.elapsed += dt;
        if swing.due() {
            self.swing.take()
        } else {
            None
        }
    }

    pub fn cancel_swing(&mut self) {
        self.swing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attack_always_ready() {
        let state = CombatState::new(1.0);
        assert!(state.ready(0.0));
    }

    #[test]
    fn test_attempt_during_cooldown_ignored() {
        let mut state = CombatState::new(1.0);
        let target = EntityId::new(1, 0);
        assert!(state.begin_swing(target, 0.0, 0.0));
        state.cancel_swing();
        assert!(!state.begin_swing(target, 0.5, 0.0));
        assert_eq!(state.last_attack, 0.0);
        assert!(state.begin_swing(target, 1.0, 0.0));
        assert_eq!(state.last_attack, 1.0);
    }

    #[test]
    fn test_swing_resolves_after_windup() {
        let mut state = CombatState::new(1.0);
        state.begin_swing(EntityId::new(1, 0), 0.0, 0.3);
        assert!(state.advance_swing(0.1).is_none());
        assert!(state.advance_swing(0.1).is_none());
        let swing = state.advance_swing(0.15).expect("swing due");
        assert!(swing.due());
        assert!(!state.swinging());
    }

    #[test]
    fn test_zero_windup_due_immediately() {
        let mut state = CombatState::new(1.0);
        state.begin_swing(EntityId::new(1, 0), 0.0, 0.0);
        assert!(state.advance_swing(0.0).is_some());
    }
}
