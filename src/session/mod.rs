//! Special-action sessions
//!
//! A session is a small phase machine (Prepare -> Execute -> Resolve) that
//! the owning agent advances once per tick. It never blocks: every phase
//! checks its own elapsed time, and the agent's watchdog cancels any session
//! that runs past the hard cap.

pub mod charge;
pub mod jump;

use serde::{Deserialize, Serialize};

pub use charge::ChargeSession;
pub use jump::JumpSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialActionKind {
    JumpAttack,
    ChargeShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Wind-up before the action commits
    Prepare,
    /// The committed part: airborne, releasing
    Execute,
    /// Recovery after the effect has been applied
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    Completed,
    /// Gave up waiting on the world (no landing, watchdog)
    TimedOut,
    /// Interrupted by the owner: state change, damage, death
    Cancelled,
}

/// Result of advancing a session by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Continue,
    Finished(SessionOutcome),
}

/// Phase and timers of a running session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionClock {
    pub phase: SessionPhase,
    pub phase_elapsed: f32,
    pub total_elapsed: f32,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Prepare,
            phase_elapsed: 0.0,
            total_elapsed: 0.0,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.phase_elapsed += dt;
        self.total_elapsed += dt;
    }

    pub fn enter(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.phase_elapsed = 0.0;
    }
}

/// Read-only view of a running session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub kind: SpecialActionKind,
    pub phase: SessionPhase,
    /// Seconds since the session started
    pub elapsed: f32,
    pub phase_elapsed: f32,
}

impl SessionSnapshot {
    pub fn new(kind: SpecialActionKind, clock: &SessionClock) -> Self {
        Self {
            kind,
            phase: clock.phase,
            elapsed: clock.total_elapsed,
            phase_elapsed: clock.phase_elapsed,
        }
    }
}
