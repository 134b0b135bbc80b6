//! Minimal health ledger
//!
//! The decision core only ever sees health through `DamageLedger`; this is
//! the store the reference environment keeps behind it.

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    /// Strict gate: no damage at all while set
    pub invulnerable: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            invulnerable: false,
        }
    }

    /// Remove up to `amount`, returning what was actually removed
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        if self.invulnerable || amount <= 0.0 || self.is_dead() {
            return 0.0;
        }
        let dealt = amount.min(self.current);
        self.current -= dealt;
        dealt
    }

    /// Restore up to `amount`, clamped to max
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 || self.is_dead() {
            return 0.0;
        }
        let restored = amount.min(self.max - self.current);
        self.current += restored;
        restored
    }

    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Damage notification delivered to the damaged agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    pub amount: f32,
    pub source: Option<EntityId>,
    /// Health percentage after the hit, in [0, 1]
    pub health_percentage: f32,
    pub now: f32,
}
