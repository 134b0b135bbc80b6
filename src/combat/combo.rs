//! Combo chaining
//!
//! Consecutive strikes inside the combo window extend a chain. The chain
//! wraps to zero at the cap; a strike after the window starts a new one.

use serde::{Deserialize, Serialize};

use crate::core::config::ComboConfig;

/// What a landed strike did to the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboStep {
    /// First hit, or first after the window lapsed
    Started,
    /// Hit inside the window, below the cap; carries the new count
    Extended(u32),
    /// Hit inside the window that reached the cap
    Wrapped,
}

/// Agent-local combo counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboTracker {
    count: u32,
    last_hit: Option<f32>,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_hit(&self) -> Option<f32> {
        self.last_hit
    }

    /// Record a landed strike at `now`
    pub fn register_hit(&mut self, now: f32, config: &ComboConfig) -> ComboStep {
        let within_window = self
            .last_hit
            .map_or(false, |previous| now - previous <= config.window);
        self.last_hit = Some(now);

        if !within_window {
            self.count = 1;
            return ComboStep::Started;
        }

        self.count += 1;
        if self.count >= config.max_hits {
            self.count = 0;
            ComboStep::Wrapped
        } else {
            ComboStep::Extended(self.count)
        }
    }

    /// Cooldown to wait before the next strike after `step`
    pub fn next_cooldown(step: ComboStep, base: f32, config: &ComboConfig) -> f32 {
        match step {
            ComboStep::Extended(_) => base * config.cooldown_factor,
            ComboStep::Started | ComboStep::Wrapped => base,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_hit = None;
    }
}
