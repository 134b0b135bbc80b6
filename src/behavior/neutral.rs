//! Passive creatures: never attack, run from hunters that come too close

use crate::agent::AgentCore;
use crate::core::config::NeutralConfig;
use crate::core::types::EntityId;
use crate::spatial::geometry::planar_distance;
use crate::world::Environment;

/// A fleeing neutral keeps running until the threat is this many threat
/// radii away
const SAFE_DISTANCE_FACTOR: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct NeutralKit {
    config: NeutralConfig,
}

impl NeutralKit {
    pub fn new(config: NeutralConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NeutralConfig {
        &self.config
    }

    /// Nearest visible hunter inside the threat radius
    pub(crate) fn detect(&self, core: &AgentCore, env: &dyn Environment) -> Option<EntityId> {
        core.nearest_visible(env, self.config.threat_radius)
            .map(|sighting| sighting.entity)
    }

    pub(crate) fn threat_nearby(&self, core: &AgentCore, env: &dyn Environment) -> bool {
        let Some(threat) = core.target.filter(|&t| env.is_alive(t)) else {
            return false;
        };
        env.position(threat)
            .map(|pos| planar_distance(core.position, pos) < self.config.threat_radius * SAFE_DISTANCE_FACTOR)
            .unwrap_or(false)
    }
}
