//! Perception: radius sweep plus line-of-sight checks

use glam::Vec3;
use ordered_float::OrderedFloat;
use tracing::debug;

use super::AgentCore;
use crate::core::error::BeastError;
use crate::core::types::{EntityId, LayerMask};
use crate::spatial::geometry::planar_distance;
use crate::world::Environment;

/// A visible candidate found by a sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub entity: EntityId,
    pub position: Vec3,
    pub distance: f32,
}

impl AgentCore {
    pub(crate) fn eye(&self) -> Vec3 {
        self.position + Vec3::Y * self.config.eye_height
    }

    /// Periodic sweep for the nearest visible target
    pub(crate) fn scan(&self, env: &dyn Environment) -> Option<Sighting> {
        self.nearest_visible(env, self.config.detection_radius)
    }

    /// Nearest live body with the hunted tag, in sight, within `radius`
    ///
    /// Ties on distance break by handle so sweeps are deterministic.
    pub(crate) fn nearest_visible(&self, env: &dyn Environment, radius: f32) -> Option<Sighting> {
        let mut candidates: Vec<Sighting> = env
            .query_radius(self.position, radius, LayerMask::ENTITY)
            .into_iter()
            .filter(|&id| id != self.id)
            .filter(|&id| env.is_alive(id) && env.tag(id) == Some(self.config.target_tag))
            .filter_map(|id| {
                let position = env.position(id)?;
                Some(Sighting {
                    entity: id,
                    position,
                    distance: planar_distance(self.position, position),
                })
            })
            .filter(|s| s.distance <= radius)
            .collect();

        candidates.sort_by_key(|s| (OrderedFloat(s.distance), s.entity));
        candidates.into_iter().find(|s| self.line_of_sight(env, s.entity, s.position))
    }

    /// Unobstructed from the eye to the target's center?
    pub(crate) fn line_of_sight(&self, env: &dyn Environment, target: EntityId, target_pos: Vec3) -> bool {
        let eye = self.eye();
        let center = target_pos + Vec3::Y * env.radius(target).unwrap_or(0.0);
        let delta = center - eye;
        let distance = delta.length();
        let Some(dir) = delta.try_normalize() else {
            return true;
        };
        env.raycast(eye, dir, distance, LayerMask::OBSTACLE).is_none()
    }

    /// Is the current target still alive, in range and in sight?
    ///
    /// Updates the last known position while it is.
    pub(crate) fn validate_target(&mut self, env: &dyn Environment) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let Some(position) = env.position(target).filter(|_| env.is_alive(target)) else {
            debug!("Agent {}: {}", self.id, BeastError::StaleReference(target));
            return false;
        };
        if planar_distance(self.position, position) > self.config.detection_radius {
            return false;
        }
        if !self.line_of_sight(env, target, position) {
            return false;
        }
        self.last_known_target = Some(position);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ArchetypeConfig, ArenaConfig, CreatureBlueprint};
    use crate::simulation::Arena;
    use crate::spatial::Aabb;
    use crate::world::Bodies;

    #[test]
    fn test_nearest_visible_prefers_closest() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let far = arena.spawn_player(Vec3::new(8.0, 0.0, 0.0));
        let near = arena.spawn_player(Vec3::new(0.0, 0.0, 4.0));
        let id = arena.spawn_agent(&CreatureBlueprint::new("m", ArchetypeConfig::Melee), Vec3::ZERO);

        let agent = arena.agent(id).unwrap();
        let sighting = agent.core.scan(arena.world()).unwrap();
        assert_eq!(sighting.entity, near);
        assert_ne!(sighting.entity, far);
        assert!((sighting.distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_wall_blocks_sight() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::new(6.0, 0.0, 0.0));
        arena.add_obstacle(Aabb::new(Vec3::new(2.0, 0.0, -3.0), Vec3::new(3.0, 3.0, 3.0)));
        let id = arena.spawn_agent(&CreatureBlueprint::new("m", ArchetypeConfig::Melee), Vec3::ZERO);

        let agent = arena.agent(id).unwrap();
        assert!(agent.core.scan(arena.world()).is_none());
        let player_pos = arena.world().position(player).unwrap();
        assert!(!agent.core.line_of_sight(arena.world(), player, player_pos));
    }

    #[test]
    fn test_ignores_other_tags() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let blueprint = CreatureBlueprint::new("m", ArchetypeConfig::Melee);
        arena.spawn_agent(&blueprint, Vec3::new(2.0, 0.0, 0.0));
        let id = arena.spawn_agent(&blueprint, Vec3::ZERO);

        assert!(arena.agent(id).unwrap().core.scan(arena.world()).is_none());
    }
}
