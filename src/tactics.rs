//! Crowd dispersion around a shared target
//!
//! Agents closing on the same target spread out instead of stacking. The
//! stand-off radius grows with the number of same-class aggressive
//! neighbors near the target, and the agent aims for a point on that circle.
//!
//! Stand-off radius (N neighbors, spread s):
//!
//! ```text
//! r = 0                                  when N == 0
//! r = min(offset * (1 + s * N), cap)     otherwise
//! ```

use std::f32::consts::TAU;

use glam::Vec3;

use crate::agent::AgentCore;
use crate::core::types::{AgentState, LayerMask};
use crate::spatial::geometry::{planar_direction, rotate_y};
use crate::world::Environment;

/// How an archetype picks its side of the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpreadRule {
    /// Stable per-agent angle drawn once at construction
    FixedOffset { spread: f32 },
    /// Along the line from the target back to the agent
    AwayFromTarget { spread: f32 },
}

impl SpreadRule {
    pub fn spread(&self) -> f32 {
        match *self {
            SpreadRule::FixedOffset { spread } | SpreadRule::AwayFromTarget { spread } => spread,
        }
    }
}

/// Same-class aggressive agents near `target_pos`, excluding `core` itself
pub fn crowding_neighbors(core: &AgentCore, env: &dyn Environment, target_pos: Vec3) -> usize {
    let radius = core.config.attack_range * core.config.tactics.neighbor_radius_factor;
    env.query_radius(target_pos, radius, LayerMask::ENTITY)
        .into_iter()
        .filter(|&id| id != core.id)
        .filter_map(|id| env.profile(id))
        .filter(|p| p.class == core.class && p.state == AgentState::Aggressive)
        .count()
}

pub fn stand_off_radius(neighbors: usize, offset_radius: f32, spread: f32, cap: f32) -> f32 {
    if neighbors == 0 {
        return 0.0;
    }
    (offset_radius * (1.0 + spread * neighbors as f32)).min(cap)
}

/// Point to approach instead of the target itself
///
/// Falls back through evenly spaced directions when the preferred point
/// is behind geometry, and to the target position when all are.
pub fn tactical_position(core: &AgentCore, env: &dyn Environment, target_pos: Vec3, rule: SpreadRule) -> Vec3 {
    let tactics = &core.config.tactics;
    let neighbors = crowding_neighbors(core, env, target_pos);
    let cap = core.config.attack_range * tactics.max_range_fraction;
    let radius = stand_off_radius(neighbors, tactics.offset_radius, rule.spread(), cap);
    if radius <= 0.0 {
        return target_pos;
    }

    let preferred = match rule {
        SpreadRule::FixedOffset { .. } => core.offset_direction(),
        SpreadRule::AwayFromTarget { .. } => {
            planar_direction(target_pos, core.position).unwrap_or_else(|| core.offset_direction())
        }
    };

    let origin = target_pos + Vec3::Y * core.config.eye_height;
    let count = tactics.fallback_directions.max(1);
    (0..=count)
        .map(|i| {
            if i == 0 {
                preferred
            } else {
                rotate_y(preferred, TAU * i as f32 / count as f32)
            }
        })
        .find(|&dir| env.raycast(origin, dir, radius, LayerMask::OBSTACLE).is_none())
        .map(|dir| target_pos + dir * radius)
        .unwrap_or(target_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ArchetypeConfig, ArenaConfig, CreatureBlueprint, RangedConfig};
    use crate::simulation::Arena;
    use crate::spatial::Aabb;
    use crate::world::Bodies;

    fn eager(archetype: ArchetypeConfig) -> CreatureBlueprint {
        let mut blueprint = CreatureBlueprint::new("eager", archetype);
        blueprint.agent.perception_interval = 0.0;
        blueprint
    }

    #[test]
    fn test_no_neighbors_means_target_itself() {
        assert_eq!(stand_off_radius(0, 1.0, 0.2, 1.4), 0.0);
    }

    #[test]
    fn test_radius_grows_with_neighbors_then_caps() {
        let one = stand_off_radius(1, 1.0, 0.2, 1.425);
        let two = stand_off_radius(2, 1.0, 0.2, 1.425);
        assert!(one > 0.0);
        assert!(two > one);
        assert_eq!(stand_off_radius(50, 1.0, 0.2, 1.425), 1.425);
    }

    #[test]
    fn test_wider_spread_disperses_further() {
        assert!(stand_off_radius(2, 1.0, 0.4, 10.0) > stand_off_radius(2, 1.0, 0.2, 10.0));
    }

    #[test]
    fn test_only_same_class_aggressors_crowd() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::ZERO);
        let a = arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(1.0, 0.0, 0.0));
        arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(0.0, 0.0, 1.0));
        arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(-1.0, 0.0, 0.0));
        arena.spawn_agent(&eager(ArchetypeConfig::Ranged(RangedConfig::default())), Vec3::new(0.0, 0.0, -1.0));
        arena.tick();

        let player_pos = arena.world().position(player).unwrap();
        let core = arena.agent(a).unwrap().core();
        assert_eq!(crowding_neighbors(core, arena.world(), player_pos), 2);

        // Two neighbors at spread 0.2: 1.0 * 1.4, under the 1.425 cap
        let point = tactical_position(core, arena.world(), player_pos, SpreadRule::FixedOffset { spread: 0.2 });
        assert!((point.distance(player_pos) - 1.4).abs() < 1e-3);
    }

    #[test]
    fn test_lone_attacker_goes_straight_in() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::ZERO);
        let a = arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(1.0, 0.0, 0.0));
        arena.tick();

        let player_pos = arena.world().position(player).unwrap();
        let core = arena.agent(a).unwrap().core();
        let point = tactical_position(core, arena.world(), player_pos, SpreadRule::AwayFromTarget { spread: 0.4 });
        assert_eq!(point, player_pos);
    }

    #[test]
    fn test_blocked_offset_falls_back() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::ZERO);
        let a = arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(4.0, 0.0, 0.0));
        arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(-1.0, 0.0, 0.0));
        arena.tick();

        let player_pos = arena.world().position(player).unwrap();
        // Wall hugging the player on the +x side
        arena.add_obstacle(Aabb::new(Vec3::new(0.6, 0.0, -3.0), Vec3::new(1.0, 3.0, 3.0)));
        let core = arena.agent(a).unwrap().core();
        let point = tactical_position(core, arena.world(), player_pos, SpreadRule::AwayFromTarget { spread: 0.4 });
        assert!(point.x < 0.6);
        assert!(point.distance(player_pos) > 0.5);
    }

    #[test]
    fn test_fully_walled_target_falls_back_to_itself() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        arena.spawn_player(Vec3::ZERO);
        let a = arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(4.0, 0.0, 0.0));
        arena.spawn_agent(&eager(ArchetypeConfig::Melee), Vec3::new(-1.0, 0.0, 0.0));
        arena.tick();

        // Walls on all four sides, inside the stand-off radius
        arena.add_obstacle(Aabb::new(Vec3::new(0.6, 0.0, -2.0), Vec3::new(1.0, 3.0, 2.0)));
        arena.add_obstacle(Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(-0.6, 3.0, 2.0)));
        arena.add_obstacle(Aabb::new(Vec3::new(-2.0, 0.0, 0.6), Vec3::new(2.0, 3.0, 1.0)));
        arena.add_obstacle(Aabb::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 3.0, -0.6)));

        let target = Vec3::ZERO;
        let core = arena.agent(a).unwrap().core();
        assert_eq!(crowding_neighbors(core, arena.world(), target), 1);
        let point = tactical_position(core, arena.world(), target, SpreadRule::AwayFromTarget { spread: 0.4 });
        assert_eq!(point, target);
    }
}
