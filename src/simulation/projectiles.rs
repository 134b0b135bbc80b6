//! Straight-line projectiles
//!
//! Swept each tick as a ray segment, so fast shots cannot tunnel through
//! thin targets.

use glam::Vec3;
use tracing::trace;

use crate::core::types::{EntityId, LayerMask};
use crate::ecs::world::World;
use crate::world::{DamageLedger, ProjectileSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub owner: EntityId,
    pub remaining: f32,
}

impl Projectile {
    pub fn from_spec(spec: ProjectileSpec) -> Self {
        Self {
            position: spec.origin,
            direction: spec.direction.normalize_or_zero(),
            speed: spec.speed,
            damage: spec.damage,
            owner: spec.owner,
            remaining: spec.lifetime,
        }
    }
}

/// Advance every projectile; hits damage the struck body and end the shot
pub fn step_projectiles(world: &mut World, dt: f32) {
    let projectiles = std::mem::take(&mut world.projectiles);
    let mut survivors = Vec::with_capacity(projectiles.len());

    for mut shot in projectiles {
        let travel = shot.speed * dt;
        let mask = LayerMask::SOLID | LayerMask::ENTITY;
        match world.raycast_excluding(shot.position, shot.direction, travel, mask, Some(shot.owner)) {
            Some(hit) => {
                if let Some(target) = hit.entity {
                    let dealt = world.apply_damage(target, shot.damage, Some(shot.owner));
                    trace!("Projectile from {} hit {} for {}", shot.owner, target, dealt);
                }
            }
            None => {
                shot.position += shot.direction * travel;
                shot.remaining -= dt;
                if shot.remaining > 0.0 {
                    survivors.push(shot);
                }
            }
        }
    }

    // Shots fired while stepping would land here; keep them
    survivors.append(&mut world.projectiles);
    world.projectiles = survivors;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ArenaConfig;
    use crate::spatial::Aabb;
    use crate::world::{BodyDesc, ProjectileSpawner};

    fn shot(owner: EntityId, origin: Vec3, direction: Vec3) -> ProjectileSpec {
        ProjectileSpec {
            origin,
            direction,
            damage: 5.0,
            owner,
            speed: 10.0,
            lifetime: 2.0,
        }
    }

    #[test]
    fn test_projectile_hits_body_not_owner() {
        let mut world = World::new(ArenaConfig::default());
        let owner = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        let target = world.spawn(BodyDesc::creature(Vec3::new(3.0, 0.0, 0.0), 0.5, 10.0));
        world.spawn_projectile(shot(owner, Vec3::new(0.0, 0.5, 0.0), Vec3::X));

        for _ in 0..5 {
            step_projectiles(&mut world, 0.1);
        }
        assert_eq!(world.projectile_count(), 0);
        assert_eq!(world.health_percentage(target), Some(0.5));
        assert_eq!(world.health_percentage(owner), Some(1.0));
    }

    #[test]
    fn test_wall_stops_projectile() {
        let mut world = World::new(ArenaConfig::default());
        let owner = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        let target = world.spawn(BodyDesc::creature(Vec3::new(3.0, 0.0, 0.0), 0.5, 10.0));
        world.add_obstacle(Aabb::new(Vec3::new(1.5, 0.0, -1.0), Vec3::new(2.0, 2.0, 1.0)));
        world.spawn_projectile(shot(owner, Vec3::new(0.0, 0.5, 0.0), Vec3::X));

        for _ in 0..5 {
            step_projectiles(&mut world, 0.1);
        }
        assert_eq!(world.projectile_count(), 0);
        assert_eq!(world.health_percentage(target), Some(1.0));
    }

    #[test]
    fn test_projectile_expires() {
        let mut world = World::new(ArenaConfig {
            ground_height: None,
            ..ArenaConfig::default()
        });
        let owner = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        world.spawn_projectile(shot(owner, Vec3::new(0.0, 0.5, 0.0), Vec3::Z));

        for _ in 0..19 {
            step_projectiles(&mut world, 0.1);
        }
        assert_eq!(world.projectile_count(), 1);
        for _ in 0..2 {
            step_projectiles(&mut world, 0.1);
        }
        assert_eq!(world.projectile_count(), 0);
    }
}
