//! Point-mass body integration: gravity, ground contact, friction
//!
//! Unit mass everywhere, so impulses are velocity changes. Bodies do not
//! collide with obstacles or each other; agents steer around geometry.

use crate::ecs::world::World;

/// Velocities below this are snapped to rest while grounded
const REST_SPEED: f32 = 0.01;

pub fn integrate_bodies(world: &mut World, dt: f32) {
    let gravity = world.config.gravity;
    let ground = world.config.ground_height;
    let friction = world.config.ground_friction;

    for id in world.body_ids() {
        let Some(body) = world.body_mut(id) else {
            continue;
        };

        let mut velocity = body.velocity;
        velocity.y -= gravity * dt;
        let mut position = body.position + velocity * dt;

        if let Some(height) = ground {
            if position.y <= height {
                position.y = height;
                velocity.y = velocity.y.max(0.0);
                let decay = (1.0 - friction * dt).max(0.0);
                velocity.x *= decay;
                velocity.z *= decay;
                if velocity.x.abs() < REST_SPEED && velocity.z.abs() < REST_SPEED {
                    velocity.x = 0.0;
                    velocity.z = 0.0;
                }
            }
        }

        body.velocity = velocity;
        world.move_body(id, position);
    }
}
