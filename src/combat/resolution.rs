//! Strike resolution
//!
//! Damage goes to the target's external ledger; knockback goes to its body.
//! Does NOT touch agent state - callers do their own bookkeeping.

use glam::Vec3;

use crate::core::types::EntityId;
use crate::spatial::geometry::planar_distance;
use crate::world::Environment;

/// Slack added to attack range when the damage frame checks distance
pub const STRIKE_RANGE_SLACK: f32 = 0.25;

/// Impulse along attacker -> target with a guaranteed upward pop
pub fn knockback_impulse(from: Vec3, to: Vec3, force: f32, min_upward: f32) -> Vec3 {
    let dir = (to - from).try_normalize().unwrap_or(Vec3::Y);
    let mut impulse = dir * force;
    impulse.y = impulse.y.max(min_upward);
    impulse
}

/// Parameters of one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSpec {
    pub damage: f32,
    pub knockback_force: f32,
    pub knockback_min_upward: f32,
}

/// Apply damage and knockback to `target`, returning the damage dealt
pub fn apply_hit(env: &mut dyn Environment, attacker: EntityId, origin: Vec3, target: EntityId, hit: HitSpec) -> f32 {
    let Some(target_pos) = env.position(target) else {
        return 0.0;
    };
    let dealt = env.apply_damage(target, hit.damage, Some(attacker));
    if env.is_alive(target) {
        let impulse = knockback_impulse(origin, target_pos, hit.knockback_force, hit.knockback_min_upward);
        env.apply_impulse(target, impulse);
    }
    dealt
}

/// Is `target` still close enough for a swing's damage frame to connect?
pub fn in_strike_range(env: &dyn Environment, attacker_pos: Vec3, target: EntityId, attack_range: f32) -> bool {
    if !env.is_alive(target) {
        return false;
    }
    env.position(target)
        .map(|pos| planar_distance(attacker_pos, pos) <= attack_range + STRIKE_RANGE_SLACK)
        .unwrap_or(false)
}
