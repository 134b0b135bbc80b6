//! Keep a preferred distance band and shoot from inside it

use glam::Vec3;
use rand::Rng;
use tracing::debug;

use super::Engagement;
use crate::agent::{AgentCore, AgentEvent};
use crate::core::config::RangedConfig;
use crate::core::types::{EntityId, FrameTime};
use crate::session::ChargeSession;
use crate::spatial::geometry::planar_direction;
use crate::world::{Environment, ProjectileSpec};

/// Extra distance added past the retreat line so backing off overshoots it
const RETREAT_OVERSHOOT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct RangedKit {
    pub(crate) config: RangedConfig,
    pub(crate) session: Option<ChargeSession>,
    last_charge_end: f32,
}

impl RangedKit {
    pub fn new(config: RangedConfig) -> Self {
        Self {
            config,
            session: None,
            last_charge_end: f32::NEG_INFINITY,
        }
    }

    pub fn config(&self) -> &RangedConfig {
        &self.config
    }

    fn in_band(&self, distance: f32) -> bool {
        distance >= self.config.retreat_distance && distance <= self.config.max_preferred_distance
    }

    /// Eligible and lucky this tick
    pub(crate) fn can_charge(&self, core: &mut AgentCore, time: FrameTime, engagement: &Engagement) -> bool {
        let charge = &self.config.charge;
        charge.enabled
            && self.session.is_none()
            && time.now - self.last_charge_end >= charge.cooldown
            && self.in_band(engagement.distance)
            && core.rng.gen::<f32>() < charge.probability
    }

    pub(crate) fn begin(&mut self, target: EntityId) {
        self.session = Some(ChargeSession::new(target));
    }

    pub(crate) fn finish(&mut self, now: f32) {
        self.session = None;
        self.last_charge_end = now;
    }

    /// Back off inside the band, approach outside it, shoot within it
    pub(crate) fn hold_band(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        engagement: &Engagement,
    ) {
        let speed = core.config.move_speed;

        if engagement.distance < self.config.retreat_distance {
            let away = planar_direction(engagement.target_pos, core.position).unwrap_or_else(|| -core.forward());
            let backoff = self.config.retreat_distance - engagement.distance + RETREAT_OVERSHOOT;
            let destination = core.position + away * backoff;
            core.move_towards(env, destination, speed, time.dt, 0.0);
            // Keep eyes on the target while backing away
            core.face(env, engagement.target_pos, time.dt);
            return;
        }

        if engagement.distance > self.config.max_preferred_distance {
            let tolerance = self.config.max_preferred_distance;
            core.move_towards(env, engagement.target_pos, speed, time.dt, tolerance);
            return;
        }

        core.face(env, engagement.target_pos, time.dt);
        if core.combat.ready(time.now) {
            fire(core, env, engagement.target, self.config.projectile_damage, false, &self.config);
            core.combat.last_attack = time.now;
        }
    }
}

/// Launch one projectile at the center of `target`
pub(crate) fn fire(
    core: &mut AgentCore,
    env: &mut dyn Environment,
    target: EntityId,
    damage: f32,
    charged: bool,
    config: &RangedConfig,
) {
    let Some(target_pos) = env.position(target) else {
        return;
    };
    let origin = core.position + Vec3::Y * config.muzzle_height;
    let aim = target_pos + Vec3::Y * env.radius(target).unwrap_or(0.0);
    let Some(direction) = (aim - origin).try_normalize() else {
        return;
    };

    env.spawn_projectile(ProjectileSpec {
        origin,
        direction,
        damage,
        owner: core.id,
        speed: config.projectile_speed,
        lifetime: config.projectile_lifetime,
    });
    debug!("Agent {} fired at {} ({} dmg, charged={})", core.id, target, damage, charged);
    core.emit(AgentEvent::ProjectileFired {
        agent: core.id,
        target,
        damage,
        charged,
    });
}
