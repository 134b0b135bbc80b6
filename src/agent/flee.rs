//! Retreat from the last known threat

use glam::Vec3;
use rand::Rng;

use super::AgentCore;
use crate::core::types::{FrameTime, LayerMask};
use crate::spatial::geometry::{planar_direction, rotate_y};
use crate::world::Environment;

impl AgentCore {
    pub(crate) fn flee_step(&mut self, env: &mut dyn Environment, time: FrameTime) {
        let live = self
            .target
            .filter(|&t| env.is_alive(t))
            .and_then(|t| env.position(t));
        if live.is_some() {
            self.last_known_target = live;
        }
        let Some(threat) = live.or(self.last_known_target) else {
            return;
        };

        let away = planar_direction(threat, self.position).unwrap_or_else(|| self.forward());
        let heading = self.retreat_heading(&*env, away);
        let cfg = &self.config;
        let destination = self.position + heading * cfg.flee.retreat_distance;
        let speed = cfg.move_speed * cfg.flee.speed_multiplier;
        let tolerance = cfg.wander.arrival_tolerance;
        self.move_towards(env, destination, speed, time.dt, tolerance);
    }

    /// Straight away from the threat unless that runs into something
    ///
    /// Blocked retreats are rotated by a random angle, either way, for a
    /// bounded number of attempts. The last candidate is used regardless.
    pub(crate) fn retreat_heading(&mut self, env: &dyn Environment, away: Vec3) -> Vec3 {
        let eye = self.eye();
        let cfg = self.config.flee.clone();
        let blocked = |dir: Vec3| env.raycast(eye, dir, cfg.retreat_distance, LayerMask::OBSTACLE).is_some();

        if !blocked(away) {
            return away;
        }
        let mut heading = away;
        for _ in 0..cfg.max_attempts {
            let turn = self.rng.gen_range(cfg.min_turn_deg..=cfg.max_turn_deg);
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            heading = rotate_y(away, (sign * turn).to_radians());
            if !blocked(heading) {
                break;
            }
        }
        heading
    }
}
