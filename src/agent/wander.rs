//! Passive wandering around the home point

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use super::{AgentCore, MoveOutcome};
use crate::core::types::{FrameTime, LayerMask};
use crate::world::Environment;

/// Wander progress; cleared whenever the agent leaves Passive
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Wander {
    pub destination: Option<Vec3>,
    pub walk_elapsed: f32,
    pub wait_remaining: f32,
}

impl Wander {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl AgentCore {
    pub(crate) fn wander_step(&mut self, env: &mut dyn Environment, time: FrameTime) {
        if self.wander.wait_remaining > 0.0 {
            self.wander.wait_remaining -= time.dt;
            return;
        }

        let destination = match self.wander.destination {
            Some(destination) => destination,
            None => {
                let destination = self.pick_wander_destination(&*env);
                self.wander.destination = Some(destination);
                self.wander.walk_elapsed = 0.0;
                destination
            }
        };

        let cfg = self.config.wander.clone();
        self.wander.walk_elapsed += time.dt;
        let speed = self.config.move_speed * cfg.speed_multiplier;
        let outcome = self.move_towards(env, destination, speed, time.dt, cfg.arrival_tolerance);

        if outcome == MoveOutcome::Arrived || self.wander.walk_elapsed >= cfg.max_walk_duration {
            self.wander.destination = None;
            self.wander.walk_elapsed = 0.0;
            self.wander.wait_remaining = self.rng.gen_range(cfg.wait_min..=cfg.wait_max);
        }
    }

    /// Random walkable point near home, found by probing down onto ground
    ///
    /// Falls back to home when no draw lands on walkable ground.
    pub(crate) fn pick_wander_destination(&mut self, env: &dyn Environment) -> Vec3 {
        let cfg = &self.config.wander;
        for _ in 0..cfg.max_attempts {
            let angle = self.rng.gen_range(0.0..TAU);
            let r = cfg.radius * self.rng.gen::<f32>().sqrt();
            let candidate = self.home + Vec3::new(angle.sin() * r, 0.0, angle.cos() * r);
            let origin = candidate + Vec3::Y * cfg.probe_height;

            if let Some(hit) = env.raycast(origin, Vec3::NEG_Y, cfg.probe_height * 2.0, LayerMask::SOLID) {
                if hit.layer == LayerMask::GROUND {
                    return hit.point;
                }
            }
        }
        self.home
    }
}
