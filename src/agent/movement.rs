//! Steering with a forward obstacle probe
//!
//! Displacement always follows the desired heading. Yaw turns towards it at
//! the configured rate and is otherwise cosmetic.

use glam::Vec3;
use tracing::trace;

use super::AgentCore;
use crate::core::types::LayerMask;
use crate::spatial::geometry::{planar_direction, planar_distance, rotate_y, turn_towards, yaw_of};
use crate::world::Environment;

/// Heading chosen around an obstacle, followed for a short time
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Detour {
    pub heading: Vec3,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Within tolerance of the destination; nothing moved
    Arrived,
    Moved,
    /// Way ahead blocked; turned towards a clear heading instead of moving
    Turned,
    /// No clear heading found
    Blocked,
}

impl AgentCore {
    fn max_turn(&self, dt: f32) -> f32 {
        self.config.turn_speed_deg.to_radians() * dt
    }

    /// Turn towards `point` without moving
    pub(crate) fn face(&mut self, env: &mut dyn Environment, point: Vec3, dt: f32) {
        if let Some(dir) = planar_direction(self.position, point) {
            self.yaw = turn_towards(self.yaw, yaw_of(dir), self.max_turn(dt));
            self.write_transform(env);
        }
    }

    pub(crate) fn move_towards(
        &mut self,
        env: &mut dyn Environment,
        destination: Vec3,
        speed: f32,
        dt: f32,
        tolerance: f32,
    ) -> MoveOutcome {
        let distance = planar_distance(self.position, destination);
        if distance <= tolerance {
            self.detour = None;
            return MoveOutcome::Arrived;
        }
        let Some(direct) = planar_direction(self.position, destination) else {
            return MoveOutcome::Arrived;
        };

        let heading = match self.detour.as_mut() {
            Some(detour) => {
                detour.remaining -= dt;
                let heading = detour.heading;
                if detour.remaining <= 0.0 {
                    self.detour = None;
                }
                heading
            }
            None => direct,
        };

        let step = (speed * dt).min(distance);
        let probe = step + self.config.obstacle_probe_margin;

        if self.path_blocked(&*env, heading, probe) {
            self.detour = None;
            return match self.find_clear_heading(&*env, heading, probe) {
                Some(clear) => {
                    trace!("Agent {} blocked, detouring along {:?}", self.id, clear);
                    self.detour = Some(Detour {
                        heading: clear,
                        remaining: self.config.detour_duration,
                    });
                    self.yaw = turn_towards(self.yaw, yaw_of(clear), self.max_turn(dt));
                    self.write_transform(env);
                    MoveOutcome::Turned
                }
                None => {
                    trace!("Agent {} boxed in at {:?}", self.id, self.position);
                    MoveOutcome::Blocked
                }
            };
        }

        self.position += heading * step;
        self.yaw = turn_towards(self.yaw, yaw_of(heading), self.max_turn(dt));
        self.write_transform(env);
        MoveOutcome::Moved
    }

    fn path_blocked(&self, env: &dyn Environment, heading: Vec3, distance: f32) -> bool {
        env.raycast(self.eye(), heading, distance, LayerMask::OBSTACLE).is_some()
    }

    /// Alternate left and right of `heading` in fixed steps up to a half turn
    fn find_clear_heading(&self, env: &dyn Environment, heading: Vec3, distance: f32) -> Option<Vec3> {
        let step = self.config.avoidance_step_deg.max(1.0);
        let mut offset = step;
        while offset <= 180.0 {
            for sign in [1.0f32, -1.0] {
                let candidate = rotate_y(heading, (sign * offset).to_radians());
                if !self.path_blocked(env, candidate, distance) {
                    return Some(candidate);
                }
            }
            offset += step;
        }
        None
    }
}
