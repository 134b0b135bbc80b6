//! Planar steering math and ray intersection primitives
//!
//! Y is up. Yaw is the rotation about +Y, with yaw 0 facing +Z.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-5;

/// Project onto the horizontal plane
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Unit horizontal direction from `from` to `to`, if they are apart
pub fn planar_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let delta = planar(to - from);
    let len = delta.length();
    if len > EPSILON {
        Some(delta / len)
    } else {
        None
    }
}

#[inline]
pub fn rotate_y(dir: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * dir
}

#[inline]
pub fn yaw_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Wrap an angle into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Step `current` yaw towards `desired` by at most `max_step` radians
pub fn turn_towards(current: f32, desired: f32, max_step: f32) -> f32 {
    let diff = wrap_angle(desired - current);
    if diff.abs() <= max_step {
        wrap_angle(desired)
    } else {
        wrap_angle(current + max_step.copysign(diff))
    }
}

/// Axis-aligned box, used for static obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Returns hit distance and surface normal.
    ///
    /// `dir` must be normalized. A ray starting inside reports distance 0.
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        if self.contains(origin) {
            return Some((0.0, -dir));
        }

        let mut t_enter = 0.0_f32;
        let mut t_exit = max_distance;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            let mut axis_normal = Vec3::ZERO;
            axis_normal[axis] = -d.signum();
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = axis_normal;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, normal))
    }
}

/// Ray against sphere. `dir` must be normalized.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32, max_distance: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = oc.dot(dir);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t <= max_distance).then_some(t)
}
