//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Generational handle to a body in the environment
///
/// A handle never owns the entity. The slot index may be reused after the
/// entity is destroyed, but the generation changes, so an old handle stops
/// resolving instead of pointing at the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Stable 64-bit form, used to seed per-agent randomness
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Collision layer bitmask for spatial queries and raycasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const GROUND: LayerMask = LayerMask(1 << 0);
    pub const OBSTACLE: LayerMask = LayerMask(1 << 1);
    pub const ENTITY: LayerMask = LayerMask(1 << 2);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Geometry that blocks walking and sight
    pub const SOLID: LayerMask = LayerMask(Self::GROUND.0 | Self::OBSTACLE.0);

    #[inline]
    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        LayerMask(self.0 | rhs.0)
    }
}

/// Species tag carried by every body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityTag {
    Player,
    #[default]
    Creature,
    Prop,
}

/// Behavior class of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorClass {
    Melee,
    Ranged,
    /// Never turns aggressive from perception, but can still flee
    Neutral,
}

impl BehaviorClass {
    /// Can perception or damage make this class engage?
    pub fn can_aggress(&self) -> bool {
        !matches!(self, BehaviorClass::Neutral)
    }
}

/// Behavior state - every agent is always in exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgentState {
    /// Wandering near the home point
    #[default]
    Passive,
    /// Engaging a target
    Aggressive,
    /// Retreating from a threat
    Fleeing,
    /// Under external control, no-op
    Idle,
}

/// What an agent publishes about itself for neighbors to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub class: BehaviorClass,
    pub state: AgentState,
}

/// Simulation time for one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since simulation start
    pub now: f32,
    /// Seconds covered by this tick
    pub dt: f32,
}

impl FrameTime {
    pub fn new(now: f32, dt: f32) -> Self {
        Self { now, dt }
    }

    /// The frame `ticks` steps after start at a fixed rate
    pub fn at_tick(tick: u64, dt: f32) -> Self {
        Self {
            now: tick as f32 * dt,
            dt,
        }
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_bits_roundtrip() {
        let id = EntityId::new(17, 3);
        assert_eq!(EntityId::from_bits(id.to_bits()), id);
    }

    #[test]
    fn test_entity_id_generation_distinguishes() {
        let a = EntityId::new(4, 1);
        let b = EntityId::new(4, 2);
        assert_ne!(a, b);
        assert_ne!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_layer_mask_contains() {
        assert!(LayerMask::SOLID.contains(LayerMask::GROUND));
        assert!(LayerMask::SOLID.contains(LayerMask::OBSTACLE));
        assert!(!LayerMask::SOLID.contains(LayerMask::ENTITY));
        assert!(LayerMask::ALL.contains(LayerMask::ENTITY));
        assert!(!LayerMask::NONE.contains(LayerMask::ALL));
    }

    #[test]
    fn test_neutral_never_aggresses() {
        assert!(BehaviorClass::Melee.can_aggress());
        assert!(BehaviorClass::Ranged.can_aggress());
        assert!(!BehaviorClass::Neutral.can_aggress());
    }

    #[test]
    fn test_frame_time_at_tick() {
        let t = FrameTime::at_tick(10, 0.1);
        assert!((t.now - 1.0).abs() < 1e-6);
        assert_eq!(t.dt, 0.1);
    }
}
