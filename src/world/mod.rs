//! External collaborators of the decision core
//!
//! The agent never owns the world. Everything it needs from outside
//! (sight, physics, health, projectiles, population) goes through these
//! traits, handed in on every update. `Environment` bundles them so a
//! single `&mut dyn Environment` can be threaded through the state machine.

pub mod health;

use glam::Vec3;

use crate::agent::Agent;
use crate::core::types::{AgentProfile, EntityId, EntityTag, LayerMask};

pub use health::{DamageReport, Health};

/// Result of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Layer of whatever was hit
    pub layer: LayerMask,
    /// Set when the ray hit a body rather than static geometry
    pub entity: Option<EntityId>,
}

/// Read-only world queries
pub trait SpatialQuery {
    /// Live bodies on `mask` whose origin lies within `radius` of `center`
    fn query_radius(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<EntityId>;

    /// Nearest hit along a normalized `direction`, up to `max_distance`
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

/// Transforms and impulses, owned by the physics layer
pub trait Bodies {
    /// Liveness check for a possibly stale handle
    fn is_alive(&self, id: EntityId) -> bool;
    fn position(&self, id: EntityId) -> Option<Vec3>;
    fn yaw(&self, id: EntityId) -> Option<f32>;
    fn radius(&self, id: EntityId) -> Option<f32>;
    fn tag(&self, id: EntityId) -> Option<EntityTag>;
    /// Only the agent that owns `id` should call this
    fn set_transform(&mut self, id: EntityId, position: Vec3, yaw: f32);
    /// Instantaneous velocity change
    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3);
    /// Class and state last published by the agent driving `id`
    fn profile(&self, id: EntityId) -> Option<AgentProfile>;
    fn spawn_body(&mut self, desc: BodyDesc) -> EntityId;
}

/// Parameters for a new body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub position: Vec3,
    pub yaw: f32,
    pub radius: f32,
    pub tag: EntityTag,
    /// Bodies without health have no damage ledger
    pub max_health: Option<f32>,
}

impl BodyDesc {
    pub fn creature(position: Vec3, radius: f32, max_health: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            radius,
            tag: EntityTag::Creature,
            max_health: Some(max_health),
        }
    }
}

/// Health/damage ledger, one per damageable entity
pub trait DamageLedger {
    fn has_ledger(&self, id: EntityId) -> bool;
    /// Returns the amount actually removed
    fn apply_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> f32;
    /// Returns the amount actually restored
    fn heal(&mut self, target: EntityId, amount: f32) -> f32;
    /// Current health over max health, in [0, 1]
    fn health_percentage(&self, id: EntityId) -> Option<f32>;
    fn max_health(&self, id: EntityId) -> Option<f32>;
    fn is_dead(&self, id: EntityId) -> bool;
}

/// Projectile launch request
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpec {
    pub origin: Vec3,
    pub direction: Vec3,
    pub damage: f32,
    /// Excluded from collisions with its own shot
    pub owner: EntityId,
    pub speed: f32,
    pub lifetime: f32,
}

pub trait ProjectileSpawner {
    fn spawn_projectile(&mut self, spec: ProjectileSpec);
}

/// Population management, as seen by an agent
pub trait Population {
    /// Hand a newly created agent over to the scheduler
    fn register(&mut self, agent: Agent);
    /// Called by an agent on death; its body goes with it
    fn unregister(&mut self, id: EntityId);
}

/// Everything an agent may touch during an update
pub trait Environment: SpatialQuery + Bodies + DamageLedger + ProjectileSpawner + Population {}

impl<T> Environment for T where T: SpatialQuery + Bodies + DamageLedger + ProjectileSpawner + Population + ?Sized {}
