//! ECS World - manages all bodies and their components
//!
//! Bodies live in generational slots. A destroyed body bumps its slot's
//! generation, so stale handles fail to resolve instead of aliasing the
//! next occupant. The world implements every collaborator trait the agents
//! need, and buffers anything that has to reach an agent (damage reports,
//! newly registered agents, deaths) for the tick loop to deliver.

use glam::Vec3;

use crate::agent::Agent;
use crate::core::config::ArenaConfig;
use crate::core::types::{AgentProfile, EntityId, EntityTag, LayerMask};
use crate::simulation::projectiles::Projectile;
use crate::spatial::geometry::ray_sphere;
use crate::spatial::{Aabb, SparseHashGrid};
use crate::world::{
    BodyDesc, Bodies, DamageLedger, DamageReport, Health, Population, ProjectileSpawner, ProjectileSpec, RayHit,
    SpatialQuery,
};

/// Physical state plus the components a body may carry
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub yaw: f32,
    pub velocity: Vec3,
    pub radius: f32,
    pub tag: EntityTag,
    pub health: Option<Health>,
    /// Published by the agent driving this body, if any
    pub profile: Option<AgentProfile>,
}

impl Body {
    fn from_desc(desc: BodyDesc) -> Self {
        Self {
            position: desc.position,
            yaw: desc.yaw,
            velocity: Vec3::ZERO,
            radius: desc.radius,
            tag: desc.tag,
            health: desc.max_health.map(Health::new),
            profile: None,
        }
    }

    /// Sphere center; the body origin sits at its feet
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::Y * self.radius
    }

    pub fn is_dead(&self) -> bool {
        self.health.map(|h| h.is_dead()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The game world containing all bodies
#[derive(Debug, Clone)]
pub struct World {
    pub now: f32,
    pub(crate) config: ArenaConfig,
    slots: Vec<Slot>,
    free: Vec<u32>,
    grid: SparseHashGrid,
    obstacles: Vec<Aabb>,
    pub(crate) projectiles: Vec<Projectile>,
    pending_agents: Vec<Agent>,
    reports: Vec<(EntityId, DamageReport)>,
    retired: Vec<EntityId>,
}

impl World {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            now: 0.0,
            grid: SparseHashGrid::new(config.cell_size),
            config,
            slots: Vec::new(),
            free: Vec::new(),
            obstacles: Vec::new(),
            projectiles: Vec::new(),
            pending_agents: Vec::new(),
            reports: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    pub fn entity_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body
                .as_ref()
                .map(|body| (EntityId::new(index as u32, slot.generation), body))
        })
    }

    pub fn body_ids(&self) -> Vec<EntityId> {
        self.bodies().map(|(id, _)| id).collect()
    }

    pub fn spawn(&mut self, desc: BodyDesc) -> EntityId {
        let body = Body::from_desc(desc);
        let position = body.position;
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                EntityId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                EntityId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        self.grid.insert(id, position);
        id
    }

    /// Destroy a body; its handle stops resolving
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return false;
        };
        let Some(body) = slot.body.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.grid.remove(id, body.position);
        true
    }

    /// Move a body, keeping the spatial index in step
    pub fn move_body(&mut self, id: EntityId, position: Vec3) {
        let Some(body) = self.body_mut(id) else {
            return;
        };
        let from = body.position;
        body.position = position;
        self.grid.relocate(id, from, position);
    }

    /// Teleport; also clears velocity
    pub fn set_position(&mut self, id: EntityId, position: Vec3) {
        self.move_body(id, position);
        if let Some(body) = self.body_mut(id) {
            body.velocity = Vec3::ZERO;
        }
    }

    /// Overwrite current health without raising a damage report
    pub fn set_health(&mut self, id: EntityId, current: f32) {
        if let Some(health) = self.body_mut(id).and_then(|b| b.health.as_mut()) {
            health.current = current.clamp(0.0, health.max);
        }
    }

    pub fn set_invulnerable(&mut self, id: EntityId, invulnerable: bool) {
        if let Some(health) = self.body_mut(id).and_then(|b| b.health.as_mut()) {
            health.invulnerable = invulnerable;
        }
    }

    pub fn publish_profile(&mut self, id: EntityId, profile: AgentProfile) {
        if let Some(body) = self.body_mut(id) {
            body.profile = Some(profile);
        }
    }

    pub fn add_obstacle(&mut self, obstacle: Aabb) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub(crate) fn take_reports(&mut self) -> Vec<(EntityId, DamageReport)> {
        std::mem::take(&mut self.reports)
    }

    pub(crate) fn take_pending_agents(&mut self) -> Vec<Agent> {
        std::mem::take(&mut self.pending_agents)
    }

    pub(crate) fn take_retired(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.retired)
    }

    /// Nearest hit along `direction`, ignoring the body `exclude`
    pub fn raycast_excluding(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
        exclude: Option<EntityId>,
    ) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut consider = |hit: RayHit| {
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        };

        if mask.contains(LayerMask::OBSTACLE) {
            for obstacle in &self.obstacles {
                if let Some((t, normal)) = obstacle.ray_intersect(origin, direction, max_distance) {
                    consider(RayHit {
                        point: origin + direction * t,
                        normal,
                        distance: t,
                        layer: LayerMask::OBSTACLE,
                        entity: None,
                    });
                }
            }
        }

        if mask.contains(LayerMask::GROUND) {
            if let Some(height) = self.config.ground_height {
                if direction.y < -1e-6 && origin.y >= height {
                    let t = (origin.y - height) / -direction.y;
                    if t <= max_distance {
                        consider(RayHit {
                            point: origin + direction * t,
                            normal: Vec3::Y,
                            distance: t,
                            layer: LayerMask::GROUND,
                            entity: None,
                        });
                    }
                }
            }
        }

        if mask.contains(LayerMask::ENTITY) {
            for (id, body) in self.bodies() {
                if Some(id) == exclude {
                    continue;
                }
                if let Some(t) = ray_sphere(origin, direction, body.center(), body.radius, max_distance) {
                    let point = origin + direction * t;
                    consider(RayHit {
                        point,
                        normal: (point - body.center()).try_normalize().unwrap_or(-direction),
                        distance: t,
                        layer: LayerMask::ENTITY,
                        entity: Some(id),
                    });
                }
            }
        }

        best
    }
}

impl SpatialQuery for World {
    fn query_radius(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        if !mask.contains(LayerMask::ENTITY) {
            return Vec::new();
        }
        let mut found = self.grid.query_radius(center, radius, |id| self.body(id).map(|b| b.position));
        found.sort();
        found
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        self.raycast_excluding(origin, direction, max_distance, mask, None)
    }
}

impl Bodies for World {
    fn is_alive(&self, id: EntityId) -> bool {
        self.body(id).map(|b| !b.is_dead()).unwrap_or(false)
    }

    fn position(&self, id: EntityId) -> Option<Vec3> {
        self.body(id).map(|b| b.position)
    }

    fn yaw(&self, id: EntityId) -> Option<f32> {
        self.body(id).map(|b| b.yaw)
    }

    fn radius(&self, id: EntityId) -> Option<f32> {
        self.body(id).map(|b| b.radius)
    }

    fn tag(&self, id: EntityId) -> Option<EntityTag> {
        self.body(id).map(|b| b.tag)
    }

    fn set_transform(&mut self, id: EntityId, position: Vec3, yaw: f32) {
        self.move_body(id, position);
        if let Some(body) = self.body_mut(id) {
            body.yaw = yaw;
        }
    }

    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3) {
        if let Some(body) = self.body_mut(id) {
            body.velocity += impulse;
        }
    }

    fn profile(&self, id: EntityId) -> Option<AgentProfile> {
        self.body(id).and_then(|b| b.profile)
    }

    fn spawn_body(&mut self, desc: BodyDesc) -> EntityId {
        self.spawn(desc)
    }
}

impl DamageLedger for World {
    fn has_ledger(&self, id: EntityId) -> bool {
        self.body(id).map(|b| b.health.is_some()).unwrap_or(false)
    }

    fn apply_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> f32 {
        let now = self.now;
        let Some(health) = self.body_mut(target).and_then(|b| b.health.as_mut()) else {
            return 0.0;
        };
        let dealt = health.apply_damage(amount);
        if dealt > 0.0 {
            let report = DamageReport {
                amount: dealt,
                source,
                health_percentage: health.percentage(),
                now,
            };
            self.reports.push((target, report));
        }
        dealt
    }

    fn heal(&mut self, target: EntityId, amount: f32) -> f32 {
        self.body_mut(target)
            .and_then(|b| b.health.as_mut())
            .map(|h| h.heal(amount))
            .unwrap_or(0.0)
    }

    fn health_percentage(&self, id: EntityId) -> Option<f32> {
        self.body(id).and_then(|b| b.health).map(|h| h.percentage())
    }

    fn max_health(&self, id: EntityId) -> Option<f32> {
        self.body(id).and_then(|b| b.health).map(|h| h.max)
    }

    fn is_dead(&self, id: EntityId) -> bool {
        self.body(id).map(|b| b.is_dead()).unwrap_or(false)
    }
}

impl ProjectileSpawner for World {
    fn spawn_projectile(&mut self, spec: ProjectileSpec) {
        self.projectiles.push(Projectile::from_spec(spec));
    }
}

impl Population for World {
    fn register(&mut self, agent: Agent) {
        if let Some(body) = self.body_mut(agent.id()) {
            body.profile = Some(agent.profile());
        }
        self.pending_agents.push(agent);
    }

    fn unregister(&mut self, id: EntityId) {
        self.despawn(id);
        self.retired.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(ArenaConfig::default())
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut world = world();
        let first = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        assert!(world.despawn(first));
        let second = world.spawn(BodyDesc::creature(Vec3::ONE, 0.5, 10.0));

        assert_eq!(first.index, second.index);
        assert_ne!(first, second);
        assert!(world.position(first).is_none());
        assert!(!world.is_alive(first));
        assert_eq!(world.position(second), Some(Vec3::ONE));
    }

    #[test]
    fn test_invulnerable_takes_no_damage() {
        let mut world = world();
        let id = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        world.set_invulnerable(id, true);
        assert_eq!(world.apply_damage(id, 5.0, None), 0.0);
        assert_eq!(world.health_percentage(id), Some(1.0));
        assert!(world.take_reports().is_empty());
    }

    #[test]
    fn test_damage_raises_report() {
        let mut world = world();
        let id = world.spawn(BodyDesc::creature(Vec3::ZERO, 0.5, 10.0));
        let attacker = world.spawn(BodyDesc::creature(Vec3::X, 0.5, 10.0));
        world.apply_damage(id, 4.0, Some(attacker));
        let reports = world.take_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, id);
        assert_eq!(reports[0].1.source, Some(attacker));
        assert!((reports[0].1.health_percentage - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_picks_nearest_layer() {
        let mut world = world();
        world.add_obstacle(Aabb::new(Vec3::new(4.0, 0.0, -1.0), Vec3::new(5.0, 2.0, 1.0)));
        let body = world.spawn(BodyDesc::creature(Vec3::new(2.0, 0.0, 0.0), 0.5, 10.0));
        let origin = Vec3::new(0.0, 0.5, 0.0);

        let hit = world.raycast(origin, Vec3::X, 10.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.entity, Some(body));
        assert_eq!(hit.layer, LayerMask::ENTITY);

        let hit = world.raycast(origin, Vec3::X, 10.0, LayerMask::OBSTACLE).unwrap();
        assert_eq!(hit.layer, LayerMask::OBSTACLE);
        assert!((hit.distance - 4.0).abs() < 1e-4);

        let hit = world.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 10.0, LayerMask::SOLID).unwrap();
        assert_eq!(hit.layer, LayerMask::GROUND);
        assert!((hit.distance - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_query_radius_is_planar_and_sorted() {
        let mut world = world();
        let a = world.spawn(BodyDesc::creature(Vec3::new(1.0, 20.0, 0.0), 0.5, 10.0));
        let b = world.spawn(BodyDesc::creature(Vec3::new(0.0, 0.0, -1.0), 0.5, 10.0));
        world.spawn(BodyDesc::creature(Vec3::new(30.0, 0.0, 0.0), 0.5, 10.0));

        let found = world.query_radius(Vec3::ZERO, 2.0, LayerMask::ENTITY);
        assert_eq!(found, vec![a, b]);
        assert!(world.query_radius(Vec3::ZERO, 2.0, LayerMask::SOLID).is_empty());
    }
}
