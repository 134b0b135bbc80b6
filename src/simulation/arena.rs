//! Reference environment: a world, the agents living in it, and a player

use glam::Vec3;
use tracing::{debug, info};

use crate::agent::{Agent, AgentEvent};
use crate::core::config::{ArenaConfig, CreatureBlueprint};
use crate::core::types::{EntityId, EntityTag, Tick};
use crate::ecs::world::World;
use crate::simulation::tick::run_arena_tick;
use crate::spatial::Aabb;
use crate::world::{BodyDesc, DamageLedger, Environment};

/// Player body defaults
const PLAYER_RADIUS: f32 = 0.5;
const PLAYER_HEALTH: f32 = 100.0;

pub struct Arena {
    pub(crate) world: World,
    /// Update order is spawn order
    pub(crate) agents: Vec<Agent>,
    pub(crate) player: Option<EntityId>,
    pub(crate) tick: Tick,
    pub(crate) dt: f32,
    pub(crate) activation_timer: f32,
}

impl Arena {
    pub fn new(config: ArenaConfig, dt: f32) -> Self {
        Self {
            world: World::new(config),
            agents: Vec::new(),
            player: None,
            tick: 0,
            dt,
            activation_timer: 0.0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn now(&self) -> f32 {
        self.world.now
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// The first player spawned drives activation polling
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn spawn_player(&mut self, position: Vec3) -> EntityId {
        let id = self.world.spawn(BodyDesc {
            position,
            yaw: 0.0,
            radius: PLAYER_RADIUS,
            tag: EntityTag::Player,
            max_health: Some(PLAYER_HEALTH),
        });
        self.player.get_or_insert(id);
        id
    }

    pub fn spawn_body(&mut self, desc: BodyDesc) -> EntityId {
        self.world.spawn(desc)
    }

    /// Spawn a body for `blueprint` and start an agent driving it
    pub fn spawn_agent(&mut self, blueprint: &CreatureBlueprint, position: Vec3) -> EntityId {
        let id = self
            .world
            .spawn(BodyDesc::creature(position, blueprint.body_radius, blueprint.max_health));
        let mut agent = Agent::from_blueprint(id, blueprint, position);
        if agent.initialize(&self.world).is_ok() {
            self.world.publish_profile(id, agent.profile());
        }
        debug!("Spawned {} as {} at {:?}", blueprint.name, id, position);
        self.agents.push(agent);
        id
    }

    pub fn add_obstacle(&mut self, obstacle: Aabb) {
        self.world.add_obstacle(obstacle);
    }

    /// Remove a body and any agent driving it, without death handling
    pub fn despawn(&mut self, id: EntityId) {
        self.world.despawn(id);
        self.agents.retain(|a| a.id() != id);
        if self.player == Some(id) {
            self.player = None;
        }
    }

    /// Damage from outside the simulation; the victim hears about it at once
    pub fn damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> f32 {
        let dealt = self.world.apply_damage(target, amount, source);
        self.deliver_reports();
        dealt
    }

    pub fn heal(&mut self, target: EntityId, amount: f32) -> f32 {
        self.world.heal(target, amount)
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// An agent together with the environment it runs against
    pub fn split_agent(&mut self, id: EntityId) -> Option<(&mut Agent, &mut dyn Environment)> {
        let agent = self.agents.iter_mut().find(|a| a.id() == id)?;
        Some((agent, &mut self.world as &mut dyn Environment))
    }

    pub fn set_agent_active(&mut self, id: EntityId, active: bool) {
        if let Some(agent) = self.agent_mut(id) {
            agent.set_active(active);
        }
    }

    /// Advance one fixed step
    pub fn tick(&mut self) -> Vec<AgentEvent> {
        run_arena_tick(self)
    }

    pub(crate) fn deliver_reports(&mut self) {
        for (target, report) in self.world.take_reports() {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.id() == target) {
                agent.notify_damage(report);
            }
        }
    }

    /// Drop dead agents and adopt newly registered ones
    pub(crate) fn settle_population(&mut self) {
        let retired = self.world.take_retired();
        if !retired.is_empty() || self.agents.iter().any(|a| !a.is_alive()) {
            self.agents.retain(|a| a.is_alive() && !retired.contains(&a.id()));
        }

        let pending = self.world.take_pending_agents();
        if !pending.is_empty() {
            info!("Adopting {} new agents", pending.len());
            self.agents.extend(pending);
        }
    }
}
