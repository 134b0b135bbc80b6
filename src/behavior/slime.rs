//! Jumping slime: hops onto targets at mid range, splits on death

use std::f32::consts::TAU;

use glam::Vec3;
use tracing::{info, warn};

use super::Engagement;
use crate::agent::{Agent, AgentCore, AgentEvent};
use crate::core::config::{ArchetypeConfig, SlimeConfig};
use crate::core::types::{EntityId, FrameTime};
use crate::session::JumpSession;
use crate::spatial::geometry::forward_from_yaw;
use crate::world::{BodyDesc, Environment};

#[derive(Debug, Clone)]
pub struct SlimeKit {
    pub(crate) config: SlimeConfig,
    pub(crate) session: Option<JumpSession>,
    last_jump_end: f32,
}

impl SlimeKit {
    pub fn new(config: SlimeConfig) -> Self {
        Self {
            config,
            session: None,
            last_jump_end: f32::NEG_INFINITY,
        }
    }

    pub fn config(&self) -> &SlimeConfig {
        &self.config
    }

    pub(crate) fn can_jump(&self, core: &AgentCore, time: FrameTime, engagement: &Engagement) -> bool {
        self.session.is_none()
            && !core.combat.swinging()
            && time.now - self.last_jump_end >= self.config.jump_cooldown
            && engagement.distance >= self.config.min_jump_distance
            && engagement.distance <= self.config.max_jump_distance
    }

    pub(crate) fn begin(&mut self, target: EntityId) {
        self.session = Some(JumpSession::new(target));
    }

    pub(crate) fn finish(&mut self, now: f32) {
        self.session = None;
        self.last_jump_end = now;
    }

    /// Replace the dying body with smaller copies scattered around it
    pub(crate) fn split(&self, core: &mut AgentCore, env: &mut dyn Environment) {
        let split = &self.config.split;
        if !split.enabled || split.generations == 0 || split.count == 0 {
            return;
        }

        let max_health = env.max_health(core.id).unwrap_or(0.0) * split.health_fraction;
        let radius = env.radius(core.id).unwrap_or(0.5) * split.radius_scale;
        if max_health <= 0.0 {
            return;
        }

        let mut child_config = self.config.clone();
        child_config.split.generations -= 1;
        let archetype = ArchetypeConfig::Slime(child_config);

        let mut children = Vec::with_capacity(split.count as usize);
        for i in 0..split.count {
            let direction = forward_from_yaw(core.offset_angle + TAU * i as f32 / split.count as f32);
            let position = core.position + direction * radius * 2.0;
            let id = env.spawn_body(BodyDesc::creature(position, radius, max_health));
            env.apply_impulse(id, direction * split.scatter_impulse + Vec3::Y * split.scatter_impulse * 0.5);

            let mut child = Agent::new(id, core.config.clone(), &archetype, position);
            if let Err(err) = child.initialize(&*env) {
                warn!("Split child of {} not started: {}", core.id, err);
                continue;
            }
            env.register(child);
            children.push(id);
        }

        info!("Agent {} split into {} ({} generations left)", core.id, children.len(), split.generations - 1);
        core.emit(AgentEvent::Split {
            parent: core.id,
            children,
        });
    }
}
