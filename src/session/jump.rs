//! Jump attack: crouch, launch, wait for ground contact, settle

use glam::Vec3;
use tracing::{debug, warn};

use super::{SessionClock, SessionOutcome, SessionPhase, SessionSnapshot, SessionStep, SpecialActionKind};
use crate::agent::{AgentCore, AgentEvent};
use crate::combat::{apply_hit, HitSpec};
use crate::core::config::SlimeConfig;
use crate::core::types::{EntityId, FrameTime, LayerMask};
use crate::spatial::geometry::{planar_direction, planar_distance};
use crate::world::Environment;

/// Lift applied to the probe origin so a body resting exactly on the
/// surface still registers contact
const PROBE_LIFT: f32 = 0.05;

/// Launch impulse for a hop covering `distance` along `direction`
///
/// Horizontal impulse grows linearly with distance; vertical has a base
/// value plus a per-meter term, capped.
pub fn launch_impulse(direction: Vec3, distance: f32, config: &SlimeConfig) -> Vec3 {
    let up = (config.base_up_impulse + distance * config.up_impulse_per_meter).min(config.max_up_impulse);
    direction * distance * config.forward_impulse_per_meter + Vec3::Y * up
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpSession {
    clock: SessionClock,
    target: EntityId,
}

impl JumpSession {
    pub fn new(target: EntityId) -> Self {
        Self {
            clock: SessionClock::new(),
            target,
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(SpecialActionKind::JumpAttack, &self.clock)
    }

    pub(crate) fn step(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        config: &SlimeConfig,
    ) -> SessionStep {
        self.clock.tick(time.dt);

        match self.clock.phase {
            SessionPhase::Prepare => {
                if self.clock.phase_elapsed >= config.prepare_duration {
                    self.launch(core, env, config);
                    self.clock.enter(SessionPhase::Execute);
                }
                SessionStep::Continue
            }
            SessionPhase::Execute => {
                if self.clock.phase_elapsed < config.liftoff_grace {
                    return SessionStep::Continue;
                }
                if grounded(core, &*env, config) {
                    land(core, env, config);
                    self.clock.enter(SessionPhase::Resolve);
                    return SessionStep::Continue;
                }
                if self.clock.phase_elapsed >= config.airborne_timeout {
                    warn!(
                        "Agent {} never landed after {:.2}s airborne",
                        core.id, self.clock.phase_elapsed
                    );
                    return SessionStep::Finished(SessionOutcome::TimedOut);
                }
                SessionStep::Continue
            }
            SessionPhase::Resolve => {
                if self.clock.phase_elapsed >= config.settle_duration {
                    SessionStep::Finished(SessionOutcome::Completed)
                } else {
                    SessionStep::Continue
                }
            }
        }
    }

    fn launch(&self, core: &mut AgentCore, env: &mut dyn Environment, config: &SlimeConfig) {
        let Some(aim) = env.position(self.target).or(core.last_known_target) else {
            return;
        };
        let distance = planar_distance(core.position, aim);
        let direction = planar_direction(core.position, aim).unwrap_or_else(|| core.forward());
        let impulse = launch_impulse(direction, distance, config);
        debug!("Agent {} launching over {:.2}m, impulse {:?}", core.id, distance, impulse);
        env.apply_impulse(core.id, impulse);
    }
}

/// Short downward probe from the feet
pub(crate) fn grounded(core: &AgentCore, env: &dyn Environment, config: &SlimeConfig) -> bool {
    let Some(feet) = env.position(core.id) else {
        return false;
    };
    let origin = feet + Vec3::Y * PROBE_LIFT;
    env.raycast(origin, Vec3::NEG_Y, config.ground_probe_distance + PROBE_LIFT, LayerMask::SOLID)
        .is_some()
}

/// Area damage around the landing point, each target hit at most once
fn land(core: &mut AgentCore, env: &mut dyn Environment, config: &SlimeConfig) {
    let position = env.position(core.id).unwrap_or(core.position);
    let mut targets: Vec<EntityId> = env
        .query_radius(position, config.impact_radius, LayerMask::ENTITY)
        .into_iter()
        .filter(|&id| id != core.id && env.is_alive(id) && env.tag(id) == Some(core.config.target_tag))
        .collect();
    targets.sort();
    targets.dedup();

    let strike = &core.config.strike;
    let hit = HitSpec {
        damage: strike.damage * config.damage_multiplier,
        knockback_force: strike.knockback_force * config.knockback_multiplier,
        knockback_min_upward: strike.knockback_min_upward,
    };
    for &target in &targets {
        apply_hit(env, core.id, position, target, hit);
    }

    debug!("Agent {} landed, {} hit", core.id, targets.len());
    core.emit(AgentEvent::Landed {
        agent: core.id,
        position,
        hits: targets.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_impulse_scales_with_distance() {
        let config = SlimeConfig::default();
        let near = launch_impulse(Vec3::X, 3.0, &config);
        let far = launch_impulse(Vec3::X, 6.0, &config);
        assert!((near.x - 3.0 * config.forward_impulse_per_meter).abs() < 1e-5);
        assert!(far.x > near.x);
        assert!(far.y > near.y);
    }

    #[test]
    fn test_launch_impulse_vertical_capped() {
        let config = SlimeConfig::default();
        let impulse = launch_impulse(Vec3::Z, 100.0, &config);
        assert_eq!(impulse.y, config.max_up_impulse);
    }
}
