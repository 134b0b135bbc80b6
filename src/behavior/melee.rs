//! Close in and strike

use tracing::debug;

use super::Engagement;
use crate::agent::{AgentCore, AgentEvent};
use crate::combat::{apply_hit, in_strike_range, ComboTracker, HitSpec, Swing};
use crate::core::types::FrameTime;
use crate::tactics::{tactical_position, SpreadRule};
use crate::world::Environment;

/// Distance at which a tactical point counts as reached
const APPROACH_TOLERANCE: f32 = 0.1;

/// One engage tick for an agent that fights at arm's length
pub(crate) fn close_and_strike(
    core: &mut AgentCore,
    env: &mut dyn Environment,
    time: FrameTime,
    engagement: &Engagement,
    rule: SpreadRule,
) {
    if core.combat.swinging() {
        core.face(env, engagement.target_pos, time.dt);
        if let Some(swing) = core.combat.advance_swing(time.dt) {
            resolve_swing(core, env, swing);
        }
        return;
    }

    if engagement.distance <= core.config.attack_range {
        core.face(env, engagement.target_pos, time.dt);
        let windup = core.config.strike.windup;
        if core.combat.begin_swing(engagement.target, time.now, windup) {
            core.emit(AgentEvent::AttackStarted {
                agent: core.id,
                target: engagement.target,
            });
            if let Some(swing) = core.combat.advance_swing(0.0) {
                resolve_swing(core, env, swing);
            }
        }
        return;
    }

    let point = tactical_position(core, &*env, engagement.target_pos, rule);
    let speed = core.config.move_speed;
    core.move_towards(env, point, speed, time.dt, APPROACH_TOLERANCE);
}

/// Damage frame of a swing; misses if the target moved out of reach
pub(crate) fn resolve_swing(core: &mut AgentCore, env: &mut dyn Environment, swing: Swing) {
    if !in_strike_range(&*env, core.position, swing.target, core.config.attack_range) {
        debug!("Agent {} swing at {} missed", core.id, swing.target);
        return;
    }

    let strike = &core.config.strike;
    let hit = HitSpec {
        damage: strike.damage,
        knockback_force: strike.knockback_force,
        knockback_min_upward: strike.knockback_min_upward,
    };
    let base_cooldown = strike.cooldown;
    let dealt = apply_hit(env, core.id, core.position, swing.target, hit);

    let combo = if core.config.combo.enabled {
        let step = core.combat.combo.register_hit(core.now, &core.config.combo);
        core.combat.cooldown = ComboTracker::next_cooldown(step, base_cooldown, &core.config.combo);
        core.combat.combo.count()
    } else {
        0
    };

    core.emit(AgentEvent::StrikeLanded {
        agent: core.id,
        target: swing.target,
        damage: dealt,
        combo,
    });
}
