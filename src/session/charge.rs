//! Charge shot: hold still while charging, then release one amplified shot

use super::{SessionClock, SessionOutcome, SessionPhase, SessionSnapshot, SessionStep, SpecialActionKind};
use crate::agent::AgentCore;
use crate::behavior::ranged::fire;
use crate::core::config::RangedConfig;
use crate::core::types::{EntityId, FrameTime};
use crate::world::Environment;

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSession {
    clock: SessionClock,
    target: EntityId,
}

impl ChargeSession {
    pub fn new(target: EntityId) -> Self {
        Self {
            clock: SessionClock::new(),
            target,
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(SpecialActionKind::ChargeShot, &self.clock)
    }

    pub(crate) fn step(
        &mut self,
        core: &mut AgentCore,
        env: &mut dyn Environment,
        time: FrameTime,
        config: &RangedConfig,
    ) -> SessionStep {
        self.clock.tick(time.dt);

        if self.clock.phase != SessionPhase::Prepare || self.clock.phase_elapsed < config.charge.duration {
            return SessionStep::Continue;
        }

        self.clock.enter(SessionPhase::Execute);
        let damage = config.projectile_damage * config.charge.damage_multiplier;
        fire(core, env, self.target, damage, true, config);
        core.combat.last_attack = time.now;
        SessionStep::Finished(SessionOutcome::Completed)
    }
}
