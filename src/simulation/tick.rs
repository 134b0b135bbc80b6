//! Tick system - orchestrates one fixed step of the arena
//!
//! activation poll -> agents (in spawn order) -> projectiles -> physics ->
//! population bookkeeping
//!
//! Damage reports are delivered after every agent update, so an agent hit
//! by an earlier agent reacts within the same tick.

use tracing::trace;

use crate::agent::AgentEvent;
use crate::core::types::FrameTime;
use crate::simulation::arena::Arena;
use crate::simulation::physics::integrate_bodies;
use crate::simulation::population::poll_activation;
use crate::simulation::projectiles::step_projectiles;

/// Run a single arena tick, returning everything the agents emitted
pub fn run_arena_tick(arena: &mut Arena) -> Vec<AgentEvent> {
    let time = FrameTime::at_tick(arena.tick, arena.dt);
    arena.world.now = time.now;

    poll_activation(arena, time.dt);

    let mut events = Vec::new();
    for i in 0..arena.agents.len() {
        let agent = &mut arena.agents[i];
        agent.update(&mut arena.world, time, &mut events);
        if agent.is_alive() {
            arena.world.publish_profile(agent.id(), agent.profile());
        }
        arena.deliver_reports();
    }

    step_projectiles(&mut arena.world, time.dt);
    arena.deliver_reports();

    integrate_bodies(&mut arena.world, time.dt);
    arena.settle_population();

    trace!("Tick {} done, {} events", arena.tick, events.len());
    arena.tick += 1;
    events
}
