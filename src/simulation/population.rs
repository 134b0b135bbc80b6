//! Population management
//!
//! Agents far from the player are switched off and cost nothing. Switching
//! an agent off freezes it exactly as it is; switching it back on resumes
//! from the same state, sessions included.

use tracing::debug;

use crate::simulation::arena::Arena;
use crate::spatial::geometry::planar_distance;
use crate::world::Bodies;

/// Poll player distance on the configured interval
pub fn poll_activation(arena: &mut Arena, dt: f32) {
    arena.activation_timer -= dt;
    if arena.activation_timer > 0.0 {
        return;
    }
    arena.activation_timer = arena.world.config.activation_interval;

    let Some(radius) = arena.world.config.activation_radius else {
        return;
    };
    let Some(player_pos) = arena.player.and_then(|p| arena.world.position(p)) else {
        return;
    };

    let mut switched = 0;
    for agent in arena.agents.iter_mut() {
        let Some(position) = arena.world.position(agent.id()) else {
            continue;
        };
        let active = planar_distance(position, player_pos) <= radius;
        if agent.is_active() != active {
            agent.set_active(active);
            switched += 1;
        }
    }
    if switched > 0 {
        debug!("Activation poll switched {} agents", switched);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::core::config::{ArchetypeConfig, ArenaConfig, CreatureBlueprint};
    use crate::simulation::Arena;

    #[test]
    fn test_far_agents_deactivate_and_return() {
        let mut arena = Arena::new(ArenaConfig::default(), 0.1);
        let player = arena.spawn_player(Vec3::ZERO);
        let blueprint = CreatureBlueprint::new("m", ArchetypeConfig::Melee);
        let near = arena.spawn_agent(&blueprint, Vec3::new(20.0, 0.0, 0.0));
        let far = arena.spawn_agent(&blueprint, Vec3::new(200.0, 0.0, 0.0));

        arena.tick();
        assert!(arena.agent(near).unwrap().is_active());
        assert!(!arena.agent(far).unwrap().is_active());

        arena.world_mut().set_position(player, Vec3::new(190.0, 0.0, 0.0));
        for _ in 0..6 {
            arena.tick();
        }
        assert!(!arena.agent(near).unwrap().is_active());
        assert!(arena.agent(far).unwrap().is_active());
    }
}
