//! Reference host for the decision core
//!
//! Implements the collaborator traits over a small deterministic world so
//! agents can be driven end to end by tests, benches and the runner.

pub mod arena;
pub mod physics;
pub mod population;
pub mod projectiles;
pub mod tick;

pub use arena::Arena;
pub use projectiles::Projectile;
pub use tick::run_arena_tick;
