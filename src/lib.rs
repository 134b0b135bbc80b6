//! Beastmind - behavior and combat decision core for creature agents

pub mod agent;
pub mod behavior;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod session;
pub mod simulation;
pub mod spatial;
pub mod tactics;
pub mod world;
