pub mod world;

pub use world::{Body, World};
