pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentConfig, ArchetypeConfig, ArenaConfig, Bestiary, CreatureBlueprint};
pub use error::{BeastError, Result};
pub use types::{AgentProfile, AgentState, BehaviorClass, EntityId, EntityTag, FrameTime, LayerMask};
