use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum BeastError {
    /// A required collaborator is absent; the agent disables itself
    #[error("Missing dependency for {entity}: {what}")]
    MissingDependency { entity: EntityId, what: &'static str },

    #[error("Stale reference: {0} no longer resolves")]
    StaleReference(EntityId),

    #[error("Special action of {entity} stuck after {elapsed:.2}s")]
    StuckAction { entity: EntityId, elapsed: f32 },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BeastError>;
