use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::builder::TopologyError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Topology construction failed: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("No receptor grid map attached for atom type index {type_index}")]
    MissingGridMap { type_index: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
