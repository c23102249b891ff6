use thiserror::Error;

use crate::config::ConfigError;
use crate::geometry::GridError;
use crate::logging::LoggingError;

/// Unified result type for the block layout engine.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by layout construction and the interaction controller.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("block `{0}` not found")]
    BlockNotFound(String),
    #[error("duplicate block id `{0}`")]
    DuplicateBlock(String),
    #[error("block `{id}` has an invalid position: {source}")]
    InvalidPosition {
        id: String,
        #[source]
        source: GridError,
    },
    #[error("an interaction is already in progress for block `{0}`")]
    SessionActive(String),
    #[error("no interaction in progress")]
    NoSession,
    #[error("layout cannot be edited while block `{0}` is being moved")]
    Locked(String),
    #[error("surface width must be positive and finite, got {0}")]
    InvalidSurface(f64),
    #[error("failed to parse layout: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
