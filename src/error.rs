//! Error types for configuration parsing and the search driver.

/// Errors raised when a board configuration is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("configuration {bits:#b} has bits set beyond the 49-cell board")]
    OutOfRange { bits: u64 },

    #[error("configuration {bits:#b} places a marble on a cut corner cell")]
    CornerCell { bits: u64 },

    #[error("failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Errors that abort a search run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error("a target configuration and a marble threshold cannot both be given")]
    ConflictingGoal,

    #[error("marble threshold must be at least 1")]
    InvalidThreshold,

    #[error("arena capacity must be at least 1")]
    InvalidCapacity,

    #[error("search arena overflowed its capacity of {capacity} nodes")]
    ArenaOverflow { capacity: usize },

    #[error("node index {index} is out of range for an arena of {len} nodes")]
    NodeOutOfRange { index: usize, len: usize },
}
