// error.rs - Error types for storage, board resolution and configuration

use thiserror::Error;

/// Result type for repository operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// A conflict means another writer got there first; reload and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

/// Errors raised while creating, loading or resolving boards.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(
        "cannot resolve past step {step} (ceiling {ceiling}): the final state has been reached \
         or the maximum execution limit would be exceeded"
    )]
    ExecutionLimitReached { step: u32, ceiling: u32 },

    #[error("malformed grid: {0}")]
    MalformedGrid(String),

    #[error("number of executions to resolve must be positive")]
    InvalidStepCount,

    #[error("resolution task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Persistence(#[from] StorageError),
}

impl BoardError {
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, BoardError::ExecutionLimitReached { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BoardError::NotFound(_) | BoardError::Persistence(StorageError::NotFound(_))
        )
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_executions_allowed must be positive")]
    ZeroCeiling,

    #[error("parallel_threshold must be positive")]
    ZeroThreshold,

    #[error("cannot load game rules: {0}")]
    Load(#[from] config::ConfigError),
}
