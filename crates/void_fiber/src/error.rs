//! Error types

use crate::arena::FiberId;
use crate::config::ConfigError;
use thiserror::Error;

/// Reconciler errors
#[derive(Debug, Error)]
pub enum FiberError {
    /// The handle refers to a fiber that was removed
    #[error("Fiber {0:?} is stale or was removed")]
    StaleFiber(FiberId),

    /// No root is mounted on the container
    #[error("No root is mounted on the given container")]
    UnknownRoot,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for reconciler operations
pub type FiberResult<T> = Result<T, FiberError>;
