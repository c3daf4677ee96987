mod logging;
mod users;

pub use logging::init_logging;
pub use users::UserRegistry;

use thiserror::Error;

/// Errors from the user registry and log sink.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
    #[error("registry lock poisoned")]
    Poisoned,
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
