//! Error type shared by the lead service crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or upload directory could not be prepared
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or malformed TOML configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored `import_errors.error_type` outside the known set
    #[error("Unknown import error type: {0}")]
    UnknownErrorKind(String),
}
