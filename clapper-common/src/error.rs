//! Common error types for Clapper

use thiserror::Error;

/// Common result type for Clapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store and the bot service
///
/// Validation failures (`InvalidScore`, `Unauthorized`, `DuplicateSuggestion`,
/// `MalformedToken`) are raised before any mutation. `AlreadySelected` is
/// raised at the storage boundary from the selections primary key.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog item already suggested in this tenant
    #[error("Catalog item {external_ref} has already been suggested")]
    DuplicateSuggestion { external_ref: i64 },

    /// Requested suggestion, movie or tenant configuration not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor lacks the administrator flag required for the action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A selection already exists for this suggestion
    #[error("Suggestion {suggestion_id} has already been selected")]
    AlreadySelected { suggestion_id: i64 },

    /// Review attempted on a suggestion that was never selected
    #[error("Suggestion {suggestion_id} has not been selected")]
    NotSelected { suggestion_id: i64 },

    /// Review score outside [0, 10] or unparsable
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// Affordance token could not be decoded
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Affordance token was issued for another tenant
    #[error("Token belongs to a different tenant")]
    TenantMismatch,

    /// External lookup or output sink failed
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error is a SQLite unique/primary key constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
