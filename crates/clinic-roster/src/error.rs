use thiserror::Error;

/// Errors that can occur within the roster subsystem.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The submission is malformed (e.g. an unknown shift code).
    /// Raised before any write reaches storage.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is part of the service contract but has no
    /// implementation yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Underlying SQLite / rusqlite error, passed through untouched.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RosterError {
    /// Short error code string sent to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::InvalidArgument(_) => "INVALID_ARGUMENT",
            RosterError::NotImplemented(_) => "NOT_IMPLEMENTED",
            RosterError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
