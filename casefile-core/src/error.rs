/*!
Error types for the Casefile core engine.
*/

use thiserror::Error;

/// Result type used throughout the Casefile core.
pub type Result<T> = std::result::Result<T, CasefileError>;

/// Errors that can occur during session and store operations.
///
/// Absence of data is deliberately split from failure: a player with no
/// saved session is reported as `Ok(None)` by the store, never as an error,
/// while [`CasefileError::NotFound`] covers lookups that require the row to
/// exist.
#[derive(Error, Debug)]
pub enum CasefileError {
    /// No player row exists under this name
    #[error("no record for player '{name}'")]
    NotFound { name: String },

    /// A player row already exists under this name
    #[error("player name '{name}' is already taken")]
    DuplicateIdentity { name: String },

    /// Failures inside the embedded save database
    #[error("save database error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Store-layer failures outside the database itself
    #[error("storage error: {0}")]
    Storage(String),
}

impl CasefileError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a new duplicate-identity error
    pub fn duplicate<S: Into<String>>(name: S) -> Self {
        Self::DuplicateIdentity { name: name.into() }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
}
