/// Session store errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The caller tried to persist a session that would read back as invalid.
    /// Indicates a bug in the caller, not a user-recoverable condition.
    #[error("Invalid session: {0}")]
    InvalidSession(&'static str),

    /// Underlying storage failed.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// Persisted record could not be decoded.
    #[error("Corrupt session record: {0}")]
    Corrupt(String),
}
