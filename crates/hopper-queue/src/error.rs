use thiserror::Error;

/// Errors surfaced by queue store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached right now. Callers are expected
    /// to back off and retry rather than give up.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the operation itself failed.
    #[error("store error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_io_error()
            || e.is_timeout()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
