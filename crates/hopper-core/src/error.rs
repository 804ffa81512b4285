use thiserror::Error;

/// Errors shared across the workspace.
///
/// Store-level failures have their own type in `hopper-queue`; this enum
/// covers what the core crate itself can produce.
#[derive(Debug, Error)]
pub enum HopperError {
    /// Config file or env extraction failed at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A queue entry did not decode as a [`Message`](crate::Message).
    ///
    /// Workers log this and drop the entry; it is never fatal unless the
    /// pool runs with `stop_on_error`.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HopperError>;
