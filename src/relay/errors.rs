use thiserror::Error;

/// Errors that can arise in the relay core.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Startup-time configuration problem. Fatal: the process must not come up.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Topic table could not be read or parsed. Non-fatal; the previous
    /// in-memory table stays authoritative.
    #[error("failed to load topic table: {0}")]
    RecordLoad(String),

    /// Topic table could not be written. Non-fatal; memory stays authoritative.
    #[error("failed to save topic table: {0}")]
    RecordSave(String),

    /// A keyword mutation named a topic that does not exist. Surfaced to the
    /// interactive edit flow as a user-visible message.
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// A channel post could not be copied into a topic's thread. The display
    /// text is sent verbatim to every admin; sibling topics are unaffected.
    #[error("Failed to forward to #{topic}: {reason}")]
    ForwardFailed { topic: String, reason: String },
}
