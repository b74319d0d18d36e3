use thiserror::Error;

/// Top-level error type for PitchBot.
#[derive(Debug, Error)]
pub enum PitchbotError {
    /// Error from the chat transport (poll, send, or status failed).
    #[error("transport error: {0}")]
    Transport(String),

    /// Error from the audit sink.
    #[error("sink error: {0}")]
    Sink(String),

    /// Error from the user state store.
    #[error("store error: {0}")]
    Store(String),

    /// Error from the plan generator.
    #[error("generation error: {0}")]
    Generation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
