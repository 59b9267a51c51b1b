//! Error types shared by the genome, network and swarm layers

/// Errors raised while evolving, breeding or exchanging messages
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// Two strings that must share a length did not
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Cannot select a parent from an empty population")]
    EmptyPopulation,

    #[error("Invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    /// Unknown tag or malformed payload on the wire
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// No offspring arrived within the configured collect timeout
    #[error("Collect stalled after {waited_ms}ms with {outstanding} outstanding request(s)")]
    Stall { waited_ms: u64, outstanding: usize },

    #[error("Transport closed: {0}")]
    TransportClosed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvolutionError>;
