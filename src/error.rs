use thiserror::Error;

/// Failure of a set's serialization entry points. Lock acquisition and the
/// set algebra itself never fail.
#[derive(Debug, Error)]
pub enum SetError {
    #[error("encoding set failed ({0})")]
    Encode(#[source] serde_json::Error),
    #[error("decoding set failed ({0})")]
    Decode(#[source] serde_json::Error),
}
