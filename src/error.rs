//! Error types for the playability library.
//!
//! Everything that can go wrong while talking to the engine, parsing a
//! position, loading configuration or running a model ends up in
//! [`PlayabilityError`], so callers only ever handle one type.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayabilityError {
    /// Spawning or talking to a child process, or reading a file, failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine did not answer before the configured deadline.
    #[error("engine did not respond within {0:?}")]
    EngineTimeout(Duration),

    /// The engine process closed its output stream.
    #[error("engine process disconnected")]
    EngineDisconnected,

    /// The engine said something we could not make sense of.
    #[error("engine protocol error: {0}")]
    EngineProtocol(String),

    /// Wraps an error returned by the underlying ONNX Runtime bindings.
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// Occurs when the model input cannot be shaped into a tensor.
    #[error("Tensor shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A feature set names a feature the record does not have.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// The model produced an empty output tensor.
    #[error("model produced no output")]
    EmptyOutput,
}
