//! Error types for the trellis speech recognizer

use thiserror::Error;

/// Unified error type.
///
/// Errors bubble up without recovery attempts; `NoRecognitionResult` is the
/// only expected runtime failure, everything else indicates bad inputs or a
/// lifecycle violation.
#[derive(Error, Debug)]
pub enum Error {
    /// Contract violation at an API boundary (null pointer, empty audio,
    /// wrong frame length).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Parse or structural violation in a decoding graph.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// Stream read/write failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Allocator exhaustion.
    #[error("allocation failed: {0}")]
    BadAllocation(String),

    /// End of input reached with no hypothesis at the final state.
    /// Non-fatal; the session remains usable for deinit.
    #[error("no recognition result")]
    NoRecognitionResult,

    /// Internal invariant or lifecycle violation.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}

impl Error {
    /// Stable integer code for the C ABI. `0` is reserved for success.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 1,
            Error::MalformedGraph(_) => 2,
            Error::Io(_) => 3,
            Error::BadAllocation(_) => 4,
            Error::NoRecognitionResult => 5,
            Error::PreconditionFailed(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
