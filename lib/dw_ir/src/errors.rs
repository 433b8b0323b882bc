//! IR errors definitions.

use std::io;
use thiserror::Error;

/// An alias for result that can be a [`IrError`].
pub type IrResult<T> = Result<T, IrError>;

/// The IR error type.
#[derive(Debug, Error)]
pub enum IrError {
    /// Error that can be returned when doing [std::io](I/O) operations.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Error that can be returned by the textual format parser.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("could not convert {} into {}", from, to)]
    Conversion { from: String, to: String },

    #[error("invalid type")]
    InvalidType,

    #[error("unknown value: {0}")]
    UnknownValue(String),

    #[error("unknown block: {0}")]
    UnknownBlock(String),

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// The SSA form of a method is broken. This is always a defect of the
    /// code that edited the graph, never a property of the input program.
    #[error("inconsistent SSA: {0}")]
    Inconsistent(String),
}
