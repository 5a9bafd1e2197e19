//! Errors raised while running a program. Every one of them is fatal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A read or remove asked for more elements than the stack holds.
    #[error("not enough elements in stack: needed {needed}, have {depth}")]
    StackUnderflow { needed: usize, depth: usize },

    /// An operand of the wrong kind, a domain error, or a serial command before `uinit`.
    #[error("operation error for {command} command: {reason}")]
    TypeOperation {
        command: &'static str,
        reason: String,
    },

    /// Unknown command or too many tokens on a line.
    #[error("bad command syntax in '{text}'")]
    Syntax { text: String },

    #[error("cannot parse '{token}': {reason}")]
    Parse { token: String, reason: String },

    /// Register offset or jump target outside its range.
    #[error("index {offset} out of range 0..{len}")]
    Index { offset: i64, len: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn type_op(command: &'static str, reason: impl Into<String>) -> Self {
        Error::TypeOperation {
            command,
            reason: reason.into(),
        }
    }
}

/// A fatal error together with the line that raised it.
#[derive(Debug, Error)]
#[error("line {line} ('{text}'): {error}")]
pub struct Fault {
    /// Zero-based cursor of the failing line.
    pub line: usize,
    pub text: String,
    pub error: Error,
}
