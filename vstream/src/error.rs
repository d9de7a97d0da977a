//! Error types

use thiserror::Error;

/// Everything that can go wrong while moving syntax elements in or out of a
/// bitstream.
///
/// None of these are recoverable for the syntax element in flight. Callers
/// are expected to abandon the enclosing unit and, when decoding, may use
/// `Bitstream::search_start_code` to resume at the next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of bitstream")]
    EndOfStream,

    #[error("invalid codeword: {0}")]
    InvalidCodeword(&'static str),

    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    #[error("bitstream desynchronized: {0}")]
    Desync(&'static str),

    /// The caller asked for something its own syntax tree contradicts, such as
    /// encoding a field with a value other than the one it must be inferred
    /// to hold.
    #[error("contract violation: {0}")]
    ContractViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
