//! Error types for CAT encoding, validation and transactions

use thiserror::Error;

use crate::transport::ControlLine;

/// Errors raised while validating a command argument or decoding a field
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Argument is not a number
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// Frequency outside the radio's tunable range
    #[error("frequency {hz} Hz outside {min}..={max}")]
    FrequencyOutOfRange { hz: u64, min: u64, max: u64 },

    /// Numeric argument outside its allowed range
    #[error("{what} {value} outside {min}..={max}")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Value does not fit in the requested BCD width
    #[error("value {value} does not fit in {width} BCD digits")]
    BcdOverflow { value: u64, width: usize },

    /// Nibble greater than 9 in a BCD field
    #[error("invalid BCD digit: {0}")]
    InvalidBcd(u8),

    /// Unknown operating mode token
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Unknown VFO token
    #[error("invalid VFO: {0}")]
    InvalidVfo(String),

    /// Expected ON or OFF
    #[error("expected ON or OFF, got {0:?}")]
    InvalidOnOff(String),

    /// Unknown PTT method
    #[error("invalid PTT method: {0}")]
    InvalidPttMethod(String),

    /// Unknown tone mode, or a tone frequency the radio cannot generate
    #[error("invalid tone: {0}")]
    InvalidTone(String),

    /// Malformed hex byte in a raw passthrough command
    #[error("invalid hex byte: {0:?}")]
    InvalidHex(String),

    /// Argument of the wrong shape (length, characters)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid memory or bus address
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors raised by a [`Transport`](crate::transport::Transport)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes accepted than offered
    #[error("short write: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// DTR/RTS could not be changed
    #[error("cannot set {line}: {reason}")]
    ControlLine { line: ControlLine, reason: String },
}

/// Errors from a single CAT operation
///
/// Every variant collapses to `ERROR` at the command router boundary.
#[derive(Debug, Error)]
pub enum CatError {
    /// Write or read failed at the channel
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Fewer bytes arrived than the reply requires (timeout)
    #[error("incomplete reply: expected {expected} bytes, received {received}")]
    Incomplete { expected: usize, received: usize },

    /// CI-V reply not closed by the terminator byte
    #[error("reply not terminated")]
    Unterminated,

    /// Radio explicitly refused the command
    #[error("rejected by radio: {0}")]
    Rejected(String),

    /// Argument failed validation before anything was sent
    #[error("validation error: {0}")]
    Validation(#[from] ParseError),

    /// Reply does not match the expected shape
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// Operation not available on this radio
    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

/// Result type for CAT operations
pub type CatResult<T> = Result<T, CatError>;
