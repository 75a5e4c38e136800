use std::io;
use thiserror::Error;

/// Main error type for the codec library.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A configuration violates its invariants.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Input byte count does not divide into whole words.
    #[error("input size {size} is not divisible by word size {word_size}")]
    MisalignedInput { size: usize, word_size: u8 },

    /// A symbol cannot be represented by the selected binarization.
    #[error("symbol {symbol} is not representable by {binarization} with parameter {parameter}")]
    SymbolOutOfRange {
        symbol: i64,
        binarization: &'static str,
        parameter: u32,
    },

    /// An encoder with a size budget would have exceeded it.
    ///
    /// Raised only during configuration search; it marks the candidate as
    /// hopeless rather than signalling corrupt data.
    #[error("bitstream exceeded the size budget of {max_bytes} bytes")]
    SizeBudgetExceeded { max_bytes: usize },

    /// A lookup-table transform would exceed the table size cap.
    #[error("lookup table overflow: {0}")]
    LutOverflow(String),

    /// The decoder ran past the end of the bytestream or replayed
    /// references to data that does not exist.
    #[error("truncated bytestream: {0}")]
    Truncated(String),

    /// The configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error from an underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// True for errors the configuration search recovers from by skipping
    /// the current candidate. Everything else propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CodecError::SymbolOutOfRange { .. }
                | CodecError::SizeBudgetExceeded { .. }
                | CodecError::LutOverflow(_)
        )
    }
}

/// A specialized `Result` type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CodecError::MisalignedInput { size: 7, word_size: 4 }.to_string(),
            "input size 7 is not divisible by word size 4"
        );
        assert_eq!(
            CodecError::SizeBudgetExceeded { max_bytes: 16 }.to_string(),
            "bitstream exceeded the size budget of 16 bytes"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(CodecError::SizeBudgetExceeded { max_bytes: 1 }.is_recoverable());
        assert!(CodecError::LutOverflow("cap".into()).is_recoverable());
        assert!(!CodecError::Truncated("eof".into()).is_recoverable());
    }
}
