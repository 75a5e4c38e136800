//! Conversion between byte buffers and integer symbol streams.
//!
//! Symbols are formed by little-endian grouping of the input bytes into
//! words of 1, 2, 4 or 8 bytes. The byte count must divide evenly.

use crate::error::{CodecError, Result};

/// Checks that `word_size` is one of the supported widths.
pub fn validate_word_size(word_size: u8) -> Result<()> {
    match word_size {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(CodecError::InvalidConfiguration(format!(
            "unsupported word size {}",
            word_size
        ))),
    }
}

/// Groups a byte buffer into a stream of `word_size`-byte symbols.
pub fn bytes_to_symbols(buffer: &[u8], word_size: u8) -> Result<Vec<u64>> {
    validate_word_size(word_size)?;
    let width = word_size as usize;
    if buffer.len() % width != 0 {
        return Err(CodecError::MisalignedInput {
            size: buffer.len(),
            word_size,
        });
    }
    let mut symbols = Vec::with_capacity(buffer.len() / width);
    for chunk in buffer.chunks_exact(width) {
        let mut value = 0u64;
        for (i, &byte) in chunk.iter().enumerate() {
            value |= (byte as u64) << (8 * i);
        }
        symbols.push(value);
    }
    Ok(symbols)
}

/// Serializes a symbol stream back into little-endian bytes.
/// Symbols wider than the word are masked down.
pub fn symbols_to_bytes(symbols: &[u64], word_size: u8) -> Result<Vec<u8>> {
    validate_word_size(word_size)?;
    let width = word_size as usize;
    let mut buffer = Vec::with_capacity(symbols.len() * width);
    for &symbol in symbols {
        for i in 0..width {
            buffer.push((symbol >> (8 * i)) as u8);
        }
    }
    Ok(buffer)
}

/// Reinterprets an unsigned stream as signed symbols, rejecting values the
/// signed domain cannot hold.
pub fn to_signed(symbols: &[u64]) -> Result<Vec<i64>> {
    symbols
        .iter()
        .map(|&s| {
            i64::try_from(s).map_err(|_| CodecError::SymbolOutOfRange {
                symbol: i64::MAX,
                binarization: "signed conversion",
                parameter: 0,
            })
        })
        .collect()
}

/// Reinterprets decoded signed symbols as unsigned, rejecting negatives.
pub fn to_unsigned(symbols: &[i64]) -> Result<Vec<u64>> {
    symbols
        .iter()
        .map(|&s| {
            u64::try_from(s).map_err(|_| {
                CodecError::Truncated(format!("negative symbol {} in unsigned stream", s))
            })
        })
        .collect()
}
