//! Differential coding. The output is signed; symbols above `i64::MAX`
//! cannot be diffed and are rejected rather than wrapped.

use crate::error::{CodecError, Result};

pub fn transform(symbols: &[u64]) -> Result<Vec<i64>> {
    let mut deltas = Vec::with_capacity(symbols.len());
    let mut previous = 0i64;
    for &symbol in symbols {
        let value = i64::try_from(symbol).map_err(|_| CodecError::SymbolOutOfRange {
            symbol: i64::MAX,
            binarization: "diff",
            parameter: 0,
        })?;
        deltas.push(value - previous);
        previous = value;
    }
    Ok(deltas)
}

pub fn inverse(deltas: &[i64]) -> Result<Vec<u64>> {
    let mut symbols = Vec::with_capacity(deltas.len());
    let mut previous = 0i64;
    for &delta in deltas {
        let value = previous.checked_add(delta).ok_or_else(|| {
            CodecError::Truncated("diff accumulation overflows the symbol domain".into())
        })?;
        if value < 0 {
            return Err(CodecError::Truncated(
                "diff accumulation yields a negative symbol".into(),
            ));
        }
        symbols.push(value as u64);
        previous = value;
    }
    Ok(symbols)
}
