//! Match coding: a greedy windowed longest-match factorization.
//!
//! Every position either copies `length` symbols from `distance` back or
//! passes one literal through. A zero in the lengths stream marks the
//! literal path; matches shorter than two symbols are not worth a
//! (distance, length) pair and fall back to literals.

use crate::error::{CodecError, Result};

const MIN_MATCH_LEN: usize = 2;

/// Forward transform, producing `(distances, lengths, literals)`.
pub fn transform(symbols: &[u64], window_size: u64) -> (Vec<u64>, Vec<u64>, Vec<u64>) {
    let mut distances = Vec::new();
    let mut lengths = Vec::new();
    let mut literals = Vec::new();

    let window = window_size as usize;
    let mut i = 0;
    while i < symbols.len() {
        let start = i.saturating_sub(window);
        let mut best_len = 0usize;
        let mut best_dist = 0usize;
        for candidate in start..i {
            let mut len = 0;
            while i + len < symbols.len() && symbols[candidate + len] == symbols[i + len] {
                len += 1;
            }
            if len > best_len {
                best_len = len;
                best_dist = i - candidate;
            }
        }
        if best_len < MIN_MATCH_LEN {
            lengths.push(0);
            literals.push(symbols[i]);
            i += 1;
        } else {
            distances.push(best_dist as u64);
            lengths.push(best_len as u64);
            i += best_len;
        }
    }
    (distances, lengths, literals)
}

/// Inverse transform, replaying matches and literals.
pub fn inverse(distances: &[u64], lengths: &[u64], literals: &[u64]) -> Result<Vec<u64>> {
    let mut symbols = Vec::new();
    let mut next_distance = distances.iter();
    let mut next_literal = literals.iter();
    for &length in lengths {
        if length == 0 {
            let &literal = next_literal.next().ok_or_else(|| {
                CodecError::Truncated("match literals exhausted before lengths".into())
            })?;
            symbols.push(literal);
        } else {
            let &distance = next_distance.next().ok_or_else(|| {
                CodecError::Truncated("match distances exhausted before lengths".into())
            })?;
            let distance = distance as usize;
            if distance == 0 || distance > symbols.len() {
                return Err(CodecError::Truncated(format!(
                    "match distance {} outside the {} decoded symbols",
                    distance,
                    symbols.len()
                )));
            }
            let from = symbols.len() - distance;
            // Copies may overlap their own output.
            for k in 0..length as usize {
                let value = symbols[from + k];
                symbols.push(value);
            }
        }
    }
    Ok(symbols)
}
