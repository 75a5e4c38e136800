//! Look-up-table remapping.
//!
//! Order 0 ranks every symbol by frequency and replaces it with its rank,
//! which concentrates probability mass on small values. Higher orders add
//! a per-context refinement: the context is the previous one or two
//! order-0 ranks, and each context carries its own rank permutation.
//!
//! The forward transform emits the streams that must reach the decoder:
//! the rank stream, `table0` (symbol per rank) and, for order > 0, the
//! inverse context tables flattened into one stream.

use std::collections::HashMap;

use crate::cabac::binarization::bit_length;
use crate::error::{CodecError, Result};

/// Cap on the alphabet and on the order-k context table.
pub const MAX_TABLE_SIZE: usize = 1 << 20;

/// Bits per entry used to code `table0`, derived from its content.
pub fn value_bits(table0: &[u64]) -> u32 {
    bit_length(table0.iter().copied().max().unwrap_or(0))
}

/// Bits per entry used to code the context tables: enough for any rank.
pub fn rank_bits(alphabet_len: usize) -> u32 {
    if alphabet_len <= 1 {
        1
    } else {
        bit_length(alphabet_len as u64 - 1)
    }
}

fn context_table_size(alphabet_len: usize, order: u8) -> Result<usize> {
    let mut size = 1usize;
    for _ in 0..=order {
        size = size.checked_mul(alphabet_len).unwrap_or(usize::MAX);
        if size >= MAX_TABLE_SIZE {
            return Err(CodecError::LutOverflow(format!(
                "order-{} table over {} symbols exceeds the cap",
                order, alphabet_len
            )));
        }
    }
    Ok(size)
}

fn context_index(history: &[u64], alphabet_len: usize, last: u64) -> usize {
    let mut index = 0usize;
    for j in (1..history.len()).rev() {
        index = index * alphabet_len + history[j] as usize;
    }
    index * alphabet_len + last as usize
}

/// Forward transform: `(ranks, table0, inverse context tables)`.
/// The third stream is empty for order 0.
pub fn transform(symbols: &[u64], order: u8) -> Result<(Vec<u64>, Vec<u64>, Vec<u64>)> {
    debug_assert!(order <= 2);
    if symbols.is_empty() {
        return Ok((Vec::new(), Vec::new(), Vec::new()));
    }

    // Rank the alphabet by descending frequency, ties by value.
    let mut frequencies: HashMap<u64, u64> = HashMap::new();
    for &symbol in symbols {
        *frequencies.entry(symbol).or_insert(0) += 1;
        if frequencies.len() >= MAX_TABLE_SIZE {
            return Err(CodecError::LutOverflow(format!(
                "alphabet reached the cap of {} symbols",
                MAX_TABLE_SIZE
            )));
        }
    }
    let mut by_frequency: Vec<(u64, u64)> = frequencies.into_iter().collect();
    by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let table0: Vec<u64> = by_frequency.iter().map(|&(symbol, _)| symbol).collect();
    let rank_of: HashMap<u64, u64> = table0
        .iter()
        .enumerate()
        .map(|(rank, &symbol)| (symbol, rank as u64))
        .collect();

    if order == 0 {
        let ranks = symbols.iter().map(|s| rank_of[s]).collect();
        return Ok((ranks, table0, Vec::new()));
    }

    let alphabet_len = table0.len();
    let size = context_table_size(alphabet_len, order)?;

    // Count (context, rank) occurrences. Histories hold order-0 ranks,
    // most recent first, and start out all zero.
    let mut counts: Vec<(u64, u64)> = vec![(0, 0); size];
    let mut history = vec![0u64; order as usize + 1];
    for &symbol in symbols {
        for j in (1..history.len()).rev() {
            history[j] = history[j - 1];
        }
        history[0] = rank_of[&symbol];
        counts[context_index(&history, alphabet_len, history[0])].1 += 1;
    }

    // Per context: rank the order-0 ranks by in-context frequency. The
    // inverse table stores the order-0 rank per context rank, zero-filled
    // past the populated prefix; the forward table stores the context
    // rank per order-0 rank.
    let mut forward = Vec::with_capacity(size);
    let mut inverse_tables = Vec::with_capacity(size);
    for block in counts.chunks_mut(alphabet_len) {
        for (rank, entry) in block.iter_mut().enumerate() {
            entry.0 = rank as u64;
        }
        block.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut exhausted = false;
        for (context_rank, entry) in block.iter_mut().enumerate() {
            if entry.1 == 0 {
                exhausted = true;
            }
            inverse_tables.push(if exhausted { 0 } else { entry.0 });
            entry.1 = context_rank as u64;
        }
        block.sort_by(|a, b| a.0.cmp(&b.0));
        forward.extend(block.iter().map(|entry| entry.1));
    }

    // Remap the stream through the context tables.
    let mut ranks = Vec::with_capacity(symbols.len());
    history.iter_mut().for_each(|h| *h = 0);
    for &symbol in symbols {
        for j in (1..history.len()).rev() {
            history[j] = history[j - 1];
        }
        history[0] = rank_of[&symbol];
        ranks.push(forward[context_index(&history, alphabet_len, history[0])]);
    }

    Ok((ranks, table0, inverse_tables))
}

/// Inverse transform, mapping ranks back through the emitted tables.
pub fn inverse(ranks: &[u64], order: u8, table0: &[u64], inverse_tables: &[u64]) -> Result<Vec<u64>> {
    debug_assert!(order <= 2);
    let alphabet_len = table0.len();
    let lookup0 = |rank: u64| -> Result<u64> {
        table0.get(rank as usize).copied().ok_or_else(|| {
            CodecError::Truncated(format!("rank {} outside the {}-entry table", rank, alphabet_len))
        })
    };

    if order == 0 {
        return ranks.iter().map(|&r| lookup0(r)).collect();
    }

    let mut symbols = Vec::with_capacity(ranks.len());
    let mut history = vec![0u64; order as usize + 1];
    for &context_rank in ranks {
        for j in (1..history.len()).rev() {
            history[j] = history[j - 1];
        }
        let index = context_index(&history, alphabet_len, context_rank);
        let rank0 = *inverse_tables.get(index).ok_or_else(|| {
            CodecError::Truncated(format!("context index {} outside the context tables", index))
        })?;
        history[0] = rank0;
        symbols.push(lookup0(rank0)?);
    }
    Ok(symbols)
}
