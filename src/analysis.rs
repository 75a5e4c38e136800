//! Exhaustive configuration search.
//!
//! Enumerates every legal combination of word size, sequence transform,
//! transform parameter, LUT stage, diff stage, binarization and context
//! mode, measuring the encoded size at each leaf and keeping the smallest.
//! Two running minima bound the work: the best total so far and the best
//! for the sub-stream under consideration. Every leaf encoder runs with a
//! byte budget derived from them and aborts the moment it can no longer
//! win, which is what keeps the search tractable.
//!
//! Intermediate streams live on an explicit snapshot stack: entering a
//! transformation pushes a copy of the top entry, applies the transform
//! there, and pops on the way out, so memory stays proportional to the
//! nesting depth instead of the number of branches.

use std::mem;

use log::{debug, info, trace, warn};

use crate::cabac::binarization::{bit_length, can_represent_signed, can_represent_unsigned};
use crate::cabac::writer::encode_symbols;
use crate::config::{
    BinarizationId, Configuration, ContextSelectionId, SequenceTransformId,
    TransformedSequenceConfiguration,
};
use crate::error::{CodecError, Result};
use crate::symbols::{bytes_to_symbols, to_signed};
use crate::transform::{self, lut};

/// Length prefix cost of one framed blob.
const FRAME_OVERHEAD: usize = 4;

/// Candidate values for every choice point of the search.
#[derive(Debug, Clone)]
pub struct CandidateConfig {
    pub word_sizes: Vec<u8>,
    pub sequence_transforms: Vec<SequenceTransformId>,
    pub match_window_sizes: Vec<u64>,
    pub rle_guards: Vec<u64>,
    pub lut_enabled: Vec<bool>,
    pub lut_orders: Vec<u8>,
    pub diff_enabled: Vec<bool>,
    pub unsigned_binarizations: Vec<BinarizationId>,
    pub signed_binarizations: Vec<BinarizationId>,
    /// Searched parameters for the truncated exp-Golomb variants; BI and
    /// TU parameters are derived from the data instead.
    pub binarization_parameters: Vec<u32>,
    pub context_selections: Vec<ContextSelectionId>,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            word_sizes: vec![1, 4],
            sequence_transforms: vec![
                SequenceTransformId::NoTransform,
                SequenceTransformId::EqualityCoding,
                SequenceTransformId::MatchCoding,
                SequenceTransformId::RleCoding,
            ],
            match_window_sizes: vec![32, 256],
            rle_guards: vec![255],
            lut_enabled: vec![false, true],
            lut_orders: vec![0, 1, 2],
            diff_enabled: vec![false, true],
            unsigned_binarizations: vec![
                BinarizationId::Bi,
                BinarizationId::Tu,
                BinarizationId::Eg,
                BinarizationId::Teg,
            ],
            signed_binarizations: vec![BinarizationId::Seg, BinarizationId::Steg],
            binarization_parameters: vec![1, 2, 3, 5, 7, 9, 15, 30],
            context_selections: vec![
                ContextSelectionId::Bypass,
                ContextSelectionId::AdaptiveCodingOrder0,
                ContextSelectionId::AdaptiveCodingOrder1,
                ContextSelectionId::AdaptiveCodingOrder2,
            ],
        }
    }
}

struct SearchState {
    current: Configuration,
    best: Option<Configuration>,
    best_total_size: usize,
    current_total_size: usize,
    best_sub: Option<TransformedSequenceConfiguration>,
    best_sub_size: usize,
    current_sub_size: usize,
    stream_index: usize,
    stack: Vec<Vec<Vec<u64>>>,
}

impl SearchState {
    fn push(&mut self) {
        let top = self.stack[self.stack.len() - 1].clone();
        self.stack.push(top);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    fn top(&mut self) -> &mut Vec<Vec<u64>> {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn sub(&self) -> &TransformedSequenceConfiguration {
        &self.current.transformed_sequence_configurations[self.stream_index]
    }

    fn sub_mut(&mut self) -> &mut TransformedSequenceConfiguration {
        &mut self.current.transformed_sequence_configurations[self.stream_index]
    }
}

/// Searches the candidate space for the configuration that encodes
/// `input` into the fewest bytes. Returns it with the winning size.
pub fn analyze(input: &[u8], candidates: &CandidateConfig) -> Result<(Configuration, usize)> {
    let mut state = SearchState {
        current: Configuration {
            word_size: 1,
            sequence_transformation_id: SequenceTransformId::NoTransform,
            sequence_transformation_parameter: 0,
            transformed_sequence_configurations: Vec::new(),
        },
        best: None,
        best_total_size: usize::MAX,
        current_total_size: 0,
        best_sub: None,
        best_sub_size: usize::MAX,
        current_sub_size: 0,
        stream_index: 0,
        stack: Vec::new(),
    };

    for &word_size in &candidates.word_sizes {
        info!("word size {}...", word_size);
        let stream = match bytes_to_symbols(input, word_size) {
            Ok(stream) => stream,
            Err(CodecError::MisalignedInput { size, word_size }) => {
                warn!(
                    "input size {} is not a multiple of word size {}, skipping word size",
                    size, word_size
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        state.current.word_size = word_size;
        state.stack.push(vec![stream]);
        search_sequence_transforms(candidates, &mut state)?;
        state.pop();
    }

    let best_total_size = state.best_total_size;
    let best = state.best.ok_or_else(|| {
        CodecError::InvalidConfiguration("no candidate configuration can encode this input".into())
    })?;
    info!("best configuration compresses to {} bytes", best_total_size);
    Ok((best, best_total_size))
}

fn search_sequence_transforms(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    for &transform_id in &candidates.sequence_transforms {
        info!("transformation {:?}...", transform_id);
        state.current.sequence_transformation_id = transform_id;
        state.current.transformed_sequence_configurations =
            vec![TransformedSequenceConfiguration::default(); transform::stream_count(transform_id)];
        search_transform_parameters(candidates, state)?;
    }
    Ok(())
}

fn search_transform_parameters(
    candidates: &CandidateConfig,
    state: &mut SearchState,
) -> Result<()> {
    let default_parameters = [0u64];
    let parameters: &[u64] = match state.current.sequence_transformation_id {
        SequenceTransformId::MatchCoding => &candidates.match_window_sizes,
        SequenceTransformId::RleCoding => &candidates.rle_guards,
        _ => &default_parameters,
    };

    for &parameter in parameters {
        state.push();
        state.current.sequence_transformation_parameter = parameter;

        let input_stream = mem::take(&mut state.top()[0]);
        let streams = match transform::apply(
            state.current.sequence_transformation_id,
            parameter,
            input_stream,
        ) {
            Ok(streams) => streams,
            Err(e) => {
                debug!("skipping transform parameter {}: {}", parameter, e);
                state.pop();
                continue;
            }
        };
        *state.top() = streams;
        state.current_total_size = 0;

        let stream_count = state.top().len();
        let mut abandoned = false;
        for i in 0..stream_count {
            state.push();
            state.top().swap(0, i);
            state.top().truncate(1);

            info!("stream {}...", i);
            state.stream_index = i;
            state.best_sub = None;
            state.best_sub_size = usize::MAX;
            search_lut(candidates, state)?;

            match state.best_sub.take() {
                Some(sub) => state.current.transformed_sequence_configurations[i] = sub,
                None => {
                    debug!(
                        "found no valid configuration for stream {} of transformation {:?} \
                         at word size {}, skipping",
                        i, state.current.sequence_transformation_id, state.current.word_size
                    );
                    state.pop();
                    abandoned = true;
                    break;
                }
            }

            state.current_total_size = state.current_total_size.saturating_add(state.best_sub_size);
            if state.current_total_size >= state.best_total_size {
                trace!("abandoning, bytestream already larger than the best");
                state.pop();
                abandoned = true;
                break;
            }
            state.pop();
        }

        if !abandoned && state.current_total_size < state.best_total_size {
            debug!(
                "found configuration compressing to {} bytes",
                state.current_total_size
            );
            state.best_total_size = state.current_total_size;
            state.best = Some(state.current.clone());
        }
        state.pop();
    }
    Ok(())
}

fn search_lut(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    for &enabled in &candidates.lut_enabled {
        state.sub_mut().lut_transformation_enabled = enabled;
        state.current_sub_size = 0;
        if enabled {
            search_lut_orders(candidates, state)?;
        } else {
            state.sub_mut().lut_order = 0;
            state.sub_mut().lut_bits = 0;
            search_diff(candidates, state)?;
        }
    }
    Ok(())
}

fn search_lut_orders(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    for &order in &candidates.lut_orders {
        state.sub_mut().lut_order = order;
        state.push();

        let (ranks, table0, context_tables) = match lut::transform(&state.top()[0], order) {
            Ok(result) => result,
            Err(e) if e.is_recoverable() => {
                trace!("skipping LUT order {}: {}", order, e);
                state.pop();
                continue;
            }
            Err(e) => {
                state.pop();
                return Err(e);
            }
        };
        state.top()[0] = ranks;

        let table_bits = lut::value_bits(&table0);
        if table_bits > 32 {
            trace!("skipping LUT, table entries exceed 32 bits");
            state.pop();
            continue;
        }

        // The coded tables burden every candidate below this node.
        state.current_sub_size = 0;
        let table_stream = match to_signed(&table0) {
            Ok(stream) => stream,
            Err(_) => {
                state.pop();
                continue;
            }
        };
        let table_blob = encode_symbols(
            &table_stream,
            BinarizationId::Bi,
            &[table_bits],
            ContextSelectionId::Bypass,
            None,
        )?;
        state.current_sub_size += FRAME_OVERHEAD + table_blob.len();

        if order > 0 {
            let context_blob = encode_symbols(
                &to_signed(&context_tables)?,
                BinarizationId::Bi,
                &[lut::rank_bits(table0.len())],
                ContextSelectionId::Bypass,
                None,
            )?;
            state.current_sub_size += FRAME_OVERHEAD + context_blob.len();
        }

        state.sub_mut().lut_bits = table_bits;
        search_diff(candidates, state)?;
        state.pop();
    }
    Ok(())
}

fn search_diff(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    for &enabled in &candidates.diff_enabled {
        state.sub_mut().diff_coding_enabled = enabled;
        if enabled {
            state.push();
            match transform::diff::transform(&state.top()[0]) {
                Ok(deltas) => {
                    // Stored as raw bit patterns; the leaf reinterprets.
                    state.top()[0] = deltas.iter().map(|&d| d as u64).collect();
                }
                Err(e) if e.is_recoverable() => {
                    trace!("skipping diff coding: {}", e);
                    state.pop();
                    continue;
                }
                Err(e) => {
                    state.pop();
                    return Err(e);
                }
            }
            search_binarizations(candidates, state)?;
            state.pop();
        } else {
            search_binarizations(candidates, state)?;
        }
    }
    Ok(())
}

fn search_binarizations(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    let binarizations = if state.sub().diff_coding_enabled {
        &candidates.signed_binarizations
    } else {
        &candidates.unsigned_binarizations
    };
    for &binarization_id in binarizations {
        state.sub_mut().binarization_id = binarization_id;
        search_binarization_parameters(candidates, state)?;
    }
    Ok(())
}

fn search_binarization_parameters(
    candidates: &CandidateConfig,
    state: &mut SearchState,
) -> Result<()> {
    let (unsigned_max, signed_min, signed_max) = min_max(&state.top()[0]);
    let signed = state.sub().diff_coding_enabled;
    let binarization_id = state.sub().binarization_id;

    let parameter_sets: Vec<Vec<u32>> = match binarization_id {
        BinarizationId::Bi => vec![vec![bit_length(unsigned_max).min(32)]],
        BinarizationId::Tu => vec![vec![unsigned_max.clamp(1, 32) as u32]],
        BinarizationId::Eg | BinarizationId::Seg => vec![Vec::new()],
        BinarizationId::Teg | BinarizationId::Steg => candidates
            .binarization_parameters
            .iter()
            .map(|&p| vec![p])
            .collect(),
    };

    for parameters in parameter_sets {
        let parameter = parameters.first().copied().unwrap_or(0);
        let representable = if signed {
            can_represent_signed(binarization_id, parameter, signed_min, signed_max)
        } else {
            can_represent_unsigned(binarization_id, parameter, unsigned_max)
        };
        if !representable {
            continue;
        }
        state.sub_mut().binarization_parameters = parameters;
        search_context_modes(candidates, state)?;
    }
    Ok(())
}

fn search_context_modes(candidates: &CandidateConfig, state: &mut SearchState) -> Result<()> {
    // One conversion serves every context mode below.
    let signed = state.sub().diff_coding_enabled;
    let stream: Vec<i64> = if signed {
        state.top()[0].iter().map(|&v| v as i64).collect()
    } else {
        match to_signed(&state.top()[0]) {
            Ok(stream) => stream,
            Err(_) => {
                trace!("skipping binarization, stream exceeds the signed domain");
                return Ok(());
            }
        }
    };

    for &mode in &candidates.context_selections {
        state.sub_mut().context_selection_id = mode;

        let budget = state
            .best_sub_size
            .saturating_sub(state.current_sub_size)
            .min(state.best_total_size.saturating_sub(state.current_total_size))
            .saturating_sub(FRAME_OVERHEAD);
        if budget == 0 {
            trace!("no byte budget left for this candidate");
            continue;
        }

        let sub = state.sub();
        match encode_symbols(
            &stream,
            sub.binarization_id,
            &sub.binarization_parameters,
            mode,
            Some(budget),
        ) {
            Ok(bitstream) => {
                let candidate_size = state.current_sub_size + FRAME_OVERHEAD + bitstream.len();
                if candidate_size < state.best_sub_size {
                    state.best_sub_size = candidate_size;
                    state.best_sub = Some(state.sub().clone());
                }
            }
            Err(e) if e.is_recoverable() => {
                trace!("skipping candidate: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Extremes of a stream under both its unsigned and signed readings.
fn min_max(stream: &[u64]) -> (u64, i64, i64) {
    if stream.is_empty() {
        return (0, 0, 0);
    }
    let mut unsigned_max = 0u64;
    let mut signed_min = i64::MAX;
    let mut signed_max = i64::MIN;
    for &value in stream {
        unsigned_max = unsigned_max.max(value);
        signed_min = signed_min.min(value as i64);
        signed_max = signed_max.max(value as i64);
    }
    (unsigned_max, signed_min, signed_max)
}
