//! End-to-end tests over the full pipeline and the configuration search.

use cabac_codec::analysis::{analyze, CandidateConfig};
use cabac_codec::cabac::encode_symbols;
use cabac_codec::config::{
    BinarizationId, Configuration, ContextSelectionId, SequenceTransformId,
    TransformedSequenceConfiguration,
};
use cabac_codec::pipeline::decode::decode_bytes;
use cabac_codec::pipeline::encode::encode_bytes;
use cabac_codec::symbols::to_signed;
use cabac_codec::transform::{diff, lut};

fn bypass_bi8_config() -> Configuration {
    Configuration {
        word_size: 1,
        sequence_transformation_id: SequenceTransformId::NoTransform,
        sequence_transformation_parameter: 0,
        transformed_sequence_configurations: vec![TransformedSequenceConfiguration {
            lut_transformation_enabled: false,
            lut_order: 0,
            lut_bits: 0,
            diff_coding_enabled: false,
            binarization_id: BinarizationId::Bi,
            binarization_parameters: vec![8],
            context_selection_id: ContextSelectionId::Bypass,
        }],
    }
}

#[test]
fn test_empty_input_bytestream() {
    let config = bypass_bi8_config();
    let bytestream = encode_bytes(&config, &[]).unwrap();
    // One framed blob of four bytes holding the 32-bit count zero.
    assert_eq!(bytestream, vec![0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_single_byte_bytestream() {
    let config = bypass_bi8_config();
    let bytestream = encode_bytes(&config, &[0x2A]).unwrap();
    // Count one, then the byte itself, all as plain bits.
    assert_eq!(
        bytestream,
        vec![0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x2A]
    );
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), vec![0x2A]);
}

#[test]
fn test_analyzer_beats_baseline_on_runs() {
    let input = vec![0x05u8; 4096];
    let baseline = encode_bytes(&bypass_bi8_config(), &input).unwrap();

    let (config, size) = analyze(&input, &CandidateConfig::default()).unwrap();
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    assert!(size < baseline.len());
    assert!(size < input.len() / 16);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}

#[test]
fn test_analyzer_beats_baseline_on_alternating_pairs() {
    let input: Vec<u8> = [7u8, 7, 8, 8].iter().cycle().take(1024).copied().collect();
    let baseline = encode_bytes(&bypass_bi8_config(), &input).unwrap();

    let (config, size) = analyze(&input, &CandidateConfig::default()).unwrap();
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    assert!(size < baseline.len());
    assert!(size < input.len() / 8);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}

#[test]
fn test_analyzer_compresses_monotone_input() {
    let input: Vec<u8> = (1..=255).collect();
    let baseline = encode_bytes(&bypass_bi8_config(), &input).unwrap();

    let mut candidates = CandidateConfig::default();
    candidates.word_sizes = vec![1];
    let (config, size) = analyze(&input, &candidates).unwrap();
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    // The all-ones delta stream is far cheaper than any direct coding.
    assert!(size < baseline.len());
    assert!(size < input.len() / 2);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}

#[test]
fn test_analyzer_roundtrip_on_mixed_input() {
    let mut input = Vec::new();
    for i in 0u32..700 {
        input.push((i * 31 % 11) as u8);
        if i % 17 == 0 {
            input.extend_from_slice(&[9, 9, 9, 9]);
        }
    }
    let (config, size) = analyze(&input, &CandidateConfig::default()).unwrap();
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}

#[test]
fn test_analyzer_roundtrip_on_seeded_random_bytes() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let input: Vec<u8> = (0..600).map(|_| rng.gen_range(0u8..32)).collect();
    let (config, size) = analyze(&input, &CandidateConfig::default()).unwrap();
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}

#[test]
fn test_discovered_configuration_survives_json() {
    let input: Vec<u8> = (0..512u32).map(|i| (i % 5) as u8).collect();
    let (config, _) = analyze(&input, &CandidateConfig::default()).unwrap();

    let json = config.to_json().unwrap();
    let parsed = Configuration::from_json(&json).unwrap();
    assert_eq!(parsed, config);

    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(decode_bytes(&parsed, &bytestream).unwrap(), input);
}

#[test]
fn test_misaligned_word_sizes_are_skipped_not_fatal() {
    // Nine bytes: word size 4 does not divide, word size 1 does.
    let input = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9];
    let (config, _) = analyze(&input, &CandidateConfig::default()).unwrap();
    assert_eq!(config.word_size, 1);
}

/// Cost of one entropy blob including its frame prefix, or `None` when
/// the candidate cannot encode the stream.
fn entropy_cost(
    stream: &[i64],
    binarization_id: BinarizationId,
    parameters: &[u32],
    mode: ContextSelectionId,
) -> Option<usize> {
    encode_symbols(stream, binarization_id, parameters, mode, None)
        .ok()
        .map(|blob| 4 + blob.len())
}

/// Unpruned reference: the cheapest coding of one sub-stream, trying the
/// same candidates the search tries, with BI and TU parameters derived
/// from the data the entropy coder actually sees.
fn min_cost_for_stream(stream: &[u64], candidates: &CandidateConfig) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut merge = |cost: Option<usize>| {
        if let Some(c) = cost {
            best = Some(best.map_or(c, |b| b.min(c)));
        }
    };

    let mut lut_choices = vec![(false, 0u8)];
    for &order in &candidates.lut_orders {
        lut_choices.push((true, order));
    }

    for &(lut_enabled, lut_order) in &lut_choices {
        let (data, table_cost) = if lut_enabled {
            let Ok((ranks, table0, context_tables)) = lut::transform(stream, lut_order) else {
                continue;
            };
            let bits = lut::value_bits(&table0);
            if bits > 32 {
                continue;
            }
            let Some(mut cost) = entropy_cost(
                &to_signed(&table0).unwrap(),
                BinarizationId::Bi,
                &[bits],
                ContextSelectionId::Bypass,
            ) else {
                continue;
            };
            if lut_order > 0 {
                match entropy_cost(
                    &to_signed(&context_tables).unwrap(),
                    BinarizationId::Bi,
                    &[lut::rank_bits(table0.len())],
                    ContextSelectionId::Bypass,
                ) {
                    Some(c) => cost += c,
                    None => continue,
                }
            }
            (ranks, cost)
        } else {
            (stream.to_vec(), 0)
        };

        for &diff_enabled in &candidates.diff_enabled {
            let signed: Vec<i64> = if diff_enabled {
                match diff::transform(&data) {
                    Ok(deltas) => deltas,
                    Err(_) => continue,
                }
            } else {
                match to_signed(&data) {
                    Ok(s) => s,
                    Err(_) => continue,
                }
            };
            let unsigned_max = if diff_enabled {
                signed.iter().map(|&d| d as u64).max().unwrap_or(0)
            } else {
                data.iter().copied().max().unwrap_or(0)
            };
            let binarizations = if diff_enabled {
                &candidates.signed_binarizations
            } else {
                &candidates.unsigned_binarizations
            };
            for &binarization_id in binarizations {
                let parameter_sets: Vec<Vec<u32>> = match binarization_id {
                    BinarizationId::Bi => {
                        vec![vec![(64 - unsigned_max.leading_zeros()).clamp(1, 32)]]
                    }
                    BinarizationId::Tu => vec![vec![unsigned_max.clamp(1, 32) as u32]],
                    BinarizationId::Eg | BinarizationId::Seg => vec![Vec::new()],
                    BinarizationId::Teg | BinarizationId::Steg => candidates
                        .binarization_parameters
                        .iter()
                        .map(|&p| vec![p])
                        .collect(),
                };
                for parameters in parameter_sets {
                    for &mode in &candidates.context_selections {
                        merge(
                            entropy_cost(&signed, binarization_id, &parameters, mode)
                                .map(|c| table_cost + c),
                        );
                    }
                }
            }
        }
    }
    best
}

#[test]
fn test_search_matches_exhaustive_enumeration() {
    let input = vec![5u8, 5, 5, 5, 5, 5, 5, 5, 1, 2, 5, 5];
    let candidates = CandidateConfig {
        word_sizes: vec![1],
        sequence_transforms: vec![
            SequenceTransformId::NoTransform,
            SequenceTransformId::RleCoding,
        ],
        match_window_sizes: vec![],
        rle_guards: vec![3, 255],
        lut_orders: vec![0, 1],
        binarization_parameters: vec![1, 2],
        ..CandidateConfig::default()
    };

    // Unpruned reference: minimize every sub-stream independently, sum,
    // take the smallest transform branch.
    let symbols: Vec<u64> = input.iter().map(|&b| u64::from(b)).collect();
    let mut reference_best = usize::MAX;
    let mut branches: Vec<(SequenceTransformId, u64)> = vec![(SequenceTransformId::NoTransform, 0)];
    for &guard in &candidates.rle_guards {
        branches.push((SequenceTransformId::RleCoding, guard));
    }
    for (transform_id, parameter) in branches {
        let streams =
            cabac_codec::transform::apply(transform_id, parameter, symbols.clone()).unwrap();
        let mut total = 0usize;
        let mut feasible = true;
        for stream in &streams {
            match min_cost_for_stream(stream, &candidates) {
                Some(cost) => total += cost,
                None => {
                    feasible = false;
                    break;
                }
            }
        }
        if feasible {
            reference_best = reference_best.min(total);
        }
    }

    let (config, size) = analyze(&input, &candidates).unwrap();
    assert_eq!(size, reference_best);

    // The winner must also actually encode to the reported size and
    // round-trip.
    let bytestream = encode_bytes(&config, &input).unwrap();
    assert_eq!(bytestream.len(), size);
    assert_eq!(decode_bytes(&config, &bytestream).unwrap(), input);
}
