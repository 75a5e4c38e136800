//! Randomized round-trip laws for the coder, the transforms and the
//! full pipeline.

use proptest::prelude::*;

use cabac_codec::cabac::binarization::{bounds, can_represent_signed};
use cabac_codec::cabac::{decode_symbols, encode_symbols};
use cabac_codec::config::{
    BinarizationId, Configuration, ContextSelectionId, SequenceTransformId,
    TransformedSequenceConfiguration,
};
use cabac_codec::pipeline::decode::decode_bytes;
use cabac_codec::pipeline::encode::encode_bytes;
use cabac_codec::transform;

fn context_modes() -> impl Strategy<Value = ContextSelectionId> {
    prop_oneof![
        Just(ContextSelectionId::Bypass),
        Just(ContextSelectionId::AdaptiveCodingOrder0),
        Just(ContextSelectionId::AdaptiveCodingOrder1),
        Just(ContextSelectionId::AdaptiveCodingOrder2),
    ]
}

proptest! {
    #[test]
    fn entropy_roundtrip_unsigned(
        symbols in prop::collection::vec(0u16..2000, 0..200),
        mode in context_modes(),
    ) {
        let symbols: Vec<i64> = symbols.into_iter().map(i64::from).collect();
        for (id, parameters) in [
            (BinarizationId::Bi, vec![11u32]),
            (BinarizationId::Eg, vec![]),
            (BinarizationId::Teg, vec![7]),
        ] {
            let bitstream = encode_symbols(&symbols, id, &parameters, mode, None).unwrap();
            let decoded = decode_symbols(&bitstream, id, &parameters, mode).unwrap();
            prop_assert_eq!(&decoded, &symbols);
        }
    }

    #[test]
    fn entropy_roundtrip_signed(
        symbols in prop::collection::vec(-2000i32..2000, 0..200),
        mode in context_modes(),
    ) {
        let symbols: Vec<i64> = symbols.into_iter().map(i64::from).collect();
        for (id, parameters) in [
            (BinarizationId::Seg, vec![]),
            (BinarizationId::Steg, vec![3u32]),
        ] {
            let bitstream = encode_symbols(&symbols, id, &parameters, mode, None).unwrap();
            let decoded = decode_symbols(&bitstream, id, &parameters, mode).unwrap();
            prop_assert_eq!(&decoded, &symbols);
        }
    }

    #[test]
    fn bypass_output_length_is_exact(symbols in prop::collection::vec(0u8..=255, 0..300)) {
        // Count plus n fixed-width values, rounded up to whole bytes.
        let symbols: Vec<i64> = symbols.into_iter().map(i64::from).collect();
        let bitstream = encode_symbols(
            &symbols,
            BinarizationId::Bi,
            &[8],
            ContextSelectionId::Bypass,
            None,
        )
        .unwrap();
        let bits = 32 + 8 * symbols.len();
        prop_assert_eq!(bitstream.len(), (bits + 7) / 8);
    }

    #[test]
    fn representable_iff_encodable(
        value in -40000i64..40000,
        parameter in 1u32..=32,
    ) {
        for id in [BinarizationId::Teg, BinarizationId::Steg, BinarizationId::Tu] {
            let representable = can_represent_signed(id, parameter, value, value);
            let encoded = encode_symbols(
                &[value],
                id,
                &[parameter],
                ContextSelectionId::Bypass,
                None,
            );
            prop_assert_eq!(representable, encoded.is_ok(), "{:?}({}) of {}", id, parameter, value);
            let (min, max) = bounds(id, parameter);
            prop_assert_eq!(representable, value >= min && value <= max);
        }
    }

    #[test]
    fn sequence_transforms_roundtrip(
        symbols in prop::collection::vec(0u64..50, 0..300),
        window in 1u64..64,
        guard in 1u64..16,
    ) {
        for (id, parameter) in [
            (SequenceTransformId::NoTransform, 0),
            (SequenceTransformId::EqualityCoding, 0),
            (SequenceTransformId::MatchCoding, window),
            (SequenceTransformId::RleCoding, guard),
        ] {
            let streams = transform::apply(id, parameter, symbols.clone()).unwrap();
            let rebuilt = transform::invert(id, parameter, streams).unwrap();
            prop_assert_eq!(&rebuilt, &symbols);
        }
    }

    #[test]
    fn lut_roundtrip(symbols in prop::collection::vec(0u64..40, 0..300), order in 0u8..=2) {
        let (ranks, table0, context_tables) =
            transform::lut::transform(&symbols, order).unwrap();
        let rebuilt = transform::lut::inverse(&ranks, order, &table0, &context_tables).unwrap();
        prop_assert_eq!(rebuilt, symbols);
    }

    #[test]
    fn pipeline_roundtrip_random_bytes(buffer in prop::collection::vec(any::<u8>(), 0..400)) {
        let config = Configuration {
            word_size: 1,
            sequence_transformation_id: SequenceTransformId::RleCoding,
            sequence_transformation_parameter: 255,
            transformed_sequence_configurations: vec![
                TransformedSequenceConfiguration {
                    lut_transformation_enabled: true,
                    lut_order: 1,
                    lut_bits: 8,
                    diff_coding_enabled: false,
                    binarization_id: BinarizationId::Bi,
                    binarization_parameters: vec![8],
                    context_selection_id: ContextSelectionId::AdaptiveCodingOrder1,
                },
                TransformedSequenceConfiguration {
                    lut_transformation_enabled: false,
                    lut_order: 0,
                    lut_bits: 0,
                    diff_coding_enabled: true,
                    binarization_id: BinarizationId::Steg,
                    binarization_parameters: vec![5],
                    context_selection_id: ContextSelectionId::AdaptiveCodingOrder2,
                },
            ],
        };
        let bytestream = encode_bytes(&config, &buffer).unwrap();
        prop_assert_eq!(decode_bytes(&config, &bytestream).unwrap(), buffer);
    }
}
