//! Dispatch over the sequence transforms.
//!
//! Each transform is described by its sub-stream layout and reached
//! through a match on the identifier; there is no trait object behind
//! this, the set is closed.

use crate::config::SequenceTransformId;
use crate::error::{CodecError, Result};

use super::{equality, matching, rle};

/// Number of sub-streams the transform emits.
pub fn stream_count(id: SequenceTransformId) -> usize {
    match id {
        SequenceTransformId::NoTransform => 1,
        SequenceTransformId::EqualityCoding => 2,
        SequenceTransformId::MatchCoding => 3,
        SequenceTransformId::RleCoding => 2,
    }
}

/// Nominal word size per sub-stream; zero means "the configured one".
pub fn sub_stream_word_sizes(id: SequenceTransformId) -> &'static [u8] {
    match id {
        SequenceTransformId::NoTransform => &[0],
        SequenceTransformId::EqualityCoding => &[1, 0],
        SequenceTransformId::MatchCoding => &[4, 4, 0],
        SequenceTransformId::RleCoding => &[0, 4],
    }
}

/// Resolves the zero entries of [`sub_stream_word_sizes`].
pub fn fix_word_sizes(id: SequenceTransformId, configured: u8) -> Vec<u8> {
    sub_stream_word_sizes(id)
        .iter()
        .map(|&w| if w == 0 { configured } else { w })
        .collect()
}

/// Checks the transform parameter.
pub fn validate_parameter(id: SequenceTransformId, parameter: u64) -> Result<()> {
    match id {
        SequenceTransformId::NoTransform | SequenceTransformId::EqualityCoding => {
            if parameter != 0 {
                return Err(CodecError::InvalidConfiguration(format!(
                    "{:?} takes no parameter, got {}",
                    id, parameter
                )));
            }
        }
        SequenceTransformId::MatchCoding => {}
        SequenceTransformId::RleCoding => {
            if parameter == 0 {
                return Err(CodecError::InvalidConfiguration(
                    "run-length guard must be at least 1".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Applies the forward transform, consuming the input stream.
pub fn apply(id: SequenceTransformId, parameter: u64, symbols: Vec<u64>) -> Result<Vec<Vec<u64>>> {
    validate_parameter(id, parameter)?;
    Ok(match id {
        SequenceTransformId::NoTransform => vec![symbols],
        SequenceTransformId::EqualityCoding => {
            let (flags, values) = equality::transform(&symbols);
            vec![flags, values]
        }
        SequenceTransformId::MatchCoding => {
            let (distances, lengths, literals) = matching::transform(&symbols, parameter);
            vec![distances, lengths, literals]
        }
        SequenceTransformId::RleCoding => {
            let (values, runs) = rle::transform(&symbols, parameter);
            vec![values, runs]
        }
    })
}

/// Applies the inverse transform, reassembling the symbol stream.
pub fn invert(
    id: SequenceTransformId,
    parameter: u64,
    mut streams: Vec<Vec<u64>>,
) -> Result<Vec<u64>> {
    validate_parameter(id, parameter)?;
    if streams.len() != stream_count(id) {
        return Err(CodecError::Truncated(format!(
            "{:?} expects {} sub-streams, got {}",
            id,
            stream_count(id),
            streams.len()
        )));
    }
    match id {
        SequenceTransformId::NoTransform => Ok(streams.swap_remove(0)),
        SequenceTransformId::EqualityCoding => equality::inverse(&streams[0], &streams[1]),
        SequenceTransformId::MatchCoding => {
            matching::inverse(&streams[0], &streams[1], &streams[2])
        }
        SequenceTransformId::RleCoding => rle::inverse(&streams[0], &streams[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_every_transform() {
        let symbols: Vec<u64> = vec![5, 5, 5, 1, 2, 2, 9, 9, 9, 9, 0, 5, 5];
        let cases = [
            (SequenceTransformId::NoTransform, 0u64),
            (SequenceTransformId::EqualityCoding, 0),
            (SequenceTransformId::MatchCoding, 8),
            (SequenceTransformId::RleCoding, 3),
        ];
        for &(id, parameter) in &cases {
            let streams = apply(id, parameter, symbols.clone()).unwrap();
            assert_eq!(streams.len(), stream_count(id), "{:?}", id);
            assert_eq!(invert(id, parameter, streams).unwrap(), symbols, "{:?}", id);
        }
    }

    #[test]
    fn test_parameter_validation() {
        assert!(validate_parameter(SequenceTransformId::NoTransform, 1).is_err());
        assert!(validate_parameter(SequenceTransformId::RleCoding, 0).is_err());
        assert!(validate_parameter(SequenceTransformId::RleCoding, 255).is_ok());
        assert!(validate_parameter(SequenceTransformId::MatchCoding, 0).is_ok());
    }

    #[test]
    fn test_word_size_resolution() {
        assert_eq!(
            fix_word_sizes(SequenceTransformId::MatchCoding, 2),
            vec![4, 4, 2]
        );
        assert_eq!(fix_word_sizes(SequenceTransformId::NoTransform, 8), vec![8]);
    }
}
