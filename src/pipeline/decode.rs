//! The inverse pipeline: deframing, entropy decoding, inverse diff and
//! LUT stages, inverse sequence transform.

use log::trace;

use crate::cabac::reader::decode_symbols;
use crate::config::{BinarizationId, Configuration, ContextSelectionId, TransformedSequenceConfiguration};
use crate::error::Result;
use crate::symbols::{symbols_to_bytes, to_unsigned};
use crate::transform::{self, lut};

use super::bytestream::BlobReader;

/// Decodes a framed bytestream back into the raw byte buffer.
pub fn decode_bytes(config: &Configuration, bytestream: &[u8]) -> Result<Vec<u8>> {
    let stream = decode(config, bytestream)?;
    symbols_to_bytes(&stream, config.word_size)
}

/// Decodes a framed bytestream back into the symbol stream.
pub fn decode(config: &Configuration, bytestream: &[u8]) -> Result<Vec<u64>> {
    config.validate()?;
    let mut reader = BlobReader::new(bytestream);

    let mut streams = Vec::with_capacity(config.transformed_sequence_configurations.len());
    for (i, sub_config) in config.transformed_sequence_configurations.iter().enumerate() {
        trace!("processing transformed sequence {}", i);
        streams.push(decode_sub_stream(sub_config, &mut reader)?);
    }

    let stream = transform::invert(
        config.sequence_transformation_id,
        config.sequence_transformation_parameter,
        streams,
    )?;
    trace!("decoded sequence of length {}", stream.len());
    Ok(stream)
}

fn decode_sub_stream(
    config: &TransformedSequenceConfiguration,
    reader: &mut BlobReader<'_>,
) -> Result<Vec<u64>> {
    let (table0, context_tables) = if config.lut_transformation_enabled {
        let table0 = read_table(reader, config.lut_bits)?;
        let context_tables = if config.lut_order > 0 {
            read_table(reader, lut::rank_bits(table0.len()))?
        } else {
            Vec::new()
        };
        (table0, context_tables)
    } else {
        (Vec::new(), Vec::new())
    };

    let bitstream = reader.next_blob()?;
    trace!("bitstream size: {}", bitstream.len());
    let signed_stream = decode_symbols(
        bitstream,
        config.binarization_id,
        &config.binarization_parameters,
        config.context_selection_id,
    )?;

    let stream = if config.diff_coding_enabled {
        transform::diff::inverse(&signed_stream)?
    } else {
        to_unsigned(&signed_stream)?
    };

    if config.lut_transformation_enabled {
        lut::inverse(&stream, config.lut_order, &table0, &context_tables)
    } else {
        Ok(stream)
    }
}

fn read_table(reader: &mut BlobReader<'_>, bits: u32) -> Result<Vec<u64>> {
    let bitstream = reader.next_blob()?;
    trace!("read LUT table bitstream of {} bytes", bitstream.len());
    let entries = decode_symbols(
        bitstream,
        BinarizationId::Bi,
        &[bits],
        ContextSelectionId::Bypass,
    )?;
    to_unsigned(&entries)
}
