//! The forward pipeline: sequence transform, per-sub-stream LUT and diff
//! stages, entropy coding, framing.

use log::{debug, trace};

use crate::cabac::writer::encode_symbols;
use crate::config::{BinarizationId, Configuration, ContextSelectionId, TransformedSequenceConfiguration};
use crate::error::{CodecError, Result};
use crate::symbols::{self, bytes_to_symbols, to_signed};
use crate::transform::{self, lut};

use super::bytestream::append_blob;

/// Encodes a raw byte buffer under `config`.
pub fn encode_bytes(config: &Configuration, buffer: &[u8]) -> Result<Vec<u8>> {
    let stream = bytes_to_symbols(buffer, config.word_size)?;
    encode(config, stream)
}

/// Encodes a symbol stream under `config` into a framed bytestream.
pub fn encode(config: &Configuration, stream: Vec<u64>) -> Result<Vec<u8>> {
    config.validate()?;
    trace!("encoding sequence of length {}", stream.len());

    debug!(
        "performing sequence transformation {:?}",
        config.sequence_transformation_id
    );
    let streams = transform::apply(
        config.sequence_transformation_id,
        config.sequence_transformation_parameter,
        stream,
    )?;

    let mut bytestream = Vec::new();
    for (sub_config, sub_stream) in config
        .transformed_sequence_configurations
        .iter()
        .zip(streams)
    {
        encode_sub_stream(sub_config, sub_stream, &mut bytestream)?;
    }
    Ok(bytestream)
}

fn encode_sub_stream(
    config: &TransformedSequenceConfiguration,
    mut stream: Vec<u64>,
    bytestream: &mut Vec<u8>,
) -> Result<()> {
    if config.lut_transformation_enabled {
        let (ranks, table0, context_tables) = lut::transform(&stream, config.lut_order)?;
        trace!(
            "LUT transform enabled: {} ranks, {} table entries",
            ranks.len(),
            table0.len()
        );
        append_table(&table0, config.lut_bits, bytestream)?;
        if config.lut_order > 0 {
            append_table(&context_tables, lut::rank_bits(table0.len()), bytestream)?;
        }
        stream = ranks;
    }

    let signed_stream = if config.diff_coding_enabled {
        trace!("diff coding enabled");
        transform::diff::transform(&stream)?
    } else {
        to_signed(&stream)?
    };
    drop(stream);

    let bitstream = encode_symbols(
        &signed_stream,
        config.binarization_id,
        &config.binarization_parameters,
        config.context_selection_id,
        None,
    )?;
    trace!("bitstream size: {}", bitstream.len());
    append_blob(bytestream, &bitstream)
}

/// Entropy-codes a LUT table as fixed-width bypass values and frames it.
fn append_table(table: &[u64], bits: u32, bytestream: &mut Vec<u8>) -> Result<()> {
    if !(1..=32).contains(&bits) {
        return Err(CodecError::LutOverflow(format!(
            "table entries need {} bits, the fixed-length limit is 32",
            bits
        )));
    }
    for &entry in table {
        if bits < 64 && entry >= 1u64 << bits {
            return Err(CodecError::SymbolOutOfRange {
                symbol: entry.min(i64::MAX as u64) as i64,
                binarization: "BI",
                parameter: bits,
            });
        }
    }
    let bitstream = encode_symbols(
        &symbols::to_signed(table)?,
        BinarizationId::Bi,
        &[bits],
        ContextSelectionId::Bypass,
        None,
    )?;
    trace!("wrote LUT table bitstream of {} bytes", bitstream.len());
    append_blob(bytestream, &bitstream)
}
