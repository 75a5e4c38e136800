//! Symbol-level CABAC decoding, the exact mirror of the writer.

use crate::config::{BinarizationId, ContextSelectionId};
use crate::error::{CodecError, Result};

use super::coder::BinaryArithmeticDecoder;
use super::context::{context_for_bi, context_for_eg, context_for_tu, ContextTable};
use super::writer::clamp_prior;

/// Bins scanned before an exp-Golomb prefix is declared corrupt; the
/// largest representable value needs 17.
const MAX_PREFIX_BINS: u32 = 32;

pub struct Reader<'a> {
    coder: BinaryArithmeticDecoder<'a>,
    contexts: ContextTable,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            coder: BinaryArithmeticDecoder::new(data),
            contexts: ContextTable::new(),
        }
    }

    /// Reads the 32-bit symbol count leading the block.
    pub fn start(&mut self) -> usize {
        self.coder.decode_bins_ep(32) as usize
    }

    pub fn read_bypass(&mut self, id: BinarizationId, parameters: &[u32]) -> Result<i64> {
        match id {
            BinarizationId::Bi => self.read_bi_bypass(parameters[0]),
            BinarizationId::Tu => self.read_tu_bypass(parameters[0]),
            BinarizationId::Eg => self.read_eg_bypass(),
            BinarizationId::Seg => Ok(unfold_signed(self.read_eg_bypass()?)),
            BinarizationId::Teg => self.read_teg_bypass(parameters[0]),
            BinarizationId::Steg => self.read_steg_bypass(parameters[0]),
        }
    }

    pub fn read_adaptive(
        &mut self,
        id: BinarizationId,
        parameters: &[u32],
        offset: u32,
    ) -> Result<i64> {
        match id {
            BinarizationId::Bi => self.read_bi_adaptive(parameters[0], offset),
            BinarizationId::Tu => self.read_tu_adaptive(parameters[0], offset),
            BinarizationId::Eg => self.read_eg_adaptive(offset),
            BinarizationId::Seg => Ok(unfold_signed(self.read_eg_adaptive(offset)?)),
            BinarizationId::Teg => self.read_teg_adaptive(parameters[0], offset),
            BinarizationId::Steg => self.read_steg_adaptive(parameters[0], offset),
        }
    }

    fn read_bi_bypass(&mut self, length: u32) -> Result<i64> {
        Ok(self.coder.decode_bins_ep(length) as i64)
    }

    fn read_bi_adaptive(&mut self, length: u32, offset: u32) -> Result<i64> {
        let mut value = 0i64;
        for i in 0..length {
            let bin = self
                .coder
                .decode_bin(self.contexts.get_mut(context_for_bi(offset, i)));
            value = (value << 1) | (bin as i64);
        }
        Ok(value)
    }

    fn read_tu_bypass(&mut self, c_max: u32) -> Result<i64> {
        let mut value = 0u32;
        while value < c_max && self.coder.decode_bin_ep() {
            value += 1;
        }
        Ok(i64::from(value))
    }

    fn read_tu_adaptive(&mut self, c_max: u32, offset: u32) -> Result<i64> {
        let mut value = 0u32;
        while value < c_max {
            let bin = self
                .coder
                .decode_bin(self.contexts.get_mut(context_for_tu(offset, value)));
            if !bin {
                break;
            }
            value += 1;
        }
        Ok(i64::from(value))
    }

    fn read_eg_bypass(&mut self) -> Result<i64> {
        let mut prefix_len = 0u32;
        while !self.coder.decode_bin_ep() {
            prefix_len += 1;
            if prefix_len > MAX_PREFIX_BINS {
                return Err(CodecError::Truncated(
                    "exp-Golomb prefix exceeds any representable value".into(),
                ));
            }
        }
        Ok(self.eg_suffix(prefix_len))
    }

    fn read_eg_adaptive(&mut self, offset: u32) -> Result<i64> {
        let mut prefix_len = 0u32;
        loop {
            let bin = self
                .coder
                .decode_bin(self.contexts.get_mut(context_for_eg(offset, prefix_len)));
            if bin {
                break;
            }
            prefix_len += 1;
            if prefix_len > MAX_PREFIX_BINS {
                return Err(CodecError::Truncated(
                    "exp-Golomb prefix exceeds any representable value".into(),
                ));
            }
        }
        Ok(self.eg_suffix(prefix_len))
    }

    fn eg_suffix(&mut self, prefix_len: u32) -> i64 {
        if prefix_len == 0 {
            return 0;
        }
        let suffix = self.coder.decode_bins_ep(prefix_len);
        ((1u64 << prefix_len) + suffix - 1) as i64
    }

    fn read_teg_bypass(&mut self, param: u32) -> Result<i64> {
        let head = self.read_tu_bypass(param)?;
        if head == i64::from(param) {
            Ok(head + self.read_eg_bypass()?)
        } else {
            Ok(head)
        }
    }

    fn read_teg_adaptive(&mut self, param: u32, offset: u32) -> Result<i64> {
        let head = self.read_tu_adaptive(param, offset)?;
        if head == i64::from(param) {
            Ok(head + self.read_eg_adaptive(offset)?)
        } else {
            Ok(head)
        }
    }

    fn read_steg_bypass(&mut self, param: u32) -> Result<i64> {
        let magnitude = self.read_teg_bypass(param)?;
        if magnitude == 0 {
            return Ok(0);
        }
        Ok(if self.coder.decode_bin_ep() { -magnitude } else { magnitude })
    }

    fn read_steg_adaptive(&mut self, param: u32, offset: u32) -> Result<i64> {
        let magnitude = self.read_teg_adaptive(param, offset)?;
        if magnitude == 0 {
            return Ok(0);
        }
        let negative = self
            .coder
            .decode_bin(self.contexts.get_mut(context_for_bi(offset, 0)));
        Ok(if negative { -magnitude } else { magnitude })
    }
}

/// Inverse of the signed fold: 0, 1, 2, 3, 4, ... become 0, 1, -1, 2, -2.
fn unfold_signed(value: i64) -> i64 {
    if value % 2 == 1 {
        (value + 1) / 2
    } else {
        -(value / 2)
    }
}

/// Decodes a standalone entropy-coded block back into symbols.
pub fn decode_symbols(
    bitstream: &[u8],
    id: BinarizationId,
    parameters: &[u32],
    context_selection: ContextSelectionId,
) -> Result<Vec<i64>> {
    if parameters.len() < id.parameter_count() {
        return Err(CodecError::InvalidConfiguration(format!(
            "{} takes {} parameters, got {}",
            id.name(),
            id.parameter_count(),
            parameters.len()
        )));
    }

    let mut reader = Reader::new(bitstream);
    let count = reader.start();
    let mut symbols = Vec::with_capacity(count.min(1 << 20));

    let mut prev = 0u32;
    let mut prev_prev = 0u32;
    for _ in 0..count {
        let symbol = match context_selection {
            ContextSelectionId::Bypass => reader.read_bypass(id, parameters)?,
            ContextSelectionId::AdaptiveCodingOrder0 => reader.read_adaptive(id, parameters, 0)?,
            ContextSelectionId::AdaptiveCodingOrder1 => {
                let s = reader.read_adaptive(id, parameters, prev << 2)?;
                prev = clamp_prior(s);
                s
            }
            ContextSelectionId::AdaptiveCodingOrder2 => {
                let s = reader.read_adaptive(id, parameters, (prev << 2) | prev_prev)?;
                prev_prev = prev;
                prev = clamp_prior(s);
                s
            }
        };
        symbols.push(symbol);
    }

    Ok(symbols)
}
