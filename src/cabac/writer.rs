//! Symbol-level CABAC encoding.
//!
//! A `Writer` owns the arithmetic coder and a fresh context bank, writes
//! the 32-bit symbol count, and then codes each symbol through the
//! configured binarization, either fully bypass or with adaptive context
//! models selected from the previous one or two symbol magnitudes.

use crate::config::{BinarizationId, ContextSelectionId};
use crate::error::{CodecError, Result};

use super::binarization::{bit_length, check_symbol};
use super::coder::BinaryArithmeticEncoder;
use super::context::{context_for_bi, context_for_eg, context_for_tu, ContextTable};

pub struct Writer {
    coder: BinaryArithmeticEncoder,
    contexts: ContextTable,
}

impl Writer {
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self {
            coder: BinaryArithmeticEncoder::new(max_bytes),
            contexts: ContextTable::new(),
        }
    }

    /// Writes the 32-bit symbol count that leads every coded block.
    pub fn start(&mut self, num_symbols: usize) -> Result<()> {
        let count = u32::try_from(num_symbols).map_err(|_| {
            CodecError::InvalidConfiguration(format!(
                "stream of {} symbols exceeds the 32-bit count",
                num_symbols
            ))
        })?;
        self.coder.encode_bins_ep(u64::from(count), 32);
        Ok(())
    }

    /// Fails once the emitted byte count exceeds the size budget.
    pub fn check_budget(&self) -> Result<()> {
        self.coder.check_budget()
    }

    pub fn finish(self) -> Vec<u8> {
        self.coder.finish()
    }

    /// Codes `symbol` without any context model.
    pub fn write_bypass(
        &mut self,
        symbol: i64,
        id: BinarizationId,
        parameters: &[u32],
    ) -> Result<()> {
        match id {
            BinarizationId::Bi => self.write_bi_bypass(symbol, parameters[0]),
            BinarizationId::Tu => self.write_tu_bypass(symbol, parameters[0]),
            BinarizationId::Eg => self.write_eg_bypass(symbol),
            BinarizationId::Seg => self.write_seg_bypass(symbol),
            BinarizationId::Teg => self.write_teg_bypass(symbol, parameters[0]),
            BinarizationId::Steg => self.write_steg_bypass(symbol, parameters[0]),
        }
    }

    /// Codes `symbol` with context models picked by `offset`.
    pub fn write_adaptive(
        &mut self,
        symbol: i64,
        id: BinarizationId,
        parameters: &[u32],
        offset: u32,
    ) -> Result<()> {
        match id {
            BinarizationId::Bi => self.write_bi_adaptive(symbol, parameters[0], offset),
            BinarizationId::Tu => self.write_tu_adaptive(symbol, parameters[0], offset),
            BinarizationId::Eg => self.write_eg_adaptive(symbol, offset),
            BinarizationId::Seg => self.write_seg_adaptive(symbol, offset),
            BinarizationId::Teg => self.write_teg_adaptive(symbol, parameters[0], offset),
            BinarizationId::Steg => self.write_steg_adaptive(symbol, parameters[0], offset),
        }
    }

    fn write_bi_bypass(&mut self, symbol: i64, length: u32) -> Result<()> {
        check_symbol(BinarizationId::Bi, length, symbol)?;
        self.coder.encode_bins_ep(symbol as u64, length);
        Ok(())
    }

    fn write_bi_adaptive(&mut self, symbol: i64, length: u32, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Bi, length, symbol)?;
        for i in 0..length {
            let bin = (symbol as u64 >> (length - i - 1)) & 1 == 1;
            self.coder
                .encode_bin(bin, self.contexts.get_mut(context_for_bi(offset, i)));
        }
        Ok(())
    }

    fn write_tu_bypass(&mut self, symbol: i64, c_max: u32) -> Result<()> {
        check_symbol(BinarizationId::Tu, c_max, symbol)?;
        for _ in 0..symbol {
            self.coder.encode_bin_ep(true);
        }
        if symbol < i64::from(c_max) {
            self.coder.encode_bin_ep(false);
        }
        Ok(())
    }

    fn write_tu_adaptive(&mut self, symbol: i64, c_max: u32, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Tu, c_max, symbol)?;
        for i in 0..symbol as u32 {
            self.coder
                .encode_bin(true, self.contexts.get_mut(context_for_tu(offset, i)));
        }
        if symbol < i64::from(c_max) {
            self.coder.encode_bin(
                false,
                self.contexts.get_mut(context_for_tu(offset, symbol as u32)),
            );
        }
        Ok(())
    }

    fn write_eg_bypass(&mut self, symbol: i64) -> Result<()> {
        check_symbol(BinarizationId::Eg, 0, symbol)?;
        let value = symbol as u64 + 1;
        let prefix_len = bit_length(value) - 1;
        self.coder.encode_bins_ep(value, 2 * prefix_len + 1);
        Ok(())
    }

    fn write_eg_adaptive(&mut self, symbol: i64, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Eg, 0, symbol)?;
        let value = symbol as u64 + 1;
        let prefix_len = bit_length(value) - 1;
        for i in 0..prefix_len {
            self.coder
                .encode_bin(false, self.contexts.get_mut(context_for_eg(offset, i)));
        }
        self.coder
            .encode_bin(true, self.contexts.get_mut(context_for_eg(offset, prefix_len)));
        if prefix_len > 0 {
            self.coder
                .encode_bins_ep(value - (1 << prefix_len), prefix_len);
        }
        Ok(())
    }

    fn write_seg_bypass(&mut self, symbol: i64) -> Result<()> {
        check_symbol(BinarizationId::Seg, 0, symbol)?;
        self.write_eg_bypass(fold_signed(symbol))
    }

    fn write_seg_adaptive(&mut self, symbol: i64, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Seg, 0, symbol)?;
        self.write_eg_adaptive(fold_signed(symbol), offset)
    }

    fn write_teg_bypass(&mut self, symbol: i64, param: u32) -> Result<()> {
        check_symbol(BinarizationId::Teg, param, symbol)?;
        if symbol < i64::from(param) {
            self.write_tu_bypass(symbol, param)
        } else {
            self.write_tu_bypass(i64::from(param), param)?;
            self.write_eg_bypass(symbol - i64::from(param))
        }
    }

    fn write_teg_adaptive(&mut self, symbol: i64, param: u32, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Teg, param, symbol)?;
        if symbol < i64::from(param) {
            self.write_tu_adaptive(symbol, param, offset)
        } else {
            self.write_tu_adaptive(i64::from(param), param, offset)?;
            self.write_eg_adaptive(symbol - i64::from(param), offset)
        }
    }

    fn write_steg_bypass(&mut self, symbol: i64, param: u32) -> Result<()> {
        check_symbol(BinarizationId::Steg, param, symbol)?;
        self.write_teg_bypass(symbol.abs(), param)?;
        if symbol != 0 {
            self.coder.encode_bin_ep(symbol < 0);
        }
        Ok(())
    }

    fn write_steg_adaptive(&mut self, symbol: i64, param: u32, offset: u32) -> Result<()> {
        check_symbol(BinarizationId::Steg, param, symbol)?;
        self.write_teg_adaptive(symbol.abs(), param, offset)?;
        if symbol != 0 {
            self.coder.encode_bin(
                symbol < 0,
                self.contexts.get_mut(context_for_bi(offset, 0)),
            );
        }
        Ok(())
    }
}

/// Maps a signed value onto the non-negative exp-Golomb domain:
/// 0, 1, -1, 2, -2, ... become 0, 1, 2, 3, 4, ...
fn fold_signed(symbol: i64) -> i64 {
    if symbol <= 0 {
        -symbol * 2
    } else {
        symbol * 2 - 1
    }
}

/// Updated prior for the adaptive context offset: the symbol magnitude
/// saturated to 3.
pub(crate) fn clamp_prior(symbol: i64) -> u32 {
    symbol.unsigned_abs().min(3) as u32
}

/// Entropy-codes a symbol stream into a standalone block.
///
/// With `max_bytes` set, encoding aborts with `SizeBudgetExceeded` as soon
/// as the output grows past the budget; the configuration search uses this
/// to discard hopeless candidates early.
pub fn encode_symbols(
    symbols: &[i64],
    id: BinarizationId,
    parameters: &[u32],
    context_selection: ContextSelectionId,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>> {
    if parameters.len() < id.parameter_count() {
        return Err(CodecError::InvalidConfiguration(format!(
            "{} takes {} parameters, got {}",
            id.name(),
            id.parameter_count(),
            parameters.len()
        )));
    }

    let mut writer = Writer::new(max_bytes);
    writer.start(symbols.len())?;

    let mut prev = 0u32;
    let mut prev_prev = 0u32;
    for &symbol in symbols {
        match context_selection {
            ContextSelectionId::Bypass => {
                writer.write_bypass(symbol, id, parameters)?;
            }
            ContextSelectionId::AdaptiveCodingOrder0 => {
                writer.write_adaptive(symbol, id, parameters, 0)?;
            }
            ContextSelectionId::AdaptiveCodingOrder1 => {
                writer.write_adaptive(symbol, id, parameters, prev << 2)?;
                prev = clamp_prior(symbol);
            }
            ContextSelectionId::AdaptiveCodingOrder2 => {
                writer.write_adaptive(symbol, id, parameters, (prev << 2) | prev_prev)?;
                prev_prev = prev;
                prev = clamp_prior(symbol);
            }
        }
        writer.check_budget()?;
    }

    Ok(writer.finish())
}
