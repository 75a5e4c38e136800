//! The configuration record driving encoding and decoding.
//!
//! A `Configuration` fixes every choice the pipeline makes: word size,
//! sequence transform and its parameter, and one per-sub-stream record for
//! the LUT/diff/binarization/context stages. It is constructed explicitly,
//! discovered by the analyzer, or parsed from JSON at the boundary, and is
//! never mutated on the encode/decode path.
//!
//! The bytestream itself carries no configuration; the JSON record is the
//! only way to decode it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::symbols::validate_word_size;
use crate::transform;

/// Sequence transform applied to the symbol stream before entropy coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceTransformId {
    NoTransform,
    EqualityCoding,
    MatchCoding,
    RleCoding,
}

/// Bijection between integer symbols and bin strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinarizationId {
    #[serde(rename = "BI")]
    Bi,
    #[serde(rename = "TU")]
    Tu,
    #[serde(rename = "EG")]
    Eg,
    #[serde(rename = "SEG")]
    Seg,
    #[serde(rename = "TEG")]
    Teg,
    #[serde(rename = "STEG")]
    Steg,
}

impl BinarizationId {
    /// Number of parameters the binarization takes.
    pub fn parameter_count(self) -> usize {
        match self {
            BinarizationId::Bi | BinarizationId::Tu | BinarizationId::Teg | BinarizationId::Steg => 1,
            BinarizationId::Eg | BinarizationId::Seg => 0,
        }
    }

    /// Whether the binarization covers negative symbols.
    pub fn is_signed(self) -> bool {
        matches!(self, BinarizationId::Seg | BinarizationId::Steg)
    }

    pub fn name(self) -> &'static str {
        match self {
            BinarizationId::Bi => "BI",
            BinarizationId::Tu => "TU",
            BinarizationId::Eg => "EG",
            BinarizationId::Seg => "SEG",
            BinarizationId::Teg => "TEG",
            BinarizationId::Steg => "STEG",
        }
    }
}

/// How context models are selected, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextSelectionId {
    #[serde(rename = "bypass")]
    Bypass,
    #[serde(rename = "adaptive_coding_order_0")]
    AdaptiveCodingOrder0,
    #[serde(rename = "adaptive_coding_order_1")]
    AdaptiveCodingOrder1,
    #[serde(rename = "adaptive_coding_order_2")]
    AdaptiveCodingOrder2,
}

/// Per-sub-stream coding choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedSequenceConfiguration {
    pub lut_transformation_enabled: bool,
    /// Number of preceding ranks keyed into the LUT context (0..=2).
    #[serde(default)]
    pub lut_order: u8,
    /// Bits per entry of the first LUT table; derived during analysis and
    /// required by the decoder.
    #[serde(default)]
    pub lut_bits: u32,
    pub diff_coding_enabled: bool,
    pub binarization_id: BinarizationId,
    pub binarization_parameters: Vec<u32>,
    pub context_selection_id: ContextSelectionId,
}

impl Default for TransformedSequenceConfiguration {
    fn default() -> Self {
        Self {
            lut_transformation_enabled: false,
            lut_order: 0,
            lut_bits: 0,
            diff_coding_enabled: false,
            binarization_id: BinarizationId::Bi,
            binarization_parameters: vec![8],
            context_selection_id: ContextSelectionId::Bypass,
        }
    }
}

/// Complete pipeline configuration for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub word_size: u8,
    pub sequence_transformation_id: SequenceTransformId,
    pub sequence_transformation_parameter: u64,
    pub transformed_sequence_configurations: Vec<TransformedSequenceConfiguration>,
}

impl Configuration {
    /// Parses a JSON configuration and checks its invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Configuration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to the JSON boundary format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every structural invariant a configuration must satisfy
    /// before it drives the pipeline.
    pub fn validate(&self) -> Result<()> {
        validate_word_size(self.word_size)?;
        transform::validate_parameter(
            self.sequence_transformation_id,
            self.sequence_transformation_parameter,
        )?;

        let expected = transform::stream_count(self.sequence_transformation_id);
        if self.transformed_sequence_configurations.len() != expected {
            return Err(CodecError::InvalidConfiguration(format!(
                "{:?} produces {} sub-streams but {} configurations were given",
                self.sequence_transformation_id,
                expected,
                self.transformed_sequence_configurations.len()
            )));
        }

        for (i, sub) in self.transformed_sequence_configurations.iter().enumerate() {
            sub.validate()
                .map_err(|e| match e {
                    CodecError::InvalidConfiguration(msg) => CodecError::InvalidConfiguration(
                        format!("sub-stream {}: {}", i, msg),
                    ),
                    other => other,
                })?;
        }
        Ok(())
    }
}

impl TransformedSequenceConfiguration {
    fn validate(&self) -> Result<()> {
        let expected = self.binarization_id.parameter_count();
        if self.binarization_parameters.len() != expected {
            return Err(CodecError::InvalidConfiguration(format!(
                "{} takes {} parameters, got {}",
                self.binarization_id.name(),
                expected,
                self.binarization_parameters.len()
            )));
        }
        if let Some(&param) = self.binarization_parameters.first() {
            if !(1..=32).contains(&param) {
                return Err(CodecError::InvalidConfiguration(format!(
                    "{} parameter {} outside [1, 32]",
                    self.binarization_id.name(),
                    param
                )));
            }
        }
        if self.binarization_id.is_signed() && !self.diff_coding_enabled {
            return Err(CodecError::InvalidConfiguration(format!(
                "{} requires diff coding to produce a signed stream",
                self.binarization_id.name()
            )));
        }
        if self.lut_order > 2 {
            return Err(CodecError::InvalidConfiguration(format!(
                "LUT order {} outside [0, 2]",
                self.lut_order
            )));
        }
        if self.lut_transformation_enabled && !(1..=32).contains(&self.lut_bits) {
            return Err(CodecError::InvalidConfiguration(format!(
                "LUT bits {} outside [1, 32]",
                self.lut_bits
            )));
        }
        Ok(())
    }
}

impl fmt::Display for TransformedSequenceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lut: {} (order {}, {} bits), diff: {}, binarization: {}{:?}, context: {:?}",
            self.lut_transformation_enabled,
            self.lut_order,
            self.lut_bits,
            self.diff_coding_enabled,
            self.binarization_id.name(),
            self.binarization_parameters,
            self.context_selection_id,
        )
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "word size: {}", self.word_size)?;
        writeln!(
            f,
            "sequence transformation: {:?} (parameter {})",
            self.sequence_transformation_id, self.sequence_transformation_parameter
        )?;
        for (i, sub) in self.transformed_sequence_configurations.iter().enumerate() {
            writeln!(f, "  stream {}: {}", i, sub)?;
        }
        Ok(())
    }
}
