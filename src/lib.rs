//! # CABAC stream codec
//!
//! A context-adaptive binary arithmetic coding engine for streams of
//! integer symbols, together with the pre-coding transforms that make it
//! effective and an exhaustive search over the resulting configuration
//! space.
//!
//! The library is organized into several modules:
//! - `bitio`: bit-granular reading and writing over byte buffers
//! - `cabac`: the arithmetic coder, context models and binarizations
//! - `transform`: equality, match, run-length, LUT and diff transforms
//! - `config`: the configuration record and its JSON boundary format
//! - `pipeline`: framed encoding and decoding under a configuration
//! - `analysis`: the minimum-size configuration search
//!
//! Encoding groups the input bytes into fixed-width words, runs the
//! configured sequence transform, optionally remaps and diffs each
//! sub-stream, entropy-codes everything and frames the resulting blobs
//! with little-endian length prefixes. The configuration is never stored
//! in the bytestream; decoding requires the same record that produced it.

// Re-export commonly used types at the crate root
pub use analysis::{analyze, CandidateConfig};
pub use config::{
    BinarizationId, Configuration, ContextSelectionId, SequenceTransformId,
    TransformedSequenceConfiguration,
};
pub use error::{CodecError, Result};
pub use pipeline::decode::{decode, decode_bytes};
pub use pipeline::encode::{encode, encode_bytes};

pub mod analysis;
pub mod bitio;
pub mod config;
pub mod error;
pub mod symbols;

pub mod cabac {
    pub mod binarization;
    pub mod coder;
    pub mod context;
    pub mod reader;
    pub mod tables;
    pub mod writer;

    pub use reader::decode_symbols;
    pub use writer::encode_symbols;
}

pub mod transform {
    pub mod diff;
    pub mod equality;
    pub mod lut;
    pub mod matching;
    pub mod rle;

    mod dispatch;
    pub use dispatch::{
        apply, fix_word_sizes, invert, stream_count, sub_stream_word_sizes, validate_parameter,
    };
}

pub mod pipeline {
    pub mod bytestream;
    pub mod decode;
    pub mod encode;
}
