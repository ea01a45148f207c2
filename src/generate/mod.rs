//! Decoding, assembly and orchestration of sequence generation

pub mod assembler;
pub mod cdr3;
pub mod decoder;
pub mod igor;
pub mod pipeline;

// Re-exporting for public API
pub use self::assembler::{merge, SequenceRecord, SequenceRow};
pub use self::cdr3::Cdr3Generator;
pub use self::decoder::{DecodedRealizationRow, RawRealizationRow, RealizationDecoder};
pub use self::igor::{IgorCommand, IgorInterface};
pub use self::pipeline::{generate_cdr3, generate_full_length, ModelSpec};
