#![warn(clippy::large_types_passed_by_value)]

pub mod generate;
pub mod shared;
pub mod vdj;
pub mod vj;

pub use crate::generate::{
    generate_cdr3, generate_full_length, merge, Cdr3Generator, DecodedRealizationRow, ModelSpec,
    RawRealizationRow, RealizationDecoder, SequenceRecord, SequenceRow,
};
pub use crate::shared::{
    AnchorTable, ChainType, Dna, Error, GeneType, GenomicSegment, GenomicSegmentTable,
    MarginalSampler, ModelSources, PipelineConfig, RecombinationModel, Result, SampledCdr3,
    Sampler, Topology,
};
