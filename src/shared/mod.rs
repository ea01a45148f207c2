//! Shared functionalities between VDJ and VJ
pub mod anchors;
pub mod catalog;
pub mod config;
pub mod distributions;
pub mod errors;
pub mod gene;
pub mod io;
pub mod model;
pub mod parser;
pub mod sampler;
pub mod sequence;

pub use anchors::{AnchorEntry, AnchorTable};
pub use catalog::{ModelBundle, ModelCatalog, RecordModel};
pub use config::PipelineConfig;
pub use errors::{Error, Result};
pub use gene::{Functionality, GeneType, GenomicSegment, GenomicSegmentTable};
pub use model::{ChainType, ModelSources, RecombinationModel, Topology};
pub use sampler::{MarginalSampler, SampledCdr3, Sampler};
pub use sequence::{translate, AminoAcid, Dna};
