//! Error kinds raised while loading, validating, decoding and generating.
use crate::shared::gene::GeneType;
use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed parameters or marginals source
    #[error("Invalid model format: {0}")]
    ModelFormat(String),

    /// Malformed or inconsistent anchor source
    #[error("Invalid anchor data for the {gene_type} genes: {message}")]
    GeneIdentifier { gene_type: GeneType, message: String },

    /// Cross-reference failures between segments and anchors, all of them
    #[error("Model validation failed ({} problem(s)):\n  {}", .0.len(), .0.iter().join("\n  "))]
    ModelValidation(Vec<String>),

    #[error(
        "Invalid realization for sequence {sequence_index} ({gene_type} gene): \
         expected \"(<index>)\", found \"{value}\""
    )]
    RealizationFormat {
        sequence_index: usize,
        gene_type: GeneType,
        value: String,
    },

    /// Generated table without the expected columns or with a bad index
    #[error("Invalid generated table: {0}")]
    TableFormat(String),

    #[error(
        "Sequence and realization tables do not match \
         (only in sequences: [{}], only in realizations: [{}], duplicated: [{}])",
        .sequences_only.iter().join(","),
        .realizations_only.iter().join(","),
        .duplicated.iter().join(",")
    )]
    AssemblyMismatch {
        sequences_only: Vec<usize>,
        realizations_only: Vec<usize>,
        duplicated: Vec<usize>,
    },

    #[error("Index {index} is out of range for the {gene_type} genes ({size} segments)")]
    IndexOutOfRange {
        gene_type: GeneType,
        index: usize,
        size: usize,
    },

    #[error("Model not ready for CDR3 generation: {0}")]
    ModelNotReady(String),

    /// Failure of the sampler, message kept verbatim
    #[error("Sequence generation failed: {0}")]
    Generation(String),

    #[error("An error occurred during execution of IGoR command (exit code {}):\n{stderr}",
            .exit_code.map_or("unknown".to_string(), |c| c.to_string()))]
    Simulator {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("IGoR executable '{0}' could not be found")]
    SimulatorNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn gene_identifier(gene_type: GeneType, message: impl Into<String>) -> Error {
        Error::GeneIdentifier {
            gene_type,
            message: message.into(),
        }
    }
}
