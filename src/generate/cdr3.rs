//! CDR3-only generation from a validated model
use crate::generate::assembler::SequenceRecord;
use crate::shared::errors::{Error, Result};
use crate::shared::gene::GeneType;
use crate::shared::model::RecombinationModel;
use crate::shared::sampler::{MarginalSampler, Sampler};
use std::collections::BTreeMap;

/// Gene types annotated on the CDR3 records
pub const CDR3_GENE_TYPES: [GeneType; 2] = [GeneType::V, GeneType::J];

fn generation_error(error: anyhow::Error) -> Error {
    Error::Generation(format!("{:#}", error))
}

pub struct Cdr3Generator<'a> {
    model: &'a RecombinationModel,
}

impl<'a> Cdr3Generator<'a> {
    /// The model must be initialized and have anchors for both V and J genes
    pub fn new(model: &'a RecombinationModel) -> Result<Cdr3Generator<'a>> {
        if !model.is_initialized() {
            return Err(Error::ModelNotReady("the model is not initialized".to_string()));
        }
        let missing: Vec<String> = CDR3_GENE_TYPES
            .iter()
            .filter(|&&g| model.anchors(g).is_none())
            .map(|g| g.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::ModelNotReady(format!(
                "no CDR3 anchors for the {} genes",
                missing.join(" and ")
            )));
        }
        Ok(Cdr3Generator { model })
    }

    /// Sample `count` productive CDR3s with the marginals of the model
    pub fn generate(&self, count: usize, seed: Option<u64>) -> Result<Vec<SequenceRecord>> {
        let mut sampler = MarginalSampler::new(self.model, seed).map_err(generation_error)?;
        self.generate_with(&mut sampler, count)
    }

    /// Same as `generate`, with any sampler. Either exactly `count` records
    /// are returned or an error.
    pub fn generate_with<S: Sampler>(&self, sampler: &mut S, count: usize) -> Result<Vec<SequenceRecord>> {
        if count == 0 {
            return Err(Error::Generation(
                "the number of sequences to generate must be at least 1".to_string(),
            ));
        }
        let sampled = sampler.sample(count).map_err(generation_error)?;
        if sampled.len() != count {
            return Err(Error::Generation(format!(
                "{} sequences requested, the sampler returned {}",
                count,
                sampled.len()
            )));
        }

        let records: Vec<SequenceRecord> = sampled
            .into_iter()
            .enumerate()
            .map(|(sequence_index, cdr3)| SequenceRecord {
                sequence_index,
                amino_acid_sequence: cdr3.nucleotide.translate().to_string(),
                nucleotide_sequence: cdr3.nucleotide.to_string(),
                gene_names: BTreeMap::from([(GeneType::V, cdr3.v_gene), (GeneType::J, cdr3.j_gene)]),
            })
            .collect();
        log::info!("Generated {} CDR3 sequences", records.len());
        Ok(records)
    }
}
