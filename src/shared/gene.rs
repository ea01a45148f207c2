//! Deal with V/D/J gene types and the ordered segment tables of a model
use crate::shared::errors::{Error, Result};
use crate::shared::parser::{EventType, ParserParams};
use crate::shared::sequence::Dna;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three recombining segment categories. The ordering (V < D < J) is the
/// order in which gene types are emitted everywhere in the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeneType {
    V,
    D,
    J,
}

impl GeneType {
    /// Name of the gene choice event target in the IGoR files ("V_gene", ...)
    pub fn igor_target(&self) -> &'static str {
        match self {
            GeneType::V => "V_gene",
            GeneType::D => "D_gene",
            GeneType::J => "J_gene",
        }
    }

    pub fn from_igor_target(target: &str) -> Option<GeneType> {
        match target {
            "V_gene" => Some(GeneType::V),
            "D_gene" => Some(GeneType::D),
            "J_gene" => Some(GeneType::J),
            _ => None,
        }
    }

    /// Column name used in the output tables
    pub fn column_name(&self) -> &'static str {
        match self {
            GeneType::V => "gene_choice_v",
            GeneType::D => "gene_choice_d",
            GeneType::J => "gene_choice_j",
        }
    }
}

impl fmt::Display for GeneType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            GeneType::V => "V",
            GeneType::D => "D",
            GeneType::J => "J",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for GeneType {
    type Err = Error;

    fn from_str(s: &str) -> Result<GeneType> {
        match s.trim().to_ascii_uppercase().as_str() {
            "V" => Ok(GeneType::V),
            "D" => Ok(GeneType::D),
            "J" => Ok(GeneType::J),
            _ => Err(Error::ModelFormat(format!(
                "Invalid gene type {} (only V, D, J are allowed)",
                s
            ))),
        }
    }
}

/// Annotated biological status of a segment, not interpreted by the core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Functionality {
    Functional,
    Pseudogene,
    Orf,
}

impl Functionality {
    /// Parse the IMGT-like functionality strings found in anchor files:
    /// "F", "(F)", "[F]", "P", "ORF"...
    pub fn parse(s: &str) -> Option<Functionality> {
        let stripped = s.trim().trim_matches(|c| matches!(c, '(' | ')' | '[' | ']'));
        match stripped.to_ascii_uppercase().as_str() {
            "F" => Some(Functionality::Functional),
            "P" => Some(Functionality::Pseudogene),
            "ORF" => Some(Functionality::Orf),
            _ => None,
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicSegment {
    pub name: String,
    // only known once an anchor file described the segment
    pub functionality: Option<Functionality>,
    // position in the table, that's what the simulator encodes in its realizations
    pub index: usize,
    pub seq: Dna,
}

impl GenomicSegment {
    /// Germline sequence extended with the reverse complement of its first
    /// `lenleft` and last `lenright` nucleotides (palindromic insertions)
    pub fn with_palindromic_ends(&self, lenleft: usize, lenright: usize) -> Dna {
        let lenleft = lenleft.min(self.seq.len());
        let lenright = lenright.min(self.seq.len());
        let mut seqpal = self.seq.extract_subsequence(0, lenleft).reverse_complement();
        seqpal.extend(&self.seq);
        seqpal.extend(
            &self
                .seq
                .extract_subsequence(self.seq.len() - lenright, self.seq.len())
                .reverse_complement(),
        );
        seqpal
    }
}

/// Ordered segments of one gene type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomicSegmentTable {
    pub gene_type: GeneType,
    segments: Vec<GenomicSegment>,
}

impl GenomicSegmentTable {
    pub fn new(gene_type: GeneType, segments: Vec<GenomicSegment>) -> GenomicSegmentTable {
        GenomicSegmentTable {
            gene_type,
            segments,
        }
    }

    /// Extract the `gene_type` segments from a parsed parameters file
    pub fn load(params: &ParserParams, gene_type: GeneType) -> Result<GenomicSegmentTable> {
        let nickname = params.gene_choice_nickname(gene_type).ok_or_else(|| {
            Error::ModelFormat(format!(
                "No gene choice event for the {} genes in the model parameters",
                gene_type
            ))
        })?;
        match params.params.get(nickname) {
            Some(EventType::Genes(segments)) => {
                Ok(GenomicSegmentTable::new(gene_type, segments.clone()))
            }
            _ => Err(Error::ModelFormat(format!(
                "Event {} does not contain {} genes",
                nickname, gene_type
            ))),
        }
    }

    pub fn get(&self, index: usize) -> Option<&GenomicSegment> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenomicSegment> {
        self.segments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GenomicSegment> {
        self.segments.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.name.clone()).collect()
    }
}
