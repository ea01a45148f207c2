/// Contains the basic nucleotide / amino-acid structs and the translation
use crate::shared::errors::{Error, Result};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;

static DNA_TO_AMINO: phf::Map<&'static str, u8> = phf_map! {
    "TTT" => b'F', "TTC" => b'F', "TTA" => b'L', "TTG" => b'L', "TCT" => b'S', "TCC" => b'S',
    "TCA" => b'S', "TCG" => b'S', "TAT" => b'Y', "TAC" => b'Y', "TAA" => b'*', "TAG" => b'*',
    "TGT" => b'C', "TGC" => b'C', "TGA" => b'*', "TGG" => b'W', "CTT" => b'L', "CTC" => b'L',
    "CTA" => b'L', "CTG" => b'L', "CCT" => b'P', "CCC" => b'P', "CCA" => b'P', "CCG" => b'P',
    "CAT" => b'H', "CAC" => b'H', "CAA" => b'Q', "CAG" => b'Q', "CGT" => b'R', "CGC" => b'R',
    "CGA" => b'R', "CGG" => b'R', "ATT" => b'I', "ATC" => b'I', "ATA" => b'I', "ATG" => b'M',
    "ACT" => b'T', "ACC" => b'T', "ACA" => b'T', "ACG" => b'T', "AAT" => b'N', "AAC" => b'N',
    "AAA" => b'K', "AAG" => b'K', "AGT" => b'S', "AGC" => b'S', "AGA" => b'R', "AGG" => b'R',
    "GTT" => b'V', "GTC" => b'V', "GTA" => b'V', "GTG" => b'V', "GCT" => b'A', "GCC" => b'A',
    "GCA" => b'A', "GCG" => b'A', "GAT" => b'D', "GAC" => b'D', "GAA" => b'E', "GAG" => b'E',
    "GGT" => b'G', "GGC" => b'G', "GGA" => b'G', "GGG" => b'G'
};

/// Symbol of a codon that contains anything but A/C/G/T
pub const UNRESOLVED_AMINO_ACID: u8 = b'X';

// The standard ACGT nucleotides, in the order used by the dinucleotide Markov chains
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

static COMPLEMENT: phf::Map<u8, u8> = phf_map! {
    b'A' => b'T', b'T' => b'A', b'G' => b'C', b'C' => b'G', b'N' => b'N',
    b'R' => b'Y', b'Y' => b'R', b'S' => b'S', b'W' => b'W', b'K' => b'M',
    b'M' => b'K', b'B' => b'V', b'D' => b'H', b'H' => b'D', b'V' => b'B',
};

/// Index of an A/C/G/T nucleotide, `None` for ambiguous ones
pub fn nucleotides_inv(n: u8) -> Option<usize> {
    match n {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Translate a nucleotide sequence codon by codon.
///
/// A trailing incomplete codon is dropped and codons with characters outside
/// A/C/G/T become `X`.
///```
/// use vdjgen::shared::sequence::translate;
/// assert_eq!(translate(b"ATGAAACCC").to_string(), "MKP");
/// assert_eq!(translate(b"ATGAA").to_string(), "M");
/// assert_eq!(translate(b"TGTNAATAA").to_string(), "CX*");
/// assert!(translate(b"").is_empty());
///```
pub fn translate(seq: &[u8]) -> AminoAcid {
    AminoAcid {
        seq: seq
            .chunks_exact(3)
            .map(|codon| {
                let upper = codon.to_ascii_uppercase();
                std::str::from_utf8(&upper)
                    .ok()
                    .and_then(|c| DNA_TO_AMINO.get(c).copied())
                    .unwrap_or(UNRESOLVED_AMINO_ACID)
            })
            .collect(),
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct Dna {
    pub seq: Vec<u8>,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct AminoAcid {
    pub seq: Vec<u8>,
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

impl Dna {
    pub fn new() -> Dna {
        Dna { seq: Vec::new() }
    }

    /// Build a sequence from IUPAC nucleotides (case insensitive)
    pub fn from_string(s: &str) -> Result<Dna> {
        let seq = s.trim().to_ascii_uppercase().into_bytes();
        if let Some(byte) = seq.iter().find(|b| !COMPLEMENT.contains_key(*b)) {
            return Err(Error::ModelFormat(format!(
                "Invalid nucleotide '{}' in sequence {}",
                *byte as char, s
            )));
        }
        Ok(Dna { seq })
    }

    pub fn translate(&self) -> AminoAcid {
        translate(&self.seq)
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn extend(&mut self, dna: &Dna) {
        self.seq.extend(dna.seq.iter());
    }

    pub fn reverse(&mut self) {
        self.seq.reverse();
    }

    pub fn reverse_complement(&self) -> Dna {
        Dna {
            seq: self
                .seq
                .iter()
                .filter_map(|x| COMPLEMENT.get(x).copied())
                .rev()
                .collect(),
        }
    }

    pub fn extract_subsequence(&self, start: usize, end: usize) -> Dna {
        // Return dna[start:end]
        Dna {
            seq: self.seq[start..end].to_vec(),
        }
    }
}

impl AminoAcid {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}
