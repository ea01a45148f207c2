//! CDR3 anchor tables (one per gene type)
use crate::shared::errors::{Error, Result};
use crate::shared::gene::{Functionality, GeneType};
use crate::shared::io::{normalize_separator, CANONICAL_SEPARATOR};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorEntry {
    pub gene_name: String,
    // for V genes, position of the first nucleotide of the conserved "C"
    // for J genes, position of the first nucleotide of the "F/W"
    pub anchor_position: usize,
    pub functionality: Functionality,
    pub is_functional: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorTable {
    pub gene_type: GeneType,
    entries: HashMap<String, AnchorEntry>,
}

impl AnchorTable {
    /// Parse an anchor source (gene name, anchor position, functionality,
    /// after a header line) written with `separator`.
    pub fn load(data: &str, gene_type: GeneType, separator: u8) -> Result<AnchorTable> {
        let err = |message: String| Error::gene_identifier(gene_type, message);
        let canonical = normalize_separator(data, separator, CANONICAL_SEPARATOR)
            .map_err(|e| err(format!("unreadable anchor data ({})", e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(CANONICAL_SEPARATOR)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(canonical.as_bytes());
        rdr.headers()
            .map_err(|e| err(format!("error reading the anchor file headers ({})", e)))?;

        let mut entries = HashMap::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| err(format!("error reading the record {} ({})", line + 1, e)))?;
            let field = |i: usize, what: &str| {
                record
                    .get(i)
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| err(format!("missing {} in record {}", what, line + 1)))
            };
            let gene_name = field(0, "gene name")?.to_string();
            let position = field(1, "anchor position")?;
            let anchor_position = position
                .parse::<i64>()
                .map_err(|_| err(format!("invalid anchor position {} for {}", position, gene_name)))
                .and_then(|p| {
                    usize::try_from(p).map_err(|_| {
                        err(format!("negative anchor position {} for {}", p, gene_name))
                    })
                })?;
            let function = field(2, "functionality")?;
            let functionality = Functionality::parse(function)
                .ok_or_else(|| err(format!("invalid functionality {} for {}", function, gene_name)))?;

            if entries.contains_key(&gene_name) {
                return Err(err(format!("duplicated gene name {}", gene_name)));
            }
            entries.insert(
                gene_name.clone(),
                AnchorEntry {
                    gene_name,
                    anchor_position,
                    functionality,
                    is_functional: functionality == Functionality::Functional,
                },
            );
        }
        log::debug!("Loaded {} {} anchors", entries.len(), gene_type);
        Ok(AnchorTable { gene_type, entries })
    }

    pub fn from_file(path: &Path, gene_type: GeneType, separator: u8) -> Result<AnchorTable> {
        let data = fs::read_to_string(path).map_err(|e| {
            Error::gene_identifier(
                gene_type,
                format!("unable to open the anchor file {} ({})", path.display(), e),
            )
        })?;
        AnchorTable::load(&data, gene_type, separator)
    }

    pub fn get(&self, gene_name: &str) -> Option<&AnchorEntry> {
        self.entries.get(gene_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
