//! Decoding of the realization table written by the simulator
use crate::shared::errors::{Error, Result};
use crate::shared::gene::GeneType;
use crate::shared::io::{separated_reader, INDEX_COL};
use crate::shared::model::RecombinationModel;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

static GENE_CHOICE_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GeneChoice_([VDJ])_gene_").expect("valid regex"));

/// One row of the realization table, choices still encoded ("(3)")
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRealizationRow {
    pub sequence_index: usize,
    pub choices: BTreeMap<GeneType, String>,
}

/// One row of the realization table with named segments, gene types ordered V, D, J
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedRealizationRow {
    pub sequence_index: usize,
    pub gene_names: BTreeMap<GeneType, String>,
}

impl DecodedRealizationRow {
    pub fn gene_name(&self, gene_type: GeneType) -> Option<&str> {
        self.gene_names.get(&gene_type).map(String::as_str)
    }
}

/// Parse a gene choice encoding, `"(<digits>)"`.
///
/// ```
/// use vdjgen::generate::decoder::parse_choice;
/// assert_eq!(parse_choice("(3)"), Some(3));
/// assert_eq!(parse_choice("(0)"), Some(0));
/// assert_eq!(parse_choice("3"), None);
/// assert_eq!(parse_choice("(-1)"), None);
/// assert_eq!(parse_choice("(2,4)"), None);
/// assert_eq!(parse_choice("()"), None);
/// ```
pub fn parse_choice(encoded: &str) -> Option<usize> {
    let digits = encoded.strip_prefix('(')?.strip_suffix(')')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    usize::from_str(digits).ok()
}

impl RawRealizationRow {
    /// Read a realization table (index column, then one "GeneChoice_X_gene_..."
    /// column per gene type, other columns are ignored)
    pub fn read_table<R: Read>(reader: R, separator: u8) -> Result<Vec<RawRealizationRow>> {
        let mut rdr = separated_reader(reader, separator);
        let headers = rdr.headers()?.clone();
        let index_col = headers
            .iter()
            .position(|h| h == INDEX_COL)
            .ok_or_else(|| Error::TableFormat(format!("no {} column", INDEX_COL)))?;

        let mut gene_columns: BTreeMap<GeneType, usize> = BTreeMap::new();
        for (col, header) in headers.iter().enumerate() {
            if let Some(caps) = GENE_CHOICE_COLUMN.captures(header) {
                let gene_type = GeneType::from_str(&caps[1])?;
                gene_columns.entry(gene_type).or_insert(col);
            }
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let raw_index = record.get(index_col).unwrap_or_default();
            let sequence_index = usize::from_str(raw_index).map_err(|_| {
                Error::TableFormat(format!("invalid sequence index \"{}\"", raw_index))
            })?;
            let choices = gene_columns
                .iter()
                .map(|(&gene_type, &col)| {
                    (gene_type, record.get(col).unwrap_or_default().to_string())
                })
                .collect();
            rows.push(RawRealizationRow {
                sequence_index,
                choices,
            });
        }
        log::debug!(
            "Read {} realizations ({} gene choice columns)",
            rows.len(),
            gene_columns.len()
        );
        Ok(rows)
    }
}

/// Turns the encoded gene choices into segment names
pub struct RealizationDecoder<'a> {
    model: &'a RecombinationModel,
}

impl<'a> RealizationDecoder<'a> {
    pub fn new(model: &'a RecombinationModel) -> RealizationDecoder<'a> {
        RealizationDecoder { model }
    }

    /// Decode every row, failing on the first bad encoding
    pub fn decode(&self, raw_rows: &[RawRealizationRow]) -> Result<Vec<DecodedRealizationRow>> {
        let decoded = raw_rows
            .iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>>>()?;
        log::info!("Decoded {} realizations", decoded.len());
        Ok(decoded)
    }

    fn decode_row(&self, row: &RawRealizationRow) -> Result<DecodedRealizationRow> {
        let mut gene_names = BTreeMap::new();
        for &gene_type in self.model.topology().gene_types() {
            let encoded = row.choices.get(&gene_type).map_or("", String::as_str);
            let index = parse_choice(encoded).ok_or_else(|| Error::RealizationFormat {
                sequence_index: row.sequence_index,
                gene_type,
                value: encoded.to_string(),
            })?;
            let segment = self.model.get_segment(gene_type, index)?;
            gene_names.insert(gene_type, segment.name.clone());
        }
        Ok(DecodedRealizationRow {
            sequence_index: row.sequence_index,
            gene_names,
        })
    }
}
