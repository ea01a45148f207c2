//! Translation of the generated sequences and their join with the decoded
//! gene choices
use crate::generate::decoder::DecodedRealizationRow;
use crate::shared::errors::{Error, Result};
use crate::shared::gene::GeneType;
use crate::shared::io::{separated_reader, AA_COL, INDEX_COL, NT_COL};
use crate::shared::sequence::translate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// One row of the sequence table written by the simulator
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRow {
    pub sequence_index: usize,
    pub nucleotide_sequence: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRecord {
    pub sequence_index: usize,
    pub nucleotide_sequence: String,
    pub amino_acid_sequence: String,
    pub gene_names: BTreeMap<GeneType, String>,
}

impl SequenceRow {
    pub fn read_table<R: Read>(reader: R, separator: u8) -> Result<Vec<SequenceRow>> {
        let mut rdr = separated_reader(reader, separator);
        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::TableFormat(format!("no {} column", name)))
        };
        let index_col = column(INDEX_COL)?;
        let nt_col = column(NT_COL)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let raw_index = record.get(index_col).unwrap_or_default();
            rows.push(SequenceRow {
                sequence_index: usize::from_str(raw_index).map_err(|_| {
                    Error::TableFormat(format!("invalid sequence index \"{}\"", raw_index))
                })?,
                nucleotide_sequence: record.get(nt_col).unwrap_or_default().to_string(),
            });
        }
        log::debug!("Read {} generated sequences", rows.len());
        Ok(rows)
    }
}

fn duplicates(indexes: impl Iterator<Item = usize>) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    indexes.filter(|i| !seen.insert(*i)).collect()
}

/// Join the sequences with their decoded gene choices on the sequence index.
/// Both tables must hold exactly the same (unique) indexes. The records
/// follow the order of `sequence_rows`.
pub fn merge(
    sequence_rows: Vec<SequenceRow>,
    decoded_rows: Vec<DecodedRealizationRow>,
) -> Result<Vec<SequenceRecord>> {
    let mut duplicated = duplicates(sequence_rows.iter().map(|r| r.sequence_index));
    duplicated.extend(duplicates(decoded_rows.iter().map(|r| r.sequence_index)));

    let seq_indexes: BTreeSet<usize> = sequence_rows.iter().map(|r| r.sequence_index).collect();
    let mut decoded: HashMap<usize, DecodedRealizationRow> = decoded_rows
        .into_iter()
        .map(|r| (r.sequence_index, r))
        .collect();
    let sequences_only: Vec<usize> = seq_indexes
        .iter()
        .filter(|i| !decoded.contains_key(*i))
        .copied()
        .collect();
    let mut realizations_only: Vec<usize> = decoded
        .keys()
        .filter(|i| !seq_indexes.contains(*i))
        .copied()
        .collect();
    realizations_only.sort_unstable();

    if !sequences_only.is_empty() || !realizations_only.is_empty() || !duplicated.is_empty() {
        return Err(Error::AssemblyMismatch {
            sequences_only,
            realizations_only,
            duplicated: duplicated.into_iter().collect(),
        });
    }

    let records = sequence_rows
        .into_iter()
        .filter_map(|row| {
            decoded.remove(&row.sequence_index).map(|d| SequenceRecord {
                sequence_index: row.sequence_index,
                amino_acid_sequence: translate(row.nucleotide_sequence.as_bytes()).to_string(),
                nucleotide_sequence: row.nucleotide_sequence,
                gene_names: d.gene_names,
            })
        })
        .collect::<Vec<_>>();
    log::info!("Assembled {} sequence records", records.len());
    Ok(records)
}

/// Write `records` as a table with one gene column per `gene_types`
pub fn write_records(
    path: &Path,
    records: &[SequenceRecord],
    gene_types: &[GeneType],
    separator: u8,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(separator)
        .from_path(path)?;

    let mut header = vec![INDEX_COL, NT_COL, AA_COL];
    header.extend(gene_types.iter().map(|g| g.column_name()));
    wtr.write_record(&header)?;

    for record in records {
        let mut fields = vec![
            record.sequence_index.to_string(),
            record.nucleotide_sequence.clone(),
            record.amino_acid_sequence.clone(),
        ];
        fields.extend(
            gene_types
                .iter()
                .map(|g| record.gene_names.get(g).cloned().unwrap_or_default()),
        );
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    log::info!("Wrote {} sequences to {}", records.len(), path.display());
    Ok(())
}
