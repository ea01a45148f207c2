//! Separated-value plumbing shared by the pipelines
use crate::shared::errors::Result;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Separator used internally once user files have been normalized
pub const CANONICAL_SEPARATOR: u8 = b',';
/// Separator of the tables written by IGoR
pub const IGOR_SEPARATOR: u8 = b';';

pub const INDEX_COL: &str = "seq_index";
pub const NT_COL: &str = "nt_sequence";
pub const AA_COL: &str = "aa_sequence";

/// Reader over a headed separated-value source, "#" lines are skipped
pub fn separated_reader<R: Read>(reader: R, separator: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(separator)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Rewrite `data` from the `from` separator to the `to` separator (quoting
/// fields when needed)
pub fn normalize_separator(data: &str, from: u8, to: u8) -> std::result::Result<String, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(from)
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(to)
        .flexible(true)
        .from_writer(Vec::new());
    for record in rdr.records() {
        wtr.write_record(&record?)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Copy `file` into `directory` (created if needed), return the new path
pub fn copy_to_dir(directory: &Path, file: &Path) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let name = file.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a file", file.display()),
        )
    })?;
    let target = directory.join(name);
    if target.exists() && fs::canonicalize(&target)? == fs::canonicalize(file)? {
        return Ok(target);
    }
    fs::copy(file, &target)?;
    log::debug!("Copied {} to {}", file.display(), target.display());
    Ok(target)
}

/// `directory/filename.extension`, with "_1", "_2", ... appended to the
/// filename until no such file exists
pub fn unique_path(directory: &Path, filename: &str, extension: &str) -> PathBuf {
    let mut candidate = directory.join(format!("{}.{}", filename, extension));
    let mut count = 1;
    while candidate.exists() {
        candidate = directory.join(format!("{}_{}.{}", filename, count, extension));
        count += 1;
    }
    candidate
}
