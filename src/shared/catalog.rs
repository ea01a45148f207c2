//! Pre-installed models, described by a `models.json` file in the model directory
use crate::shared::errors::{Error, Result};
use crate::shared::model::ChainType;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "models.json";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordModel {
    pub id: String,
    pub chain: ChainType,
    pub species: String,
    pub filename_params: String,
    pub filename_marginals: String,
    pub filename_v_gene_cdr3_anchors: String,
    pub filename_j_gene_cdr3_anchors: String,
    #[serde(default)]
    pub description: String,
}

/// Everything needed to load one pre-installed model
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub chain: ChainType,
    pub parameters: PathBuf,
    pub marginals: PathBuf,
    pub v_anchors: PathBuf,
    pub j_anchors: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    model_dir: PathBuf,
    records: Vec<RecordModel>,
}

impl ModelCatalog {
    pub fn load(model_dir: &Path) -> Result<ModelCatalog> {
        let path = model_dir.join(CATALOG_FILE);
        let file = File::open(&path).map_err(|e| {
            Error::ModelFormat(format!("Unable to open {} ({})", path.display(), e))
        })?;
        let records: Vec<RecordModel> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::ModelFormat(format!("Invalid {} ({})", path.display(), e)))?;
        log::debug!("{} models available in {}", records.len(), model_dir.display());
        Ok(ModelCatalog {
            model_dir: model_dir.to_path_buf(),
            records,
        })
    }

    pub fn records(&self) -> &[RecordModel] {
        &self.records
    }

    pub fn resolve(&self, id: &str) -> Result<ModelBundle> {
        let record = self.records.iter().find(|r| r.id == id).ok_or_else(|| {
            Error::ModelFormat(format!(
                "Unknown model {} (available: {})",
                id,
                self.records
                    .iter()
                    .map(|r| r.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        let dir = self.model_dir.join(&record.id);
        Ok(ModelBundle {
            chain: record.chain,
            parameters: dir.join(&record.filename_params),
            marginals: dir.join(&record.filename_marginals),
            v_anchors: dir.join(&record.filename_v_gene_cdr3_anchors),
            j_anchors: dir.join(&record.filename_j_gene_cdr3_anchors),
        })
    }
}
