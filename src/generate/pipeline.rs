//! End-to-end generation runs (full-length through IGoR, or CDR3 only)
use crate::generate::assembler::{merge, write_records, SequenceRecord, SequenceRow};
use crate::generate::cdr3::{Cdr3Generator, CDR3_GENE_TYPES};
use crate::generate::decoder::{RawRealizationRow, RealizationDecoder};
use crate::generate::igor::{generated_tables, IgorCommand, IgorInterface};
use crate::shared::anchors::AnchorTable;
use crate::shared::catalog::ModelCatalog;
use crate::shared::config::PipelineConfig;
use crate::shared::errors::{Error, Result};
use crate::shared::gene::GeneType;
use crate::shared::io::{copy_to_dir, normalize_separator, unique_path, CANONICAL_SEPARATOR, IGOR_SEPARATOR};
use crate::shared::model::{ChainType, ModelSources, RecombinationModel};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where the model comes from
#[derive(Clone, Debug)]
pub enum ModelSpec {
    /// Pre-installed model, by id
    Bundle(String),
    Custom {
        chain: ChainType,
        parameters: PathBuf,
        marginals: PathBuf,
        anchors: Vec<(GeneType, PathBuf)>,
    },
}

struct ResolvedModel {
    chain: ChainType,
    parameters: PathBuf,
    marginals: PathBuf,
    // anchor file and its separator
    anchors: Vec<(GeneType, PathBuf, u8)>,
}

fn resolve(spec: &ModelSpec, config: &PipelineConfig) -> Result<ResolvedModel> {
    match spec {
        ModelSpec::Bundle(id) => {
            let bundle = ModelCatalog::load(&config.model_dir)?.resolve(id)?;
            Ok(ResolvedModel {
                chain: bundle.chain,
                anchors: vec![
                    (GeneType::V, bundle.v_anchors, CANONICAL_SEPARATOR),
                    (GeneType::J, bundle.j_anchors, CANONICAL_SEPARATOR),
                ],
                parameters: bundle.parameters,
                marginals: bundle.marginals,
            })
        }
        ModelSpec::Custom {
            chain,
            parameters,
            marginals,
            anchors,
        } => Ok(ResolvedModel {
            chain: *chain,
            parameters: parameters.clone(),
            marginals: marginals.clone(),
            anchors: anchors
                .iter()
                .map(|(g, p)| (*g, p.clone(), config.separator))
                .collect(),
        }),
    }
}

/// Copy an anchor file into the anchors directory with the canonical
/// separator, then load it
fn load_anchors(path: &Path, gene_type: GeneType, separator: u8, config: &PipelineConfig) -> Result<AnchorTable> {
    let data = fs::read_to_string(path).map_err(|e| {
        Error::gene_identifier(
            gene_type,
            format!("unable to open the anchor file {} ({})", path.display(), e),
        )
    })?;
    let normalized = normalize_separator(&data, separator, CANONICAL_SEPARATOR)
        .map_err(|e| Error::gene_identifier(gene_type, format!("unreadable anchor file ({})", e)))?;

    let dir = config.anchors_dir();
    fs::create_dir_all(&dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}_gene_CDR3_anchors.csv", gene_type));
    let copy = dir.join(name);
    fs::write(&copy, &normalized)?;
    log::debug!("Copied the {} anchors to {}", gene_type, copy.display());

    AnchorTable::load(&normalized, gene_type, CANONICAL_SEPARATOR)
}

/// Build and initialize the model, with its anchors if `with_anchors`
fn load_model(
    resolved: &ResolvedModel,
    config: &PipelineConfig,
    with_anchors: bool,
) -> Result<RecombinationModel> {
    let sources = ModelSources::from_files(&resolved.parameters, &resolved.marginals)?;
    let anchors = if with_anchors {
        Some(
            resolved
                .anchors
                .iter()
                .map(|(g, p, sep)| load_anchors(p, *g, *sep, config))
                .collect::<Result<Vec<_>>>()?,
        )
    } else {
        None
    };
    let mut model = RecombinationModel::build(resolved.chain.topology(), &sources, anchors)?;
    model.initialize()?;
    Ok(model)
}

fn check_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::Generation(
            "the number of sequences to generate must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn output_path(config: &PipelineConfig, default_name: String) -> PathBuf {
    let name = config.output_name.clone().unwrap_or(default_name);
    unique_path(&config.output_dir, &name, "csv")
}

/// Read the tables of a generation run, decode the realizations and join
/// them with the translated sequences
pub fn assemble_generated(model: &RecombinationModel, generated_dir: &Path) -> Result<Vec<SequenceRecord>> {
    let (seqs_path, realizations_path) = generated_tables(generated_dir);
    let open = |path: &Path| {
        File::open(path).map(BufReader::new).map_err(|e| {
            Error::TableFormat(format!("unable to open {} ({})", path.display(), e))
        })
    };
    let sequences = SequenceRow::read_table(open(&seqs_path)?, IGOR_SEPARATOR)?;
    let raw = RawRealizationRow::read_table(open(&realizations_path)?, IGOR_SEPARATOR)?;
    let decoded = RealizationDecoder::new(model).decode(&raw)?;
    merge(sequences, decoded)
}

/// Generate `count` full-length sequences with IGoR, return the output file
pub fn generate_full_length(spec: &ModelSpec, count: usize, config: &PipelineConfig) -> Result<PathBuf> {
    check_count(count)?;
    let resolved = resolve(spec, config)?;
    let model = load_model(&resolved, config, false)?;

    fs::create_dir_all(&config.working_dir)?;
    let (parameters, marginals) = match spec {
        ModelSpec::Custom { .. } => (
            copy_to_dir(&config.working_dir, &resolved.parameters)?,
            copy_to_dir(&config.working_dir, &resolved.marginals)?,
        ),
        ModelSpec::Bundle(_) => (resolved.parameters.clone(), resolved.marginals.clone()),
    };

    let igor = IgorInterface::new(
        &config.igor_executable,
        vec![
            IgorCommand::SetWd(config.working_dir.clone()),
            IgorCommand::Threads(config.threads),
            IgorCommand::SetCustomModel {
                parameters,
                marginals,
            },
            IgorCommand::Generate { count, noerr: true },
        ],
    );
    igor.call()?;

    let records = assemble_generated(&model, &config.generated_dir())?;
    let path = output_path(config, format!("generated_seqs_{}", resolved.chain));
    write_records(&path, &records, model.topology().gene_types(), config.separator)?;
    Ok(path)
}

/// Generate `count` productive CDR3s with the bundled sampler, return the output file
pub fn generate_cdr3(spec: &ModelSpec, count: usize, config: &PipelineConfig) -> Result<PathBuf> {
    check_count(count)?;
    let resolved = resolve(spec, config)?;
    let model = load_model(&resolved, config, true)?;

    let records = Cdr3Generator::new(&model)?.generate(count, config.seed)?;
    let path = output_path(config, format!("generated_seqs_{}_CDR3", resolved.chain));
    write_records(&path, &records, &CDR3_GENE_TYPES, config.separator)?;
    Ok(path)
}
