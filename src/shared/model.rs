use crate::shared::anchors::AnchorTable;
use crate::shared::errors::{Error, Result};
use crate::shared::gene::{GeneType, GenomicSegment, GenomicSegmentTable};
use crate::shared::parser::{parse_str, ParserMarginals, ParserParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Recombination topology, selects the gene types (and columns) in use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    VJ,
    VDJ,
}

impl Topology {
    pub fn gene_types(&self) -> &'static [GeneType] {
        match self {
            Topology::VJ => &[GeneType::V, GeneType::J],
            Topology::VDJ => &[GeneType::V, GeneType::D, GeneType::J],
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topology::VJ => write!(f, "VJ"),
            Topology::VDJ => write!(f, "VDJ"),
        }
    }
}

/// Receptor chain of a model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Alpha,
    Beta,
    Light,
    Heavy,
}

impl ChainType {
    pub fn topology(&self) -> Topology {
        match self {
            ChainType::Alpha | ChainType::Light => Topology::VJ,
            ChainType::Beta | ChainType::Heavy => Topology::VDJ,
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ChainType::Alpha => "alpha",
            ChainType::Beta => "beta",
            ChainType::Light => "light",
            ChainType::Heavy => "heavy",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ChainType {
    type Err = Error;

    fn from_str(s: &str) -> Result<ChainType> {
        match s.to_ascii_lowercase().as_str() {
            "alpha" => Ok(ChainType::Alpha),
            "beta" => Ok(ChainType::Beta),
            "light" => Ok(ChainType::Light),
            "heavy" => Ok(ChainType::Heavy),
            _ => Err(Error::ModelFormat(format!(
                "Invalid model type {} (select one: alpha, beta, light, heavy)",
                s
            ))),
        }
    }
}

/// Content of the two model definition files
#[derive(Clone, Debug, Default)]
pub struct ModelSources {
    pub parameters: String,
    pub marginals: String,
}

impl ModelSources {
    pub fn from_files(path_params: &Path, path_marginals: &Path) -> Result<ModelSources> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|e| {
                Error::ModelFormat(format!("Unable to open file {} ({})", path.display(), e))
            })
        };
        Ok(ModelSources {
            parameters: read(path_params)?,
            marginals: read(path_marginals)?,
        })
    }
}

/// Segment tables of a model (and optionally its CDR3 anchors).
///
/// The topology is fixed by `build`, and nothing changes once
/// `initialize` succeeded.
#[derive(Clone, Debug)]
pub struct RecombinationModel {
    topology: Topology,
    segments: BTreeMap<GeneType, GenomicSegmentTable>,
    anchors: Option<BTreeMap<GeneType, AnchorTable>>,
    // kept for the sampler, the decoding only needs the segments
    params: ParserParams,
    marginals: ParserMarginals,
    initialized: bool,
}

impl RecombinationModel {
    pub fn build(
        topology: Topology,
        sources: &ModelSources,
        anchors: Option<Vec<AnchorTable>>,
    ) -> Result<RecombinationModel> {
        let params = ParserParams::parse(parse_str(&sources.parameters)?)?;
        let marginals = ParserMarginals::parse(parse_str(&sources.marginals)?)?;

        if topology == Topology::VJ && params.gene_choice_nickname(GeneType::D).is_some() {
            return Err(Error::ModelFormat(
                "The model parameters contain D genes, but the model is VJ".to_string(),
            ));
        }
        let mut segments = BTreeMap::new();
        for &gene_type in topology.gene_types() {
            segments.insert(gene_type, GenomicSegmentTable::load(&params, gene_type)?);
        }

        let anchors = match anchors {
            None => None,
            Some(tables) => {
                let mut map = BTreeMap::new();
                for table in tables {
                    let gene_type = table.gene_type;
                    if map.insert(gene_type, table).is_some() {
                        return Err(Error::gene_identifier(
                            gene_type,
                            "anchors supplied more than once",
                        ));
                    }
                }
                Some(map)
            }
        };

        log::info!(
            "Loaded {} model ({})",
            topology,
            segments
                .iter()
                .map(|(g, t)| format!("{} {} genes", t.len(), g))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(RecombinationModel {
            topology,
            segments,
            anchors,
            params,
            marginals,
            initialized: false,
        })
    }

    /// Cross-validate segments and anchors. Every segment without an anchor
    /// entry is reported, not only the first one.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let mut problems = Vec::new();
        if let Some(anchors) = &self.anchors {
            for (gene_type, table) in anchors {
                match self.segments.get(gene_type) {
                    None => problems.push(format!(
                        "anchors supplied for the {} genes, but a {} model has none",
                        gene_type, self.topology
                    )),
                    Some(segments) => problems.extend(
                        segments
                            .iter()
                            .filter(|s| table.get(&s.name).is_none())
                            .map(|s| format!("{} gene {} has no anchor entry", gene_type, s.name)),
                    ),
                }
            }
        }
        if !problems.is_empty() {
            return Err(Error::ModelValidation(problems));
        }

        if let Some(anchors) = &self.anchors {
            for (gene_type, table) in anchors {
                if let Some(segments) = self.segments.get_mut(gene_type) {
                    for s in segments.iter_mut() {
                        s.functionality = table.get(&s.name).map(|a| a.functionality);
                    }
                }
            }
        }
        self.initialized = true;
        log::debug!("{} model initialized", self.topology);
        Ok(())
    }

    pub fn get_segment(&self, gene_type: GeneType, index: usize) -> Result<&GenomicSegment> {
        let table = self.segments.get(&gene_type);
        table
            .and_then(|t| t.get(index))
            .ok_or(Error::IndexOutOfRange {
                gene_type,
                index,
                size: table.map_or(0, |t| t.len()),
            })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn segments(&self, gene_type: GeneType) -> Option<&GenomicSegmentTable> {
        self.segments.get(&gene_type)
    }

    pub fn anchors(&self, gene_type: GeneType) -> Option<&AnchorTable> {
        self.anchors.as_ref().and_then(|a| a.get(&gene_type))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn params(&self) -> &ParserParams {
        &self.params
    }

    pub fn marginals(&self) -> &ParserMarginals {
        &self.marginals
    }
}
