// Parser for the marginals and params files (IGoR format)

use crate::shared::errors::{Error, Result};
use crate::shared::gene::{GeneType, GenomicSegment};
use crate::shared::sequence::Dna;
use ndarray::{ArrayD, Axis, IxDyn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

static DIM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$Dim\[(\d+(?:,\s*\d+)*)\]$").expect("valid regex"));
static DEPENDENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<text>\w+),\s*(?<number>\d+)\]").expect("valid regex"));

fn format_error(message: impl Into<String>) -> Error {
    Error::ModelFormat(message.into())
}

#[derive(Default, Clone, Debug)]
pub struct ParserMarginals {
    pub marginals: HashMap<String, Marginal>,
}

#[derive(Default, Clone, Debug)]
pub struct Marginal {
    pub dimensions: Vec<usize>,     // list of the dimensions
    pub dependences: Vec<String>,   // list of the other variables that Marginal depends on
    pub probabilities: ArrayD<f64>, // Array that contains all the probabilities of interest
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    GeneChoice,
    Deletion,
    Insertion,
    DinucMarkov,
}

/// Header of an event, e.g. "#Deletion;V_gene;Three_prime;5;v_3_del"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventHeader {
    pub kind: EventKind,
    pub target: String,
    pub side: String,
    pub nickname: String,
}

// an event is either a gene or a # of insertion/deletion
#[derive(Clone, Debug)]
pub enum EventType {
    Genes(Vec<GenomicSegment>),
    Numbers(Vec<i64>),
}

#[derive(Default, Clone, Debug)]
pub struct ParserParams {
    pub events: Vec<EventHeader>,
    pub params: HashMap<String, EventType>,
}

impl Marginal {
    pub fn parse(str_data: &[String]) -> Result<(String, Marginal)> {
        if str_data.len() < 2 {
            return Err(format_error("Invalid marginals file format."));
        }
        let key = str_data[0].trim_start_matches('@').to_string();
        let dimensions = parse_dim(&str_data[1])?;
        if dimensions.is_empty() {
            return Err(format_error(format!("Empty dimensions for the marginal {}", key)));
        }
        let mut marg = Marginal {
            dimensions,
            ..Default::default()
        };
        // remove the last dimension
        let product = marg
            .dimensions
            .iter()
            .take(marg.dimensions.len() - 1)
            .product();
        let last_dim = marg.dimensions[marg.dimensions.len() - 1];
        marg.probabilities = ArrayD::zeros(IxDyn(&marg.dimensions));

        let invalid = || format_error(format!("Invalid file format for the marginal {}", key));
        for ii in 0..product {
            let dependences_line = str_data.get(2 * ii + 2).ok_or_else(invalid)?;
            let (dependences, indexes) = parse_dependence(dependences_line)?;
            if marg.dependences.is_empty() {
                marg.dependences = dependences;
            } else if marg.dependences != dependences {
                return Err(invalid());
            }
            if indexes.len() + 1 != marg.dimensions.len()
                || indexes
                    .iter()
                    .zip(marg.dimensions.iter())
                    .any(|(idx, dim)| idx >= dim)
            {
                return Err(invalid());
            }

            let values_line = str_data.get(2 * ii + 3).ok_or_else(invalid)?;
            let values = parse_values(values_line)?;
            if values.len() != last_dim {
                return Err(invalid());
            }
            for (idx, val) in values.iter().enumerate() {
                let mut idxs = indexes.clone();
                idxs.push(idx);
                marg.probabilities[IxDyn(&idxs)] = *val;
            }
        }

        Ok((key, marg))
    }

    /// Distribution of the variable given the realizations of the variables
    /// it depends on (`given` maps an event nickname to its realization index)
    pub fn conditional(&self, given: &HashMap<String, usize>) -> Result<Vec<f64>> {
        let mut view = self.probabilities.view();
        for dep in &self.dependences {
            let idx = *given.get(dep).ok_or_else(|| {
                format_error(format!("Missing realization for the dependence {}", dep))
            })?;
            if idx >= view.shape()[0] {
                return Err(format_error(format!(
                    "Realization {} of {} out of the marginal bounds",
                    idx, dep
                )));
            }
            view = view.index_axis_move(Axis(0), idx);
        }
        Ok(view.iter().copied().collect())
    }
}

fn parse_genes(str_data: &[String]) -> Result<EventType> {
    let mut events: Vec<Option<GenomicSegment>> = vec![None; str_data.len()];
    for line in str_data {
        let data: Vec<&str> = line.split(';').collect();
        if data.len() != 3 {
            return Err(format_error(format!("Invalid format for gene event {}", line)));
        }
        let name = data[0].trim_start_matches('%').trim();
        if name.is_empty() {
            return Err(format_error(format!("Missing gene name in {}", line)));
        }
        let index = usize::from_str(data[2].trim())
            .map_err(|_| format_error(format!("Invalid gene index in {}", line)))?;
        let slot = events
            .get_mut(index)
            .ok_or_else(|| format_error(format!("Gene index out of range in {}", line)))?;
        if slot.is_some() {
            return Err(format_error(format!("Duplicated gene index in {}", line)));
        }
        *slot = Some(GenomicSegment {
            name: name.to_string(),
            functionality: None, // not available from this file
            index,
            seq: Dna::from_string(data[1])?,
        });
    }
    // every slot is filled: indexes are distinct and all below the length
    Ok(EventType::Genes(events.into_iter().flatten().collect()))
}

fn parse_numbers(str_data: &[String]) -> Result<EventType> {
    let mut events: Vec<i64> = vec![0; str_data.len()];
    for line in str_data {
        let data: Vec<&str> = line.split(';').collect();
        if data.len() != 2 {
            return Err(format_error(format!("Invalid format for event {}", line)));
        }
        let value = i64::from_str(data[0].trim_start_matches('%').trim())
            .map_err(|_| format_error(format!("Invalid value in {}", line)))?;
        let index = usize::from_str(data[1].trim())
            .map_err(|_| format_error(format!("Invalid index in {}", line)))?;
        *events
            .get_mut(index)
            .ok_or_else(|| format_error(format!("Index out of range in {}", line)))? = value;
    }
    Ok(EventType::Numbers(events))
}

impl EventHeader {
    fn parse(line: &str) -> Result<EventHeader> {
        let fields: Vec<&str> = line.trim_start_matches('#').split(';').collect();
        if fields.len() < 3 {
            return Err(format_error(format!("Invalid event header {}", line)));
        }
        let kind = match fields[0] {
            "GeneChoice" => EventKind::GeneChoice,
            "Deletion" => EventKind::Deletion,
            "Insertion" => EventKind::Insertion,
            "DinucMarkov" => EventKind::DinucMarkov,
            _ => {
                return Err(format_error(format!(
                    "Invalid format, wrong key in the Event_list: {}",
                    line
                )))
            }
        };
        Ok(EventHeader {
            kind,
            target: fields[1].to_string(),
            side: if fields.len() > 3 {
                fields[2].to_string()
            } else {
                String::new()
            },
            nickname: fields[fields.len() - 1].to_string(),
        })
    }
}

impl ParserParams {
    pub fn parse(sections: Vec<Vec<String>>) -> Result<ParserParams> {
        let mut pp: ParserParams = Default::default();
        for s in sections {
            match s.first().map(String::as_str) {
                Some("@Event_list") => pp.parse_event_list(&s)?,
                // not needed for decoding or generation
                Some("@Edges") | Some("@ErrorRate") => {}
                Some(string) => {
                    return Err(format_error(format!("Invalid format: wrong key {}", string)))
                }
                None => return Err(format_error("Invalid format: empty section")),
            }
        }
        Ok(pp)
    }

    /// Nickname of the gene choice event of `gene_type` ("v_choice", ...)
    pub fn gene_choice_nickname(&self, gene_type: GeneType) -> Option<&str> {
        self.find_event(EventKind::GeneChoice, gene_type.igor_target(), None)
            .map(|e| e.nickname.as_str())
    }

    /// First event of `kind` whose target starts with `target` (and on `side`)
    pub fn find_event(&self, kind: EventKind, target: &str, side: Option<&str>) -> Option<&EventHeader> {
        self.events.iter().find(|e| {
            e.kind == kind && e.target.starts_with(target) && side.map_or(true, |s| e.side == s)
        })
    }

    pub fn numbers(&self, nickname: &str) -> Result<&[i64]> {
        match self.params.get(nickname) {
            Some(EventType::Numbers(v)) => Ok(v),
            _ => Err(format_error(format!("No numerical event named {}", nickname))),
        }
    }

    fn parse_event(&mut self, str_data: &[String]) -> Result<()> {
        let header = EventHeader::parse(&str_data[0])?;
        match header.kind {
            EventKind::GeneChoice => {
                if GeneType::from_igor_target(&header.target).is_none() {
                    return Err(format_error(format!(
                        "Unknown gene choice target {}",
                        header.target
                    )));
                }
                self.params
                    .insert(header.nickname.clone(), parse_genes(&str_data[1..])?);
            }
            EventKind::Deletion | EventKind::Insertion => {
                self.params
                    .insert(header.nickname.clone(), parse_numbers(&str_data[1..])?);
            }
            // Nothing, the nucleotide order is always ACGT
            EventKind::DinucMarkov => {}
        }
        self.events.push(header);
        Ok(())
    }

    fn parse_event_list(&mut self, str_data: &[String]) -> Result<()> {
        let mut events: Vec<Vec<String>> = Vec::new();
        for line in str_data.iter().skip(1) {
            match line.chars().next() {
                Some('#') => events.push(vec![line.to_string()]),
                _ => match events.last_mut() {
                    Some(v) => v.push(line.to_string()),
                    None => {
                        return Err(format_error("Invalid file format: error with the first line"))
                    }
                },
            }
        }
        for ev in events {
            self.parse_event(&ev)?;
        }
        Ok(())
    }
}

impl ParserMarginals {
    pub fn parse(sections: Vec<Vec<String>>) -> Result<ParserMarginals> {
        let mut pm: ParserMarginals = Default::default();
        for s in sections {
            let (key, marg) = Marginal::parse(&s)?;
            pm.marginals.insert(key, marg);
        }
        Ok(pm)
    }

    pub fn get(&self, nickname: &str) -> Result<&Marginal> {
        self.marginals
            .get(nickname)
            .ok_or_else(|| format_error(format!("No marginal named {}", nickname)))
    }
}

/// Split the content of an IGoR file into its "@" sections (empty lines dropped)
pub fn parse_str(data: &str) -> Result<Vec<Vec<String>>> {
    let mut sections: Vec<Vec<String>> = Vec::new();
    for line in data.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.chars().next() {
            Some('@') => sections.push(vec![line.to_string()]),
            _ => match sections.last_mut() {
                Some(v) => v.push(line.to_string()),
                None => return Err(format_error("Invalid file format: error with the first line")),
            },
        }
    }
    Ok(sections)
}

fn parse_dim(s: &str) -> Result<Vec<usize>> {
    let caps = DIM_REGEX
        .captures(s)
        .ok_or_else(|| format_error(format!("Invalid format: {}", s)))?;
    caps[1]
        .split(',')
        .map(|num_str| usize::from_str(num_str.trim()))
        .collect::<std::result::Result<Vec<usize>, _>>()
        .map_err(|_| format_error(format!("Invalid format: {}", s)))
}

fn parse_dependence(s: &str) -> Result<(Vec<String>, Vec<usize>)> {
    // Parse lines like "#[v_choice,0],[j_choice,6]" return ["v_choice", "j_choice"] and [0, 6]
    if s == "#" {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut texts = Vec::new();
    let mut numbers = Vec::new();

    for dep_str in s.split('[').skip(1) {
        let caps = DEPENDENCE_REGEX
            .captures(dep_str)
            .ok_or_else(|| format_error(format!("Invalid format: {}", s)))?;
        texts.push(caps["text"].to_string());
        numbers.push(
            usize::from_str(&caps["number"])
                .map_err(|_| format_error(format!("Invalid format: {}", s)))?,
        );
    }
    Ok((texts, numbers))
}

fn parse_values(s: &str) -> Result<Vec<f64>> {
    s.trim_start_matches('%')
        .split(',')
        .map(|num_str| num_str.trim()) // Trim whitespace around the numbers
        .filter(|num_str| !num_str.is_empty())
        .map(|num_str| {
            num_str
                .parse::<f64>()
                .map_err(|_| format_error(format!("Invalid probability {}", num_str)))
        })
        .collect()
}
