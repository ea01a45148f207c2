//! CDR3 sampling from the marginals of a recombination model
use crate::shared::distributions::{DiscreteDistribution, MarkovDNA};
use crate::shared::gene::{GeneType, GenomicSegment};
use crate::shared::model::{RecombinationModel, Topology};
use crate::shared::parser::{EventKind, Marginal, ParserMarginals, ParserParams};
use crate::shared::sequence::Dna;
use crate::{vdj, vj};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Give up after this many attempts per requested sequence
pub const MAX_ATTEMPTS_PER_SEQUENCE: usize = 1000;

/// One sampled CDR3 (from the conserved Cys to the conserved Phe/Trp)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampledCdr3 {
    pub nucleotide: Dna,
    pub v_gene: String,
    pub j_gene: String,
}

/// Anything able to produce CDR3 sequences with their gene annotations
pub trait Sampler {
    fn sample(&mut self, count: usize) -> Result<Vec<SampledCdr3>>;
}

/// Residues allowed at the end of a CDR3 (conserved J residue)
pub const CDR3_LAST_RESIDUES: [u8; 3] = [b'F', b'V', b'W'];

/// In frame, no stop codon, starts with a cysteine and ends with a conserved
/// J residue
pub fn is_productive(nucleotide: &Dna) -> bool {
    if nucleotide.is_empty() || nucleotide.len() % 3 != 0 {
        return false;
    }
    let aa = nucleotide.translate();
    aa.seq.first() == Some(&b'C')
        && aa.seq.last().map_or(false, |l| CDR3_LAST_RESIDUES.contains(l))
        && !aa.seq.contains(&b'*')
}

// Realized index of each event, keyed by nickname
pub(crate) type Realization = HashMap<String, usize>;

/// Conditional distributions of one event, cached per realization of the
/// events it depends on
#[derive(Clone, Debug)]
struct EventDistribution {
    nickname: String,
    marginal: Marginal,
    cache: HashMap<Vec<usize>, DiscreteDistribution>,
}

impl EventDistribution {
    fn sample<R: Rng>(&mut self, realization: &Realization, rng: &mut R) -> Result<usize> {
        let key = self
            .marginal
            .dependences
            .iter()
            .map(|d| {
                realization
                    .get(d)
                    .copied()
                    .ok_or_else(|| anyhow!("{} sampled before {}", self.nickname, d))
            })
            .collect::<Result<Vec<usize>>>()?;
        if !self.cache.contains_key(&key) {
            let probs = self.marginal.conditional(realization)?;
            let dist = DiscreteDistribution::new(probs)
                .with_context(|| format!("Invalid marginal {}", self.nickname))?;
            self.cache.insert(key.clone(), dist);
        }
        match self.cache.get(&key) {
            Some(dist) => Ok(dist.generate(rng)),
            None => Err(anyhow!("Missing distribution for {}", self.nickname)),
        }
    }
}

/// Samples a set of events in an order compatible with their dependences
#[derive(Clone, Debug)]
pub(crate) struct EventSampler {
    events: Vec<EventDistribution>,
}

impl EventSampler {
    pub fn new<S: AsRef<str>>(marginals: &ParserMarginals, nicknames: &[S]) -> Result<EventSampler> {
        let mut pending: Vec<EventDistribution> = nicknames
            .iter()
            .map(|nick| -> Result<EventDistribution> {
                Ok(EventDistribution {
                    nickname: nick.as_ref().to_string(),
                    marginal: marginals.get(nick.as_ref())?.clone(),
                    cache: HashMap::new(),
                })
            })
            .collect::<Result<_>>()?;

        let mut events = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|e| {
                e.marginal
                    .dependences
                    .iter()
                    .all(|d| events.iter().any(|o: &EventDistribution| &o.nickname == d))
            });
            match ready {
                Some(pos) => events.push(pending.remove(pos)),
                None => bail!(
                    "Unresolved dependences for the events {}",
                    pending
                        .iter()
                        .map(|e| format!("{} ({})", e.nickname, e.marginal.dependences.join(", ")))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
        Ok(EventSampler { events })
    }

    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> Result<Realization> {
        let mut realization = Realization::with_capacity(self.events.len());
        for event in self.events.iter_mut() {
            let value = event.sample(&realization, rng)?;
            realization.insert(event.nickname.clone(), value);
        }
        Ok(realization)
    }
}

pub(crate) fn realized(realization: &Realization, nickname: &str) -> Result<usize> {
    realization
        .get(nickname)
        .copied()
        .ok_or_else(|| anyhow!("Event {} was not sampled", nickname))
}

fn event_nickname(
    params: &ParserParams,
    kind: EventKind,
    target: &str,
    side: Option<&str>,
) -> Result<String> {
    params
        .find_event(kind, target, side)
        .map(|e| e.nickname.clone())
        .ok_or_else(|| anyhow!("No {:?} event on {} in the model parameters", kind, target))
}

pub(crate) fn gene_choice(params: &ParserParams, gene_type: GeneType) -> Result<String> {
    params
        .gene_choice_nickname(gene_type)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No gene choice event for the {} genes", gene_type))
}

/// Deletion event. Negative values are palindromic insertions, so the
/// segments are extended by `palindrome` nucleotides on that side.
#[derive(Clone, Debug)]
pub(crate) struct DeletionEvent {
    pub nickname: String,
    values: Vec<i64>,
    pub palindrome: usize,
}

impl DeletionEvent {
    pub fn find(params: &ParserParams, gene_type: GeneType, side: &str) -> Result<DeletionEvent> {
        let nickname = event_nickname(params, EventKind::Deletion, gene_type.igor_target(), Some(side))?;
        let values = params.numbers(&nickname)?.to_vec();
        let min = *values
            .iter()
            .min()
            .ok_or_else(|| anyhow!("Empty deletion event {}", nickname))?;
        Ok(DeletionEvent {
            nickname,
            values,
            palindrome: (-min).max(0) as usize,
        })
    }

    /// Number of nucleotides removed from the palindrome-extended segment
    pub fn removed(&self, realization: &Realization) -> Result<usize> {
        let idx = realized(realization, &self.nickname)?;
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| anyhow!("Realization {} out of range for {}", idx, self.nickname))?;
        Ok((value + self.palindrome as i64).max(0) as usize)
    }
}

/// Insertion event with the Markov chain generating the inserted nucleotides
#[derive(Clone, Debug)]
pub(crate) struct InsertionEvent {
    pub nickname: String,
    values: Vec<i64>,
    pub markov: MarkovDNA,
}

impl InsertionEvent {
    pub fn find(params: &ParserParams, marginals: &ParserMarginals, target: &str) -> Result<InsertionEvent> {
        let nickname = event_nickname(params, EventKind::Insertion, target, None)?;
        let values = params.numbers(&nickname)?.to_vec();
        let dinucl = event_nickname(params, EventKind::DinucMarkov, target, None)?;
        let probs: Vec<f64> = marginals.get(&dinucl)?.probabilities.iter().copied().collect();
        let coefficients = Array2::from_shape_vec((4, 4), probs)
            .map_err(|_| anyhow!("Wrong size for {}", dinucl))?;
        Ok(InsertionEvent {
            nickname,
            values,
            markov: MarkovDNA::new(coefficients.t().to_owned())?,
        })
    }

    pub fn length(&self, realization: &Realization) -> Result<usize> {
        let idx = realized(realization, &self.nickname)?;
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| anyhow!("Realization {} out of range for {}", idx, self.nickname))?;
        Ok((*value).max(0) as usize)
    }
}

/// Segment sequence (palindromes included) restricted to what the CDR3 may use
#[derive(Clone, Debug)]
pub(crate) struct CutSegment {
    pub name: String,
    pub seq: Dna,
}

fn anchored_segments(
    model: &RecombinationModel,
    gene_type: GeneType,
) -> Result<Vec<(&GenomicSegment, usize)>> {
    let segments = model
        .segments(gene_type)
        .ok_or_else(|| anyhow!("No {} genes in the model", gene_type))?;
    let anchors = model
        .anchors(gene_type)
        .ok_or_else(|| anyhow!("No CDR3 anchors for the {} genes", gene_type))?;
    segments
        .iter()
        .map(|s| {
            let anchor = anchors
                .get(&s.name)
                .ok_or_else(|| anyhow!("{} gene {} has no anchor entry", gene_type, s.name))?;
            Ok((s, anchor.anchor_position))
        })
        .collect()
}

/// V genes from the conserved Cys to their 3' end (plus palindromes)
pub(crate) fn cut_v_segments(model: &RecombinationModel, palindrome: usize) -> Result<Vec<CutSegment>> {
    Ok(anchored_segments(model, GeneType::V)?
        .into_iter()
        .map(|(segment, anchor)| CutSegment {
            name: segment.name.clone(),
            // some V genes are incomplete, they can't be used
            seq: if anchor >= segment.seq.len() {
                Dna::new()
            } else {
                let with_pal = segment.with_palindromic_ends(0, palindrome);
                with_pal.extract_subsequence(anchor, with_pal.len())
            },
        })
        .collect())
}

/// J genes from their 5' end (plus palindromes) to the end of the conserved Phe/Trp
pub(crate) fn cut_j_segments(model: &RecombinationModel, palindrome: usize) -> Result<Vec<CutSegment>> {
    Ok(anchored_segments(model, GeneType::J)?
        .into_iter()
        .map(|(segment, anchor)| CutSegment {
            name: segment.name.clone(),
            seq: if anchor >= segment.seq.len() {
                Dna::new()
            } else {
                let with_pal = segment.with_palindromic_ends(palindrome, 0);
                let added = with_pal.len() - segment.seq.len();
                with_pal.extract_subsequence(0, (anchor + 3 + added).min(with_pal.len()))
            },
        })
        .collect())
}

/// Full D genes, with their palindromes on both sides
pub(crate) fn palindromic_d_segments(
    model: &RecombinationModel,
    palindrome_5: usize,
    palindrome_3: usize,
) -> Result<Vec<CutSegment>> {
    let segments = model
        .segments(GeneType::D)
        .ok_or_else(|| anyhow!("No D genes in the model"))?;
    Ok(segments
        .iter()
        .map(|s| CutSegment {
            name: s.name.clone(),
            seq: s.with_palindromic_ends(palindrome_5, palindrome_3),
        })
        .collect())
}

#[derive(Clone, Debug)]
enum Generator {
    VJ(vj::Generator),
    VDJ(vdj::Generator),
}

/// Sampler drawing recombination events from the model marginals, keeps
/// the productive CDR3s only
#[derive(Clone, Debug)]
pub struct MarginalSampler {
    generator: Generator,
    rng: SmallRng,
}

impl MarginalSampler {
    pub fn new(model: &RecombinationModel, seed: Option<u64>) -> Result<MarginalSampler> {
        let generator = match model.topology() {
            Topology::VJ => Generator::VJ(vj::Generator::new(model)?),
            Topology::VDJ => Generator::VDJ(vdj::Generator::new(model)?),
        };
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        Ok(MarginalSampler { generator, rng })
    }
}

impl Sampler for MarginalSampler {
    fn sample(&mut self, count: usize) -> Result<Vec<SampledCdr3>> {
        let max_attempts = MAX_ATTEMPTS_PER_SEQUENCE * count;
        let mut sampled = Vec::with_capacity(count);
        let mut attempts = 0;
        while sampled.len() < count {
            if attempts >= max_attempts {
                bail!(
                    "Only {} productive CDR3s out of {} after {} attempts",
                    sampled.len(),
                    count,
                    attempts
                );
            }
            attempts += 1;
            let candidate = match &mut self.generator {
                Generator::VJ(g) => g.generate_cdr3(&mut self.rng)?,
                Generator::VDJ(g) => g.generate_cdr3(&mut self.rng)?,
            };
            if let Some(cdr3) = candidate.filter(|c| is_productive(&c.nucleotide)) {
                sampled.push(cdr3);
            }
        }
        log::debug!("{} CDR3s sampled in {} attempts", count, attempts);
        Ok(sampled)
    }
}
