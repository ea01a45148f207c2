//! Distributions used by the CDR3 sampler
use crate::shared::sequence::{nucleotides_inv, Dna, NUCLEOTIDES};
use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, WeightedAliasIndex};

const EPSILON: f64 = 1e-10;

/// Generate an integer with a given probability
#[derive(Clone, Debug)]
pub struct DiscreteDistribution {
    distribution: WeightedAliasIndex<f64>,
}

impl DiscreteDistribution {
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(anyhow!("Error when creating distribution: no weights"));
        }
        if !weights.iter().all(|&x| x >= 0.) {
            return Err(anyhow!(
                "Error when creating distribution: negative weights"
            ));
        }

        let distribution = match weights.iter().sum::<f64>().abs() < 1e-10 {
            // when all the values are 0, all the values are equiprobable.
            true => WeightedAliasIndex::new(vec![1.; weights.len()])
                .map_err(|e| anyhow!("Error when creating distribution: {}", e))?,
            false => WeightedAliasIndex::new(weights)
                .map_err(|e| anyhow!("Error when creating distribution: {}", e))?,
        };
        Ok(DiscreteDistribution { distribution })
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> usize {
        self.distribution.sample(rng)
    }
}

// Markov chain structure (for the insertion process)
#[derive(Clone, Debug)]
pub struct MarkovDNA {
    transition_matrix: Vec<DiscreteDistribution>, // Markov matrix, ACGT order
    first_nucleotide: DiscreteDistribution, // steady state of the chain
}

impl MarkovDNA {
    /// `transition_probs[[i, j]]` is the probability of `j` following `i`
    pub fn new(transition_probs: Array2<f64>) -> Result<Self> {
        if transition_probs.dim() != (4, 4) {
            return Err(anyhow!(
                "Invalid dinucleotide Markov matrix, expected 4x4 got {:?}",
                transition_probs.dim()
            ));
        }
        let mut transition_matrix = Vec::with_capacity(transition_probs.dim().0);
        for probs in transition_probs.axis_iter(Axis(0)) {
            transition_matrix.push(DiscreteDistribution::new(probs.to_vec())?);
        }
        let steady_state = calc_steady_state_dist(&transition_probs)?;
        Ok(MarkovDNA {
            transition_matrix,
            first_nucleotide: DiscreteDistribution::new(steady_state)?,
        })
    }

    /// Generate `length` nucleotides following `previous_nucleotide`. An
    /// unknown (or ambiguous) previous nucleotide gives a start state drawn
    /// from the steady-state distribution of the chain.
    pub fn generate<R: Rng>(&self, length: usize, previous_nucleotide: u8, rng: &mut R) -> Dna {
        let mut dna = Dna {
            seq: Vec::with_capacity(length),
        };
        let mut current_state = nucleotides_inv(previous_nucleotide)
            .unwrap_or_else(|| self.first_nucleotide.generate(rng));
        for _ in 0..length {
            current_state = self.transition_matrix[current_state].generate(rng);
            dna.seq.push(NUCLEOTIDES[current_state]);
        }
        dna
    }
}

/// Rows normalized to one, an all-zero row becomes uniform
fn normalize_transition_matrix(tm: &Array2<f64>) -> Array2<f64> {
    let mut normalized = tm.clone();
    for mut row in normalized.axis_iter_mut(Axis(0)) {
        let sum = row.sum();
        if sum.abs() < EPSILON {
            row.fill(1. / row.len() as f64);
        } else {
            row /= sum;
        }
    }
    normalized
}

/// Stationary distribution `p` of the chain (`p = p.M`), by power iteration
pub fn calc_steady_state_dist(transition_matrix: &Array2<f64>) -> Result<Vec<f64>> {
    let mat = normalize_transition_matrix(transition_matrix);
    let n = mat.nrows();
    // (M + I) / 2 has the same stationary distribution and is aperiodic
    let lazy = (&mat + &Array2::<f64>::eye(n)) / 2.;
    let mut vec = Array1::from_elem(n, 1.0 / n as f64);
    for _ in 0..10000 {
        let vec_next = lazy.t().dot(&vec);
        let vec_next = &vec_next / vec_next.sum();
        if (&vec_next - &vec).mapv(|a| a.abs()).sum() < EPSILON {
            return Ok(vec_next.to_vec());
        }
        vec = vec_next;
    }
    Err(anyhow!("No stationary distribution found for the Markov matrix"))
}
