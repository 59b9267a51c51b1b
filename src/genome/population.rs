//! Population ranking and parent selection
//!
//! A ranked population is sorted ascending by fitness with a stable sort, so
//! equal scores keep their input order and ranking is reproducible.

use super::{Alphabet, Candidate, FitnessEvaluator};
use crate::error::{EvolutionError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Share of the ranked population excluded from steady-state selection
const STEADY_STATE_CUTOFF: (usize, usize) = (4, 5);

/// A candidate paired with its fitness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    pub candidate: Candidate,
    pub fitness: f64,
}

/// Candidates ordered ascending by fitness
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPopulation {
    members: Vec<Scored>,
}

impl RankedPopulation {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scored> {
        self.members.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scored> {
        self.members.iter()
    }

    /// Fittest member; among equal top scores, the one latest in input order
    pub fn best(&self) -> Option<&Scored> {
        self.members.last()
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|s| s.fitness).sum::<f64>() / self.members.len() as f64
    }
}

/// Score every candidate and sort ascending, keeping input order on ties
pub fn rank(population: &[Candidate], evaluator: &FitnessEvaluator) -> Result<RankedPopulation> {
    let mut members = population
        .iter()
        .map(|candidate| {
            Ok(Scored {
                fitness: evaluator.score(candidate)?,
                candidate: candidate.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    // slice::sort_by is stable
    members.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
    Ok(RankedPopulation { members })
}

/// Build `size` uniformly random candidates of `length` symbols
pub fn random_population<R: Rng + ?Sized>(
    size: usize,
    length: usize,
    alphabet: &Alphabet,
    rng: &mut R,
) -> Vec<Candidate> {
    (0..size)
        .map(|_| alphabet.random_candidate(length, rng))
        .collect()
}

/// Policy for choosing a parent from a ranked population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Uniform draw from the fittest 20%
    #[default]
    SteadyState,
}

impl SelectionStrategy {
    pub fn id(self) -> u32 {
        match self {
            SelectionStrategy::SteadyState => 0,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(SelectionStrategy::SteadyState),
            _ => None,
        }
    }

    /// Index range this strategy draws from for a population of `n`
    pub fn eligible_range(self, n: usize) -> std::ops::Range<usize> {
        match self {
            SelectionStrategy::SteadyState => {
                let (num, den) = STEADY_STATE_CUTOFF;
                // floor(0.8 * n) < n for every n >= 1
                (n * num / den)..n
            }
        }
    }

    /// Pick one parent. Each call is independent, so both parents of a pair
    /// may be the same individual.
    pub fn select<'a, R: Rng + ?Sized>(
        self,
        ranked: &'a RankedPopulation,
        rng: &mut R,
    ) -> Result<&'a Candidate> {
        if ranked.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let index = rng.gen_range(self.eligible_range(ranked.len()));
        Ok(&ranked.members[index].candidate)
    }
}
