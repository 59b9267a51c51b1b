//! Fitness: fraction of positions where a candidate matches the target

use super::Candidate;
use crate::error::{EvolutionError, Result};

/// Score `candidate` against `target`: matching positions divided by length.
///
/// 1.0 iff the two strings are equal. Differing lengths are a contract
/// violation and fail with `LengthMismatch`.
pub fn fitness(candidate: &Candidate, target: &Candidate) -> Result<f64> {
    if candidate.len() != target.len() {
        return Err(EvolutionError::LengthMismatch {
            expected: target.len(),
            actual: candidate.len(),
        });
    }
    if target.is_empty() {
        return Ok(1.0);
    }
    let matches = candidate
        .as_bytes()
        .iter()
        .zip(target.as_bytes())
        .filter(|(c, t)| c == t)
        .count();
    Ok(matches as f64 / target.len() as f64)
}

/// Scores candidates against a fixed target
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    target: Candidate,
}

impl FitnessEvaluator {
    pub fn new(target: Candidate) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Candidate {
        &self.target
    }

    pub fn score(&self, candidate: &Candidate) -> Result<f64> {
        fitness(candidate, &self.target)
    }

    pub fn is_solution(&self, candidate: &Candidate) -> bool {
        candidate == &self.target
    }
}
