//! Breeder: the worker's unit of work, crossover followed by mutation

use super::{mutate, Alphabet, Candidate, CrossoverStrategy};
use crate::error::{EvolutionError, Result};
use rand::Rng;

/// Everything a worker needs to turn a parent pair into an offspring
#[derive(Debug, Clone, PartialEq)]
pub struct Breeder {
    pub crossover: CrossoverStrategy,
    pub mutation_rate: f64,
    pub alphabet: Alphabet,
    pub target: Candidate,
}

impl Breeder {
    pub fn new(
        crossover: CrossoverStrategy,
        mutation_rate: f64,
        alphabet: Alphabet,
        target: Candidate,
    ) -> Self {
        Self {
            crossover,
            mutation_rate,
            alphabet,
            target,
        }
    }

    /// Reject parents that could not have come from this run
    pub fn check_parent(&self, parent: &Candidate) -> Result<()> {
        if parent.len() != self.target.len() {
            return Err(EvolutionError::LengthMismatch {
                expected: self.target.len(),
                actual: parent.len(),
            });
        }
        self.alphabet.validate(parent)
    }

    pub fn breed<R: Rng + ?Sized>(
        &self,
        a: &Candidate,
        b: &Candidate,
        rng: &mut R,
    ) -> Result<Candidate> {
        self.check_parent(a)?;
        self.check_parent(b)?;
        let child = self.crossover.apply(a, b, &self.target, rng)?;
        Ok(mutate(&child, self.mutation_rate, &self.alphabet, rng))
    }
}
