//! Crossover: combining two parents into one offspring
//!
//! All variants take two equal-length parents and return a child of the same
//! length. Only `LocalFitness` looks at the target.

use super::Candidate;
use crate::error::{EvolutionError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to combine parents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossoverStrategy {
    /// Each position copied from a parent chosen by a fair coin
    #[default]
    Uniform,
    /// Prefix from parent A, suffix from parent B, cut drawn uniformly
    OnePoint,
    /// Keep whichever parent already matches the target, else a fair coin
    LocalFitness,
}

impl CrossoverStrategy {
    /// Wire id of this strategy
    pub fn id(self) -> u32 {
        match self {
            CrossoverStrategy::Uniform => 0,
            CrossoverStrategy::OnePoint => 1,
            CrossoverStrategy::LocalFitness => 2,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(CrossoverStrategy::Uniform),
            1 => Some(CrossoverStrategy::OnePoint),
            2 => Some(CrossoverStrategy::LocalFitness),
            _ => None,
        }
    }

    /// Produce one offspring from `a` and `b`
    pub fn apply<R: Rng + ?Sized>(
        self,
        a: &Candidate,
        b: &Candidate,
        target: &Candidate,
        rng: &mut R,
    ) -> Result<Candidate> {
        ensure_same_length(a, b)?;
        match self {
            CrossoverStrategy::Uniform => Ok(uniform(a, b, rng)),
            CrossoverStrategy::OnePoint => Ok(one_point(a, b, rng)),
            CrossoverStrategy::LocalFitness => {
                ensure_same_length(a, target)?;
                Ok(local_fitness(a, b, target, rng))
            }
        }
    }
}

impl fmt::Display for CrossoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrossoverStrategy::Uniform => "uniform",
            CrossoverStrategy::OnePoint => "one-point",
            CrossoverStrategy::LocalFitness => "local-fitness",
        };
        f.write_str(name)
    }
}

fn ensure_same_length(a: &Candidate, b: &Candidate) -> Result<()> {
    if a.len() != b.len() {
        return Err(EvolutionError::LengthMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

fn uniform<R: Rng + ?Sized>(a: &Candidate, b: &Candidate, rng: &mut R) -> Candidate {
    Candidate::from_symbols(
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(&x, &y)| if rng.gen_bool(0.5) { x } else { y }),
    )
}

/// One-point crossover with the cut drawn from `[0, len)`
fn one_point<R: Rng + ?Sized>(a: &Candidate, b: &Candidate, rng: &mut R) -> Candidate {
    if a.is_empty() {
        return a.clone();
    }
    let cut = rng.gen_range(0..a.len());
    one_point_at(a, b, cut)
}

/// `a[..cut] + b[cut..]`; a cut of 0 yields `b`, a cut of `len` yields `a`
pub fn one_point_at(a: &Candidate, b: &Candidate, cut: usize) -> Candidate {
    let cut = cut.min(a.len()).min(b.len());
    Candidate::from_symbols(
        a.as_bytes()[..cut]
            .iter()
            .chain(&b.as_bytes()[cut..])
            .copied(),
    )
}

fn local_fitness<R: Rng + ?Sized>(
    a: &Candidate,
    b: &Candidate,
    target: &Candidate,
    rng: &mut R,
) -> Candidate {
    Candidate::from_symbols(
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .zip(target.as_bytes())
            .map(|((&x, &y), &t)| {
                if x == t {
                    x
                } else if y == t {
                    y
                } else if rng.gen_bool(0.5) {
                    x
                } else {
                    y
                }
            }),
    )
}
