//! Genome - candidates, fitness and the genetic operators
//!
//! Pure, synchronous building blocks shared by the coordinator (ranking,
//! selection) and the workers (crossover, mutation).

mod alphabet;
mod breeder;
mod crossover;
mod fitness;
mod mutation;
mod population;

pub use alphabet::{Alphabet, Candidate, DEFAULT_SYMBOLS};
pub use breeder::Breeder;
pub use crossover::{one_point_at, CrossoverStrategy};
pub use fitness::{fitness, FitnessEvaluator};
pub use mutation::{max_shift, mutate, MAX_SHIFT};
pub use population::{random_population, rank, RankedPopulation, Scored, SelectionStrategy};
