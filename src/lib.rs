//! Weasel Swarm - a distributed weasel-program genetic algorithm
//!
//! A coordinator evolves a population of fixed-length strings toward a
//! target string. Breeding (crossover + mutation) is farmed out to a pool of
//! workers over message channels, in-process or over TCP.

pub mod error;
pub mod genome;
pub mod network;
pub mod swarm;

pub use error::{EvolutionError, Result};
pub use genome::{Alphabet, Breeder, Candidate, CrossoverStrategy, SelectionStrategy};
pub use network::{CoordinatorLink, Message, WorkerId, WorkerLink};
pub use swarm::{run_local, Coordinator, RunConfig, RunEvent, RunSummary, WorkerAgent};
