//! Structured run events emitted by the coordinator
//!
//! The coordinator never prints. Callers that want progress output subscribe
//! to these events and render them however they like.

use crate::genome::Candidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one evaluated generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// 1-based generation number
    pub generation: u64,
    pub best: Candidate,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Breeding requests issued so far in the run
    pub total_children: u64,
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub best: Candidate,
    pub best_fitness: f64,
    /// Generations bred after the initial random population
    pub generations: u64,
    pub total_children: u64,
    /// Whether `best` equals the target
    pub converged: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Run {} | best '{}' ({:.3}) | generations={} | children={} | converged={}",
            self.run_id,
            self.best,
            self.best_fitness,
            self.generations,
            self.total_children,
            self.converged
        )
    }
}

/// Events in the order the coordinator emits them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// Initial population built and workers configured
    Started {
        run_id: Uuid,
        target: Candidate,
        population_size: usize,
        workers: usize,
    },
    /// A generation was collected and ranked
    Generation(GenerationReport),
    /// Workers were told to terminate
    Finished(RunSummary),
}
