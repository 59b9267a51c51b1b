//! RunConfig: parameters of one evolutionary run
//!
//! Built once before the run and never changed while it runs. Loadable from
//! and savable to JSON; every field has a default.

use crate::error::{EvolutionError, Result};
use crate::genome::{Alphabet, Breeder, Candidate, CrossoverStrategy, SelectionStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Target of the classic weasel program
pub const DEFAULT_TARGET: &str = "METHINKS IT IS LIKE A WEASEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How parents are picked from the ranked population
    pub selection: SelectionStrategy,
    /// How workers combine parents
    pub crossover: CrossoverStrategy,
    /// Per-symbol mutation probability
    pub mutation_rate: f64,
    /// Candidates per generation (P)
    pub population_size: usize,
    /// String the search converges on
    pub target: Candidate,
    /// Symbol ring; the target must be spelled in it
    pub alphabet: Alphabet,
    /// Seed for reproducible local runs; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Stop after this many generations even without an exact match
    pub max_generations: Option<u64>,
    /// Give up collecting after this long without any offspring arriving.
    /// `None` waits forever on a silent worker.
    pub collect_timeout_ms: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            selection: SelectionStrategy::SteadyState,
            crossover: CrossoverStrategy::Uniform,
            mutation_rate: 0.05,
            population_size: 100,
            target: Candidate::from(DEFAULT_TARGET),
            alphabet: Alphabet::default(),
            seed: None,
            max_generations: None,
            collect_timeout_ms: None,
        }
    }
}

impl RunConfig {
    /// Check the configuration against a pool of `workers` workers
    pub fn validate(&self, workers: usize) -> Result<()> {
        if workers == 0 {
            return Err(EvolutionError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        if self.population_size < workers {
            return Err(EvolutionError::InvalidConfig(format!(
                "population size {} is smaller than the worker pool ({})",
                self.population_size, workers
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolutionError::InvalidConfig(format!(
                "mutation rate {} is outside [0, 1]",
                self.mutation_rate
            )));
        }
        if self.target.is_empty() {
            return Err(EvolutionError::InvalidConfig(
                "target must not be empty".to_string(),
            ));
        }
        self.alphabet
            .validate(&self.target)
            .map_err(|e| EvolutionError::InvalidConfig(format!("target: {}", e)))?;
        if self.max_generations == Some(0) {
            return Err(EvolutionError::InvalidConfig(
                "max_generations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collect_timeout(&self) -> Option<Duration> {
        self.collect_timeout_ms.map(Duration::from_millis)
    }

    /// The read-only part of the configuration a worker breeds with
    pub fn breeder(&self) -> Breeder {
        Breeder::new(
            self.crossover,
            self.mutation_rate,
            self.alphabet.clone(),
            self.target.clone(),
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate(4).is_ok());
        assert_eq!(config.target.len(), 28);
    }

    #[test]
    fn test_population_must_cover_workers() {
        let config = RunConfig {
            population_size: 3,
            ..RunConfig::default()
        };
        assert!(config.validate(3).is_ok());
        assert!(config.validate(4).is_err());
        assert!(config.validate(0).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        let rate = RunConfig {
            mutation_rate: 1.5,
            ..RunConfig::default()
        };
        assert!(rate.validate(1).is_err());

        let nan = RunConfig {
            mutation_rate: f64::NAN,
            ..RunConfig::default()
        };
        assert!(nan.validate(1).is_err());

        let foreign = RunConfig {
            target: "lowercase".into(),
            ..RunConfig::default()
        };
        assert!(matches!(
            foreign.validate(1),
            Err(EvolutionError::InvalidConfig(_))
        ));

        let empty = RunConfig {
            target: "".into(),
            ..RunConfig::default()
        };
        assert!(empty.validate(1).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{"target": "CAT", "alphabet": "ACT", "crossover": "OnePoint"}"#,
        )
        .unwrap();
        assert_eq!(config.target.as_str(), "CAT");
        assert_eq!(config.crossover, CrossoverStrategy::OnePoint);
        assert_eq!(config.population_size, 100);
        assert!(config.validate(2).is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("weasel-config-{}.json", uuid::Uuid::new_v4()));
        let config = RunConfig {
            seed: Some(7),
            collect_timeout_ms: Some(500),
            ..RunConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = RunConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
        assert_eq!(loaded.collect_timeout(), Some(Duration::from_millis(500)));
    }
}
