//! Swarm - the coordinator and worker state machines
//!
//! `run_local` wires one coordinator and a pool of workers over an in-memory
//! mesh inside a single process.

mod config;
mod coordinator;
mod events;
mod worker;

pub use config::{RunConfig, DEFAULT_TARGET};
pub use coordinator::Coordinator;
pub use events::{GenerationReport, RunEvent, RunSummary};
pub use worker::{WorkerAgent, WorkerReport};

use crate::error::{EvolutionError, Result};
use crate::network::local_mesh;
use futures::future::join_all;
use log::{info, warn};
use tokio::sync::mpsc;

/// Result of a single-process run
#[derive(Debug, Clone)]
pub struct LocalRun {
    pub summary: RunSummary,
    pub workers: Vec<WorkerReport>,
}

/// Run the whole system in this process with `workers` worker tasks
pub async fn run_local(
    config: RunConfig,
    workers: usize,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
) -> Result<LocalRun> {
    config.validate(workers)?;
    let (mut link, worker_links) = local_mesh(workers);

    let handles: Vec<_> = worker_links
        .into_iter()
        .enumerate()
        .map(|(i, worker_link)| {
            let mut agent = match config.seed {
                Some(seed) => WorkerAgent::with_seed(worker_link, seed.wrapping_add(i as u64 + 1)),
                None => WorkerAgent::new(worker_link),
            };
            tokio::spawn(async move { agent.run().await })
        })
        .collect();
    info!("Spawned {} local worker(s)", handles.len());

    let mut coordinator = Coordinator::new(config);
    if let Some(tx) = events {
        coordinator = coordinator.with_events(tx);
    }
    let outcome = coordinator.run(&mut link).await;

    let mut reports = Vec::with_capacity(workers);
    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => warn!("Worker failed: {}", e),
            Err(e) => {
                return Err(EvolutionError::TransportClosed(format!(
                    "worker task panicked: {}",
                    e
                )))
            }
        }
    }

    Ok(LocalRun {
        summary: outcome?,
        workers: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Alphabet, CrossoverStrategy, SelectionStrategy};

    fn cat_config(crossover: CrossoverStrategy) -> RunConfig {
        RunConfig {
            selection: SelectionStrategy::SteadyState,
            crossover,
            mutation_rate: 0.1,
            population_size: 20,
            target: "CAT".into(),
            alphabet: Alphabet::new("ACT").unwrap(),
            seed: Some(2024),
            max_generations: Some(500),
            collect_timeout_ms: Some(5_000),
        }
    }

    #[tokio::test]
    async fn test_local_run_finds_cat() {
        let run = run_local(cat_config(CrossoverStrategy::Uniform), 4, None)
            .await
            .unwrap();

        assert!(run.summary.converged);
        assert_eq!(run.summary.best.as_str(), "CAT");
        assert_eq!(run.summary.best_fitness, 1.0);
        assert!(run.summary.generations >= 1);
        assert_eq!(run.summary.total_children % 20, 0);

        assert_eq!(run.workers.len(), 4);
        for report in &run.workers {
            assert!(report.terminated);
            assert_eq!(report.rejected, 0);
        }
        let bred: u64 = run.workers.iter().map(|r| r.bred).sum();
        assert_eq!(bred, run.summary.total_children);
    }

    #[tokio::test]
    async fn test_every_crossover_converges() {
        for crossover in [
            CrossoverStrategy::Uniform,
            CrossoverStrategy::OnePoint,
            CrossoverStrategy::LocalFitness,
        ] {
            let run = run_local(cat_config(crossover), 3, None).await.unwrap();
            assert!(run.summary.converged, "{} did not converge", crossover);
        }
    }

    #[tokio::test]
    async fn test_events_bracket_the_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = run_local(cat_config(CrossoverStrategy::Uniform), 2, Some(tx))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(RunEvent::Started { workers: 2, .. })));
        assert_eq!(events.last(), Some(&RunEvent::Finished(run.summary.clone())));
        let generations = events
            .iter()
            .filter(|e| matches!(e, RunEvent::Generation(_)))
            .count() as u64;
        assert_eq!(generations, run.summary.generations);
    }

    #[tokio::test]
    async fn test_tcp_run_finds_cat() {
        use crate::network::tcp::{accept_on, connect_worker};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepting = tokio::spawn(accept_on(listener, 2));

        let mut agents = Vec::new();
        for seed in 0..2u64 {
            let link = connect_worker(addr).await.unwrap();
            let mut agent = WorkerAgent::with_seed(link, seed);
            agents.push(tokio::spawn(async move { agent.run().await }));
        }
        let mut link = accepting.await.unwrap().unwrap();

        let summary = Coordinator::new(cat_config(CrossoverStrategy::OnePoint))
            .run(&mut link)
            .await
            .unwrap();
        assert!(summary.converged);

        let mut bred = 0;
        for agent in agents {
            let report = agent.await.unwrap().unwrap();
            assert!(report.terminated);
            bred += report.bred;
        }
        assert_eq!(bred, summary.total_children);
    }

    #[tokio::test]
    async fn test_rejects_too_few_candidates() {
        let config = RunConfig {
            population_size: 2,
            ..cat_config(CrossoverStrategy::Uniform)
        };
        assert!(matches!(
            run_local(config, 3, None).await,
            Err(EvolutionError::InvalidConfig(_))
        ));
    }
}
