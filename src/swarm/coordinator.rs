//! Coordinator: owns the population and drives the generation loop
//!
//! Init -> Distribute -> Collect -> Evaluate -> (Distribute | Terminate).
//! Collect takes offspring from whichever worker answers first and keeps that
//! worker busy until the generation is full, so progress depends only on the
//! number of replies, never on their order.

use super::config::RunConfig;
use super::events::{GenerationReport, RunEvent, RunSummary};
use crate::error::{EvolutionError, Result};
use crate::genome::{random_population, rank, Candidate, FitnessEvaluator, RankedPopulation};
use crate::network::{CoordinatorLink, Envelope, Message, WorkerId};
use chrono::Utc;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct Coordinator {
    config: RunConfig,
    evaluator: FitnessEvaluator,
    rng: StdRng,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
    run_id: Uuid,
    /// Breeding requests issued in the current run
    total_children: u64,
    /// Terminate already went out in the current run
    terminate_sent: bool,
}

impl Coordinator {
    pub fn new(config: RunConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            evaluator: FitnessEvaluator::new(config.target.clone()),
            config,
            rng,
            events: None,
            run_id: Uuid::new_v4(),
            total_children: 0,
            terminate_sent: false,
        }
    }

    /// Emit run events on `events` as the run progresses
    pub fn with_events(mut self, events: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run until the target is found (or `max_generations` is hit), then send
    /// Terminate to every worker. On error, workers that have not yet been
    /// told to terminate are told before the error is returned.
    pub async fn run(&mut self, link: &mut CoordinatorLink) -> Result<RunSummary> {
        self.config.validate(link.worker_count())?;
        self.run_id = Uuid::new_v4();
        self.total_children = 0;
        self.terminate_sent = false;

        match self.evolve(link).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!("Run {} failed: {}", self.run_id, e);
                self.terminate_workers(link).await;
                Err(e)
            }
        }
    }

    /// Send Terminate to every reachable worker, at most once per run.
    /// Unreachable workers are logged; they are already gone.
    async fn terminate_workers(&mut self, link: &CoordinatorLink) {
        if self.terminate_sent {
            return;
        }
        self.terminate_sent = true;
        if let Err(e) = link.broadcast(&Message::Terminate).await {
            warn!("Run {}: {}", self.run_id, e);
        }
    }

    async fn evolve(&mut self, link: &mut CoordinatorLink) -> Result<RunSummary> {
        let started_at = Utc::now();
        let workers = link.worker_count();

        let population = random_population(
            self.config.population_size,
            self.config.target.len(),
            &self.config.alphabet,
            &mut self.rng,
        );
        self.configure_workers(link).await?;
        info!(
            "Run {} started: target '{}', population {}, {} worker(s), {} crossover, mutation rate {}",
            self.run_id,
            self.config.target,
            self.config.population_size,
            workers,
            self.config.crossover,
            self.config.mutation_rate
        );
        self.emit(RunEvent::Started {
            run_id: self.run_id,
            target: self.config.target.clone(),
            population_size: self.config.population_size,
            workers,
        });

        let mut generation = 0u64;
        let mut ranked = rank(&population, &self.evaluator)?;
        loop {
            let next = self.breed_generation(link, &ranked).await?;
            generation += 1;

            let ranked_next = rank(&next, &self.evaluator)?;
            let best = ranked_next
                .best()
                .cloned()
                .ok_or(EvolutionError::EmptyPopulation)?;
            info!(
                "Generation {}: closest '{}' fitness={:.3}",
                generation, best.candidate, best.fitness
            );
            self.emit(RunEvent::Generation(GenerationReport {
                generation,
                best: best.candidate.clone(),
                best_fitness: best.fitness,
                mean_fitness: ranked_next.mean_fitness(),
                total_children: self.total_children,
            }));

            let converged = best.fitness >= 1.0;
            let exhausted = self
                .config
                .max_generations
                .map_or(false, |limit| generation >= limit);
            if converged || exhausted {
                self.terminate_workers(link).await;
                let summary = RunSummary {
                    run_id: self.run_id,
                    best: best.candidate,
                    best_fitness: best.fitness,
                    generations: generation,
                    total_children: self.total_children,
                    converged,
                    started_at,
                    finished_at: Utc::now(),
                };
                info!("{}", summary.summary());
                self.emit(RunEvent::Finished(summary.clone()));
                return Ok(summary);
            }
            ranked = ranked_next;
        }
    }

    /// One-time configuration of every worker
    async fn configure_workers(&self, link: &CoordinatorLink) -> Result<()> {
        link.broadcast(&Message::ConfigCrossover(self.config.crossover))
            .await?;
        link.broadcast(&Message::ConfigMutation(self.config.mutation_rate))
            .await?;
        link.broadcast(&Message::ConfigAlphabet(self.config.alphabet.clone()))
            .await?;
        link.broadcast(&Message::ConfigTarget(self.config.target.clone()))
            .await
    }

    /// Distribute one request per worker, then collect until the next
    /// generation holds exactly `population_size` offspring.
    async fn breed_generation(
        &mut self,
        link: &mut CoordinatorLink,
        ranked: &RankedPopulation,
    ) -> Result<Vec<Candidate>> {
        let size = self.config.population_size;
        let mut next = Vec::with_capacity(size);
        let mut issued = 0usize;

        for worker in link.workers() {
            if issued == size {
                break;
            }
            self.request(link, worker, ranked).await?;
            issued += 1;
        }

        while next.len() < size {
            let envelope = self.next_response(link, issued - next.len()).await?;
            match envelope.message {
                Message::OffspringResponse(child) => {
                    if let Err(e) = self.check_offspring(&child) {
                        warn!("Discarding offspring from {}: {}", envelope.from, e);
                        self.request(link, envelope.from, ranked).await?;
                        continue;
                    }
                    next.push(child);
                    if issued < size {
                        self.request(link, envelope.from, ranked).await?;
                        issued += 1;
                    }
                }
                Message::BreedingRejected(reason) => {
                    warn!("{} rejected its request: {}", envelope.from, reason);
                    self.request(link, envelope.from, ranked).await?;
                }
                other => warn!(
                    "Ignoring unexpected {:?} from {}",
                    other.tag(),
                    envelope.from
                ),
            }
        }
        Ok(next)
    }

    /// Select two parents independently and send them to `worker`
    async fn request(
        &mut self,
        link: &CoordinatorLink,
        worker: WorkerId,
        ranked: &RankedPopulation,
    ) -> Result<()> {
        let selection = self.config.selection;
        let parent_a = selection.select(ranked, &mut self.rng)?.clone();
        let parent_b = selection.select(ranked, &mut self.rng)?.clone();
        debug!("Request to {}: '{}' x '{}'", worker, parent_a, parent_b);
        link.send(worker, Message::BreedingRequest { parent_a, parent_b })
            .await?;
        self.total_children += 1;
        Ok(())
    }

    /// Block for the next reply from any worker, bounded by the collect
    /// timeout when one is configured
    async fn next_response(
        &self,
        link: &mut CoordinatorLink,
        outstanding: usize,
    ) -> Result<Envelope> {
        let received = match self.config.collect_timeout() {
            Some(limit) => link
                .recv_any_timeout(limit)
                .await
                .map_err(|_| EvolutionError::Stall {
                    waited_ms: limit.as_millis() as u64,
                    outstanding,
                })?,
            None => link.recv_any().await,
        };
        received.ok_or_else(|| {
            EvolutionError::TransportClosed(format!(
                "every worker disconnected with {} response(s) outstanding",
                outstanding
            ))
        })
    }

    fn check_offspring(&self, child: &Candidate) -> Result<()> {
        if child.len() != self.config.target.len() {
            return Err(EvolutionError::LengthMismatch {
                expected: self.config.target.len(),
                actual: child.len(),
            });
        }
        self.config.alphabet.validate(child)
    }

    fn emit(&self, event: RunEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
