//! WorkerAgent: breeds offspring on request until told to terminate
//!
//! WaitConfig -> Idle -> Breeding -> Idle ... -> Stopped. While idle the agent
//! waits on its control and work queues together; control is checked first,
//! so Terminate wins when both are pending. Breeding is never interrupted.

use crate::error::{EvolutionError, Result};
use crate::genome::Breeder;
use crate::network::{Inbound, Message, WorkerId, WorkerLink};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// What a worker did before it stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub id: WorkerId,
    /// Offspring sent back to the coordinator
    pub bred: u64,
    /// Requests answered with a rejection, plus messages ignored as out of place
    pub rejected: u64,
    /// Stopped by a Terminate message
    pub terminated: bool,
    /// Breeding requests still queued when it stopped
    pub unserved: usize,
}

pub struct WorkerAgent {
    link: WorkerLink,
    rng: StdRng,
}

impl WorkerAgent {
    pub fn new(link: WorkerLink) -> Self {
        Self {
            link,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(link: WorkerLink, seed: u64) -> Self {
        Self {
            link,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub async fn run(&mut self) -> Result<WorkerReport> {
        let id = self.link.id();
        let mut report = WorkerReport {
            id,
            bred: 0,
            rejected: 0,
            terminated: false,
            unserved: 0,
        };

        let breeder = match self.wait_config(&mut report).await? {
            Some(breeder) => breeder,
            None => {
                info!("{} terminated before configuration", id);
                return Ok(report);
            }
        };
        info!(
            "{} configured: {} crossover, mutation rate {}, target length {}",
            id,
            breeder.crossover,
            breeder.mutation_rate,
            breeder.target.len()
        );

        loop {
            match self.link.recv().await {
                Inbound::Control(Message::Terminate) => {
                    report.terminated = true;
                    break;
                }
                Inbound::Work(Message::BreedingRequest { parent_a, parent_b }) => {
                    match breeder.breed(&parent_a, &parent_b, &mut self.rng) {
                        Ok(child) => {
                            debug!("{} bred '{}'", id, child);
                            self.link.send(Message::OffspringResponse(child)).await?;
                            report.bred += 1;
                        }
                        Err(e) => {
                            warn!("{} rejected breeding request: {}", id, e);
                            report.rejected += 1;
                            self.link
                                .send(Message::BreedingRejected(e.to_string()))
                                .await?;
                        }
                    }
                }
                Inbound::Control(other) | Inbound::Work(other) => {
                    warn!("{} ignoring unexpected {:?}", id, other.tag());
                    report.rejected += 1;
                }
                Inbound::Closed => {
                    return Err(EvolutionError::TransportClosed(format!(
                        "{} lost its coordinator before Terminate",
                        id
                    )));
                }
            }
        }

        report.unserved = self.link.pending().work;
        if report.unserved > 0 {
            warn!(
                "{} stopped with {} breeding request(s) queued",
                id, report.unserved
            );
        }
        info!("{} stopped after breeding {} offspring", id, report.bred);
        Ok(report)
    }

    /// Collect the one-time configuration. `None` if Terminate arrives first.
    async fn wait_config(&mut self, report: &mut WorkerReport) -> Result<Option<Breeder>> {
        let mut crossover = None;
        let mut mutation_rate = None;
        let mut alphabet = None;
        let mut target = None;

        loop {
            if let (Some(c), Some(m), Some(a), Some(t)) =
                (crossover, mutation_rate, alphabet.as_ref(), target.as_ref())
            {
                return Ok(Some(Breeder::new(c, m, Clone::clone(a), Clone::clone(t))));
            }
            match self.link.recv_control().await {
                Some(Message::ConfigCrossover(strategy)) => crossover = Some(strategy),
                Some(Message::ConfigMutation(rate)) => mutation_rate = Some(rate),
                Some(Message::ConfigAlphabet(symbols)) => alphabet = Some(symbols),
                Some(Message::ConfigTarget(goal)) => target = Some(goal),
                Some(Message::Terminate) => {
                    report.terminated = true;
                    return Ok(None);
                }
                Some(other) => {
                    warn!(
                        "{} ignoring {:?} while waiting for configuration",
                        self.link.id(),
                        other.tag()
                    );
                    report.rejected += 1;
                }
                None => {
                    return Err(EvolutionError::TransportClosed(format!(
                        "{} lost its coordinator before configuration",
                        self.link.id()
                    )))
                }
            }
        }
    }
}
