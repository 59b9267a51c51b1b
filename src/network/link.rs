//! Coordinator and worker ends of the message channels
//!
//! Both the in-memory mesh and the TCP transport hand out these two types, so
//! the coordinator and worker drivers never know which one they run on.

use super::protocol::{Envelope, Message, WorkerId};
use crate::error::{EvolutionError, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;

/// Queue depth for every channel in a link
pub const LINK_CAPACITY: usize = 256;

/// Worker-side inbound router: control messages and breeding work land on
/// separate queues so the worker can give Terminate priority.
#[derive(Debug, Clone)]
pub struct Mailbox {
    control: mpsc::Sender<Message>,
    work: mpsc::Sender<Message>,
}

impl Mailbox {
    /// Create a mailbox with its control and work receivers
    pub fn channel() -> (Self, mpsc::Receiver<Message>, mpsc::Receiver<Message>) {
        let (control_tx, control_rx) = mpsc::channel(LINK_CAPACITY);
        let (work_tx, work_rx) = mpsc::channel(LINK_CAPACITY);
        (
            Self {
                control: control_tx,
                work: work_tx,
            },
            control_rx,
            work_rx,
        )
    }

    /// Route a message to the queue matching its tag
    pub async fn deliver(&self, message: Message) -> Result<()> {
        let queue = if message.tag().is_control() {
            &self.control
        } else {
            &self.work
        };
        queue
            .send(message)
            .await
            .map_err(|_| EvolutionError::TransportClosed("worker mailbox closed".to_string()))
    }
}

/// Where the coordinator's messages for one worker go
#[derive(Debug, Clone)]
pub(crate) enum Peer {
    /// Same process: deliver straight into the worker's mailbox
    Local(Mailbox),
    /// Remote: hand to the connection's frame writer
    Remote(mpsc::Sender<Message>),
}

/// Coordinator end: addressed sends to each worker, one inbox for all replies
#[derive(Debug)]
pub struct CoordinatorLink {
    peers: Vec<Peer>,
    inbox: mpsc::Receiver<Envelope>,
}

impl CoordinatorLink {
    pub(crate) fn new(peers: Vec<Peer>, inbox: mpsc::Receiver<Envelope>) -> Self {
        Self { peers, inbox }
    }

    pub fn worker_count(&self) -> usize {
        self.peers.len()
    }

    pub fn workers(&self) -> impl Iterator<Item = WorkerId> {
        (0..self.peers.len()).map(WorkerId)
    }

    /// Send one message to one worker
    pub async fn send(&self, to: WorkerId, message: Message) -> Result<()> {
        let peer = self
            .peers
            .get(to.0)
            .ok_or_else(|| EvolutionError::TransportClosed(format!("unknown {}", to)))?;
        match peer {
            Peer::Local(mailbox) => mailbox.deliver(message).await,
            Peer::Remote(writer) => writer
                .send(message)
                .await
                .map_err(|_| EvolutionError::TransportClosed(format!("{} disconnected", to))),
        }
    }

    /// Send the same message to every worker. A worker that cannot be reached
    /// does not stop delivery to the rest; the failures are reported together.
    pub async fn broadcast(&self, message: &Message) -> Result<()> {
        let mut unreachable = Vec::new();
        for worker in self.workers() {
            if self.send(worker, message.clone()).await.is_err() {
                unreachable.push(worker.to_string());
            }
        }
        if unreachable.is_empty() {
            return Ok(());
        }
        Err(EvolutionError::TransportClosed(format!(
            "{:?} not delivered to {}",
            message.tag(),
            unreachable.join(", ")
        )))
    }

    /// Wait for the next message from any worker. `None` once every worker
    /// connection has gone away.
    pub async fn recv_any(&mut self) -> Option<Envelope> {
        self.inbox.recv().await
    }

    /// `recv_any` bounded by `limit`. `Err` means nothing arrived in time.
    pub async fn recv_any_timeout(
        &mut self,
        limit: Duration,
    ) -> std::result::Result<Option<Envelope>, Elapsed> {
        tokio::time::timeout(limit, self.inbox.recv()).await
    }
}

/// What a worker's multiplexed wait produced
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Control(Message),
    Work(Message),
    Closed,
}

/// Messages queued for a worker but not yet consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pending {
    pub control: usize,
    pub work: usize,
}

/// Worker end: separate control and work queues, one outbox to the coordinator
#[derive(Debug)]
pub struct WorkerLink {
    id: WorkerId,
    outbox: mpsc::Sender<Envelope>,
    control: mpsc::Receiver<Message>,
    work: mpsc::Receiver<Message>,
}

impl WorkerLink {
    pub fn new(
        id: WorkerId,
        outbox: mpsc::Sender<Envelope>,
        control: mpsc::Receiver<Message>,
        work: mpsc::Receiver<Message>,
    ) -> Self {
        Self {
            id,
            outbox,
            control,
            work,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Send a message to the coordinator
    pub async fn send(&self, message: Message) -> Result<()> {
        self.outbox
            .send(Envelope {
                from: self.id,
                message,
            })
            .await
            .map_err(|_| EvolutionError::TransportClosed("coordinator inbox closed".to_string()))
    }

    /// Wait on the control queue only
    pub async fn recv_control(&mut self) -> Option<Message> {
        self.control.recv().await
    }

    /// Wait on both queues at once. Control is polled first, so a pending
    /// Terminate wins over a pending breeding request.
    pub async fn recv(&mut self) -> Inbound {
        tokio::select! {
            biased;
            Some(msg) = self.control.recv() => Inbound::Control(msg),
            Some(msg) = self.work.recv() => Inbound::Work(msg),
            else => Inbound::Closed,
        }
    }

    /// Queued message counts, without consuming anything
    pub fn pending(&self) -> Pending {
        Pending {
            control: self.control.len(),
            work: self.work.len(),
        }
    }
}
