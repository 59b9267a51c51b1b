//! In-memory mesh: coordinator and workers in one process over tokio channels

use super::link::{CoordinatorLink, Mailbox, Peer, WorkerLink, LINK_CAPACITY};
use super::protocol::WorkerId;
use tokio::sync::mpsc;

/// Wire up one coordinator and `workers` workers
pub fn local_mesh(workers: usize) -> (CoordinatorLink, Vec<WorkerLink>) {
    let (inbox_tx, inbox_rx) = mpsc::channel(LINK_CAPACITY);
    let mut peers = Vec::with_capacity(workers);
    let mut links = Vec::with_capacity(workers);

    for i in 0..workers {
        let (mailbox, control, work) = Mailbox::channel();
        peers.push(Peer::Local(mailbox));
        links.push(WorkerLink::new(WorkerId(i), inbox_tx.clone(), control, work));
    }

    (CoordinatorLink::new(peers, inbox_rx), links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvolutionError;
    use crate::network::{Inbound, Message};

    #[tokio::test]
    async fn test_addressed_send() {
        let (coordinator, mut workers) = local_mesh(3);
        assert_eq!(coordinator.worker_count(), 3);

        coordinator
            .send(WorkerId(1), Message::OffspringResponse("HI".into()))
            .await
            .unwrap();
        assert_eq!(workers[1].pending().work, 1);
        assert_eq!(workers[0].pending().work, 0);
        assert_eq!(
            workers[1].recv().await,
            Inbound::Work(Message::OffspringResponse("HI".into()))
        );
    }

    #[tokio::test]
    async fn test_recv_any_reports_sender() {
        let (mut coordinator, workers) = local_mesh(2);
        workers[1]
            .send(Message::OffspringResponse("AB".into()))
            .await
            .unwrap();
        let envelope = coordinator.recv_any().await.unwrap();
        assert_eq!(envelope.from, WorkerId(1));
        assert_eq!(envelope.message, Message::OffspringResponse("AB".into()));
    }

    #[tokio::test]
    async fn test_recv_any_timeout() {
        let (mut coordinator, workers) = local_mesh(1);
        let limit = std::time::Duration::from_millis(20);
        assert!(coordinator.recv_any_timeout(limit).await.is_err());

        workers[0].send(Message::Terminate).await.unwrap();
        let envelope = coordinator.recv_any_timeout(limit).await.unwrap().unwrap();
        assert_eq!(envelope.from, WorkerId(0));
    }

    #[tokio::test]
    async fn test_control_beats_work() {
        let (coordinator, mut workers) = local_mesh(1);
        coordinator
            .send(
                WorkerId(0),
                Message::BreedingRequest {
                    parent_a: "A".into(),
                    parent_b: "B".into(),
                },
            )
            .await
            .unwrap();
        coordinator.broadcast(&Message::Terminate).await.unwrap();

        let pending = workers[0].pending();
        assert_eq!(pending.control, 1);
        assert_eq!(pending.work, 1);
        assert_eq!(workers[0].recv().await, Inbound::Control(Message::Terminate));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_workers_past_a_dropped_one() {
        let (coordinator, mut workers) = local_mesh(3);
        drop(workers.remove(1));

        let result = coordinator.broadcast(&Message::Terminate).await;
        match result {
            Err(EvolutionError::TransportClosed(reason)) => {
                assert!(reason.contains("worker-1"));
                assert!(!reason.contains("worker-2"));
            }
            other => panic!("Expected TransportClosed, got {:?}", other),
        }
        // workers[1] is now the original worker-2
        assert_eq!(workers[0].pending().control, 1);
        assert_eq!(workers[1].pending().control, 1);
        assert_eq!(workers[1].id(), WorkerId(2));
    }

    #[tokio::test]
    async fn test_closed_when_coordinator_dropped() {
        let (coordinator, mut workers) = local_mesh(1);
        drop(coordinator);
        assert_eq!(workers[0].recv().await, Inbound::Closed);
    }

    #[tokio::test]
    async fn test_unknown_worker() {
        let (coordinator, _workers) = local_mesh(1);
        assert!(coordinator
            .send(WorkerId(5), Message::Terminate)
            .await
            .is_err());
    }
}
