//! TCP transport: coordinator and workers as separate processes
//!
//! Each worker holds one TCP connection to the coordinator. Per connection, a
//! reader task decodes frames and a writer task encodes them, so the drivers
//! only ever see the channel-based links.

use super::link::{CoordinatorLink, Mailbox, Peer, WorkerLink, LINK_CAPACITY};
use super::protocol::{read_frame, write_frame, Envelope, Message, WorkerId};
use crate::error::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

/// Bind `addr` and wait until `workers` workers have connected
pub async fn accept_workers(addr: impl ToSocketAddrs, workers: usize) -> Result<CoordinatorLink> {
    let listener = TcpListener::bind(addr).await?;
    accept_on(listener, workers).await
}

/// Accept `workers` connections on an already bound listener. Workers get
/// ids in connection order.
pub async fn accept_on(listener: TcpListener, workers: usize) -> Result<CoordinatorLink> {
    info!(
        "Waiting for {} worker(s) on {}",
        workers,
        listener.local_addr()?
    );
    let (inbox_tx, inbox_rx) = mpsc::channel(LINK_CAPACITY);
    let mut peers = Vec::with_capacity(workers);

    for i in 0..workers {
        let (stream, remote) = listener.accept().await?;
        stream.set_nodelay(true)?;
        let id = WorkerId(i);
        info!("{} connected from {}", id, remote);

        let (read_half, write_half) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::channel(LINK_CAPACITY);
        tokio::spawn(write_loop(write_half, writer_rx, id.to_string()));

        let inbox = inbox_tx.clone();
        tokio::spawn(read_loop(read_half, id.to_string(), move |message| {
            let inbox = inbox.clone();
            async move { inbox.send(Envelope { from: id, message }).await.is_ok() }
        }));
        peers.push(Peer::Remote(writer_tx));
    }

    Ok(CoordinatorLink::new(peers, inbox_rx))
}

/// Connect to a coordinator. Remote workers do not learn their coordinator-side
/// id, so the returned link reports `WorkerId(0)`.
pub async fn connect_worker(addr: impl ToSocketAddrs) -> Result<WorkerLink> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?.to_string();
    info!("Connected to coordinator at {}", peer);

    let (read_half, write_half) = stream.into_split();
    let (mailbox, control, work) = Mailbox::channel();
    tokio::spawn(read_loop(read_half, peer.clone(), move |message| {
        let mailbox = mailbox.clone();
        async move { mailbox.deliver(message).await.is_ok() }
    }));

    let (outbox_tx, mut outbox_rx) = mpsc::channel::<Envelope>(LINK_CAPACITY);
    let (writer_tx, writer_rx) = mpsc::channel(LINK_CAPACITY);
    tokio::spawn(write_loop(write_half, writer_rx, peer));
    tokio::spawn(async move {
        while let Some(envelope) = outbox_rx.recv().await {
            if writer_tx.send(envelope.message).await.is_err() {
                break;
            }
        }
    });

    Ok(WorkerLink::new(WorkerId(0), outbox_tx, control, work))
}

/// Encode queued messages onto the stream until the queue closes
async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut queue: mpsc::Receiver<Message>,
    peer: String,
) {
    while let Some(message) = queue.recv().await {
        debug!("-> {} {:?}", peer, message.tag());
        if let Err(e) = write_frame(&mut writer, &message).await {
            warn!("Failed to write to {}: {}", peer, e);
            break;
        }
    }
}

/// Decode frames and hand each message to `forward` until the stream ends or
/// `forward` returns false. Frames that fail to decode are logged and dropped.
async fn read_loop<R, F, Fut>(mut reader: R, peer: String, forward: F)
where
    R: AsyncRead + Unpin,
    F: Fn(Message) -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(body)) => match Message::decode(&body) {
                Ok(message) => {
                    debug!("<- {} {:?}", peer, message.tag());
                    if !forward(message).await {
                        break;
                    }
                }
                Err(e) => warn!("Dropping frame from {}: {}", peer, e),
            },
            Ok(None) => {
                info!("{} closed the connection", peer);
                break;
            }
            Err(e) => {
                warn!("Connection to {} failed: {}", peer, e);
                break;
            }
        }
    }
}
