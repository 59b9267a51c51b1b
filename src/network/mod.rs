//! Network module - point-to-point messaging between coordinator and workers
//!
//! The drivers talk through `CoordinatorLink` / `WorkerLink`. `mesh` builds
//! them in memory for single-process runs and tests, `tcp` over sockets.

mod link;
pub mod mesh;
mod protocol;
pub mod tcp;

pub use link::{CoordinatorLink, Inbound, Mailbox, Pending, WorkerLink, LINK_CAPACITY};
pub use mesh::local_mesh;
pub use protocol::{
    read_frame, write_frame, Envelope, Message, MessageTag, WorkerId, MAX_FRAME_LEN,
};
