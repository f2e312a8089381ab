//! Messaging substrate boundary.
//!
//! The pool never talks to a transport directly; it drives a
//! [`Communicator`] handle injected at session construction. The handle is
//! the group membership: constructing the group is "init", dropping the
//! handles is "finalize", and both must happen exactly once per process
//! lifetime, before and after any session use respectively.
//!
//! [`local::LocalGroup`] provides an in-process implementation used by the
//! tests and by single-host embeddings; anything that can satisfy the trait
//! (an MPI binding, a socket mesh) can replace it.

pub mod local;

pub use local::{LocalComm, LocalGroup};

use async_trait::async_trait;
use thiserror::Error;

/// Zero-based process rank within the group.
pub type Rank = usize;

/// Message tag distinguishing this protocol's traffic from unrelated
/// messages sharing the substrate.
pub type Tag = u32;

/// Errors raised by a [`Communicator`] implementation.
#[derive(Debug, Error)]
pub enum CommError {
    /// A peer or the whole group went away mid-operation.
    #[error("process group unavailable: {0}")]
    GroupClosed(String),

    /// A broadcast frame arrived from a rank other than the expected root.
    #[error("broadcast frame from rank {actual}, expected root {expected}")]
    RootMismatch { expected: Rank, actual: Rank },

    /// A rank argument does not exist in this group.
    #[error("rank {rank} out of range for group of {size}")]
    RankOutOfRange { rank: Rank, size: usize },
}

/// Group-communication contract the pool is built on.
///
/// All operations run to completion before returning; there is no polling
/// or try-variant surface. Frames are opaque byte vectors — framing of the
/// protocol's own messages lives in [`crate::message`].
#[async_trait]
pub trait Communicator: Send + Sync {
    /// Rank of this process within the group.
    fn rank(&self) -> Rank;

    /// Total number of processes in the group.
    fn size(&self) -> usize;

    /// Root side of a group-wide broadcast: deliver `frame` to every other
    /// rank. Completes once the frame is accepted by the substrate.
    async fn broadcast(&self, frame: Vec<u8>) -> std::result::Result<(), CommError>;

    /// Non-root side of a broadcast: wait for the next frame from `root`.
    async fn recv_broadcast(&self, root: Rank) -> std::result::Result<Vec<u8>, CommError>;

    /// Tagged point-to-point send to `dest`.
    async fn send(&self, dest: Rank, tag: Tag, frame: Vec<u8>)
        -> std::result::Result<(), CommError>;

    /// Tagged receive from any source. Returns the frame and the rank that
    /// sent it. Frames bearing other tags must be held back for their own
    /// receivers, never dropped.
    async fn recv_any(&self, tag: Tag) -> std::result::Result<(Vec<u8>, Rank), CommError>;
}
