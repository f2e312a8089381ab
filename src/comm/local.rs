//! In-process channel-backed communicator.
//!
//! One bounded broadcast ring carries instruction frames to every rank; a
//! per-rank mpsc mailbox carries tagged point-to-point traffic. Each
//! [`LocalComm`] is owned by exactly one task, so the interior mutexes are
//! uncontended.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{CommError, Communicator, Rank, Tag};

const BCAST_CAPACITY: usize = 8;
const MAILBOX_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct BcastFrame {
    root: Rank,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct Envelope {
    source: Rank,
    tag: Tag,
    payload: Vec<u8>,
}

struct Inbox {
    rx: mpsc::Receiver<Envelope>,
    /// Frames received under a tag nobody has asked for yet.
    stash: VecDeque<Envelope>,
}

/// Factory for a fixed-size in-process group.
pub struct LocalGroup;

impl LocalGroup {
    /// Create the group and hand out one communicator per rank.
    ///
    /// This is the group's "init"; dropping the returned handles is its
    /// "finalize". Call it once per group lifetime and move each handle
    /// into the task that plays that rank.
    pub fn create(size: usize) -> Vec<LocalComm> {
        let (bcast_tx, bcast_rx) = async_broadcast::broadcast(BCAST_CAPACITY);

        let mut mail_txs = Vec::with_capacity(size);
        let mut mail_rxs = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
            mail_txs.push(tx);
            mail_rxs.push(rx);
        }

        mail_rxs
            .into_iter()
            .enumerate()
            .map(|(rank, rx)| LocalComm {
                rank,
                size,
                bcast_tx: bcast_tx.clone(),
                bcast_rx: Mutex::new(bcast_rx.clone()),
                peers: mail_txs.clone(),
                inbox: Mutex::new(Inbox {
                    rx,
                    stash: VecDeque::new(),
                }),
            })
            .collect()
        // The template bcast_rx drops here, leaving one active receiver per
        // rank; the ring drains as each rank consumes its copy.
    }
}

/// One rank's handle onto an in-process group.
pub struct LocalComm {
    rank: Rank,
    size: usize,
    bcast_tx: async_broadcast::Sender<BcastFrame>,
    bcast_rx: Mutex<async_broadcast::Receiver<BcastFrame>>,
    peers: Vec<mpsc::Sender<Envelope>>,
    inbox: Mutex<Inbox>,
}

#[async_trait]
impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn broadcast(&self, frame: Vec<u8>) -> Result<(), CommError> {
        self.bcast_tx
            .broadcast(BcastFrame {
                root: self.rank,
                payload: frame,
            })
            .await
            .map_err(|e| CommError::GroupClosed(e.to_string()))?;
        // The collective includes the root: consume our own copy so the
        // ring drains even though the root never calls recv_broadcast.
        let own = self
            .bcast_rx
            .lock()
            .await
            .recv()
            .await
            .map_err(|e| CommError::GroupClosed(e.to_string()))?;
        if own.root != self.rank {
            return Err(CommError::RootMismatch {
                expected: self.rank,
                actual: own.root,
            });
        }
        tracing::trace!(root = self.rank, "broadcast delivered to ring");
        Ok(())
    }

    async fn recv_broadcast(&self, root: Rank) -> Result<Vec<u8>, CommError> {
        let frame = self
            .bcast_rx
            .lock()
            .await
            .recv()
            .await
            .map_err(|e| CommError::GroupClosed(e.to_string()))?;
        if frame.root != root {
            return Err(CommError::RootMismatch {
                expected: root,
                actual: frame.root,
            });
        }
        Ok(frame.payload)
    }

    async fn send(&self, dest: Rank, tag: Tag, frame: Vec<u8>) -> Result<(), CommError> {
        let peer = self.peers.get(dest).ok_or(CommError::RankOutOfRange {
            rank: dest,
            size: self.size,
        })?;
        peer.send(Envelope {
            source: self.rank,
            tag,
            payload: frame,
        })
        .await
        .map_err(|_| CommError::GroupClosed(format!("mailbox of rank {dest} closed")))?;
        tracing::trace!(from = self.rank, to = dest, tag, "point-to-point send");
        Ok(())
    }

    async fn recv_any(&self, tag: Tag) -> Result<(Vec<u8>, Rank), CommError> {
        let mut inbox = self.inbox.lock().await;
        if let Some(pos) = inbox.stash.iter().position(|e| e.tag == tag) {
            if let Some(env) = inbox.stash.remove(pos) {
                return Ok((env.payload, env.source));
            }
        }
        loop {
            let env = inbox
                .rx
                .recv()
                .await
                .ok_or_else(|| CommError::GroupClosed("all peers dropped".into()))?;
            if env.tag == tag {
                return Ok((env.payload, env.source));
            }
            inbox.stash.push_back(env);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_other_rank() {
        let mut comms = LocalGroup::create(3);
        let c2 = comms.pop().unwrap();
        let c1 = comms.pop().unwrap();
        let c0 = comms.pop().unwrap();

        let h1 = tokio::spawn(async move { c1.recv_broadcast(0).await.unwrap() });
        let h2 = tokio::spawn(async move { c2.recv_broadcast(0).await.unwrap() });
        c0.broadcast(vec![1, 2, 3]).await.unwrap();

        assert_eq!(h1.await.unwrap(), vec![1, 2, 3]);
        assert_eq!(h2.await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_recv_any_reports_source_rank() {
        let mut comms = LocalGroup::create(3);
        let c2 = comms.pop().unwrap();
        let c1 = comms.pop().unwrap();
        let c0 = comms.pop().unwrap();

        c1.send(0, 7, vec![11]).await.unwrap();
        c2.send(0, 7, vec![22]).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (payload, source) = c0.recv_any(7).await.unwrap();
            seen.push((source, payload));
        }
        seen.sort();
        assert_eq!(seen, vec![(1, vec![11]), (2, vec![22])]);
    }

    #[tokio::test]
    async fn test_unmatched_tags_are_stashed_not_dropped() {
        let mut comms = LocalGroup::create(2);
        let c1 = comms.pop().unwrap();
        let c0 = comms.pop().unwrap();

        c1.send(0, 1, vec![1]).await.unwrap();
        c1.send(0, 2, vec![2]).await.unwrap();

        // Ask for the later tag first; the earlier frame must survive.
        let (payload, _) = c0.recv_any(2).await.unwrap();
        assert_eq!(payload, vec![2]);
        let (payload, _) = c0.recv_any(1).await.unwrap();
        assert_eq!(payload, vec![1]);
    }

    #[tokio::test]
    async fn test_send_to_unknown_rank_fails() {
        let mut comms = LocalGroup::create(2);
        let _c1 = comms.pop().unwrap();
        let c0 = comms.pop().unwrap();

        let err = c0.send(5, 0, vec![]).await.unwrap_err();
        assert!(matches!(err, CommError::RankOutOfRange { rank: 5, size: 2 }));
    }
}
