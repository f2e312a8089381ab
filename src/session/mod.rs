//! Coordination session: role split at construction, then the manager's
//! broadcast-then-gather loop or the worker's receive-compute-reply loop.
//!
//! Construction is side-effect-free on every rank. The caller pattern is:
//!
//! ```ignore
//! match PoolProcess::new(comm, config, data, callback)? {
//!     PoolProcess::Worker(worker) => worker.run().await?, // blocks until terminate
//!     PoolProcess::Manager(mut manager) => {
//!         let result = manager.evaluate(&instruction).await?;
//!         // ... any number of further rounds ...
//!         manager.terminate().await?;
//!     }
//! }
//! ```

mod manager;
mod worker;

pub use manager::ManagerSession;
pub use worker::WorkerSession;

use std::sync::Arc;

use crate::comm::{Communicator, Rank, Tag};
use crate::error::Result;
use crate::partition::balance;
use crate::role::RoleAssignment;

/// Well-known rank playing manager unless configured otherwise.
pub const DEFAULT_MANAGER_RANK: Rank = 0;

/// Default tag for reply traffic: 0xda7a, "data".
pub const DEFAULT_REPLY_TAG: Tag = 0xda7a;

/// Per-slice compute callback applied by each worker.
///
/// Must be pure with respect to its inputs and return exactly
/// `slice.len()` values; a wrong-length return is fatal to the worker.
pub trait WorkCallback: Send + Sync {
    fn apply(&self, instruction: &[f64], slice: &[f64]) -> Vec<f64>;
}

impl<F> WorkCallback for F
where
    F: Fn(&[f64], &[f64]) -> Vec<f64> + Send + Sync,
{
    fn apply(&self, instruction: &[f64], slice: &[f64]) -> Vec<f64> {
        self(instruction, slice)
    }
}

/// Session parameters. Every participating process must construct its pool
/// with identical values — this cannot be verified across processes.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Length of every instruction vector.
    pub ins_size: usize,
    /// Rank designated as manager.
    pub manager_rank: Rank,
    /// Tag distinguishing reply frames from unrelated traffic.
    pub reply_tag: Tag,
}

impl PoolConfig {
    pub fn new(ins_size: usize) -> Self {
        Self {
            ins_size,
            manager_rank: DEFAULT_MANAGER_RANK,
            reply_tag: DEFAULT_REPLY_TAG,
        }
    }

    pub fn manager_rank(mut self, rank: Rank) -> Self {
        self.manager_rank = rank;
        self
    }

    pub fn reply_tag(mut self, tag: Tag) -> Self {
        self.reply_tag = tag;
        self
    }
}

/// A constructed pool participant: exactly one manager per group, a worker
/// everywhere else. The split makes worker-side `evaluate`/`terminate`
/// unrepresentable rather than a runtime error.
pub enum PoolProcess<C: Communicator> {
    Manager(ManagerSession<C>),
    Worker(WorkerSession<C>),
}

impl<C: Communicator> PoolProcess<C> {
    /// Resolve this process's role and build its session state: the
    /// partition table (one [`balance`] call per worker id), the manager's
    /// result buffer or the worker's assigned slice bounds.
    pub fn new(
        comm: C,
        config: PoolConfig,
        data: Vec<f64>,
        callback: Arc<dyn WorkCallback>,
    ) -> Result<Self> {
        let roles = RoleAssignment::resolve(comm.rank(), comm.size(), config.manager_rank)?;
        let n_workers = roles.n_workers();
        let slice_table: Vec<(usize, usize)> = (0..n_workers)
            .map(|id| balance(data.len(), n_workers, id))
            .collect();
        tracing::debug!(
            rank = roles.rank(),
            role = ?roles.role(),
            n_workers,
            work_size = data.len(),
            "pool process resolved"
        );
        Ok(match roles.worker_id() {
            None => Self::Manager(ManagerSession::new(
                comm,
                roles,
                &config,
                slice_table,
                data.len(),
            )),
            Some(id) => {
                let (low, high) = slice_table[id];
                Self::Worker(WorkerSession::new(
                    comm, roles, &config, low, high, data, callback,
                ))
            }
        })
    }

    pub fn roles(&self) -> &RoleAssignment {
        match self {
            Self::Manager(m) => m.roles(),
            Self::Worker(w) => w.roles(),
        }
    }
}
