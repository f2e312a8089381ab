//! parpool: manager/worker broadcast-evaluate pool.
//!
//! One manager process repeatedly broadcasts a fixed-size instruction
//! vector to a pool of workers; each worker applies a callback to its
//! statically-assigned slice of a shared dataset and sends its partial
//! result back; the manager reassembles the full result. The same
//! instruction can be re-evaluated any number of times against the same
//! partitioned data, and the pool shuts down via a terminate broadcast.
//!
//! The messaging substrate is pluggable behind [`comm::Communicator`];
//! [`comm::LocalGroup`] ships an in-process implementation.

// Protocol building blocks
pub mod error;
pub mod message;
pub mod partition;

// Role resolution and confinement
pub mod confine;
pub mod role;

// Substrate boundary and the session protocol
pub mod comm;
pub mod session;

// Re-exports for convenience
pub use comm::{CommError, Communicator, LocalComm, LocalGroup, Rank, Tag};
pub use confine::{confine_to, confine_when, confine_when_or};
pub use error::{PoolError, Result};
pub use message::Directive;
pub use partition::{balance, balance_gatherv, balance_gatherv_skip_manager};
pub use role::{ProcessRole, RoleAssignment};
pub use session::{
    ManagerSession, PoolConfig, PoolProcess, WorkCallback, WorkerSession, DEFAULT_MANAGER_RANK,
    DEFAULT_REPLY_TAG,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_round_trip() {
        let data: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let callback: Arc<dyn WorkCallback> = Arc::new(|ins: &[f64], slice: &[f64]| {
            let addend = ins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            slice.iter().map(|x| x + addend).collect()
        });

        let mut manager = None;
        let mut workers = Vec::new();
        for comm in LocalGroup::create(3) {
            match PoolProcess::new(comm, PoolConfig::new(2), data.clone(), callback.clone())
                .unwrap()
            {
                PoolProcess::Manager(m) => manager = Some(m),
                PoolProcess::Worker(w) => workers.push(tokio::spawn(w.run())),
            }
        }
        let mut manager = manager.expect("rank 0 is the manager");

        let result = manager.evaluate(&[1.0, 3.0]).await.unwrap();
        let expected: Vec<f64> = (0..8).map(|i| i as f64 + 3.0).collect();
        assert_eq!(result, expected.as_slice());

        manager.terminate().await.unwrap();
        for handle in workers {
            handle.await.unwrap().unwrap();
        }
    }
}
