//! Role resolution: which process is the manager, and how worker ranks map
//! onto dense zero-based worker ids.

use crate::comm::Rank;
use crate::error::{PoolError, Result};

/// Role a process plays for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    Manager,
    Worker,
}

/// Immutable outcome of role resolution, computed once per process at
/// session construction. Resolution itself has no side effects.
#[derive(Debug, Clone)]
pub struct RoleAssignment {
    rank: Rank,
    size: usize,
    manager_rank: Rank,
    role: ProcessRole,
    worker_id: Option<usize>,
}

impl RoleAssignment {
    /// Resolve this process's role from the ambient group shape.
    ///
    /// Fails with a configuration error when the group has no room for a
    /// worker besides the manager, or when `manager_rank`/`rank` fall
    /// outside the group.
    pub fn resolve(rank: Rank, size: usize, manager_rank: Rank) -> Result<Self> {
        if size <= 1 {
            return Err(PoolError::configuration("no workers available"));
        }
        if manager_rank >= size {
            return Err(PoolError::configuration(format!(
                "manager rank {manager_rank} outside group of {size}"
            )));
        }
        if rank >= size {
            return Err(PoolError::configuration(format!(
                "rank {rank} outside group of {size}"
            )));
        }
        let role = if rank == manager_rank {
            ProcessRole::Manager
        } else {
            ProcessRole::Worker
        };
        // Dense worker ids: skip over the manager's rank so ids pack into
        // [0, n_workers) no matter which rank is designated manager.
        let worker_id = match role {
            ProcessRole::Manager => None,
            ProcessRole::Worker => Some(if rank > manager_rank { rank - 1 } else { rank }),
        };
        Ok(Self {
            rank,
            size,
            manager_rank,
            role,
            worker_id,
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn manager_rank(&self) -> Rank {
        self.manager_rank
    }

    pub fn n_workers(&self) -> usize {
        self.size - 1
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn is_manager(&self) -> bool {
        self.role == ProcessRole::Manager
    }

    /// Dense worker id of this process, `None` on the manager.
    pub fn worker_id(&self) -> Option<usize> {
        self.worker_id
    }

    /// Map any rank back to its worker id — the inverse the manager applies
    /// to a reply's source rank. `None` for the manager rank itself or for
    /// ranks outside the group.
    pub fn worker_id_of(&self, rank: Rank) -> Option<usize> {
        if rank == self.manager_rank || rank >= self.size {
            return None;
        }
        Some(if rank > self.manager_rank { rank - 1 } else { rank })
    }

    /// Predicate closure testing whether a rank plays `role` in this group.
    pub fn predicate_for(&self, role: ProcessRole) -> impl Fn(Rank) -> bool {
        let manager_rank = self.manager_rank;
        move |rank| match role {
            ProcessRole::Manager => rank == manager_rank,
            ProcessRole::Worker => rank != manager_rank,
        }
    }
}
