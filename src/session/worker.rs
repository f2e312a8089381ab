use std::sync::Arc;

use crate::comm::{Communicator, Tag};
use crate::error::{PoolError, Result};
use crate::message::{self, Directive};
use crate::role::RoleAssignment;

use super::{PoolConfig, WorkCallback};

/// Worker-loop state. `Done` is absorbing.
enum Step {
    Waiting,
    Computing(Vec<f64>),
    Replying(Vec<f64>),
    Done,
}

/// Worker side of the pool: holds the full dataset but only ever reads its
/// assigned `[low, high)` slice.
pub struct WorkerSession<C: Communicator> {
    comm: C,
    roles: RoleAssignment,
    reply_tag: Tag,
    low: usize,
    high: usize,
    data: Vec<f64>,
    callback: Arc<dyn WorkCallback>,
}

impl<C: Communicator> WorkerSession<C> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        comm: C,
        roles: RoleAssignment,
        config: &PoolConfig,
        low: usize,
        high: usize,
        data: Vec<f64>,
        callback: Arc<dyn WorkCallback>,
    ) -> Self {
        Self {
            comm,
            roles,
            reply_tag: config.reply_tag,
            low,
            high,
            data,
            callback,
        }
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    /// This worker's assigned slice bounds.
    pub fn assigned_range(&self) -> (usize, usize) {
        (self.low, self.high)
    }

    /// Run the receive-compute-reply loop until the manager terminates the
    /// pool, then return normally.
    ///
    /// Consumes the session, so the loop can be entered at most once and
    /// never restarted. Errors (substrate failure, a callback returning the
    /// wrong length) propagate out and are fatal to this worker — the
    /// manager will then block in its gather, as documented on
    /// [`ManagerSession::evaluate`](super::ManagerSession::evaluate).
    pub async fn run(self) -> Result<()> {
        let manager = self.roles.manager_rank();
        let mut step = Step::Waiting;
        loop {
            step = match step {
                Step::Waiting => {
                    let frame = self
                        .comm
                        .recv_broadcast(manager)
                        .await
                        .map_err(|e| PoolError::comm("instruction receive", e))?;
                    match message::decode_directive(&frame)? {
                        Directive::Work(instruction) => Step::Computing(instruction),
                        Directive::Terminate => Step::Done,
                    }
                }
                Step::Computing(instruction) => {
                    let slice = &self.data[self.low..self.high];
                    let partial = self.callback.apply(&instruction, slice);
                    if partial.len() != self.high - self.low {
                        return Err(PoolError::CallbackContract {
                            expected: self.high - self.low,
                            actual: partial.len(),
                        });
                    }
                    Step::Replying(partial)
                }
                Step::Replying(partial) => {
                    let frame = message::encode_reply(&partial)?;
                    self.comm
                        .send(manager, self.reply_tag, frame)
                        .await
                        .map_err(|e| PoolError::comm("reply send", e))?;
                    Step::Waiting
                }
                Step::Done => {
                    tracing::debug!(rank = self.roles.rank(), "worker loop exited");
                    return Ok(());
                }
            };
        }
    }
}
