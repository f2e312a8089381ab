use crate::comm::{Communicator, Tag};
use crate::error::{PoolError, Result};
use crate::message::{self, Directive};
use crate::role::RoleAssignment;

use super::PoolConfig;

/// Manager side of the pool: drives evaluation rounds and, eventually, the
/// one terminate broadcast.
pub struct ManagerSession<C: Communicator> {
    comm: C,
    roles: RoleAssignment,
    ins_size: usize,
    reply_tag: Tag,
    slice_table: Vec<(usize, usize)>,
    /// Reused across rounds, overwritten slice by slice; never reallocated.
    res_buf: Vec<f64>,
    rounds: u64,
}

impl<C: Communicator> ManagerSession<C> {
    pub(super) fn new(
        comm: C,
        roles: RoleAssignment,
        config: &PoolConfig,
        slice_table: Vec<(usize, usize)>,
        work_size: usize,
    ) -> Self {
        Self {
            comm,
            roles,
            ins_size: config.ins_size,
            reply_tag: config.reply_tag,
            slice_table,
            res_buf: vec![0.0; work_size],
            rounds: 0,
        }
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    /// Partition table shared with the workers: one `(low, high)` range per
    /// worker id, contiguous and covering the dataset exactly.
    pub fn partition_table(&self) -> &[(usize, usize)] {
        &self.slice_table
    }

    /// Run one evaluation round.
    ///
    /// The returned slice aliases the session's result buffer and is valid
    /// only until the next `evaluate`/`terminate` call (the borrow checker
    /// enforces this); copy it out to retain a round's result.
    ///
    /// Liveness hazard: there is no fault tolerance in this layer. If a
    /// worker process dies mid-round, the gather below waits for its reply
    /// forever.
    pub async fn evaluate(&mut self, instruction: &[f64]) -> Result<&[f64]> {
        let (result, ()) = self.evaluate_with(instruction, || ()).await?;
        Ok(result)
    }

    /// Like [`evaluate`](Self::evaluate), but runs `interlude` between the
    /// broadcast and the gather — useful work for the manager during the
    /// latency window while workers compute. The interlude cannot re-enter
    /// the protocol: the session is exclusively borrowed for the whole
    /// round.
    pub async fn evaluate_with<I>(
        &mut self,
        instruction: &[f64],
        interlude: impl FnOnce() -> I,
    ) -> Result<(&[f64], I)> {
        if instruction.len() != self.ins_size {
            return Err(PoolError::misuse(format!(
                "instruction length {} does not match configured size {}",
                instruction.len(),
                self.ins_size
            )));
        }
        let frame = message::encode_directive(&Directive::Work(instruction.to_vec()))?;
        self.comm
            .broadcast(frame)
            .await
            .map_err(|e| PoolError::comm("instruction broadcast", e))?;
        self.rounds += 1;
        tracing::debug!(round = self.rounds, "instruction broadcast");

        let interlude_result = interlude();

        // Gather in arrival order; the slices are disjoint, so attribution
        // by source rank is all the reassembly there is.
        let mut collected = 0usize;
        while collected < self.roles.n_workers() {
            let (frame, source) = self
                .comm
                .recv_any(self.reply_tag)
                .await
                .map_err(|e| PoolError::comm("reply receive", e))?;
            let partial = message::decode_reply(&frame)?;
            let worker_id = self
                .roles
                .worker_id_of(source)
                .ok_or_else(|| PoolError::misuse(format!("reply from unexpected rank {source}")))?;
            let (low, high) = self.slice_table[worker_id];
            if partial.len() != high - low {
                return Err(PoolError::CallbackContract {
                    expected: high - low,
                    actual: partial.len(),
                });
            }
            self.res_buf[low..high].copy_from_slice(&partial);
            collected += 1;
            tracing::trace!(worker_id, source, low, high, "partial result placed");
        }
        Ok((&self.res_buf[..], interlude_result))
    }

    /// Shut the pool down by broadcasting the terminate directive.
    ///
    /// Consumes the session: a second terminate, or an evaluate after it,
    /// does not compile. Returns as soon as the broadcast is accepted — no
    /// acknowledgment is awaited, so workers may still be draining their
    /// loops when this returns; the group's own teardown barrier is the
    /// only synchronization.
    pub async fn terminate(self) -> Result<()> {
        let frame = message::encode_directive(&Directive::Terminate)?;
        self.comm
            .broadcast(frame)
            .await
            .map_err(|e| PoolError::comm("terminate broadcast", e))?;
        tracing::info!(rounds = self.rounds, "pool terminated");
        Ok(())
    }
}
