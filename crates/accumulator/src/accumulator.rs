//! The job accumulator state machine.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, warn};

use crate::{
    constants::{ERC20_RETURN_LEN, FORWARD_ALL_GAS, MAX_REVERT_DATA_LEN},
    AccumulatorError, CallHost, ChainCalls, ChainId, Exec, ExecutionContexts, JobId, JobState,
    JobStatus, JobView, Revert, IERC20,
};

/// Tracks jobs funded from several chains and settles each one exactly once.
///
/// Every operation either applies completely or fails with the job left as it was. Calls made
/// by [`JobAccumulator::execute`] and [`JobAccumulator::refund`] run under journal checkpoints of
/// every chain they touch, so a failing call rolls back the calls before it as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAccumulator {
    approver: Address,
    jobs: BTreeMap<JobId, JobState>,
    max_revert_data_len: usize,
}

/// One raw call of an atomic batch.
#[derive(Debug)]
struct Transfer {
    chain_id: ChainId,
    target: Address,
    value: U256,
    data: Bytes,
    /// An ERC-20 `transfer`: the callee must have code and return nothing or an ABI `true`.
    token_transfer: bool,
}

impl JobAccumulator {
    /// Creates an accumulator whose executions are approved by `approver`.
    pub const fn new(approver: Address) -> Self {
        Self { approver, jobs: BTreeMap::new(), max_revert_data_len: MAX_REVERT_DATA_LEN }
    }

    /// Sets the bound on revert data kept from failing calls. `0` keeps everything.
    pub const fn with_max_revert_data_len(mut self, max_revert_data_len: usize) -> Self {
        self.max_revert_data_len = max_revert_data_len;
        self
    }

    /// The approver.
    pub const fn approver(&self) -> Address {
        self.approver
    }

    /// The state of `job_id`, if it was initialized.
    pub fn job(&self, job_id: JobId) -> Option<&JobState> {
        self.jobs.get(&job_id)
    }

    /// ABI view of `job_id`. Unknown jobs report `initialized = false`.
    pub fn job_view(&self, job_id: JobId) -> JobView {
        self.jobs.get(&job_id).cloned().unwrap_or_default().to_view()
    }

    /// Creates `job_id` with deposits denominated in `input_token`.
    pub fn initialize(&mut self, job_id: JobId, input_token: Address) -> Result<(), AccumulatorError> {
        logged("initialize", job_id, self.try_initialize(job_id, input_token))
    }

    /// Adds a deposit of `amount` made by `depositor` on `chain_id`.
    ///
    /// Deposits commute: the final `received` and source chain set do not depend on the order in
    /// which deposits are registered.
    pub fn register_deposit(
        &mut self,
        job_id: JobId,
        chain_id: ChainId,
        depositor: Address,
        amount: U256,
    ) -> Result<(), AccumulatorError> {
        logged(
            "register_deposit",
            job_id,
            self.try_register_deposit(job_id, chain_id, depositor, amount),
        )
    }

    /// Marks `job_id` accumulated once `required_amount` has been received.
    pub fn mark_accumulated(
        &mut self,
        job_id: JobId,
        required_amount: U256,
    ) -> Result<(), AccumulatorError> {
        logged("mark_accumulated", job_id, self.try_mark_accumulated(job_id, required_amount))
    }

    /// Approves `job_id` for execution. Approving twice is a no-op.
    pub fn approve(&mut self, caller: Address, job_id: JobId) -> Result<(), AccumulatorError> {
        logged("approve", job_id, self.try_approve(caller, job_id))
    }

    /// Runs the calls of `job_id` in declared order and marks it executed.
    ///
    /// Every call forwards all remaining gas. If any call fails, every call of the batch is
    /// rolled back, the job stays accumulated and the callee's revert data, truncated to the
    /// configured bound, is returned in [`AccumulatorError::CallFailed`].
    pub fn execute<C: ExecutionContexts>(
        &mut self,
        job_id: JobId,
        chain_calls: &[ChainCalls],
        contexts: &mut C,
    ) -> Result<(), AccumulatorError> {
        logged("execute", job_id, self.try_execute(job_id, chain_calls, contexts))
    }

    /// Returns every deposit of `job_id` to its depositor and marks the job refunded.
    ///
    /// Native deposits are sent back as call value, token deposits with `IERC20.transfer`. The
    /// refund is atomic in the same way as [`JobAccumulator::execute`].
    pub fn refund<C: ExecutionContexts>(
        &mut self,
        job_id: JobId,
        contexts: &mut C,
    ) -> Result<(), AccumulatorError> {
        logged("refund", job_id, self.try_refund(job_id, contexts))
    }

    fn job_ref(&self, job_id: JobId) -> Result<&JobState, AccumulatorError> {
        self.jobs.get(&job_id).ok_or(AccumulatorError::NotInitialized(job_id))
    }

    fn job_mut(&mut self, job_id: JobId) -> Result<&mut JobState, AccumulatorError> {
        self.jobs.get_mut(&job_id).ok_or(AccumulatorError::NotInitialized(job_id))
    }

    fn try_initialize(&mut self, job_id: JobId, input_token: Address) -> Result<(), AccumulatorError> {
        if self.jobs.contains_key(&job_id) {
            return Err(AccumulatorError::AlreadyInitialized(job_id));
        }
        self.jobs.insert(job_id, JobState::new(input_token));
        debug!(target: "omni::accumulator", %job_id, %input_token, "job initialized");
        Ok(())
    }

    fn try_register_deposit(
        &mut self,
        job_id: JobId,
        chain_id: ChainId,
        depositor: Address,
        amount: U256,
    ) -> Result<(), AccumulatorError> {
        let job = self.job_mut(job_id)?;
        if job.status != JobStatus::Accumulating {
            return Err(AccumulatorError::NotAccumulating { job_id, status: job.status });
        }
        if amount.is_zero() {
            return Err(AccumulatorError::InvalidAmount);
        }

        let received =
            job.received.checked_add(amount).ok_or(AccumulatorError::AmountOverflow(job_id))?;
        let contributed = job
            .deposits
            .get(&(chain_id, depositor))
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(AccumulatorError::AmountOverflow(job_id))?;

        job.received = received;
        job.deposits.insert((chain_id, depositor), contributed);
        let new_chain = job.source_chains.insert(chain_id);
        debug!(
            target: "omni::accumulator",
            %job_id,
            chain_id,
            %depositor,
            %amount,
            %received,
            new_chain,
            "deposit registered"
        );
        Ok(())
    }

    fn try_mark_accumulated(
        &mut self,
        job_id: JobId,
        required_amount: U256,
    ) -> Result<(), AccumulatorError> {
        let job = self.job_mut(job_id)?;
        transition_guard(job_id, job.status, JobStatus::Accumulated)?;
        if job.received < required_amount {
            return Err(AccumulatorError::ThresholdNotMet {
                received: job.received,
                required: required_amount,
            });
        }
        job.status = JobStatus::Accumulated;
        debug!(target: "omni::accumulator", %job_id, received = %job.received, "job accumulated");
        Ok(())
    }

    fn try_approve(&mut self, caller: Address, job_id: JobId) -> Result<(), AccumulatorError> {
        if caller != self.approver {
            return Err(AccumulatorError::Unauthorized(caller));
        }
        let job = self.job_mut(job_id)?;
        if job.status.is_terminal() {
            return Err(AccumulatorError::InvalidTransition {
                job_id,
                from: job.status,
                to: job.status,
            });
        }
        if !job.approved {
            job.approved = true;
            debug!(target: "omni::accumulator", %job_id, %caller, "job approved");
        }
        Ok(())
    }

    fn try_execute<C: ExecutionContexts>(
        &mut self,
        job_id: JobId,
        chain_calls: &[ChainCalls],
        contexts: &mut C,
    ) -> Result<(), AccumulatorError> {
        let job = self.job_ref(job_id)?;
        transition_guard(job_id, job.status, JobStatus::Executed)?;
        if !job.approved {
            return Err(AccumulatorError::NotApproved(job_id));
        }
        if let Some(group) = chain_calls.iter().find(|group| contexts.host_mut(group.chainId).is_none())
        {
            return Err(AccumulatorError::UnknownChain(group.chainId));
        }

        let mut batch = Vec::new();
        let mut positions = Vec::new();
        for group in chain_calls {
            for (call_index, call) in group.calls.iter().enumerate() {
                batch.push(Transfer {
                    chain_id: group.chainId,
                    target: call.target,
                    value: call.value,
                    data: call.data.clone(),
                    token_transfer: false,
                });
                positions.push(call_index);
            }
        }

        run_atomic(contexts, &batch, self.max_revert_data_len).map_err(|err| match err {
            BatchError::UnknownChain(chain_id) => AccumulatorError::UnknownChain(chain_id),
            BatchError::Failed { index, revert_data } => AccumulatorError::CallFailed {
                chain_id: batch[index].chain_id,
                call_index: positions[index],
                revert_data,
            },
        })?;

        self.job_mut(job_id)?.status = JobStatus::Executed;
        debug!(target: "omni::accumulator", %job_id, calls = batch.len(), "job executed");
        Ok(())
    }

    fn try_refund<C: ExecutionContexts>(
        &mut self,
        job_id: JobId,
        contexts: &mut C,
    ) -> Result<(), AccumulatorError> {
        let job = self.job_ref(job_id)?;
        transition_guard(job_id, job.status, JobStatus::Refunded)?;

        let mut batch = Vec::with_capacity(job.deposits.len());
        let mut depositors = Vec::with_capacity(job.deposits.len());
        for (&(chain_id, depositor), &amount) in &job.deposits {
            let transfer = if job.is_native() {
                Transfer {
                    chain_id,
                    target: depositor,
                    value: amount,
                    data: Bytes::new(),
                    token_transfer: false,
                }
            } else {
                Transfer {
                    chain_id,
                    target: job.input_token,
                    value: U256::ZERO,
                    data: IERC20::transferCall { to: depositor, amount }.abi_encode().into(),
                    token_transfer: true,
                }
            };
            batch.push(transfer);
            depositors.push(depositor);
        }

        run_atomic(contexts, &batch, self.max_revert_data_len).map_err(|err| match err {
            BatchError::UnknownChain(chain_id) => AccumulatorError::UnknownChain(chain_id),
            BatchError::Failed { index, revert_data } => AccumulatorError::RefundFailed {
                chain_id: batch[index].chain_id,
                depositor: depositors[index],
                revert_data,
            },
        })?;

        self.job_mut(job_id)?.status = JobStatus::Refunded;
        debug!(target: "omni::accumulator", %job_id, transfers = batch.len(), "job refunded");
        Ok(())
    }
}

fn transition_guard(job_id: JobId, from: JobStatus, to: JobStatus) -> Result<(), AccumulatorError> {
    if !from.can_transition_to(to) {
        return Err(AccumulatorError::InvalidTransition { job_id, from, to });
    }
    Ok(())
}

fn logged<T>(
    operation: &'static str,
    job_id: JobId,
    result: Result<T, AccumulatorError>,
) -> Result<T, AccumulatorError> {
    result.inspect_err(|err| {
        warn!(target: "omni::accumulator", operation, %job_id, %err, "operation rejected");
    })
}

/// Why an atomic batch was rolled back.
#[derive(Debug)]
enum BatchError {
    /// No context exists for the chain. Nothing ran.
    UnknownChain(ChainId),
    /// The transfer at `index` failed.
    Failed { index: usize, revert_data: Bytes },
}

/// Runs `batch` in order under a checkpoint of every chain it touches.
///
/// On failure every checkpoint is reverted. Revert data is bounded by `max_revert_data_len`; the
/// result of a successful token transfer is judged on its first word regardless of that bound.
fn run_atomic<C: ExecutionContexts>(
    contexts: &mut C,
    batch: &[Transfer],
    max_revert_data_len: usize,
) -> Result<(), BatchError> {
    if let Some(transfer) = batch.iter().find(|t| contexts.host_mut(t.chain_id).is_none()) {
        return Err(BatchError::UnknownChain(transfer.chain_id));
    }

    let mut checkpoints: Vec<(ChainId, <C::Host as CallHost>::Checkpoint)> = Vec::new();
    for transfer in batch {
        if checkpoints.iter().any(|(chain_id, _)| *chain_id == transfer.chain_id) {
            continue;
        }
        if let Some(host) = contexts.host_mut(transfer.chain_id) {
            checkpoints.push((transfer.chain_id, host.checkpoint()));
        }
    }

    for (index, transfer) in batch.iter().enumerate() {
        let Some(host) = contexts.host_mut(transfer.chain_id) else {
            rollback(contexts, &checkpoints);
            return Err(BatchError::UnknownChain(transfer.chain_id));
        };
        if transfer.token_transfer && host.code_size(transfer.target) == 0 {
            warn!(
                target: "omni::accumulator",
                chain_id = transfer.chain_id,
                token = %transfer.target,
                "token has no code, rolling back batch"
            );
            rollback(contexts, &checkpoints);
            return Err(BatchError::Failed { index, revert_data: Bytes::new() });
        }

        let mut exec = Exec::new(host);
        let mut success =
            exec.call(transfer.target, transfer.value, &transfer.data, FORWARD_ALL_GAS);
        if success && transfer.token_transfer {
            let returned = exec.capture_return_data(ERC20_RETURN_LEN);
            success = returned.is_empty() ||
                IERC20::transferCall::abi_decode_returns(&returned, true)
                    .is_ok_and(|ret| ret._0);
        }

        if !success {
            exec.capture_return_data(max_revert_data_len);
            let Revert(revert_data) = exec.revert_with_captured_data();
            warn!(
                target: "omni::accumulator",
                chain_id = transfer.chain_id,
                callee = %transfer.target,
                %revert_data,
                "call failed, rolling back batch"
            );
            rollback(contexts, &checkpoints);
            return Err(BatchError::Failed { index, revert_data });
        }
    }

    for (chain_id, checkpoint) in checkpoints.iter().rev() {
        if let Some(host) = contexts.host_mut(*chain_id) {
            host.checkpoint_commit(*checkpoint);
        }
    }
    Ok(())
}

fn rollback<C: ExecutionContexts>(
    contexts: &mut C,
    checkpoints: &[(ChainId, <C::Host as CallHost>::Checkpoint)],
) {
    for (chain_id, checkpoint) in checkpoints.iter().rev() {
        if let Some(host) = contexts.host_mut(*chain_id) {
            host.checkpoint_revert(*checkpoint);
        }
    }
}
