//! Accumulator errors and their ABI encoding.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::SolError;

use crate::{ChainId, IJobAccumulator, JobId, JobStatus};

/// Errors raised by the job accumulator.
///
/// Every guard failure leaves the job untouched. Each variant maps to the custom error of the
/// same name in [`IJobAccumulator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccumulatorError {
    /// The job was initialized before.
    #[error("job {0} already initialized")]
    AlreadyInitialized(JobId),
    /// The job was never initialized.
    #[error("job {0} not initialized")]
    NotInitialized(JobId),
    /// Deposits are only accepted while accumulating.
    #[error("job {job_id} is not accumulating (status {status:?})")]
    NotAccumulating {
        /// The job
        job_id: JobId,
        /// Its current status
        status: JobStatus,
    },
    /// A deposit of zero.
    #[error("invalid amount")]
    InvalidAmount,
    /// The deposit would overflow the received total.
    #[error("deposit overflows job {0}")]
    AmountOverflow(JobId),
    /// Not enough has been received to mark the job accumulated.
    #[error("threshold not met: received {received}, required {required}")]
    ThresholdNotMet {
        /// Amount received so far
        received: U256,
        /// Amount required
        required: U256,
    },
    /// The job's status does not allow the operation.
    #[error("job {job_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The job
        job_id: JobId,
        /// Its current status
        from: JobStatus,
        /// The status the operation would move it to
        to: JobStatus,
    },
    /// The caller is not the approver.
    #[error("{0} is not the approver")]
    Unauthorized(Address),
    /// Execution requires approval.
    #[error("job {0} not approved")]
    NotApproved(JobId),
    /// No execution context is known for the chain.
    #[error("unknown chain {0}")]
    UnknownChain(ChainId),
    /// A call of the job failed; nothing of the batch was committed.
    #[error("call {call_index} on chain {chain_id} failed: {revert_data}")]
    CallFailed {
        /// Chain of the failing call
        chain_id: ChainId,
        /// Position of the call within its chain's calls
        call_index: usize,
        /// Revert payload of the callee, bounded
        revert_data: Bytes,
    },
    /// A refund transfer failed; nothing of the refund was committed.
    #[error("refund to {depositor} on chain {chain_id} failed: {revert_data}")]
    RefundFailed {
        /// Chain of the failing transfer
        chain_id: ChainId,
        /// Depositor being refunded
        depositor: Address,
        /// Revert payload of the transfer, bounded
        revert_data: Bytes,
    },
    /// The calldata selects no entry point.
    #[error("unknown selector {0}")]
    UnknownSelector(FixedBytes<4>),
    /// The calldata does not decode for its entry point.
    #[error("malformed calldata")]
    MalformedCalldata,
}

/// Encodes an accumulator error as ABI-encoded revert data.
pub fn encode_error_result(error: AccumulatorError) -> Bytes {
    match error {
        AccumulatorError::AlreadyInitialized(job_id) => {
            IJobAccumulator::AlreadyInitialized { jobId: job_id }.abi_encode().into()
        }
        AccumulatorError::NotInitialized(job_id) => {
            IJobAccumulator::NotInitialized { jobId: job_id }.abi_encode().into()
        }
        AccumulatorError::NotAccumulating { job_id, status } => {
            IJobAccumulator::NotAccumulating { jobId: job_id, status: status.into() }
                .abi_encode()
                .into()
        }
        AccumulatorError::InvalidAmount => IJobAccumulator::InvalidAmount {}.abi_encode().into(),
        AccumulatorError::AmountOverflow(job_id) => {
            IJobAccumulator::AmountOverflow { jobId: job_id }.abi_encode().into()
        }
        AccumulatorError::ThresholdNotMet { received, required } => {
            IJobAccumulator::ThresholdNotMet { received, required }.abi_encode().into()
        }
        AccumulatorError::InvalidTransition { job_id, from, to } => {
            IJobAccumulator::InvalidTransition { jobId: job_id, from: from.into(), to: to.into() }
                .abi_encode()
                .into()
        }
        AccumulatorError::Unauthorized(caller) => {
            IJobAccumulator::Unauthorized { caller }.abi_encode().into()
        }
        AccumulatorError::NotApproved(job_id) => {
            IJobAccumulator::NotApproved { jobId: job_id }.abi_encode().into()
        }
        AccumulatorError::UnknownChain(chain_id) => {
            IJobAccumulator::UnknownChain { chainId: chain_id }.abi_encode().into()
        }
        AccumulatorError::CallFailed { chain_id, call_index, revert_data } => {
            IJobAccumulator::CallFailed {
                chainId: chain_id,
                callIndex: U256::from(call_index),
                revertData: revert_data,
            }
            .abi_encode()
            .into()
        }
        AccumulatorError::RefundFailed { chain_id, depositor, revert_data } => {
            IJobAccumulator::RefundFailed { chainId: chain_id, depositor, revertData: revert_data }
                .abi_encode()
                .into()
        }
        AccumulatorError::UnknownSelector(selector) => {
            IJobAccumulator::UnknownSelector { selector }.abi_encode().into()
        }
        AccumulatorError::MalformedCalldata => {
            IJobAccumulator::MalformedCalldata {}.abi_encode().into()
        }
    }
}
