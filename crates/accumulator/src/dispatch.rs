//! ABI entry points of the accumulator.

use alloy_primitives::{Address, Bytes, FixedBytes};
use alloy_sol_types::{SolCall, SolInterface};
use tracing::trace;

use crate::{
    encode_error_result, AccumulatorError, ExecutionContexts, IJobAccumulator,
    IJobAccumulator::IJobAccumulatorCalls, JobAccumulator,
};

impl JobAccumulator {
    /// Decodes `calldata`, runs the selected entry point on behalf of `caller` and returns its
    /// ABI-encoded output, or the ABI-encoded custom error as revert data.
    pub fn dispatch<C: ExecutionContexts>(
        &mut self,
        caller: Address,
        calldata: &[u8],
        contexts: &mut C,
    ) -> Result<Bytes, Bytes> {
        trace!(target: "omni::accumulator", %caller, calldata = %Bytes::copy_from_slice(calldata), "dispatch");
        self.dispatch_call(caller, calldata, contexts).map_err(encode_error_result)
    }

    fn dispatch_call<C: ExecutionContexts>(
        &mut self,
        caller: Address,
        calldata: &[u8],
        contexts: &mut C,
    ) -> Result<Bytes, AccumulatorError> {
        let selector = calldata
            .get(..4)
            .map(FixedBytes::<4>::from_slice)
            .ok_or(AccumulatorError::MalformedCalldata)?;
        if !IJobAccumulatorCalls::valid_selector(selector.0) {
            return Err(AccumulatorError::UnknownSelector(selector));
        }
        let call = IJobAccumulatorCalls::abi_decode(calldata, true)
            .map_err(|_| AccumulatorError::MalformedCalldata)?;

        match call {
            IJobAccumulatorCalls::initialize(call) => {
                self.initialize(call.jobId, call.inputToken)?;
            }
            IJobAccumulatorCalls::registerDeposit(call) => {
                self.register_deposit(call.jobId, call.chainId, call.depositor, call.amount)?;
            }
            IJobAccumulatorCalls::markAccumulated(call) => {
                self.mark_accumulated(call.jobId, call.requiredAmount)?;
            }
            IJobAccumulatorCalls::approve(call) => {
                self.approve(caller, call.jobId)?;
            }
            IJobAccumulatorCalls::execute(call) => {
                self.execute(call.jobId, &call.chainCalls, contexts)?;
            }
            IJobAccumulatorCalls::refund(call) => {
                self.refund(call.jobId, contexts)?;
            }
            IJobAccumulatorCalls::jobState(call) => {
                let view = self.job_view(call.jobId);
                return Ok(IJobAccumulator::jobStateCall::abi_encode_returns(&(view,)).into());
            }
        }
        Ok(Bytes::new())
    }
}
