//! Bounded raw external calls.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use auto_impl::auto_impl;
use tracing::trace;

use crate::ChainId;

/// The call primitive of the host ledger.
///
/// A host runs one external call at a time and keeps the return buffer of the most recent call
/// until the next one. Checkpoints journal every effect of the calls made after them, so a batch
/// can be committed or rolled back as a unit. Checkpoints nest: committing or reverting one also
/// resolves every checkpoint taken after it.
#[auto_impl(&mut, Box)]
pub trait CallHost {
    /// Journal position returned by [`CallHost::checkpoint`].
    type Checkpoint: Copy;

    /// Calls `target` with `value` and `input`, forwarding exactly `gas_limit` gas. Returns
    /// whether the callee succeeded.
    fn call(&mut self, target: Address, value: U256, input: &[u8], gas_limit: u64) -> bool;

    /// Return buffer of the most recent call.
    fn return_data(&self) -> &[u8];

    /// Gas still available to the current frame.
    fn gas_left(&self) -> u64;

    /// Size of the code deployed at `address`. Calls to an address without code succeed with
    /// empty return data, so callers that expect a contract check this first.
    fn code_size(&self, address: Address) -> usize;

    /// Starts a journal checkpoint.
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Keeps every effect recorded since `checkpoint`.
    fn checkpoint_commit(&mut self, checkpoint: Self::Checkpoint);

    /// Discards every effect recorded since `checkpoint`.
    fn checkpoint_revert(&mut self, checkpoint: Self::Checkpoint);
}

/// The revert payload of an aborted execution context, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("execution reverted: {0}")]
pub struct Revert(pub Bytes);

/// Executes raw calls on a [`CallHost`] and captures their return data within a bound.
///
/// The executor holds no job state. It only remembers the bytes captured by the last
/// [`Exec::capture_return_data`] so they can be re-emitted by
/// [`Exec::revert_with_captured_data`].
#[derive(derive_more::Debug)]
pub struct Exec<'a, H> {
    #[debug(ignore)]
    host: &'a mut H,
    captured: Bytes,
}

impl<'a, H: CallHost> Exec<'a, H> {
    /// Creates an executor over `host`.
    pub fn new(host: &'a mut H) -> Self {
        Self { host, captured: Bytes::new() }
    }

    /// Calls `target`, forwarding `gas_limit` gas, or all remaining gas when `gas_limit` is `0`.
    /// Return data is not captured.
    pub fn call(&mut self, target: Address, value: U256, data: &[u8], gas_limit: u64) -> bool {
        let gas = if gas_limit == 0 { self.host.gas_left() } else { gas_limit };
        let success = self.host.call(target, value, data, gas);
        trace!(target: "omni::exec", %target, %value, gas, success, "call");
        success
    }

    /// Copies at most `max_len` bytes of the last return buffer, or all of it when `max_len` is
    /// `0`.
    pub fn capture_return_data(&mut self, max_len: usize) -> Bytes {
        let data = self.host.return_data();
        let len = if max_len == 0 { data.len() } else { data.len().min(max_len) };
        self.captured = Bytes::copy_from_slice(&data[..len]);
        self.captured.clone()
    }

    /// Bytes captured by the last [`Exec::capture_return_data`].
    pub const fn captured(&self) -> &Bytes {
        &self.captured
    }

    /// Aborts with the captured bytes as the revert payload.
    pub fn revert_with_captured_data(&self) -> Revert {
        Revert(self.captured.clone())
    }
}

/// Per-chain execution contexts a job runs against.
pub trait ExecutionContexts {
    /// The host of each chain.
    type Host: CallHost;

    /// The host of `chain_id`, if the chain is known.
    fn host_mut(&mut self, chain_id: ChainId) -> Option<&mut Self::Host>;
}

impl<H: CallHost> ExecutionContexts for BTreeMap<ChainId, H> {
    type Host = H;

    fn host_mut(&mut self, chain_id: ChainId) -> Option<&mut H> {
        self.get_mut(&chain_id)
    }
}
