//! Constants of the job accumulator.

/// Default upper bound on revert data copied out of a failing callee.
///
/// Anything the callee returns beyond this many bytes is dropped before it reaches
/// [`CallFailed`](crate::AccumulatorError::CallFailed).
pub const MAX_REVERT_DATA_LEN: usize = 1024;

/// Gas limit passed to the executor to forward all remaining gas.
pub const FORWARD_ALL_GAS: u64 = 0;

/// Bytes read from a successful ERC-20 `transfer` to judge its `bool` result.
pub const ERC20_RETURN_LEN: usize = 32;
