//! Solidity ABI of the accumulator entry points.

use alloy_sol_types::sol;

sol! {
    /// External interface of the job accumulator contract.
    #[derive(Debug, PartialEq, Eq)]
    interface IJobAccumulator {
        /// A raw external call.
        struct Call {
            address target;
            uint256 value;
            bytes data;
        }

        /// Calls to run, in order, on one chain.
        struct ChainCalls {
            uint64 chainId;
            Call[] calls;
        }

        /// Read-only snapshot of a job.
        struct JobView {
            uint256 received;
            bool approved;
            bool initialized;
            uint8 status;
            address inputToken;
            uint64[] sourceChains;
        }

        function initialize(uint256 jobId, address inputToken) external;
        function registerDeposit(uint256 jobId, uint64 chainId, address depositor, uint256 amount) external;
        function markAccumulated(uint256 jobId, uint256 requiredAmount) external;
        function approve(uint256 jobId) external;
        function execute(uint256 jobId, ChainCalls[] chainCalls) external;
        function refund(uint256 jobId) external;
        function jobState(uint256 jobId) external view returns (JobView memory);

        error AlreadyInitialized(uint256 jobId);
        error NotInitialized(uint256 jobId);
        error NotAccumulating(uint256 jobId, uint8 status);
        error InvalidAmount();
        error AmountOverflow(uint256 jobId);
        error ThresholdNotMet(uint256 received, uint256 required);
        error InvalidTransition(uint256 jobId, uint8 from, uint8 to);
        error Unauthorized(address caller);
        error NotApproved(uint256 jobId);
        error UnknownChain(uint64 chainId);
        error CallFailed(uint64 chainId, uint256 callIndex, bytes revertData);
        error RefundFailed(uint64 chainId, address depositor, bytes revertData);
        error UnknownSelector(bytes4 selector);
        error MalformedCalldata();
    }

    /// The subset of ERC-20 used to refund token deposits.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

pub use IJobAccumulator::{Call, ChainCalls, JobView};
