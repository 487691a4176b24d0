use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::{SolCall, SolInterface};
use clap::{Args, Subcommand};
use omni_accumulator::IJobAccumulator::{self, IJobAccumulatorErrors};

use crate::common::{decode_hex, CliError, Result};

/// Job accumulator ABI commands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Encode calldata for an accumulator entry point
    #[command(subcommand)]
    Calldata(Entry),
    /// Decode revert data returned by the accumulator
    DecodeRevert(DecodeRevertCmd),
}

/// Accumulator entry points with scalar arguments.
#[derive(Subcommand, Debug)]
pub enum Entry {
    /// `initialize(jobId, inputToken)`
    Initialize {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
        /// Deposit token, zero for the native asset
        #[arg(long = "input-token", default_value = "0x0000000000000000000000000000000000000000")]
        input_token: Address,
    },
    /// `registerDeposit(jobId, chainId, depositor, amount)`
    RegisterDeposit {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
        /// Chain the deposit was made on
        #[arg(long = "chain-id")]
        chain_id: u64,
        /// Account refunds go to
        #[arg(long = "depositor")]
        depositor: Address,
        /// Deposited amount
        #[arg(long = "amount")]
        amount: U256,
    },
    /// `markAccumulated(jobId, requiredAmount)`
    MarkAccumulated {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
        /// Funding threshold
        #[arg(long = "required")]
        required: U256,
    },
    /// `approve(jobId)`
    Approve {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
    },
    /// `refund(jobId)`
    Refund {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
    },
    /// `jobState(jobId)`
    JobState {
        /// Job identifier
        #[arg(long = "job-id")]
        job_id: U256,
    },
}

/// Decode accumulator revert data
#[derive(Args, Debug)]
pub struct DecodeRevertCmd {
    /// Revert data as hex
    #[arg(value_name = "DATA")]
    pub data: String,
}

impl Entry {
    /// ABI calldata of the entry point.
    pub fn calldata(&self) -> Vec<u8> {
        match *self {
            Self::Initialize { job_id, input_token } => {
                IJobAccumulator::initializeCall { jobId: job_id, inputToken: input_token }
                    .abi_encode()
            }
            Self::RegisterDeposit { job_id, chain_id, depositor, amount } => {
                IJobAccumulator::registerDepositCall {
                    jobId: job_id,
                    chainId: chain_id,
                    depositor,
                    amount,
                }
                .abi_encode()
            }
            Self::MarkAccumulated { job_id, required } => {
                IJobAccumulator::markAccumulatedCall { jobId: job_id, requiredAmount: required }
                    .abi_encode()
            }
            Self::Approve { job_id } => IJobAccumulator::approveCall { jobId: job_id }.abi_encode(),
            Self::Refund { job_id } => IJobAccumulator::refundCall { jobId: job_id }.abi_encode(),
            Self::JobState { job_id } => {
                IJobAccumulator::jobStateCall { jobId: job_id }.abi_encode()
            }
        }
    }
}

impl Cmd {
    /// Runs the command and returns its output.
    pub fn execute(&self) -> Result<String> {
        match self {
            Self::Calldata(entry) => Ok(hex::encode_prefixed(entry.calldata())),
            Self::DecodeRevert(cmd) => {
                let data = decode_hex(&cmd.data)?;
                let error = IJobAccumulatorErrors::abi_decode(&data, true).map_err(|err| {
                    CliError::InvalidInput(format!("not an accumulator error: {err}"))
                })?;
                Ok(format!("{error:?}"))
            }
        }
    }
}
