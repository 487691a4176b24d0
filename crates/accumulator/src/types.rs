//! Jobs, deposits and the read-only job view.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};

use crate::JobView;

/// Identifier of a job.
pub type JobId = U256;

/// Identifier of a source chain.
pub type ChainId = u64;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum JobStatus {
    /// Deposits are being collected.
    #[default]
    Accumulating = 0,
    /// The required amount has been received.
    Accumulated = 1,
    /// The job's calls ran successfully.
    Executed = 2,
    /// Deposits were returned to their depositors.
    Refunded = 3,
}

impl JobStatus {
    /// Whether a job may move from `self` to `next`.
    ///
    /// Valid transitions:
    /// - Accumulating → Accumulated
    /// - Accumulated → Executed
    /// - Accumulating → Refunded
    /// - Accumulated → Refunded
    ///
    /// Executed and Refunded are terminal.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Accumulating, Self::Accumulated) |
                (Self::Accumulated, Self::Executed) |
                (Self::Accumulating | Self::Accumulated, Self::Refunded)
        )
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Refunded)
    }
}

impl From<JobStatus> for u8 {
    fn from(status: JobStatus) -> Self {
        status as Self
    }
}

/// The state kept for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobState {
    /// Sum of all registered deposits.
    pub received: U256,
    /// Whether the approver signed off on execution.
    pub approved: bool,
    /// Set once, when the job is created.
    pub initialized: bool,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Token deposits are denominated in. The zero address stands for the native currency.
    pub input_token: Address,
    /// Chains that contributed at least one deposit.
    pub source_chains: BTreeSet<ChainId>,
    /// Amount contributed per `(chain, depositor)`, used to disburse refunds.
    pub deposits: BTreeMap<(ChainId, Address), U256>,
}

impl JobState {
    /// A freshly initialized job.
    pub fn new(input_token: Address) -> Self {
        Self { initialized: true, input_token, ..Default::default() }
    }

    /// Whether deposits are denominated in the native currency.
    pub fn is_native(&self) -> bool {
        self.input_token.is_zero()
    }

    /// ABI view of the state.
    pub fn to_view(&self) -> JobView {
        JobView {
            received: self.received,
            approved: self.approved,
            initialized: self.initialized,
            status: self.status.into(),
            inputToken: self.input_token,
            sourceChains: self.source_chains.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use JobStatus::{Accumulated, Accumulating, Executed, Refunded};

    #[rstest]
    #[case(Accumulating, Accumulated, true)]
    #[case(Accumulated, Executed, true)]
    #[case(Accumulating, Refunded, true)]
    #[case(Accumulated, Refunded, true)]
    #[case(Accumulating, Executed, false)]
    #[case(Accumulated, Accumulating, false)]
    #[case(Executed, Refunded, false)]
    #[case(Refunded, Accumulating, false)]
    #[case(Executed, Executed, false)]
    fn test_status_transitions(
        #[case] from: JobStatus,
        #[case] to: JobStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_new_job_view() {
        let token = Address::repeat_byte(0x77);
        let view = JobState::new(token).to_view();
        assert!(view.initialized);
        assert!(!view.approved);
        assert_eq!(view.status, 0);
        assert_eq!(view.inputToken, token);
        assert!(view.sourceChains.is_empty());
    }
}
