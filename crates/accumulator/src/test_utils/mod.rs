//! Test utilities for the job accumulator.

mod ledger;

pub use ledger::*;
