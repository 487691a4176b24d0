//! On-chain half of omni: a per-job state machine that accumulates deposits arriving from several
//! source chains and, once funded and approved, executes or refunds the job through raw external
//! calls.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod accumulator;
pub use accumulator::*;

mod dispatch;
pub use dispatch::*;

mod error;
pub use error::*;

mod exec;
pub use exec::*;

mod interface;
pub use interface::*;

mod types;
pub use types::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
