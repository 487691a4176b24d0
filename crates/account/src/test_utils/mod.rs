//! Test utilities for omni accounts.

mod eoa;
mod passkey;

pub use eoa::*;
pub use passkey::*;
