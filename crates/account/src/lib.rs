//! Passkey-backed account provisioning for omni smart accounts.
//!
//! The crate turns the output of a device passkey ceremony into a [`PasskeyPublicKey`], binds an
//! externally-owned account to smart-account code with a chain-scoped EIP-7702 authorization and
//! bundles the result into an immutable [`CreatedAccount`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod account;
pub use account::*;

mod authorization;
pub use authorization::*;

mod external;
pub use external::*;

mod passkey;
pub use passkey::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
