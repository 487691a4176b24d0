//! Library half of the `omni` CLI. Each subcommand lives in its own module with a `Cmd` type.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cmd;
pub use cmd::*;

/// `omni account` subcommands.
pub mod account;
/// `omni auth` subcommands.
pub mod auth;
/// Shared CLI plumbing: errors, logging, hex input and the file credential store.
pub mod common;
/// `omni endpoints` subcommands.
pub mod endpoints;
/// `omni job` subcommands.
pub mod job;
/// `omni passkey` subcommands.
pub mod passkey;
