//! `omni` command-line tool.
//!
//! Verifies passkey registrations, signs EIP-7702 authorizations and manages provisioned
//! accounts in a local credential store.

use clap::Parser;
use omni_cli::{Cli, Error};

fn main() -> Result<(), Error> {
    set_thread_panic_hook();
    Cli::parse().run().inspect_err(|e| eprintln!("error: {e}"))
}

/// Sets thread panic hook, useful for having tests that panic.
fn set_thread_panic_hook() {
    use std::{
        backtrace::Backtrace,
        panic::{set_hook, take_hook},
        process::exit,
    };
    let orig_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        eprintln!("Custom backtrace: {}", Backtrace::capture());
        orig_hook(panic_info);
        exit(1);
    }));
}
