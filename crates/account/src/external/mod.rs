//! Collaborators the account flow depends on but does not implement: key custody and per-chain
//! infrastructure endpoints.

mod credential_store;
pub use credential_store::*;

mod endpoints;
pub use endpoints::*;
