//! WebAuthn passkey verification.
//!
//! [`PasskeyVerifier`] checks registration (attestation) and authentication (assertion)
//! ceremonies for ES256 credentials. It never talks to the platform: prompting the user is the
//! job of the presentation layer, whose failures are carried through as [`PresentationError`].

mod auth_data;
pub use auth_data::*;

mod client_data;
pub use client_data::*;

mod cose;
pub use cose::*;

mod error;
pub use error::*;

mod key;
pub use key::*;

mod verifier;
pub use verifier::*;
