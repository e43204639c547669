//! # tfa-webauthn types
//!
//! Rust type definitions for the WebAuthn ceremonies a relying party runs when a security key is
//! used as a second factor: the JSON shapes exchanged with the browser, the binary structures
//! produced by authenticators, and the relying party's record of a registered credential.

mod utils;

pub mod authenticator;
pub mod credential;
pub mod webauthn;

// Re-exports
pub use credential::{CredentialSource, TrustPath, NONE_ATTESTATION_TYPE};
pub use utils::{
    bytes::{Bytes, NotBase64Encoded},
    crypto, encoding, rand,
};
