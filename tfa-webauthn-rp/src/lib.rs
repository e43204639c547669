//! # tfa-webauthn relying party
//!
//! This crate implements the relying party side of the [WebAuthn] ceremonies a second factor
//! needs: issuing challenges, remembering the request that is waiting for an answer, and
//! verifying what the browser sends back.
//!
//! * [`AssertionValidator`] checks authentication responses: client data, origin, RP ID hash,
//!   user presence and verification, the signature, and the signature counter.
//! * [`RegistrationValidator`] checks registration responses carrying "none" attestation and
//!   produces the [`CredentialSource`](tfa_webauthn_types::CredentialSource) to persist.
//! * [`CeremonyState`] keeps the issued request in the user's session until it is consumed, at
//!   most once.
//! * [`CredentialStore`] is the contract of the host's credential storage. Storage is defined
//!   through a trait so that only the parts that vary between hosts need implementing, the
//!   ceremonies stay the same regardless.
//!
//! ES256, ES384, RS256 and EdDSA credentials are verified, with the pure Rust [RustCrypto] and
//! [dalek] implementations.
//!
//! [WebAuthn]: https://w3c.github.io/webauthn
//! [RustCrypto]: https://github.com/RustCrypto
//! [dalek]: https://github.com/dalek-cryptography

mod assertion;
mod ceremony_state;
mod challenge;
mod client_data;
pub mod config;
pub mod cose;
mod credential_store;
mod error;
mod registration;
mod rp_id_verifier;

#[cfg(any(test, feature = "testable"))]
pub mod testing;

pub use self::{
    assertion::AssertionValidator,
    ceremony_state::{CeremonyKind, CeremonyState, MemorySession, SessionStore, StoredCeremony},
    challenge::{generate_challenge, CHALLENGE_LEN},
    config::WebauthnConfig,
    credential_store::{CredentialStore, MemoryStore, SignCountUpdate},
    error::{CeremonyError, RpError, StoreError},
    registration::RegistrationValidator,
    rp_id_verifier::{RequestContext, RpIdVerifier},
};

#[cfg(any(test, feature = "testable"))]
pub use self::{ceremony_state::MockSessionStore, credential_store::MockCredentialStore};
