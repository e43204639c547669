//! Authenticator-produced structures a relying party has to parse: the authenticator data that
//! every assertion and attestation carries, and the CBOR attestation object of a registration.

mod aaguid;
mod attestation_object;
mod authenticator_data;
mod flags;

pub use self::{
    aaguid::Aaguid,
    attestation_object::{AttestationObject, NONE_ATTESTATION_FORMAT},
    authenticator_data::{AttestedCredentialData, AuthenticatorData},
    flags::Flags,
};
