//! Keys registered through the legacy U2F API.
//!
//! The U2F bundle stored each registration as a websafe base64 key handle and the standard base64
//! encoding of the raw P-256 public point. Browsers still let these keys answer WebAuthn
//! requests through the `appid` extension, so they are converted into credential sources on the
//! fly and never written to the credential store.

use coset::CborSerializable;
use serde::{Deserialize, Serialize};
use tfa_webauthn_rp::{cose, CeremonyError};
use tfa_webauthn_types::{
    authenticator::Aaguid, encoding, CredentialSource, TrustPath, NONE_ATTESTATION_TYPE,
};

/// A U2F registration as the host stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyU2fKey {
    /// The key handle, websafe base64.
    pub key_handle: String,
    /// The uncompressed P-256 public point, standard base64.
    pub public_key: String,
    /// The attestation certificate. Kept for completeness, never consulted.
    #[serde(default)]
    pub certificate: String,
    /// The last U2F counter. Not consulted: legacy keys skip clone detection.
    #[serde(default)]
    pub counter: u32,
}

impl LegacyU2fKey {
    /// The credential ID the key answers with, which is the decoded key handle.
    pub fn credential_id(&self) -> Result<Vec<u8>, CeremonyError> {
        encoding::try_from_websafe_base64(&self.key_handle).ok_or(CeremonyError::MalformedInput)
    }

    /// The credential source standing in for this key, owned by `user_handle`.
    ///
    /// Its signature counter is the sentinel `0` so counters are never compared.
    pub fn to_credential_source(&self, user_handle: &[u8]) -> Result<CredentialSource, CeremonyError> {
        let credential_id = self.credential_id()?;
        let point =
            encoding::try_from_base64(&self.public_key).ok_or(CeremonyError::MalformedInput)?;
        let public_key = cose::es256_key_from_sec1(&point)?
            .to_vec()
            .map_err(|_| CeremonyError::MalformedInput)?;

        Ok(CredentialSource {
            credential_id: credential_id.into(),
            public_key: public_key.into(),
            user_handle: user_handle.into(),
            sign_count: 0,
            transports: Vec::new(),
            attestation_type: NONE_ATTESTATION_TYPE.to_owned(),
            trust_path: TrustPath::Empty,
            aaguid: Aaguid::new_empty(),
        })
    }
}
