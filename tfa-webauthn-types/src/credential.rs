//! The relying party's record of a registered credential.

use coset::{CborSerializable, CoseKey};
use serde::{Deserialize, Serialize};

use crate::{
    authenticator::Aaguid,
    utils::serde::ignore_unknown_vec,
    webauthn::{AuthenticatorTransport, PublicKeyCredentialDescriptor},
    Bytes,
};

/// The attestation type recorded for credentials registered with "none" attestation.
pub const NONE_ATTESTATION_TYPE: &str = "none";

/// Everything the relying party keeps about one credential, produced by a registration ceremony
/// (or adapted from a legacy U2F registration) and consumed by authentication ceremonies.
///
/// The host persists this record, typically as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSource {
    /// The credential ID chosen by the authenticator. Unique across all users.
    pub credential_id: Bytes,

    /// The credential public key, encoded as a COSE_Key.
    pub public_key: Bytes,

    /// The user handle of the owning account.
    pub user_handle: Bytes,

    /// The last signature counter seen. `0` means the authenticator has no counter, or that
    /// cloning detection is disabled for this credential.
    pub sign_count: u32,

    /// Transports reported at registration, echoed back in credential descriptors.
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    pub transports: Vec<AuthenticatorTransport>,

    /// The attestation type of the registration, always `"none"` here.
    pub attestation_type: String,

    /// The attestation trust path.
    #[serde(default)]
    pub trust_path: TrustPath,

    /// The AAGUID reported at registration.
    #[serde(default)]
    pub aaguid: Aaguid,
}

impl CredentialSource {
    /// The descriptor used to list this credential in `allowCredentials` or
    /// `excludeCredentials`.
    pub fn descriptor(&self) -> PublicKeyCredentialDescriptor {
        PublicKeyCredentialDescriptor::public_key(
            self.credential_id.clone(),
            self.transports.clone(),
        )
    }

    /// Decode the stored public key.
    pub fn cose_key(&self) -> coset::Result<CoseKey> {
        CoseKey::from_slice(&self.public_key)
    }
}

/// How an attestation chains up to a trust anchor. "none" attestation has nothing to chain.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrustPath {
    /// No trust path: "none" attestation and legacy keys.
    #[default]
    Empty,
}

#[cfg(test)]
mod tests {
    use coset::{iana, CoseKeyBuilder};

    use super::*;
    use crate::utils::rand::random_vec;

    fn source() -> CredentialSource {
        let key = CoseKeyBuilder::new_ec2_pub_key(
            iana::EllipticCurve::P_256,
            random_vec(32),
            random_vec(32),
        )
        .algorithm(iana::Algorithm::ES256)
        .build();
        CredentialSource {
            credential_id: random_vec(16).into(),
            public_key: key.to_vec().expect("could not encode key").into(),
            user_handle: b"alice".as_slice().into(),
            sign_count: 4,
            transports: vec![AuthenticatorTransport::Usb, AuthenticatorTransport::Nfc],
            attestation_type: NONE_ATTESTATION_TYPE.to_owned(),
            trust_path: TrustPath::Empty,
            aaguid: Aaguid::new_empty(),
        }
    }

    #[test]
    fn json_persistence_round_trip() {
        let expected = source();
        let json = serde_json::to_string(&expected).expect("could not serialize");
        let restored: CredentialSource = serde_json::from_str(&json).expect("could not deserialize");
        assert_eq!(expected, restored);

        let value: serde_json::Value = serde_json::from_str(&json).expect("not json");
        assert_eq!(value["trustPath"]["type"], "empty");
        assert_eq!(value["userHandle"], "YWxpY2U");
    }

    #[test]
    fn descriptor_mirrors_the_source() {
        let source = source();
        let descriptor = source.descriptor();
        assert!(descriptor.is_known());
        assert_eq!(descriptor.id, source.credential_id);
        assert_eq!(descriptor.transports, source.transports);
    }

    #[test]
    fn stored_key_decodes() {
        let key = source().cose_key().expect("could not decode key");
        assert_eq!(
            key.alg,
            Some(coset::Algorithm::Assigned(iana::Algorithm::ES256))
        );
    }
}
