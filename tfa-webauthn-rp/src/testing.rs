//! A software security key for exercising the ceremonies end to end.
//!
//! It plays the part of both the browser and the authenticator: it builds the client data, the
//! authenticator data and the signatures a real key would return, and can be told to misbehave.

use coset::{iana::EnumI64, CborSerializable, CoseKey};
use p256::ecdsa::signature::Signer;
use tfa_webauthn_types::{
    authenticator::{Aaguid, AttestationObject, AttestedCredentialData, AuthenticatorData, Flags},
    crypto::sha256,
    encoding,
    rand::random_vec,
    webauthn::{
        AuthenticatedPublicKeyCredential, AuthenticationExtensionsClientOutputs,
        AuthenticatorAssertionResponse, AuthenticatorAttachment, AuthenticatorAttestationResponse,
        AuthenticatorTransport, ClientDataType, CollectedClientData, CreatedPublicKeyCredential,
        PublicKeyCredential, PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
        PublicKeyCredentialType,
    },
    Bytes, CredentialSource, TrustPath, NONE_ATTESTATION_TYPE,
};

use crate::{cose, RpError};

/// Length of the credential IDs the software key hands out.
const CREDENTIAL_ID_LEN: usize = 16;

/// Modulus size of the RSA keys the software key generates.
const RSA_BITS: usize = 2048;

enum KeyPair {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    Rsa(rsa::RsaPrivateKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// How the simulated browser handles a requested `appid` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppIdUse {
    /// Scope the assertion to the RP ID.
    #[default]
    Unused,
    /// Scope the assertion to the AppID and report `appid: true`.
    Reported,
    /// Scope the assertion to the AppID but do not report it.
    Unreported,
}

/// A software authenticator holding a single credential.
pub struct SoftwareAuthenticator {
    key: KeyPair,
    credential_id: Vec<u8>,
    /// The origin the simulated browser reports.
    pub origin: String,
    /// The signature counter. Incremented before every assertion unless it is `0`.
    pub counter: u32,
    /// Flags set in the authenticator data.
    pub flags: Flags,
    /// How a requested AppID is used.
    pub appid: AppIdUse,
}

impl SoftwareAuthenticator {
    /// A key with an ES256 credential, used from `origin`.
    pub fn es256(origin: impl Into<String>) -> Self {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        Self::with_key(KeyPair::P256(key), origin.into())
    }

    /// A key with an ES384 credential, used from `origin`.
    pub fn es384(origin: impl Into<String>) -> Self {
        let key = p384::ecdsa::SigningKey::random(&mut rand::thread_rng());
        Self::with_key(KeyPair::P384(key), origin.into())
    }

    /// A key with an RS256 credential, as TPM backed platform authenticators create them.
    pub fn rs256(origin: impl Into<String>) -> Result<Self, RpError> {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), RSA_BITS).map_err(|e| {
            log::debug!("could not generate an RSA key: {e}");
            RpError::RandomSource
        })?;
        Ok(Self::with_key(KeyPair::Rsa(key), origin.into()))
    }

    /// A key with an EdDSA credential, used from `origin`.
    pub fn eddsa(origin: impl Into<String>) -> Self {
        let key = ed25519_dalek::SigningKey::from_bytes(&rand::random());
        Self::with_key(KeyPair::Ed25519(key), origin.into())
    }

    fn with_key(key: KeyPair, origin: String) -> Self {
        Self {
            key,
            credential_id: random_vec(CREDENTIAL_ID_LEN),
            origin,
            counter: 1,
            flags: Flags::UP,
            appid: AppIdUse::default(),
        }
    }

    /// The credential ID.
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The credential's public key.
    pub fn public_key(&self) -> CoseKey {
        match &self.key {
            KeyPair::P256(key) => cose::es256_cose_key(key.verifying_key()),
            KeyPair::P384(key) => cose::es384_cose_key(key.verifying_key()),
            KeyPair::Rsa(key) => cose::rs256_cose_key(&key.to_public_key()),
            KeyPair::Ed25519(key) => cose::eddsa_cose_key(&key.verifying_key()),
        }
    }

    /// The record a relying party would hold for this credential after registering it.
    pub fn credential_source(&self, user_handle: &[u8]) -> Result<CredentialSource, RpError> {
        Ok(CredentialSource {
            credential_id: self.credential_id.clone().into(),
            public_key: self.cose_key_bytes()?.into(),
            user_handle: user_handle.into(),
            sign_count: self.counter,
            transports: vec![AuthenticatorTransport::Usb],
            attestation_type: NONE_ATTESTATION_TYPE.to_owned(),
            trust_path: TrustPath::Empty,
            aaguid: Aaguid::new_empty(),
        })
    }

    /// The key as the legacy U2F bundle stored it: a websafe base64 key handle and the standard
    /// base64 of the raw public point. Only ES256 keys existed under U2F.
    pub fn legacy_u2f_registration(&self) -> Option<(String, String)> {
        let KeyPair::P256(key) = &self.key else {
            return None;
        };
        let handle = encoding::base64url(&self.credential_id);
        let point = key.verifying_key().to_encoded_point(false);
        Some((handle, encoding::base64(point.as_bytes())))
    }

    /// Answer `navigator.credentials.create` with "none" attestation.
    pub fn register(
        &self,
        options: &PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, RpError> {
        let rp_id = options.rp.id.as_deref().unwrap_or_default();
        let client_data_json = self.client_data(ClientDataType::Create, &options.challenge)?;

        let acd = AttestedCredentialData::new(
            Aaguid::new_empty(),
            self.credential_id.clone(),
            self.public_key(),
        )
        .map_err(|e| RpError::Serialization(e.to_string()))?;
        let auth_data = AuthenticatorData::new(rp_id, self.counter)
            .with_flags(self.flags)
            .set_attested_credential_data(acd);
        let authenticator_data = auth_data
            .to_vec()
            .map_err(|e| RpError::Serialization(e.to_string()))?;
        let attestation_object = AttestationObject::none(auth_data)
            .to_vec()
            .map_err(|e| RpError::Serialization(e.to_string()))?;

        Ok(PublicKeyCredential {
            id: encoding::base64url(&self.credential_id),
            raw_id: self.credential_id.clone().into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAttestationResponse {
                client_data_json: client_data_json.into(),
                authenticator_data: Some(authenticator_data.into()),
                public_key: None,
                public_key_algorithm: Some(self.algorithm().to_i64()),
                attestation_object: attestation_object.into(),
                transports: vec![AuthenticatorTransport::Usb],
            },
            authenticator_attachment: Some(AuthenticatorAttachment::CrossPlatform),
            client_extension_results: AuthenticationExtensionsClientOutputs::default(),
        })
    }

    /// Answer `navigator.credentials.get`, returning `user_handle` as the user handle.
    pub fn assert(
        &mut self,
        options: &PublicKeyCredentialRequestOptions,
        user_handle: Option<&[u8]>,
    ) -> Result<AuthenticatedPublicKeyCredential, RpError> {
        if self.counter != 0 {
            self.counter = self.counter.saturating_add(1);
        }

        let rp_id = options.rp_id.as_deref().unwrap_or_default();
        let (scope, used_appid) = match (self.appid, options.requested_appid()) {
            (AppIdUse::Reported, Some(appid)) => (appid, Some(true)),
            (AppIdUse::Unreported, Some(appid)) => (appid, None),
            _ => (rp_id, None),
        };

        let client_data_json = self.client_data(ClientDataType::Get, &options.challenge)?;
        let authenticator_data = AuthenticatorData::new(scope, self.counter)
            .with_flags(self.flags)
            .to_vec()
            .map_err(|e| RpError::Serialization(e.to_string()))?;
        let signature = self.sign(&authenticator_data, &client_data_json);

        Ok(PublicKeyCredential {
            id: encoding::base64url(&self.credential_id),
            raw_id: self.credential_id.clone().into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAssertionResponse {
                client_data_json: client_data_json.into(),
                authenticator_data: authenticator_data.into(),
                signature: signature.into(),
                user_handle: user_handle.map(Bytes::from),
            },
            authenticator_attachment: Some(AuthenticatorAttachment::CrossPlatform),
            client_extension_results: AuthenticationExtensionsClientOutputs {
                appid: used_appid,
                cred_props: None,
            },
        })
    }

    fn algorithm(&self) -> coset::iana::Algorithm {
        match self.key {
            KeyPair::P256(_) => coset::iana::Algorithm::ES256,
            KeyPair::P384(_) => coset::iana::Algorithm::ES384,
            KeyPair::Rsa(_) => coset::iana::Algorithm::RS256,
            KeyPair::Ed25519(_) => coset::iana::Algorithm::EdDSA,
        }
    }

    fn cose_key_bytes(&self) -> Result<Vec<u8>, RpError> {
        self.public_key()
            .to_vec()
            .map_err(|e| RpError::Serialization(e.to_string()))
    }

    fn client_data(&self, ty: ClientDataType, challenge: &[u8]) -> Result<Vec<u8>, RpError> {
        let client_data = CollectedClientData {
            ty: Some(ty),
            challenge: encoding::base64url(challenge),
            origin: self.origin.clone(),
            cross_origin: None,
            unknown_keys: Default::default(),
        };
        Ok(serde_json::to_vec(&client_data)?)
    }

    fn sign(&self, authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
        let mut signed = authenticator_data.to_vec();
        signed.extend_from_slice(&sha256(client_data_json));
        match &self.key {
            KeyPair::P256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(&signed);
                signature.to_der().as_bytes().to_vec()
            }
            KeyPair::P384(key) => {
                let signature: p384::ecdsa::Signature = key.sign(&signed);
                signature.to_der().as_bytes().to_vec()
            }
            KeyPair::Rsa(key) => {
                let key = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
                rsa::signature::SignatureEncoding::to_vec(&Signer::sign(
                    &key, &signed,
                ))
            }
            KeyPair::Ed25519(key) => Signer::sign(key, &signed).to_bytes().to_vec(),
        }
    }
}
