//! Signature verification with the public keys stored in credential sources.
//!
//! Credentials carry their public key as a [COSE_Key]. The algorithms verified are those security
//! keys and platform authenticators produce in practice: ES256, ES384, RS256 (the usual choice of
//! TPM backed authenticators) and EdDSA over Ed25519.
//!
//! [COSE_Key]: https://www.rfc-editor.org/rfc/rfc9052#name-key-objects

use coset::{
    iana::{self, EnumI64},
    CborSerializable, CoseKey, CoseKeyBuilder, Label, RegisteredLabel, RegisteredLabelWithPrivate,
};
use p256::ecdsa::signature::Verifier;
use rsa::traits::PublicKeyParts;

use crate::CeremonyError;


/// Length of an uncompressed SEC1 encoded P-256 point.
pub const SEC1_UNCOMPRESSED_LEN: usize = 65;

const P256_COORDINATE_LEN: usize = 32;

const P384_COORDINATE_LEN: usize = 48;

/// Smallest accepted RSA modulus, in bytes.
pub const RSA_MIN_MODULUS_LEN: usize = 256;

/// Whether credentials using `alg` can be verified.
pub fn supported_algorithm(alg: iana::Algorithm) -> bool {
    matches!(
        alg,
        iana::Algorithm::ES256
            | iana::Algorithm::ES384
            | iana::Algorithm::RS256
            | iana::Algorithm::EdDSA
    )
}

/// A verifying key decoded from a credential's COSE public key.
#[derive(Debug, Clone)]
pub enum CredentialPublicKey {
    /// ECDSA over P-256 with SHA-256, signatures are DER encoded.
    Es256(p256::ecdsa::VerifyingKey),
    /// ECDSA over P-384 with SHA-384, signatures are DER encoded.
    Es384(p384::ecdsa::VerifyingKey),
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256(rsa::RsaPublicKey),
    /// Ed25519, signatures are the raw 64 bytes.
    EdDsa(ed25519_dalek::VerifyingKey),
}

impl CredentialPublicKey {
    /// Decode the CBOR encoded COSE key stored in a credential source.
    pub fn from_cose_slice(bytes: &[u8]) -> Result<Self, CeremonyError> {
        let key = CoseKey::from_slice(bytes).map_err(|e| {
            log::debug!("stored public key is not a COSE key: {e}");
            CeremonyError::MalformedInput
        })?;
        Self::from_cose_key(&key)
    }

    /// Build a verifying key for the algorithm the COSE key is registered with.
    pub fn from_cose_key(key: &CoseKey) -> Result<Self, CeremonyError> {
        let Some(RegisteredLabelWithPrivate::Assigned(alg)) = key.alg else {
            log::debug!("COSE key does not name an algorithm");
            return Err(CeremonyError::UnsupportedAlgorithm);
        };

        match (alg, &key.kty) {
            (iana::Algorithm::ES256, RegisteredLabel::Assigned(iana::KeyType::EC2)) => {
                if curve(key) != Some(iana::EllipticCurve::P_256.to_i64()) {
                    return Err(CeremonyError::UnsupportedAlgorithm);
                }
                let point = ec2_point(key, P256_COORDINATE_LEN)?;
                p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                    .map(Self::Es256)
                    .map_err(|_| CeremonyError::MalformedInput)
            }
            (iana::Algorithm::ES384, RegisteredLabel::Assigned(iana::KeyType::EC2)) => {
                if curve(key) != Some(iana::EllipticCurve::P_384.to_i64()) {
                    return Err(CeremonyError::UnsupportedAlgorithm);
                }
                let point = ec2_point(key, P384_COORDINATE_LEN)?;
                p384::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                    .map(Self::Es384)
                    .map_err(|_| CeremonyError::MalformedInput)
            }
            (iana::Algorithm::RS256, RegisteredLabel::Assigned(iana::KeyType::RSA)) => {
                let n = param(key, iana::RsaKeyParameter::N.to_i64())
                    .ok_or(CeremonyError::MalformedInput)?;
                let e = param(key, iana::RsaKeyParameter::E.to_i64())
                    .ok_or(CeremonyError::MalformedInput)?;
                let key = rsa::RsaPublicKey::new(
                    rsa::BigUint::from_bytes_be(n),
                    rsa::BigUint::from_bytes_be(e),
                )
                .map_err(|err| {
                    log::debug!("invalid RSA public key: {err}");
                    CeremonyError::MalformedInput
                })?;
                if key.size() < RSA_MIN_MODULUS_LEN {
                    log::debug!("RSA modulus of {} bytes is too short", key.size());
                    return Err(CeremonyError::MalformedInput);
                }
                Ok(Self::Rs256(key))
            }
            (iana::Algorithm::EdDSA, RegisteredLabel::Assigned(iana::KeyType::OKP)) => {
                if curve(key) != Some(iana::EllipticCurve::Ed25519.to_i64()) {
                    return Err(CeremonyError::UnsupportedAlgorithm);
                }
                let x: &[u8; ed25519_dalek::PUBLIC_KEY_LENGTH] =
                    param(key, iana::OkpKeyParameter::X.to_i64())
                        .and_then(|x| x.try_into().ok())
                        .ok_or(CeremonyError::MalformedInput)?;
                ed25519_dalek::VerifyingKey::from_bytes(x)
                    .map(Self::EdDsa)
                    .map_err(|_| CeremonyError::MalformedInput)
            }
            (alg, _) => {
                log::debug!("cannot verify signatures of algorithm {alg:?}");
                Err(CeremonyError::UnsupportedAlgorithm)
            }
        }
    }

    /// The algorithm this key verifies.
    pub fn algorithm(&self) -> iana::Algorithm {
        match self {
            CredentialPublicKey::Es256(_) => iana::Algorithm::ES256,
            CredentialPublicKey::Es384(_) => iana::Algorithm::ES384,
            CredentialPublicKey::Rs256(_) => iana::Algorithm::RS256,
            CredentialPublicKey::EdDsa(_) => iana::Algorithm::EdDSA,
        }
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CeremonyError> {
        match self {
            CredentialPublicKey::Es256(key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                // authenticators are free to emit high S values
                let signature = signature.normalize_s().unwrap_or(signature);
                key.verify(message, &signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
            CredentialPublicKey::Es384(key) => {
                let signature = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                let signature = signature.normalize_s().unwrap_or(signature);
                key.verify(message, &signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
            CredentialPublicKey::Rs256(key) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                let key = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(key.clone());
                Verifier::verify(&key, message, &signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
            CredentialPublicKey::EdDsa(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                key.verify_strict(message, &signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
        }
    }
}

/// Wrap a raw uncompressed P-256 point, as U2F stored it, into an ES256 COSE key.
pub fn es256_key_from_sec1(point: &[u8]) -> Result<CoseKey, CeremonyError> {
    if point.len() != SEC1_UNCOMPRESSED_LEN {
        return Err(CeremonyError::MalformedInput);
    }
    let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
        .map_err(|_| CeremonyError::MalformedInput)?;
    Ok(es256_cose_key(&key))
}

/// The ES256 COSE key of a P-256 verifying key.
pub fn es256_cose_key(key: &p256::ecdsa::VerifyingKey) -> CoseKey {
    let point = key.to_encoded_point(false);
    let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
    let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
    CoseKeyBuilder::new_ec2_pub_key(iana::EllipticCurve::P_256, x, y)
        .algorithm(iana::Algorithm::ES256)
        .build()
}

/// The ES384 COSE key of a P-384 verifying key.
pub fn es384_cose_key(key: &p384::ecdsa::VerifyingKey) -> CoseKey {
    let point = key.to_encoded_point(false);
    let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
    let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
    CoseKeyBuilder::new_ec2_pub_key(iana::EllipticCurve::P_384, x, y)
        .algorithm(iana::Algorithm::ES384)
        .build()
}

/// The RS256 COSE key of an RSA public key.
pub fn rs256_cose_key(key: &rsa::RsaPublicKey) -> CoseKey {
    CoseKeyBuilder::new()
        .key_type(iana::KeyType::RSA)
        .param(
            iana::RsaKeyParameter::N.to_i64(),
            ciborium::Value::Bytes(key.n().to_bytes_be()),
        )
        .param(
            iana::RsaKeyParameter::E.to_i64(),
            ciborium::Value::Bytes(key.e().to_bytes_be()),
        )
        .algorithm(iana::Algorithm::RS256)
        .build()
}

/// The EdDSA COSE key of an Ed25519 verifying key.
pub fn eddsa_cose_key(key: &ed25519_dalek::VerifyingKey) -> CoseKey {
    CoseKeyBuilder::new()
        .key_type(iana::KeyType::OKP)
        .param(
            iana::OkpKeyParameter::Crv.to_i64(),
            ciborium::Value::from(iana::EllipticCurve::Ed25519.to_i64()),
        )
        .param(
            iana::OkpKeyParameter::X.to_i64(),
            ciborium::Value::Bytes(key.to_bytes().to_vec()),
        )
        .algorithm(iana::Algorithm::EdDSA)
        .build()
}

/// The uncompressed SEC1 encoding of an EC2 key's coordinates.
fn ec2_point(key: &CoseKey, coordinate_len: usize) -> Result<Vec<u8>, CeremonyError> {
    let x = param(key, iana::Ec2KeyParameter::X.to_i64()).ok_or(CeremonyError::MalformedInput)?;
    let y = param(key, iana::Ec2KeyParameter::Y.to_i64()).ok_or(CeremonyError::MalformedInput)?;
    if x.len() != coordinate_len || y.len() != coordinate_len {
        return Err(CeremonyError::MalformedInput);
    }
    let mut point = Vec::with_capacity(1 + 2 * coordinate_len);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    Ok(point)
}

fn curve(key: &CoseKey) -> Option<i64> {
    key.params.iter().find_map(|(label, value)| match label {
        Label::Int(i) if *i == iana::Ec2KeyParameter::Crv.to_i64() => {
            value.as_integer().and_then(|crv| i64::try_from(crv).ok())
        }
        _ => None,
    })
}

fn param(key: &CoseKey, label: i64) -> Option<&[u8]> {
    let mut found = None;
    for (l, value) in &key.params {
        if *l == Label::Int(label) {
            if found.is_some() {
                log::warn!("Cose key has multiple entries for parameter {label}");
                return None;
            }
            found = value.as_bytes().map(Vec::as_slice);
        }
    }
    found
}
