use std::{
    io::{Cursor, Read},
    num::TryFromIntError,
};

use ciborium::value::Value;
use coset::{iana, AsCborValue, CborSerializable, CoseKey};
use serde::{Deserialize, Serialize};

use crate::{
    authenticator::{Aaguid, Flags},
    crypto::sha256,
};

/// The authenticator data structure encodes contextual bindings made by the authenticator: the RP
/// ID it scoped the credential to, user presence and verification, the signature counter and, on
/// registration, the new credential's public key.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-data>
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    /// SHA-256 hash of the RP ID the credential is scoped to.
    rp_id_hash: [u8; 32],

    /// The flags representing the information of this credential. See [Flags] for more information.
    pub flags: Flags,

    /// Signature counter, 32-bit unsigned big-endian integer. Authenticators without a counter
    /// always report 0.
    pub counter: u32,

    /// An optional [AttestedCredentialData], if present, the [Flags::AT] needs to be set to true.
    pub attested_credential_data: Option<AttestedCredentialData>,

    /// Extension-defined authenticator data. This is a CBOR map with extension identifiers as
    /// keys, and authenticator extension outputs as values.
    pub extensions: Option<Value>,
}

impl AuthenticatorData {
    /// Create a new AuthenticatorData object for an RP ID and a counter, with the user present
    /// flag set.
    pub fn new(rp_id: &str, counter: u32) -> Self {
        Self {
            rp_id_hash: sha256(rp_id.as_bytes()),
            flags: Flags::UP,
            counter,
            attested_credential_data: None,
            extensions: None,
        }
    }

    /// Add an [`AttestedCredentialData`] to the authenticator data.
    ///
    /// This sets the [`Flags::AT`] value as well.
    pub fn set_attested_credential_data(mut self, acd: AttestedCredentialData) -> Self {
        self.attested_credential_data = Some(acd);
        self.set_flags(Flags::AT)
    }

    /// Set additional [`Flags`] to the authenticator data.
    pub fn set_flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Replace the [`Flags`] of the authenticator data.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Get read access to the RP ID hash
    pub fn rp_id_hash(&self) -> &[u8] {
        &self.rp_id_hash
    }

    /// Whether the user present flag is set.
    pub fn user_present(&self) -> bool {
        self.flags.contains(Flags::UP)
    }

    /// Whether the user verified flag is set.
    pub fn user_verified(&self) -> bool {
        self.flags.contains(Flags::UV)
    }
}

impl Serialize for AuthenticatorData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let bytes = self
            .to_vec()
            .map_err(|e| <S::Error as serde::ser::Error>::custom(e.to_string()))?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for AuthenticatorData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl<'v> serde::de::Visitor<'v> for Visitor {
            type Value = AuthenticatorData;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("Authenticator Data")
            }
            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                AuthenticatorData::from_slice(v).map_err(|e| E::custom(e.to_string()))
            }
        }
        deserializer.deserialize_bytes(Visitor)
    }
}

/// Because CoseError does not implement `From` for either `ciborium::de::Error<E>` or `std::io::Error`...
fn io_error<E>(_: E) -> coset::CoseError {
    coset::CoseError::DecodeFailed(ciborium::de::Error::Io(coset::EndOfFile))
}

impl AuthenticatorData {
    /// Decode an Authenticator data from a byte slice.
    ///
    /// Trailing bytes that are neither attested credential data nor extensions are rejected.
    pub fn from_slice(v: &[u8]) -> coset::Result<Self> {
        // hash len (32 bytes) + flags (1 byte) + counter (4 bytes)
        let Some((rp_id_hash, v)) = v.split_first_chunk::<32>() else {
            return Err(io_error(()));
        };
        let Some(([flag_byte], v)) = v.split_first_chunk::<1>() else {
            return Err(io_error(()));
        };
        let Some((counter, v)) = v.split_first_chunk::<4>() else {
            return Err(io_error(()));
        };

        let flags = Flags::from(*flag_byte);
        let mut managed_reader = Cursor::new(v);
        let attested_credential_data = flags
            .contains(Flags::AT)
            .then(|| AttestedCredentialData::from_reader(&mut managed_reader))
            .transpose()?;
        let extensions = flags
            .contains(Flags::ED)
            .then(|| ciborium::de::from_reader(&mut managed_reader).map_err(io_error))
            .transpose()?;

        let consumed = usize::try_from(managed_reader.position()).map_err(io_error)?;
        if consumed != v.len() {
            return Err(coset::CoseError::ExtraneousData);
        }

        Ok(AuthenticatorData {
            rp_id_hash: *rp_id_hash,
            flags,
            counter: u32::from_be_bytes(*counter),
            attested_credential_data,
            extensions,
        })
    }

    /// Encode an authenticator data to its byte representation.
    pub fn to_vec(&self) -> coset::Result<Vec<u8>> {
        let flags = if self.attested_credential_data.is_some() {
            self.flags | Flags::AT
        } else {
            self.flags
        };

        let mut bytes = Vec::with_capacity(37);
        bytes.extend_from_slice(&self.rp_id_hash);
        bytes.push(flags.into());
        bytes.extend_from_slice(&self.counter.to_be_bytes());
        if let Some(acd) = &self.attested_credential_data {
            bytes.extend(acd.to_vec()?);
        }
        if let Some(extensions) = &self.extensions {
            ciborium::ser::into_writer(extensions, &mut bytes)
                .map_err(|_| coset::CoseError::EncodeFailed)?;
        }
        Ok(bytes)
    }
}

/// Attested credential data is a variable-length byte array added to the authenticator data when
/// generating an attestation object for a credential
///
/// <https://w3c.github.io/webauthn/#attested-credential-data>
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    /// The AAGUID of the authenticator.
    pub aaguid: Aaguid,

    /// The credential ID whose length is prepended to the byte array. This is not public as it
    /// should not be modifiable to be longer than a u16.
    credential_id: Vec<u8>,

    /// The credential public key encoded in COSE_Key format. It MUST contain the "alg" parameter.
    pub key: CoseKey,
}

impl AttestedCredentialData {
    /// Create a new [AttestedCredentialData]
    ///
    /// # Error
    /// Returns an error if the length of `credential_id` cannot be represented by a u16.
    pub fn new(
        aaguid: Aaguid,
        credential_id: Vec<u8>,
        key: CoseKey,
    ) -> Result<Self, TryFromIntError> {
        // assert that the credential id's length can be represented by a u16
        u16::try_from(credential_id.len())?;

        Ok(Self {
            aaguid,
            credential_id,
            key,
        })
    }

    /// Get read access to the credential ID,
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The algorithm the key declares in its `alg` parameter, if it is a registered one.
    pub fn algorithm(&self) -> Option<iana::Algorithm> {
        match self.key.alg.as_ref()? {
            coset::Algorithm::Assigned(alg) => Some(*alg),
            _ => None,
        }
    }

    fn to_vec(&self) -> coset::Result<Vec<u8>> {
        // unfortunately any serialization in Coset does not use serde::Serialize and takes by value ...
        let cose_key = self.key.clone().to_vec()?;
        let cred_len = u16::try_from(self.credential_id.len())
            .map_err(|_| coset::CoseError::OutOfRangeIntegerValue)?;

        let mut bytes = Vec::with_capacity(18 + self.credential_id.len() + cose_key.len());
        bytes.extend_from_slice(&self.aaguid.0);
        bytes.extend_from_slice(&cred_len.to_be_bytes());
        bytes.extend_from_slice(&self.credential_id);
        bytes.extend(cose_key);
        Ok(bytes)
    }

    fn from_reader<R: Read>(reader: &mut R) -> coset::Result<Self> {
        let mut aaguid = [0; 16];
        reader.read_exact(&mut aaguid).map_err(io_error)?;
        let aaguid = Aaguid(aaguid);

        let mut cred_len = [0; 2];
        reader.read_exact(&mut cred_len).map_err(io_error)?;
        let cred_len: usize = u16::from_be_bytes(cred_len).into();

        let mut credential_id = vec![0; cred_len];
        reader.read_exact(&mut credential_id).map_err(io_error)?;

        let cose_val = ciborium::de::from_reader(reader).map_err(io_error)?;
        let key = CoseKey::from_cbor_value(cose_val)?;

        Ok(Self {
            aaguid,
            credential_id,
            key,
        })
    }
}
