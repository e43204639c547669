use ciborium::value::Value;
use serde::{Deserialize, Serialize};

use crate::authenticator::AuthenticatorData;

/// The attestation statement format identifier of "none" attestation.
pub const NONE_ATTESTATION_FORMAT: &str = "none";

/// The CBOR map a browser returns as `attestationObject` after a registration.
///
/// <https://w3c.github.io/webauthn/#sctn-attestation>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationObject {
    /// The attestation statement format identifier.
    pub fmt: String,

    /// The attestation statement, whose syntax is defined by [`Self::fmt`].
    #[serde(rename = "attStmt")]
    pub att_stmt: Value,

    /// The authenticator data holding the newly created credential.
    #[serde(rename = "authData")]
    pub auth_data: AuthenticatorData,
}

impl AttestationObject {
    /// Wrap authenticator data into a "none" attestation object.
    pub fn none(auth_data: AuthenticatorData) -> Self {
        Self {
            fmt: NONE_ATTESTATION_FORMAT.to_owned(),
            att_stmt: Value::Map(Vec::new()),
            auth_data,
        }
    }

    /// Decode an attestation object from its CBOR bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::de::from_reader(data)
    }

    /// Encode the attestation object to CBOR.
    pub fn to_vec(&self) -> Result<Vec<u8>, ciborium::ser::Error<std::io::Error>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)?;
        Ok(bytes)
    }

    /// Whether this is "none" attestation: the `none` format with an empty statement.
    pub fn is_none_attestation(&self) -> bool {
        self.fmt == NONE_ATTESTATION_FORMAT
            && matches!(&self.att_stmt, Value::Map(entries) if entries.is_empty())
    }
}
