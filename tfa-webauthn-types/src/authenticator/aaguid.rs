use serde::{Deserialize, Serialize};

use crate::{encoding, Bytes};

/// An Authenticator Attestation GUID is a 128-bit identifier of the authenticator's make and
/// model.
///
/// "none" attestation carries no trustworthy model information, so most credentials in this crate
/// have the empty AAGUID, and legacy U2F keys always do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Aaguid(pub [u8; Self::LEN]);

impl Aaguid {
    const LEN: usize = 16;

    /// Generate empty AAGUID
    pub const fn new_empty() -> Self {
        Self([0; 16])
    }
}

impl Default for Aaguid {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl From<[u8; 16]> for Aaguid {
    fn from(inner: [u8; 16]) -> Self {
        Aaguid(inner)
    }
}

impl Serialize for Aaguid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&encoding::base64url(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Aaguid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = Bytes::deserialize(deserializer)?;
        let len = bytes.len();
        <[u8; Self::LEN]>::try_from(Vec::from(bytes))
            .map(Aaguid)
            .map_err(|_| {
                <D::Error as serde::de::Error>::custom(format!(
                    "Byte string of len {len}, is not of len {}",
                    Self::LEN
                ))
            })
    }
}
