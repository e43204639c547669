//! Types used for public key authentication

use serde::{Deserialize, Serialize};

use crate::{
    utils::serde::{ignore_unknown, ignore_unknown_vec},
    webauthn::{
        AuthenticationExtensionsClientInputs, PublicKeyCredential, PublicKeyCredentialDescriptor,
        UserVerificationRequirement,
    },
    Bytes,
};

#[cfg(doc)]
use crate::{
    authenticator::AuthenticatorData,
    webauthn::{CollectedClientData, PublicKeyCredentialUserEntity},
};

/// The response to the successful authentication of a [`PublicKeyCredential`]
pub type AuthenticatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAssertionResponse>;

/// This type supplies `get()` requests with the data it needs to generate an assertion.
/// Its `challenge` member MUST be present, while its other members are OPTIONAL.
///
/// The same value is kept in the session between issuing the challenge and validating the
/// response, so it round-trips through `serde_json` unchanged.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    /// This member specifies a challenge that the authenticator signs, along with other data, when
    /// producing an authentication assertion. See the [Cryptographic Challenges] security consideration.
    ///
    /// [Cryptographic Challenges]: https://w3c.github.io/webauthn/#sctn-cryptographic-challenges
    pub challenge: Bytes,

    /// A time, in milliseconds, that the Relying Party is willing to wait for the call to complete.
    /// The value is treated as a hint by the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// The [RP ID] claimed by the Relying Party. When omitted the browser uses the requesting
    /// origin's effective domain.
    ///
    /// [RP ID]: https://w3c.github.io/webauthn/#rp-id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,

    /// The credentials allowed to answer this challenge, in descending order of preference. For a
    /// second factor this lists every key the user registered.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "ignore_unknown_vec"
    )]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// The Relying Party's requirements regarding user verification for the `get()` operation.
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub user_verification: UserVerificationRequirement,

    /// Client extension inputs, such as the U2F `appid`.
    #[serde(default, skip_serializing_if = "AuthenticationExtensionsClientInputs::is_empty")]
    pub extensions: AuthenticationExtensionsClientInputs,
}

impl PublicKeyCredentialRequestOptions {
    /// Whether a credential with `id` may answer this request. An empty allow list allows every
    /// credential.
    pub fn allows(&self, id: &[u8]) -> bool {
        self.allow_credentials.is_empty()
            || self
                .allow_credentials
                .iter()
                .any(|descriptor| descriptor.is_known() && descriptor.id.as_slice() == id)
    }

    /// The AppID requested through the `appid` extension, if any.
    pub fn requested_appid(&self) -> Option<&str> {
        self.extensions.appid.as_deref()
    }
}

/// This type represents an authenticator's response to a client's request for generation of a new
/// authentication assertion given the Relying Party's [challenge](PublicKeyCredentialRequestOptions).
/// It contains a cryptographic signature proving possession of the credential private key.
///
/// <https://w3c.github.io/webauthn/#iface-authenticatorassertionresponse>
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponse {
    /// The JSON serialization of [`CollectedClientData`] the signature covers. The exact bytes
    /// MUST be preserved, as the hash of the serialized client data has been computed over them.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The authenticator data returned by the authenticator. See [`AuthenticatorData`].
    pub authenticator_data: Bytes,

    /// The raw signature returned from the authenticator.
    pub signature: Bytes,

    /// The user handle returned from the authenticator, or null if the authenticator did not
    /// return one.
    ///
    /// This mirrors the [`PublicKeyCredentialUserEntity::id`] field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Bytes>,
}
