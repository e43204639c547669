//! Types specific to public key credential creation
use coset::iana;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::{
    utils::serde::{i64_to_iana, ignore_unknown, ignore_unknown_vec},
    webauthn::{
        AuthenticationExtensionsClientInputs, AuthenticatorAttachment, AuthenticatorTransport,
        PublicKeyCredential, PublicKeyCredentialDescriptor, PublicKeyCredentialType,
        UserVerificationRequirement,
    },
    Bytes,
};

#[cfg(doc)]
use crate::{
    authenticator::{AttestedCredentialData, AuthenticatorData},
    webauthn::AuthenticatorAssertionResponse,
};

/// The response to the successful creation of a PublicKeyCredential
pub type CreatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAttestationResponse>;

/// This defines the request for creating a [`PublicKeyCredential`].
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    /// A name and an identifier for the [Relying Party] responsible for the request.
    ///
    /// [Relying Party]: https://w3c.github.io/webauthn/#relying-party
    pub rp: PublicKeyCredentialRpEntity,

    /// Names and an identifier for the user account performing the registration.
    ///
    /// The value's [`PublicKeyCredentialUserEntity::id`] can be returned as the
    /// [`AuthenticatorAssertionResponse::user_handle`] in future authentication ceremonies.
    pub user: PublicKeyCredentialUserEntity,

    /// A challenge that the authenticator signs, along with other data, when producing an
    /// [`AttestedCredentialData`] for the newly created credential.
    pub challenge: Bytes,

    /// The key types and signature algorithms the Relying Party supports, ordered from most
    /// preferred to least preferred. Entries with an algorithm unknown to this crate are dropped.
    #[serde(deserialize_with = "ignore_unknown_vec")]
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// A time, in milliseconds, that the Relying Party is willing to wait for the call to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// Credentials the user already registered, so the browser does not create a second
    /// credential on the same authenticator.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "ignore_unknown_vec"
    )]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// Requirements regarding authenticator attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,

    /// Preference regarding attestation conveyance. Only [`AttestationConveyancePreference::None`]
    /// is ever verified by this crate.
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub attestation: AttestationConveyancePreference,

    /// Client extension inputs, such as `credProps`.
    #[serde(default, skip_serializing_if = "AuthenticationExtensionsClientInputs::is_empty")]
    pub extensions: AuthenticationExtensionsClientInputs,
}

impl PublicKeyCredentialCreationOptions {
    /// The user verification requirement, [`UserVerificationRequirement::Discouraged`] when no
    /// selection criteria were given.
    pub fn user_verification(&self) -> UserVerificationRequirement {
        self.authenticator_selection
            .as_ref()
            .map(|criteria| criteria.user_verification)
            .unwrap_or_default()
    }

    /// Whether `alg` is one of the requested [`Self::pub_key_cred_params`].
    pub fn accepts_algorithm(&self, alg: iana::Algorithm) -> bool {
        self.pub_key_cred_params
            .iter()
            .any(|param| param.ty == PublicKeyCredentialType::PublicKey && param.alg == alg)
    }
}

/// This type is used to supply additional Relying Party attributes when creating a new credential.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrpentity>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialRpEntity {
    /// A unique identifier for the [Relying Party] entity, which sets the [RP ID].
    ///
    /// If omitted, its value will be the requesting origin's effective domain.
    ///
    /// [Relying Party]: https://w3c.github.io/webauthn/#relying-party
    /// [RP ID]: https://w3c.github.io/webauthn/#rp-id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// A human palatable identifier for the Relying Party, intended only for display.
    pub name: String,

    /// A URL to an icon for the Relying Party. Removed from Level 2 of the standard but still
    /// honored by some browsers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Describes a user account during registration.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialuserentity>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    /// The user handle of the user account. A user handle is an opaque byte sequence with a
    /// maximum size of 64 bytes, and is not meant to be displayed to the user.
    pub id: Bytes,

    /// A human-palatable identifier for the user account, such as a username.
    pub name: String,

    /// A human-palatable name for the user account, intended only for display.
    pub display_name: String,
}

/// This type is used to supply additional parameters when creating a new credential.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialparameters>
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyCredentialParameters {
    /// The type of credential to be created.
    #[serde(rename = "type", deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The cryptographic signature algorithm with which the newly generated credential will be
    /// used.
    #[serde(with = "i64_to_iana")]
    pub alg: iana::Algorithm,
}

impl PublicKeyCredentialParameters {
    /// Parameters for a public key credential of algorithm `alg`.
    pub fn public_key(alg: iana::Algorithm) -> Self {
        Self {
            ty: PublicKeyCredentialType::PublicKey,
            alg,
        }
    }

    /// The algorithms whose signatures can be verified:
    /// * [`iana::Algorithm::ES256`]
    /// * [`iana::Algorithm::ES384`]
    /// * [`iana::Algorithm::RS256`]
    /// * [`iana::Algorithm::EdDSA`]
    pub fn default_algorithms() -> Vec<Self> {
        vec![
            Self::public_key(iana::Algorithm::ES256),
            Self::public_key(iana::Algorithm::ES384),
            Self::public_key(iana::Algorithm::RS256),
            Self::public_key(iana::Algorithm::EdDSA),
        ]
    }
}

/// [Relying Parties] may use this type to specify their requirements regarding authenticator attributes.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria>
///
/// [Relying Parties]: https://w3c.github.io/webauthn/#webauthn-relying-party
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// Restricts eligible authenticators to the given attachment modality.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown",
        default
    )]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    /// The extent to which the Relying Party desires a client-side discoverable credential.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown",
        default
    )]
    pub resident_key: Option<ResidentKeyRequirement>,

    /// Retained for backwards compatibility with WebAuthn Level 1. `true` if and only if
    /// [`Self::resident_key`] is [`ResidentKeyRequirement::Required`].
    #[serde(default)]
    pub require_resident_key: bool,

    /// The Relying Party's requirements regarding user verification for the `create()` operation.
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub user_verification: UserVerificationRequirement,
}

/// The extent to which a Relying Party desires to create a client-side discoverable credential.
///
/// <https://w3c.github.io/webauthn/#enumdef-residentkeyrequirement>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    /// A server-side credential is preferable.
    Discouraged,
    /// A client-side discoverable credential is preferable.
    Preferred,
    /// A client-side discoverable credential is required.
    Required,
}

/// Relying Parties may use this to specify their preference regarding attestation conveyance
/// during credential generation.
///
/// <https://w3c.github.io/webauthn/#enumdef-attestationconveyancepreference>
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// The Relying Party is not interested in authenticator attestation.
    #[default]
    None,
    /// The Relying Party wants to receive a verifiable attestation statement, possibly anonymized.
    Indirect,
    /// The Relying Party wants to receive the attestation statement as generated by the authenticator.
    Direct,
    /// The Relying Party wants to receive an attestation statement that may uniquely identify the
    /// authenticator.
    Enterprise,
}

/// The authenticator's response to a client's request for the creation of a new
/// [`PublicKeyCredential`].
///
/// Only `clientDataJSON` and `attestationObject` are required: the other members are convenience
/// copies that older browsers do not send.
///
/// <https://w3c.github.io/webauthn/#iface-authenticatorattestationresponse>
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponse {
    /// The JSON serialization of [`CollectedClientData`] the attestation was computed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// Copy of the [`AuthenticatorData`] contained within the attestation object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_data: Option<Bytes>,

    /// The DER SubjectPublicKeyInfo of the new credential, when the browser provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Bytes>,

    /// The COSE algorithm identifier of the new credential, when the browser provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_algorithm: Option<i64>,

    /// The CBOR attestation object holding the format, the attestation statement and the
    /// [`AuthenticatorData`] with the new credential's public key.
    pub attestation_object: Bytes,

    /// The transports the authenticator is believed to support, in lexicographical order.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "ignore_unknown_vec"
    )]
    pub transports: Vec<AuthenticatorTransport>,
}

/// The client data represents the contextual bindings of both the Relying Party and the client.
///
/// > Note: The [`CollectedClientData`] may be extended in the future. Therefore it's critical when
/// >       parsing to be tolerant of unknown keys and of any reordering of the keys
///
/// `type`, `challenge`, `origin`, `crossOrigin` are serialized first and in that order; any other
/// key keeps the position it had when parsed, hence the use of [`IndexMap`].
///
/// <https://w3c.github.io/webauthn/#dictionary-client-data>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedClientData {
    /// [`ClientDataType::Create`] when creating new credentials, and [`ClientDataType::Get`] when
    /// getting an assertion. `None` when the value is missing or not one this crate knows.
    #[serde(rename = "type", default, deserialize_with = "ignore_unknown")]
    pub ty: Option<ClientDataType>,

    /// The base64url encoding of the challenge provided by the Relying Party.
    pub challenge: String,

    /// The fully qualified origin of the requester, in the syntax defined by [RFC6454].
    ///
    /// [RFC6454]: https://www.rfc-editor.org/rfc/rfc6454
    pub origin: String,

    /// Whether the credential was requested from a cross-origin iframe.
    #[serde(default, serialize_with = "truthiness")]
    pub cross_origin: Option<bool>,

    /// Keys unknown to this crate, in their original order.
    #[serde(flatten)]
    pub unknown_keys: IndexMap<String, serde_json::value::Value>,
}

fn truthiness<S>(cross_origin: &Option<bool>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.serialize_bool(cross_origin.filter(|b| *b).is_some())
}

/// Used to limit the values of [`CollectedClientData::ty`] and serializes to static strings.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Serializes to the string `"webauthn.create"`
    #[serde(rename = "webauthn.create")]
    Create,

    /// Serializes to the string `"webauthn.get"`
    #[serde(rename = "webauthn.get")]
    Get,
}

impl ClientDataType {
    /// The wire name of the ceremony type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        }
    }
}

impl fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;
