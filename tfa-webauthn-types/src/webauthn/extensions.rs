use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::webauthn::PublicKeyCredential;

/// This is a dictionary containing the client extension input values the relying party requests.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticationextensionsclientinputs>
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsClientInputs {
    /// The FIDO AppID extension. When set during authentication, the browser may let an
    /// authenticator registered through the legacy U2F API answer the challenge; such an
    /// authenticator hashes this AppID instead of the RP ID.
    ///
    /// <https://w3c.github.io/webauthn/#sctn-appid-extension>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<String>,

    /// Boolean to indicate that the credential properties extension is requested.
    ///
    /// See [`CredentialPropertiesOutput`] for more information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_props: Option<bool>,
}

impl AuthenticationExtensionsClientInputs {
    /// Whether no extension is requested at all.
    pub fn is_empty(&self) -> bool {
        self.appid.is_none() && self.cred_props.is_none()
    }
}

/// This is a dictionary containing the client extension output values.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticationextensionsclientoutputs>
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsClientOutputs {
    /// `true` when the browser used the requested AppID instead of the RP ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<bool>,

    /// Contains properties of the given [`PublicKeyCredential`] when it is included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_props: Option<CredentialPropertiesOutput>,
}

impl AuthenticationExtensionsClientOutputs {
    /// Whether the client reported that the AppID was used.
    pub fn used_appid(&self) -> bool {
        self.appid == Some(true)
    }
}

/// Credential properties reported by the client upon creation of a [`PublicKeyCredential`].
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-credential-properties-extension>
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPropertiesOutput {
    /// Whether the credential is a client-side discoverable credential, when known.
    #[serde(rename = "rk", default, skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
}
