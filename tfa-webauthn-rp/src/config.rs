//! Configuration of the relying party, mirroring the options a host sets for the second factor.

use coset::iana;
use serde::{Deserialize, Serialize};
use tfa_webauthn_types::webauthn::{
    PublicKeyCredentialParameters, PublicKeyCredentialRpEntity, UserVerificationRequirement,
};

use crate::RpError;

/// Template rendered by the host for the authentication form.
pub const DEFAULT_TEMPLATE: &str = "@TFAWebauthn/Authentication/form.html.twig";

/// Name of the relying party when none is configured.
pub const DEFAULT_RP_NAME: &str = "Webauthn Application";

/// The relying party's identity, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    /// The RP ID. `None` means the host of the current request.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional icon URL.
    pub icon: Option<String>,
}

impl RelyingParty {
    /// The entity sent in creation options, scoped to `rp_id`.
    pub fn entity(&self, rp_id: &str) -> PublicKeyCredentialRpEntity {
        PublicKeyCredentialRpEntity {
            id: Some(rp_id.to_owned()),
            name: self.name.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Signature algorithms the relying party can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    ES256,
    /// ECDSA over P-384 with SHA-384.
    ES384,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// Ed25519.
    EdDSA,
}

impl SignatureAlgorithm {
    /// The COSE identifier of the algorithm.
    pub fn to_iana(self) -> iana::Algorithm {
        match self {
            SignatureAlgorithm::ES256 => iana::Algorithm::ES256,
            SignatureAlgorithm::ES384 => iana::Algorithm::ES384,
            SignatureAlgorithm::RS256 => iana::Algorithm::RS256,
            SignatureAlgorithm::EdDSA => iana::Algorithm::EdDSA,
        }
    }
}

/// Everything the two-factor provider needs to know, resolved once at construction.
///
/// Every field has a default, so an empty JSON object is a valid (if disabled) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebauthnConfig {
    /// Whether the second factor is offered at all.
    pub enabled: bool,
    /// Client-side timeout hint, in milliseconds.
    pub timeout: u32,
    /// The RP ID, the host of the request when unset.
    pub rp_id: Option<String>,
    /// The RP display name.
    pub rp_name: String,
    /// An optional RP icon URL.
    pub rp_icon: Option<String>,
    /// Template identifier handed to the host's template engine.
    pub template: String,
    /// The legacy U2F AppID, derived from the request when unset.
    #[serde(rename = "u2fAppId")]
    pub u2f_app_id: Option<String>,
    /// User verification requirement of both ceremonies.
    pub user_verification: UserVerificationRequirement,
    /// How long an issued request stays valid server-side, in milliseconds.
    pub ceremony_ttl: u32,
    /// Accept `http://localhost` origins. Meant for development only.
    pub allow_insecure_localhost: bool,
    /// Algorithms offered at registration, most preferred first.
    pub algorithms: Vec<SignatureAlgorithm>,
}

impl Default for WebauthnConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: 60_000,
            rp_id: None,
            rp_name: DEFAULT_RP_NAME.to_owned(),
            rp_icon: None,
            template: DEFAULT_TEMPLATE.to_owned(),
            u2f_app_id: None,
            user_verification: UserVerificationRequirement::Discouraged,
            ceremony_ttl: 300_000,
            allow_insecure_localhost: false,
            algorithms: vec![
                SignatureAlgorithm::ES256,
                SignatureAlgorithm::ES384,
                SignatureAlgorithm::RS256,
                SignatureAlgorithm::EdDSA,
            ],
        }
    }
}

impl WebauthnConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, RpError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| RpError::InvalidConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no ceremony could succeed with.
    pub fn validate(&self) -> Result<(), RpError> {
        if self.timeout == 0 {
            return Err(RpError::InvalidConfiguration("timeout must be positive".into()));
        }
        if self.ceremony_ttl == 0 {
            return Err(RpError::InvalidConfiguration(
                "ceremonyTtl must be positive".into(),
            ));
        }
        if self.rp_name.trim().is_empty() {
            return Err(RpError::InvalidConfiguration("rpName must not be empty".into()));
        }
        if self.algorithms.is_empty() {
            return Err(RpError::InvalidConfiguration(
                "at least one algorithm is required".into(),
            ));
        }
        if let Some(rp_id) = &self.rp_id {
            if rp_id.is_empty() || rp_id.contains(['/', ':']) {
                return Err(RpError::InvalidConfiguration(format!(
                    "rpId {rp_id:?} must be a bare domain"
                )));
            }
        }
        Ok(())
    }

    /// The relying party identity.
    pub fn relying_party(&self) -> RelyingParty {
        RelyingParty {
            id: self.rp_id.clone(),
            name: self.rp_name.clone(),
            icon: self.rp_icon.clone(),
        }
    }

    /// The `pubKeyCredParams` offered at registration.
    pub fn credential_parameters(&self) -> Vec<PublicKeyCredentialParameters> {
        self.algorithms
            .iter()
            .map(|alg| PublicKeyCredentialParameters::public_key(alg.to_iana()))
            .collect()
    }

    /// The server-side lifetime of an issued request.
    pub fn ceremony_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::from(self.ceremony_ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = WebauthnConfig::from_json("{}").expect("defaults are valid");
        assert_eq!(config, WebauthnConfig::default());
        assert!(!config.enabled);
        assert_eq!(config.timeout, 60_000);
        assert_eq!(config.rp_name, "Webauthn Application");
        assert_eq!(config.template, "@TFAWebauthn/Authentication/form.html.twig");
        assert_eq!(
            config.user_verification,
            UserVerificationRequirement::Discouraged
        );
        assert_eq!(config.ceremony_ttl(), chrono::Duration::minutes(5));
        assert_eq!(
            config
                .credential_parameters()
                .iter()
                .map(|param| param.alg)
                .collect::<Vec<_>>(),
            [
                iana::Algorithm::ES256,
                iana::Algorithm::ES384,
                iana::Algorithm::RS256,
                iana::Algorithm::EdDSA,
            ]
        );
    }

    #[test]
    fn every_offered_algorithm_can_be_verified() {
        for alg in WebauthnConfig::default().algorithms {
            assert!(
                crate::cose::supported_algorithm(alg.to_iana()),
                "{alg:?} is offered but not verified"
            );
        }
    }

    #[test]
    fn camel_case_keys_are_read() {
        let config = WebauthnConfig::from_json(
            r#"{
                "enabled": true,
                "timeout": 30000,
                "rpId": "example.com",
                "rpName": "Example",
                "rpIcon": "https://example.com/icon.png",
                "u2fAppId": "https://example.com",
                "userVerification": "required",
                "allowInsecureLocalhost": true,
                "algorithms": ["EdDSA"]
            }"#,
        )
        .expect("valid configuration");

        assert!(config.enabled);
        assert_eq!(config.rp_id.as_deref(), Some("example.com"));
        assert_eq!(config.u2f_app_id.as_deref(), Some("https://example.com"));
        assert!(config.user_verification.is_required());
        assert_eq!(
            config.credential_parameters(),
            vec![PublicKeyCredentialParameters::public_key(
                iana::Algorithm::EdDSA
            )]
        );
        assert_eq!(
            config.relying_party().entity("example.com").icon.as_deref(),
            Some("https://example.com/icon.png")
        );
    }

    #[test]
    fn unusable_configurations_are_rejected() {
        for json in [
            r#"{"timeout": 0}"#,
            r#"{"ceremonyTtl": 0}"#,
            r#"{"rpName": "  "}"#,
            r#"{"algorithms": []}"#,
            r#"{"rpId": "https://example.com"}"#,
            r#"{"algorithms": ["PS256"]}"#,
            r#"{"timeout": "soon"}"#,
        ] {
            assert!(
                matches!(
                    WebauthnConfig::from_json(json),
                    Err(RpError::InvalidConfiguration(_))
                ),
                "accepted {json}"
            );
        }
    }
}
