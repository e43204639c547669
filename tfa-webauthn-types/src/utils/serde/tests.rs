use super::*;
use crate::webauthn::AuthenticatorTransport;

#[derive(Deserialize)]
struct Transports {
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    transports: Vec<AuthenticatorTransport>,
}

#[derive(Deserialize)]
struct Verification {
    #[serde(default, deserialize_with = "ignore_unknown")]
    uv: crate::webauthn::UserVerificationRequirement,
}

#[test]
fn unknown_transports_are_dropped() {
    let json = r#"{"transports": ["usb", "carrier-pigeon", "nfc", 7]}"#;
    let parsed: Transports = serde_json::from_str(json).expect("failed to parse transports");
    assert_eq!(
        parsed.transports,
        vec![AuthenticatorTransport::Usb, AuthenticatorTransport::Nfc]
    );
}

#[test]
fn missing_or_null_transports_are_empty() {
    let parsed: Transports = serde_json::from_str("{}").expect("failed to parse empty object");
    assert!(parsed.transports.is_empty());

    let parsed: Transports =
        serde_json::from_str(r#"{"transports": null}"#).expect("failed to parse null");
    assert!(parsed.transports.is_empty());
}

#[test]
fn unknown_enum_value_falls_back_to_default() {
    let parsed: Verification =
        serde_json::from_str(r#"{"uv": "sometimes"}"#).expect("failed to parse unknown value");
    assert_eq!(parsed.uv, Default::default());
}
