use coset::iana;

use crate::webauthn::{
    AuthenticatorTransport, ClientDataType, CollectedClientData, CreatedPublicKeyCredential,
    PublicKeyCredentialCreationOptions, UserVerificationRequirement,
};

// Normal client data from Chrome assertion
const CLIENT_DATA_JSON_STRING: &str = r#"{
        "type":"webauthn.get",
        "challenge":"ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg",
        "origin":"http://localhost:4000",
        "crossOrigin":false
    }"#;

const EXTENDED_ANDROID_CLIENT_DATA_JSON_STRING: &str = r#"{
        "type": "webauthn.get",
        "challenge": "ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg",
        "origin": "http://localhost:4000",
        "crossOrigin": false,
        "androidPackageName": "com.android.chrome",
        "other_keys_can_be_added_here": "do not compare clientDataJSON against a template. See https://goo.gl/yabPex"
    }"#;

#[test]
fn unknown_algorithms_in_options_are_skipped() {
    let json = r#"{
            "challenge": "TXN2VEtyTC1Yd2R5dHZuWFdtQU1iZHhNQ3dGZ3BGYnpTUW5K",
            "rp": { "id": "example.com", "name": "Example" },
            "user": { "id": "MnFlcGFkZzJ0cmE", "name": "R L", "displayName": "R L" },
            "pubKeyCredParams": [
                { "type": "public-key", "alg": -7 },
                { "type": "public-key", "alg": -35 },
                { "type": "public-key", "alg": -257 },
                { "type": "public-key", "alg": -37 },
                { "type": "public-key", "alg": -1 }
            ],
            "authenticatorSelection": {
                "authenticatorAttachment": "platform",
                "requireResidentKey": false,
                "userVerification": "preferred"
            },
            "timeout": 60000,
            "attestation": "direct"
        }"#;

    let options: PublicKeyCredentialCreationOptions =
        serde_json::from_str(json).expect("failed to deserialize options");
    // `alg: -1` is not a signature algorithm
    assert_eq!(options.pub_key_cred_params.len(), 4);
    assert!(options.accepts_algorithm(iana::Algorithm::ES256));
    assert!(options.accepts_algorithm(iana::Algorithm::RS256));
    assert!(!options.accepts_algorithm(iana::Algorithm::EdDSA));
    assert_eq!(
        options.user_verification(),
        UserVerificationRequirement::Preferred
    );
}

#[test]
fn missing_selection_means_discouraged_verification() {
    let json = r#"{
          "rp": { "name": "Webauthn Application" },
          "user": { "id": "AQID", "name": "alice", "displayName": "Alice" },
          "challenge": "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8",
          "pubKeyCredParams": [{ "type": "public-key", "alg": -8 }]
        }"#;

    let options: PublicKeyCredentialCreationOptions =
        serde_json::from_str(json).expect("failed to deserialize minimal options");
    assert_eq!(
        options.user_verification(),
        UserVerificationRequirement::Discouraged
    );
    assert!(options.accepts_algorithm(iana::Algorithm::EdDSA));
    assert!(options.exclude_credentials.is_empty());
    assert_eq!(options.rp.id, None);
}

#[test]
fn creation_options_survive_a_session_round_trip() {
    let json = r#"{
          "rp": { "id": "example.com", "name": "Example", "icon": "https://example.com/i.png" },
          "user": { "id": "AQID", "name": "alice", "displayName": "Alice" },
          "challenge": "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8",
          "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }],
          "timeout": 60000,
          "excludeCredentials": [{ "type": "public-key", "id": "BAUG", "transports": ["usb"] }]
        }"#;

    let options: PublicKeyCredentialCreationOptions =
        serde_json::from_str(json).expect("failed to deserialize options");
    let stored = serde_json::to_string(&options).expect("failed to serialize options");
    let restored: PublicKeyCredentialCreationOptions =
        serde_json::from_str(&stored).expect("failed to deserialize stored options");

    assert_eq!(options, restored);
    assert_eq!(
        restored.exclude_credentials[0].transports,
        vec![AuthenticatorTransport::Usb]
    );
}

#[test]
fn attestation_response_without_optional_members() {
    let json = r#"{
          "id": "BAUG",
          "rawId": "BAUG",
          "type": "public-key",
          "response": {
            "clientDataJSON": "e30",
            "attestationObject": "oA",
            "transports": ["usb", "smoke-signal"]
          }
        }"#;

    let credential: CreatedPublicKeyCredential =
        serde_json::from_str(json).expect("failed to deserialize minimal attestation response");
    assert_eq!(credential.raw_id.as_slice(), &[4, 5, 6]);
    assert!(credential.response.authenticator_data.is_none());
    assert!(credential.response.public_key_algorithm.is_none());
    assert_eq!(credential.response.transports, vec![AuthenticatorTransport::Usb]);
    assert!(!credential.client_extension_results.used_appid());
}

#[test]
fn test_client_data_type_to_string() {
    assert_eq!(ClientDataType::Create.to_string(), "webauthn.create");
    assert_eq!(ClientDataType::Get.to_string(), "webauthn.get");
}

#[test]
fn unknown_client_data_type_is_none() {
    let json = r#"{"type":"payment.get","challenge":"AA","origin":"https://example.com"}"#;
    let ccd: CollectedClientData = serde_json::from_str(json).expect("failed to parse");
    assert_eq!(ccd.ty, None);

    let json = r#"{"challenge":"AA","origin":"https://example.com"}"#;
    let ccd: CollectedClientData = serde_json::from_str(json).expect("failed to parse");
    assert_eq!(ccd.ty, None);
}

#[test]
fn test_client_data_serialization() {
    // This is the raw client data json byte buffer returned by a webauthn assertion
    let expected_client_data_bytes = r#"{"type":"webauthn.get","challenge":"ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg","origin":"http://localhost:4000","crossOrigin":false}"#.as_bytes();

    let actual_collected_client_data: CollectedClientData =
        serde_json::from_str(CLIENT_DATA_JSON_STRING).unwrap();

    let actual_client_data_bytes = serde_json::to_vec(&actual_collected_client_data).unwrap();
    assert_eq!(
        actual_client_data_bytes.as_slice(),
        expected_client_data_bytes
    )
}

#[test]
fn test_client_data_serialization_with_unknown_data() {
    // This is the raw client data json byte buffer returned by an Android webauthn assertion
    let expected_client_data_bytes = r#"{"type":"webauthn.get","challenge":"ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg","origin":"http://localhost:4000","crossOrigin":false,"androidPackageName":"com.android.chrome","other_keys_can_be_added_here":"do not compare clientDataJSON against a template. See https://goo.gl/yabPex"}"#.as_bytes();

    let actual_collected_client_data: CollectedClientData =
        serde_json::from_str(EXTENDED_ANDROID_CLIENT_DATA_JSON_STRING).unwrap();
    assert_eq!(actual_collected_client_data.unknown_keys.len(), 2);

    let actual_client_data_bytes = serde_json::to_vec(&actual_collected_client_data).unwrap();
    assert_eq!(
        actual_client_data_bytes.as_slice(),
        expected_client_data_bytes
    )
}

#[test]
fn test_client_data_cross_origin_serialization() {
    let mut ccd: CollectedClientData = serde_json::from_str(CLIENT_DATA_JSON_STRING).unwrap();

    const CROSS_ORIGIN_TRUE: &str = r#"{"type":"webauthn.get","challenge":"ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg","origin":"http://localhost:4000","crossOrigin":true}"#;
    ccd.cross_origin = Some(true);
    let client_data_json = serde_json::to_string(&ccd).unwrap();
    assert_eq!(client_data_json, CROSS_ORIGIN_TRUE);

    const CROSS_ORIGIN_FALSE: &str = r#"{"type":"webauthn.get","challenge":"ZEvMflZDcwQJmarInnYi88px-6HZcv2Uoxw7-_JOOTg","origin":"http://localhost:4000","crossOrigin":false}"#;
    ccd.cross_origin = None;
    let client_data_json = serde_json::to_string(&ccd).unwrap();
    assert_eq!(client_data_json, CROSS_ORIGIN_FALSE);
}
