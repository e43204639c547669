use tfa_webauthn_rp::{
    testing::SoftwareAuthenticator, MemorySession, MemoryStore, StoreError,
};
use tfa_webauthn_types::webauthn::{PublicKeyCredentialUserEntity, UserVerificationRequirement};

use super::*;
use crate::MockTwoFactorUser;

const ORIGIN: &str = "https://example.com";

fn config() -> WebauthnConfig {
    WebauthnConfig {
        enabled: true,
        rp_id: Some("example.com".to_owned()),
        rp_name: "Example".to_owned(),
        ..Default::default()
    }
}

fn request() -> RequestContext {
    RequestContext::new("https", "example.com", Some(443))
}

fn user(handle: &'static [u8]) -> MockTwoFactorUser {
    let mut user = MockTwoFactorUser::new();
    user.expect_user_entity()
        .returning(move || PublicKeyCredentialUserEntity {
            id: handle.into(),
            name: "alice".to_owned(),
            display_name: "Alice".to_owned(),
        });
    user.expect_legacy_keys().returning(Vec::new);
    user
}

async fn register(
    helper: &RegistrationHelper<MemoryStore>,
    authenticator: &SoftwareAuthenticator,
    session: &MemorySession,
) -> Result<CredentialSource, Error> {
    let alice = user(b"alice");
    let options = helper
        .generate_registration_request(&alice, &request(), session)
        .await
        .expect("registration request generated");
    let response = authenticator
        .register(&options)
        .expect("could not create credential");
    let response = serde_json::to_string(&response).expect("could not serialize response");
    helper
        .check_registration_response(&alice, &response, &request(), session)
        .await
}

#[tokio::test]
async fn request_options_describe_the_registration() {
    let store = MemoryStore::new();
    let existing = SoftwareAuthenticator::es256(ORIGIN)
        .credential_source(b"alice")
        .expect("valid source");
    store.save(existing.clone()).await.expect("could not save");
    let helper = RegistrationHelper::new(config(), store).expect("valid config");
    let session = MemorySession::default();

    let json = helper
        .generate_registration_request_json(&user(b"alice"), &request(), &session)
        .await
        .expect("registration request generated");
    let options: PublicKeyCredentialCreationOptions =
        serde_json::from_str(&json).expect("options round trip");

    assert_eq!(options.rp.id.as_deref(), Some("example.com"));
    assert_eq!(options.rp.name, "Example");
    assert_eq!(options.user.id.as_slice(), b"alice");
    assert_eq!(options.challenge.len(), 32);
    assert_eq!(options.exclude_credentials, vec![existing.descriptor()]);
    assert_eq!(options.attestation, AttestationConveyancePreference::None);
    assert_eq!(
        options.user_verification(),
        UserVerificationRequirement::Discouraged
    );
    assert_eq!(options.pub_key_cred_params.len(), 4);
    assert!(options.accepts_algorithm(coset::iana::Algorithm::RS256));

    let stored = CeremonyState::new(&session, config().ceremony_ttl())
        .take::<PublicKeyCredentialCreationOptions>(CeremonyKind::Registration);
    assert_eq!(stored, Some(options));
}

#[tokio::test]
async fn registered_key_is_saved_once() {
    let helper = RegistrationHelper::new(config(), MemoryStore::new()).expect("valid config");
    let session = MemorySession::default();
    let authenticator = SoftwareAuthenticator::es256(ORIGIN);

    let source = register(&helper, &authenticator, &session)
        .await
        .expect("registration accepted");
    assert_eq!(source.credential_id.as_slice(), authenticator.credential_id());
    assert_eq!(source.user_handle.as_slice(), b"alice");

    let saved = helper
        .store
        .find_by_credential_id(authenticator.credential_id())
        .await
        .expect("store is available");
    assert_eq!(saved, Some(source));

    assert_eq!(
        register(&helper, &authenticator, &session).await,
        Err(Error::Failed(RpError::Store(StoreError::Duplicate)))
    );
}

#[tokio::test]
async fn response_without_active_registration_is_rejected() {
    let helper = RegistrationHelper::new(config(), MemoryStore::new()).expect("valid config");
    let session = MemorySession::default();

    assert_eq!(
        helper
            .check_registration_response(&user(b"alice"), "{}", &request(), &session)
            .await,
        Err(Error::Rejected(CeremonyError::NoActiveChallenge))
    );
}

#[tokio::test]
async fn registration_belongs_to_the_requesting_user() {
    let helper = RegistrationHelper::new(config(), MemoryStore::new()).expect("valid config");
    let session = MemorySession::default();
    let options = helper
        .generate_registration_request(&user(b"alice"), &request(), &session)
        .await
        .expect("registration request generated");
    let response = SoftwareAuthenticator::es256(ORIGIN)
        .register(&options)
        .expect("could not create credential");
    let response = serde_json::to_string(&response).expect("could not serialize response");

    assert_eq!(
        helper
            .check_registration_response(&user(b"mallory"), &response, &request(), &session)
            .await,
        Err(Error::Rejected(CeremonyError::UserHandleMismatch))
    );
}

#[tokio::test]
async fn malformed_response_is_rejected() {
    let helper = RegistrationHelper::new(config(), MemoryStore::new()).expect("valid config");
    let session = MemorySession::default();
    helper
        .generate_registration_request(&user(b"alice"), &request(), &session)
        .await
        .expect("registration request generated");

    assert_eq!(
        helper
            .check_registration_response(&user(b"alice"), "[1, 2]", &request(), &session)
            .await,
        Err(Error::Rejected(CeremonyError::MalformedInput))
    );
}
