use std::sync::Arc;

use chrono::{Duration, Utc};
use tfa_webauthn::{
    rp::{
        testing::{AppIdUse, SoftwareAuthenticator},
        AssertionValidator, CeremonyError, CeremonyKind, CredentialStore, MemorySession,
        MemoryStore, RequestContext, RpError, RpIdVerifier, SessionStore, StoredCeremony,
        WebauthnConfig,
    },
    types::{
        encoding,
        webauthn::{PublicKeyCredentialRequestOptions, PublicKeyCredentialUserEntity},
        CredentialSource,
    },
    LegacyU2fKey, RegistrationHelper, TwoFactorProvider, TwoFactorUser,
};

const ORIGIN: &str = "https://example.com";

struct User {
    handle: Vec<u8>,
    legacy_keys: Vec<LegacyU2fKey>,
}

impl User {
    fn new() -> Self {
        Self {
            handle: b"alice-handle".to_vec(),
            legacy_keys: Vec::new(),
        }
    }
}

impl TwoFactorUser for User {
    fn is_second_factor_enabled(&self) -> bool {
        true
    }

    fn legacy_keys(&self) -> Vec<LegacyU2fKey> {
        self.legacy_keys.clone()
    }

    fn user_entity(&self) -> PublicKeyCredentialUserEntity {
        PublicKeyCredentialUserEntity {
            id: self.handle.clone().into(),
            name: "alice".to_owned(),
            display_name: "Alice".to_owned(),
        }
    }
}

fn config() -> WebauthnConfig {
    WebauthnConfig {
        enabled: true,
        rp_id: Some("example.com".to_owned()),
        ..Default::default()
    }
}

fn request() -> RequestContext {
    RequestContext::new("https", "example.com", Some(443))
}

async fn provider_with(
    sources: Vec<CredentialSource>,
) -> TwoFactorProvider<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    for source in sources {
        store.save(source).await.expect("could not save credential");
    }
    TwoFactorProvider::new(config(), store).expect("valid config")
}

/// The browser side: parse the options from JSON and let the key sign them.
fn answer(authenticator: &mut SoftwareAuthenticator, options_json: &str) -> String {
    let options: PublicKeyCredentialRequestOptions =
        serde_json::from_str(options_json).expect("options are valid JSON");
    let response = authenticator
        .assert(&options, None)
        .expect("could not sign assertion");
    serde_json::to_string(&response).expect("could not serialize response")
}

/// Issue a challenge, answer it with `authenticator` and validate the answer.
async fn authenticate(
    provider: &TwoFactorProvider<Arc<MemoryStore>>,
    user: &User,
    session: &MemorySession,
    authenticator: &mut SoftwareAuthenticator,
) -> Result<bool, RpError> {
    let options = provider
        .issue_challenge(user, &request(), session)
        .await
        .expect("challenge issued");
    let code = answer(
        authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );
    provider
        .validate_authentication_code(user, &code, &request(), session)
        .await
}

async fn stored_count(provider: &TwoFactorProvider<Arc<MemoryStore>>, id: &[u8]) -> u32 {
    provider
        .store()
        .find_by_credential_id(id)
        .await
        .expect("store is available")
        .expect("credential is stored")
        .sign_count
}

#[tokio::test]
async fn round_trip_updates_the_counter() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::es256(ORIGIN);
    let source = authenticator
        .credential_source(&user.handle)
        .expect("valid source");
    let provider = provider_with(vec![source.clone()]).await;
    let session = MemorySession::default();

    assert!(provider.begin_authentication(&user));
    let options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    let options_json = serde_json::to_string(&options).expect("options serialize");

    let code = answer(&mut authenticator, &options_json);
    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(true)
    );
    assert_eq!(
        stored_count(&provider, &source.credential_id).await,
        authenticator.counter
    );
    assert!(authenticator.counter > source.sign_count);
}

#[tokio::test]
async fn a_response_is_accepted_exactly_once() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::eddsa(ORIGIN);
    let provider =
        provider_with(vec![authenticator.credential_source(&user.handle).expect("valid source")])
            .await;
    let session = MemorySession::default();

    let options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    let code = answer(
        &mut authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );

    let first = provider
        .validate_authentication_code(&user, &code, &request(), &session)
        .await;
    let replay = provider
        .validate_authentication_code(&user, &code, &request(), &session)
        .await;
    assert_eq!((first, replay), (Ok(true), Ok(false)));
}

#[tokio::test]
async fn response_to_a_different_challenge_is_rejected() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::es256(ORIGIN);
    let provider =
        provider_with(vec![authenticator.credential_source(&user.handle).expect("valid source")])
            .await;
    let session = MemorySession::default();

    let mut options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    let last = options.challenge.len() - 1;
    options.challenge[last] ^= 0x01;
    let code = answer(
        &mut authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );

    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(false)
    );
}

#[tokio::test]
async fn counter_regression_is_rejected_despite_a_valid_signature() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::es256(ORIGIN);
    let mut source = authenticator
        .credential_source(&user.handle)
        .expect("valid source");
    source.sign_count = 10;
    let provider = provider_with(vec![source.clone()]).await;
    let session = MemorySession::default();

    authenticator.counter = 5;
    let options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    let code = answer(
        &mut authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );

    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(false)
    );
    assert_eq!(stored_count(&provider, &source.credential_id).await, 10);
}

#[tokio::test]
async fn legacy_and_native_keys_are_both_allowed() {
    let mut user = User::new();
    let (_, public_key) = SoftwareAuthenticator::es256(ORIGIN)
        .legacy_u2f_registration()
        .expect("ES256 keys existed under U2F");
    user.legacy_keys.push(LegacyU2fKey {
        key_handle: "AAEC".to_owned(),
        public_key,
        certificate: String::new(),
        counter: 0,
    });
    let native = SoftwareAuthenticator::es256(ORIGIN)
        .credential_source(&user.handle)
        .expect("valid source");
    let provider = provider_with(vec![native.clone()]).await;

    let options = provider
        .issue_challenge(&user, &request(), &MemorySession::default())
        .await
        .expect("challenge issued");

    assert_eq!(options.allow_credentials.len(), 2);
    let legacy_id = encoding::try_from_base64("AAEC").expect("valid base64");
    assert_eq!(options.allow_credentials[0].id.as_slice(), legacy_id.as_slice());
    assert_eq!(options.allow_credentials[1].id, native.credential_id);
    assert_eq!(
        encoding::try_from_websafe_base64("AAEC"),
        encoding::try_from_base64("AAEC")
    );
}

#[tokio::test]
async fn foreign_origin_is_rejected() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::es256("https://evil.com");
    let source = authenticator
        .credential_source(&user.handle)
        .expect("valid source");
    let provider = provider_with(vec![source.clone()]).await;
    let session = MemorySession::default();

    let mut options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    options.extensions.appid = None;
    let response = authenticator
        .assert(&options, None)
        .expect("could not sign assertion");

    assert_eq!(
        AssertionValidator::new(RpIdVerifier::new()).validate(
            &options,
            &response,
            &source,
            "example.com"
        ),
        Err(CeremonyError::OriginMismatch)
    );

    let code = serde_json::to_string(&response).expect("could not serialize response");
    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(false)
    );
}

#[tokio::test]
async fn appid_scoped_legacy_key_needs_the_appid_reported() {
    let mut authenticator = SoftwareAuthenticator::es256(ORIGIN);
    let (key_handle, public_key) = authenticator
        .legacy_u2f_registration()
        .expect("ES256 keys existed under U2F");
    let mut user = User::new();
    user.legacy_keys.push(LegacyU2fKey {
        key_handle,
        public_key,
        certificate: String::new(),
        counter: 0,
    });
    let provider = provider_with(Vec::new()).await;
    let session = MemorySession::default();

    authenticator.appid = AppIdUse::Unreported;
    assert_eq!(
        authenticate(&provider, &user, &session, &mut authenticator).await,
        Ok(false)
    );

    authenticator.appid = AppIdUse::Reported;
    assert_eq!(
        authenticate(&provider, &user, &session, &mut authenticator).await,
        Ok(true)
    );
}

#[tokio::test]
async fn expired_challenge_is_treated_as_absent() {
    let user = User::new();
    let mut authenticator = SoftwareAuthenticator::es256(ORIGIN);
    let provider =
        provider_with(vec![authenticator.credential_source(&user.handle).expect("valid source")])
            .await;
    let session = MemorySession::default();

    let options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    let expired = StoredCeremony {
        options: options.clone(),
        issued_at: Utc::now() - provider.config().ceremony_ttl() - Duration::seconds(1),
    };
    session
        .insert(
            CeremonyKind::Authentication.session_key(),
            serde_json::to_string(&expired).expect("could not serialize request"),
        )
        .expect("session is writable");

    let code = answer(
        &mut authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );
    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(false)
    );
}

async fn enrol_then_sign_in(mut authenticator: SoftwareAuthenticator) {
    let user = User::new();
    let store = Arc::new(MemoryStore::new());
    let helper = RegistrationHelper::new(config(), Arc::clone(&store)).expect("valid config");
    let provider = TwoFactorProvider::new(config(), Arc::clone(&store)).expect("valid config");
    let session = MemorySession::default();

    let creation = helper
        .generate_registration_request(&user, &request(), &session)
        .await
        .expect("registration request generated");
    let created = authenticator
        .register(&creation)
        .expect("could not create credential");
    let source = helper
        .check_registration_response(
            &user,
            &serde_json::to_string(&created).expect("could not serialize response"),
            &request(),
            &session,
        )
        .await
        .expect("registration accepted");

    let options = provider
        .issue_challenge(&user, &request(), &session)
        .await
        .expect("challenge issued");
    assert_eq!(options.allow_credentials, vec![source.descriptor()]);
    let code = answer(
        &mut authenticator,
        &serde_json::to_string(&options).expect("options serialize"),
    );
    assert_eq!(
        provider
            .validate_authentication_code(&user, &code, &request(), &session)
            .await,
        Ok(true)
    );
    assert_eq!(stored_count(&provider, &source.credential_id).await, 2);
}

#[tokio::test]
async fn registered_key_authenticates() {
    enrol_then_sign_in(SoftwareAuthenticator::es256(ORIGIN)).await;
}

#[tokio::test]
async fn tpm_style_rs256_key_can_enrol() {
    enrol_then_sign_in(SoftwareAuthenticator::rs256(ORIGIN).expect("could not generate RSA key"))
        .await;
}
