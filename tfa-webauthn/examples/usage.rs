//! Sample app adding a security key to an account, then logging in with it.
use std::sync::Arc;

use tfa_webauthn::{
    rp::{
        testing::SoftwareAuthenticator, MemorySession, MemoryStore, RequestContext, WebauthnConfig,
    },
    types::webauthn::{PublicKeyCredentialRequestOptions, PublicKeyCredentialUserEntity},
    Error, LegacyU2fKey, RegistrationHelper, TwoFactorProvider, TwoFactorUser,
};
use url::Url;

// An account of the host application.
struct Account {
    id: Vec<u8>,
    email: String,
}

impl TwoFactorUser for Account {
    fn is_second_factor_enabled(&self) -> bool {
        true
    }

    // Accounts created before the switch to WebAuthn would list their U2F keys here.
    fn legacy_keys(&self) -> Vec<LegacyU2fKey> {
        Vec::new()
    }

    fn user_entity(&self) -> PublicKeyCredentialUserEntity {
        PublicKeyCredentialUserEntity {
            id: self.id.clone().into(),
            name: self.email.clone(),
            display_name: self.email.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = WebauthnConfig::from_json(
        r#"{
            "enabled": true,
            "rpId": "example.com",
            "rpName": "Example",
            "timeout": 60000
        }"#,
    )?;
    let store = Arc::new(MemoryStore::new());
    let helper = RegistrationHelper::new(config.clone(), Arc::clone(&store))?;
    let provider = TwoFactorProvider::new(config, store)?;

    let account = Account {
        id: b"account-42".to_vec(),
        email: "alice@example.com".to_owned(),
    };
    // one session per browser, one request context per HTTP request
    let session = MemorySession::default();
    let url = Url::parse("https://example.com/2fa").expect("valid url");
    let request = RequestContext::from_url(&url).expect("url has a host");

    // stands in for the browser and the security key
    let mut security_key = SoftwareAuthenticator::es256("https://example.com");

    // Registration: options go to the browser as JSON, the answer comes back as JSON.
    let options = helper
        .generate_registration_request(&account, &request, &session)
        .await?;
    let created = security_key.register(&options)?;
    let created_json = serde_json::to_string(&created).map_err(|e| Error::Failed(e.into()))?;
    let credential = helper
        .check_registration_response(&account, &created_json, &request, &session)
        .await?;
    println!("registered key, signature counter {}", credential.sign_count);

    // Login, after the password was checked.
    if provider.begin_authentication(&account) {
        provider.prepare_authentication(&account);
        let form = provider
            .render_form(&account, &request, &session, Default::default())
            .await?;
        println!("render {} with {:?}", form.template, form.template_vars);

        let request_data = form.template_vars[tfa_webauthn::REQUEST_DATA_VAR]
            .as_str()
            .unwrap_or_default();
        let options: PublicKeyCredentialRequestOptions =
            serde_json::from_str(request_data).map_err(|e| Error::Failed(e.into()))?;
        let assertion = security_key.assert(&options, None)?;
        let code = serde_json::to_string(&assertion).map_err(|e| Error::Failed(e.into()))?;

        let verified = provider
            .validate_authentication_code(&account, &code, &request, &session)
            .await?;
        println!("second factor verified: {verified}");

        // the challenge is spent
        let replayed = provider
            .validate_authentication_code(&account, &code, &request, &session)
            .await?;
        println!("replay verified: {replayed}");
    }

    Ok(())
}
