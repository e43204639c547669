use std::fmt;

use serde_json::{Map, Value};
use tfa_webauthn_rp::{
    generate_challenge, AssertionValidator, CeremonyError, CeremonyKind, CeremonyState,
    CredentialStore, RequestContext, RpError, RpIdVerifier, SessionStore, SignCountUpdate,
    StoreError, WebauthnConfig,
};
use tfa_webauthn_types::webauthn::{
    AuthenticatedPublicKeyCredential, AuthenticationExtensionsClientInputs,
    PublicKeyCredentialRequestOptions,
};

use crate::{
    find_key, CollectedKey, Error, FormRenderer, KeyCollector, RenderedForm, TwoFactorUser,
    U2fAppIdProvider,
};


/// Where a login stands in the second factor ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyStatus {
    /// No challenge was issued yet.
    NotStarted,
    /// A challenge was issued and waits for the key's answer.
    ChallengeIssued,
    /// The answer was verified.
    Verified,
    /// The answer was rejected.
    Rejected,
}

impl fmt::Display for CeremonyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            CeremonyStatus::NotStarted => "not started",
            CeremonyStatus::ChallengeIssued => "challenge issued",
            CeremonyStatus::Verified => "verified",
            CeremonyStatus::Rejected => "rejected",
        };
        f.write_str(status)
    }
}

/// The security key second factor, as plugged into the host's authentication flow.
///
/// The host calls [`begin_authentication`](Self::begin_authentication) once the first factor
/// succeeded, shows the form prepared by [`render_form`](Self::render_form) and passes whatever
/// the form posts back to [`validate_authentication_code`](Self::validate_authentication_code).
/// The user and the session are always passed in explicitly.
pub struct TwoFactorProvider<S> {
    config: WebauthnConfig,
    store: S,
    app_id: U2fAppIdProvider,
    form_renderer: FormRenderer,
    validator: AssertionValidator,
}

impl<S: CredentialStore> TwoFactorProvider<S> {
    /// Create a provider authenticating against the credentials in `store`.
    pub fn new(config: WebauthnConfig, store: S) -> Result<Self, RpError> {
        config.validate()?;
        let rp_id_verifier =
            RpIdVerifier::new().allows_insecure_localhost(config.allow_insecure_localhost);
        Ok(Self {
            app_id: U2fAppIdProvider::new(config.u2f_app_id.clone()),
            form_renderer: FormRenderer::new(config.template.clone()),
            validator: AssertionValidator::new(rp_id_verifier),
            config,
            store,
        })
    }

    /// The configuration the provider was created with.
    pub fn config(&self) -> &WebauthnConfig {
        &self.config
    }

    /// Read access to the credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the host should offer this second factor at all.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether `user` has to pass this second factor.
    pub fn begin_authentication<U>(&self, user: &U) -> bool
    where
        U: TwoFactorUser + ?Sized,
    {
        let required = user.is_second_factor_enabled();
        if required {
            log::debug!("second factor {}", CeremonyStatus::NotStarted);
        }
        required
    }

    /// Nothing has to be prepared before the form is shown.
    pub fn prepare_authentication<U>(&self, _user: &U)
    where
        U: TwoFactorUser + ?Sized,
    {
    }

    /// The renderer of the authentication form.
    pub fn form_renderer(&self) -> &FormRenderer {
        &self.form_renderer
    }

    /// Issue a new challenge for `user` and remember it in `session`, replacing any earlier one.
    pub async fn issue_challenge<U, T>(
        &self,
        user: &U,
        request: &RequestContext,
        session: &T,
    ) -> Result<PublicKeyCredentialRequestOptions, RpError>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let allow_credentials = KeyCollector::new(&self.store).descriptors(user).await?;
        let rp_id = RpIdVerifier::effective_rp_id(self.config.rp_id.as_deref(), request);

        let options = PublicKeyCredentialRequestOptions {
            challenge: generate_challenge()?,
            timeout: Some(self.config.timeout),
            rp_id: Some(rp_id.to_owned()),
            allow_credentials,
            user_verification: self.config.user_verification,
            extensions: AuthenticationExtensionsClientInputs {
                appid: Some(self.app_id.app_id(request)),
                cred_props: None,
            },
        };

        CeremonyState::new(session, self.config.ceremony_ttl())
            .put(CeremonyKind::Authentication, &options)?;
        log::debug!(
            "second factor {} for RP {rp_id} with {} keys",
            CeremonyStatus::ChallengeIssued,
            options.allow_credentials.len()
        );
        Ok(options)
    }

    /// Issue a challenge and prepare the authentication form with it.
    pub async fn render_form<U, T>(
        &self,
        user: &U,
        request: &RequestContext,
        session: &T,
        template_vars: Map<String, Value>,
    ) -> Result<RenderedForm, RpError>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let options = self.issue_challenge(user, request, session).await?;
        self.form_renderer.render(&options, template_vars)
    }

    /// Check the `code` posted by the authentication form, the JSON encoded
    /// [`AuthenticatedPublicKeyCredential`], against the challenge in `session`.
    ///
    /// The challenge is consumed whatever the outcome. A rejected answer is `Ok(false)`; errors
    /// are kept for failures of the store, the session or the random source.
    pub async fn validate_authentication_code<U, T>(
        &self,
        user: &U,
        code: &str,
        request: &RequestContext,
        session: &T,
    ) -> Result<bool, RpError>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        match self.authenticate(user, code, request, session).await {
            Ok(()) => {
                log::debug!("second factor {}", CeremonyStatus::Verified);
                Ok(true)
            }
            Err(Error::Rejected(err)) => {
                log::warn!("second factor {}: {err}", CeremonyStatus::Rejected);
                Ok(false)
            }
            Err(Error::Failed(err)) => Err(err),
        }
    }

    async fn authenticate<U, T>(
        &self,
        user: &U,
        code: &str,
        request: &RequestContext,
        session: &T,
    ) -> Result<(), Error>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let Some(options) = CeremonyState::new(session, self.config.ceremony_ttl())
            .take::<PublicKeyCredentialRequestOptions>(CeremonyKind::Authentication)
        else {
            return Err(CeremonyError::NoActiveChallenge.into());
        };

        let response: AuthenticatedPublicKeyCredential =
            serde_json::from_str(code).map_err(|e| {
                log::debug!("could not parse authentication code: {e}");
                CeremonyError::MalformedInput
            })?;

        let keys = KeyCollector::new(&self.store).collect(user).await?;
        let key = find_key(&keys, &response.raw_id).ok_or(CeremonyError::CredentialNotFound)?;

        let rp_id = options.rp_id.as_deref().unwrap_or_else(|| {
            RpIdVerifier::effective_rp_id(self.config.rp_id.as_deref(), request)
        });
        let counter = self
            .validator
            .validate(&options, &response, key.source(), rp_id)?;

        match key {
            CollectedKey::Legacy(_) => Ok(()),
            CollectedKey::Native(source) => {
                match self
                    .store
                    .update_sign_count(&source.credential_id, counter)
                    .await
                {
                    Ok(SignCountUpdate::Updated) => Ok(()),
                    // another login with the same counter won the race
                    Ok(SignCountUpdate::Stale) => Err(CeremonyError::CounterRegression.into()),
                    Err(StoreError::NotFound) => Err(CeremonyError::CredentialNotFound.into()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}
