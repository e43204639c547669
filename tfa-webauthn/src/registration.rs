use subtle::ConstantTimeEq;
use tfa_webauthn_rp::{
    generate_challenge, CeremonyError, CeremonyKind, CeremonyState, CredentialStore,
    RegistrationValidator, RequestContext, RpError, RpIdVerifier, SessionStore, WebauthnConfig,
};
use tfa_webauthn_types::{
    webauthn::{
        AttestationConveyancePreference, AuthenticationExtensionsClientInputs,
        AuthenticatorSelectionCriteria, CreatedPublicKeyCredential,
        PublicKeyCredentialCreationOptions,
    },
    CredentialSource,
};

use crate::{Error, KeyCollector, TwoFactorUser};

#[cfg(test)]
mod tests;

/// Registers new security keys for a user.
///
/// The host shows the options from
/// [`generate_registration_request`](Self::generate_registration_request) to the browser and
/// hands the answer to [`check_registration_response`](Self::check_registration_response), which
/// saves the new credential in the store.
pub struct RegistrationHelper<S> {
    config: WebauthnConfig,
    store: S,
    validator: RegistrationValidator,
}

impl<S: CredentialStore> RegistrationHelper<S> {
    /// Create a helper saving new credentials into `store`.
    pub fn new(config: WebauthnConfig, store: S) -> Result<Self, RpError> {
        config.validate()?;
        let validator = RegistrationValidator::new(
            RpIdVerifier::new().allows_insecure_localhost(config.allow_insecure_localhost),
        );
        Ok(Self {
            config,
            store,
            validator,
        })
    }

    /// Generate creation options for `user` and remember them in `session` as the active
    /// registration. Every key the user already has is excluded.
    pub async fn generate_registration_request<U, T>(
        &self,
        user: &U,
        request: &RequestContext,
        session: &T,
    ) -> Result<PublicKeyCredentialCreationOptions, RpError>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let exclude_credentials = KeyCollector::new(&self.store).descriptors(user).await?;
        let rp_id = RpIdVerifier::effective_rp_id(self.config.rp_id.as_deref(), request);

        let options = PublicKeyCredentialCreationOptions {
            rp: self.config.relying_party().entity(rp_id),
            user: user.user_entity(),
            challenge: generate_challenge()?,
            pub_key_cred_params: self.config.credential_parameters(),
            timeout: Some(self.config.timeout),
            exclude_credentials,
            authenticator_selection: Some(AuthenticatorSelectionCriteria {
                user_verification: self.config.user_verification,
                ..Default::default()
            }),
            attestation: AttestationConveyancePreference::None,
            extensions: AuthenticationExtensionsClientInputs::default(),
        };

        CeremonyState::new(session, self.config.ceremony_ttl())
            .put(CeremonyKind::Registration, &options)?;
        Ok(options)
    }

    /// [`generate_registration_request`](Self::generate_registration_request), serialized for the
    /// browser.
    pub async fn generate_registration_request_json<U, T>(
        &self,
        user: &U,
        request: &RequestContext,
        session: &T,
    ) -> Result<String, RpError>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let options = self
            .generate_registration_request(user, request, session)
            .await?;
        Ok(serde_json::to_string(&options)?)
    }

    /// Validate the JSON encoded [`CreatedPublicKeyCredential`] against the active registration
    /// of `session`, and save the new credential.
    ///
    /// The active registration is consumed whatever the outcome.
    pub async fn check_registration_response<U, T>(
        &self,
        user: &U,
        response: &str,
        request: &RequestContext,
        session: &T,
    ) -> Result<CredentialSource, Error>
    where
        U: TwoFactorUser + ?Sized,
        T: SessionStore + ?Sized,
    {
        let Some(options) = CeremonyState::new(session, self.config.ceremony_ttl())
            .take::<PublicKeyCredentialCreationOptions>(CeremonyKind::Registration)
        else {
            return Err(CeremonyError::NoActiveChallenge.into());
        };

        let response: CreatedPublicKeyCredential =
            serde_json::from_str(response).map_err(|e| {
                log::debug!("could not parse registration response: {e}");
                CeremonyError::MalformedInput
            })?;

        if !bool::from(options.user.id.as_slice().ct_eq(&user.user_entity().id)) {
            return Err(CeremonyError::UserHandleMismatch.into());
        }

        let rp_id = options.rp.id.as_deref().unwrap_or_else(|| {
            RpIdVerifier::effective_rp_id(self.config.rp_id.as_deref(), request)
        });
        let source = self.validator.validate(&options, &response, rp_id)?;

        self.store.save(source.clone()).await?;
        log::debug!("registered a new key for RP {rp_id}");
        Ok(source)
    }
}
