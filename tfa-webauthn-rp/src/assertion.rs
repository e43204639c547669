use subtle::ConstantTimeEq;
use tfa_webauthn_types::{
    authenticator::AuthenticatorData,
    crypto::sha256,
    webauthn::{AuthenticatedPublicKeyCredential, ClientDataType, PublicKeyCredentialRequestOptions},
    CredentialSource,
};

use crate::{client_data::verify_client_data, cose::CredentialPublicKey, CeremonyError, RpIdVerifier};


/// Verifies authentication responses against the request that was issued for them.
#[derive(Debug, Clone, Default)]
pub struct AssertionValidator {
    origin_verifier: RpIdVerifier,
}

impl AssertionValidator {
    /// Create a validator checking origins with `origin_verifier`.
    pub fn new(origin_verifier: RpIdVerifier) -> Self {
        Self { origin_verifier }
    }

    /// Validate `response` to `request`, produced by the credential `source`, for the relying
    /// party `rp_id`.
    ///
    /// On success returns the signature counter reported by the authenticator. Persisting it is
    /// left to the caller so it can go through the store's atomic update.
    pub fn validate(
        &self,
        request: &PublicKeyCredentialRequestOptions,
        response: &AuthenticatedPublicKeyCredential,
        source: &CredentialSource,
        rp_id: &str,
    ) -> Result<u32, CeremonyError> {
        if !bool::from(response.raw_id.as_slice().ct_eq(&source.credential_id))
            || !request.allows(&response.raw_id)
        {
            return Err(CeremonyError::CredentialNotFound);
        }
        if let Some(user_handle) = response.response.user_handle.as_deref() {
            if !user_handle.is_empty() && !bool::from(user_handle.ct_eq(&source.user_handle)) {
                return Err(CeremonyError::UserHandleMismatch);
            }
        }

        let client_data = verify_client_data(
            &response.response.client_data_json,
            ClientDataType::Get,
            &request.challenge,
        )?;

        // An authenticator answering through the AppID extension scopes the response to the
        // AppID instead of the RP ID.
        let appid = request
            .requested_appid()
            .filter(|_| response.client_extension_results.used_appid());
        match appid {
            Some(appid) if client_data.origin == appid => {}
            _ => self.origin_verifier.assert_origin(&client_data.origin, rp_id)?,
        }

        let authenticator_data = AuthenticatorData::from_slice(&response.response.authenticator_data)
            .map_err(|e| {
                log::debug!("could not parse authenticator data: {e}");
                CeremonyError::MalformedInput
            })?;
        let scope = appid.unwrap_or(rp_id);
        if !bool::from(authenticator_data.rp_id_hash().ct_eq(&sha256(scope.as_bytes()))) {
            return Err(CeremonyError::RpIdHashMismatch);
        }

        if !authenticator_data.user_present() {
            return Err(CeremonyError::UserNotPresent);
        }
        if request.user_verification.is_required() && !authenticator_data.user_verified() {
            return Err(CeremonyError::UserNotVerified);
        }

        let key = CredentialPublicKey::from_cose_slice(&source.public_key)?;
        let mut signed = response.response.authenticator_data.to_vec();
        signed.extend_from_slice(&sha256(&response.response.client_data_json));
        key.verify(&signed, &response.response.signature)?;

        let counter = authenticator_data.counter;
        if source.sign_count != 0 && counter <= source.sign_count {
            log::warn!(
                "signature counter went from {} to {counter}, the authenticator may be cloned",
                source.sign_count
            );
            return Err(CeremonyError::CounterRegression);
        }

        log::debug!("assertion verified with counter {counter}");
        Ok(counter)
    }
}
