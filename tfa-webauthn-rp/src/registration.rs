use coset::CborSerializable;
use subtle::ConstantTimeEq;
use tfa_webauthn_types::{
    authenticator::AttestationObject,
    crypto::sha256,
    webauthn::{ClientDataType, CreatedPublicKeyCredential, PublicKeyCredentialCreationOptions},
    CredentialSource, TrustPath, NONE_ATTESTATION_TYPE,
};

use crate::{client_data::verify_client_data, cose::CredentialPublicKey, CeremonyError, RpIdVerifier};


/// Verifies registration responses carrying "none" attestation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationValidator {
    origin_verifier: RpIdVerifier,
}

impl RegistrationValidator {
    /// Create a validator checking origins with `origin_verifier`.
    pub fn new(origin_verifier: RpIdVerifier) -> Self {
        Self { origin_verifier }
    }

    /// Validate `response` to the creation `options` for the relying party `rp_id`, and build
    /// the record of the new credential. Persisting it is left to the caller.
    pub fn validate(
        &self,
        options: &PublicKeyCredentialCreationOptions,
        response: &CreatedPublicKeyCredential,
        rp_id: &str,
    ) -> Result<CredentialSource, CeremonyError> {
        let client_data = verify_client_data(
            &response.response.client_data_json,
            ClientDataType::Create,
            &options.challenge,
        )?;
        self.origin_verifier
            .assert_origin(&client_data.origin, rp_id)?;

        let attestation = AttestationObject::from_slice(&response.response.attestation_object)
            .map_err(|e| {
                log::debug!("could not parse attestation object: {e}");
                CeremonyError::MalformedInput
            })?;
        if !attestation.is_none_attestation() {
            log::debug!("refusing attestation format {:?}", attestation.fmt);
            return Err(CeremonyError::UnsupportedAttestation);
        }

        let auth_data = attestation.auth_data;
        if !bool::from(auth_data.rp_id_hash().ct_eq(&sha256(rp_id.as_bytes()))) {
            return Err(CeremonyError::RpIdHashMismatch);
        }
        if !auth_data.user_present() {
            return Err(CeremonyError::UserNotPresent);
        }
        if options.user_verification().is_required() && !auth_data.user_verified() {
            return Err(CeremonyError::UserNotVerified);
        }

        let Some(acd) = auth_data.attested_credential_data else {
            log::debug!("registration carries no attested credential data");
            return Err(CeremonyError::MalformedInput);
        };
        if !bool::from(acd.credential_id().ct_eq(&response.raw_id)) {
            log::debug!("attested credential ID differs from rawId");
            return Err(CeremonyError::MalformedInput);
        }

        match acd.algorithm() {
            Some(alg) if options.accepts_algorithm(alg) => {}
            alg => {
                log::debug!("credential algorithm {alg:?} was not requested");
                return Err(CeremonyError::UnsupportedAlgorithm);
            }
        }
        CredentialPublicKey::from_cose_key(&acd.key)?;

        let credential_id = acd.credential_id().to_vec();
        let public_key = acd
            .key
            .to_vec()
            .map_err(|_| CeremonyError::MalformedInput)?;

        Ok(CredentialSource {
            credential_id: credential_id.into(),
            public_key: public_key.into(),
            user_handle: options.user.id.clone(),
            sign_count: auth_data.counter,
            transports: response.response.transports.clone(),
            attestation_type: NONE_ATTESTATION_TYPE.to_owned(),
            trust_path: TrustPath::Empty,
            aaguid: acd.aaguid,
        })
    }
}
