use tfa_webauthn_types::webauthn::PublicKeyCredentialUserEntity;

use crate::LegacyU2fKey;

/// What a user account of the host must expose to log in with a security key.
///
/// The native WebAuthn credentials of the user are not listed here: they live in the
/// [`CredentialStore`](tfa_webauthn_rp::CredentialStore), keyed by the user handle of
/// [`TwoFactorUser::user_entity`], so a single authority owns their signature counters.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
pub trait TwoFactorUser {
    /// Whether the user turned security key authentication on.
    fn is_second_factor_enabled(&self) -> bool;

    /// Keys the user registered through the legacy U2F API.
    ///
    /// Most accounts have none, which is the default.
    fn legacy_keys(&self) -> Vec<LegacyU2fKey> {
        Vec::new()
    }

    /// The WebAuthn identity of the user. Its `id` is the user handle.
    fn user_entity(&self) -> PublicKeyCredentialUserEntity;
}
