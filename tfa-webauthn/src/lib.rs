//! # tfa-webauthn
//!
//! Security keys as a second authentication factor, speaking [WebAuthn] to the browser while
//! keeping keys registered through the legacy U2F API working.
//!
//! The host authentication framework drives a [`TwoFactorProvider`]:
//!
//! - [`begin_authentication()`](TwoFactorProvider::begin_authentication) - whether the user has
//!   to pass the second factor.
//! - [`render_form()`](TwoFactorProvider::render_form) - issues a challenge and prepares the
//!   variables of the authentication form.
//! - [`validate_authentication_code()`](TwoFactorProvider::validate_authentication_code) - checks
//!   the answer of the security key.
//!
//! New keys are added with a [`RegistrationHelper`].
//!
//! The host supplies three things, each through a trait:
//!
//! - its user accounts, through [`TwoFactorUser`];
//! - its session, through [`SessionStore`](tfa_webauthn_rp::SessionStore);
//! - the storage of registered credentials, through
//!   [`CredentialStore`](tfa_webauthn_rp::CredentialStore).
//!
//! The ceremonies themselves live in [`rp`], the wire types in [`types`].
//!
//! [WebAuthn]: https://www.w3.org/TR/webauthn-3/

mod app_id;
mod error;
mod form;
mod key_collector;
mod legacy;
mod provider;
mod registration;
mod user;

pub use tfa_webauthn_rp as rp;
pub use tfa_webauthn_types as types;

pub use self::{
    app_id::U2fAppIdProvider,
    error::Error,
    form::{FormRenderer, RenderedForm, REQUEST_DATA_VAR},
    key_collector::{find_key, CollectedKey, KeyCollector},
    legacy::LegacyU2fKey,
    provider::{CeremonyStatus, TwoFactorProvider},
    registration::RegistrationHelper,
    user::TwoFactorUser,
};

#[cfg(any(test, feature = "testable"))]
pub use self::user::MockTwoFactorUser;
