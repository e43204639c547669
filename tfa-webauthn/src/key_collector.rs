use subtle::ConstantTimeEq;
use tfa_webauthn_rp::{CredentialStore, StoreError};
use tfa_webauthn_types::{webauthn::PublicKeyCredentialDescriptor, CredentialSource};

use crate::TwoFactorUser;


/// A credential a user may authenticate with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectedKey {
    /// Adapted from a legacy U2F registration. Never written back to the store.
    Legacy(CredentialSource),
    /// Registered through WebAuthn and owned by the credential store.
    Native(CredentialSource),
}

impl CollectedKey {
    /// The credential source of the key.
    pub fn source(&self) -> &CredentialSource {
        match self {
            CollectedKey::Legacy(source) | CollectedKey::Native(source) => source,
        }
    }

    /// Whether the key comes from a legacy U2F registration.
    pub fn is_legacy(&self) -> bool {
        matches!(self, CollectedKey::Legacy(_))
    }
}

/// Gathers the legacy and native keys of a user into one list.
pub struct KeyCollector<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> KeyCollector<'a, S>
where
    S: CredentialStore + ?Sized,
{
    /// Collect native credentials from `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every key of `user`, legacy keys first. A credential ID appears at most once, and when a
    /// legacy key was migrated into the store the stored credential takes its place. Legacy keys
    /// that cannot be decoded are skipped.
    pub async fn collect<U>(&self, user: &U) -> Result<Vec<CollectedKey>, StoreError>
    where
        U: TwoFactorUser + ?Sized,
    {
        let user_handle = user.user_entity().id;
        let mut keys: Vec<CollectedKey> = Vec::new();

        for legacy in user.legacy_keys() {
            match legacy.to_credential_source(&user_handle) {
                Ok(source) => push_unique(&mut keys, CollectedKey::Legacy(source)),
                Err(err) => log::warn!(
                    "skipping legacy key with handle {:?}: {err}",
                    legacy.key_handle
                ),
            }
        }

        for source in self.store.find_all_for_user(&user_handle).await? {
            push_unique(&mut keys, CollectedKey::Native(source));
        }

        log::debug!("collected {} keys", keys.len());
        Ok(keys)
    }

    /// The descriptors of every key of `user`, for `allowCredentials` or `excludeCredentials`.
    pub async fn descriptors<U>(&self, user: &U) -> Result<Vec<PublicKeyCredentialDescriptor>, StoreError>
    where
        U: TwoFactorUser + ?Sized,
    {
        Ok(self
            .collect(user)
            .await?
            .iter()
            .map(|key| key.source().descriptor())
            .collect())
    }
}

/// Find the key answering with `credential_id`.
pub fn find_key<'k>(keys: &'k [CollectedKey], credential_id: &[u8]) -> Option<&'k CollectedKey> {
    keys.iter()
        .find(|key| bool::from(key.source().credential_id.as_slice().ct_eq(credential_id)))
}

fn push_unique(keys: &mut Vec<CollectedKey>, key: CollectedKey) {
    let id = &key.source().credential_id;
    let Some(existing) = keys
        .iter_mut()
        .find(|known| bool::from(known.source().credential_id.as_slice().ct_eq(id)))
    else {
        keys.push(key);
        return;
    };

    if existing.is_legacy() && !key.is_legacy() {
        // the store owns the sign count of a migrated key
        log::debug!("stored credential supersedes the legacy key with the same ID");
        *existing = key;
    } else {
        log::debug!("ignoring duplicate credential ID");
    }
}
