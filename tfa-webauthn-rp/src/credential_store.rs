use std::sync::Arc;

use subtle::ConstantTimeEq;
use tfa_webauthn_types::{encoding, CredentialSource};
use tokio::sync::RwLock;

use crate::StoreError;

/// Outcome of [`CredentialStore::update_sign_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignCountUpdate {
    /// The new counter was written.
    Updated,
    /// The stored counter was already at or beyond the new value, nothing was written.
    Stale,
}

/// Use this on a type that persists the registered credentials of all users.
///
/// A store is shared by every session, so implementations must be safe to call concurrently.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential with the given ID, whichever user it belongs to.
    async fn find_by_credential_id(&self, id: &[u8])
        -> Result<Option<CredentialSource>, StoreError>;

    /// Find every credential registered by the user with the given handle.
    async fn find_all_for_user(&self, user_handle: &[u8])
        -> Result<Vec<CredentialSource>, StoreError>;

    /// Save a newly registered credential.
    ///
    /// Returns [`StoreError::Duplicate`] if a credential with the same ID exists.
    async fn save(&self, source: CredentialSource) -> Result<(), StoreError>;

    /// Record the signature counter of a successful authentication.
    ///
    /// This is a compare-and-set: the counter is written when the stored value is 0 or
    /// `new_count` is strictly greater than it, and [`SignCountUpdate::Stale`] is returned
    /// otherwise. The comparison and the write must be atomic with respect to concurrent calls
    /// for the same credential.
    async fn update_sign_count(
        &self,
        id: &[u8],
        new_count: u32,
    ) -> Result<SignCountUpdate, StoreError>;
}

/// In-memory store for credentials
///
/// Useful for tests and as a reference for implementing the atomic counter update.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<Vec<CredentialSource>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Position of the credential with `id`. Every stored ID is compared, in constant time, so the
/// time taken does not depend on whether or where the credential is stored.
fn position(credentials: &[CredentialSource], id: &[u8]) -> Option<usize> {
    let mut found = None;
    for (index, source) in credentials.iter().enumerate() {
        if bool::from(source.credential_id.as_slice().ct_eq(id)) {
            found = Some(index);
        }
    }
    found
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_credential_id(
        &self,
        id: &[u8],
    ) -> Result<Option<CredentialSource>, StoreError> {
        let credentials = self.credentials.read().await;
        Ok(position(&credentials, id).and_then(|index| credentials.get(index).cloned()))
    }

    async fn find_all_for_user(
        &self,
        user_handle: &[u8],
    ) -> Result<Vec<CredentialSource>, StoreError> {
        let credentials = self.credentials.read().await;
        Ok(credentials
            .iter()
            .filter(|source| bool::from(source.user_handle.as_slice().ct_eq(user_handle)))
            .cloned()
            .collect())
    }

    async fn save(&self, source: CredentialSource) -> Result<(), StoreError> {
        let mut credentials = self.credentials.write().await;
        if position(&credentials, &source.credential_id).is_some() {
            return Err(StoreError::Duplicate);
        }
        log::debug!(
            "saving credential {}",
            encoding::base64url(&source.credential_id)
        );
        credentials.push(source);
        Ok(())
    }

    async fn update_sign_count(
        &self,
        id: &[u8],
        new_count: u32,
    ) -> Result<SignCountUpdate, StoreError> {
        let mut credentials = self.credentials.write().await;
        let source = position(&credentials, id)
            .and_then(|index| credentials.get_mut(index))
            .ok_or(StoreError::NotFound)?;

        if source.sign_count != 0 && new_count <= source.sign_count {
            return Ok(SignCountUpdate::Stale);
        }
        source.sign_count = new_count;
        Ok(SignCountUpdate::Updated)
    }
}

#[async_trait::async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn find_by_credential_id(
        &self,
        id: &[u8],
    ) -> Result<Option<CredentialSource>, StoreError> {
        (**self).find_by_credential_id(id).await
    }

    async fn find_all_for_user(
        &self,
        user_handle: &[u8],
    ) -> Result<Vec<CredentialSource>, StoreError> {
        (**self).find_all_for_user(user_handle).await
    }

    async fn save(&self, source: CredentialSource) -> Result<(), StoreError> {
        (**self).save(source).await
    }

    async fn update_sign_count(
        &self,
        id: &[u8],
        new_count: u32,
    ) -> Result<SignCountUpdate, StoreError> {
        (**self).update_sign_count(id, new_count).await
    }
}
