use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::RpError;

/// Per-login key-value storage provided by the host, typically its HTTP session.
///
/// Implementations use interior mutability: sessions are shared handles.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
pub trait SessionStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn insert(&self, key: &str, value: String) -> Result<(), RpError>;

    /// Remove a value, returning it if it was present.
    fn remove(&self, key: &str) -> Option<String>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn insert(&self, key: &str, value: String) -> Result<(), RpError> {
        (**self).insert(key, value)
    }

    fn remove(&self, key: &str) -> Option<String> {
        (**self).remove(key)
    }
}

/// In-memory session.
///
/// Useful for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn insert(&self, key: &str, value: String) -> Result<(), RpError> {
        self.values
            .lock()
            .map_err(|_| RpError::SessionUnavailable)?
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.remove(key)
    }
}

/// The two kinds of ceremony whose requests are kept between round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    /// Second factor authentication.
    Authentication,
    /// Registration of a new key.
    Registration,
}

impl CeremonyKind {
    /// The session key the request of this kind is stored under.
    pub fn session_key(self) -> &'static str {
        match self {
            CeremonyKind::Authentication => "tfa_webauthn.auth_request",
            CeremonyKind::Registration => "tfa_webauthn.reg_request",
        }
    }
}

/// What is persisted in the session for an issued request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCeremony<T> {
    /// The options sent to the browser.
    pub options: T,
    /// When the options were issued.
    pub issued_at: DateTime<Utc>,
}

/// Keeps the single active request of each [`CeremonyKind`] in the session.
///
/// A request is consumed at most once: [`CeremonyState::take`] removes it whether or not it can
/// be used, and requests older than the TTL are treated as absent.
pub struct CeremonyState<S> {
    session: S,
    ttl: Duration,
}

impl<S: SessionStore> CeremonyState<S> {
    /// Wrap a session, expiring requests after `ttl`.
    pub fn new(session: S, ttl: Duration) -> Self {
        Self { session, ttl }
    }

    /// Store `options` as the active request of `kind`, replacing any previous one.
    pub fn put<T: Serialize>(&self, kind: CeremonyKind, options: &T) -> Result<(), RpError> {
        let stored = StoredCeremony {
            options,
            issued_at: Utc::now(),
        };
        let json = serde_json::to_string(&stored)?;
        self.session.insert(kind.session_key(), json)?;
        log::debug!("stored {kind:?} request in session");
        Ok(())
    }

    /// Remove and return the active request of `kind`, if there is a usable one.
    pub fn take<T: DeserializeOwned>(&self, kind: CeremonyKind) -> Option<T> {
        self.take_at(kind, Utc::now())
    }

    fn take_at<T: DeserializeOwned>(&self, kind: CeremonyKind, now: DateTime<Utc>) -> Option<T> {
        let json = self.session.remove(kind.session_key())?;
        let stored: StoredCeremony<T> = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("discarding undecodable {kind:?} request: {err}");
                return None;
            }
        };
        if now - stored.issued_at > self.ttl {
            log::debug!("{kind:?} request issued at {} expired", stored.issued_at);
            return None;
        }
        Some(stored.options)
    }
}
