use std::fmt;

use tfa_webauthn_rp::{CeremonyError, RpError, StoreError};

/// Why a ceremony did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The browser's response was rejected. Expected for untrusted input.
    Rejected(CeremonyError),
    /// The ceremony could not run. Must reach the host.
    Failed(RpError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Rejected(err) => write!(f, "response rejected: {err}"),
            Error::Failed(err) => write!(f, "ceremony failed: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rejected(err) => Some(err),
            Error::Failed(err) => Some(err),
        }
    }
}

impl From<CeremonyError> for Error {
    fn from(value: CeremonyError) -> Self {
        Error::Rejected(value)
    }
}

impl From<RpError> for Error {
    fn from(value: RpError) -> Self {
        Error::Failed(value)
    }
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Error::Failed(value.into())
    }
}
