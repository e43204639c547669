use std::fmt;

/// Why a ceremony response was rejected.
///
/// These are expected outcomes of untrusted input: the two-factor provider turns every one of them
/// into a plain "not authenticated" answer and only logs the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyError {
    /// The response could not be parsed: bad JSON, bad base64, truncated authenticator data or an
    /// undecodable attestation object.
    MalformedInput,
    /// The client data `type` is not the one of the running ceremony.
    UnexpectedCeremonyType,
    /// The challenge signed by the authenticator is not the one that was issued.
    ChallengeMismatch,
    /// The client data origin is not within the scope of the RP ID.
    OriginMismatch,
    /// The authenticator scoped its response to another RP ID.
    RpIdHashMismatch,
    /// The user present flag is not set.
    UserNotPresent,
    /// User verification was required but the user verified flag is not set.
    UserNotVerified,
    /// The signature does not verify with the credential's public key.
    SignatureInvalid,
    /// The credential uses an algorithm or key type that cannot be verified.
    UnsupportedAlgorithm,
    /// The registration used an attestation other than "none".
    UnsupportedAttestation,
    /// The signature counter did not increase, the authenticator may have been cloned.
    CounterRegression,
    /// No request is waiting for a response in this session.
    NoActiveChallenge,
    /// The responding credential is not one of the user's.
    CredentialNotFound,
    /// The user handle returned by the authenticator belongs to another account.
    UserHandleMismatch,
}

impl fmt::Display for CeremonyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CeremonyError::MalformedInput => "malformed ceremony response",
            CeremonyError::UnexpectedCeremonyType => "unexpected client data type",
            CeremonyError::ChallengeMismatch => "challenge does not match the issued one",
            CeremonyError::OriginMismatch => "origin is not within the scope of the RP ID",
            CeremonyError::RpIdHashMismatch => "RP ID hash does not match",
            CeremonyError::UserNotPresent => "user presence flag not set",
            CeremonyError::UserNotVerified => "user verification required but not performed",
            CeremonyError::SignatureInvalid => "signature verification failed",
            CeremonyError::UnsupportedAlgorithm => "unsupported credential algorithm",
            CeremonyError::UnsupportedAttestation => "unsupported attestation format",
            CeremonyError::CounterRegression => "signature counter did not increase",
            CeremonyError::NoActiveChallenge => "no active challenge in session",
            CeremonyError::CredentialNotFound => "credential not found for user",
            CeremonyError::UserHandleMismatch => "user handle does not match",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for CeremonyError {}

/// Failures of the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage could not be reached.
    Unavailable,
    /// A credential with the same ID is already stored.
    Duplicate,
    /// No credential with the given ID is stored.
    NotFound,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => f.write_str("credential store unavailable"),
            StoreError::Duplicate => f.write_str("credential ID already registered"),
            StoreError::NotFound => f.write_str("credential not found"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Hard failures that are not the client's fault and must reach the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpError {
    /// The credential store could not be read or written.
    StoreUnavailable,
    /// The session could not be written.
    SessionUnavailable,
    /// The operating system random source failed.
    RandomSource,
    /// A value could not be serialized.
    Serialization(String),
    /// The configuration is unusable.
    InvalidConfiguration(String),
    /// A store operation was refused, such as saving a duplicate credential.
    Store(StoreError),
}

impl fmt::Display for RpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpError::StoreUnavailable => f.write_str("credential store unavailable"),
            RpError::SessionUnavailable => f.write_str("session unavailable"),
            RpError::RandomSource => f.write_str("random source failure"),
            RpError::Serialization(reason) => write!(f, "serialization failed: {reason}"),
            RpError::InvalidConfiguration(reason) => write!(f, "invalid configuration: {reason}"),
            RpError::Store(err) => write!(f, "credential store refused the operation: {err}"),
        }
    }
}

impl std::error::Error for RpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RpError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable => RpError::StoreUnavailable,
            other => RpError::Store(other),
        }
    }
}

impl From<serde_json::Error> for RpError {
    fn from(value: serde_json::Error) -> Self {
        RpError::Serialization(value.to_string())
    }
}
