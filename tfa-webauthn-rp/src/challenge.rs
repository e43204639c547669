use rand::{rngs::OsRng, RngCore};
use tfa_webauthn_types::Bytes;

use crate::RpError;

/// Length in bytes of every issued challenge.
pub const CHALLENGE_LEN: usize = 32;

/// Generate a fresh challenge from the operating system's CSPRNG.
///
/// There is no fallback source: if the OS cannot provide randomness the ceremony cannot start.
pub fn generate_challenge() -> Result<Bytes, RpError> {
    let mut challenge = vec![0u8; CHALLENGE_LEN];
    OsRng.try_fill_bytes(&mut challenge).map_err(|err| {
        log::error!("OS random source failed: {err}");
        RpError::RandomSource
    })?;
    Ok(challenge.into())
}
