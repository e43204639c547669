use subtle::ConstantTimeEq;
use tfa_webauthn_types::{
    encoding,
    webauthn::{ClientDataType, CollectedClientData},
};

use crate::CeremonyError;

/// Parse `clientDataJSON` and check the ceremony type and the challenge it was signed for.
///
/// Ceremonies run from a cross-origin iframe are refused: the second factor is only ever asked
/// for by the relying party's own login page.
pub(crate) fn verify_client_data(
    client_data_json: &[u8],
    expected: ClientDataType,
    challenge: &[u8],
) -> Result<CollectedClientData, CeremonyError> {
    let client_data: CollectedClientData =
        serde_json::from_slice(client_data_json).map_err(|e| {
            log::debug!("could not parse client data: {e}");
            CeremonyError::MalformedInput
        })?;

    if client_data.ty != Some(expected) {
        log::debug!(
            "expected client data of type {expected}, got {:?}",
            client_data.ty
        );
        return Err(CeremonyError::UnexpectedCeremonyType);
    }

    let signed_challenge =
        encoding::try_from_base64url(&client_data.challenge).ok_or(CeremonyError::MalformedInput)?;
    if !bool::from(signed_challenge.as_slice().ct_eq(challenge)) {
        return Err(CeremonyError::ChallengeMismatch);
    }

    if client_data.cross_origin == Some(true) {
        log::warn!("refusing a ceremony embedded cross-origin in {}", client_data.origin);
        return Err(CeremonyError::OriginMismatch);
    }

    Ok(client_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_data(ty: &str, challenge: &[u8]) -> Vec<u8> {
        serde_json::json!({
            "type": ty,
            "challenge": encoding::base64url(challenge),
            "origin": "https://example.com",
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn matching_client_data_is_accepted() {
        let parsed = verify_client_data(
            &client_data("webauthn.get", &[1, 2, 3]),
            ClientDataType::Get,
            &[1, 2, 3],
        )
        .expect("client data was rejected");
        assert_eq!(parsed.origin, "https://example.com");
    }

    #[test]
    fn challenge_off_by_one_byte_is_rejected() {
        assert_eq!(
            verify_client_data(
                &client_data("webauthn.get", &[1, 2, 3]),
                ClientDataType::Get,
                &[1, 2, 4],
            )
            .unwrap_err(),
            CeremonyError::ChallengeMismatch
        );
        assert_eq!(
            verify_client_data(
                &client_data("webauthn.get", &[1, 2, 3]),
                ClientDataType::Get,
                &[1, 2, 3, 4],
            )
            .unwrap_err(),
            CeremonyError::ChallengeMismatch
        );
    }

    #[test]
    fn ceremony_type_must_match() {
        assert_eq!(
            verify_client_data(
                &client_data("webauthn.create", &[1]),
                ClientDataType::Get,
                &[1],
            )
            .unwrap_err(),
            CeremonyError::UnexpectedCeremonyType
        );
        assert_eq!(
            verify_client_data(
                &client_data("payment.get", &[1]),
                ClientDataType::Get,
                &[1],
            )
            .unwrap_err(),
            CeremonyError::UnexpectedCeremonyType
        );
    }

    #[test]
    fn cross_origin_ceremony_is_refused() {
        let embedded = serde_json::json!({
            "type": "webauthn.get",
            "challenge": encoding::base64url(&[7]),
            "origin": "https://example.com",
            "crossOrigin": true,
            "topOrigin": "https://evil.com",
        })
        .to_string();
        assert_eq!(
            verify_client_data(embedded.as_bytes(), ClientDataType::Get, &[7]).unwrap_err(),
            CeremonyError::OriginMismatch
        );

        let unset = serde_json::json!({
            "type": "webauthn.get",
            "challenge": encoding::base64url(&[7]),
            "origin": "https://example.com",
        })
        .to_string();
        let parsed = verify_client_data(unset.as_bytes(), ClientDataType::Get, &[7])
            .expect("client data without crossOrigin was rejected");
        assert_eq!(parsed.cross_origin, None);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            verify_client_data(b"{not json", ClientDataType::Get, &[1]).unwrap_err(),
            CeremonyError::MalformedInput
        );
    }
}
