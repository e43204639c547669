use std::borrow::Cow;

use url::Url;

use crate::CeremonyError;


/// The parts of the current HTTP request the ceremonies depend on.
///
/// The host framework builds this from its request object; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// `http` or `https`.
    pub scheme: String,
    /// The request host, without port.
    pub host: String,
    /// The request port, if known.
    pub port: Option<u16>,
}

impl RequestContext {
    /// Describe a request.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Describe the request for `url`.
    pub fn from_url(url: &Url) -> Option<Self> {
        Some(Self {
            scheme: url.scheme().to_owned(),
            host: url.host_str()?.to_owned(),
            port: url.port_or_known_default(),
        })
    }
}

/// Wrapper struct for verifying that an origin reported in client data matches the relying
/// party's RP ID.
#[derive(Debug, Clone, Default)]
pub struct RpIdVerifier {
    allows_insecure_localhost: bool,
}

impl RpIdVerifier {
    /// Create a verifier that requires `https` origins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows [`RpIdVerifier::assert_origin`] to pass through `http://localhost` origins
    pub fn allows_insecure_localhost(mut self, is_allowed: bool) -> Self {
        self.allows_insecure_localhost = is_allowed;
        self
    }

    /// The RP ID in effect for a request: the configured one, or the request host.
    pub fn effective_rp_id<'a>(configured: Option<&'a str>, request: &'a RequestContext) -> &'a str {
        configured.unwrap_or(&request.host)
    }

    /// Check that `origin` is within the scope of `rp_id`: its host equals the RP ID or is a
    /// subdomain of it, and it is served over `https`. `http://localhost` is only accepted when
    /// enabled with [`Self::allows_insecure_localhost`].
    pub fn assert_origin(&self, origin: &str, rp_id: &str) -> Result<(), CeremonyError> {
        let url = Url::parse(origin).map_err(|_| {
            log::debug!("origin {origin:?} is not a URL");
            CeremonyError::OriginMismatch
        })?;
        let domain = url
            .host_str()
            .and_then(decode_host)
            .ok_or(CeremonyError::OriginMismatch)?;
        let rp_id = decode_host(rp_id).ok_or(CeremonyError::OriginMismatch)?;

        if !is_within_scope(&domain, &rp_id) {
            log::debug!("origin {origin:?} is not within the scope of {rp_id:?}");
            return Err(CeremonyError::OriginMismatch);
        }

        // guard against local host, return early
        if domain == "localhost" {
            return if self.allows_insecure_localhost || url.scheme().eq_ignore_ascii_case("https")
            {
                Ok(())
            } else {
                log::debug!("insecure localhost origin is not allowed");
                Err(CeremonyError::OriginMismatch)
            };
        }

        // Make sure origin uses https://
        if !url.scheme().eq_ignore_ascii_case("https") {
            log::debug!("origin {origin:?} does not use https");
            return Err(CeremonyError::OriginMismatch);
        }

        Ok(())
    }
}

/// A domain is within the scope of an RP ID when it is the RP ID or one of its subdomains.
fn is_within_scope(domain: &str, rp_id: &str) -> bool {
    let domain = domain.trim_end_matches('.');
    let rp_id = rp_id.trim_end_matches('.');
    if rp_id.is_empty() {
        return false;
    }
    domain.eq_ignore_ascii_case(rp_id)
        || domain
            .len()
            .checked_sub(rp_id.len() + 1)
            .and_then(|split| domain.get(split..))
            .and_then(|suffix| suffix.strip_prefix('.'))
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case(rp_id))
}

/// Returns a decoded [String] if the domain name is punycode otherwise
/// the original string reference [str] is returned.
fn decode_host(host: &str) -> Option<Cow<str>> {
    if host.split('.').any(|s| s.starts_with("xn--")) {
        let (decoded, result) = idna::domain_to_unicode(host);
        result.ok().map(|_| Cow::from(decoded))
    } else {
        Some(Cow::from(host))
    }
}
