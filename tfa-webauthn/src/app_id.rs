use tfa_webauthn_rp::RequestContext;

/// Provides the AppID legacy U2F registrations are scoped to.
#[derive(Debug, Clone, Default)]
pub struct U2fAppIdProvider {
    app_id_override: Option<String>,
}

impl U2fAppIdProvider {
    /// Use `app_id_override` when set, otherwise derive the AppID from each request.
    pub fn new(app_id_override: Option<String>) -> Self {
        Self {
            app_id_override: app_id_override.filter(|app_id| !app_id.is_empty()),
        }
    }

    /// The AppID for `request`: the override, or `scheme://host[:port]` with the default ports
    /// 80 and 443 left out, as the U2F bundle computed it.
    pub fn app_id(&self, request: &RequestContext) -> String {
        if let Some(app_id) = &self.app_id_override {
            return app_id.clone();
        }
        match request.port {
            Some(80 | 443) | None => format!("{}://{}", request.scheme, request.host),
            Some(port) => format!("{}://{}:{port}", request.scheme, request.host),
        }
    }
}
