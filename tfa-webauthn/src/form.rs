use serde_json::{Map, Value};
use tfa_webauthn_rp::RpError;
use tfa_webauthn_types::webauthn::PublicKeyCredentialRequestOptions;

/// The template variable holding the JSON request options.
pub const REQUEST_DATA_VAR: &str = "webauthn_request_data";

/// What the host's template engine needs to render the authentication form.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedForm {
    /// The template identifier.
    pub template: String,
    /// The variables to render the template with, including [`REQUEST_DATA_VAR`].
    pub template_vars: Map<String, Value>,
}

/// Prepares the authentication form. Rendering the template itself is left to the host.
#[derive(Debug, Clone)]
pub struct FormRenderer {
    template: String,
}

impl FormRenderer {
    /// Render forms with `template`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The template identifier.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Add the serialized `options` to the host's `template_vars`.
    pub fn render(
        &self,
        options: &PublicKeyCredentialRequestOptions,
        mut template_vars: Map<String, Value>,
    ) -> Result<RenderedForm, RpError> {
        let request_data = serde_json::to_string(options)?;
        template_vars.insert(REQUEST_DATA_VAR.to_owned(), Value::String(request_data));
        Ok(RenderedForm {
            template: self.template.clone(),
            template_vars,
        })
    }
}
