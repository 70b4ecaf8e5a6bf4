//! Template renderer collaborator.
//!
//! Rendering itself is external; this module holds the seam and the
//! convenience that mirrors a templated message: render a body and/or
//! html template into the corresponding fields before submission.

use ahash::AHashMap;
use thiserror::Error;

use crate::message::MessageFields;

/// Errors a renderer can raise.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template registered under the given identifier.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// The template exists but could not be rendered with the given
    /// context.
    #[error("template rendering failed: {0}")]
    Render(String),
}

/// A template renderer: template identifier plus context mapping in,
/// rendered text out.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template_id` with `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] when the template is unknown or
    /// rendering fails.
    fn render(&self, template_id: &str, ctx: &AHashMap<String, String>)
    -> Result<String, TemplateError>;
}

/// Render templates into a field mapping.
///
/// `template_body` replaces `fields.body`, `template_html` replaces
/// `fields.html`; fields without a template are left untouched.
///
/// # Errors
///
/// Propagates the renderer's [`TemplateError`].
pub fn templated_fields(
    renderer: &dyn TemplateRenderer,
    template_body: Option<&str>,
    template_html: Option<&str>,
    ctx: &AHashMap<String, String>,
    mut fields: MessageFields,
) -> Result<MessageFields, TemplateError> {
    if let Some(id) = template_body {
        fields.body = renderer.render(id, ctx)?;
    }
    if let Some(id) = template_html {
        fields.html = Some(renderer.render(id, ctx)?);
    }

    Ok(fields)
}
