//! Message field mapping and outbound-message assembly.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{attachment::DecodedAttachment, error::SubmitError};

/// The caller-facing description of a message.
///
/// Only `subject`, `body`, `sender` and `recipients` are required;
/// every other field is optional and left to the transport's defaults
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFields {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub html: Option<String>,
    pub sender: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub cc: Option<Vec<String>>,
    #[serde(default)]
    pub bcc: Option<Vec<String>>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub extra_headers: Option<AHashMap<String, String>>,
    #[serde(default)]
    pub mail_options: Option<Vec<String>>,
    #[serde(default)]
    pub rcpt_options: Option<Vec<String>>,
}

impl MessageFields {
    /// Check the submission invariants: sender present, recipients
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::MissingSender`] or
    /// [`SubmitError::NoRecipients`].
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.sender.is_empty() {
            return Err(SubmitError::MissingSender);
        }
        if self.recipients.is_empty() {
            return Err(SubmitError::NoRecipients);
        }

        Ok(())
    }
}

/// A fully populated message, ready for the transport.
///
/// Optional fields the caller never set stay at their defaults here and
/// the transport applies its own (e.g. charset selection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
    pub html: Option<String>,
    pub sender: String,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub charset: Option<String>,
    pub extra_headers: AHashMap<String, String>,
    pub mail_options: Vec<String>,
    pub rcpt_options: Vec<String>,
    pub attachments: Vec<DecodedAttachment>,
}

/// Build an [`OutboundMessage`] from a field mapping plus decoded
/// attachments.
///
/// Every field is copied individually; optional fields are independent
/// slots and setting one never touches another. Attachments keep their
/// input order. Pure transformation, no I/O.
#[must_use]
pub fn assemble(fields: &MessageFields, attachments: Vec<DecodedAttachment>) -> OutboundMessage {
    OutboundMessage {
        subject: fields.subject.clone(),
        body: fields.body.clone(),
        html: fields.html.clone(),
        sender: fields.sender.clone(),
        recipients: fields.recipients.clone(),
        cc: fields.cc.clone().unwrap_or_default(),
        bcc: fields.bcc.clone().unwrap_or_default(),
        reply_to: fields.reply_to.clone(),
        date: fields.date,
        charset: fields.charset.clone(),
        extra_headers: fields.extra_headers.clone().unwrap_or_default(),
        mail_options: fields.mail_options.clone().unwrap_or_default(),
        rcpt_options: fields.rcpt_options.clone().unwrap_or_default(),
        attachments,
    }
}
