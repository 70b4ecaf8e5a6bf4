//! Attachment payloads: size guarding and base64 decoding.
//!
//! Attachments travel through the queue as base64 strings so the job
//! payload stays self-contained and serializable. The size guard runs
//! on the submitting task, before anything is enqueued; decoding runs
//! inside the job, on every execution.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, OversizeError};

/// Content type applied when an attachment does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An attachment as submitted: an encoded payload plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    /// The payload, base64 (standard alphabet, padded).
    pub base64_payload: String,

    /// Content type; [`DEFAULT_CONTENT_TYPE`] when absent.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Disposition hint (typically a filename); `None` means the
    /// transport decides.
    #[serde(default)]
    pub disposition: Option<String>,
}

impl AttachmentSpec {
    /// Build a spec by encoding raw bytes.
    #[must_use]
    pub fn from_bytes(
        data: &[u8],
        content_type: Option<String>,
        disposition: Option<String>,
    ) -> Self {
        Self {
            base64_payload: STANDARD.encode(data),
            content_type,
            disposition,
        }
    }
}

/// A decoded attachment, ready to be placed on an outbound message.
///
/// Produced by [`decode`]; owned by the executing job until handed to
/// the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub content_type: String,
    pub data: Vec<u8>,
    pub disposition: Option<String>,
}

/// Reject any attachment whose encoded payload exceeds `max_size`.
///
/// The encoded length bounds the decoded length from above, so checking
/// it here means nothing oversize ever reaches the queue or the codec.
///
/// # Errors
///
/// Returns an [`OversizeError`] naming the first offending attachment.
pub fn check_size(attachments: &[AttachmentSpec], max_size: usize) -> Result<(), OversizeError> {
    for (index, spec) in attachments.iter().enumerate() {
        let encoded_len = spec.base64_payload.len();
        if encoded_len > max_size {
            return Err(OversizeError {
                index,
                disposition: spec.disposition.clone(),
                encoded_len,
                max_size,
            });
        }
    }

    Ok(())
}

/// Decode one attachment spec into raw bytes.
///
/// `index` is the attachment's position in the job, carried into the
/// error for reporting.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is not valid base64.
pub fn decode(index: usize, spec: &AttachmentSpec) -> Result<DecodedAttachment, DecodeError> {
    let data = STANDARD
        .decode(spec.base64_payload.as_bytes())
        .map_err(|source| DecodeError { index, source })?;

    Ok(DecodedAttachment {
        content_type: spec
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        data,
        disposition: spec.disposition.clone(),
    })
}
