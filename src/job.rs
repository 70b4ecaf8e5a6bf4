//! The dispatch job: the queued unit of work and its execution pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{
    attachment::{self, AttachmentSpec},
    error::DispatchError,
    message::{self, MessageFields},
    transport::Transport,
};

/// One queued email send, with its retry bookkeeping.
///
/// The job is fully self-contained and serializable: attachments stay
/// base64-encoded inside it and are re-decoded on every execution, so a
/// redelivered job carries no state from earlier attempts beyond
/// `retry_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchJob {
    /// Unique job identifier, assigned at submission.
    pub id: Ulid,
    /// The message description.
    pub fields: MessageFields,
    /// Encoded attachments, in the order they will be attached.
    pub attachments: Vec<AttachmentSpec>,
    /// Number of redeliveries so far; 0 on first execution.
    pub retry_count: u32,
    /// When the job was submitted.
    pub created_at: DateTime<Utc>,
}

impl DispatchJob {
    /// Create a fresh job for submission.
    #[must_use]
    pub fn new(fields: MessageFields, attachments: Vec<AttachmentSpec>) -> Self {
        Self {
            id: Ulid::new(),
            fields,
            attachments,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of a dispatch job.
///
/// `Pending → Running → { Succeeded | Retrying | Failed }`; `Retrying`
/// goes back to `Pending` once the countdown elapses. `Succeeded` and
/// `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Enqueued, waiting for a worker.
    Pending,
    /// Currently executing.
    Running,
    /// The transport accepted the message.
    Succeeded,
    /// A transient failure; redelivery is scheduled.
    Retrying { attempts: u32, last_error: String },
    /// Terminal failure: fatal error or retries exhausted.
    Failed(String),
}

impl JobState {
    /// Whether this state ends the job's lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Execute one delivery attempt: decode, assemble, send.
///
/// Performs exactly one transport send. Attachment decoding happens
/// first and a failure there aborts the attempt before any network
/// activity.
///
/// # Errors
///
/// Returns [`DispatchError::Decode`] for a malformed attachment (fatal)
/// or [`DispatchError::Transport`] when the send fails (classified by
/// the retry policy).
pub async fn run(job: &DispatchJob, transport: &dyn Transport) -> Result<(), DispatchError> {
    let mut decoded = Vec::with_capacity(job.attachments.len());
    for (index, spec) in job.attachments.iter().enumerate() {
        decoded.push(attachment::decode(index, spec)?);
    }

    let outbound = message::assemble(&job.fields, decoded);
    transport.send(&outbound).await?;

    Ok(())
}
