//! Retry and failure policy.
//!
//! Transport errors are classified into retryable and fatal by kind,
//! against a configurable set. Retries use a fixed countdown; the
//! number of redeliveries is bounded by `max_retries`.

use std::time::Duration;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::DispatchError,
    job::{DispatchJob, JobState},
    transport::{TransportError, TransportErrorKind},
};

/// Classification of a transport error under a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to potentially succeed on redelivery.
    Retryable,
    /// Will not be resolved by retrying.
    Fatal,
}

/// Retry behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of redeliveries after the first attempt.
    ///
    /// Default: 3
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed delay before a redelivery, in seconds.
    ///
    /// Default: 180 seconds
    #[serde(default = "defaults::retry_countdown_secs")]
    pub retry_countdown_secs: u64,

    /// Transport error kinds that count as transient.
    ///
    /// Default: recipients-refused, helo-failed, sender-refused,
    /// data-failed, command-not-supported
    #[serde(default = "defaults::retryable_errors")]
    pub retryable_errors: AHashSet<TransportErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            retry_countdown_secs: defaults::retry_countdown_secs(),
            retryable_errors: defaults::retryable_errors(),
        }
    }
}

impl RetryPolicy {
    /// Classify a transport error against the configured retryable set.
    #[must_use]
    pub fn classify(&self, error: &TransportError) -> ErrorClass {
        if self.retryable_errors.contains(&error.kind()) {
            ErrorClass::Retryable
        } else {
            ErrorClass::Fatal
        }
    }

    /// Whether a job with `retry_count` redeliveries so far may be
    /// retried again.
    #[must_use]
    pub const fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// The delay before a redelivery.
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        Duration::from_secs(self.retry_countdown_secs)
    }

    /// Decide the state a failed execution moves the job into.
    ///
    /// A retryable transport error with retry budget left yields
    /// `Retrying`; anything else (fatal kinds, decode failures,
    /// exhausted retries) is terminal `Failed`.
    #[must_use]
    pub fn next_state(&self, job: &DispatchJob, error: &DispatchError) -> JobState {
        match error {
            DispatchError::Transport(transport_error)
                if self.classify(transport_error) == ErrorClass::Retryable
                    && self.should_retry(job.retry_count) =>
            {
                JobState::Retrying {
                    attempts: job.retry_count + 1,
                    last_error: error.to_string(),
                }
            }
            _ => JobState::Failed(error.to_string()),
        }
    }
}

mod defaults {
    use ahash::AHashSet;

    use crate::transport::TransportErrorKind;

    pub const fn max_retries() -> u32 {
        3
    }

    pub const fn retry_countdown_secs() -> u64 {
        180 // 3 minutes
    }

    pub fn retryable_errors() -> AHashSet<TransportErrorKind> {
        [
            TransportErrorKind::RecipientsRefused,
            TransportErrorKind::HeloFailed,
            TransportErrorKind::SenderRefused,
            TransportErrorKind::DataFailed,
            TransportErrorKind::CommandNotSupported,
        ]
        .into_iter()
        .collect()
    }
}

/// Report a terminal failure.
///
/// Always emits one error-level event. When `log_bodies` is set the
/// message body (and attachment list, if present) is additionally
/// logged at info level for postmortem inspection. That flag trades
/// message confidentiality in the logs for debuggability and is off by
/// default.
pub fn report_final_failure(job: &DispatchJob, error: &DispatchError, log_bodies: bool) {
    error!(
        job_id = %job.id,
        retry_count = job.retry_count,
        error = %error,
        "message could not be dispatched"
    );

    if log_bodies {
        info!(
            job_id = %job.id,
            subject = %job.fields.subject,
            body = %job.fields.body,
            "failed message body"
        );

        if !job.attachments.is_empty() {
            let listing = job
                .attachments
                .iter()
                .map(|spec| {
                    format!(
                        "{} ({})",
                        spec.disposition.as_deref().unwrap_or("unnamed"),
                        spec.content_type
                            .as_deref()
                            .unwrap_or(crate::attachment::DEFAULT_CONTENT_TYPE),
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");

            info!(
                job_id = %job.id,
                attachments = %listing,
                "failed message attachments"
            );
        }
    }
}
