//! Typed error handling for the dispatch pipeline.
//!
//! The taxonomy separates failures by where they surface:
//! - Submission errors are synchronous and reach the caller before any
//!   queue interaction.
//! - Execution errors stay inside the job: transient transport failures
//!   are retried, everything else is terminal and reported through the
//!   failure logger.

use thiserror::Error;

use crate::transport::TransportError;

/// An attachment whose encoded payload exceeds the configured bound.
///
/// Raised by the size guard before the job is created, so oversize
/// payloads never occupy queue capacity. The bound is checked against
/// the *encoded* string length, which conservatively over-approximates
/// the decoded size.
#[derive(Debug, Error)]
#[error(
    "attachment {index} ({}) exceeds the maximum encoded size: {encoded_len} > {max_size} bytes",
    .disposition.as_deref().unwrap_or("unnamed")
)]
pub struct OversizeError {
    /// Position of the offending attachment in the submitted sequence.
    pub index: usize,
    /// Disposition hint of the offending attachment, if any.
    pub disposition: Option<String>,
    /// Length of the encoded payload string.
    pub encoded_len: usize,
    /// The configured maximum.
    pub max_size: usize,
}

/// An attachment payload that is not valid base64.
///
/// Malformed input will not become valid on retry, so this is always
/// terminal for the job that hits it.
#[derive(Debug, Error)]
#[error("attachment {index} is not valid base64")]
pub struct DecodeError {
    /// Position of the offending attachment in the job's sequence.
    pub index: usize,
    #[source]
    pub source: base64::DecodeError,
}

/// Errors surfaced synchronously by [`Dispatcher::submit`].
///
/// [`Dispatcher::submit`]: crate::Dispatcher::submit
#[derive(Debug, Error)]
pub enum SubmitError {
    /// An attachment failed the size guard.
    #[error(transparent)]
    Oversize(#[from] OversizeError),

    /// The message has no sender address.
    #[error("message has no sender")]
    MissingSender,

    /// The message has no recipients.
    #[error("message has no recipients")]
    NoRecipients,

    /// The dispatch worker is gone and the queue no longer accepts jobs.
    #[error("dispatch queue is closed")]
    QueueClosed,
}

/// Errors occurring while a dispatch job executes.
///
/// These are interpreted by the retry policy and never re-surfaced to
/// the submitting caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An attachment could not be decoded. Fatal, never retried.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The transport rejected the send. Retried when the policy
    /// classifies the error kind as transient.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors from running the dispatcher's worker loop.
#[derive(Debug, Error)]
pub enum ServeError {
    /// [`Dispatcher::serve`] was called twice on the same dispatcher.
    ///
    /// [`Dispatcher::serve`]: crate::Dispatcher::serve
    #[error("dispatcher is already serving")]
    AlreadyRunning,
}
