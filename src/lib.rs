//! Asynchronous email dispatch with bounded attachments and
//! transient-failure retry.
//!
//! Callers submit a message description (subject, recipients, body,
//! attachments, headers); the component guards attachment sizes,
//! decodes payloads, assembles an outbound message and hands it to a
//! [`Transport`]. Transient transport failures are retried after a
//! fixed countdown up to a configured bound; terminal failures are
//! reported through the failure logger.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use postrider::{Dispatcher, MailConfig, MessageFields, Signal};
//! # use postrider::{OutboundMessage, Transport, TransportError};
//! # struct Smtp;
//! # #[async_trait::async_trait]
//! # impl Transport for Smtp {
//! #     async fn send(&self, _: &OutboundMessage) -> Result<(), TransportError> { Ok(()) }
//! # }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MailConfig::default();
//! let dispatcher = Arc::new(Dispatcher::new(Arc::new(Smtp), &config));
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//! let worker = Arc::clone(&dispatcher);
//! tokio::spawn(async move { worker.serve(shutdown_rx).await });
//!
//! dispatcher.submit(
//!     MessageFields {
//!         subject: "Hello".into(),
//!         body: "Hi there".into(),
//!         sender: "noreply@example.org".into(),
//!         recipients: vec!["someone@example.org".into()],
//!         ..MessageFields::default()
//!     },
//!     Vec::new(),
//! )?;
//!
//! shutdown_tx.send(Signal::Shutdown)?;
//! # Ok(())
//! # }
//! ```

mod attachment;
mod config;
mod dispatcher;
mod error;
mod job;
pub mod logging;
mod message;
mod policy;
mod template;
mod transport;

pub use attachment::{AttachmentSpec, DEFAULT_CONTENT_TYPE, DecodedAttachment, check_size, decode};
pub use config::{ConfigError, MailConfig};
pub use dispatcher::{Dispatcher, JobHandle, Signal};
pub use error::{DecodeError, DispatchError, OversizeError, ServeError, SubmitError};
pub use job::{DispatchJob, JobState, run};
pub use message::{MessageFields, OutboundMessage, assemble};
pub use policy::{ErrorClass, RetryPolicy, report_final_failure};
pub use template::{TemplateError, TemplateRenderer, templated_fields};
pub use transport::{Transport, TransportError, TransportErrorKind};
