//! Submission entry point and queue integration.
//!
//! The dispatcher owns the channel that plays the role of the task
//! queue: `submit` guards and enqueues, `serve` drains the queue and
//! executes each job on its own task. A `Retrying` outcome is handled
//! entirely at this layer: the job is redelivered after the policy's
//! countdown with its retry count incremented, so the job itself never
//! sleeps or signals retries through errors.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info};
use ulid::Ulid;

use crate::{
    attachment::{self, AttachmentSpec},
    config::MailConfig,
    error::{ServeError, SubmitError},
    job::{self, DispatchJob, JobState},
    message::MessageFields,
    policy::{self, RetryPolicy},
    transport::Transport,
};

/// Control signal for the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Stop accepting queued jobs and exit the loop. Jobs already
    /// executing run to completion on their own tasks.
    Shutdown,
}

/// A job travelling through the queue with its state channel.
struct QueuedJob {
    job: DispatchJob,
    state: watch::Sender<JobState>,
}

/// Handle returned by [`Dispatcher::submit`].
///
/// Submission is fire-and-forget: execution errors are never
/// re-surfaced here. The handle only identifies the job and lets
/// interested callers observe its state transitions.
#[derive(Debug)]
pub struct JobHandle {
    /// The job's identifier.
    pub id: Ulid,
    state: watch::Receiver<JobState>,
}

impl JobHandle {
    /// The job's current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Wait until the job reaches a terminal state and return it.
    ///
    /// If the dispatcher goes away mid-flight the last observed state
    /// is returned instead.
    pub async fn finished(&mut self) -> JobState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}

struct Shared {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    max_attachment_size: usize,
    log_failed_messages: bool,
    /// Sender side of the queue, kept for retry redelivery.
    tx: mpsc::UnboundedSender<QueuedJob>,
}

/// The dispatch component: size guard, queue and worker loop.
pub struct Dispatcher {
    shared: Arc<Shared>,
    rx: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<QueuedJob>>>,
}

impl Dispatcher {
    /// Create a dispatcher sending through `transport`.
    ///
    /// The transport is injected here and nowhere else; there is no
    /// global registry.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: &MailConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            shared: Arc::new(Shared {
                transport,
                policy: config.retry.clone(),
                max_attachment_size: config.max_attachment_size,
                log_failed_messages: config.log_failed_messages,
                tx,
            }),
            rx: tokio::sync::Mutex::new(Some(rx)),
        }
    }

    /// Submit a message for dispatch.
    ///
    /// Field invariants and the attachment size guard run here,
    /// synchronously, before anything touches the queue; an oversize
    /// attachment means no job is ever created. Past this point the
    /// submission is fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] for invariant violations, an oversize
    /// attachment, or a closed queue.
    pub fn submit(
        &self,
        fields: MessageFields,
        attachments: Vec<AttachmentSpec>,
    ) -> Result<JobHandle, SubmitError> {
        fields.validate()?;
        attachment::check_size(&attachments, self.shared.max_attachment_size)?;

        let job = DispatchJob::new(fields, attachments);
        let id = job.id;
        let (state_tx, state_rx) = watch::channel(JobState::Pending);

        if self.shared.tx.send(QueuedJob { job, state: state_tx }).is_err() {
            return Err(SubmitError::QueueClosed);
        }

        debug!(job_id = %id, "job enqueued");
        Ok(JobHandle { id, state: state_rx })
    }

    /// Run the worker loop until a shutdown signal arrives.
    ///
    /// Each queued job executes on its own task; jobs are independent
    /// and share no mutable state. There is no ordering guarantee
    /// between jobs, but a redelivery of the same job never happens
    /// before its countdown has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::AlreadyRunning`] if the loop was already
    /// started on this dispatcher.
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<Signal>) -> Result<(), ServeError> {
        let Some(mut rx) = self.rx.lock().await.take() else {
            return Err(ServeError::AlreadyRunning);
        };

        info!("dispatch worker starting");

        loop {
            tokio::select! {
                queued = rx.recv() => {
                    // The shared half holds a sender, so the channel
                    // cannot close while we are alive.
                    let Some(queued) = queued else { break };
                    let shared = Arc::clone(&self.shared);
                    tokio::spawn(execute(shared, queued));
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            info!("dispatch worker received shutdown signal");
                        }
                        Err(e) => {
                            error!("dispatch worker shutdown channel error: {e}");
                        }
                    }
                    break;
                }
            }
        }

        info!("dispatch worker stopped");
        Ok(())
    }
}

/// Execute one delivery attempt and interpret the outcome.
async fn execute(shared: Arc<Shared>, queued: QueuedJob) {
    let QueuedJob { job, state } = queued;

    // Watchers may have dropped their handle; state updates are then
    // no-ops, which is fine for fire-and-forget submissions.
    let _ = state.send(JobState::Running);

    match job::run(&job, shared.transport.as_ref()).await {
        Ok(()) => {
            info!(
                job_id = %job.id,
                delivery_attempt = job.retry_count + 1,
                "message dispatched"
            );
            let _ = state.send(JobState::Succeeded);
        }
        Err(dispatch_error) => match shared.policy.next_state(&job, &dispatch_error) {
            JobState::Retrying {
                attempts,
                last_error,
            } => {
                let countdown = shared.policy.countdown();
                info!(
                    job_id = %job.id,
                    delivery_attempt = job.retry_count + 1,
                    retry_in_secs = countdown.as_secs(),
                    error = %dispatch_error,
                    "transient transport failure, scheduling redelivery"
                );
                let _ = state.send(JobState::Retrying {
                    attempts,
                    last_error,
                });

                let tx = shared.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(countdown).await;

                    let mut job = job;
                    job.retry_count += 1;
                    let _ = state.send(JobState::Pending);
                    // Send only fails when the worker is gone; the job
                    // is dropped with it.
                    let _ = tx.send(QueuedJob { job, state });
                });
            }
            terminal => {
                policy::report_final_failure(&job, &dispatch_error, shared.log_failed_messages);
                let _ = state.send(terminal);
            }
        },
    }
}
