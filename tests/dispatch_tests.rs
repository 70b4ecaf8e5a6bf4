//! End-to-end dispatch scenarios against a scripted mock transport.

mod support;

use std::{sync::Arc, time::Duration};

use postrider::{
    AttachmentSpec, Dispatcher, JobState, MailConfig, MessageFields, RetryPolicy, Signal,
    SubmitError, TransportError,
};
use support::mock_transport::{MockTransport, recipients_refused};
use tokio::sync::broadcast;

fn fields() -> MessageFields {
    MessageFields {
        subject: "Greetings".to_string(),
        body: "Plain body".to_string(),
        sender: "b@x.com".to_string(),
        recipients: vec!["a@x.com".to_string()],
        ..MessageFields::default()
    }
}

/// Two redeliveries, immediate countdown: keeps the retry scenarios fast.
fn test_config() -> MailConfig {
    MailConfig {
        retry: RetryPolicy {
            max_retries: 2,
            retry_countdown_secs: 0,
            ..RetryPolicy::default()
        },
        ..MailConfig::default()
    }
}

fn spawn_dispatcher(
    transport: Arc<MockTransport>,
    config: &MailConfig,
) -> (Arc<Dispatcher>, broadcast::Sender<Signal>) {
    let dispatcher = Arc::new(Dispatcher::new(transport, config));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let worker = Arc::clone(&dispatcher);
    tokio::spawn(async move { worker.serve(shutdown_rx).await });

    (dispatcher, shutdown_tx)
}

async fn finished(handle: &mut postrider::JobHandle) -> JobState {
    tokio::time::timeout(Duration::from_secs(5), handle.finished())
        .await
        .expect("job did not reach a terminal state in time")
}

#[tokio::test]
async fn oversize_attachment_is_rejected_before_enqueue() {
    let transport = Arc::new(MockTransport::succeeding());
    let config = MailConfig {
        max_attachment_size: 16,
        ..test_config()
    };
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &config);

    let oversize = AttachmentSpec::from_bytes(&[0u8; 64], None, Some("huge.bin".to_string()));
    let result = dispatcher.submit(fields(), vec![oversize]);

    match result {
        Err(SubmitError::Oversize(err)) => {
            assert_eq!(err.index, 0);
            assert_eq!(err.disposition.as_deref(), Some("huge.bin"));
            assert_eq!(err.max_size, 16);
        }
        other => panic!("expected an oversize rejection, got {other:?}"),
    }

    // Nothing was enqueued, so nothing can ever reach the transport.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn missing_sender_is_rejected_synchronously() {
    let transport = Arc::new(MockTransport::succeeding());
    let (dispatcher, _shutdown) = spawn_dispatcher(transport, &test_config());

    let invalid = MessageFields {
        sender: String::new(),
        ..fields()
    };
    assert!(matches!(
        dispatcher.submit(invalid, Vec::new()),
        Err(SubmitError::MissingSender)
    ));
}

#[tokio::test]
async fn empty_recipients_are_rejected_synchronously() {
    let transport = Arc::new(MockTransport::succeeding());
    let (dispatcher, _shutdown) = spawn_dispatcher(transport, &test_config());

    let invalid = MessageFields {
        recipients: Vec::new(),
        ..fields()
    };
    assert!(matches!(
        dispatcher.submit(invalid, Vec::new()),
        Err(SubmitError::NoRecipients)
    ));
}

#[tokio::test]
async fn succeeds_after_two_transient_failures() {
    let transport = Arc::new(MockTransport::scripted(vec![
        Err(recipients_refused()),
        Err(recipients_refused()),
    ]));
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let mut handle = dispatcher.submit(fields(), Vec::new()).unwrap();
    assert_eq!(finished(&mut handle).await, JobState::Succeeded);

    // Two retries after the first attempt: three sends in total.
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test]
async fn exhausted_retries_end_in_failure() {
    let transport = Arc::new(MockTransport::scripted(vec![
        Err(recipients_refused()),
        Err(recipients_refused()),
        Err(recipients_refused()),
    ]));
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let mut handle = dispatcher.submit(fields(), Vec::new()).unwrap();
    let state = finished(&mut handle).await;

    assert!(matches!(state, JobState::Failed(_)));
    // max_retries = 2 allows exactly three attempts.
    assert_eq!(transport.attempts(), 3);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn fatal_transport_error_is_not_retried() {
    let transport = Arc::new(MockTransport::scripted(vec![Err(
        TransportError::MessageRejected("551 rejected as spam".to_string()),
    )]));
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let mut handle = dispatcher.submit(fields(), Vec::new()).unwrap();
    let state = finished(&mut handle).await;

    assert!(matches!(state, JobState::Failed(_)));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test]
async fn invalid_base64_fails_without_touching_the_transport() {
    let transport = Arc::new(MockTransport::succeeding());
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let malformed = AttachmentSpec {
        base64_payload: "*** not base64 ***".to_string(),
        content_type: None,
        disposition: None,
    };
    let mut handle = dispatcher.submit(fields(), vec![malformed]).unwrap();
    let state = finished(&mut handle).await;

    assert!(matches!(state, JobState::Failed(_)));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn assembled_message_reaches_the_transport_intact() {
    let transport = Arc::new(MockTransport::succeeding());
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let submitted = MessageFields {
        cc: Some(vec!["cc@x.com".to_string()]),
        ..fields()
    };
    let attachments = vec![
        AttachmentSpec::from_bytes(b"first", None, Some("a.txt".to_string())),
        AttachmentSpec::from_bytes(b"second", Some("text/plain".to_string()), None),
    ];

    let mut handle = dispatcher.submit(submitted, attachments).unwrap();
    assert_eq!(finished(&mut handle).await, JobState::Succeeded);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);

    let message = &sent[0];
    assert_eq!(message.subject, "Greetings");
    assert_eq!(message.sender, "b@x.com");
    assert_eq!(message.recipients, vec!["a@x.com".to_string()]);
    assert_eq!(message.cc, vec!["cc@x.com".to_string()]);
    // cc was set; every other optional slot stays at its default.
    assert!(message.bcc.is_empty());
    assert_eq!(message.charset, None);
    assert!(message.extra_headers.is_empty());

    assert_eq!(message.attachments.len(), 2);
    assert_eq!(message.attachments[0].data, b"first");
    assert_eq!(message.attachments[0].disposition.as_deref(), Some("a.txt"));
    assert_eq!(message.attachments[1].data, b"second");
    assert_eq!(message.attachments[1].content_type, "text/plain");
}

#[tokio::test]
async fn attachments_are_redecoded_on_each_attempt() {
    let transport = Arc::new(MockTransport::scripted(vec![Err(recipients_refused())]));
    let (dispatcher, _shutdown) = spawn_dispatcher(Arc::clone(&transport), &test_config());

    let attachments = vec![AttachmentSpec::from_bytes(b"payload", None, None)];
    let mut handle = dispatcher.submit(fields(), attachments).unwrap();
    assert_eq!(finished(&mut handle).await, JobState::Succeeded);

    assert_eq!(transport.attempts(), 2);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments[0].data, b"payload");
}

#[tokio::test]
async fn shutdown_stops_the_worker() {
    let transport = Arc::new(MockTransport::succeeding());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&transport) as Arc<dyn postrider::Transport>,
        &test_config(),
    ));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let worker = Arc::clone(&dispatcher);
    let serve = tokio::spawn(async move { worker.serve(shutdown_rx).await });

    shutdown_tx.send(Signal::Shutdown).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), serve)
        .await
        .expect("worker did not shut down in time");
    assert!(result.unwrap().is_ok());
}

#[tokio::test]
async fn serve_can_only_run_once() {
    let transport = Arc::new(MockTransport::succeeding());
    let (dispatcher, _shutdown) = spawn_dispatcher(transport, &test_config());

    // Give the first serve a chance to claim the receiver.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (_tx, rx) = broadcast::channel(1);
    assert!(matches!(
        dispatcher.serve(rx).await,
        Err(postrider::ServeError::AlreadyRunning)
    ));
}
