//! Scripted mock transport for dispatch scenarios.
//!
//! The script is a queue of per-attempt responses, consumed in order;
//! once exhausted, every further attempt succeeds. Sent messages and
//! the attempt count are recorded for verification.
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use postrider::{OutboundMessage, Transport, TransportError};

#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: AtomicUsize,
}

impl MockTransport {
    /// A transport that accepts every message.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// A transport that answers attempts with `responses` in order,
    /// then succeeds.
    pub fn scripted(responses: Vec<Result<(), TransportError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of send attempts seen so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages that were accepted.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let response = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(Ok(()));

        if response.is_ok()
            && let Ok(mut sent) = self.sent.lock()
        {
            sent.push(message.clone());
        }

        response
    }
}

/// A recipients-refused error, the canonical transient failure.
pub fn recipients_refused() -> TransportError {
    TransportError::RecipientsRefused("550 user unknown".to_string())
}
