//! Background request dispatch.
//!
//! Each request runs on its own tokio task that owns a copy of the prompt and
//! the credential. Results come back through a single-consumer queue that the
//! UI loop drains; nothing here touches session state. Every dispatched
//! request yields exactly one completion, even when the gateway panics.

use std::collections::HashMap;
use std::sync::Arc;

use neurocura_llm::{ChatGateway, LlmError};
use neurocura_observability::create_session_span;
use tokio::sync::mpsc;
use tracing::{debug, error, Instrument};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// What to do with the reply once it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Append as a new assistant message
    Reply,
    /// Insert at the position of the discarded reply
    Regenerate { index: usize },
}

/// Handle to one outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub id: Uuid,
    pub session_id: String,
    pub kind: RequestKind,
}

/// Result of one request, produced by the worker task
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub outcome: Result<String, LlmError>,
}

/// Spawns gateway requests and collects their completions
pub struct RequestDispatcher {
    gateway: Arc<dyn ChatGateway>,
    credentials: Arc<str>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// session id -> ticket id of the request in flight
    in_flight: HashMap<String, Uuid>,
}

impl RequestDispatcher {
    pub fn new(gateway: Arc<dyn ChatGateway>, credentials: impl Into<String>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            credentials: Arc::from(credentials.into()),
            completion_tx,
            completion_rx,
            in_flight: HashMap::new(),
        }
    }

    /// Whether a request for this session has not been collected yet
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.in_flight.contains_key(session_id)
    }

    /// Fails with `RequestInFlight` when the session is busy
    pub fn ensure_idle(&self, session_id: &str) -> CoreResult<()> {
        if self.is_busy(session_id) {
            return Err(CoreError::RequestInFlight {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// Number of requests dispatched but not yet collected
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Start a request on a background task
    pub fn dispatch(
        &mut self,
        session_id: &str,
        prompt: impl Into<String>,
        kind: RequestKind,
    ) -> CoreResult<RequestTicket> {
        self.ensure_idle(session_id)?;

        let ticket = RequestTicket {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            kind,
        };
        self.in_flight.insert(ticket.session_id.clone(), ticket.id);

        let prompt = prompt.into();
        let gateway = Arc::clone(&self.gateway);
        let credentials = Arc::clone(&self.credentials);
        let tx = self.completion_tx.clone();
        let task_ticket = ticket.clone();
        let span = create_session_span(session_id, Some(&ticket.id.to_string()));

        tokio::spawn(
            async move {
                debug!(kind = ?task_ticket.kind, "Request started");
                let request = tokio::spawn(
                    async move { gateway.request(&prompt, &credentials).await }.in_current_span(),
                );
                let outcome = match request.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Gateway task failed: {}", e);
                        Err(LlmError::Aborted(e.to_string()))
                    }
                };
                debug!(ok = outcome.is_ok(), "Request finished");
                // The receiver lives as long as the dispatcher.
                let _ = tx.send(Completion {
                    ticket: task_ticket,
                    outcome,
                });
            }
            .instrument(span),
        );

        Ok(ticket)
    }

    /// Take one finished completion without waiting
    pub fn try_next(&mut self) -> Option<Completion> {
        let completion = self.completion_rx.try_recv().ok()?;
        self.settle(&completion);
        Some(completion)
    }

    /// Wait for the next completion
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight.is_empty() {
            return self.try_next();
        }
        let completion = self.completion_rx.recv().await?;
        self.settle(&completion);
        Some(completion)
    }

    fn settle(&mut self, completion: &Completion) {
        let ticket = &completion.ticket;
        if self.in_flight.get(&ticket.session_id) == Some(&ticket.id) {
            self.in_flight.remove(&ticket.session_id);
        }
    }
}
