//! Chat controller.
//!
//! Owns the session manager and the request dispatcher. Every operation takes
//! a session id; there is no implicit current session. All state mutation
//! happens on the caller's task, worker tasks only produce [`Completion`]s.

use std::path::Path;

use neurocura_llm::LlmError;
use neurocura_session::{ChatSession, EditOutcome, Message, SessionError, SessionManager};
use tracing::{error, info, warn};

use crate::dispatcher::{Completion, RequestDispatcher, RequestKind, RequestTicket};
use crate::error::CoreResult;

/// Result of an edit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStatus {
    /// Blank text or identical text, nothing changed
    Ignored,
    /// Text changed, no reply to regenerate
    Edited,
    /// Text changed and the following reply is being regenerated
    Regenerating(RequestTicket),
}

/// Result of applying a completion
#[derive(Debug)]
pub enum ApplyOutcome {
    /// New reply appended at `index`
    Replied { session_id: String, index: usize },
    /// Regenerated reply inserted at `index`
    Regenerated { session_id: String, index: usize },
    /// The gateway failed; the session is left as it was
    Failed { session_id: String, error: LlmError },
    /// The session was deleted while the request was in flight
    Orphaned { session_id: String },
}

impl ApplyOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            ApplyOutcome::Replied { session_id, .. }
            | ApplyOutcome::Regenerated { session_id, .. }
            | ApplyOutcome::Failed { session_id, .. }
            | ApplyOutcome::Orphaned { session_id } => session_id,
        }
    }
}

pub struct ChatController {
    sessions: SessionManager,
    dispatcher: RequestDispatcher,
}

impl ChatController {
    pub fn new(sessions: SessionManager, dispatcher: RequestDispatcher) -> Self {
        Self {
            sessions,
            dispatcher,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Sessions ordered newest first
    pub fn list(&self) -> Vec<&ChatSession> {
        self.sessions.list()
    }

    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.get(session_id)
    }

    pub fn is_busy(&self, session_id: &str) -> bool {
        self.dispatcher.is_busy(session_id)
    }

    pub fn pending_requests(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Create and persist an empty session
    pub async fn new_chat(&mut self, title: Option<String>) -> CoreResult<ChatSession> {
        Ok(self.sessions.create(title).await?)
    }

    /// Append a user message and request a reply
    ///
    /// Blank input is ignored and returns `Ok(None)`.
    pub async fn send_message(
        &mut self,
        session_id: &str,
        text: &str,
    ) -> CoreResult<Option<RequestTicket>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.dispatcher.ensure_idle(session_id)?;

        self.sessions
            .require_mut(session_id)?
            .add_message(Message::user(text));
        self.sessions.persist(session_id).await?;

        let ticket = self
            .dispatcher
            .dispatch(session_id, text, RequestKind::Reply)?;
        info!(session_id, "Message sent");
        Ok(Some(ticket))
    }

    /// Edit a message, regenerating the following reply when there is one
    pub async fn edit_message(
        &mut self,
        session_id: &str,
        index: usize,
        text: &str,
    ) -> CoreResult<EditStatus> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(EditStatus::Ignored);
        }
        self.dispatcher.ensure_idle(session_id)?;

        let outcome = self
            .sessions
            .require_mut(session_id)?
            .edit_message(index, text)?;

        match outcome {
            EditOutcome::Unchanged => Ok(EditStatus::Ignored),
            EditOutcome::Edited => {
                self.sessions.persist(session_id).await?;
                Ok(EditStatus::Edited)
            }
            EditOutcome::Regenerate(regeneration) => {
                self.sessions.persist(session_id).await?;
                let ticket = self.dispatcher.dispatch(
                    session_id,
                    regeneration.prompt,
                    RequestKind::Regenerate {
                        index: regeneration.reply_index,
                    },
                )?;
                info!(session_id, index, "Regenerating reply");
                Ok(EditStatus::Regenerating(ticket))
            }
        }
    }

    /// Remove one message; neighbours are untouched
    pub async fn delete_message(&mut self, session_id: &str, index: usize) -> CoreResult<Message> {
        self.dispatcher.ensure_idle(session_id)?;

        let session = self.sessions.require_mut(session_id)?;
        let len = session.len();
        let removed = session
            .remove_message(index)
            .ok_or(SessionError::MessageIndexOutOfRange { index, len })?;
        self.sessions.persist(session_id).await?;
        Ok(removed)
    }

    /// Remove every message of a session
    pub async fn clear_chat(&mut self, session_id: &str) -> CoreResult<()> {
        self.dispatcher.ensure_idle(session_id)?;

        self.sessions.require_mut(session_id)?.clear();
        self.sessions.persist(session_id).await?;
        info!(session_id, "Chat cleared");
        Ok(())
    }

    /// Change the title; a blank title is ignored
    pub async fn rename_chat(&mut self, session_id: &str, title: &str) -> CoreResult<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }

        let session = self.sessions.require_mut(session_id)?;
        if session.title() == title {
            return Ok(false);
        }
        session.rename(title);
        self.sessions.persist(session_id).await?;
        Ok(true)
    }

    /// Delete a session and its file
    ///
    /// A reply still in flight for it is dropped when it arrives.
    pub async fn delete_chat(&mut self, session_id: &str) -> CoreResult<bool> {
        Ok(self.sessions.delete(session_id).await?)
    }

    /// Previous versions of a message followed by its current text
    pub fn edit_history(&self, session_id: &str, index: usize) -> CoreResult<Vec<String>> {
        let session = self.sessions.require(session_id)?;
        let message = session
            .message(index)
            .ok_or(SessionError::MessageIndexOutOfRange {
                index,
                len: session.len(),
            })?;

        let mut versions = message.edit_history().to_vec();
        versions.push(message.text().to_string());
        Ok(versions)
    }

    pub async fn import(&mut self, path: &Path) -> CoreResult<ChatSession> {
        Ok(self.sessions.import_transcript(path).await?)
    }

    pub async fn export(&self, session_id: &str, path: &Path) -> CoreResult<()> {
        Ok(self.sessions.export_transcript(session_id, path).await?)
    }

    /// Apply a completion to its session
    pub async fn apply(&mut self, completion: Completion) -> CoreResult<ApplyOutcome> {
        let Completion { ticket, outcome } = completion;
        let session_id = ticket.session_id;

        let Some(session) = self.sessions.get_mut(&session_id) else {
            warn!(session_id = %session_id, "Dropping reply for deleted session");
            return Ok(ApplyOutcome::Orphaned { session_id });
        };

        let text = match outcome {
            Ok(text) => text,
            Err(error) => {
                error!(session_id = %session_id, kind = error.kind(), "Request failed: {}", error);
                return Ok(ApplyOutcome::Failed { session_id, error });
            }
        };

        let applied = match ticket.kind {
            RequestKind::Reply => {
                session.add_message(Message::assistant(text));
                ApplyOutcome::Replied {
                    index: session.len() - 1,
                    session_id,
                }
            }
            RequestKind::Regenerate { index } => {
                let index = session.insert_message(index, Message::assistant(text));
                ApplyOutcome::Regenerated { index, session_id }
            }
        };

        self.sessions.persist(applied.session_id()).await?;
        Ok(applied)
    }

    /// Apply every completion that is already available
    pub async fn pump(&mut self) -> Vec<CoreResult<ApplyOutcome>> {
        let mut results = Vec::new();
        while let Some(completion) = self.dispatcher.try_next() {
            results.push(self.apply(completion).await);
        }
        results
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<CoreResult<ApplyOutcome>> {
        let completion = self.dispatcher.next_completion().await?;
        Some(self.apply(completion).await)
    }
}
