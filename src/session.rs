//! Interactive session state.
//!
//! A [`Session`] owns the conversation log and the orchestrator for the
//! lifetime of the process. One chat request may be in flight at a time;
//! the busy flag is the only concurrency control.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::analysis::{ConversationStore, EmotionChart, Turn, aggregate};
use crate::client::{ChatOrchestrator, HistoryPayload, StatsPayload};

/// Identifier of an interactive session, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A transient, dismissible failure message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Localized message.
    pub message: String,
    /// When the notice should disappear.
    pub expires_at: Instant,
}

impl Notice {
    /// Create a notice visible for `lifetime`.
    #[must_use]
    pub fn new(message: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + lifetime,
        }
    }

    /// Whether the notice should no longer be shown.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Result of a submission attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Input was blank; nothing happened.
    Ignored,
    /// Another request is in flight; nothing happened.
    Busy,
    /// The assistant turn that was appended.
    Replied(Arc<Turn>),
    /// The call failed; only the user turn was appended.
    Failed(Notice),
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State of one interactive session.
pub struct Session {
    id: SessionId,
    mode: String,
    orchestrator: ChatOrchestrator,
    store: ConversationStore,
    busy: AtomicBool,
}

impl Session {
    /// Start a session in the configured default mode.
    #[must_use]
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        let id = SessionId::new();
        let mode = orchestrator.config().default_mode.clone();
        tracing::info!(session = %id, %mode, "session started");
        Self {
            id,
            mode,
            orchestrator,
            store: ConversationStore::new(),
            busy: AtomicBool::new(false),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Active conversation mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Conversation log.
    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Whether a chat request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submit a message.
    ///
    /// The user turn is appended before the request starts. On failure the
    /// log keeps only the user turn and a notice is returned.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(_guard) = BusyGuard::claim(&self.busy) else {
            tracing::debug!(session = %self.id, "submission ignored while busy");
            return SubmitOutcome::Busy;
        };

        self.store.append(Turn::user(text, self.mode.as_str()));

        let payload = match self.orchestrator.send_chat(text, &self.mode).await {
            Ok(payload) => payload,
            Err(failure) => {
                return SubmitOutcome::Failed(Notice::new(
                    failure.message,
                    self.orchestrator.config().toast_duration,
                ));
            }
        };

        let turn = self
            .store
            .append(Turn::assistant_from_payload(&payload, &self.mode));
        tracing::info!(
            session = %self.id,
            emotions = turn.emotions.len(),
            source = turn.source.as_deref().unwrap_or("service"),
            "assistant turn appended"
        );
        SubmitOutcome::Replied(turn)
    }

    /// Fetch server-side history; failures are logged and yield `None`.
    pub async fn refresh_history(&self) -> Option<HistoryPayload> {
        self.orchestrator
            .fetch_history()
            .await
            .inspect_err(|failure| {
                tracing::warn!(session = %self.id, cause = %failure.cause, "history unavailable");
            })
            .ok()
            .map(|payload| HistoryPayload::from_value(&payload))
    }

    /// Fetch aggregated stats.
    ///
    /// # Errors
    /// Returns a notice when the stats cannot be obtained nor synthesized.
    pub async fn stats(&self) -> Result<StatsPayload, Notice> {
        self.orchestrator
            .fetch_stats()
            .await
            .map(|payload| StatsPayload::from_value(&payload))
            .map_err(|failure| {
                Notice::new(failure.message, self.orchestrator.config().toast_duration)
            })
    }

    /// Chart data for the current log.
    #[must_use]
    pub fn chart(&self) -> EmotionChart {
        aggregate(&self.store.all())
    }
}
