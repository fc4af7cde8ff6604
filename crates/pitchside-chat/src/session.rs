//! Chat session controller.
//!
//! Owns one conversation: the transcript, the Idle/AwaitingResponse phase,
//! and the widget's visibility. All mutations go through a single lock and
//! queue their events while holding it; queued events are then delivered to
//! listeners in mutation order, one dispatcher at a time, with the lock
//! released. The only suspension
//! point is response production, which runs on a spawned task and re-enters
//! the session through a turn token so a cancelled or superseded reply can
//! never land in the transcript.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use pitchside_core::config::{BusyPolicy, ChatConfig};
use pitchside_core::events::ChatEvent;
use pitchside_core::types::{MessageRole, Timestamp, Visibility};

use crate::error::ChatError;
use crate::listeners::{Listener, ListenerRegistry, Subscription};
use crate::responder::{Responder, RuleResponder};
use crate::state::SessionPhase;
use crate::transcript::{Message, Transcript};

/// Point-in-time copy of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub is_awaiting_response: bool,
    pub visibility: Visibility,
}

struct PendingTurn {
    turn: u64,
    handle: JoinHandle<()>,
}

struct SessionState {
    transcript: Transcript,
    phase: SessionPhase,
    visibility: Visibility,
    pending: Option<PendingTurn>,
    next_turn: u64,
    /// Events recorded by mutations and not yet delivered.
    outbox: VecDeque<ChatEvent>,
    dispatching: bool,
}

impl SessionState {
    /// Idle with every event delivered.
    fn is_settled(&self) -> bool {
        !self.phase.is_awaiting() && self.outbox.is_empty() && !self.dispatching
    }

    fn transition(&mut self, target: SessionPhase) -> bool {
        if self.phase.can_transition_to(&target) {
            tracing::debug!("Session phase: {} -> {}", self.phase, target);
            self.phase = target;
            true
        } else {
            false
        }
    }
}

struct Shared {
    id: Uuid,
    enabled: bool,
    busy_policy: BusyPolicy,
    quick_questions: Vec<String>,
    responder: Arc<dyn Responder>,
    state: Mutex<SessionState>,
    listeners: Arc<ListenerRegistry>,
    phase_tx: watch::Sender<SessionPhase>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver queued events to listeners in the order they were recorded.
    ///
    /// At most one thread dispatches at a time. A caller that finds a
    /// dispatch in progress (another thread, or a listener mutating the
    /// session from inside its callback) leaves its events to that
    /// dispatcher. Waiters on the phase watch are woken once the dispatcher
    /// has drained the queue.
    fn dispatch(&self) {
        {
            let mut state = self.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let mut guard = DispatchGuard {
            shared: self,
            released: false,
        };

        loop {
            let batch: Vec<ChatEvent> = {
                let mut state = self.lock();
                if state.outbox.is_empty() {
                    state.dispatching = false;
                    guard.released = true;
                    return;
                }
                state.outbox.drain(..).collect()
            };
            self.listeners.emit(&batch);
        }
    }

    /// Append the reply for `turn` if that turn is still the pending one.
    fn complete(&self, turn: u64, reply: String) {
        {
            let mut state = self.lock();
            match state.pending.as_ref() {
                Some(pending) if pending.turn == turn => {}
                _ => {
                    tracing::debug!(
                        session_id = %self.id,
                        turn,
                        "Discarding reply for a turn that is no longer pending"
                    );
                    return;
                }
            }
            state.pending = None;
            let message_id = state.transcript.append(MessageRole::Assistant, reply).id();
            state.transition(SessionPhase::Idle);

            tracing::info!(session_id = %self.id, message_id, turn, "Assistant reply appended");
            let timestamp = Timestamp::now();
            state.outbox.push_back(ChatEvent::MessageAppended {
                session_id: self.id,
                message_id,
                role: MessageRole::Assistant,
                timestamp,
            });
            state.outbox.push_back(ChatEvent::PhaseChanged {
                session_id: self.id,
                awaiting: false,
                timestamp,
            });
        }
        self.dispatch();
    }
}

/// Ends a dispatch: releases the dispatcher role if a listener panicked,
/// then wakes `wait_idle` callers.
struct DispatchGuard<'a> {
    shared: &'a Shared,
    released: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let phase = {
            let mut state = self.shared.lock();
            if !self.released {
                state.dispatching = false;
            }
            state.phase
        };
        self.shared.phase_tx.send_replace(phase);
    }
}

/// A single chat widget session.
///
/// Created with one seeded assistant greeting, closed, and idle. Must be
/// driven from inside a tokio runtime for `submit` to be accepted.
pub struct ChatSession {
    shared: Arc<Shared>,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ChatSession")
            .field("id", &self.shared.id)
            .field("phase", &state.phase)
            .field("visibility", &state.visibility)
            .field("messages", &state.transcript.len())
            .finish()
    }
}

impl ChatSession {
    /// Create a session answering from the configured rule table.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        config.validate()?;
        let responder = RuleResponder::from_config(config)?;
        Ok(Self::with_responder(config, Arc::new(responder)))
    }

    /// Create a session with a custom response producer.
    pub fn with_responder(config: &ChatConfig, responder: Arc<dyn Responder>) -> Self {
        let id = Uuid::new_v4();
        let mut transcript = Transcript::new();
        transcript.append(MessageRole::Assistant, config.greeting.clone());
        let (phase_tx, _) = watch::channel(SessionPhase::Idle);

        tracing::info!(session_id = %id, "Chat session started");

        Self {
            shared: Arc::new(Shared {
                id,
                enabled: config.enabled,
                busy_policy: config.busy_policy,
                quick_questions: config.quick_questions.clone(),
                responder,
                state: Mutex::new(SessionState {
                    transcript,
                    phase: SessionPhase::Idle,
                    visibility: Visibility::Closed,
                    pending: None,
                    next_turn: 0,
                    outbox: VecDeque::new(),
                    dispatching: false,
                }),
                listeners: Arc::new(ListenerRegistry::default()),
                phase_tx,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    // -----------------------------------------------------------------
    // Turn-taking
    // -----------------------------------------------------------------

    /// Submit user text.
    ///
    /// On success the raw text is appended as a user message, the session
    /// enters `AwaitingResponse`, and the reply is produced on a spawned
    /// task. Returns the id of the appended user message.
    ///
    /// Blank text and submissions made while a reply is pending are
    /// rejected without touching the session.
    pub fn submit(&self, text: &str) -> Result<u64, ChatError> {
        if !self.shared.enabled {
            return Err(ChatError::Disabled);
        }
        if text.trim().is_empty() {
            tracing::debug!(session_id = %self.shared.id, "Ignoring empty submission");
            return Err(ChatError::EmptySubmission);
        }
        let runtime = Handle::try_current().map_err(|_| ChatError::NoRuntime)?;

        let message_id = {
            let mut state = self.shared.lock();
            if state.phase.is_awaiting() {
                match self.shared.busy_policy {
                    BusyPolicy::Reject => {
                        tracing::debug!(
                            session_id = %self.shared.id,
                            "Rejecting submission while a reply is pending"
                        );
                        return Err(ChatError::SubmissionWhileBusy);
                    }
                }
            }

            state.transition(SessionPhase::AwaitingResponse);
            let message_id = state.transcript.append(MessageRole::User, text).id();
            let turn = state.next_turn;
            state.next_turn += 1;

            let weak: Weak<Shared> = Arc::downgrade(&self.shared);
            let responder = Arc::clone(&self.shared.responder);
            let query = text.to_string();
            let handle = runtime.spawn(async move {
                let reply = responder.respond(&query).await;
                if let Some(shared) = weak.upgrade() {
                    shared.complete(turn, reply);
                }
            });
            state.pending = Some(PendingTurn { turn, handle });

            tracing::info!(session_id = %self.shared.id, message_id, turn, "Submission accepted");
            let timestamp = Timestamp::now();
            state.outbox.push_back(ChatEvent::MessageAppended {
                session_id: self.shared.id,
                message_id,
                role: MessageRole::User,
                timestamp,
            });
            state.outbox.push_back(ChatEvent::PhaseChanged {
                session_id: self.shared.id,
                awaiting: true,
                timestamp,
            });
            message_id
        };

        self.shared.dispatch();
        Ok(message_id)
    }

    /// Cancel the in-flight reply, if any, without appending anything.
    ///
    /// Returns true if a reply was pending.
    pub fn cancel_pending(&self) -> bool {
        {
            let mut state = self.shared.lock();
            let Some(pending) = state.pending.take() else {
                return false;
            };
            pending.handle.abort();
            state.transition(SessionPhase::Idle);

            tracing::info!(session_id = %self.shared.id, turn = pending.turn, "Pending reply cancelled");
            let timestamp = Timestamp::now();
            state.outbox.push_back(ChatEvent::ResponseCancelled {
                session_id: self.shared.id,
                timestamp,
            });
            state.outbox.push_back(ChatEvent::PhaseChanged {
                session_id: self.shared.id,
                awaiting: false,
                timestamp,
            });
        }
        self.shared.dispatch();
        true
    }

    /// Resolve once no reply is pending and listeners have been told so.
    pub async fn wait_idle(&self) {
        let shared = &self.shared;
        let mut rx = shared.phase_tx.subscribe();
        let _ = rx
            .wait_for(|_| shared.lock().is_settled())
            .await;
    }

    /// Open the widget expanded and submit `text` in one step.
    ///
    /// The widget stays open even when the submission is rejected.
    pub fn ask(&self, text: &str) -> Result<u64, ChatError> {
        self.open();
        self.expand();
        self.submit(text)
    }

    // -----------------------------------------------------------------
    // Quick questions
    // -----------------------------------------------------------------

    pub fn quick_questions(&self) -> &[String] {
        &self.shared.quick_questions
    }

    pub fn quick_question(&self, index: usize) -> Option<&str> {
        self.shared.quick_questions.get(index).map(String::as_str)
    }

    /// Submit the suggested prompt at `index`.
    pub fn submit_quick_question(&self, index: usize) -> Result<u64, ChatError> {
        let question = self
            .quick_question(index)
            .ok_or(ChatError::QuickQuestionOutOfRange(index))?;
        self.submit(question)
    }

    // -----------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------

    /// Closed -> expanded. No-op when already open.
    pub fn open(&self) -> bool {
        self.update_visibility(|v| match v {
            Visibility::Closed => Some(Visibility::Expanded),
            _ => None,
        })
    }

    /// Hide the widget. No-op when already closed.
    pub fn close(&self) -> bool {
        self.update_visibility(|v| v.is_open().then_some(Visibility::Closed))
    }

    /// Expanded -> minimized. No-op otherwise.
    pub fn minimize(&self) -> bool {
        self.update_visibility(|v| match v {
            Visibility::Expanded => Some(Visibility::Minimized),
            _ => None,
        })
    }

    /// Minimized -> expanded. No-op otherwise.
    pub fn expand(&self) -> bool {
        self.update_visibility(|v| match v {
            Visibility::Minimized => Some(Visibility::Expanded),
            _ => None,
        })
    }

    /// Flip between expanded and minimized while open.
    pub fn toggle_minimize(&self) -> bool {
        self.update_visibility(|v| match v {
            Visibility::Expanded => Some(Visibility::Minimized),
            Visibility::Minimized => Some(Visibility::Expanded),
            Visibility::Closed => None,
        })
    }

    fn update_visibility(&self, next: impl FnOnce(Visibility) -> Option<Visibility>) -> bool {
        {
            let mut state = self.shared.lock();
            let Some(visibility) = next(state.visibility) else {
                return false;
            };
            tracing::debug!(
                session_id = %self.shared.id,
                "Visibility: {} -> {}",
                state.visibility,
                visibility
            );
            state.visibility = visibility;
            state.outbox.push_back(ChatEvent::VisibilityChanged {
                session_id: self.shared.id,
                visibility,
                timestamp: Timestamp::now(),
            });
        }
        self.shared.dispatch();
        true
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    /// Register a listener for every state change.
    ///
    /// Events reach listeners in mutation order. When no other dispatch is in
    /// progress they are delivered before the mutating call returns.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChatEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.shared.listeners.add(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().phase
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.phase().is_awaiting()
    }

    pub fn visibility(&self) -> Visibility {
        self.shared.lock().visibility
    }

    /// Copy of the transcript in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.shared.lock().transcript.snapshot().to_vec()
    }

    pub fn message(&self, id: u64) -> Option<Message> {
        self.shared.lock().transcript.get(id).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.shared.lock().transcript.len()
    }

    pub fn state(&self) -> ConversationState {
        let state = self.shared.lock();
        ConversationState {
            messages: state.transcript.snapshot().to_vec(),
            is_awaiting_response: state.phase.is_awaiting(),
            visibility: state.visibility,
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if let Some(pending) = state.pending.take() {
            pending.handle.abort();
        }
        tracing::debug!(session_id = %self.shared.id, "Chat session closed");
    }
}

// =============================================================================
// Tests
// =============================================================================
