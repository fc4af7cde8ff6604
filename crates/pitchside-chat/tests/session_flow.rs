//! End-to-end tests for the chat session.
//!
//! Each test drives a fresh session through the public API only, with the
//! response delay set to zero so a turn completes on the next scheduler
//! pass.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use pitchside_chat::{
    ChatError, ChatSession, Matcher, Responder, Rule, RuleResponder, RuleTable, SessionPhase,
    DEFAULT_FALLBACK_RESPONSE,
};
use pitchside_core::config::{ChatConfig, RuleConfig};
use pitchside_core::events::ChatEvent;
use pitchside_core::types::{MessageRole, Visibility};

// =============================================================================
// Helpers
// =============================================================================

fn config() -> ChatConfig {
    ChatConfig {
        response_delay_ms: 0,
        ..ChatConfig::default()
    }
}

fn liverpool_config() -> ChatConfig {
    ChatConfig {
        rules: vec![RuleConfig {
            name: "lfc".to_string(),
            keywords: vec!["liverpool".to_string()],
            response: "T1".to_string(),
        }],
        fallback_response: Some("DEFAULT".to_string()),
        ..config()
    }
}

/// Echoes the query back after a short sleep.
struct EchoResponder;

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, query: &str) -> String {
        tokio::time::sleep(Duration::from_millis(5)).await;
        format!("echo: {}", query)
    }
}

/// Answers without yielding, so the reply task races the submitting thread.
struct InstantResponder;

#[async_trait]
impl Responder for InstantResponder {
    async fn respond(&self, query: &str) -> String {
        format!("re: {}", query)
    }
}

// =============================================================================
// Matching through the session
// =============================================================================

#[tokio::test]
async fn configured_rules_answer_and_fall_back() {
    let session = ChatSession::new(&liverpool_config()).unwrap();

    session.submit("Tell me about Liverpool's form").unwrap();
    session.wait_idle().await;
    session.submit("anything else").unwrap();
    session.wait_idle().await;

    let replies: Vec<String> = session
        .messages()
        .iter()
        .skip(1)
        .filter(|m| m.role() == MessageRole::Assistant)
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(replies, vec!["T1".to_string(), "DEFAULT".to_string()]);
}

#[tokio::test]
async fn builtin_rules_cover_every_quick_question() {
    let session = ChatSession::new(&config()).unwrap();
    let count = session.quick_questions().len();

    for i in 0..count {
        session.submit_quick_question(i).unwrap();
        session.wait_idle().await;
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 1 + 2 * count);
    for reply in messages.iter().skip(2).step_by(2) {
        assert_eq!(reply.role(), MessageRole::Assistant);
        assert_ne!(reply.content(), DEFAULT_FALLBACK_RESPONSE);
    }
}

#[test]
fn matcher_is_total_over_odd_input() {
    let matcher = Matcher::default();
    for q in ["", " ", "\n\t", "⚽⚽⚽", "ÇÇÇ", "chelsea", "arsenal"] {
        let answer = matcher.respond(q);
        assert!(!answer.is_empty());
        assert_eq!(answer, DEFAULT_FALLBACK_RESPONSE, "query {:?}", q);
    }
}

// =============================================================================
// State machine
// =============================================================================

#[tokio::test]
async fn empty_then_real_submission() {
    let session = ChatSession::new(&config()).unwrap();
    let before = session.message_count();

    assert!(matches!(session.submit(""), Err(ChatError::EmptySubmission)));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.message_count(), before);

    session.submit("hello").unwrap();
    assert_eq!(session.phase(), SessionPhase::AwaitingResponse);

    session.wait_idle().await;
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.message_count(), before + 2);
}

#[tokio::test]
async fn busy_submission_does_not_redirect_pending_reply() {
    let session = ChatSession::new(&liverpool_config()).unwrap();

    session.submit("Liverpool tonight?").unwrap();
    assert!(matches!(
        session.submit("something else"),
        Err(ChatError::SubmissionWhileBusy)
    ));
    assert_eq!(session.message_count(), 2);

    session.wait_idle().await;
    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content(), "Liverpool tonight?");
    assert_eq!(messages[2].content(), "T1");
}

#[tokio::test]
async fn message_ids_strictly_increase() {
    let session = ChatSession::new(&config()).unwrap();
    for q in ["one", "two", "three"] {
        session.submit(q).unwrap();
        session.wait_idle().await;
    }
    let ids: Vec<u64> = session.messages().iter().map(|m| m.id()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids.first(), Some(&1));
}

#[tokio::test]
async fn cancelled_turn_never_appends() {
    let session = ChatSession::with_responder(&config(), Arc::new(EchoResponder));

    session.submit("first").unwrap();
    assert!(session.cancel_pending());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.message_count(), 2);
    assert!(!session.is_awaiting_response());

    session.submit("second").unwrap();
    session.wait_idle().await;
    let last = session.messages().pop().unwrap();
    assert_eq!(last.content(), "echo: second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn turns_complete_on_multi_thread_runtime() {
    let session = ChatSession::with_responder(&config(), Arc::new(EchoResponder));
    for i in 0..10 {
        session.submit(&format!("q{}", i)).unwrap();
        session.wait_idle().await;
    }
    let messages = session.messages();
    assert_eq!(messages.len(), 21);
    assert_eq!(messages[20].content(), "echo: q9");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn events_follow_mutation_order_across_threads() {
    let session = ChatSession::with_responder(&config(), Arc::new(InstantResponder));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = session.subscribe(move |e: &ChatEvent| {
        sink.lock().unwrap().push(e.clone());
    });

    for turn in 0..500u64 {
        seen.lock().unwrap().clear();
        session.submit("ping").unwrap();
        session.wait_idle().await;

        let events = seen.lock().unwrap().clone();
        let appended: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::MessageAppended { message_id, .. } => Some(*message_id),
                _ => None,
            })
            .collect();
        let user_id = 2 + 2 * turn;
        assert_eq!(appended, vec![user_id, user_id + 1], "turn {}", turn);

        let awaiting: Vec<bool> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::PhaseChanged { awaiting, .. } => Some(*awaiting),
                _ => None,
            })
            .collect();
        assert_eq!(awaiting, vec![true, false], "turn {}", turn);
        assert!(!session.is_awaiting_response());
    }
}

#[tokio::test]
async fn default_delay_keeps_session_busy() {
    let session = ChatSession::new(&ChatConfig {
        response_delay_ms: 50,
        ..ChatConfig::default()
    })
    .unwrap();

    session.submit("Liverpool?").unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(session.is_awaiting_response());

    session.wait_idle().await;
    assert_eq!(session.message_count(), 3);
}

// =============================================================================
// Visibility and listeners
// =============================================================================

#[tokio::test]
async fn visibility_is_orthogonal_to_turns() {
    let session = ChatSession::new(&config()).unwrap();

    session.open();
    session.open();
    assert_eq!(session.visibility(), Visibility::Expanded);

    session.submit("Chelsea vs Arsenal").unwrap();
    session.minimize();
    assert!(session.is_awaiting_response());
    assert_eq!(session.visibility(), Visibility::Minimized);

    session.wait_idle().await;
    assert_eq!(session.visibility(), Visibility::Minimized);
    assert!(session.messages()[2]
        .content()
        .starts_with("Chelsea vs Arsenal Prediction:"));
}

#[tokio::test]
async fn listener_sees_full_turn() {
    let session = ChatSession::new(&config()).unwrap();
    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&names);
    let subscription = session.subscribe(move |e: &ChatEvent| {
        sink.lock().unwrap().push(e.event_name());
    });

    session.ask("Liverpool?").unwrap();
    session.wait_idle().await;
    assert!(subscription.unsubscribe());
    session.close();

    assert_eq!(
        *names.lock().unwrap(),
        vec![
            "visibility_changed",
            "message_appended",
            "phase_changed",
            "message_appended",
            "phase_changed",
        ]
    );
}

#[tokio::test]
async fn custom_table_through_rule_responder() {
    let table = RuleTable::new(
        vec![
            Rule::new("derby", ["galatasaray", "fenerbahçe"], "derby").unwrap(),
            Rule::new("gala", ["galatasaray"], "gala").unwrap(),
        ],
        "none",
    )
    .unwrap();
    let responder = RuleResponder::new(Matcher::new(table), Duration::ZERO);
    let session = ChatSession::with_responder(&config(), Arc::new(responder));

    for q in [
        "Galatasaray vs FENERBAHÇE",
        "Galatasaray vs Fenerbahce",
        "Besiktas",
    ] {
        session.submit(q).unwrap();
        session.wait_idle().await;
    }

    let replies: Vec<String> = session
        .messages()
        .iter()
        .skip(2)
        .step_by(2)
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(replies, vec!["derby", "gala", "none"]);
}
