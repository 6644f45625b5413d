//! Integration tests for the chat session protocol.
//!
//! Sessions run on their own tasks over an in-memory channel transport,
//! the same way the server runs one task per WebSocket connection:
//! 1. Valid utterances get exactly one `AI: ` reply each
//! 2. Invalid frames get the protocol-error reply and the session goes on
//! 3. Concurrent sessions never see each other's frames or history

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use chat_relay::adapters::ai::{MockAIProvider, MockError, ProviderChatModel};
use chat_relay::application::{ChatSessionHandler, SessionOutcome, SessionSummary};
use chat_relay::domain::chat::OutboundFrame;
use chat_relay::domain::foundation::SessionStatus;
use chat_relay::ports::{FrameTransport, InboundEvent, TransportError};

// =============================================================================
// Test Infrastructure
// =============================================================================

const WAIT: Duration = Duration::from_secs(5);

/// Server side of an in-memory connection.
struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<InboundEvent>,
    outbound: mpsc::UnboundedSender<String>,
    close_calls: Arc<AtomicU32>,
}

#[async_trait]
impl FrameTransport for ChannelTransport {
    async fn recv(&mut self) -> Result<InboundEvent, TransportError> {
        Ok(self.inbound.recv().await.unwrap_or(InboundEvent::Closed))
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.outbound
            .send(frame.into_string())
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Client side of an in-memory connection.
struct Client {
    tx: mpsc::UnboundedSender<InboundEvent>,
    rx: mpsc::UnboundedReceiver<String>,
    close_calls: Arc<AtomicU32>,
    session: JoinHandle<SessionSummary>,
}

impl Client {
    fn connect(handler: &ChatSessionHandler) -> Self {
        let (tx, inbound) = mpsc::unbounded_channel();
        let (outbound, rx) = mpsc::unbounded_channel();
        let close_calls = Arc::new(AtomicU32::new(0));
        let transport = ChannelTransport {
            inbound,
            outbound,
            close_calls: Arc::clone(&close_calls),
        };

        let handler = handler.clone();
        let session = tokio::spawn(async move { handler.serve(transport).await });

        Self {
            tx,
            rx,
            close_calls,
            session,
        }
    }

    fn send(&self, text: &str) {
        self.tx.send(InboundEvent::Text(text.to_string())).unwrap();
    }

    async fn next(&mut self) -> String {
        timeout(WAIT, self.rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("session dropped its outbound channel")
    }

    async fn ask(&mut self, text: &str) -> String {
        self.send(text);
        self.next().await
    }

    async fn finish(self) -> (SessionSummary, u32) {
        drop(self.tx);
        let summary = timeout(WAIT, self.session)
            .await
            .expect("session did not end")
            .unwrap();
        (summary, self.close_calls.load(Ordering::SeqCst))
    }
}

fn handler_for(provider: MockAIProvider) -> ChatSessionHandler {
    ChatSessionHandler::new(Arc::new(ProviderChatModel::new(Arc::new(provider))))
}

// =============================================================================
// Protocol
// =============================================================================

#[tokio::test]
async fn each_utterance_gets_one_prefixed_reply() {
    let provider = MockAIProvider::new()
        .with_response("Hi there!")
        .with_response("Paris.");
    let mut client = Client::connect(&handler_for(provider));

    assert_eq!(client.ask("You: hello").await, "AI: Hi there!");
    assert_eq!(
        client.ask("You: What is the capital of France?").await,
        "AI: Paris."
    );

    let (summary, closes) = client.finish().await;
    assert_eq!(summary.turns, 2);
    assert_eq!(summary.outcome, SessionOutcome::PeerDisconnected);
    assert_eq!(summary.final_status, SessionStatus::Closed);
    assert_eq!(closes, 1);
}

#[tokio::test]
async fn unmarked_frame_is_rejected_without_calling_the_model() {
    let provider = MockAIProvider::new().with_response("still here");
    let mut client = Client::connect(&handler_for(provider.clone()));

    assert_eq!(
        client.ask("hello").await,
        "AI: Please start your message with 'You: '"
    );
    assert_eq!(provider.call_count(), 0);

    assert_eq!(client.ask("You: still there?").await, "AI: still here");
    let (summary, _) = client.finish().await;
    assert_eq!(summary.protocol_errors, 1);
    assert_eq!(summary.turns, 1);
}

#[tokio::test]
async fn marker_is_case_insensitive_and_body_is_forwarded_verbatim() {
    let provider = MockAIProvider::new();
    let mut client = Client::connect(&handler_for(provider.clone()));

    client.ask("YOU:   spaced out  ").await;

    let calls = provider.get_calls();
    assert_eq!(calls[0].messages[0].content, "  spaced out  ");
    client.finish().await;
}

#[tokio::test]
async fn exit_sends_goodbye_and_closes_once() {
    let provider = MockAIProvider::new();
    let mut client = Client::connect(&handler_for(provider.clone()));

    assert_eq!(client.ask("You: Exit").await, "AI: Ending chat session.");

    let (summary, closes) = client.finish().await;
    assert_eq!(summary.outcome, SessionOutcome::ClientExit);
    assert_eq!(closes, 1);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn frames_after_exit_are_never_answered() {
    let mut client = Client::connect(&handler_for(MockAIProvider::new()));

    client.send("You: exit");
    client.send("You: are you there?");

    assert_eq!(client.next().await, "AI: Ending chat session.");
    let Client { rx, session, .. } = client;
    let summary = timeout(WAIT, session).await.unwrap().unwrap();
    assert_eq!(summary.outcome, SessionOutcome::ClientExit);

    let mut rx = rx;
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn binary_frame_gets_protocol_error() {
    let mut client = Client::connect(&handler_for(MockAIProvider::new()));

    client.tx.send(InboundEvent::Binary).unwrap();

    assert_eq!(
        client.next().await,
        "AI: Please start your message with 'You: '"
    );
    client.finish().await;
}

#[tokio::test]
async fn upstream_failure_is_reported_and_session_continues() {
    let provider = MockAIProvider::new()
        .with_error(MockError::Unavailable {
            message: "overloaded".to_string(),
        })
        .with_response("Recovered");
    let mut client = Client::connect(&handler_for(provider.clone()));

    let failure = client.ask("You: first").await;
    assert!(failure.starts_with("AI: Sorry"), "{failure}");
    assert!(failure.contains("overloaded"), "{failure}");

    assert_eq!(client.ask("You: second").await, "AI: Recovered");

    // the failed turn is not part of the history
    let contents: Vec<String> = provider.get_calls()[1]
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["second".to_string()]);

    let (summary, _) = client.finish().await;
    assert_eq!(summary.upstream_failures, 1);
    assert_eq!(summary.turns, 1);
}

// =============================================================================
// Isolation
// =============================================================================

#[tokio::test]
async fn concurrent_sessions_keep_separate_histories() {
    let provider = MockAIProvider::new();
    let handler = handler_for(provider.clone());
    let mut alice = Client::connect(&handler);
    let mut bob = Client::connect(&handler);

    alice.ask("You: my name is Alice").await;
    bob.ask("You: my name is Bob").await;
    alice.ask("You: what is my name?").await;

    let calls = provider.get_calls();
    let last = &calls[2].messages;
    assert_eq!(last.len(), 3);
    assert!(last.iter().all(|m| !m.content.contains("Bob")));

    let (a, _) = alice.finish().await;
    let (b, _) = bob.finish().await;
    assert_ne!(a.session_id, b.session_id);
    assert_eq!(calls[0].metadata.session_id, a.session_id);
    assert_eq!(calls[1].metadata.session_id, b.session_id);
}

#[tokio::test]
async fn one_session_exiting_leaves_the_other_running() {
    let handler = handler_for(MockAIProvider::new());
    let mut leaving = Client::connect(&handler);
    let mut staying = Client::connect(&handler);

    assert_eq!(leaving.ask("You: exit").await, "AI: Ending chat session.");
    let (summary, _) = leaving.finish().await;
    assert_eq!(summary.outcome, SessionOutcome::ClientExit);

    assert_eq!(staying.ask("You: hello?").await, "AI: Mock response");
    let (summary, _) = staying.finish().await;
    assert_eq!(summary.outcome, SessionOutcome::PeerDisconnected);
}

#[tokio::test]
async fn history_grows_by_two_messages_per_turn() {
    let provider = MockAIProvider::new();
    let mut client = Client::connect(&handler_for(provider.clone()));

    for i in 0..4 {
        client.ask(&format!("You: turn {i}")).await;
    }

    let sizes: Vec<usize> = provider
        .get_calls()
        .iter()
        .map(|c| c.messages.len())
        .collect();
    assert_eq!(sizes, vec![1, 3, 5, 7]);
    client.finish().await;
}
