//! crates/finance_assistant_core/src/engine.rs
//!
//! The dialogue engine: owns the conversation transcript, classifies user
//! utterances against the knowledge taxonomy, and delivers each reply after
//! a simulated thinking delay.
//!
//! Concurrency policy: overlapping submissions are allowed. Each accepted
//! user utterance gets its own independent timer, and replies are appended
//! in timer-completion order, which can differ from submission order when
//! delays differ. The composing indicator stays raised while any reply is
//! still pending.

use crate::domain::{Conversation, Origin, PendingReply, Utterance};
use crate::ports::RandomSource;
use crate::taxonomy::Taxonomy;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Observable state changes the host renders verbatim.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// An utterance (user or assistant) was appended to the transcript.
    Appended(Utterance),
    /// The "assistant is composing" indicator changed.
    Composing(bool),
}

/// The delay window the engine draws from before replying.
#[derive(Debug, Clone, Copy)]
pub struct ReplyDelay {
    pub min: Duration,
    pub max: Duration,
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(2000),
        }
    }
}

struct EngineState {
    conversation: Conversation,
    pending: Vec<PendingReply>,
}

/// One engine instance per chat session. Dropping the host side of the
/// event channel is harmless; closing the engine cancels every in-flight
/// reply timer so nothing appends to a disposed conversation.
pub struct DialogueEngine {
    state: Arc<Mutex<EngineState>>,
    taxonomy: Arc<Taxonomy>,
    random: Arc<dyn RandomSource>,
    delay: ReplyDelay,
    events: mpsc::UnboundedSender<EngineEvent>,
    shutdown: CancellationToken,
}

impl DialogueEngine {
    /// Creates an engine with a fresh conversation seeded by the taxonomy's
    /// opening greeting. The greeting is emitted as the first event.
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        random: Arc<dyn RandomSource>,
        delay: ReplyDelay,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let conversation = Conversation::new(taxonomy.greeting);
        let greeting = conversation.utterances()[0].clone();
        let engine = Self {
            state: Arc::new(Mutex::new(EngineState {
                conversation,
                pending: Vec::new(),
            })),
            taxonomy,
            random,
            delay,
            events,
            shutdown: CancellationToken::new(),
        };
        let _ = engine.events.send(EngineEvent::Appended(greeting));
        (engine, event_rx)
    }

    pub async fn conversation_id(&self) -> uuid::Uuid {
        self.state.lock().await.conversation.id()
    }

    /// A copy of the transcript as it stands.
    pub async fn transcript(&self) -> Vec<Utterance> {
        self.state.lock().await.conversation.utterances().to_vec()
    }

    /// True while at least one reply is still pending.
    pub async fn is_composing(&self) -> bool {
        !self.state.lock().await.pending.is_empty()
    }

    /// Accepts a user-composed message.
    ///
    /// Whitespace-only text is a silent no-op: nothing is appended and no
    /// reply is scheduled. Otherwise the trimmed text is appended as a USER
    /// utterance and a cancellable reply task is spawned that waits out the
    /// thinking delay, classifies the text, and appends the reply.
    pub async fn submit(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("Ignoring whitespace-only submission.");
            return;
        }

        let delay = self.random.thinking_delay(self.delay.min, self.delay.max);
        let user_id = {
            let mut state = self.state.lock().await;
            let user = state.conversation.append(Origin::User, trimmed);
            let scheduled_at = Utc::now();
            state.pending.push(PendingReply {
                for_utterance_id: user.id,
                scheduled_at,
                ready_at: scheduled_at + delay,
            });
            let user_id = user.id;
            // Emit while holding the lock so event order matches transcript
            // order across overlapping submissions.
            let _ = self.events.send(EngineEvent::Appended(user));
            if state.pending.len() == 1 {
                let _ = self.events.send(EngineEvent::Composing(true));
            }
            user_id
        };
        debug!(%user_id, ?delay, "Scheduled reply.");

        let state = self.state.clone();
        let taxonomy = self.taxonomy.clone();
        let random = self.random.clone();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();
        let text = trimmed.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(%user_id, "Reply cancelled before delivery.");
                }
                _ = tokio::time::sleep(delay) => {
                    let response = taxonomy.classify(&text, random.as_ref());
                    let mut state = state.lock().await;
                    state.pending.retain(|p| p.for_utterance_id != user_id);
                    let reply = state.conversation.append(Origin::Assistant, &response);
                    let _ = events.send(EngineEvent::Appended(reply));
                    if state.pending.is_empty() {
                        let _ = events.send(EngineEvent::Composing(false));
                    }
                }
            }
        });
    }

    /// Tears the session down: cancels every outstanding reply timer.
    pub fn close(&self) {
        info!("Closing dialogue engine; cancelling pending replies.");
        self.shutdown.cancel();
    }
}

impl Drop for DialogueEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::test_support::FixedSource;
    use tokio::time::Instant;

    fn engine_with(
        delays: Vec<Duration>,
    ) -> (DialogueEngine, mpsc::UnboundedReceiver<EngineEvent>) {
        DialogueEngine::new(
            Arc::new(Taxonomy::finance()),
            Arc::new(FixedSource::new(0, delays)),
            ReplyDelay::default(),
        )
    }

    async fn next_appended(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Utterance {
        loop {
            match rx.recv().await.expect("event channel closed") {
                EngineEvent::Appended(utterance) => return utterance,
                EngineEvent::Composing(_) => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn greeting_is_the_first_event() {
        let (_engine, mut rx) = engine_with(Vec::new());
        let greeting = next_appended(&mut rx).await;
        assert_eq!(greeting.origin, Origin::Assistant);
        assert_eq!(greeting.id, 1);
        assert_eq!(greeting.text, Taxonomy::finance().greeting);
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_submission_is_a_no_op() {
        let (engine, mut rx) = engine_with(Vec::new());
        let _greeting = next_appended(&mut rx).await;

        engine.submit("   ").await;
        engine.submit("\n\t").await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(engine.transcript().await.len(), 1);
        assert!(!engine.is_composing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_lands_inside_the_delay_window() {
        let (engine, mut rx) = engine_with(vec![Duration::from_millis(1500)]);
        let _greeting = next_appended(&mut rx).await;

        let submitted_at = Instant::now();
        engine.submit("hi").await;

        let user = next_appended(&mut rx).await;
        assert_eq!(user.origin, Origin::User);
        assert!(engine.is_composing().await);

        let reply = next_appended(&mut rx).await;
        let elapsed = submitted_at.elapsed();
        assert!(elapsed >= Duration::from_millis(1000), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2000), "elapsed {elapsed:?}");
        assert_eq!(reply.origin, Origin::Assistant);
        assert!(Taxonomy::finance()
            .greeting_responses()
            .contains(&reply.text.as_str()));

        // Composing drops only after the reply is appended.
        match rx.recv().await {
            Some(EngineEvent::Composing(false)) => {}
            other => panic!("expected composing=false, got {other:?}"),
        }
        assert!(!engine.is_composing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn composing_raises_before_the_reply() {
        let (engine, mut rx) = engine_with(vec![Duration::from_millis(1200)]);
        let _greeting = next_appended(&mut rx).await;

        engine.submit("hello").await;
        match rx.recv().await {
            Some(EngineEvent::Appended(u)) => assert_eq!(u.origin, Origin::User),
            other => panic!("expected user utterance, got {other:?}"),
        }
        match rx.recv().await {
            Some(EngineEvent::Composing(true)) => {}
            other => panic!("expected composing=true, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_replies_append_in_completion_order() {
        // First submission thinks for 1900ms, the second for 1100ms, so the
        // second reply completes first.
        let (engine, mut rx) = engine_with(vec![
            Duration::from_millis(1900),
            Duration::from_millis(1100),
        ]);
        let _greeting = next_appended(&mut rx).await;

        engine.submit("tell me about ecocash").await;
        engine.submit("asdkjasd").await;

        let first_user = next_appended(&mut rx).await;
        let second_user = next_appended(&mut rx).await;
        assert!(first_user.id < second_user.id);

        let first_reply = next_appended(&mut rx).await;
        let second_reply = next_appended(&mut rx).await;
        assert_eq!(first_reply.text, Taxonomy::finance().fallback());
        assert!(first_reply.text != second_reply.text);
        assert!(second_reply.text.starts_with("I recognize EcoCash"));

        // Ids stay strictly increasing even when replies land out of
        // submission order.
        assert!(first_reply.id < second_reply.id);
        assert!(!engine.is_composing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn composing_stays_raised_while_any_reply_is_pending() {
        let (engine, mut rx) = engine_with(vec![
            Duration::from_millis(1100),
            Duration::from_millis(1900),
        ]);
        let _greeting = next_appended(&mut rx).await;

        engine.submit("hello").await;
        engine.submit("hey").await;

        let _first_user = next_appended(&mut rx).await;
        let _second_user = next_appended(&mut rx).await;
        let _first_reply = next_appended(&mut rx).await;
        assert!(engine.is_composing().await);

        let _second_reply = next_appended(&mut rx).await;
        match rx.recv().await {
            Some(EngineEvent::Composing(false)) => {}
            other => panic!("expected composing=false, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_outstanding_replies() {
        let (engine, mut rx) = engine_with(vec![Duration::from_millis(1500)]);
        let _greeting = next_appended(&mut rx).await;

        engine.submit("hello").await;
        let _user = next_appended(&mut rx).await;
        engine.close();

        tokio::time::sleep(Duration::from_secs(5)).await;
        loop {
            match rx.try_recv() {
                Ok(EngineEvent::Appended(u)) => {
                    panic!("reply appended after close: {u:?}")
                }
                Ok(EngineEvent::Composing(_)) => continue,
                Err(_) => break,
            }
        }
        assert_eq!(engine.transcript().await.len(), 2);
    }
}
