//! The chat session controller.
//!
//! A session is either idle or awaiting exactly one reply. `submit` moves it to
//! awaiting and spawns the request; `settle`/`try_settle` move it back once the
//! request resolves, appending one exchange whatever the outcome.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::ai::GenerationService;
use crate::error::RequestFailure;
use crate::persona::Persona;
use crate::state::{Exchange, Transcript};

/// Reply text recorded when a request fails for any reason.
pub const FAILURE_RESPONSE: &str = "Error: Unable to fetch response";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub draft: String,
    pub transcript: Transcript,
    pub pending: bool,
    pub persona: Persona,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was sent and the session is now awaiting its reply.
    Dispatched,
    /// The draft was blank; nothing happened.
    EmptyDraft,
    /// A reply is still outstanding; nothing happened.
    AlreadyPending,
}

struct InFlight {
    question: String,
    rx: oneshot::Receiver<Result<String, RequestFailure>>,
}

pub struct ChatSession {
    state: SessionState,
    service: Arc<dyn GenerationService>,
    in_flight: Option<InFlight>,
    revision: u64,
}

impl ChatSession {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            state: SessionState::default(),
            service,
            in_flight: None,
            revision: 0,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.state.persona = persona;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn draft(&self) -> &str {
        &self.state.draft
    }

    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn persona(&self) -> Persona {
        self.state.persona
    }

    /// Bumped on every transcript append and every change of `pending`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    /// Applies to the next submission only.
    pub fn select_persona(&mut self, persona: Persona) {
        self.state.persona = persona;
    }

    /// Sends the current draft with the current persona.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.state.pending {
            debug!("submit ignored, a reply is still outstanding");
            return SubmitOutcome::AlreadyPending;
        }
        if self.state.draft.trim().is_empty() {
            return SubmitOutcome::EmptyDraft;
        }

        let question = std::mem::take(&mut self.state.draft);
        let persona = self.state.persona;

        let (tx, rx) = oneshot::channel();
        let service = Arc::clone(&self.service);
        let sent = question.clone();
        tokio::spawn(async move {
            let outcome = service.generate(&sent, persona).await;
            // Receiver is gone only if the session was dropped.
            let _ = tx.send(outcome);
        });

        debug!(role = %persona, chars = question.chars().count(), "request dispatched");

        self.in_flight = Some(InFlight { question, rx });
        self.state.pending = true;
        self.revision += 1;
        SubmitOutcome::Dispatched
    }

    /// Completes the outstanding request if it has already resolved.
    pub fn try_settle(&mut self) -> Option<Exchange> {
        let outcome = match self.in_flight.as_mut()?.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(RequestFailure::abandoned()),
        };
        let in_flight = self.in_flight.take()?;
        Some(self.finish(in_flight.question, outcome))
    }

    /// Waits for the outstanding request and completes it.
    ///
    /// Returns `None` immediately when nothing is in flight. Cancel-safe: if the
    /// future is dropped the request stays outstanding.
    pub async fn settle(&mut self) -> Option<Exchange> {
        let in_flight = self.in_flight.as_mut()?;
        let outcome = (&mut in_flight.rx)
            .await
            .unwrap_or_else(|_| Err(RequestFailure::abandoned()));
        let in_flight = self.in_flight.take()?;
        Some(self.finish(in_flight.question, outcome))
    }

    fn finish(&mut self, question: String, outcome: Result<String, RequestFailure>) -> Exchange {
        let exchange = match outcome {
            Ok(response) => {
                info!(chars = response.chars().count(), "reply received");
                Exchange::new(question, response)
            }
            Err(failure) => {
                warn!(reason = failure.reason(), "request failed");
                Exchange::new(question, FAILURE_RESPONSE)
            }
        };

        self.state.transcript.append(exchange.clone());
        self.state.pending = false;
        self.revision += 1;
        exchange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Persona)>>,
    }

    impl Recorder {
        fn record(&self, question: &str, persona: Persona) {
            self.calls.lock().unwrap().push((question.to_string(), persona));
        }

        fn calls(&self) -> Vec<(String, Persona)> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct Reply {
        text: &'static str,
        recorder: Recorder,
    }

    #[async_trait]
    impl GenerationService for Reply {
        async fn generate(&self, question: &str, persona: Persona) -> Result<String, RequestFailure> {
            self.recorder.record(question, persona);
            Ok(self.text.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl GenerationService for Unreachable {
        async fn generate(&self, _: &str, _: Persona) -> Result<String, RequestFailure> {
            Err(RequestFailure::new("connection refused"))
        }
    }

    /// Holds every request open until released.
    #[derive(Default)]
    struct Gate {
        open: Notify,
        recorder: Recorder,
    }

    #[async_trait]
    impl GenerationService for Gate {
        async fn generate(&self, question: &str, persona: Persona) -> Result<String, RequestFailure> {
            self.recorder.record(question, persona);
            self.open.notified().await;
            Ok(format!("answer to {}", question))
        }
    }

    struct Panics;

    #[async_trait]
    impl GenerationService for Panics {
        async fn generate(&self, _: &str, _: Persona) -> Result<String, RequestFailure> {
            panic!("service blew up");
        }
    }

    fn reply(text: &'static str) -> Arc<Reply> {
        Arc::new(Reply {
            text,
            recorder: Recorder::default(),
        })
    }

    #[tokio::test]
    async fn submit_then_settle_appends_reply() {
        let service = reply("Hi there!");
        let mut session = ChatSession::new(service.clone());
        session.select_persona(Persona::Friend);
        session.set_draft("Hello");

        assert_eq!(session.submit(), SubmitOutcome::Dispatched);
        assert!(session.is_pending());
        assert_eq!(session.draft(), "");

        let exchange = session.settle().await.expect("request was in flight");
        assert_eq!(exchange, Exchange::new("Hello", "Hi there!"));
        assert_eq!(session.transcript().as_slice(), &[Exchange::new("Hello", "Hi there!")]);
        assert!(!session.is_pending());
        assert_eq!(session.draft(), "");
        assert_eq!(service.recorder.calls(), vec![("Hello".to_string(), Persona::Friend)]);
    }

    #[tokio::test]
    async fn failure_becomes_placeholder_exchange() {
        let mut session = ChatSession::new(Arc::new(Unreachable));
        session.set_draft("2+2?");
        session.submit();

        session.settle().await;

        assert_eq!(
            session.transcript().as_slice(),
            &[Exchange::new("2+2?", FAILURE_RESPONSE)]
        );
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn blank_draft_is_not_sent() {
        let service = reply("unused");
        let mut session = ChatSession::new(service.clone());
        session.set_draft("   \n\t");

        assert_eq!(session.submit(), SubmitOutcome::EmptyDraft);
        assert!(!session.is_pending());
        assert_eq!(session.draft(), "   \n\t");
        assert_eq!(session.revision(), 0);
        assert!(session.settle().await.is_none());
        assert!(service.recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_ignored() {
        let gate = Arc::new(Gate::default());
        let mut session = ChatSession::new(gate.clone());
        session.set_draft("first");
        assert_eq!(session.submit(), SubmitOutcome::Dispatched);

        session.set_draft("second");
        let revision = session.revision();
        assert_eq!(session.submit(), SubmitOutcome::AlreadyPending);
        assert_eq!(session.draft(), "second");
        assert_eq!(session.revision(), revision);

        // Let the spawned task reach the gate before checking what was sent.
        tokio::task::yield_now().await;
        assert!(session.try_settle().is_none());
        assert!(session.transcript().is_empty());

        gate.open.notify_one();
        let exchange = session.settle().await.unwrap();
        assert_eq!(exchange, Exchange::new("first", "answer to first"));
        assert_eq!(gate.recorder.calls(), vec![("first".to_string(), Persona::Assistant)]);
        assert_eq!(session.draft(), "second");
    }

    #[tokio::test]
    async fn persona_change_only_affects_next_submission() {
        let gate = Arc::new(Gate::default());
        let mut session = ChatSession::new(gate.clone()).with_persona(Persona::Expert);
        session.set_draft("q1");
        session.submit();
        session.select_persona(Persona::Friend);
        gate.open.notify_one();
        session.settle().await;

        session.set_draft("q2");
        session.submit();
        gate.open.notify_one();
        session.settle().await;

        assert_eq!(
            gate.recorder.calls(),
            vec![
                ("q1".to_string(), Persona::Expert),
                ("q2".to_string(), Persona::Friend),
            ]
        );
    }

    #[tokio::test]
    async fn selecting_same_persona_twice_changes_nothing_else() {
        let mut session = ChatSession::new(reply("x"));
        session.select_persona(Persona::Expert);
        session.select_persona(Persona::Expert);

        assert_eq!(session.persona(), Persona::Expert);
        assert!(session.transcript().is_empty());
        assert_eq!(session.revision(), 0);
    }

    #[tokio::test]
    async fn revision_tracks_dispatch_and_settle() {
        let mut session = ChatSession::new(reply("ok"));
        session.set_draft("a");
        session.submit();
        assert_eq!(session.revision(), 1);
        session.settle().await;
        assert_eq!(session.revision(), 2);
    }

    #[tokio::test]
    async fn panicking_service_still_settles() {
        let mut session = ChatSession::new(Arc::new(Panics));
        session.set_draft("boom?");
        session.submit();

        let exchange = session.settle().await.unwrap();
        assert_eq!(exchange.response, FAILURE_RESPONSE);
        assert!(!session.is_pending());
    }

    /// Polls `try_settle` the way a frame-driven front end would.
    async fn poll_until_settled(session: &mut ChatSession) -> Exchange {
        for _ in 0..500 {
            if let Some(exchange) = session.try_settle() {
                return exchange;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        panic!("request never settled");
    }

    #[tokio::test]
    async fn try_settle_completes_resolved_request() {
        let mut session = ChatSession::new(reply("Hi there!"));
        session.set_draft("Hello");
        session.submit();

        let exchange = poll_until_settled(&mut session).await;
        assert_eq!(exchange, Exchange::new("Hello", "Hi there!"));
        assert!(!session.is_pending());
        assert_eq!(session.revision(), 2);
        // Nothing left in flight
        assert!(session.try_settle().is_none());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn try_settle_treats_dead_task_as_failure() {
        let mut session = ChatSession::new(Arc::new(Panics));
        session.set_draft("boom?");
        session.submit();

        let exchange = poll_until_settled(&mut session).await;
        assert_eq!(exchange, Exchange::new("boom?", FAILURE_RESPONSE));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn state_snapshot_mirrors_session() {
        let gate = Arc::new(Gate::default());
        let mut session = ChatSession::new(gate.clone()).with_persona(Persona::Expert);
        session.set_draft("q");
        session.submit();
        session.set_draft("next");

        let state = session.state();
        assert!(state.pending);
        assert_eq!(state.draft, "next");
        assert_eq!(state.persona, Persona::Expert);
        assert!(state.transcript.is_empty());

        gate.open.notify_one();
        session.settle().await;
        assert_eq!(
            session.state(),
            &SessionState {
                draft: "next".to_string(),
                transcript: session.transcript().clone(),
                pending: false,
                persona: Persona::Expert,
            }
        );
        assert_eq!(session.state().transcript.len(), 1);
    }

    #[tokio::test]
    async fn earlier_exchanges_are_untouched() {
        let mut session = ChatSession::new(reply("same"));
        session.set_draft("one");
        session.submit();
        session.settle().await;
        let first = session.transcript().as_slice()[0].clone();

        session.set_draft("two");
        session.submit();
        session.settle().await;

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript().as_slice()[0], first);
    }
}
