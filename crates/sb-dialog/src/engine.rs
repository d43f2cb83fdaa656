//! One full conversational turn: score, classify, route, persist, log.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{
    ConversationLog, Recommender, SentimentScorer, SupportStore, bounded,
};
use crate::config::DialogConfig;
use crate::router::DialogRouter;
use crate::session::SessionStore;
use crate::templates;
use sb_nlu::IntentClassifier;
use sb_protocol::intent::IntentKind;
use sb_protocol::session::{Action, ConversationState, Response, SessionId, TemplateId, Utterance};
use sb_protocol::transcript::{LogEntry, Sender, Sentiment};

/// What the caller gets back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: SessionId,
    pub intent: IntentKind,
    pub confidence: f64,
    pub action: Action,
    pub template: TemplateId,
    pub text: String,
    pub sentiment: Sentiment,
}

/// External dependencies of the agent.
pub struct Collaborators {
    pub store: Arc<dyn SupportStore>,
    pub recommender: Arc<dyn Recommender>,
    pub scorer: Arc<dyn SentimentScorer>,
    pub log: Arc<dyn ConversationLog>,
}

/// The support bot: owns the router and session store and drives turns.
pub struct SupportAgent {
    classifier: Arc<dyn IntentClassifier>,
    router: DialogRouter,
    sessions: SessionStore,
    scorer: Arc<dyn SentimentScorer>,
    log: Arc<dyn ConversationLog>,
    config: DialogConfig,
}

impl SupportAgent {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        collaborators: Collaborators,
        config: DialogConfig,
    ) -> Self {
        let router = DialogRouter::new(
            classifier.clone(),
            collaborators.store,
            collaborators.recommender,
            config.clone(),
        );
        let sessions = SessionStore::new(classifier.clone(), &config);
        Self {
            classifier,
            router,
            sessions,
            scorer: collaborators.scorer,
            log: collaborators.log,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Open a session and return the welcome message.
    pub async fn start_session(
        &self,
        session_id: &SessionId,
        user_id: &str,
        channel: &str,
    ) -> Response {
        self.sessions.start(session_id).await;
        let welcome = templates::welcome();
        self.log.record(LogEntry {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            channel: channel.to_string(),
            sender: Sender::Bot,
            text: welcome.text.clone(),
            intent: None,
            confidence: None,
            sentiment: None,
            logged_at: Utc::now(),
        });
        welcome
    }

    /// Close a session. Returns false if it was not known.
    pub async fn end_session(&self, session_id: &SessionId) -> bool {
        let _turn = self.sessions.lock_turn(session_id).await;
        self.sessions.end(session_id).await
    }

    /// Stored state for a session, if it exists.
    pub async fn session_state(&self, session_id: &SessionId) -> Option<ConversationState> {
        self.sessions.get(session_id).await
    }

    /// Handle one user message.
    ///
    /// Turns on the same session run one at a time; a second message waits
    /// until the first one's state is saved.
    pub async fn handle_turn(&self, utterance: &Utterance) -> TurnReply {
        let start = Instant::now();
        let session_id = &utterance.session_id;
        let _turn = self.sessions.lock_turn(session_id).await;

        let sentiment = match bounded(
            "sentiment",
            self.config.collaborator_timeout(),
            self.scorer.score(&utterance.text),
        )
        .await
        {
            Ok(sentiment) => sentiment,
            Err(err) => {
                warn!(
                    session = %session_id,
                    scorer = self.scorer.name(),
                    error = %err,
                    "Sentiment scoring failed, using neutral"
                );
                Sentiment::neutral()
            }
        };

        let classification = self.classifier.classify(&utterance.text);
        self.log.record(LogEntry {
            session_id: session_id.clone(),
            user_id: utterance.user_id.clone(),
            channel: utterance.channel.clone(),
            sender: Sender::User,
            text: utterance.text.clone(),
            intent: Some(classification.intent),
            confidence: Some(classification.confidence),
            sentiment: Some(sentiment),
            logged_at: utterance.received_at,
        });

        let state = self.sessions.load(session_id).await;
        let outcome = self.router.route(&classification, utterance, state).await;

        let mut next = outcome.state;
        next.turns += 1;
        next.updated_at = Utc::now();
        self.sessions.save(session_id, next).await;

        self.log.record(LogEntry {
            session_id: session_id.clone(),
            user_id: utterance.user_id.clone(),
            channel: utterance.channel.clone(),
            sender: Sender::Bot,
            text: outcome.response.text.clone(),
            intent: Some(outcome.intent),
            confidence: None,
            sentiment: None,
            logged_at: Utc::now(),
        });

        info!(
            session = %session_id,
            intent = %outcome.intent,
            confidence = classification.confidence,
            action = ?outcome.action,
            template = ?outcome.response.template,
            latency_ms = start.elapsed().as_millis() as u64,
            "Turn handled"
        );

        TurnReply {
            session_id: session_id.clone(),
            intent: outcome.intent,
            confidence: classification.confidence,
            action: outcome.action,
            template: outcome.response.template,
            text: outcome.response.text,
            sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailingScorer, InMemoryStore, MemoryLog, StaticScorer};
    use crate::recommend::CatalogRecommender;
    use sb_nlu::{KeywordSentiment, RuleClassifier};
    use sb_protocol::session::DialogState;
    use sb_protocol::transcript::SentimentLabel;

    struct Fixture {
        agent: SupportAgent,
        store: Arc<InMemoryStore>,
        log: Arc<MemoryLog>,
    }

    fn fixture_with(scorer: Arc<dyn SentimentScorer>) -> Fixture {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let log = Arc::new(MemoryLog::new());
        let agent = SupportAgent::new(
            Arc::new(RuleClassifier::default()),
            Collaborators {
                store: store.clone(),
                recommender: Arc::new(CatalogRecommender::new(store.clone())),
                scorer,
                log: log.clone(),
            },
            DialogConfig::default(),
        );
        Fixture { agent, store, log }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(KeywordSentiment::new()))
    }

    fn say(text: &str) -> Utterance {
        Utterance::new("s-1", "u-1", "webchat", text)
    }

    #[tokio::test]
    async fn start_session_welcomes_and_logs() {
        let f = fixture();
        let id: SessionId = "s-1".into();
        let welcome = f.agent.start_session(&id, "u-1", "webchat").await;
        assert_eq!(welcome.template, TemplateId::Welcome);
        assert!(f.agent.session_state(&id).await.is_some());
        assert_eq!(f.log.len(), 1);
        assert_eq!(f.log.entries()[0].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn turn_logs_user_and_bot_lines() {
        let f = fixture();
        let reply = f.agent.handle_turn(&say("hello")).await;
        assert_eq!(reply.intent, IntentKind::Greeting);
        assert_eq!(reply.action, Action::Reply);

        let entries = f.log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].intent, Some(IntentKind::Greeting));
        assert_eq!(entries[0].confidence, Some(1.0));
        assert_eq!(entries[1].sender, Sender::Bot);
        assert_eq!(entries[1].text, reply.text);
    }

    #[tokio::test]
    async fn slot_dialog_across_turns() {
        let f = fixture();
        let id: SessionId = "s-1".into();

        let first = f.agent.handle_turn(&say("where is my order?")).await;
        assert_eq!(first.action, Action::PromptSlot);
        let state = f.agent.session_state(&id).await.unwrap();
        assert!(matches!(state.dialog, DialogState::AwaitingSlot { .. }));
        assert_eq!(state.turns, 1);

        let second = f.agent.handle_turn(&say("ORD-2026-00001")).await;
        assert_eq!(second.intent, IntentKind::TrackOrder);
        assert_eq!(second.template, TemplateId::OrderStatus);
        let state = f.agent.session_state(&id).await.unwrap();
        assert!(state.is_idle());
        assert_eq!(state.turns, 2);
        assert_eq!(f.store.calls("order_status"), 1);
    }

    #[tokio::test]
    async fn sentiment_is_scored_and_logged() {
        let f = fixture();
        let reply = f
            .agent
            .handle_turn(&say("my headphones arrived broken, terrible"))
            .await;
        assert_eq!(reply.sentiment.label, SentimentLabel::Negative);
        let user_line = &f.log.entries()[0];
        assert_eq!(user_line.sentiment.map(|s| s.label), Some(SentimentLabel::Negative));
    }

    #[tokio::test]
    async fn scorer_failure_falls_back_to_neutral() {
        let f = fixture_with(Arc::new(FailingScorer));
        let reply = f.agent.handle_turn(&say("hello")).await;
        assert_eq!(reply.sentiment, Sentiment::neutral());
        assert_eq!(reply.template, TemplateId::Welcome);
    }

    #[tokio::test]
    async fn static_scorer_passes_through() {
        let fixed = Sentiment {
            label: SentimentLabel::Positive,
            score: 0.8,
            compound: 0.6,
        };
        let f = fixture_with(Arc::new(StaticScorer(fixed)));
        let reply = f.agent.handle_turn(&say("hello")).await;
        assert_eq!(reply.sentiment, fixed);
    }

    #[tokio::test]
    async fn store_outage_apologizes_and_keeps_dialog() {
        let f = fixture();
        f.agent.handle_turn(&say("track my order")).await;
        f.store.set_failing(true);
        let reply = f.agent.handle_turn(&say("ORD-2026-00001")).await;
        assert_eq!(reply.action, Action::Apology);

        let state = f.agent.session_state(&"s-1".into()).await.unwrap();
        assert_eq!(
            state.dialog,
            DialogState::AwaitingSlot {
                slot: sb_protocol::intent::SlotName::OrderNumber,
                target: IntentKind::TrackOrder,
                attempts: 0,
            }
        );

        f.store.set_failing(false);
        let retry = f.agent.handle_turn(&say("ORD-2026-00001")).await;
        assert_eq!(retry.template, TemplateId::OrderStatus);
    }

    #[tokio::test]
    async fn end_session_forgets_state() {
        let f = fixture();
        f.agent.handle_turn(&say("track my order")).await;
        let id: SessionId = "s-1".into();
        assert!(f.agent.end_session(&id).await);
        assert!(f.agent.session_state(&id).await.is_none());
        assert!(!f.agent.end_session(&id).await);
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_are_serialized() {
        let f = fixture();
        f.store.set_delay(Some(std::time::Duration::from_millis(200)));
        let agent = Arc::new(f.agent);

        let slow = tokio::spawn({
            let agent = agent.clone();
            async move { agent.handle_turn(&say("track ORD-2026-00001")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let fast = agent.handle_turn(&say("track my order")).await;
        let slow = slow.await.unwrap();

        assert_eq!(slow.action, Action::Lookup);
        assert_eq!(fast.action, Action::PromptSlot);

        let state = agent.session_state(&"s-1".into()).await.unwrap();
        assert_eq!(state.turns, 2);
        assert!(matches!(state.dialog, DialogState::AwaitingSlot { .. }));

        let senders: Vec<_> = f
            .log
            .entries()
            .iter()
            .map(|e| (e.sender, e.text.clone()))
            .collect();
        assert_eq!(senders.len(), 4);
        assert_eq!(senders[0], (Sender::User, "track ORD-2026-00001".to_string()));
        assert_eq!(senders[1].0, Sender::Bot);
        assert_eq!(senders[2], (Sender::User, "track my order".to_string()));
        assert_eq!(senders[3].0, Sender::Bot);
    }

    #[tokio::test]
    async fn slow_turn_does_not_block_other_sessions() {
        let f = fixture();
        f.store.set_delay(Some(std::time::Duration::from_millis(300)));
        let agent = Arc::new(f.agent);

        let slow = tokio::spawn({
            let agent = agent.clone();
            async move { agent.handle_turn(&say("track ORD-2026-00001")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let other = tokio::time::timeout(
            std::time::Duration::from_millis(150),
            agent.handle_turn(&Utterance::new("s-2", "u-2", "webchat", "hello")),
        )
        .await
        .expect("other session should not wait");
        assert_eq!(other.intent, IntentKind::Greeting);
        assert!(!slow.is_finished());
        assert_eq!(slow.await.unwrap().action, Action::Lookup);
    }
}
