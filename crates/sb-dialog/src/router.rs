//! Per-turn dialog state machine.
//!
//! Takes a classification, the raw utterance and the session's current
//! state, and decides what to do: answer from a template, ask for a missing
//! slot, or call a collaborator and format its result.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collaborators::{Recommender, SupportStore, bounded};
use crate::config::DialogConfig;
use crate::error::{CollaboratorResult, DialogError};
use crate::templates;
use sb_nlu::{IntentClassifier, entities, faq, search_terms};
use sb_protocol::catalog::CancellationOutcome;
use sb_protocol::intent::{Classification, IntentKind, SlotName};
use sb_protocol::session::{Action, ConversationState, DialogState, Response, Utterance};

/// Result of routing one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub action: Action,
    pub response: Response,
    /// State to persist for the next turn.
    pub state: ConversationState,
    /// The intent the reply actually serves (the slot target when a
    /// pending dialog was resolved, `unknown` after a downgrade).
    pub intent: IntentKind,
    /// What went wrong, if anything. Never shown to the user.
    pub error: Option<DialogError>,
}

type Handled = Result<(Action, Response), DialogError>;

/// Routes classified utterances through the dialog state machine.
pub struct DialogRouter {
    classifier: Arc<dyn IntentClassifier>,
    store: Arc<dyn SupportStore>,
    recommender: Arc<dyn Recommender>,
    config: DialogConfig,
}

impl DialogRouter {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        store: Arc<dyn SupportStore>,
        recommender: Arc<dyn Recommender>,
        config: DialogConfig,
    ) -> Self {
        Self {
            classifier,
            store,
            recommender,
            config,
        }
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Route one turn.
    ///
    /// On collaborator failure the returned state equals `state` exactly,
    /// so the user can simply retry.
    pub async fn route(
        &self,
        classification: &Classification,
        utterance: &Utterance,
        state: ConversationState,
    ) -> RouteOutcome {
        match state.dialog {
            DialogState::Idle => self.route_idle(classification, utterance, state).await,
            DialogState::AwaitingSlot {
                slot,
                target,
                attempts,
            } => {
                self.continue_slot(slot, target, attempts, utterance, state)
                    .await
            }
        }
    }

    async fn route_idle(
        &self,
        classification: &Classification,
        utterance: &Utterance,
        state: ConversationState,
    ) -> RouteOutcome {
        let intent = if classification.confidence < self.config.min_confidence {
            if !classification.is_unknown() {
                debug!(
                    session = %utterance.session_id,
                    intent = %classification.intent,
                    confidence = classification.confidence,
                    "Confidence below threshold, treating as unknown"
                );
            }
            IntentKind::Unknown
        } else {
            classification.intent
        };

        let Some(slot) = self.classifier.required_slot(intent) else {
            return self
                .handle_direct(intent, classification, utterance, state)
                .await;
        };

        match classification.entities.slot(slot) {
            Some(value) => {
                let value = value.to_string();
                self.resolve_slot(intent, slot, value, state).await
            }
            None => {
                info!(
                    session = %utterance.session_id,
                    intent = %intent,
                    slot = %slot,
                    "Prompting for missing slot"
                );
                let mut next = state;
                next.dialog = DialogState::AwaitingSlot {
                    slot,
                    target: intent,
                    attempts: 0,
                };
                RouteOutcome {
                    action: Action::PromptSlot,
                    response: templates::slot_prompt(intent, slot),
                    state: next,
                    intent,
                    error: None,
                }
            }
        }
    }

    async fn continue_slot(
        &self,
        slot: SlotName,
        target: IntentKind,
        attempts: u8,
        utterance: &Utterance,
        state: ConversationState,
    ) -> RouteOutcome {
        if let Some(value) = entities::extract_slot(slot, &utterance.text) {
            debug!(session = %utterance.session_id, slot = %slot, "Slot filled");
            return self.resolve_slot(target, slot, value, state).await;
        }

        let attempts = attempts.saturating_add(1);
        let mismatch = DialogError::SlotFillMismatch { slot, attempts };

        if attempts <= self.config.max_reprompts {
            info!(
                session = %utterance.session_id,
                slot = %slot,
                attempts,
                "Slot missing from reply, re-prompting"
            );
            let mut next = state;
            next.dialog = DialogState::AwaitingSlot {
                slot,
                target,
                attempts,
            };
            return RouteOutcome {
                action: Action::PromptSlot,
                response: templates::slot_reprompt(target, slot),
                state: next,
                intent: target,
                error: Some(mismatch),
            };
        }

        info!(
            session = %utterance.session_id,
            slot = %slot,
            target = %target,
            "Slot still missing, abandoning dialog"
        );
        let original = state.clone();
        let mut next = state;
        next.reset();
        let mut outcome = self.finish(
            IntentKind::Unknown,
            self.handle_unknown(&utterance.text).await,
            next,
            original,
        );
        if !matches!(outcome.error, Some(DialogError::CollaboratorUnavailable { .. })) {
            outcome.error = Some(mismatch);
        }
        outcome
    }

    /// Record the slot value, then call the collaborator for a slot-bearing
    /// intent with what the state now holds.
    async fn resolve_slot(
        &self,
        intent: IntentKind,
        slot: SlotName,
        value: String,
        state: ConversationState,
    ) -> RouteOutcome {
        let original = state.clone();
        let mut next = state;
        next.fill_slot(slot, value);
        let value = next.slot(slot).unwrap_or_default().to_string();
        let handled = match (intent, slot) {
            (IntentKind::TrackOrder, SlotName::OrderNumber) => self.track_order(&value).await,
            (IntentKind::CancelOrder, SlotName::OrderNumber) => self.cancel_order(&value).await,
            _ => {
                warn!(intent = %intent, slot = %slot, "No slot handler for intent");
                Ok((Action::Fallback, templates::fallback()))
            }
        };
        next.reset();
        self.finish(intent, handled, next, original)
    }

    /// Intents that need no slot.
    async fn handle_direct(
        &self,
        intent: IntentKind,
        classification: &Classification,
        utterance: &Utterance,
        state: ConversationState,
    ) -> RouteOutcome {
        let original = state.clone();
        let handled = match intent {
            IntentKind::Greeting => Ok((Action::Reply, templates::welcome())),
            IntentKind::Goodbye => Ok((Action::Reply, templates::farewell())),
            IntentKind::Help => Ok((Action::Reply, templates::help())),
            IntentKind::ReturnPolicy => Ok((Action::Reply, templates::return_policy())),
            IntentKind::ShippingInfo => Ok((Action::Reply, templates::shipping_info())),
            IntentKind::PaymentMethods => Ok((Action::Reply, templates::payment_methods())),
            IntentKind::ProductSearch => {
                self.search_products(&utterance.text, classification.entities.category.as_deref())
                    .await
            }
            IntentKind::ProductRecommendation => {
                self.recommend(&utterance.user_id, classification.entities.category.as_deref())
                    .await
            }
            // Order intents only land here when the rule table declares no
            // slot for them; act on an inline order number if there is one.
            IntentKind::TrackOrder => match &classification.entities.order_number {
                Some(number) => self.track_order(number).await,
                None => self.handle_unknown(&utterance.text).await,
            },
            IntentKind::CancelOrder => match &classification.entities.order_number {
                Some(number) => self.cancel_order(number).await,
                None => self.handle_unknown(&utterance.text).await,
            },
            IntentKind::Unknown => self.handle_unknown(&utterance.text).await,
        };
        self.finish(intent, handled, state, original)
    }

    /// Build the outcome; collaborator failures roll back to `original`.
    fn finish(
        &self,
        intent: IntentKind,
        handled: Handled,
        next: ConversationState,
        original: ConversationState,
    ) -> RouteOutcome {
        match handled {
            Ok((action, response)) => RouteOutcome {
                action,
                response,
                state: next,
                intent,
                error: (intent == IntentKind::Unknown).then_some(DialogError::ClassificationMiss),
            },
            Err(err) => {
                warn!(intent = %intent, error = %err, "Turn failed, replying with apology");
                RouteOutcome {
                    action: Action::Apology,
                    response: templates::apology(),
                    state: original,
                    intent,
                    error: Some(err),
                }
            }
        }
    }

    async fn call<T, F>(&self, name: &'static str, call: F) -> Result<T, DialogError>
    where
        F: Future<Output = CollaboratorResult<T>>,
    {
        bounded(name, self.config.collaborator_timeout(), call)
            .await
            .map_err(|source| DialogError::CollaboratorUnavailable {
                collaborator: name,
                source,
            })
    }

    // ── Handlers ────────────────────────────────────────────────

    async fn track_order(&self, order_number: &str) -> Handled {
        let order = self
            .call("order_status", self.store.order_status(order_number))
            .await?;
        Ok(match order {
            Some(order) => (Action::Lookup, templates::order_status(&order)),
            None => (Action::Lookup, templates::order_not_found(order_number)),
        })
    }

    async fn cancel_order(&self, order_number: &str) -> Handled {
        let outcome = self
            .call("cancel_order", self.store.cancel_order(order_number))
            .await?;
        let response = match outcome {
            Some(CancellationOutcome::Cancelled { order_number }) => {
                info!(order = %order_number, "Order cancelled");
                templates::cancellation_confirmed(&order_number)
            }
            Some(CancellationOutcome::NotCancellable {
                order_number,
                status,
            }) => templates::cancellation_rejected(&order_number, status),
            None => templates::order_not_found(order_number),
        };
        Ok((Action::Lookup, response))
    }

    async fn search_products(&self, text: &str, category: Option<&str>) -> Handled {
        let terms = search_terms(text);
        let products = self
            .call(
                "search_products",
                self.store
                    .search_products(&terms, category, self.config.result_limit),
            )
            .await?;
        let context = match category {
            Some(category) => category.to_lowercase(),
            None => terms.join(" "),
        };
        if products.is_empty() {
            return Ok((Action::Lookup, templates::no_products(&context)));
        }
        Ok((Action::Lookup, templates::product_list(&products, &context)))
    }

    async fn recommend(&self, user_id: &str, category: Option<&str>) -> Handled {
        let limit = self.config.result_limit;
        let products = self
            .call(
                "recommend",
                self.recommender.recommend(user_id, category, limit),
            )
            .await?;
        if !products.is_empty() {
            return Ok((
                Action::Lookup,
                templates::recommendations(&products, category, true),
            ));
        }

        let popular = self
            .call("popular_products", self.store.popular_products(limit))
            .await?;
        if popular.is_empty() {
            return Ok((Action::Lookup, templates::no_products("")));
        }
        Ok((
            Action::Lookup,
            templates::recommendations(&popular, None, false),
        ))
    }

    /// FAQ lookup, then the generic clarification.
    async fn handle_unknown(&self, text: &str) -> Handled {
        let terms = search_terms(text);
        if terms.is_empty() {
            return Ok((Action::Fallback, templates::fallback()));
        }

        let faqs = self
            .call("search_faq", self.store.search_faq(&terms))
            .await?;
        let Some(entry) = faq::best_match(&terms, &faqs) else {
            return Ok((Action::Fallback, templates::fallback()));
        };

        if let Err(err) = self
            .call("record_faq_hit", self.store.record_faq_hit(entry.id))
            .await
        {
            warn!(faq_id = entry.id, error = %err, "Failed to record FAQ hit");
        }
        Ok((Action::Lookup, templates::faq_answer(&entry.answer)))
    }
}
