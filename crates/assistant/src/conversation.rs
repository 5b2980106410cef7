use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use tailorlink_core::config::ChatConfig;
use tailorlink_core::{Coordinates, DomainError, Message, OrderSnapshot, TailorSummary, Transcript};

use crate::catalog;
use crate::intent::{
    clean_order_number, extract_order_number, Intent, IntentClassification, IntentClassifier,
    CONFIDENCE_MATCHED,
};

/// Order lookup seam. Implementations fetch a fresh snapshot per query and
/// report "not found" as `Ok(None)`; transport errors surface as `Err` and
/// the engine downgrades them to a not-found reply.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn track_order(&self, order_number: &str) -> Result<Option<OrderSnapshot>>;
}

/// Nearby-tailor search seam. An empty result list means "no tailors around";
/// transport errors are downgraded the same way.
#[async_trait]
pub trait TailorDirectory: Send + Sync {
    async fn find_nearby(
        &self,
        position: Coordinates,
        service_type: Option<&str>,
    ) -> Result<Vec<TailorSummary>>;
}

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub typing_delay: Duration,
    pub dedup_window: usize,
    pub app_store_url: String,
}

impl EngineSettings {
    pub fn from_config(chat: &ChatConfig) -> Self {
        Self {
            typing_delay: Duration::from_millis(chat.typing_delay_ms),
            dedup_window: chat.dedup_window,
            app_store_url: chat.app_store_url.clone(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&tailorlink_core::config::AppConfig::default().chat)
    }
}

/// What the widget reported for one turn: the raw text plus coordinates, when
/// the browser granted geolocation for this exchange.
#[derive(Clone, Debug)]
pub struct TurnInput {
    pub text: String,
    pub location: Option<Coordinates>,
}

/// Messages appended by one turn. Quick-reply download shortcuts append no
/// user message.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub user_message: Option<Message>,
    pub bot_messages: Vec<Message>,
    pub classification: IntentClassification,
}

pub struct ConversationEngine {
    classifier: IntentClassifier,
    settings: EngineSettings,
    orders: Arc<dyn OrderService>,
    tailors: Arc<dyn TailorDirectory>,
}

impl ConversationEngine {
    pub fn new(
        settings: EngineSettings,
        orders: Arc<dyn OrderService>,
        tailors: Arc<dyn TailorDirectory>,
    ) -> Self {
        Self { classifier: IntentClassifier::new(), settings, orders, tailors }
    }

    /// Seed the welcome greeting into an empty transcript. Returns the
    /// appended message, or `None` when the transcript already has history.
    pub fn ensure_welcome(&self, transcript: &mut Transcript) -> Option<Message> {
        if !transcript.is_empty() {
            return None;
        }
        Some(transcript.append(catalog::welcome_message()).clone())
    }

    /// Run one user-authored turn: append the user message, classify, branch,
    /// and append the bot replies (each preceded by the typing delay).
    pub async fn user_turn(
        &self,
        transcript: &mut Transcript,
        input: TurnInput,
    ) -> Result<TurnOutcome, DomainError> {
        let user_message = transcript.append(Message::from_user(&input.text)?).clone();
        let classification = self.classifier.classify(&user_message.text);
        debug!(
            event_name = "chat.turn.classified",
            intent = classification.intent.as_str(),
            confidence = classification.confidence,
            "classified user input"
        );

        let replies = match classification.intent {
            Intent::OrderTracking => self.order_tracking_flow(&user_message.text).await,
            Intent::FindTailor | Intent::Location => {
                self.find_tailor_flow(&user_message.text, input.location).await
            }
            Intent::Download => vec![self.download_confirmation()],
            intent => vec![self.canned_with_dedup(transcript, intent)],
        };

        let bot_messages = self.append_replies(transcript, replies).await;
        Ok(TurnOutcome { user_message: Some(user_message), bot_messages, classification })
    }

    /// Run a tapped quick reply. Download-flavored labels jump straight to
    /// the download confirmation without echoing a user message; everything
    /// else is an ordinary turn with the label as text.
    pub async fn quick_reply_turn(
        &self,
        transcript: &mut Transcript,
        label: &str,
        location: Option<Coordinates>,
    ) -> Result<TurnOutcome, DomainError> {
        if is_download_shortcut(label) {
            let bot_messages =
                self.append_replies(transcript, vec![self.download_confirmation()]).await;
            return Ok(TurnOutcome {
                user_message: None,
                bot_messages,
                classification: IntentClassification {
                    intent: Intent::Download,
                    confidence: CONFIDENCE_MATCHED,
                },
            });
        }

        self.user_turn(transcript, TurnInput { text: label.to_string(), location }).await
    }

    async fn order_tracking_flow(&self, text: &str) -> Vec<Message> {
        let Some(raw_number) = extract_order_number(text) else {
            return vec![catalog::order_number_prompt()];
        };

        let order_number = clean_order_number(&raw_number);
        let lookup = self.orders.track_order(&order_number).await.unwrap_or_else(|error| {
            warn!(
                event_name = "chat.order_lookup.failed",
                order_number = %order_number,
                error = %error,
                "order lookup failed, treating as not found"
            );
            None
        });

        match lookup {
            Some(order) => vec![catalog::order_status_message(order)],
            None => vec![catalog::order_not_found_message(&order_number)],
        }
    }

    async fn find_tailor_flow(&self, text: &str, location: Option<Coordinates>) -> Vec<Message> {
        let normalized = text.to_lowercase();

        if normalized.contains("download") || normalized.contains("app") {
            return vec![self.download_confirmation()];
        }

        if !(normalized.contains("yes") || normalized.contains("use my location")) {
            return vec![catalog::location_permission_message()];
        }

        let Some(position) = location else {
            return vec![catalog::location_unavailable_message()];
        };

        let tailors = self.tailors.find_nearby(position, None).await.unwrap_or_else(|error| {
            warn!(
                event_name = "chat.tailor_search.failed",
                error = %error,
                "tailor search failed, treating as no results"
            );
            Vec::new()
        });

        if tailors.is_empty() {
            vec![catalog::no_tailors_message()]
        } else {
            vec![catalog::tailors_found_message(tailors)]
        }
    }

    /// Canned reply for `intent`, unless it would repeat one of the recent
    /// bot messages (same text or same quick-reply list); then the unknown
    /// fallback is substituted to break the loop.
    fn canned_with_dedup(&self, transcript: &Transcript, intent: Intent) -> Message {
        let candidate = catalog::canned(intent);
        let recent = transcript.recent_bot_messages(self.settings.dedup_window);

        let duplicate = recent.iter().any(|message| {
            message.text == candidate.text
                || message
                    .quick_replies
                    .as_ref()
                    .is_some_and(|replies| replies == candidate.quick_replies)
        });

        if duplicate {
            catalog::canned_message(Intent::Unknown)
        } else {
            catalog::canned_message(intent)
        }
    }

    fn download_confirmation(&self) -> Message {
        catalog::download_confirmation_message(&self.settings.app_store_url)
    }

    async fn append_replies(
        &self,
        transcript: &mut Transcript,
        replies: Vec<Message>,
    ) -> Vec<Message> {
        let mut appended = Vec::with_capacity(replies.len());
        for reply in replies {
            self.typing_pause().await;
            appended.push(transcript.append(reply).clone());
        }
        appended
    }

    // Cosmetic only: the widget shows its typing indicator while this sleeps.
    async fn typing_pause(&self) {
        if !self.settings.typing_delay.is_zero() {
            tokio::time::sleep(self.settings.typing_delay).await;
        }
    }
}

fn is_download_shortcut(label: &str) -> bool {
    label.to_lowercase().contains("download")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use tailorlink_core::{
        Coordinates, DomainError, MessageKind, MessagePayload, OrderSnapshot, OrderStage,
        TailorSummary, Transcript,
    };

    use super::{
        ConversationEngine, EngineSettings, OrderService, TailorDirectory, TurnInput,
    };
    use crate::catalog;
    use crate::intent::Intent;

    struct FakeOrders {
        snapshot: Option<OrderSnapshot>,
        fail: bool,
    }

    #[async_trait]
    impl OrderService for FakeOrders {
        async fn track_order(&self, order_number: &str) -> Result<Option<OrderSnapshot>> {
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self
                .snapshot
                .clone()
                .filter(|snapshot| snapshot.order_number == order_number))
        }
    }

    struct FakeTailors {
        results: Vec<TailorSummary>,
        fail: bool,
    }

    #[async_trait]
    impl TailorDirectory for FakeTailors {
        async fn find_nearby(
            &self,
            _position: Coordinates,
            _service_type: Option<&str>,
        ) -> Result<Vec<TailorSummary>> {
            if self.fail {
                return Err(anyhow!("timeout"));
            }
            Ok(self.results.clone())
        }
    }

    fn engine_with(orders: FakeOrders, tailors: FakeTailors) -> ConversationEngine {
        let settings = EngineSettings {
            typing_delay: Duration::ZERO,
            dedup_window: 3,
            app_store_url: "https://store.example/app".to_string(),
        };
        ConversationEngine::new(settings, Arc::new(orders), Arc::new(tailors))
    }

    fn engine() -> ConversationEngine {
        engine_with(
            FakeOrders { snapshot: None, fail: false },
            FakeTailors { results: Vec::new(), fail: false },
        )
    }

    fn order_fixture() -> OrderSnapshot {
        OrderSnapshot {
            order_number: "ORD-ABC1234567".to_string(),
            stage: OrderStage::InProgress,
            tailor_label: "Tailor #7".to_string(),
            customer_name: "Kofi Mensah".to_string(),
            customer_phone: "+233501234567".to_string(),
            garment: "Two-piece suit".to_string(),
            price: 650.0,
            due_amount: 200.0,
            due_date: "2026-08-28T00:00:00Z".to_string(),
            last_updated: "2026-08-05T12:00:00Z".to_string(),
            measurements: vec![],
        }
    }

    fn tailor_fixture() -> TailorSummary {
        TailorSummary {
            id: "t-1".to_string(),
            name: "Adjei Bespoke".to_string(),
            rating: 4.9,
            specialties: vec!["suits".to_string()],
            distance_km: 1.2,
            price_range: "GH₵ 100 - 400".to_string(),
            available: true,
        }
    }

    fn turn(text: &str) -> TurnInput {
        TurnInput { text: text.to_string(), location: None }
    }

    fn located_turn(text: &str) -> TurnInput {
        TurnInput {
            text: text.to_string(),
            location: Some(Coordinates { latitude: 5.6037, longitude: -0.187 }),
        }
    }

    #[tokio::test]
    async fn welcome_is_seeded_exactly_once() {
        let engine = engine();
        let mut transcript = Transcript::new();

        assert!(engine.ensure_welcome(&mut transcript).is_some());
        assert!(engine.ensure_welcome(&mut transcript).is_none());
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn order_turn_with_number_renders_status_message() {
        let engine = engine_with(
            FakeOrders { snapshot: Some(order_fixture()), fail: false },
            FakeTailors { results: Vec::new(), fail: false },
        );
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("track ORD-ABC1234567"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.classification.intent, Intent::OrderTracking);
        assert_eq!(outcome.bot_messages.len(), 1);
        let reply = &outcome.bot_messages[0];
        assert_eq!(reply.kind, MessageKind::OrderStatus);
        assert!(reply.text.contains("**ORD-ABC1234567**"));
        assert!(matches!(reply.payload, Some(MessagePayload::Order { .. })));
        // user message + bot reply both landed in the transcript
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn order_turn_cleans_pasted_hash_markers_before_lookup() {
        let engine = engine_with(
            FakeOrders { snapshot: Some(order_fixture()), fail: false },
            FakeTailors { results: Vec::new(), fail: false },
        );
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("# ORD-ABC1234567"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.bot_messages[0].kind, MessageKind::OrderStatus);
    }

    #[tokio::test]
    async fn unknown_order_number_offers_recovery_options() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("track ORD-MISSING999"))
            .await
            .expect("turn should succeed");

        let reply = &outcome.bot_messages[0];
        assert!(reply.text.contains("couldn't find order \"ORD-MISSING999\""));
        assert_eq!(
            reply.quick_replies.as_deref().map(|replies| replies.len()),
            Some(4)
        );
    }

    #[tokio::test]
    async fn order_lookup_transport_failure_is_downgraded_to_not_found() {
        let engine = engine_with(
            FakeOrders { snapshot: None, fail: true },
            FakeTailors { results: Vec::new(), fail: false },
        );
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("track ORD-ABC1234567"))
            .await
            .expect("transport failure must not surface");

        assert!(outcome.bot_messages[0].text.contains("couldn't find order"));
    }

    #[tokio::test]
    async fn order_turn_without_number_prompts_for_one() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("where is my order"))
            .await
            .expect("turn should succeed");

        assert!(outcome.bot_messages[0].text.contains("provide your order number"));
    }

    #[tokio::test]
    async fn tailor_turn_first_asks_for_location_permission() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("I need a tailor"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.bot_messages[0].kind, MessageKind::LocationRequest);
        assert!(outcome.bot_messages[0].text.contains("Is it okay"));
    }

    #[tokio::test]
    async fn affirmative_tailor_turn_with_location_lists_results() {
        let engine = engine_with(
            FakeOrders { snapshot: None, fail: false },
            FakeTailors { results: vec![tailor_fixture()], fail: false },
        );
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, located_turn("yes, find a tailor near me"))
            .await
            .expect("turn should succeed");

        let reply = &outcome.bot_messages[0];
        assert_eq!(reply.kind, MessageKind::TailorList);
        assert!(reply.text.contains("I found 1 expert tailors"));
        assert!(matches!(
            reply.payload,
            Some(MessagePayload::Tailors { ref tailors }) if tailors.len() == 1
        ));
    }

    #[tokio::test]
    async fn missing_coordinates_on_affirmative_turn_fall_back_to_location_request() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("yes use my location, any tailor nearby?"))
            .await
            .expect("turn should succeed");

        let reply = &outcome.bot_messages[0];
        assert_eq!(reply.kind, MessageKind::LocationRequest);
        assert!(reply.text.contains("couldn't access your location"));
    }

    #[tokio::test]
    async fn empty_search_results_suggest_widening_the_radius() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, located_turn("yes, tailor near me please"))
            .await
            .expect("turn should succeed");

        assert!(outcome.bot_messages[0].text.contains("couldn't find any tailors"));
    }

    #[tokio::test]
    async fn tailor_search_transport_failure_reads_as_no_results() {
        let engine = engine_with(
            FakeOrders { snapshot: None, fail: false },
            FakeTailors { results: Vec::new(), fail: true },
        );
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, located_turn("yes, tailor near me please"))
            .await
            .expect("transport failure must not surface");

        assert!(outcome.bot_messages[0].text.contains("couldn't find any tailors"));
    }

    #[tokio::test]
    async fn tailor_turn_mentioning_the_app_short_circuits_to_download() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("tailor via the app instead"))
            .await
            .expect("turn should succeed");

        let reply = &outcome.bot_messages[0];
        assert_eq!(reply.kind, MessageKind::DownloadPrompt);
        assert!(matches!(
            reply.payload,
            Some(MessagePayload::StoreLink { ref url }) if url == "https://store.example/app"
        ));
    }

    #[tokio::test]
    async fn repeated_canned_reply_is_replaced_by_the_unknown_fallback() {
        let engine = engine();
        let mut transcript = Transcript::new();

        // Three identical canned pricing replies already on the log.
        for _ in 0..3 {
            transcript.append(catalog::canned_message(Intent::Pricing));
        }

        let outcome = engine
            .user_turn(&mut transcript, turn("price please"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.classification.intent, Intent::Pricing);
        assert_eq!(outcome.bot_messages[0].text, catalog::canned(Intent::Unknown).text);
    }

    #[tokio::test]
    async fn fresh_canned_reply_is_not_deduplicated() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .user_turn(&mut transcript, turn("price please"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.bot_messages[0].text, catalog::canned(Intent::Pricing).text);
    }

    #[tokio::test]
    async fn dedup_only_looks_at_the_recent_window() {
        let engine = engine();
        let mut transcript = Transcript::new();

        // One old pricing reply pushed out of the three-message window.
        transcript.append(catalog::canned_message(Intent::Pricing));
        transcript.append(catalog::canned_message(Intent::Greeting));
        transcript.append(catalog::canned_message(Intent::Delivery));
        transcript.append(catalog::canned_message(Intent::Support));

        let outcome = engine
            .user_turn(&mut transcript, turn("price please"))
            .await
            .expect("turn should succeed");

        assert_eq!(outcome.bot_messages[0].text, catalog::canned(Intent::Pricing).text);
    }

    #[tokio::test]
    async fn quick_reply_download_shortcut_appends_no_user_message() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .quick_reply_turn(&mut transcript, "Download Now", None)
            .await
            .expect("quick reply should succeed");

        assert!(outcome.user_message.is_none());
        assert_eq!(outcome.classification.intent, Intent::Download);
        assert_eq!(outcome.bot_messages[0].kind, MessageKind::DownloadPrompt);
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn regular_quick_reply_runs_a_full_turn() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let outcome = engine
            .quick_reply_turn(&mut transcript, "Track my order", None)
            .await
            .expect("quick reply should succeed");

        assert!(outcome.user_message.is_some());
        assert_eq!(outcome.classification.intent, Intent::OrderTracking);
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn whitespace_only_input_is_rejected_as_a_domain_error() {
        let engine = engine();
        let mut transcript = Transcript::new();

        let error = engine
            .user_turn(&mut transcript, turn("   "))
            .await
            .expect_err("empty input must be rejected");

        assert!(matches!(error, DomainError::EmptyMessageText));
        assert!(transcript.is_empty());
    }
}
