//! Chat API the embedded widget talks to.
//!
//! Endpoints:
//! - `POST /api/v1/chat/events`  — one widget event (user message, quick
//!   reply, clear); returns the messages appended by the turn
//! - `GET  /api/v1/chat/history` — the session transcript, seeding the
//!   welcome greeting into an empty log
//!
//! Storage is best-effort throughout: a read or write failure is logged and
//! the in-memory transcript carries the turn.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use tailorlink_assistant::conversation::{ConversationEngine, TurnInput};
use tailorlink_core::{ApplicationError, InterfaceError, Message, SessionId, Transcript};
use tailorlink_store::{
    DebouncedTranscriptWriter, SessionRecord, SessionRepository, TranscriptRepository,
};
use tailorlink_widget::{
    card_for, ClearChatEvent, DispatchError, EventContext, EventDispatcher, EventHandler,
    EventHandlerError, EventReply, HandlerResult, MessageCard, QuickReplyEvent, UserMessageEvent,
    WidgetEvent, WidgetEventType,
};

#[derive(Clone)]
pub struct ChatState {
    dispatcher: Arc<EventDispatcher>,
    service: Arc<ChatService>,
}

/// Everything one turn needs: the engine, both repositories, and the
/// debounced writer that persists transcripts after each change.
pub struct ChatService {
    engine: ConversationEngine,
    sessions: Arc<dyn SessionRepository>,
    transcripts: Arc<dyn TranscriptRepository>,
    writer: Arc<DebouncedTranscriptWriter>,
}

impl ChatService {
    pub fn new(
        engine: ConversationEngine,
        sessions: Arc<dyn SessionRepository>,
        transcripts: Arc<dyn TranscriptRepository>,
        writer: Arc<DebouncedTranscriptWriter>,
    ) -> Arc<Self> {
        Arc::new(Self { engine, sessions, transcripts, writer })
    }

    /// Reuse the widget-supplied session id, registering it on first
    /// contact; generate one when the widget has none yet.
    async fn resolve_session(&self, requested: Option<SessionId>) -> SessionId {
        let id = requested.unwrap_or_else(SessionId::generate);

        match self.sessions.find_by_id(&id).await {
            Ok(Some(_)) => id,
            Ok(None) => {
                if let Err(error) = self.sessions.save(SessionRecord::new(id.clone())).await {
                    warn!(
                        event_name = "chat.session.save_failed",
                        session_id = %id,
                        error = %error,
                        "session save failed, continuing unpersisted"
                    );
                }
                id
            }
            Err(error) => {
                warn!(
                    event_name = "chat.session.read_failed",
                    session_id = %id,
                    error = %error,
                    "session read failed, continuing unpersisted"
                );
                id
            }
        }
    }

    async fn load_transcript(&self, id: &SessionId) -> Transcript {
        if let Some(pending) = self.writer.pending_snapshot(id).await {
            return pending;
        }

        match self.transcripts.load(id).await {
            Ok(Some(transcript)) => transcript,
            Ok(None) => Transcript::new(),
            Err(error) => {
                warn!(
                    event_name = "chat.transcript.read_failed",
                    session_id = %id,
                    error = %error,
                    "transcript read failed, starting from an empty log"
                );
                Transcript::new()
            }
        }
    }

    async fn user_message(
        &self,
        event: &UserMessageEvent,
        ctx: &EventContext,
    ) -> Result<EventReply, EventHandlerError> {
        let session_id = self.resolve_session(event.session_id.clone()).await;
        let mut transcript = self.load_transcript(&session_id).await;

        let mut messages = Vec::new();
        messages.extend(self.engine.ensure_welcome(&mut transcript));

        let outcome = self
            .engine
            .user_turn(
                &mut transcript,
                TurnInput { text: event.text.clone(), location: event.location },
            )
            .await?;

        self.writer.queue(&session_id, transcript.clone()).await;
        info!(
            event_name = "chat.turn.completed",
            correlation_id = %ctx.correlation_id,
            session_id = %session_id,
            intent = outcome.classification.intent.as_str(),
            confidence = outcome.classification.confidence,
            replies = outcome.bot_messages.len(),
            "user turn completed"
        );

        messages.extend(outcome.user_message);
        messages.extend(outcome.bot_messages);
        Ok(EventReply { session_id, messages })
    }

    async fn quick_reply(
        &self,
        event: &QuickReplyEvent,
        ctx: &EventContext,
    ) -> Result<EventReply, EventHandlerError> {
        let session_id = self.resolve_session(event.session_id.clone()).await;
        let mut transcript = self.load_transcript(&session_id).await;

        let mut messages = Vec::new();
        messages.extend(self.engine.ensure_welcome(&mut transcript));

        let outcome = self
            .engine
            .quick_reply_turn(&mut transcript, &event.label, event.location)
            .await?;

        self.writer.queue(&session_id, transcript.clone()).await;
        info!(
            event_name = "chat.quick_reply.completed",
            correlation_id = %ctx.correlation_id,
            session_id = %session_id,
            intent = outcome.classification.intent.as_str(),
            "quick reply completed"
        );

        messages.extend(outcome.user_message);
        messages.extend(outcome.bot_messages);
        Ok(EventReply { session_id, messages })
    }

    /// Empty the log and drop the persisted blob. The session id survives
    /// and keeps being reused by the widget.
    async fn clear(&self, event: &ClearChatEvent, ctx: &EventContext) -> EventReply {
        self.writer.cancel(&event.session_id).await;

        if let Err(error) = self.transcripts.clear(&event.session_id).await {
            warn!(
                event_name = "chat.history.clear_failed",
                session_id = %event.session_id,
                error = %error,
                "clearing the persisted transcript failed"
            );
        }

        info!(
            event_name = "chat.history.cleared",
            correlation_id = %ctx.correlation_id,
            session_id = %event.session_id,
            "chat history cleared"
        );
        EventReply { session_id: event.session_id.clone(), messages: Vec::new() }
    }

    async fn history(&self, requested: Option<SessionId>) -> EventReply {
        let session_id = self.resolve_session(requested).await;
        let mut transcript = self.load_transcript(&session_id).await;

        if self.engine.ensure_welcome(&mut transcript).is_some() {
            self.writer.queue(&session_id, transcript.clone()).await;
        }

        EventReply { session_id, messages: transcript.messages().to_vec() }
    }
}

struct UserMessageHandler {
    service: Arc<ChatService>,
}

#[async_trait]
impl EventHandler for UserMessageHandler {
    fn event_type(&self) -> WidgetEventType {
        WidgetEventType::UserMessage
    }

    async fn handle(
        &self,
        event: &WidgetEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let WidgetEvent::UserMessage(event) = event else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.user_message(event, ctx).await.map(HandlerResult::Responded)
    }
}

struct QuickReplyHandler {
    service: Arc<ChatService>,
}

#[async_trait]
impl EventHandler for QuickReplyHandler {
    fn event_type(&self) -> WidgetEventType {
        WidgetEventType::QuickReply
    }

    async fn handle(
        &self,
        event: &WidgetEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let WidgetEvent::QuickReply(event) = event else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.quick_reply(event, ctx).await.map(HandlerResult::Responded)
    }
}

struct ClearChatHandler {
    service: Arc<ChatService>,
}

#[async_trait]
impl EventHandler for ClearChatHandler {
    fn event_type(&self) -> WidgetEventType {
        WidgetEventType::ClearChat
    }

    async fn handle(
        &self,
        event: &WidgetEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let WidgetEvent::ClearChat(event) = event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(HandlerResult::Responded(self.service.clear(event, ctx).await))
    }
}

fn build_dispatcher(service: Arc<ChatService>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(UserMessageHandler { service: service.clone() });
    dispatcher.register(QuickReplyHandler { service: service.clone() });
    dispatcher.register(ClearChatHandler { service });
    dispatcher
}

pub fn router(service: Arc<ChatService>) -> Router {
    let dispatcher = Arc::new(build_dispatcher(service.clone()));
    Router::new()
        .route("/api/v1/chat/events", post(post_event))
        .route("/api/v1/chat/history", get(get_history))
        .with_state(ChatState { dispatcher, service })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WireMessage {
    #[serde(flatten)]
    message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<MessageCard>,
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        let card = card_for(&message);
        Self { message, card }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReplyBody {
    pub session_id: SessionId,
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatError {
    pub error: String,
    pub correlation_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

fn reply_body(reply: EventReply) -> ChatReplyBody {
    ChatReplyBody {
        session_id: reply.session_id,
        messages: reply.messages.into_iter().map(WireMessage::from).collect(),
    }
}

fn event_session(event: &WidgetEvent) -> Option<SessionId> {
    match event {
        WidgetEvent::UserMessage(event) => event.session_id.clone(),
        WidgetEvent::QuickReply(event) => event.session_id.clone(),
        WidgetEvent::ClearChat(event) => Some(event.session_id.clone()),
    }
}

fn map_dispatch_error(error: DispatchError, ctx: &EventContext) -> (StatusCode, Json<ChatError>) {
    let DispatchError::Handler(handler_error) = error;
    let application_error = match handler_error {
        EventHandlerError::Domain(domain_error) => ApplicationError::Domain(domain_error),
        EventHandlerError::Turn(message) | EventHandlerError::Clear(message) => {
            ApplicationError::Integration(message)
        }
    };

    let interface_error = application_error.into_interface(ctx.correlation_id.clone());
    let status = match interface_error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ChatError {
            error: interface_error.user_message().to_string(),
            correlation_id: ctx.correlation_id.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn post_event(
    State(state): State<ChatState>,
    Json(event): Json<WidgetEvent>,
) -> Result<Json<ChatReplyBody>, (StatusCode, Json<ChatError>)> {
    let ctx = EventContext { correlation_id: Uuid::new_v4().to_string() };

    match state.dispatcher.dispatch(&event, &ctx).await {
        Ok(HandlerResult::Responded(reply)) => Ok(Json(reply_body(reply))),
        Ok(HandlerResult::Processed) | Ok(HandlerResult::Ignored) => Ok(Json(ChatReplyBody {
            session_id: event_session(&event).unwrap_or_else(SessionId::generate),
            messages: Vec::new(),
        })),
        Err(error) => Err(map_dispatch_error(error, &ctx)),
    }
}

async fn get_history(
    State(state): State<ChatState>,
    Query(query): Query<HistoryQuery>,
) -> Json<ChatReplyBody> {
    let requested = query.session_id.filter(|id| !id.trim().is_empty()).map(SessionId);
    Json(reply_body(state.service.history(requested).await))
}
