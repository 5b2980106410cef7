use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use tailorlink_core::{Coordinates, DomainError, Message, SessionId};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    UserMessage(UserMessageEvent),
    QuickReply(QuickReplyEvent),
    ClearChat(ClearChatEvent),
}

impl WidgetEvent {
    pub fn event_type(&self) -> WidgetEventType {
        match self {
            Self::UserMessage(_) => WidgetEventType::UserMessage,
            Self::QuickReply(_) => WidgetEventType::QuickReply,
            Self::ClearChat(_) => WidgetEventType::ClearChat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetEventType {
    UserMessage,
    QuickReply,
    ClearChat,
}

/// Free text typed into the widget. Coordinates ride along when the browser
/// granted geolocation for this turn.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UserMessageEvent {
    pub session_id: Option<SessionId>,
    pub text: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

/// A tapped quick-reply shortcut.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct QuickReplyEvent {
    pub session_id: Option<SessionId>,
    pub label: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ClearChatEvent {
    pub session_id: SessionId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// Messages appended by handling one event, addressed to the session that
/// owns them (freshly generated when the widget had none yet).
#[derive(Clone, Debug, PartialEq)]
pub struct EventReply {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandlerResult {
    Responded(EventReply),
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("chat turn handler failure: {0}")]
    Turn(String),
    #[error("clear chat handler failure: {0}")]
    Clear(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> WidgetEventType;
    async fn handle(
        &self,
        event: &WidgetEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<WidgetEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &WidgetEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use tailorlink_core::{Message, SessionId};

    use super::{
        EventContext, EventDispatcher, EventHandler, EventHandlerError, EventReply, HandlerResult,
        UserMessageEvent, WidgetEvent, WidgetEventType,
    };

    struct EchoHandler;

    #[async_trait]
    impl EventHandler for EchoHandler {
        fn event_type(&self) -> WidgetEventType {
            WidgetEventType::UserMessage
        }

        async fn handle(
            &self,
            event: &WidgetEvent,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            let WidgetEvent::UserMessage(event) = event else {
                return Ok(HandlerResult::Ignored);
            };

            Ok(HandlerResult::Responded(EventReply {
                session_id: event.session_id.clone().unwrap_or_else(SessionId::generate),
                messages: vec![Message::from_bot(format!("echo: {}", event.text))],
            }))
        }
    }

    fn user_message(text: &str) -> WidgetEvent {
        WidgetEvent::UserMessage(UserMessageEvent {
            session_id: Some(SessionId("sess_test".to_string())),
            text: text.to_string(),
            location: None,
        })
    }

    #[tokio::test]
    async fn dispatcher_routes_to_the_registered_handler() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(EchoHandler);

        let result = dispatcher
            .dispatch(&user_message("hello"), &EventContext::default())
            .await
            .expect("dispatch");

        let HandlerResult::Responded(reply) = result else {
            panic!("expected a response");
        };
        assert_eq!(reply.messages[0].text, "echo: hello");
        assert_eq!(reply.session_id, SessionId("sess_test".to_string()));
    }

    #[tokio::test]
    async fn dispatcher_ignores_events_without_a_handler() {
        let dispatcher = EventDispatcher::new();

        let result = dispatcher
            .dispatch(&user_message("hello"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let event: WidgetEvent = serde_json::from_str(
            r#"{
                "type": "user_message",
                "session_id": "sess_abc",
                "text": "find a tailor",
                "location": {"latitude": 5.6, "longitude": -0.2}
            }"#,
        )
        .expect("deserialize");

        let WidgetEvent::UserMessage(event) = event else {
            panic!("expected a user message event");
        };
        assert_eq!(event.text, "find a tailor");
        assert_eq!(event.location.map(|position| position.latitude), Some(5.6));
    }

    #[test]
    fn clear_event_requires_a_session_id() {
        let result = serde_json::from_str::<WidgetEvent>(r#"{"type": "clear_chat"}"#);
        assert!(result.is_err());

        let event: WidgetEvent =
            serde_json::from_str(r#"{"type": "clear_chat", "session_id": "sess_abc"}"#)
                .expect("deserialize");
        assert_eq!(event.event_type(), WidgetEventType::ClearChat);
    }
}
