use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderSnapshot;
use crate::domain::tailor::TailorSummary;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    OrderStatus,
    TailorList,
    LocationRequest,
    DownloadPrompt,
}

/// Structured data riding along with a bot message, rendered by the widget
/// as a card or actioned directly (store link).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    Order { order: OrderSnapshot },
    Tailors { tailors: Vec<TailorSummary> },
    StoreLink { url: String },
}

/// One entry in the conversation. Immutable once appended to a transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub from_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePayload>,
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    /// A user-authored message. Empty (whitespace-only) input is a domain
    /// violation: the widget never submits it and the API rejects it.
    pub fn from_user(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(DomainError::EmptyMessageText);
        }

        Ok(Self {
            id: MessageId::generate("msg_"),
            text,
            from_user: true,
            timestamp: Utc::now(),
            quick_replies: None,
            payload: None,
            kind: MessageKind::Text,
        })
    }

    pub fn from_bot(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate("bot_"),
            text: text.into(),
            from_user: false,
            timestamp: Utc::now(),
            quick_replies: None,
            payload: None,
            kind: MessageKind::Text,
        }
    }

    pub fn with_quick_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_replies = Some(replies.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Append-only ordered message log for one session. No edits or deletions
/// except a full clear.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        self.messages.last().expect("push guarantees a last element")
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The most recent `count` bot messages, oldest first. Used by the
    /// conversation engine to suppress a canned reply that would repeat a
    /// recent one.
    pub fn recent_bot_messages(&self, count: usize) -> Vec<&Message> {
        let mut recent: Vec<&Message> =
            self.messages.iter().rev().filter(|message| !message.from_user).take(count).collect();
        recent.reverse();
        recent
    }
}
