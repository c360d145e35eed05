use super::{Chat, User};
use chrono::{DateTime, Utc};

/// Separator between the routing tag and the rest of a callback payload
pub const CALLBACK_TAG_SEPARATOR: char = '#';

/// A text message delivered by a transport
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: String,
    pub chat: Chat,
    pub from: User,
    pub text: String,
    pub reply_to: Option<Box<IncomingMessage>>,
    pub timestamp: DateTime<Utc>,
    pub new_chat_members: Vec<User>,
    pub left_chat_member: Option<User>,
    pub platform: String,
    pub raw: Option<serde_json::Value>,
}

impl IncomingMessage {
    pub fn new(chat: Chat, from: User, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat,
            from,
            text: text.into(),
            reply_to: None,
            timestamp: Utc::now(),
            new_chat_members: Vec::new(),
            left_chat_member: None,
            platform: "unknown".to_string(),
            raw: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_reply_to(mut self, message: IncomingMessage) -> Self {
        self.reply_to = Some(Box::new(message));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_new_chat_members(mut self, members: Vec<User>) -> Self {
        self.new_chat_members = members;
        self
    }

    pub fn with_left_chat_member(mut self, member: User) -> Self {
        self.left_chat_member = Some(member);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Follow-up interaction on a previously sent message (e.g. an inline button press)
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub id: String,
    pub from: User,
    pub message: Option<IncomingMessage>,
    pub data: String,
}

impl CallbackEvent {
    pub fn new(id: impl Into<String>, from: User, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from,
            message: None,
            data: data.into(),
        }
    }

    pub fn with_message(mut self, message: IncomingMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// Routing tag: the payload up to the first `#`
    pub fn tag(&self) -> &str {
        self.data
            .split(CALLBACK_TAG_SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    /// Everything after the first `#`, if any
    pub fn payload(&self) -> Option<&str> {
        self.data
            .split_once(CALLBACK_TAG_SEPARATOR)
            .map(|(_, rest)| rest)
    }

    /// Chat of the originating message, when the transport delivered one
    pub fn chat_id(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.chat.id.as_str())
    }
}

/// Anything a transport can hand to the host
#[derive(Debug, Clone)]
pub enum Update {
    Message(IncomingMessage),
    Callback(CallbackEvent),
}
