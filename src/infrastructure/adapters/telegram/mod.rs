//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::domain::entities::{self, CallbackEvent, IncomingMessage, Update};
use crate::domain::traits::{Bot, BotInfo, HelpEntry, KeyboardButton};
use crate::application::errors::BotError;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub date: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<TgMessage>>,
    #[serde(default)]
    pub new_chat_members: Vec<TgUser>,
    pub left_chat_member: Option<TgUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgChat {
    pub id: i64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgCallbackQuery {
    pub id: String,
    pub from: TgUser,
    pub message: Option<TgMessage>,
    pub data: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct MessageResult {
    message_id: i64,
}

impl From<TgUser> for entities::User {
    fn from(user: TgUser) -> Self {
        entities::User {
            id: user.id.to_string(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_bot: user.is_bot,
        }
    }
}

impl From<TgMessage> for IncomingMessage {
    fn from(message: TgMessage) -> Self {
        let mut chat = entities::Chat::new(message.chat.id.to_string());
        chat.title = message.chat.title;
        // channel posts carry no sender
        let from = message
            .from
            .map(entities::User::from)
            .unwrap_or_else(|| entities::User::new(chat.id.clone()));

        let mut incoming = IncomingMessage::new(chat, from, message.text.unwrap_or_default())
            .with_id(message.message_id.to_string())
            .with_platform("telegram")
            .with_new_chat_members(message.new_chat_members.into_iter().map(Into::into).collect());

        if let Some(timestamp) = chrono::DateTime::from_timestamp(message.date, 0) {
            incoming = incoming.with_timestamp(timestamp);
        }
        if let Some(left) = message.left_chat_member {
            incoming = incoming.with_left_chat_member(left.into());
        }
        if let Some(reply) = message.reply_to_message {
            incoming = incoming.with_reply_to((*reply).into());
        }
        incoming
    }
}

impl TgUpdate {
    /// Domain update carried by this Telegram update, if any
    pub fn into_update(self) -> Option<Update> {
        if let Some(query) = self.callback_query {
            let mut event = CallbackEvent::new(query.id, query.from.into(), query.data.unwrap_or_default());
            if let Some(message) = query.message {
                event = event.with_message(message.into());
            }
            return Some(Update::Callback(event));
        }
        self.message.map(|m| Update::Message(m.into()))
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: RwLock<BotInfo>,
    offset: AtomicI64,
    poll_timeout_secs: u64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, poll_timeout_secs: u64) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: RwLock::new(BotInfo {
                id: "unknown".to_string(),
                name: "zincite".to_string(),
                username: "zincite_bot".to_string(),
            }),
            offset: AtomicI64::new(0),
            poll_timeout_secs,
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, BotError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<Res> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        if !data.ok {
            return Err(BotError::Network(format!(
                "Telegram API error ({}): {}",
                status,
                data.description.unwrap_or_default()
            )));
        }
        data.result
            .ok_or_else(|| BotError::Parse(format!("{} returned no result", method)))
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&self) -> Result<BotInfo, BotError> {
        #[derive(Deserialize)]
        struct Me {
            id: i64,
            first_name: String,
            username: String,
        }

        let me: Me = self.call("getMe", &serde_json::json!({})).await?;
        let info = BotInfo {
            id: me.id.to_string(),
            name: me.first_name,
            username: me.username,
        };
        *self.info.write().unwrap_or_else(PoisonError::into_inner) = info.clone();
        Ok(info)
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<TgUpdate>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: u64,
            allowed_updates: Vec<&'static str>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message", "callback_query"],
        };
        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[TgUpdate]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Send a message with specific parse mode
    pub async fn send_message_with_format(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let request = SendMessageRequest { chat_id, text, parse_mode };
        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id.to_string())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", self.token.chars().take(8).collect::<String>());
        let info = self.fetch_bot_info().await?;
        tracing::info!("Bot started: @{}", info.username);
        Ok(())
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>, BotError> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates = self.get_updates(offset, self.poll_timeout_secs).await?;
        if let Some(next) = Self::get_next_offset(&updates) {
            self.offset.store(next, Ordering::SeqCst);
        }
        Ok(updates.into_iter().filter_map(TgUpdate::into_update).collect())
    }

    /// Replies are HTML formatted; falls back to plain text when Telegram rejects the markup
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        match self.send_message_with_format(chat_id, text, Some("HTML")).await {
            Ok(message_id) => Ok(message_id),
            Err(e) => {
                tracing::warn!("HTML failed, using plain text: {}", e);
                self.send_message_with_format(chat_id, text, None).await
            }
        }
    }

    async fn send_with_keyboard(&self, chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        tracing::debug!("Sending with keyboard to {}: {}", chat_id, text);

        #[derive(Serialize)]
        struct InlineKeyboardButton {
            text: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            callback_data: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            url: Option<String>,
        }

        #[derive(Serialize)]
        struct ReplyMarkup {
            inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
        }

        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            parse_mode: &'static str,
            reply_markup: ReplyMarkup,
        }

        // Build inline keyboard
        let inline_keyboard = buttons
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|btn| InlineKeyboardButton {
                        text: btn.text,
                        callback_data: btn.callback_data,
                        url: btn.url,
                    })
                    .collect()
            })
            .collect();

        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup: ReplyMarkup { inline_keyboard },
        };
        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id.to_string())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct AnswerRequest<'a> {
            callback_query_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }

        let request = AnswerRequest {
            callback_query_id: callback_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    /// Register bot commands with Telegram
    async fn set_my_commands(&self, commands: &[HelpEntry]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<Command<'a>>,
        }

        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|entry| Command {
                    command: entry.command.trim_start_matches('/'),
                    description: &entry.description,
                })
                .collect(),
        };

        let _: bool = self.call("setMyCommands", &request).await?;
        tracing::info!("Registered {} bot commands with Telegram", commands.len());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TgUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_message_update() {
        let update = parse(r#"{
            "update_id": 10,
            "message": {
                "message_id": 7,
                "date": 1700000000,
                "from": {"id": 42, "is_bot": false, "first_name": "Ana", "username": "ana"},
                "chat": {"id": -100, "title": "Group"},
                "text": "/roll 6",
                "reply_to_message": {
                    "message_id": 6,
                    "date": 1699999999,
                    "chat": {"id": -100},
                    "text": "earlier"
                }
            }
        }"#);

        match update.into_update() {
            Some(Update::Message(message)) => {
                assert_eq!(message.id, "7");
                assert_eq!(message.text, "/roll 6");
                assert_eq!(message.from.id, "42");
                assert!(message.chat.is_group());
                assert_eq!(message.timestamp.timestamp(), 1700000000);
                assert_eq!(message.reply_to.map(|r| r.text), Some("earlier".to_string()));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_callback_query_update() {
        let update = parse(r#"{
            "update_id": 11,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 42, "first_name": "Ana"},
                "data": "vote#yes",
                "message": {"message_id": 8, "date": 1700000000, "chat": {"id": 5}}
            }
        }"#);

        match update.into_update() {
            Some(Update::Callback(event)) => {
                assert_eq!(event.tag(), "vote");
                assert_eq!(event.payload(), Some("yes"));
                assert_eq!(event.chat_id(), Some("5"));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_membership_update() {
        let update = parse(r#"{
            "update_id": 12,
            "message": {
                "message_id": 9,
                "date": 1700000000,
                "chat": {"id": -7},
                "new_chat_members": [{"id": 1, "first_name": "New"}]
            }
        }"#);

        match update.into_update() {
            Some(Update::Message(message)) => {
                assert_eq!(message.new_chat_members.len(), 1);
                assert!(message.text.is_empty());
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_next_offset() {
        let updates = vec![
            parse(r#"{"update_id": 3}"#),
            parse(r#"{"update_id": 5}"#),
        ];
        assert_eq!(TelegramAdapter::get_next_offset(&updates), Some(6));
        assert_eq!(TelegramAdapter::get_next_offset(&[]), None);
    }
}
