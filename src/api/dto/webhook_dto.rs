//! Subset of the Telegram Bot API `Update` object consumed by the webhook.
//!
//! Unknown fields are ignored, so any update type deserializes; only
//! `chat_join_request` updates carry work.

use serde::Deserialize;

use crate::domain::{DestinationKey, JoinEvent};

/// Incoming webhook payload.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    /// Monotonic update id assigned by the platform.
    #[serde(default)]
    pub update_id: Option<i64>,
    /// Present when a user asked to join a chat the bot administers.
    #[serde(default)]
    pub chat_join_request: Option<ChatJoinRequest>,
}

/// A pending join request.
#[derive(Debug, Deserialize)]
pub struct ChatJoinRequest {
    /// Chat the user wants to join.
    pub chat: TelegramChat,
    /// User who sent the request.
    pub from: TelegramUser,
}

/// Chat descriptor.
#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    /// Chat id; channels use large negative ids.
    pub id: i64,
    /// Chat title.
    #[serde(default)]
    pub title: Option<String>,
}

/// User descriptor.
#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    /// User id.
    pub id: i64,
    /// Optional `@username`.
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUpdate {
    /// Extracts the join event, if this update carries one.
    #[must_use]
    pub fn into_join_event(self) -> Option<JoinEvent> {
        let request = self.chat_join_request?;
        Some(JoinEvent {
            update_id: self.update_id,
            user_id: request.from.id.to_string(),
            username: request.from.username,
            chat_id: DestinationKey::from_chat_id(request.chat.id),
            chat_title: request.chat.title,
        })
    }
}
