//! Telegram Bot API client for approving join requests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{JoinApprover, TransportError, ensure_success};
use crate::domain::DestinationKey;

/// Calls `approveChatJoinRequest` on the Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    /// Creates a client for the bot identified by `bot_token`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(api_base: &str, bot_token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl JoinApprover for TelegramClient {
    async fn approve(
        &self,
        chat_id: &DestinationKey,
        user_id: &str,
    ) -> Result<(), TransportError> {
        let user_id: i64 = user_id
            .parse()
            .map_err(|_| TransportError::InvalidInput(format!("non-numeric user id: {user_id}")))?;
        // Numeric chat ids go out as numbers; `@channel` usernames as strings.
        let chat_id = match chat_id.as_str().parse::<i64>() {
            Ok(n) => json!(n),
            Err(_) => json!(chat_id.as_str()),
        };
        let body = json!({ "chat_id": chat_id, "user_id": user_id });

        let response = self
            .http
            .post(self.method_url("approveChatJoinRequest"))
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::debug!(%chat_id, user_id, "join request approved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::spawn_capture_server;
    use axum::http::StatusCode;

    fn client(base: &str) -> TelegramClient {
        let Ok(client) = TelegramClient::new(base, "123:secret", Duration::from_secs(2)) else {
            panic!("client build failed");
        };
        client
    }

    #[tokio::test]
    async fn approve_posts_numeric_ids() {
        let server = spawn_capture_server(StatusCode::OK).await;
        let result = client(&server.base_url)
            .approve(&DestinationKey::new("-100123"), "55")
            .await;
        assert_eq!(result, Ok(()));

        let requests = server.requests.lock().await;
        let Some(req) = requests.first() else {
            panic!("no request captured");
        };
        assert_eq!(req.path, "/bot123:secret/approveChatJoinRequest");
        assert_eq!(req.body["chat_id"], -100_123);
        assert_eq!(req.body["user_id"], 55);
    }

    #[tokio::test]
    async fn non_2xx_is_transport_error() {
        let server = spawn_capture_server(StatusCode::BAD_REQUEST).await;
        let result = client(&server.base_url)
            .approve(&DestinationKey::new("-100123"), "55")
            .await;
        let Err(TransportError::Status { status, .. }) = result else {
            panic!("expected status error, got {result:?}");
        };
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn unreachable_platform_is_transport_error() {
        let result = client("http://127.0.0.1:1")
            .approve(&DestinationKey::new("-100123"), "55")
            .await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }

    #[tokio::test]
    async fn non_numeric_user_is_rejected_before_sending() {
        let server = spawn_capture_server(StatusCode::OK).await;
        let result = client(&server.base_url)
            .approve(&DestinationKey::new("-100123"), "abc")
            .await;
        assert!(matches!(result, Err(TransportError::InvalidInput(_))));
        assert!(server.requests.lock().await.is_empty());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", client("https://api.telegram.org"));
        assert!(!rendered.contains("secret"));
    }
}
