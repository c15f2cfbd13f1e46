//! Outbound collaborators: chat-platform approval and conversion dispatch.
//!
//! The pipeline depends only on the [`JoinApprover`] and [`ConversionSink`]
//! traits. [`TelegramClient`] and [`MetaConversionsClient`] are the
//! production implementations over `reqwest`; every request they issue is
//! bounded by the configured timeout.

pub mod meta;
pub mod telegram;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{ConversionEvent, DestinationKey};

pub use meta::MetaConversionsClient;
pub use telegram::TelegramClient;

/// Failure talking to an external HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout, or protocol failure before a status was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The collaborator answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The call could not be built from the given arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Approves pending join requests on the chat platform.
#[async_trait]
pub trait JoinApprover: Send + Sync + Debug {
    /// Approves `user_id`'s request to join `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the platform is unreachable or
    /// answers with a non-2xx status.
    async fn approve(&self, chat_id: &DestinationKey, user_id: &str)
    -> Result<(), TransportError>;
}

/// Submits conversion events to the ads-analytics endpoint.
#[async_trait]
pub trait ConversionSink: Send + Sync + Debug {
    /// Sends one conversion event to the pixel named in `event`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the endpoint is unreachable or
    /// answers with a non-2xx status.
    async fn send(&self, event: &ConversionEvent) -> Result<(), TransportError>;
}

/// Maximum number of response body bytes kept in a [`TransportError`].
const MAX_ERROR_BODY: usize = 512;

/// Turns a non-2xx response into [`TransportError::Status`].
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    let body = truncate(&body, MAX_ERROR_BODY);
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.get(..end).unwrap_or_default().to_string()
}
