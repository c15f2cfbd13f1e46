//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::DestinationKey;

/// Chat identifier as sent by clients: either a JSON string or a number.
///
/// Landing pages built from a template often embed the channel id as a
/// bare number; both forms map to the same [`DestinationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ChatIdInput {
    /// String form, e.g. `"-100123"`.
    Text(String),
    /// Numeric form, e.g. `-100123`.
    Number(i64),
}

impl From<ChatIdInput> for DestinationKey {
    fn from(input: ChatIdInput) -> Self {
        match input {
            ChatIdInput::Text(s) => Self::new(s),
            ChatIdInput::Number(n) => Self::from_chat_id(n),
        }
    }
}

/// `limit` query parameter for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of rows (1–200). Defaults to 20.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}
