//! Join approval gateway.

use std::sync::Arc;

use crate::clients::JoinApprover;
use crate::domain::DestinationKey;
use crate::error::GatewayError;

/// Issues the platform approval call for a join request. Not retried.
#[derive(Debug)]
pub struct ApprovalGateway {
    approver: Arc<dyn JoinApprover>,
}

impl ApprovalGateway {
    /// Wraps the platform client.
    #[must_use]
    pub fn new(approver: Arc<dyn JoinApprover>) -> Self {
        Self { approver }
    }

    /// Approves `user_id` into `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ApprovalFailed`] on any transport error or
    /// non-2xx answer.
    pub async fn approve(&self, chat_id: &DestinationKey, user_id: &str) -> Result<(), GatewayError> {
        self.approver
            .approve(chat_id, user_id)
            .await
            .map_err(|e| {
                tracing::warn!(%chat_id, user_id, error = %e, "join approval failed");
                GatewayError::ApprovalFailed(e)
            })?;
        tracing::info!(%chat_id, user_id, "join request approved");
        Ok(())
    }
}
