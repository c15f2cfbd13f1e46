//! Meta Conversions API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;

use super::{ConversionSink, TransportError, ensure_success};
use crate::domain::ConversionEvent;

/// Posts conversion events to `/{api_version}/{pixel_id}/events`.
#[derive(Clone)]
pub struct MetaConversionsClient {
    http: reqwest::Client,
    graph_base: String,
    api_version: String,
    access_token: String,
}

impl MetaConversionsClient {
    /// Creates a client authenticated with the process-wide `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(
        graph_base: &str,
        api_version: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            graph_base: graph_base.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn events_url(&self, pixel_id: &str) -> Result<Url, TransportError> {
        if pixel_id.is_empty() || pixel_id.contains('/') {
            return Err(TransportError::InvalidInput(format!(
                "invalid pixel id: {pixel_id:?}"
            )));
        }
        let raw = format!("{}/{}/{pixel_id}/events", self.graph_base, self.api_version);
        Url::parse_with_params(&raw, &[("access_token", self.access_token.as_str())])
            .map_err(|e| TransportError::InvalidInput(e.to_string()))
    }
}

impl fmt::Debug for MetaConversionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaConversionsClient")
            .field("graph_base", &self.graph_base)
            .field("api_version", &self.api_version)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConversionSink for MetaConversionsClient {
    async fn send(&self, event: &ConversionEvent) -> Result<(), TransportError> {
        let url = self.events_url(&event.pixel_id)?;
        let body = json!({ "data": [event] });

        let response = self.http.post(url).json(&body).send().await?;
        ensure_success(response).await?;

        tracing::debug!(pixel_id = %event.pixel_id, event_id = %event.event_id, "conversion accepted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::spawn_capture_server;
    use axum::http::StatusCode;
    use chrono::DateTime;

    fn client(base: &str) -> MetaConversionsClient {
        let Ok(client) =
            MetaConversionsClient::new(base, "v18.0", "tok-abc", Duration::from_secs(2))
        else {
            panic!("client build failed");
        };
        client
    }

    fn event(pixel: &str, fbc: Option<&str>) -> ConversionEvent {
        let Some(ts) = DateTime::from_timestamp(1200, 0) else {
            panic!("valid timestamp");
        };
        ConversionEvent::lead(pixel, "https://lp.example/", "55", ts, fbc.map(str::to_string))
    }

    #[tokio::test]
    async fn send_addresses_pixel_and_wraps_event() {
        let server = spawn_capture_server(StatusCode::OK).await;
        let result = client(&server.base_url)
            .send(&event("px-42", Some("fb.1.999")))
            .await;
        assert_eq!(result, Ok(()));

        let requests = server.requests.lock().await;
        let Some(req) = requests.first() else {
            panic!("no request captured");
        };
        assert_eq!(req.path, "/v18.0/px-42/events");
        assert_eq!(req.query.as_deref(), Some("access_token=tok-abc"));
        assert_eq!(req.body["data"][0]["event_name"], "Lead");
        assert_eq!(req.body["data"][0]["event_time"], 1200);
        assert_eq!(req.body["data"][0]["user_data"]["fbc"], "fb.1.999");
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let server = spawn_capture_server(StatusCode::INTERNAL_SERVER_ERROR).await;
        let result = client(&server.base_url).send(&event("px-42", None)).await;
        assert!(matches!(
            result,
            Err(TransportError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn empty_pixel_is_rejected() {
        let result = client("http://127.0.0.1:1").send(&event("", None)).await;
        assert!(matches!(result, Err(TransportError::InvalidInput(_))));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", client("https://graph.facebook.com"));
        assert!(!rendered.contains("tok-abc"));
    }
}
