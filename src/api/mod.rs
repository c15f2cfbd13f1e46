//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Client endpoints are mounted under `/api/v1`, admin endpoints under
//! `/api/v1/admin` behind the bearer-token layer, and the platform webhook
//! and health check at the root.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::middleware;

use crate::app_state::AppState;

/// Builds the complete API router with all endpoints.
///
/// `state` is needed up front to bind the admin auth layer; the caller
/// still finishes the router with `.with_state(state)`.
pub fn build_router(state: &AppState) -> Router<AppState> {
    let admin = handlers::admin_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_admin,
    ));

    let router = Router::new()
        .nest("/api/v1", handlers::routes().nest("/admin", admin))
        .merge(handlers::webhook::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::testing::{FakeApprover, Harness, harness, harness_with};

    fn app(h: &Harness) -> Router {
        build_router(&h.state).with_state(h.state.clone())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(
        method: &str,
        uri: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let Ok(request) = builder.body(Body::from(body.to_string())) else {
            panic!("request build failed");
        };
        request
    }

    fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let Ok(request) = builder.body(Body::empty()) else {
            panic!("request build failed");
        };
        request
    }

    fn join_update(update_id: i64, chat_id: i64, user_id: i64) -> Value {
        json!({
            "update_id": update_id,
            "chat_join_request": {
                "chat": {"id": chat_id, "title": "Signals", "type": "channel"},
                "from": {"id": user_id, "is_bot": false, "first_name": "U"},
                "date": 1_700_000_000
            }
        })
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let h = harness().await;
        let (status, body) = send(app(&h), get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn click_then_join_is_attributed_end_to_end() {
        let h = harness().await;
        h.clock.set(1000);
        let (status, body) = send(
            app(&h),
            json_request(
                "POST",
                "/api/v1/pre-leads",
                &json!({"channel_id": -100123, "fbc": "fb.1.999"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["destination_key"], "-100123");
        assert_eq!(body["has_token"], true);

        h.clock.set(1200);
        let (status, body) = send(
            app(&h),
            json_request("POST", "/telegram-webhook", &join_update(1, -100123, 77), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["result"]["outcome"], "attributed");
        assert_eq!(body["result"]["click_matched"], true);

        let events = h.sink.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_data.fbc.as_deref(), Some("fb.1.999"));
    }

    #[tokio::test]
    async fn non_join_update_is_acknowledged() {
        let h = harness().await;
        let (status, body) = send(
            app(&h),
            json_request(
                "POST",
                "/telegram-webhook",
                &json!({"update_id": 5, "message": {"message_id": 1, "text": "hi"}}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "ignored");
        assert!(h.approver.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn approval_failure_returns_bad_gateway() {
        let h = harness_with(GatewayConfig::for_tests(), FakeApprover::failing()).await;
        let (status, body) = send(
            app(&h),
            json_request("POST", "/telegram-webhook", &join_update(2, -100123, 77), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], 3101);
        assert!(h.sink.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn webhook_secret_is_enforced() {
        let mut config = GatewayConfig::for_tests();
        config.telegram_webhook_secret = Some("s3cret".to_string());
        let h = harness_with(config, FakeApprover::default()).await;

        let (status, _) = send(
            app(&h),
            json_request("POST", "/telegram-webhook", &join_update(3, -100123, 77), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(h.approver.calls.lock().await.is_empty());

        let mut request = json_request(
            "POST",
            "/telegram-webhook",
            &join_update(3, -100123, 77),
            None,
        );
        request.headers_mut().insert(
            auth::WEBHOOK_SECRET_HEADER,
            axum::http::HeaderValue::from_static("s3cret"),
        );
        let (status, _) = send(app(&h), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn pre_lead_without_key_is_rejected() {
        let h = harness().await;
        for body in [json!({"fbc": "fb.1.1"}), json!({"destination_key": "   "})] {
            let (status, body) =
                send(app(&h), json_request("POST", "/api/v1/pre-leads", &body, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], 1001);
        }
        assert!(h.store.pre_leads().await.is_empty());
    }

    #[tokio::test]
    async fn admin_routes_require_bearer_token() {
        let h = harness().await;
        let (status, _) = send(app(&h), get_request("/api/v1/admin/destinations", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(app(&h), get_request("/api/v1/admin/stats", Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_closed_without_configured_key() {
        let mut config = GatewayConfig::for_tests();
        config.admin_api_key = None;
        let h = harness_with(config, FakeApprover::default()).await;
        let (status, _) = send(
            app(&h),
            get_request("/api/v1/admin/destinations", Some("admin-secret")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patch_unknown_destination_is_not_found() {
        let h = harness().await;
        let (status, body) = send(
            app(&h),
            json_request(
                "PATCH",
                "/api/v1/admin/destinations/-100999",
                &json!({"pixel_id": "px-9"}),
                Some("admin-secret"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2001);
        assert_eq!(h.store.destination_count().await, 0);
    }

    #[tokio::test]
    async fn create_then_patch_destination() {
        let h = harness().await;
        let (status, body) = send(
            app(&h),
            json_request(
                "POST",
                "/api/v1/admin/destinations",
                &json!({"chat_id": -100555, "title": "VIP"}),
                Some("admin-secret"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["pixel_id"], "default-pixel");

        let (status, _) = send(
            app(&h),
            json_request(
                "POST",
                "/api/v1/admin/destinations",
                &json!({"chat_id": "-100555"}),
                Some("admin-secret"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            app(&h),
            json_request(
                "PATCH",
                "/api/v1/admin/destinations/-100555",
                &json!({"pixel_id": "px-vip"}),
                Some("admin-secret"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pixel_id"], "px-vip");
        assert_eq!(body["lp_url"], "https://default.example/");

        let (status, body) = send(
            app(&h),
            json_request(
                "PATCH",
                "/api/v1/admin/destinations/-100555",
                &json!({}),
                Some("admin-secret"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);

        let (status, body) = send(
            app(&h),
            get_request("/api/v1/admin/destinations/-100555", Some("admin-secret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "VIP");
    }

    #[tokio::test]
    async fn reports_reflect_recorded_joins() {
        let h = harness().await;
        h.clock.set(100_000);
        for (update_id, user_id) in [(10, 1), (11, 2)] {
            let (status, _) = send(
                app(&h),
                json_request(
                    "POST",
                    "/telegram-webhook",
                    &join_update(update_id, -100123, user_id),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            app(&h),
            get_request("/api/v1/admin/joins?limit=1", Some("admin-secret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let Some(rows) = body.as_array() else {
            panic!("expected array");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user_id"], "2");

        let (status, body) = send(
            app(&h),
            get_request("/api/v1/admin/stats", Some("admin-secret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["joins_last_24h"], 2);
        assert_eq!(body["by_destination"][0]["destination_key"], "-100123");
        assert_eq!(body["by_destination"][0]["joins"], 2);
    }
}
