//! Shared fakes for unit tests.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use tokio::sync::Mutex;

use crate::app_state::AppState;
use crate::clients::{ConversionSink, JoinApprover, TransportError};
use crate::config::GatewayConfig;
use crate::domain::{ConversionEvent, DestinationKey, ManualClock};
use crate::persistence::{AttributionStore, MemoryStore};

/// Approver that records calls and fails on demand.
#[derive(Debug, Default)]
pub(crate) struct FakeApprover {
    pub calls: Mutex<Vec<(DestinationKey, String)>>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl FakeApprover {
    pub fn failing() -> Self {
        let approver = Self::default();
        approver.fail.store(true, Ordering::SeqCst);
        approver
    }

    /// Approver that yields for `delay` inside every call.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl JoinApprover for FakeApprover {
    async fn approve(
        &self,
        chat_id: &DestinationKey,
        user_id: &str,
    ) -> Result<(), TransportError> {
        self.calls
            .lock()
            .await
            .push((chat_id.clone(), user_id.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Sink that records every event it is asked to send.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub events: Mutex<Vec<ConversionEvent>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ConversionSink for RecordingSink {
    async fn send(&self, event: &ConversionEvent) -> Result<(), TransportError> {
        self.events.lock().await.push(event.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 500,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Fully wired application over in-memory collaborators.
#[derive(Debug)]
pub(crate) struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub approver: Arc<FakeApprover>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

pub(crate) async fn harness() -> Harness {
    harness_with(GatewayConfig::for_tests(), FakeApprover::default()).await
}

pub(crate) async fn harness_with(config: GatewayConfig, approver: FakeApprover) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let approver = Arc::new(approver);
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::at(0));

    let dyn_store: Arc<dyn AttributionStore> = Arc::clone(&store) as Arc<dyn AttributionStore>;
    let Ok(state) = AppState::build(
        &config,
        dyn_store,
        Arc::clone(&approver) as Arc<dyn JoinApprover>,
        Arc::clone(&sink) as Arc<dyn ConversionSink>,
        Arc::clone(&clock) as Arc<dyn crate::domain::Clock>,
    )
    .await
    else {
        panic!("state build failed");
    };

    Harness {
        state,
        store,
        approver,
        sink,
        clock,
    }
}

/// A request received by [`spawn_capture_server`].
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub path: String,
    pub query: Option<String>,
    pub body: serde_json::Value,
}

/// Local HTTP server that records every request and answers with a fixed
/// status.
#[derive(Debug)]
pub(crate) struct CaptureServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

#[derive(Debug, Clone)]
struct CaptureState {
    status: StatusCode,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn capture(State(state): State<CaptureState>, uri: Uri, body: Bytes) -> StatusCode {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().await.push(CapturedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body,
    });
    state.status
}

pub(crate) async fn spawn_capture_server(status: StatusCode) -> CaptureServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = CaptureState {
        status,
        requests: Arc::clone(&requests),
    };
    let app = Router::new().fallback(capture).with_state(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    CaptureServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}
