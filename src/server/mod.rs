//! HTTP transport for the capture and identify workflows.
//!
//! Each request initialises its own driver through the [`DeviceProvider`],
//! runs one workflow end-to-end on the blocking pool, and serializes the
//! tagged outcome. The physical reader is exclusive, so requests queue on a
//! process-wide device lock before touching the driver. The blocking task
//! owns the lock guard and the driver; if the client disconnects the task
//! still runs to completion and closes the reader.

use crate::config::ServerConfig;
use crate::device::DeviceProvider;
use crate::metrics::MetricsRegistry;
use crate::response::{CaptureResponse, ErrorResponse, VerifyResponse};
use crate::store::TemplateStore;
use crate::workflow::{CaptureResult, IdentifyResult, IdentifyWorkflow};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

/// Errors that can occur while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn DeviceProvider>,
    store: Arc<dyn TemplateStore>,
    workflow: IdentifyWorkflow,
    device_lock: Arc<Mutex<()>>,
    metrics: Arc<MetricsRegistry>,
}

impl AppState {
    /// Creates handler state. `/capture` uses the capture stage of
    /// `workflow`.
    pub fn new(
        provider: Arc<dyn DeviceProvider>,
        store: Arc<dyn TemplateStore>,
        workflow: IdentifyWorkflow,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            provider,
            store,
            workflow,
            device_lock: Arc::new(Mutex::new(())),
            metrics,
        }
    }

    /// Returns the metrics registry.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/capture", post(capture_handler))
        .route("/verify", post(verify_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server exposing the capture service.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Creates a new server.
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Starts the HTTP server.
    ///
    /// Runs until Ctrl-C. In-flight captures finish before the process
    /// exits.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Fingerprint service listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Runs `job` on the blocking pool while holding the device lock.
async fn with_device<T, F>(state: &AppState, job: F) -> Result<T, tokio::task::JoinError>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    let guard = Arc::clone(&state.device_lock).lock_owned().await;
    let state = state.clone();

    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        let _busy = BusyGauge::raise(&state.metrics);
        job(&state)
    })
    .await
}

/// Holds the device busy gauge at 1 until dropped, including on unwind.
struct BusyGauge<'a> {
    metrics: &'a MetricsRegistry,
}

impl<'a> BusyGauge<'a> {
    fn raise(metrics: &'a MetricsRegistry) -> Self {
        metrics.set_device_busy(true);
        Self { metrics }
    }
}

impl Drop for BusyGauge<'_> {
    fn drop(&mut self) {
        self.metrics.set_device_busy(false);
    }
}

fn init_failure(err: impl std::fmt::Display) -> String {
    format!("Cannot initialize device driver: {}", err)
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

/// Handler for `POST /capture`.
async fn capture_handler(State(state): State<AppState>) -> Response {
    tracing::info!("Capture requested");

    let joined = with_device(&state, |state| {
        let started = Instant::now();
        let result = match state.provider.initialize() {
            Ok(mut device) => state.workflow.capture_workflow().capture(device.as_mut()),
            Err(e) => {
                tracing::warn!(error = %e, "Driver initialization failed");
                CaptureResult::DeviceUnavailable {
                    reason: init_failure(e),
                }
            }
        };
        state.metrics.record_capture(&result, started.elapsed());
        result
    })
    .await;

    match joined {
        Ok(result) => Json(CaptureResponse::from(result)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Capture task aborted");
            internal_error(format!("Capture failed: {}", e))
        }
    }
}

/// Handler for `POST /verify`.
async fn verify_handler(State(state): State<AppState>) -> Response {
    tracing::info!("Identification requested");

    let joined = with_device(&state, |state| {
        let started = Instant::now();
        let result = match state.provider.initialize() {
            Ok(mut device) => state.workflow.identify(device.as_mut(), state.store.as_ref()),
            Err(e) => {
                tracing::warn!(error = %e, "Driver initialization failed");
                Ok(IdentifyResult::NotCaptured {
                    reason: init_failure(e),
                })
            }
        };
        state
            .metrics
            .record_identify(result.as_ref().ok(), started.elapsed());
        result
    })
    .await;

    match joined {
        Ok(Ok(result)) => Json(VerifyResponse::from(result)).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Identification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::from(&e)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Identification task aborted");
            internal_error(format!("Verification failed: {}", e))
        }
    }
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
