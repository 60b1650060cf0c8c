use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::collector::{Collector, Sample};

struct AppState {
    collector: Arc<Mutex<Collector>>,
}

impl AppState {
    fn snapshot(&self) -> Vec<Sample> {
        let start = Instant::now();
        let samples = self.collector.lock().snapshot();
        debug!("sampling latency: {} us", start.elapsed().as_micros());
        samples
    }
}

/// Serve the collector's metrics until `shutdown` resolves.
pub async fn serve(
    listen: SocketAddr,
    collector: Arc<Mutex<Collector>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let state = Arc::new(AppState { collector });

    let listener = TcpListener::bind(listen).await?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/metrics", get(prometheus))
        .route("/metrics/json", get(json))
        .route("/vars", get(human))
        .route("/rescan", post(rescan))
        .with_state(state)
}

async fn root() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ibcounters {version} Agent\n")
}

async fn prometheus(State(state): State<Arc<AppState>>) -> String {
    super::prometheus(&state.snapshot())
}

async fn json(State(state): State<Arc<AppState>>) -> Json<Vec<Sample>> {
    Json(state.snapshot())
}

async fn human(State(state): State<Arc<AppState>>) -> String {
    super::human(&state.snapshot())
}

async fn rescan(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match state.collector.lock().rescan() {
        Ok(count) => {
            info!("rescan found {count} metrics");
            (StatusCode::OK, format!("{count}\n"))
        }
        Err(e) => {
            warn!("rescan failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n"))
        }
    }
}
