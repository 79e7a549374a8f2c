//! HTTP server
//!
//! Builds the axum application and serves it until the shutdown future
//! resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{FixedOffset, Utc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use cb_core::{ApiConfig, CommandInterpreter, Config, Instant};

use crate::routes::routes;

/// Source of the reference instant for each request
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub interpreter: Arc<CommandInterpreter>,
    clock: Clock,
}

impl AppState {
    /// State reading the wall clock in `offset`
    pub fn new(config: Config, interpreter: CommandInterpreter, offset: FixedOffset) -> Self {
        Self {
            config: Arc::new(config),
            interpreter: Arc::new(interpreter),
            clock: Arc::new(move || Utc::now().with_timezone(&offset)),
        }
    }

    /// Replace the clock, e.g. with a fixed instant
    pub fn with_clock(mut self, clock: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> Instant {
        (self.clock)()
    }
}

/// Build the full application with CORS and request tracing
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.api);
    Router::new()
        .merge(routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allowed origins from config; localhost only when none are configured
fn cors_layer(api: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = match &api.allowed_origins {
        Some(origins) => origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect(),
        None => ["http://localhost", "http://127.0.0.1"]
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Start the HTTP server
pub async fn start_server(
    state: AppState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
