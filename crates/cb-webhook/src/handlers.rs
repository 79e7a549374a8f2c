//! HTTP handlers
//!
//! `/webhook` answers chat commands with plain reply text. The `/api/*`
//! handlers take structured arguments and answer with the [`Outcome`] as
//! JSON.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use cb_core::{CommandArgs, Intent, Outcome};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Messenger bot payload. `msg` and `sender` are accepted from older bots.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(alias = "msg")]
    pub command: String,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default, alias = "sender")]
    pub author: Option<String>,
    /// Sent by the bot; informational only
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    GetEvents,
    AddEvent,
    DeleteEvent,
}

impl EventAction {
    fn intent(self) -> Intent {
        match self {
            Self::GetEvents => Intent::ListEvents,
            Self::AddEvent => Intent::AddEvent,
            Self::DeleteEvent => Intent::DeleteEvent,
        }
    }
}

/// `/api/calendar/events` payload
#[derive(Debug, Deserialize)]
pub struct EventsRequest {
    pub action: EventAction,
    #[serde(flatten)]
    pub args: CommandArgs,
}

/// `/api/calendar/free-busy` payload
#[derive(Debug, Default, Deserialize)]
pub struct FreeBusyRequest {
    #[serde(default)]
    pub date: Option<String>,
}

/// Structured result plus the text a chat user would see
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub success: bool,
    pub result: Outcome,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub calendar_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub timestamp: String,
    pub calendar_id: String,
    pub utc_offset: String,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Service banner
pub async fn root(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        service: "cb-gateway",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        timestamp: state.now().to_rfc3339(),
        calendar_id: state.config.calendar.calendar_id.clone(),
        utc_offset: state.config.calendar.utc_offset.clone(),
    })
}

/// Health check; 503 when the calendar provider cannot be reached
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = state.now().to_rfc3339();
    let calendar_id = &state.interpreter.settings().calendar_id;

    match state.interpreter.store().calendar_name(calendar_id).await {
        Ok(name) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp,
                calendar_connected: true,
                calendar_name: Some(name),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp,
                    calendar_connected: false,
                    calendar_name: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Messenger bot webhook; replies with plain text
pub async fn webhook(State(state): State<AppState>, Json(req): Json<WebhookRequest>) -> Result<String> {
    let command = req.command.trim();
    info!(
        "Webhook command from {} in {}: {}",
        req.author.as_deref().unwrap_or("-"),
        req.room.as_deref().unwrap_or("-"),
        command
    );

    if command.is_empty() {
        return Err(ApiError::InvalidRequest("command is empty".to_string()));
    }

    Ok(state.interpreter.interpret(command, state.now()).await)
}

/// Structured event listing, creation and deletion
pub async fn calendar_events(
    State(state): State<AppState>,
    Json(req): Json<EventsRequest>,
) -> Result<Json<OutcomeResponse>> {
    info!("Calendar API action: {:?}", req.action);
    run_intent(&state, req.action.intent(), &req.args).await
}

/// Structured free-time query
pub async fn free_busy(
    State(state): State<AppState>,
    Json(req): Json<FreeBusyRequest>,
) -> Result<Json<OutcomeResponse>> {
    let args = CommandArgs {
        date: req.date,
        ..Default::default()
    };
    run_intent(&state, Intent::QueryFreeTime, &args).await
}

async fn run_intent(state: &AppState, intent: Intent, args: &CommandArgs) -> Result<Json<OutcomeResponse>> {
    let outcome = state.interpreter.handle_intent(intent, args, state.now()).await?;
    let message = state.interpreter.render(&outcome);
    Ok(Json(OutcomeResponse {
        success: true,
        result: outcome,
        message,
    }))
}
