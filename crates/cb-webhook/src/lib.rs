//! cb-webhook: HTTP surface for cb-gateway
//!
//! The messenger webhook, a structured JSON calendar API and health checks,
//! built with axum on top of [`cb_core::CommandInterpreter`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{create_router, start_server, AppState, Clock};
