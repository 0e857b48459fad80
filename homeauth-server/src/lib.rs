//! HTTP transport for the homeauth credential commands.
//!
//! Routes:
//! - `POST /api/auth/token` exchanges a username and password for a bearer
//!   token.
//! - `POST /api/auth/provider/commands` runs a command envelope for the
//!   authenticated caller.
//! - `GET /api/health` reports liveness and sync counters.

pub mod bootstrap;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use state::{AppState, InMemoryBackends};

pub const TOKEN_PATH: &str = "/api/auth/token";
pub const COMMANDS_PATH: &str = "/api/auth/provider/commands";
pub const HEALTH_PATH: &str = "/api/health";

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(COMMANDS_PATH, post(handlers::commands::run_command))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route(TOKEN_PATH, post(handlers::session::issue_token))
        .route(HEALTH_PATH, get(handlers::health::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
