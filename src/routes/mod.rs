use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{LedgerError, reject};
use crate::state::AppState;

pub mod bets;
pub mod session;
pub mod users;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bets", get(bets::list_bets).post(bets::create_bet))
        .route("/bets/:id", get(bets::get_bet))
        .route("/bets/:id/events", get(bets::bet_events))
        .route("/bets/:id/wagers", post(bets::place_bet))
        .route("/bets/:id/winner", post(bets::declare_winner))
        .route("/users", post(users::register))
        .route("/users/:address", get(users::get_user))
        .route("/users/:address/bets", get(users::user_bets))
        .route("/sessions", post(session::create_session))
        .route(
            "/sessions/:id",
            get(session::get_session).delete(session::close_session),
        )
        .route("/sessions/:id/connect", post(session::connect))
        .route("/sessions/:id/transition", post(session::transition))
        .route("/sessions/:id/create-bet", post(session::create_bet))
        .route("/sessions/:id/place", post(session::place))
        .route("/sessions/:id/declare", post(session::declare))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Log a rejected ledger call and turn it into a response.
pub(crate) fn failed(action: &'static str) -> impl Fn(LedgerError) -> (StatusCode, String) {
    move |e| {
        tracing::warn!("Failed to {}: {}", action, e);
        reject(e)
    }
}

pub(crate) fn internal(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("{:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
