pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod routes;
pub mod session;
pub mod state;
pub mod types;

pub mod eth;
pub mod worker;

use axum::Router;
use state::AppState;

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
