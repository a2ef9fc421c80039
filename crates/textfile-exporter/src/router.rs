//! Axum router wiring.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::index))
        .route("/alive", get(ops::alive))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
