//! Axum router wiring.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/updates/", post(transport::http::updates))
        .route("/update/", post(transport::http::update))
        .route("/value/", post(transport::http::value))
        .route("/ping", get(transport::http::ping));

    let router = if state.signer().is_some() {
        router.layer(middleware::from_fn_with_state(
            state.clone(),
            transport::sign::sign_response,
        ))
    } else {
        router
    };

    router.with_state(state)
}
