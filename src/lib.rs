use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use std::error::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler::{AppState, healthcheck, sync};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod loans;
pub mod report;
pub mod school;
pub mod seed;
pub mod validate;

/// Builds the full HTTP surface over the given state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/", get(healthcheck))
        .route("/sync", post(sync))
        .merge(school::routes())
        .merge(loans::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
