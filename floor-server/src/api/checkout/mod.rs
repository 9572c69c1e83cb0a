//! Checkout API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stores/{store}/tables/{name}/quote", get(handler::quote))
        .route("/api/stores/{store}/tables/{name}/checkout", post(handler::checkout))
}
