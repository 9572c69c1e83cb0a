//! Receipt API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stores/{store}/receipts", get(handler::list))
        .route(
            "/api/stores/{store}/receipts/{number}",
            get(handler::get_by_number).delete(handler::delete),
        )
}
