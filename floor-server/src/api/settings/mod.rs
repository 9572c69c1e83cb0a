//! Store Settings API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stores/{store}/settings", get(handler::get).put(handler::update))
        .route("/api/stores/{store}/categories", put(handler::set_category))
}
