//! Draft Order API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stores/{store}/tables/{name}/order", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            get(handler::snapshot)
                .put(handler::replace)
                .delete(handler::clear),
        )
        .route("/lines", post(handler::add_line))
        .route("/lines/{index}", put(handler::update_line).delete(handler::remove_line))
}
