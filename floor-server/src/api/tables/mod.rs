//! Table API 模块
//!
//! 布局编辑 (增删、位置、可见性、尺寸) 与占用操作 (入座、修改、清台、换桌)。

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stores/{store}/tables", routes())
}

fn routes() -> Router<ServerState> {
    let layout_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/all", get(handler::list_all))
        .route("/size", put(handler::resize))
        .route("/{name}", get(handler::get_by_name).delete(handler::delete))
        .route("/{name}/position", put(handler::reposition))
        .route("/{name}/visibility", put(handler::set_visibility));

    let occupancy_routes = Router::new()
        .route("/{name}/seat", post(handler::seat))
        .route("/{name}/occupant", put(handler::update_occupant))
        .route("/{name}/clear", post(handler::clear))
        .route("/{name}/move", post(handler::relocate));

    layout_routes.merge(occupancy_routes)
}
