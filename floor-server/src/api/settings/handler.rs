//! Store Settings API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{StoreId, StoreSettings};

use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct CategoryAssignment {
    pub product_name: String,
    pub category: String,
}

/// GET /api/stores/:store/settings - 未配置时返回默认值
pub async fn get(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
) -> AppResult<Json<StoreSettings>> {
    let settings = state.settings.get(store)?;
    Ok(Json(settings))
}

/// PUT /api/stores/:store/settings
pub async fn update(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
    Json(payload): Json<StoreSettings>,
) -> AppResult<Json<StoreSettings>> {
    let settings = state.settings.put(store, payload)?;
    Ok(Json(settings))
}

/// PUT /api/stores/:store/categories - 商品分类 (记录到小票明细)
pub async fn set_category(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
    Json(payload): Json<CategoryAssignment>,
) -> AppResult<Json<bool>> {
    state
        .settings
        .set_category(store, &payload.product_name, &payload.category)?;
    Ok(Json(true))
}
