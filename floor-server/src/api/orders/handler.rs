//! Draft Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::{OrderLine, OrderLineAdd, OrderLineUpdate, StoreId};

use crate::core::ServerState;
use crate::orders::{AddOutcome, subtotal};
use crate::utils::{AppError, AppResult};

/// Draft lines with their tax-inclusive total
#[derive(Debug, Serialize)]
pub struct DraftView {
    pub lines: Vec<OrderLine>,
    pub subtotal: i64,
}

impl From<Vec<OrderLine>> for DraftView {
    fn from(lines: Vec<OrderLine>) -> Self {
        Self {
            subtotal: subtotal(&lines),
            lines,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddLineResponse {
    #[serde(flatten)]
    pub outcome: AddOutcome,
    pub draft: DraftView,
}

/// GET /api/stores/:store/tables/:name/order
pub async fn snapshot(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<DraftView>> {
    let lines = state.orders.snapshot(store, &name)?;
    Ok(Json(lines.into()))
}

/// PUT /api/stores/:store/tables/:name/order - 整单保存
pub async fn replace(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(lines): Json<Vec<OrderLine>>,
) -> AppResult<Json<DraftView>> {
    let lines = state.orders.replace(store, &name, lines)?;
    Ok(Json(lines.into()))
}

/// DELETE /api/stores/:store/tables/:name/order
pub async fn clear(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<bool>> {
    state.orders.clear(store, &name)?;
    Ok(Json(true))
}

/// POST /api/stores/:store/tables/:name/order/lines - 加一件商品
///
/// 需要指名但未选择キャスト时返回 `pending_cast_selection`，草稿不变
pub async fn add_line(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(payload): Json<OrderLineAdd>,
) -> AppResult<Json<AddLineResponse>> {
    let casts = (!payload.cast_names.is_empty()).then_some(payload.cast_names);
    let outcome = state.orders.add(
        store,
        &name,
        &payload.product_name,
        payload.unit_price,
        payload.requires_cast,
        casts,
    )?;
    let lines = state.orders.snapshot(store, &name)?;
    Ok(Json(AddLineResponse {
        outcome,
        draft: lines.into(),
    }))
}

/// PUT /api/stores/:store/tables/:name/order/lines/:index - 修改数量或单价
pub async fn update_line(
    State(state): State<ServerState>,
    Path((store, name, index)): Path<(StoreId, String, usize)>,
    Json(payload): Json<OrderLineUpdate>,
) -> AppResult<Json<DraftView>> {
    if payload.quantity.is_none() && payload.unit_price.is_none() {
        return Err(AppError::validation("quantity or unit_price is required"));
    }

    // Price first: a zero quantity removes the line and shifts later indexes
    let mut lines = match payload.unit_price {
        Some(price) => state.orders.set_unit_price(store, &name, index, price)?,
        None => state.orders.snapshot(store, &name)?,
    };
    if let Some(quantity) = payload.quantity {
        lines = state.orders.set_quantity(store, &name, index, quantity)?;
    }
    Ok(Json(lines.into()))
}

/// DELETE /api/stores/:store/tables/:name/order/lines/:index
pub async fn remove_line(
    State(state): State<ServerState>,
    Path((store, name, index)): Path<(StoreId, String, usize)>,
) -> AppResult<Json<OrderLine>> {
    let removed = state.orders.remove(store, &name, index)?;
    Ok(Json(removed))
}
