//! Receipt API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{FinalizedOrder, ReceiptDetail, StoreId};

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::time::{current_business_date, parse_date};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Business date (YYYY-MM-DD); defaults to the current business day
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub deleted_by: String,
}

/// GET /api/stores/:store/receipts?date=YYYY-MM-DD - 营业日小票 (新的在前)
pub async fn list(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<FinalizedOrder>>> {
    let settings = state.settings.get(store)?;
    let start_hour = settings.business_day_start_hour;
    let date = match query.date.as_deref() {
        Some(date) => parse_date(date)?,
        None => current_business_date(start_hour, state.config.timezone),
    };

    let receipts = state.receipts.receipts_for_business_day(store, date, start_hour)?;
    Ok(Json(receipts))
}

/// GET /api/stores/:store/receipts/:number
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path((store, number)): Path<(StoreId, String)>,
) -> AppResult<Json<ReceiptDetail>> {
    let detail = state.receipts.receipt(store, &number)?;
    Ok(Json(detail))
}

/// DELETE /api/stores/:store/receipts/:number?deleted_by=... - 作废 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path((store, number)): Path<(StoreId, String)>,
    Query(query): Query<DeleteQuery>,
) -> AppResult<Json<FinalizedOrder>> {
    let deleted = state
        .receipts
        .soft_delete_receipt(store, &number, &query.deleted_by, state.now())?;
    Ok(Json(deleted))
}
