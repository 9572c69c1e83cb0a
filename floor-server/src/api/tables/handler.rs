//! Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{Position, SeatRequest, Size, StoreId, Table, TableCreate, TableStatus};

use crate::core::ServerState;
use crate::moving::{Relocation, relocate as relocate_table};
use crate::utils::AppResult;
use crate::utils::time::{elapsed_label, round_entry_time};

/// Table as shown on the floor view
#[derive(Debug, Serialize)]
pub struct TableView {
    #[serde(flatten)]
    pub table: Table,
    pub status: TableStatus,
    pub label: String,
    /// "N分" / "H時間M分" / "D日H時間M分" since entry; absent when empty
    pub elapsed_label: Option<String>,
}

impl TableView {
    fn new(table: Table, now: chrono::NaiveDateTime) -> Self {
        let elapsed_label = if table.is_occupied() {
            table.entry_time.map(|entry| elapsed_label(entry, now))
        } else {
            None
        };
        Self {
            status: table.status(),
            label: table.label().to_string(),
            elapsed_label,
            table,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositionRequest {
    pub position: Position,
    pub page_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct ResizeResponse {
    pub updated: usize,
}

/// GET /api/stores/:store/tables - 可见桌台 (按页、名称排序)
pub async fn list(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
) -> AppResult<Json<Vec<TableView>>> {
    let now = state.now();
    let tables = state.tables.list(store)?;
    Ok(Json(tables.into_iter().map(|t| TableView::new(t, now)).collect()))
}

/// GET /api/stores/:store/tables/all - 包括隐藏桌台 (布局编辑)
pub async fn list_all(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
) -> AppResult<Json<Vec<TableView>>> {
    let now = state.now();
    let tables = state.tables.list_all(store)?;
    Ok(Json(tables.into_iter().map(|t| TableView::new(t, now)).collect()))
}

/// GET /api/stores/:store/tables/:name
pub async fn get_by_name(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<TableView>> {
    let table = state.tables.get(store, &name)?;
    Ok(Json(TableView::new(table, state.now())))
}

/// POST /api/stores/:store/tables - 新增桌台
pub async fn create(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
    Json(payload): Json<TableCreate>,
) -> AppResult<Json<Table>> {
    let table = state.tables.add(
        store,
        &payload.name,
        payload.size.unwrap_or_default(),
        payload.page_number.unwrap_or(1),
    )?;
    Ok(Json(table))
}

/// DELETE /api/stores/:store/tables/:name - 删除桌台及其草稿
pub async fn delete(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<bool>> {
    state.tables.remove(store, &name)?;
    Ok(Json(true))
}

/// PUT /api/stores/:store/tables/:name/position
pub async fn reposition(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(payload): Json<RepositionRequest>,
) -> AppResult<Json<Table>> {
    let page = match payload.page_number {
        Some(page) => page,
        None => state.tables.get(store, &name)?.page_number,
    };
    let table = state.tables.reposition(store, &name, payload.position, page)?;
    Ok(Json(table))
}

/// PUT /api/stores/:store/tables/:name/visibility
pub async fn set_visibility(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(payload): Json<VisibilityRequest>,
) -> AppResult<Json<Table>> {
    let table = state.tables.set_visibility(store, &name, payload.visible)?;
    Ok(Json(table))
}

/// PUT /api/stores/:store/tables/size - 统一所有桌台尺寸
pub async fn resize(
    State(state): State<ServerState>,
    Path(store): Path<StoreId>,
    Json(size): Json<Size>,
) -> AppResult<Json<ResizeResponse>> {
    let updated = state.tables.resize(store, size)?;
    Ok(Json(ResizeResponse { updated }))
}

/// POST /api/stores/:store/tables/:name/seat - 入座
///
/// 未指定入座时间时取当前时间并按 5 分钟取整
pub async fn seat(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(mut payload): Json<SeatRequest>,
) -> AppResult<Json<TableView>> {
    let now = state.now();
    if payload.entry_time.is_none() {
        payload.entry_time = Some(round_entry_time(now));
    }
    let table = state.tables.seat(store, &name, payload)?;
    Ok(Json(TableView::new(table, now)))
}

/// PUT /api/stores/:store/tables/:name/occupant - 修改客人信息
pub async fn update_occupant(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(payload): Json<SeatRequest>,
) -> AppResult<Json<TableView>> {
    let table = state.tables.update_occupant(store, &name, payload)?;
    Ok(Json(TableView::new(table, state.now())))
}

/// POST /api/stores/:store/tables/:name/clear - 清台 (同时删除草稿)
pub async fn clear(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<Table>> {
    let table = state.tables.clear(store, &name)?;
    Ok(Json(table))
}

/// POST /api/stores/:store/tables/:name/move - 换桌
pub async fn relocate(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(payload): Json<MoveRequest>,
) -> AppResult<Json<Relocation>> {
    let relocation = relocate_table(state.floor.as_ref(), store, &name, &payload.target)?;
    Ok(Json(relocation))
}
