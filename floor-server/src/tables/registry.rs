//! TableRegistry - 桌台目录 (布局 + 占用状态)
//!
//! 占用状态只由 `guest_name` 决定。入座 / 修改客人 / 删除等写操作
//! 都在同一个 [`WriteBatch`] 里重新校验前置条件，
//! 多终端并发时以表为粒度 last-write-wins，占用冲突返回 Conflict。

use shared::models::{ANONYMOUS_GUEST, Occupancy, Position, SeatRequest, Size, StoreId, Table};
use std::sync::Arc;

use crate::core::{FloorError, FloorResult};
use crate::storage::{FloorStore, Precondition, WriteBatch};

/// Table catalog for all stores
#[derive(Clone)]
pub struct TableRegistry {
    store: Arc<dyn FloorStore>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn FloorStore>) -> Self {
        Self { store }
    }

    // ========== Queries ==========

    /// Visible tables, ordered by page then name
    pub fn list(&self, store: StoreId) -> FloorResult<Vec<Table>> {
        let mut tables = self.list_all(store)?;
        tables.retain(|t| t.visible);
        Ok(tables)
    }

    /// All tables including hidden ones (layout editor)
    pub fn list_all(&self, store: StoreId) -> FloorResult<Vec<Table>> {
        let mut tables = self.store.list_tables(store)?;
        tables.sort_by(|a, b| {
            a.page_number
                .cmp(&b.page_number)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tables)
    }

    pub fn get(&self, store: StoreId, name: &str) -> FloorResult<Table> {
        self.store
            .get_table(store, name)?
            .ok_or_else(|| FloorError::table_not_found(name))
    }

    pub fn occupied_count(&self, store: StoreId) -> FloorResult<usize> {
        Ok(self
            .store
            .list_tables(store)?
            .iter()
            .filter(|t| t.is_occupied())
            .count())
    }

    // ========== Occupancy ==========

    /// Seat a guest at an empty table
    pub fn seat(&self, store: StoreId, name: &str, request: SeatRequest) -> FloorResult<Table> {
        let mut table = self.get(store, name)?;
        if table.is_occupied() {
            return Err(FloorError::table_occupied(name));
        }

        table.occupy(occupancy_from(request));
        self.store.apply(
            WriteBatch::new(store)
                .require(name, Precondition::Vacant)
                .put_table(table.clone()),
        )?;

        tracing::info!(
            store = store,
            table = %name,
            guest = ?table.guest_name,
            casts = ?table.cast_names,
            "Table seated"
        );
        Ok(table)
    }

    /// Edit the occupant of an occupied table
    pub fn update_occupant(
        &self,
        store: StoreId,
        name: &str,
        request: SeatRequest,
    ) -> FloorResult<Table> {
        let mut table = self.get(store, name)?;
        if !table.is_occupied() {
            return Err(FloorError::table_not_occupied(name));
        }

        let previous_entry = table.entry_time;
        let mut occupancy = occupancy_from(request);
        if occupancy.entry_time.is_none() {
            occupancy.entry_time = previous_entry;
        }
        table.occupy(occupancy);

        self.store.apply(
            WriteBatch::new(store)
                .require(name, Precondition::Occupied)
                .put_table(table.clone()),
        )?;

        tracing::info!(store = store, table = %name, "Occupant updated");
        Ok(table)
    }

    /// Empty a table and drop its draft. Clearing an empty table is a no-op.
    pub fn clear(&self, store: StoreId, name: &str) -> FloorResult<Table> {
        let mut table = self.get(store, name)?;
        if !table.is_occupied() {
            return Ok(table);
        }

        table.vacate();
        self.store.apply(
            WriteBatch::new(store)
                .require(name, Precondition::Exists)
                .put_table(table.clone())
                .delete_draft(name),
        )?;

        tracing::info!(store = store, table = %name, "Table cleared");
        Ok(table)
    }

    // ========== Layout ==========

    pub fn reposition(
        &self,
        store: StoreId,
        name: &str,
        position: Position,
        page_number: u32,
    ) -> FloorResult<Table> {
        if page_number < 1 {
            return Err(FloorError::Validation("page_number must be >= 1".into()));
        }

        let mut table = self.get(store, name)?;
        table.position = position;
        table.page_number = page_number;
        self.put_layout(store, &table)?;

        tracing::debug!(store = store, table = %name, page = page_number, "Table repositioned");
        Ok(table)
    }

    /// Apply one size to every table of the store; returns the number updated
    pub fn resize(&self, store: StoreId, size: Size) -> FloorResult<usize> {
        if !size.is_positive() {
            return Err(FloorError::Validation("size must be positive".into()));
        }

        let tables = self.store.list_tables(store)?;
        let count = tables.len();
        let batch = tables.into_iter().fold(WriteBatch::new(store), |batch, mut table| {
            table.size = size;
            batch.require(table.name.clone(), Precondition::Exists).put_table(table)
        });
        self.store.apply(batch)?;

        tracing::info!(store = store, count = count, width = size.width, height = size.height, "Tables resized");
        Ok(count)
    }

    pub fn set_visibility(&self, store: StoreId, name: &str, visible: bool) -> FloorResult<Table> {
        let mut table = self.get(store, name)?;
        table.visible = visible;
        self.put_layout(store, &table)?;
        Ok(table)
    }

    /// Register a new empty table
    pub fn add(&self, store: StoreId, name: &str, size: Size, page_number: u32) -> FloorResult<Table> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FloorError::Validation("table name must not be blank".into()));
        }
        if page_number < 1 {
            return Err(FloorError::Validation("page_number must be >= 1".into()));
        }
        if !size.is_positive() {
            return Err(FloorError::Validation("size must be positive".into()));
        }

        let table = Table::new(name, size, page_number);
        self.store.apply(
            WriteBatch::new(store)
                .require(name, Precondition::Absent)
                .put_table(table.clone()),
        )?;

        tracing::info!(store = store, table = %name, page = page_number, "Table added");
        Ok(table)
    }

    /// Remove a table together with its draft
    pub fn remove(&self, store: StoreId, name: &str) -> FloorResult<()> {
        self.get(store, name)?;
        self.store.apply(
            WriteBatch::new(store)
                .require(name, Precondition::Exists)
                .delete_table(name)
                .delete_draft(name),
        )?;

        tracing::info!(store = store, table = %name, "Table removed");
        Ok(())
    }

    /// Layout-only write; occupancy is re-read so a concurrent seat is not lost
    fn put_layout(&self, store: StoreId, table: &Table) -> FloorResult<()> {
        let mut row = self.get(store, &table.name)?;
        row.display_name = table.display_name.clone();
        row.position = table.position;
        row.size = table.size;
        row.page_number = table.page_number;
        row.visible = table.visible;
        self.store.apply(
            WriteBatch::new(store)
                .require(table.name.clone(), Precondition::Exists)
                .put_table(row),
        )?;
        Ok(())
    }
}

fn occupancy_from(request: SeatRequest) -> Occupancy {
    let guest_name = request
        .guest_name
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| ANONYMOUS_GUEST.to_string());

    Occupancy {
        guest_name,
        cast_names: request
            .cast_names
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        entry_time: request.entry_time,
        visit_type: request.visit_type.filter(|v| !v.trim().is_empty()),
    }
}
