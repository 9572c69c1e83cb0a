//! OrderAggregator - 每张桌台的草稿订单
//!
//! # 合并规则
//!
//! 同一桌上 `(商品名, 含税单价, 指名キャスト集合)` 相同的明细合并为一行 (数量 +1)，
//! 否则追加新行 (数量 1)。キャスト集合按集合比较，与选择顺序无关。
//!
//! 草稿只属于已入座的桌台，每次写入都要求桌台处于占用状态。
//!
//! 数量、单价、行数都有上限 (见 `shared::models::order`)，超出即 Validation 错误，
//! 保证后续合计不会溢出。

use serde::Serialize;
use shared::models::{MAX_DRAFT_LINES, MAX_LINE_QUANTITY, MAX_UNIT_PRICE, OrderLine, StoreId};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::{FloorError, FloorResult};
use crate::storage::{FloorStore, Precondition, WriteBatch};

/// Result of [`OrderAggregator::add`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    /// Existing line at `index` now has `quantity`
    Merged { index: usize, quantity: u32 },
    /// New line appended at `index`
    Appended { index: usize },
    /// Product requires a cast and none was selected; nothing changed
    PendingCastSelection,
}

/// Draft order lines per table
#[derive(Clone)]
pub struct OrderAggregator {
    store: Arc<dyn FloorStore>,
}

impl OrderAggregator {
    pub fn new(store: Arc<dyn FloorStore>) -> Self {
        Self { store }
    }

    /// Add one unit of a product
    pub fn add(
        &self,
        store: StoreId,
        table: &str,
        product_name: &str,
        unit_price: i64,
        requires_cast: bool,
        cast_names: Option<BTreeSet<String>>,
    ) -> FloorResult<AddOutcome> {
        let casts = if requires_cast {
            match cast_names.filter(|c| !c.is_empty()) {
                Some(casts) => casts,
                None => return Ok(AddOutcome::PendingCastSelection),
            }
        } else {
            BTreeSet::new()
        };
        validate_price(unit_price)?;

        let mut lines = self.occupied_draft(store, table)?;
        let outcome = match lines
            .iter()
            .position(|l| l.matches(product_name, unit_price, &casts))
        {
            Some(index) => {
                lines[index].quantity = checked_quantity(lines[index].quantity, 1)?;
                AddOutcome::Merged {
                    index,
                    quantity: lines[index].quantity,
                }
            }
            None => {
                ensure_line_room(lines.len())?;
                lines.push(OrderLine::new(product_name, unit_price, casts));
                AddOutcome::Appended {
                    index: lines.len() - 1,
                }
            }
        };

        self.save(store, table, lines)?;
        tracing::debug!(store = store, table = %table, product = %product_name, outcome = ?outcome, "Order line added");
        Ok(outcome)
    }

    pub fn remove(&self, store: StoreId, table: &str, index: usize) -> FloorResult<OrderLine> {
        let mut lines = self.occupied_draft(store, table)?;
        if index >= lines.len() {
            return Err(FloorError::line_not_found(index));
        }
        let removed = lines.remove(index);
        self.save(store, table, lines)?;
        Ok(removed)
    }

    /// `quantity <= 0` removes the line
    pub fn set_quantity(
        &self,
        store: StoreId,
        table: &str,
        index: usize,
        quantity: i64,
    ) -> FloorResult<Vec<OrderLine>> {
        let mut lines = self.occupied_draft(store, table)?;
        if index >= lines.len() {
            return Err(FloorError::line_not_found(index));
        }

        if quantity <= 0 {
            lines.remove(index);
        } else {
            lines[index].quantity = u32::try_from(quantity)
                .ok()
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or_else(|| quantity_too_large(quantity))?;
        }
        self.save(store, table, lines.clone())?;
        Ok(lines)
    }

    /// Changes the line's identity key for later merges
    pub fn set_unit_price(
        &self,
        store: StoreId,
        table: &str,
        index: usize,
        unit_price: i64,
    ) -> FloorResult<Vec<OrderLine>> {
        validate_price(unit_price)?;
        let mut lines = self.occupied_draft(store, table)?;
        let line = lines
            .get_mut(index)
            .ok_or_else(|| FloorError::line_not_found(index))?;
        line.unit_price = unit_price;
        self.save(store, table, lines.clone())?;
        Ok(lines)
    }

    pub fn snapshot(&self, store: StoreId, table: &str) -> FloorResult<Vec<OrderLine>> {
        if self.store.get_table(store, table)?.is_none() {
            return Err(FloorError::table_not_found(table));
        }
        Ok(self.store.get_draft(store, table)?)
    }

    pub fn clear(&self, store: StoreId, table: &str) -> FloorResult<()> {
        if self.store.get_table(store, table)?.is_none() {
            return Err(FloorError::table_not_found(table));
        }
        self.store.apply(WriteBatch::new(store).delete_draft(table))?;
        Ok(())
    }

    /// Bulk save; lines sharing an identity key are folded together
    pub fn replace(
        &self,
        store: StoreId,
        table: &str,
        lines: Vec<OrderLine>,
    ) -> FloorResult<Vec<OrderLine>> {
        let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(FloorError::Validation(format!(
                    "quantity must be >= 1 for {}",
                    line.product_name
                )));
            }
            validate_price(line.unit_price)?;

            match merged
                .iter_mut()
                .find(|m| m.matches(&line.product_name, line.unit_price, &line.cast_names))
            {
                Some(existing) => {
                    existing.quantity = checked_quantity(existing.quantity, line.quantity)?
                }
                None => {
                    if line.quantity > MAX_LINE_QUANTITY {
                        return Err(quantity_too_large(i64::from(line.quantity)));
                    }
                    ensure_line_room(merged.len())?;
                    merged.push(line);
                }
            }
        }

        self.occupied_draft(store, table)?;
        self.save(store, table, merged.clone())?;
        tracing::debug!(store = store, table = %table, lines = merged.len(), "Draft replaced");
        Ok(merged)
    }

    /// Current draft of an occupied table
    fn occupied_draft(&self, store: StoreId, table: &str) -> FloorResult<Vec<OrderLine>> {
        let row = self
            .store
            .get_table(store, table)?
            .ok_or_else(|| FloorError::table_not_found(table))?;
        if !row.is_occupied() {
            return Err(FloorError::table_not_occupied(table));
        }
        Ok(self.store.get_draft(store, table)?)
    }

    fn save(&self, store: StoreId, table: &str, lines: Vec<OrderLine>) -> FloorResult<()> {
        self.store.apply(
            WriteBatch::new(store)
                .require(table, Precondition::Occupied)
                .put_draft(table, lines),
        )?;
        Ok(())
    }
}

/// Tax-inclusive total of a draft
pub fn subtotal(lines: &[OrderLine]) -> i64 {
    lines
        .iter()
        .map(OrderLine::line_total)
        .fold(0i64, i64::saturating_add)
}

/// 价格必须为正：免费项目不经过草稿
fn validate_price(unit_price: i64) -> FloorResult<()> {
    if unit_price <= 0 || unit_price > MAX_UNIT_PRICE {
        return Err(FloorError::Validation(format!(
            "unit_price must be in 1..={}, got {}",
            MAX_UNIT_PRICE, unit_price
        )));
    }
    Ok(())
}

fn checked_quantity(current: u32, extra: u32) -> FloorResult<u32> {
    current
        .checked_add(extra)
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or_else(|| quantity_too_large(i64::from(current) + i64::from(extra)))
}

fn quantity_too_large(quantity: i64) -> FloorError {
    FloorError::Validation(format!(
        "quantity must be at most {}, got {}",
        MAX_LINE_QUANTITY, quantity
    ))
}

fn ensure_line_room(len: usize) -> FloorResult<()> {
    if len >= MAX_DRAFT_LINES {
        return Err(FloorError::Validation(format!(
            "draft cannot hold more than {} lines",
            MAX_DRAFT_LINES
        )));
    }
    Ok(())
}
