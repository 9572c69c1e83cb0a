//! 存储层 - 桌台 / 草稿订单 / 小票的持久化
//!
//! 引擎只通过 [`FloorStore`] trait 访问存储，默认实现为 [`RedbFloorStore`]。
//!
//! # 原子写入
//!
//! 入座与换桌必须在同一个写事务里重新检查占用状态，
//! 因此多行写入统一走 [`WriteBatch`]：先校验全部 [`Precondition`]，
//! 任一失败则整个事务回滚，不写入任何数据。

mod redb_store;
#[cfg(test)]
pub(crate) mod testing;

pub use redb_store::RedbFloorStore;

use chrono::NaiveDateTime;
use shared::models::{FinalizedOrder, FinalizedOrderLine, OrderLine, Payment, StoreId, StoreSettings, Table};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch precondition no longer holds at commit time
    #[error("Precondition failed on table {table}: expected {expected:?}")]
    PreconditionFailed {
        table: String,
        expected: Precondition,
    },

    /// Injected or backend-specific failure
    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Occupancy state a table row must be in for a batch to commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Row exists (any occupancy)
    Exists,
    /// Row does not exist
    Absent,
    /// Row exists and is empty
    Vacant,
    /// Row exists and is occupied
    Occupied,
}

impl Precondition {
    pub fn holds(&self, row: Option<&Table>) -> bool {
        match self {
            Self::Exists => row.is_some(),
            Self::Absent => row.is_none(),
            Self::Vacant => row.is_some_and(|t| !t.is_occupied()),
            Self::Occupied => row.is_some_and(|t| t.is_occupied()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    PutTable(Table),
    DeleteTable(String),
    PutDraft { table: String, lines: Vec<OrderLine> },
    DeleteDraft(String),
}

/// All-or-nothing group of table / draft writes for one store
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    pub store: StoreId,
    pub checks: Vec<(String, Precondition)>,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new(store: StoreId) -> Self {
        Self {
            store,
            checks: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn require(mut self, table: impl Into<String>, precondition: Precondition) -> Self {
        self.checks.push((table.into(), precondition));
        self
    }

    pub fn put_table(mut self, table: Table) -> Self {
        self.ops.push(WriteOp::PutTable(table));
        self
    }

    pub fn delete_table(mut self, name: impl Into<String>) -> Self {
        self.ops.push(WriteOp::DeleteTable(name.into()));
        self
    }

    /// An empty line list deletes the draft row
    pub fn put_draft(mut self, table: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        let table = table.into();
        if lines.is_empty() {
            self.ops.push(WriteOp::DeleteDraft(table));
        } else {
            self.ops.push(WriteOp::PutDraft { table, lines });
        }
        self
    }

    pub fn delete_draft(mut self, table: impl Into<String>) -> Self {
        self.ops.push(WriteOp::DeleteDraft(table.into()));
        self
    }
}

/// Persistence collaborator for the floor engine.
///
/// Table rows are keyed by `(store, name)`, drafts by `(store, table)`,
/// receipt rows by `(store, receipt_number)`. Receipt writes are idempotent
/// upserts; callers decide whether an existing receipt may be rewritten.
pub trait FloorStore: Send + Sync {
    // ========== Tables & drafts ==========

    fn list_tables(&self, store: StoreId) -> StoreResult<Vec<Table>>;

    fn get_table(&self, store: StoreId, name: &str) -> StoreResult<Option<Table>>;

    /// Empty when the table has no draft
    fn get_draft(&self, store: StoreId, table: &str) -> StoreResult<Vec<OrderLine>>;

    fn apply(&self, batch: WriteBatch) -> StoreResult<()>;

    // ========== Receipts ==========

    /// Header only, stored under `header.store_id`; `lines` is not persisted here
    fn put_receipt_header(&self, header: &FinalizedOrder) -> StoreResult<()>;

    /// Replaces any lines previously stored under the receipt number
    fn put_receipt_lines(
        &self,
        store: StoreId,
        receipt_number: &str,
        lines: &[FinalizedOrderLine],
    ) -> StoreResult<()>;

    fn put_payment(&self, store: StoreId, receipt_number: &str, payment: &Payment) -> StoreResult<()>;

    fn get_receipt_header(&self, store: StoreId, receipt_number: &str) -> StoreResult<Option<FinalizedOrder>>;

    fn get_receipt_lines(&self, store: StoreId, receipt_number: &str) -> StoreResult<Vec<FinalizedOrderLine>>;

    fn get_payment(&self, store: StoreId, receipt_number: &str) -> StoreResult<Option<Payment>>;

    /// Headers whose checkout time lies in `[from, to)`, oldest first
    fn list_receipt_headers(
        &self,
        store: StoreId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> StoreResult<Vec<FinalizedOrder>>;

    /// Set the soft-delete marker; `None` when the receipt does not exist
    fn mark_receipt_deleted(
        &self,
        store: StoreId,
        receipt_number: &str,
        deleted_by: &str,
        at: NaiveDateTime,
    ) -> StoreResult<Option<FinalizedOrder>>;

    // ========== Catalog & settings ==========

    fn category_of(&self, store: StoreId, product_name: &str) -> StoreResult<Option<String>>;

    fn put_category(&self, store: StoreId, product_name: &str, category: &str) -> StoreResult<()>;

    fn get_settings(&self, store: StoreId) -> StoreResult<Option<StoreSettings>>;

    fn put_settings(&self, store: StoreId, settings: &StoreSettings) -> StoreResult<()>;
}
