//! redb-based implementation of [`FloorStore`]
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `tables` | `(store, name)` | `Table` | Layout + occupancy |
//! | `drafts` | `(store, table)` | `Vec<OrderLine>` | Running order per table |
//! | `receipts` | `(store, receipt_number)` | `FinalizedOrder` | Receipt headers |
//! | `receipts_by_checkout` | `(store, checkout_ms, receipt_number)` | `()` | Range index for listings |
//! | `receipt_lines` | `(store, receipt_number, index)` | `FinalizedOrderLine` | Receipt lines |
//! | `payments` | `(store, receipt_number)` | `Payment` | One payment per receipt |
//! | `categories` | `(store, product_name)` | `&str` | Product → category |
//! | `settings` | `store` | `StoreSettings` | Venue settings |
//!
//! Values are JSON-serialized. redb commits are durable once `commit()` returns.

use chrono::NaiveDateTime;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{
    FinalizedOrder, FinalizedOrderLine, OrderLine, Payment, StoreId, StoreSettings, Table,
};
use std::path::Path;
use std::sync::Arc;

use super::{FloorStore, StoreError, StoreResult, WriteBatch, WriteOp};

const TABLES_TABLE: TableDefinition<(i64, &str), &[u8]> = TableDefinition::new("tables");

const DRAFTS_TABLE: TableDefinition<(i64, &str), &[u8]> = TableDefinition::new("drafts");

const RECEIPTS_TABLE: TableDefinition<(i64, &str), &[u8]> = TableDefinition::new("receipts");

const RECEIPTS_BY_CHECKOUT_TABLE: TableDefinition<(i64, i64, &str), ()> =
    TableDefinition::new("receipts_by_checkout");

const RECEIPT_LINES_TABLE: TableDefinition<(i64, &str, u32), &[u8]> =
    TableDefinition::new("receipt_lines");

const PAYMENTS_TABLE: TableDefinition<(i64, &str), &[u8]> = TableDefinition::new("payments");

const CATEGORIES_TABLE: TableDefinition<(i64, &str), &str> = TableDefinition::new("categories");

const SETTINGS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("settings");

/// Index key component; naive times are ordered as if they were UTC
fn checkout_ms(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

/// Floor storage backed by redb
#[derive(Clone)]
pub struct RedbFloorStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbFloorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbFloorStore").finish_non_exhaustive()
    }
}

impl RedbFloorStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(DRAFTS_TABLE)?;
            let _ = write_txn.open_table(RECEIPTS_TABLE)?;
            let _ = write_txn.open_table(RECEIPTS_BY_CHECKOUT_TABLE)?;
            let _ = write_txn.open_table(RECEIPT_LINES_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(CATEGORIES_TABLE)?;
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl FloorStore for RedbFloorStore {
    // ========== Tables & drafts ==========

    fn list_tables(&self, store: StoreId) -> StoreResult<Vec<Table>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;

        let mut tables = Vec::new();
        for result in table.range((store, "")..)? {
            let (key, value) = result?;
            if key.value().0 != store {
                break;
            }
            tables.push(serde_json::from_slice::<Table>(value.value())?);
        }
        Ok(tables)
    }

    fn get_table(&self, store: StoreId, name: &str) -> StoreResult<Option<Table>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;

        match table.get((store, name))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_draft(&self, store: StoreId, table_name: &str) -> StoreResult<Vec<OrderLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAFTS_TABLE)?;

        match table.get((store, table_name))? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(Vec::new()),
        }
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut tables = txn.open_table(TABLES_TABLE)?;
            let mut drafts = txn.open_table(DRAFTS_TABLE)?;

            // Preconditions are checked against the rows as seen by this transaction
            for (name, precondition) in &batch.checks {
                let row: Option<Table> = match tables.get((batch.store, name.as_str()))? {
                    Some(value) => Some(serde_json::from_slice(value.value())?),
                    None => None,
                };
                if !precondition.holds(row.as_ref()) {
                    return Err(StoreError::PreconditionFailed {
                        table: name.clone(),
                        expected: *precondition,
                    });
                }
            }

            for op in &batch.ops {
                match op {
                    WriteOp::PutTable(row) => {
                        let value = serde_json::to_vec(row)?;
                        tables.insert((batch.store, row.name.as_str()), value.as_slice())?;
                    }
                    WriteOp::DeleteTable(name) => {
                        tables.remove((batch.store, name.as_str()))?;
                    }
                    WriteOp::PutDraft { table, lines } => {
                        let value = serde_json::to_vec(lines)?;
                        drafts.insert((batch.store, table.as_str()), value.as_slice())?;
                    }
                    WriteOp::DeleteDraft(table) => {
                        drafts.remove((batch.store, table.as_str()))?;
                    }
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Receipts ==========

    fn put_receipt_header(&self, header: &FinalizedOrder) -> StoreResult<()> {
        let store = header.store_id;
        let number = header.receipt_number.as_str();
        let mut stored = header.clone();
        stored.lines.clear();
        let value = serde_json::to_vec(&stored)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECEIPTS_TABLE)?;
            let mut index = txn.open_table(RECEIPTS_BY_CHECKOUT_TABLE)?;

            let previous: Option<FinalizedOrder> = match table.get((store, number))? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            if let Some(previous) = previous {
                index.remove((store, checkout_ms(previous.checkout_datetime), number))?;
            }

            table.insert((store, number), value.as_slice())?;
            index.insert((store, checkout_ms(header.checkout_datetime), number), ())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn put_receipt_lines(
        &self,
        store: StoreId,
        receipt_number: &str,
        lines: &[FinalizedOrderLine],
    ) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECEIPT_LINES_TABLE)?;

            // Collect then remove, a re-run must not leave stale trailing lines
            let mut stale: Vec<u32> = Vec::new();
            for result in
                table.range((store, receipt_number, 0u32)..=(store, receipt_number, u32::MAX))?
            {
                let (key, _value) = result?;
                stale.push(key.value().2);
            }
            for index in stale {
                table.remove((store, receipt_number, index))?;
            }

            for (index, line) in lines.iter().enumerate() {
                let value = serde_json::to_vec(line)?;
                table.insert((store, receipt_number, index as u32), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn put_payment(&self, store: StoreId, receipt_number: &str, payment: &Payment) -> StoreResult<()> {
        let value = serde_json::to_vec(payment)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PAYMENTS_TABLE)?;
            table.insert((store, receipt_number), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get_receipt_header(
        &self,
        store: StoreId,
        receipt_number: &str,
    ) -> StoreResult<Option<FinalizedOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECEIPTS_TABLE)?;

        match table.get((store, receipt_number))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_receipt_lines(
        &self,
        store: StoreId,
        receipt_number: &str,
    ) -> StoreResult<Vec<FinalizedOrderLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECEIPT_LINES_TABLE)?;

        let mut lines = Vec::new();
        for result in
            table.range((store, receipt_number, 0u32)..=(store, receipt_number, u32::MAX))?
        {
            let (_key, value) = result?;
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    fn get_payment(&self, store: StoreId, receipt_number: &str) -> StoreResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;

        match table.get((store, receipt_number))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_receipt_headers(
        &self,
        store: StoreId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> StoreResult<Vec<FinalizedOrder>> {
        if from >= to {
            return Ok(Vec::new());
        }
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(RECEIPTS_BY_CHECKOUT_TABLE)?;
        let table = read_txn.open_table(RECEIPTS_TABLE)?;

        let mut headers = Vec::new();
        for result in index.range((store, checkout_ms(from), "")..(store, checkout_ms(to), ""))? {
            let (key, _) = result?;
            let (_, _, number) = key.value();
            if let Some(value) = table.get((store, number))? {
                headers.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(headers)
    }

    fn mark_receipt_deleted(
        &self,
        store: StoreId,
        receipt_number: &str,
        deleted_by: &str,
        at: NaiveDateTime,
    ) -> StoreResult<Option<FinalizedOrder>> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(RECEIPTS_TABLE)?;
            let existing: Option<FinalizedOrder> = match table.get((store, receipt_number))? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            match existing {
                Some(mut header) => {
                    header.deleted_at = Some(at);
                    header.deleted_by = Some(deleted_by.to_string());
                    let value = serde_json::to_vec(&header)?;
                    table.insert((store, receipt_number), value.as_slice())?;
                    Some(header)
                }
                None => None,
            }
        };
        txn.commit()?;
        Ok(updated)
    }

    // ========== Catalog & settings ==========

    fn category_of(&self, store: StoreId, product_name: &str) -> StoreResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CATEGORIES_TABLE)?;
        Ok(table
            .get((store, product_name))?
            .map(|guard| guard.value().to_string()))
    }

    fn put_category(&self, store: StoreId, product_name: &str, category: &str) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CATEGORIES_TABLE)?;
            table.insert((store, product_name), category)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get_settings(&self, store: StoreId) -> StoreResult<Option<StoreSettings>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        match table.get(store)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_settings(&self, store: StoreId, settings: &StoreSettings) -> StoreResult<()> {
        let value = serde_json::to_vec(settings)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            table.insert(store, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Precondition;
    use chrono::NaiveDate;
    use shared::models::{Occupancy, Size};

    fn create_test_store() -> RedbFloorStore {
        RedbFloorStore::open_in_memory().unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn occupied(name: &str) -> Table {
        let mut table = Table::new(name, Size::default(), 1);
        table.occupy(Occupancy {
            guest_name: "鈴木".to_string(),
            cast_names: Default::default(),
            entry_time: Some(at(20, 0)),
            visit_type: None,
        });
        table
    }

    fn header(number: &str, store: StoreId, checkout: NaiveDateTime) -> FinalizedOrder {
        FinalizedOrder {
            receipt_number: number.to_string(),
            store_id: store,
            table_name: "A1".to_string(),
            visit_datetime: None,
            checkout_datetime: checkout,
            guest_name: "鈴木".to_string(),
            staff_name: String::new(),
            visit_type: None,
            subtotal_excl_tax: 0,
            tax_amount: 0,
            service_charge: 0,
            rounding_adjustment: 0,
            discount_amount: 0,
            total_incl_tax: 0,
            order_date: checkout.date(),
            deleted_at: None,
            deleted_by: None,
            lines: vec![],
        }
    }

    #[test]
    fn test_tables_are_scoped_by_store() {
        let store = create_test_store();
        store
            .apply(
                WriteBatch::new(1)
                    .put_table(Table::new("B1", Size::default(), 1))
                    .put_table(Table::new("A1", Size::default(), 1)),
            )
            .unwrap();
        store
            .apply(WriteBatch::new(2).put_table(Table::new("A1", Size::default(), 1)))
            .unwrap();

        let names: Vec<String> = store.list_tables(1).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["A1", "B1"]);
        assert_eq!(store.list_tables(2).unwrap().len(), 1);
        assert!(store.list_tables(3).unwrap().is_empty());
    }

    #[test]
    fn test_failed_precondition_writes_nothing() {
        let store = create_test_store();
        store
            .apply(
                WriteBatch::new(1)
                    .put_table(occupied("A1"))
                    .put_table(occupied("A2")),
            )
            .unwrap();

        let mut moved = occupied("A2");
        moved.guest_name = Some("高橋".to_string());
        let result = store.apply(
            WriteBatch::new(1)
                .require("A1", Precondition::Occupied)
                .require("A2", Precondition::Vacant)
                .put_table(moved)
                .put_table(Table::new("A1", Size::default(), 1))
                .put_draft("A2", vec![OrderLine::new("ビール", 500, Default::default())]),
        );

        assert!(matches!(
            result,
            Err(StoreError::PreconditionFailed { ref table, expected: Precondition::Vacant }) if table == "A2"
        ));
        assert_eq!(store.get_table(1, "A1").unwrap(), Some(occupied("A1")));
        assert_eq!(store.get_table(1, "A2").unwrap(), Some(occupied("A2")));
        assert!(store.get_draft(1, "A2").unwrap().is_empty());
    }

    #[test]
    fn test_draft_put_and_delete() {
        let store = create_test_store();
        let lines = vec![OrderLine::new("ビール", 500, Default::default())];
        store.apply(WriteBatch::new(1).put_draft("A1", lines.clone())).unwrap();
        assert_eq!(store.get_draft(1, "A1").unwrap(), lines);

        store.apply(WriteBatch::new(1).delete_draft("A1")).unwrap();
        assert!(store.get_draft(1, "A1").unwrap().is_empty());
    }

    #[test]
    fn test_receipt_lines_rewrite_is_idempotent() {
        let store = create_test_store();
        let line = |name: &str| FinalizedOrderLine {
            category: None,
            product_name: name.to_string(),
            cast_names: vec![],
            unit_price: 500,
            unit_price_excl_tax: 455,
            quantity: 1,
            subtotal: 500,
        };

        store
            .put_receipt_lines(1, "A1-1", &[line("a"), line("b"), line("c")])
            .unwrap();
        store.put_receipt_lines(1, "A1-1", &[line("a"), line("b")]).unwrap();

        let lines = store.get_receipt_lines(1, "A1-1").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].product_name, "b");
        assert!(store.get_receipt_lines(2, "A1-1").unwrap().is_empty());
    }

    #[test]
    fn test_receipts_are_scoped_by_store() {
        let store = create_test_store();
        let mut first = header("A1-20250310220000000", 1, at(22, 0));
        first.guest_name = "田中".to_string();
        let mut second = header("A1-20250310220000000", 2, at(22, 0));
        second.guest_name = "佐藤".to_string();
        store.put_receipt_header(&first).unwrap();
        store.put_receipt_header(&second).unwrap();
        store
            .put_payment(1, "A1-20250310220000000", &Payment::default())
            .unwrap();

        let got = store.get_receipt_header(1, "A1-20250310220000000").unwrap().unwrap();
        assert_eq!(got.guest_name, "田中");
        let got = store.get_receipt_header(2, "A1-20250310220000000").unwrap().unwrap();
        assert_eq!(got.guest_name, "佐藤");
        assert!(store.get_payment(2, "A1-20250310220000000").unwrap().is_none());

        store
            .mark_receipt_deleted(2, "A1-20250310220000000", "manager", at(23, 0))
            .unwrap();
        assert!(!store.get_receipt_header(1, "A1-20250310220000000").unwrap().unwrap().is_deleted());
        assert_eq!(store.list_receipt_headers(1, at(5, 0), at(23, 0)).unwrap().len(), 1);
    }

    #[test]
    fn test_list_receipt_headers_half_open_range() {
        let store = create_test_store();
        store.put_receipt_header(&header("r1", 1, at(5, 0))).unwrap();
        store.put_receipt_header(&header("r2", 1, at(23, 59))).unwrap();
        store.put_receipt_header(&header("r3", 2, at(12, 0))).unwrap();
        store.put_receipt_header(&header("r4", 1, at(4, 59))).unwrap();

        store.put_receipt_header(&header("r5", 1, at(6, 30))).unwrap();

        let numbers: Vec<String> = store
            .list_receipt_headers(1, at(5, 0), at(23, 59))
            .unwrap()
            .into_iter()
            .map(|h| h.receipt_number)
            .collect();
        assert_eq!(numbers, vec!["r1", "r5"]);
        assert!(store.list_receipt_headers(1, at(23, 59), at(5, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_rewritten_header_moves_in_checkout_index() {
        let store = create_test_store();
        store.put_receipt_header(&header("r1", 1, at(10, 0))).unwrap();
        store.put_receipt_header(&header("r1", 1, at(20, 0))).unwrap();

        assert!(store.list_receipt_headers(1, at(9, 0), at(11, 0)).unwrap().is_empty());
        let found = store.list_receipt_headers(1, at(19, 0), at(21, 0)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].checkout_datetime, at(20, 0));
    }

    #[test]
    fn test_mark_receipt_deleted() {
        let store = create_test_store();
        store.put_receipt_header(&header("r1", 1, at(22, 0))).unwrap();

        let updated = store
            .mark_receipt_deleted(1, "r1", "manager", at(23, 0))
            .unwrap()
            .unwrap();
        assert_eq!(updated.deleted_by.as_deref(), Some("manager"));
        assert!(store.get_receipt_header(1, "r1").unwrap().unwrap().is_deleted());

        assert!(store.mark_receipt_deleted(1, "nope", "manager", at(23, 0)).unwrap().is_none());
        assert!(store.mark_receipt_deleted(2, "r1", "manager", at(23, 0)).unwrap().is_none());
    }

    #[test]
    fn test_settings_and_categories() {
        let store = create_test_store();
        assert!(store.get_settings(1).unwrap().is_none());
        store.put_settings(1, &StoreSettings::default()).unwrap();
        assert_eq!(store.get_settings(1).unwrap(), Some(StoreSettings::default()));

        store.put_category(1, "シャンパン", "ボトル").unwrap();
        assert_eq!(store.category_of(1, "シャンパン").unwrap().as_deref(), Some("ボトル"));
        assert!(store.category_of(2, "シャンパン").unwrap().is_none());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floor.redb");
        {
            let store = RedbFloorStore::open(&path).unwrap();
            store.apply(WriteBatch::new(1).put_table(occupied("A1"))).unwrap();
        }
        let store = RedbFloorStore::open(&path).unwrap();
        assert!(store.get_table(1, "A1").unwrap().unwrap().is_occupied());
    }
}
