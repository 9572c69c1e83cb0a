//! Fault-injecting store wrapper for tests

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use shared::models::{FinalizedOrder, FinalizedOrderLine, OrderLine, Payment, StoreId, StoreSettings, Table};
use std::collections::HashSet;

use super::{FloorStore, RedbFloorStore, StoreError, StoreResult, WriteBatch, WriteOp};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    ReceiptHeader,
    ReceiptLines,
    Payment,
    /// Any batch that deletes a draft
    DeleteDraft,
    /// Any batch that writes a table row
    PutTable,
}

/// Delegates to an in-memory [`RedbFloorStore`] unless a fault is armed
pub struct FaultyFloor {
    pub inner: RedbFloorStore,
    faults: Mutex<HashSet<Fault>>,
}

impl FaultyFloor {
    pub fn new() -> Self {
        Self {
            inner: RedbFloorStore::open_in_memory().unwrap(),
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().clear();
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        if self.faults.lock().contains(&fault) {
            return Err(StoreError::Other(format!("injected failure: {:?}", fault)));
        }
        Ok(())
    }
}

impl FloorStore for FaultyFloor {
    fn list_tables(&self, store: StoreId) -> StoreResult<Vec<Table>> {
        self.inner.list_tables(store)
    }

    fn get_table(&self, store: StoreId, name: &str) -> StoreResult<Option<Table>> {
        self.inner.get_table(store, name)
    }

    fn get_draft(&self, store: StoreId, table: &str) -> StoreResult<Vec<OrderLine>> {
        self.inner.get_draft(store, table)
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        for op in &batch.ops {
            match op {
                WriteOp::DeleteDraft(_) => self.check(Fault::DeleteDraft)?,
                WriteOp::PutTable(_) => self.check(Fault::PutTable)?,
                _ => {}
            }
        }
        self.inner.apply(batch)
    }

    fn put_receipt_header(&self, header: &FinalizedOrder) -> StoreResult<()> {
        self.check(Fault::ReceiptHeader)?;
        self.inner.put_receipt_header(header)
    }

    fn put_receipt_lines(
        &self,
        store: StoreId,
        receipt_number: &str,
        lines: &[FinalizedOrderLine],
    ) -> StoreResult<()> {
        self.check(Fault::ReceiptLines)?;
        self.inner.put_receipt_lines(store, receipt_number, lines)
    }

    fn put_payment(&self, store: StoreId, receipt_number: &str, payment: &Payment) -> StoreResult<()> {
        self.check(Fault::Payment)?;
        self.inner.put_payment(store, receipt_number, payment)
    }

    fn get_receipt_header(&self, store: StoreId, receipt_number: &str) -> StoreResult<Option<FinalizedOrder>> {
        self.inner.get_receipt_header(store, receipt_number)
    }

    fn get_receipt_lines(&self, store: StoreId, receipt_number: &str) -> StoreResult<Vec<FinalizedOrderLine>> {
        self.inner.get_receipt_lines(store, receipt_number)
    }

    fn get_payment(&self, store: StoreId, receipt_number: &str) -> StoreResult<Option<Payment>> {
        self.inner.get_payment(store, receipt_number)
    }

    fn list_receipt_headers(
        &self,
        store: StoreId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> StoreResult<Vec<FinalizedOrder>> {
        self.inner.list_receipt_headers(store, from, to)
    }

    fn mark_receipt_deleted(
        &self,
        store: StoreId,
        receipt_number: &str,
        deleted_by: &str,
        at: NaiveDateTime,
    ) -> StoreResult<Option<FinalizedOrder>> {
        self.inner.mark_receipt_deleted(store, receipt_number, deleted_by, at)
    }

    fn category_of(&self, store: StoreId, product_name: &str) -> StoreResult<Option<String>> {
        self.inner.category_of(store, product_name)
    }

    fn put_category(&self, store: StoreId, product_name: &str, category: &str) -> StoreResult<()> {
        self.inner.put_category(store, product_name, category)
    }

    fn get_settings(&self, store: StoreId) -> StoreResult<Option<StoreSettings>> {
        self.inner.get_settings(store)
    }

    fn put_settings(&self, store: StoreId, settings: &StoreSettings) -> StoreResult<()> {
        self.inner.put_settings(store, settings)
    }
}
