//! 小票查询与作废

use chrono::{NaiveDate, NaiveDateTime};
use shared::error::ErrorCode;
use shared::models::{FinalizedOrder, ReceiptDetail, StoreId};
use std::sync::Arc;

use crate::core::{FloorError, FloorResult};
use crate::storage::FloorStore;
use crate::utils::time::range_for;

#[derive(Clone)]
pub struct ReceiptService {
    floor: Arc<dyn FloorStore>,
}

impl ReceiptService {
    pub fn new(floor: Arc<dyn FloorStore>) -> Self {
        Self { floor }
    }

    /// Receipts checked out within the business day, newest first
    pub fn receipts_for_business_day(
        &self,
        store: StoreId,
        date: NaiveDate,
        start_hour: u32,
    ) -> FloorResult<Vec<FinalizedOrder>> {
        let range = range_for(date, start_hour);
        // Index order is oldest first
        let mut headers = self.floor.list_receipt_headers(store, range.start, range.end)?;
        headers.reverse();

        for header in &mut headers {
            header.lines = self.floor.get_receipt_lines(store, &header.receipt_number)?;
        }
        Ok(headers)
    }

    pub fn receipt(&self, store: StoreId, receipt_number: &str) -> FloorResult<ReceiptDetail> {
        let mut order = self
            .floor
            .get_receipt_header(store, receipt_number)?
            .ok_or_else(|| FloorError::receipt_not_found(receipt_number))?;
        order.lines = self.floor.get_receipt_lines(store, receipt_number)?;
        let payment = self.floor.get_payment(store, receipt_number)?;
        Ok(ReceiptDetail { order, payment })
    }

    /// Mark a receipt deleted; it stays readable but is flagged
    pub fn soft_delete_receipt(
        &self,
        store: StoreId,
        receipt_number: &str,
        deleted_by: &str,
        at: NaiveDateTime,
    ) -> FloorResult<FinalizedOrder> {
        if deleted_by.trim().is_empty() {
            return Err(FloorError::Validation("deleted_by is required".to_string()));
        }

        let existing = self
            .floor
            .get_receipt_header(store, receipt_number)?
            .ok_or_else(|| FloorError::receipt_not_found(receipt_number))?;
        if existing.is_deleted() {
            return Err(FloorError::Conflict {
                code: ErrorCode::ReceiptAlreadyDeleted,
                message: format!("Receipt {} is already deleted", receipt_number),
            });
        }

        let deleted = self
            .floor
            .mark_receipt_deleted(store, receipt_number, deleted_by.trim(), at)?
            .ok_or_else(|| FloorError::receipt_not_found(receipt_number))?;

        tracing::info!(
            store = store,
            receipt_number = %receipt_number,
            deleted_by = %deleted_by,
            "Receipt soft-deleted"
        );
        Ok(deleted)
    }
}
