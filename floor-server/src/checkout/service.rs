//! CheckoutService - 结账持久化
//!
//! 金额计算交给 [`compute_breakdown`]，之后按顺序写入：
//!
//! 1. 小票头 (header)
//! 2. 小票明细 (lines，按商品名查分类)
//! 3. 支付记录 (payment)
//! 4. 删除草稿订单
//! 5. 清空桌台占用
//!
//! 每一步都以 `(店铺, 小票号)` 为键并可重复执行。任一步失败立即停止并返回
//! [`FloorError::CheckoutFailed`]，草稿和占用只在前三步全部成功后才清除，
//! 用相同输入 (或错误里带回的小票号，见 [`CheckoutService::resume_time`]) 重试即可从断点继续。
//!
//! 已存在的小票只允许同一次来店 (桌台、入店时间、客人一致) 重写，
//! 否则返回 `ReceiptNumberTaken` 冲突，不覆盖已有记录。

use chrono::NaiveDateTime;
use shared::error::ErrorCode;
use shared::models::{FinalizedOrder, Occupancy, PaymentInput, StoreId, StoreSettings, Table};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::money::{CheckoutInput, CheckoutQuote, compute_breakdown, quote, receipt_number};
use crate::core::{CheckoutStep, FloorError, FloorResult};
use crate::storage::{FloorStore, Precondition, StoreResult, WriteBatch};

/// Checkout request for one occupied table
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub store: StoreId,
    pub table: String,
    pub checkout_time: NaiveDateTime,
    /// Fallbacks used only when the table row lacks them
    pub guest_name: Option<String>,
    pub cast_names: Option<BTreeSet<String>>,
    pub visit_type: Option<String>,
    pub payment: PaymentInput,
    pub discount_amount: i64,
    pub total_amount: i64,
}

#[derive(Clone)]
pub struct CheckoutService {
    floor: Arc<dyn FloorStore>,
}

impl CheckoutService {
    pub fn new(floor: Arc<dyn FloorStore>) -> Self {
        Self { floor }
    }

    /// Preview for the current draft of an occupied table
    pub fn quote(&self, store: StoreId, table: &str, settings: &StoreSettings) -> FloorResult<CheckoutQuote> {
        let row = self.occupied_table(store, table)?;
        let lines = self.floor.get_draft(store, &row.name)?;
        quote(&lines, settings)
    }

    pub fn checkout(&self, request: &CheckoutRequest, settings: &StoreSettings) -> FloorResult<FinalizedOrder> {
        if request.total_amount < 0 || request.discount_amount < 0 {
            return Err(FloorError::Validation("amounts must not be negative".to_string()));
        }

        let row = self.occupied_table(request.store, &request.table)?;
        let number = receipt_number(&request.table, request.checkout_time);
        let lines = self.floor.get_draft(request.store, &request.table)?;
        let occupancy = merge_occupancy(&row, request);
        let existing = self.floor.get_receipt_header(request.store, &number)?;

        if lines.is_empty() {
            // Header already written by an earlier attempt: finish the remaining steps
            if let Some(existing) = existing
                && same_sitting(&existing, &request.table, &occupancy)
            {
                return self.resume(request, row, existing);
            }
            return Err(FloorError::rejected(
                ErrorCode::OrderEmpty,
                format!("Table {} has no order lines", request.table),
            ));
        }

        if request.payment.tendered() < request.total_amount {
            return Err(FloorError::rejected(
                ErrorCode::PaymentInsufficientAmount,
                format!(
                    "Tendered {} is less than total {}",
                    request.payment.tendered(),
                    request.total_amount
                ),
            ));
        }

        if let Some(existing) = &existing {
            if existing.is_deleted() {
                return Err(FloorError::rejected(
                    ErrorCode::ReceiptAlreadyDeleted,
                    format!("Receipt {} was deleted", number),
                ));
            }
            if !same_sitting(existing, &request.table, &occupancy) {
                tracing::warn!(
                    store = request.store,
                    table = %request.table,
                    receipt_number = %number,
                    "Receipt number already belongs to another sitting"
                );
                return Err(FloorError::Conflict {
                    code: ErrorCode::ReceiptNumberTaken,
                    message: format!("Receipt {} already exists for another sitting", number),
                });
            }
        }

        let breakdown = compute_breakdown(&CheckoutInput {
            store: request.store,
            table: &request.table,
            checkout_time: request.checkout_time,
            lines: &lines,
            occupancy: &occupancy,
            payment: &request.payment,
            discount_amount: request.discount_amount,
            total_amount: request.total_amount,
            tax_rate_percent: settings.tax_rate_percent,
            service_fee_percent: settings.service_fee_percent,
            business_day_start_hour: settings.business_day_start_hour,
        })?;
        let mut order = breakdown.order;

        step(&number, CheckoutStep::Header, self.floor.put_receipt_header(&order))?;

        step(&number, CheckoutStep::Lines, self.categorize(request.store, &mut order))?;
        step(
            &number,
            CheckoutStep::Lines,
            self.floor.put_receipt_lines(request.store, &number, &order.lines),
        )?;

        step(
            &number,
            CheckoutStep::Payment,
            self.floor.put_payment(request.store, &number, &breakdown.payment),
        )?;

        self.release_table(request.store, row, &number)?;

        tracing::info!(
            store = request.store,
            table = %request.table,
            receipt_number = %number,
            total = order.total_incl_tax,
            lines = order.lines.len(),
            "Checkout completed"
        );
        Ok(order)
    }

    /// Checkout time of an interrupted receipt, so a retry lands on the same number
    pub fn resume_time(&self, store: StoreId, table: &str, receipt_number: &str) -> FloorResult<NaiveDateTime> {
        let header = self
            .floor
            .get_receipt_header(store, receipt_number)?
            .ok_or_else(|| FloorError::receipt_not_found(receipt_number))?;
        if header.table_name != table {
            return Err(FloorError::Validation(format!(
                "Receipt {} belongs to table {}, not {}",
                receipt_number, header.table_name, table
            )));
        }
        Ok(header.checkout_datetime)
    }

    fn occupied_table(&self, store: StoreId, table: &str) -> FloorResult<Table> {
        let row = self
            .floor
            .get_table(store, table)?
            .ok_or_else(|| FloorError::table_not_found(table))?;
        if !row.is_occupied() {
            return Err(FloorError::table_not_found(table));
        }
        Ok(row)
    }

    fn categorize(&self, store: StoreId, order: &mut FinalizedOrder) -> StoreResult<()> {
        for line in &mut order.lines {
            line.category = self.floor.category_of(store, &line.product_name)?;
        }
        Ok(())
    }

    fn resume(
        &self,
        request: &CheckoutRequest,
        row: Table,
        mut existing: FinalizedOrder,
    ) -> FloorResult<FinalizedOrder> {
        let number = existing.receipt_number.clone();
        tracing::warn!(
            store = request.store,
            table = %request.table,
            receipt_number = %number,
            "Resuming interrupted checkout"
        );
        self.release_table(request.store, row, &number)?;
        existing.lines = self.floor.get_receipt_lines(request.store, &number)?;
        Ok(existing)
    }

    fn release_table(&self, store: StoreId, mut row: Table, number: &str) -> FloorResult<()> {
        step(
            number,
            CheckoutStep::ClearDraft,
            self.floor.apply(WriteBatch::new(store).delete_draft(row.name.clone())),
        )?;

        row.vacate();
        step(
            number,
            CheckoutStep::ClearTable,
            self.floor.apply(
                WriteBatch::new(store)
                    .require(row.name.clone(), Precondition::Exists)
                    .put_table(row),
            ),
        )
    }
}

fn step<T>(receipt_number: &str, step: CheckoutStep, result: StoreResult<T>) -> FloorResult<T> {
    result.map_err(|cause| {
        tracing::error!(
            receipt_number = %receipt_number,
            step = %step,
            error = %cause,
            "Checkout step failed"
        );
        FloorError::CheckoutFailed {
            receipt_number: receipt_number.to_string(),
            step,
            cause,
        }
    })
}

/// Whether a stored receipt was written for the sitting now at the table
fn same_sitting(existing: &FinalizedOrder, table: &str, occupancy: &Occupancy) -> bool {
    existing.table_name == table
        && existing.visit_datetime == occupancy.entry_time
        && existing.guest_name == occupancy.guest_name
}

/// Occupant as recorded on the table, request values filling gaps
fn merge_occupancy(row: &Table, request: &CheckoutRequest) -> Occupancy {
    let mut occupancy = row.occupancy().unwrap_or_else(|| Occupancy {
        guest_name: String::new(),
        cast_names: BTreeSet::new(),
        entry_time: None,
        visit_type: None,
    });
    if occupancy.guest_name.trim().is_empty()
        && let Some(guest) = &request.guest_name
    {
        occupancy.guest_name = guest.clone();
    }
    if occupancy.cast_names.is_empty()
        && let Some(casts) = &request.cast_names
    {
        occupancy.cast_names = casts.clone();
    }
    if occupancy.visit_type.is_none() {
        occupancy.visit_type = request.visit_type.clone();
    }
    occupancy
}
