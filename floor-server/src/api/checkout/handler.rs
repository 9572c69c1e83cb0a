//! Checkout API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use shared::models::{FinalizedOrder, PaymentInput, StoreId};
use std::collections::BTreeSet;

use crate::checkout::{CheckoutQuote, CheckoutRequest, card_fee};
use crate::core::ServerState;
use crate::utils::AppResult;

/// Checkout body; omitted values fall back to the table row and store settings
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    /// Defaults to now (venue timezone), or to the time of `receipt_number`
    pub checkout_time: Option<NaiveDateTime>,
    /// Receipt reported by an incomplete checkout; a retry finishes that receipt
    pub receipt_number: Option<String>,
    pub guest_name: Option<String>,
    pub cast_names: Option<BTreeSet<String>>,
    pub visit_type: Option<String>,
    #[serde(default)]
    pub payment: PaymentInput,
    #[serde(default)]
    pub discount_amount: i64,
    /// Defaults to the quoted total minus discount
    pub total_amount: Option<i64>,
}

/// GET /api/stores/:store/tables/:name/quote - 结账预览
pub async fn quote(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
) -> AppResult<Json<CheckoutQuote>> {
    let settings = state.settings.get(store)?;
    let quote = state.checkout.quote(store, &name, &settings)?;
    Ok(Json(quote))
}

/// POST /api/stores/:store/tables/:name/checkout - 结账
pub async fn checkout(
    State(state): State<ServerState>,
    Path((store, name)): Path<(StoreId, String)>,
    Json(body): Json<CheckoutBody>,
) -> AppResult<Json<FinalizedOrder>> {
    let settings = state.settings.get(store)?;

    let total_amount = match body.total_amount {
        Some(total) => total,
        None => state.checkout.quote(store, &name, &settings)?.suggested_total - body.discount_amount,
    };

    let mut payment = body.payment;
    if payment.card_fee == 0 {
        payment.card_fee = card_fee(payment.card_amount, settings.card_fee_rate_percent)?;
    }

    let checkout_time = match (body.checkout_time, body.receipt_number.as_deref()) {
        (Some(at), _) => at,
        (None, Some(number)) => state.checkout.resume_time(store, &name, number)?,
        (None, None) => state.now(),
    };

    let request = CheckoutRequest {
        store,
        table: name,
        checkout_time,
        guest_name: body.guest_name,
        cast_names: body.cast_names,
        visit_type: body.visit_type,
        payment,
        discount_amount: body.discount_amount,
        total_amount,
    };
    let order = state.checkout.checkout(&request, &settings)?;
    Ok(Json(order))
}
