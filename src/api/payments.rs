// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Payment endpoints: balance, payout, donation, history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        BalanceResponse, DonateRequest, DonateResponse, PayoutResponse, TransactionView,
        TransactionsResponse,
    },
    state::AppState,
};

/// Get the caller's balance.
#[utoipa::path(
    get,
    path = "/v1/payment/balance",
    tag = "Payments",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state.account_for(&user)?;
    Ok(Json(BalanceResponse {
        balance: account.balance_minor,
        locked_balance: account.locked_minor,
        available_balance: account.available_minor(),
        wallet_connected: account.wallet_verified,
    }))
}

/// Request a payout of the full available balance to the caller's
/// verified wallet.
///
/// The payout is accepted (202) with a pending ledger record; settlement
/// happens asynchronously. Poll the transaction list for the outcome.
#[utoipa::path(
    get,
    path = "/v1/payment/payout",
    tag = "Payments",
    security(("bearer" = [])),
    responses(
        (status = 202, description = "Payout accepted for processing", body = PayoutResponse),
        (status = 400, description = "No verified wallet, empty balance, or payout already in flight"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Payout queue is full")
    )
)]
pub async fn request_payout(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<PayoutResponse>), ApiError> {
    state.account_for(&user)?;
    let record = state.payouts.initiate(&user.user_id)?;
    let wallet_address = record.to_address.clone().unwrap_or_default();

    Ok((
        StatusCode::ACCEPTED,
        Json(PayoutResponse {
            transaction_id: record.id,
            amount: record.amount_minor,
            status: record.status,
            wallet_address,
        }),
    ))
}

/// Donate part of the caller's available balance to another user.
#[utoipa::path(
    post,
    path = "/v1/payment/donate",
    tag = "Payments",
    security(("bearer" = [])),
    request_body = DonateRequest,
    responses(
        (status = 200, description = "Donation completed", body = DonateResponse),
        (status = 400, description = "Invalid amount, self-donation, or insufficient funds"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipient not found")
    )
)]
pub async fn donate(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<DonateRequest>,
) -> Result<Json<DonateResponse>, ApiError> {
    state.account_for(&user)?;

    // Recipient must exist before the transfer; unknown ids are 404,
    // not auto-provisioned.
    state.ledger.get_account(&request.to_user_id)?;

    let (sent, _received) = state.ledger.donate(
        &user.user_id,
        &request.to_user_id,
        request.amount,
        request.message.as_deref(),
    )?;

    Ok(Json(DonateResponse {
        transaction_id: sent.id,
        amount: sent.amount_minor,
        from: user.user_id,
        to: request.to_user_id,
    }))
}

/// Query parameters for the transaction list.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionsQuery {
    /// Maximum number of records to return (default 50, max 200)
    pub limit: Option<usize>,
}

/// List the caller's ledger records, newest first.
#[utoipa::path(
    get,
    path = "/v1/payment/transactions",
    tag = "Payments",
    params(TransactionsQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction history", body = TransactionsResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_transactions(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    state.account_for(&user)?;
    let limit = query.limit.unwrap_or(50).min(200);
    let records = state.ledger.list_transactions(&user.user_id, limit)?;

    Ok(Json(TransactionsResponse {
        transactions: records.into_iter().map(TransactionView::from).collect(),
    }))
}
