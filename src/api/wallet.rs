// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Wallet binding endpoints: challenge issuance, signature verification,
//! status, and disconnect.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        DisconnectRequest, DisconnectResponse, GenerateMessageRequest, GenerateMessageResponse,
        VerifySignatureRequest, VerifySignatureResponse, WalletStatusResponse,
    },
    state::AppState,
    wallet::{validate_wallet_address, verify_personal_sign, WalletChallenge},
};

/// Start wallet verification: issue a challenge message to sign.
///
/// Re-issuing supersedes any prior pending challenge for the caller.
#[utoipa::path(
    post,
    path = "/v1/wallet/generate-message",
    tag = "Wallet",
    security(("bearer" = [])),
    request_body = GenerateMessageRequest,
    responses(
        (status = 200, description = "Challenge issued", body = GenerateMessageResponse),
        (status = 400, description = "Invalid address or address already taken"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn generate_message(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<GenerateMessageRequest>,
) -> Result<Json<GenerateMessageResponse>, ApiError> {
    validate_wallet_address(&request.wallet_address)?;
    let account = state.account_for(&user)?;

    // Fail fast on taken addresses; the bind itself re-checks inside
    // its transaction.
    if let Some(owner) = state.ledger.wallet_owner(&request.wallet_address)? {
        if owner != user.user_id {
            return Err(ApiError::bad_request(
                "This wallet is already connected to another account",
            ));
        }
    }

    let challenge = WalletChallenge::issue(
        &state.config.app_name,
        &account.username,
        &request.wallet_address,
    );
    state.ledger.put_challenge(&user.user_id, &challenge)?;

    Ok(Json(GenerateMessageResponse {
        verification_message: challenge.message,
        wallet_address: challenge.wallet_address,
        expires_at: challenge.expires_at,
    }))
}

/// Complete wallet verification with the signed challenge.
///
/// All checks run before any state changes; a failed verification leaves
/// the account untouched.
#[utoipa::path(
    post,
    path = "/v1/wallet/verify-signature",
    tag = "Wallet",
    security(("bearer" = [])),
    request_body = VerifySignatureRequest,
    responses(
        (status = 200, description = "Wallet verified and connected", body = VerifySignatureResponse),
        (status = 400, description = "No pending challenge, expired, mismatch, or invalid signature"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn verify_signature(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<VerifySignatureRequest>,
) -> Result<Json<VerifySignatureResponse>, ApiError> {
    state.account_for(&user)?;

    let challenge = state
        .ledger
        .get_challenge(&user.user_id)?
        .ok_or_else(|| {
            ApiError::bad_request(
                "No pending wallet verification. Please generate a new verification message.",
            )
        })?;

    if challenge.is_expired_at(Utc::now()) {
        state.ledger.clear_challenge(&user.user_id)?;
        return Err(ApiError::bad_request(
            "Verification message expired. Please generate a new one.",
        ));
    }

    if request.message != challenge.message {
        return Err(ApiError::bad_request(
            "Message mismatch. Please sign the exact verification message.",
        ));
    }

    // Byte-for-byte: the address must come back exactly as claimed.
    if request.wallet_address != challenge.wallet_address {
        return Err(ApiError::bad_request(
            "Wallet address does not match the verification request.",
        ));
    }

    verify_personal_sign(&request.wallet_address, &request.message, &request.signature)?;

    // Signature proven; bind atomically (uniqueness re-checked inside).
    let account = state
        .ledger
        .connect_wallet(&user.user_id, &challenge.wallet_address)?;

    Ok(Json(VerifySignatureResponse {
        wallet_address: challenge.wallet_address,
        wallet_verified: true,
        connected_at: account.wallet_connected_at.unwrap_or_else(Utc::now),
    }))
}

/// Wallet binding status for the caller.
#[utoipa::path(
    get,
    path = "/v1/wallet/status",
    tag = "Wallet",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Wallet status", body = WalletStatusResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn wallet_status(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletStatusResponse>, ApiError> {
    let account = state.account_for(&user)?;
    let pending = state
        .ledger
        .get_challenge(&user.user_id)?
        .map(|c| !c.is_expired_at(Utc::now()))
        .unwrap_or(false);

    Ok(Json(WalletStatusResponse {
        has_wallet: account.wallet_address.is_some(),
        is_verified: account.wallet_verified,
        wallet_address: account.wallet_address,
        connected_at: account.wallet_connected_at,
        has_pending_verification: pending,
    }))
}

/// Disconnect the caller's wallet.
///
/// Requires explicit confirmation and refuses while any transaction is
/// pending or processing.
#[utoipa::path(
    post,
    path = "/v1/wallet/disconnect",
    tag = "Wallet",
    security(("bearer" = [])),
    request_body = DisconnectRequest,
    responses(
        (status = 200, description = "Wallet disconnected", body = DisconnectResponse),
        (status = 400, description = "Unconfirmed, no wallet, or transactions in flight"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn disconnect(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<DisconnectRequest>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    if !request.confirm_disconnect {
        return Err(ApiError::bad_request(
            "Please confirm disconnection by setting confirmDisconnect to true",
        ));
    }

    state.account_for(&user)?;
    let previous = state.ledger.disconnect_wallet(&user.user_id)?;

    Ok(Json(DisconnectResponse {
        previous_wallet_address: previous,
    }))
}
