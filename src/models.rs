// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for automatic JSON handling
//! and OpenAPI documentation. Field names are camelCase on the wire;
//! amounts are integer minor units (6 decimals).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::{LedgerRecord, TxKind, TxStatus};

// =============================================================================
// Payments
// =============================================================================

/// Balance figures for the caller's account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// Total balance in minor units
    pub balance: u64,
    /// Reserved portion in minor units
    pub locked_balance: u64,
    /// Spendable portion: balance - locked
    pub available_balance: u64,
    /// Whether a verified wallet is connected
    pub wallet_connected: bool,
}

/// Accepted payout (settlement still in flight).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    /// Ledger record id to poll in the transaction list
    pub transaction_id: String,
    /// Reserved amount in minor units
    pub amount: u64,
    /// Always `pending` at accept time
    pub status: TxStatus,
    /// Destination wallet address
    pub wallet_address: String,
}

/// Donation request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonateRequest {
    /// Recipient user id
    pub to_user_id: String,
    /// Amount in minor units
    pub amount: u64,
    /// Optional message recorded on both ledger entries
    #[serde(default)]
    pub message: Option<String>,
}

/// Completed donation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonateResponse {
    /// Sender-side ledger record id
    pub transaction_id: String,
    /// Transferred amount in minor units
    pub amount: u64,
    /// Sender user id
    pub from: String,
    /// Recipient user id
    pub to: String,
}

/// One ledger record as shown to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: u64,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub initiated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<LedgerRecord> for TransactionView {
    fn from(record: LedgerRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            amount: record.amount_minor,
            status: record.status,
            tx_hash: record.tx_hash,
            error: record.error,
            initiated_at: record.initiated_at,
            completed_at: record.completed_at,
        }
    }
}

/// Transaction history, newest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionView>,
}

// =============================================================================
// Wallet binding
// =============================================================================

/// Request to start wallet verification.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageRequest {
    /// Address the caller claims to control
    pub wallet_address: String,
}

/// Challenge the wallet must sign.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageResponse {
    /// Exact text to sign (byte-for-byte)
    pub verification_message: String,
    /// Echo of the claimed address
    pub wallet_address: String,
    /// Challenge expiry
    pub expires_at: DateTime<Utc>,
}

/// Signed challenge submission.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureRequest {
    /// Address the signature must recover to
    pub wallet_address: String,
    /// Hex signature over the challenge message
    pub signature: String,
    /// Challenge message as signed
    pub message: String,
}

/// Successful wallet binding.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureResponse {
    pub wallet_address: String,
    pub wallet_verified: bool,
    pub connected_at: DateTime<Utc>,
}

/// Wallet binding status for the caller.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatusResponse {
    pub has_wallet: bool,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    /// Whether an unexpired challenge is pending
    pub has_pending_verification: bool,
}

/// Disconnect confirmation.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    /// Must be `true`; guards against accidental disconnects
    #[serde(default)]
    pub confirm_disconnect: bool,
}

/// Wallet unbound.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectResponse {
    pub previous_wallet_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_response_uses_camel_case() {
        let response = BalanceResponse {
            balance: 100,
            locked_balance: 40,
            available_balance: 60,
            wallet_connected: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["lockedBalance"], 40);
        assert_eq!(json["availableBalance"], 60);
        assert_eq!(json["walletConnected"], true);
    }

    #[test]
    fn transaction_view_renames_kind_to_type() {
        let record = LedgerRecord::new_completed("u1", TxKind::DonationSent, 5);
        let view = TransactionView::from(record);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "donation_sent");
        assert_eq!(json["status"], "completed");
        assert!(json.get("txHash").is_none());
    }

    #[test]
    fn disconnect_confirmation_defaults_to_false() {
        let request: DisconnectRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.confirm_disconnect);
    }
}
