// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Ledger record types and the per-record status state machine.
//!
//! A record has immutable identity and a mutable status:
//!
//! ```text
//! pending → processing → completed
//!         ↘ processing → failed
//! pending → cancelled
//! pending → failed      (rollback before the worker picks it up)
//! ```
//!
//! `completed`, `failed`, and `cancelled` are terminal. Any write that
//! would move a terminal record is rejected by the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of monetary event a ledger record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Withdrawal of the full available balance to the user's wallet
    Payout,
    /// Sender side of a peer-to-peer donation
    DonationSent,
    /// Recipient side of a peer-to-peer donation
    DonationReceived,
    /// Reward credited for an accepted report
    RewardReceived,
    /// Penalty debited by an operator
    PenaltyDeducted,
    /// Bonus credited by an operator
    BonusAdded,
    /// Refund of a previously deducted amount
    Refund,
    /// Wallet bound to the account (amount is zero)
    WalletConnected,
    /// Wallet unbound from the account (amount is zero)
    WalletDisconnected,
    /// Standalone message attestation (amount is zero)
    MessageSigned,
}

/// Ledger record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Created, settlement not started
    Pending,
    /// Settlement in flight
    Processing,
    /// Settled successfully (terminal)
    Completed,
    /// Settlement failed, funds released (terminal)
    Failed,
    /// Cancelled before processing started (terminal)
    Cancelled,
}

impl TxStatus {
    /// Whether this status permits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the status machine allows `self → next`.
    pub fn can_transition_to(self, next: TxStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Processing) => true,
            (Self::Pending, Self::Cancelled) => true,
            // Queue-full rollback fails a record the worker never saw.
            (Self::Pending, Self::Failed) => true,
            (Self::Processing, Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Default retry budget for a future automatic-retry policy.
///
/// The executor itself never retries; a failed payout is terminal and the
/// caller must re-initiate.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// One monetary event and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerRecord {
    /// Record id (uuid v4)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Kind of event
    pub kind: TxKind,
    /// Amount in minor units (always >= 0 by type)
    pub amount_minor: u64,
    /// Current status
    pub status: TxStatus,
    /// Source address, when the event has an on-chain leg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    /// Destination address, when the event has an on-chain leg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    /// On-chain confirmation reference, unique when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Error detail for failed records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Retries performed so far (reserved, see `DEFAULT_MAX_RETRIES`)
    pub retry_count: u32,
    /// Retry budget (reserved)
    pub max_retries: u32,
    /// Free-form key/value detail
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// When the record was created
    pub initiated_at: DateTime<Utc>,
    /// When settlement started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// When the record completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the record failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl LedgerRecord {
    /// Create a new `pending` record.
    pub fn new_pending(user_id: &str, kind: TxKind, amount_minor: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            amount_minor,
            status: TxStatus::Pending,
            from_address: None,
            to_address: None,
            tx_hash: None,
            error: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            metadata: BTreeMap::new(),
            initiated_at: Utc::now(),
            processed_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    /// Create a record that settles synchronously (no external leg).
    pub fn new_completed(user_id: &str, kind: TxKind, amount_minor: u64) -> Self {
        let mut record = Self::new_pending(user_id, kind, amount_minor);
        record.status = TxStatus::Completed;
        record.completed_at = Some(record.initiated_at);
        record
    }

    /// Attach source/destination addresses.
    pub fn with_addresses(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_address = from;
        self.to_address = to;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Whether this record still holds a balance reservation.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, TxStatus::Pending | TxStatus::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_allow_no_transitions() {
        for terminal in [TxStatus::Completed, TxStatus::Failed, TxStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                TxStatus::Pending,
                TxStatus::Processing,
                TxStatus::Completed,
                TxStatus::Failed,
                TxStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn pending_transitions() {
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Processing));
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Cancelled));
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Failed));
        // Completion requires passing through processing first.
        assert!(!TxStatus::Pending.can_transition_to(TxStatus::Completed));
        assert!(!TxStatus::Processing.can_transition_to(TxStatus::Pending));
        assert!(!TxStatus::Processing.can_transition_to(TxStatus::Cancelled));
    }

    #[test]
    fn new_completed_is_terminal_with_timestamp() {
        let record = LedgerRecord::new_completed("user-1", TxKind::DonationSent, 500);
        assert_eq!(record.status, TxStatus::Completed);
        assert_eq!(record.completed_at, Some(record.initiated_at));
        assert!(!record.is_in_flight());
    }

    #[test]
    fn new_pending_has_retry_budget() {
        let record = LedgerRecord::new_pending("user-1", TxKind::Payout, 100);
        assert_eq!(record.retry_count, 0);
        assert_eq!(record.max_retries, DEFAULT_MAX_RETRIES);
        assert!(record.is_in_flight());
    }
}
