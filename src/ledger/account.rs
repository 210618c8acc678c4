// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Account aggregate: balance, lock, and wallet-binding fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-user account state.
///
/// Amounts are integer minor units (6 decimals, the settlement token's
/// precision). `locked_minor <= balance_minor` holds at all times; the
/// store only mutates either inside a ledger-writing transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Stable user id (from the identity provider)
    pub user_id: String,
    /// Display name, embedded in wallet challenges
    pub username: String,
    /// Contact email
    pub email: String,
    /// Total balance in minor units
    pub balance_minor: u64,
    /// Reserved portion of the balance in minor units
    pub locked_minor: u64,
    /// Bound wallet address, globally unique once verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Whether the bound address passed signature verification
    pub wallet_verified: bool,
    /// When the wallet was bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account with a zero balance and no wallet.
    pub fn new(user_id: &str, username: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            balance_minor: 0,
            locked_minor: 0,
            wallet_address: None,
            wallet_verified: false,
            wallet_connected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance not currently reserved: `balance - locked`.
    pub fn available_minor(&self) -> u64 {
        self.balance_minor.saturating_sub(self.locked_minor)
    }
}

/// Snapshot of an account's balance figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccountBalances {
    /// Total balance in minor units
    pub balance_minor: u64,
    /// Reserved balance in minor units
    pub locked_minor: u64,
    /// `balance - locked`
    pub available_minor: u64,
}

impl From<&Account> for AccountBalances {
    fn from(account: &Account) -> Self {
        Self {
            balance_minor: account.balance_minor,
            locked_minor: account.locked_minor,
            available_minor: account.available_minor(),
        }
    }
}
