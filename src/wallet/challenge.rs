// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Wallet-binding challenges.
//!
//! A challenge is a unique, time-limited message the wallet owner must
//! sign to prove address ownership. The message is attestation-only: it
//! is never executable as an on-chain operation.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Challenge lifetime.
pub const CHALLENGE_TTL_SECS: i64 = 5 * 60;

/// Nonce length in characters.
const NONCE_LEN: usize = 13;

/// A pending wallet-binding challenge, owned by exactly one account.
///
/// Created by the generate step, consumed by verification (successful or
/// definitively failed), superseded by re-issuing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletChallenge {
    /// Claimed address, must match the verification request byte-for-byte
    pub wallet_address: String,
    /// Exact text the wallet must sign
    pub message: String,
    /// Random nonce embedded in the message
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WalletChallenge {
    /// Build a challenge for `address` on behalf of `username`.
    pub fn issue(app_name: &str, username: &str, address: &str) -> Self {
        let issued_at = Utc::now();
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let message = format!(
            "Connect wallet to {app_name}\n\n\
             Wallet: {address}\n\
             User: {username}\n\
             Timestamp: {ts}\n\
             Nonce: {nonce}\n\n\
             This request will not trigger any blockchain transaction or cost any gas fees.",
            ts = issued_at.timestamp_millis(),
        );
        Self {
            wallet_address: address.to_string(),
            message,
            nonce,
            issued_at,
            expires_at: issued_at + Duration::seconds(CHALLENGE_TTL_SECS),
        }
    }

    /// Expiry is passive: checked at verification time, not by a timer.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
