// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Wallet binding protocol: challenge issuance and signature verification.

pub mod challenge;
pub mod verify;

pub use challenge::{WalletChallenge, CHALLENGE_TTL_SECS};
pub use verify::{validate_wallet_address, verify_personal_sign, VerifyError};
