// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Monetary core: accounts, the append-only ledger, and the embedded
//! store that keeps them consistent.

pub mod account;
pub mod record;
pub mod store;

pub use account::{Account, AccountBalances};
pub use record::{LedgerRecord, TxKind, TxStatus, DEFAULT_MAX_RETRIES};
pub use store::{LedgerError, LedgerResult, LedgerStore};
