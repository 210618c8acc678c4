// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Embedded ledger store backed by redb (pure Rust, ACID).
//!
//! Every balance mutation and the ledger record describing it are written
//! in the same redb write transaction, so the ledger and the balances can
//! never be observed out of sync. redb serializes writers, which makes
//! each unit of work linearizable: two concurrent payouts cannot both see
//! `available > 0` before either commits.
//!
//! ## Table Layout
//!
//! - `accounts`: user_id → serialized Account
//! - `transactions`: record_id → serialized LedgerRecord
//! - `user_tx_index`: composite key (user_id|!timestamp|record_id) → record_id
//! - `wallet_owners`: lowercase address → user_id (global uniqueness)
//! - `wallet_challenges`: user_id → serialized WalletChallenge

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};

use super::account::{Account, AccountBalances};
use super::record::{LedgerRecord, TxKind, TxStatus};
use crate::wallet::WalletChallenge;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary account table: user_id → serialized Account (JSON bytes).
const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Primary ledger table: record_id → serialized LedgerRecord (JSON bytes).
const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

/// Index: composite key → record_id.
/// Key format: `user_id|!timestamp_be|record_id` for newest-first scans.
const USER_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("user_tx_index");

/// Map: lowercase wallet address → user_id. One owner per address.
const WALLET_OWNERS: TableDefinition<&str, &str> = TableDefinition::new("wallet_owners");

/// Pending challenges: user_id → serialized WalletChallenge.
const WALLET_CHALLENGES: TableDefinition<&str, &[u8]> = TableDefinition::new("wallet_challenges");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("transaction not found: {0}")]
    RecordNotFound(String),

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: u64, requested: u64 },

    #[error("no available balance to pay out")]
    NothingToPayOut,

    #[error("a payout is already in flight for this account")]
    PayoutInFlight,

    #[error("cannot donate to your own account")]
    SelfTransfer,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("this wallet is already connected to another account")]
    WalletTaken,

    #[error("no wallet connected")]
    NoWallet,

    #[error("pending transactions exist for this account")]
    TransactionsInFlight,

    #[error("transaction {id} is terminal ({status}) and cannot transition")]
    Terminal { id: String, status: TxStatus },

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: TxStatus, to: TxStatus },

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the user_tx_index table.
///
/// The inverted timestamp gives newest-first ordering on a forward scan.
fn make_index_key(user_id: &str, timestamp: i64, record_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.len() + 1 + 8 + 1 + record_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(record_id.as_bytes());
    key
}

/// Prefix for scanning all records of a user.
fn make_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a prefix range scan.
fn make_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = make_prefix(user_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

// =============================================================================
// Balance primitives (operate on a deserialized Account inside one txn)
// =============================================================================

/// Move `amount` from available to locked.
fn reserve_funds(account: &mut Account, amount: u64) -> LedgerResult<()> {
    let available = account.available_minor();
    if amount > available {
        return Err(LedgerError::InsufficientFunds {
            available,
            requested: amount,
        });
    }
    account.locked_minor += amount;
    account.updated_at = Utc::now();
    Ok(())
}

/// Return `amount` from locked to available (payout failure).
fn release_funds(account: &mut Account, amount: u64) {
    account.locked_minor = account.locked_minor.saturating_sub(amount);
    account.updated_at = Utc::now();
}

/// Remove `amount` from both balance and locked (payout success).
fn settle_funds(account: &mut Account, amount: u64) {
    account.balance_minor = account.balance_minor.saturating_sub(amount);
    account.locked_minor = account.locked_minor.saturating_sub(amount);
    account.updated_at = Utc::now();
}

// =============================================================================
// LedgerStore
// =============================================================================

/// Embedded ACID store for accounts, ledger records, and challenges.
pub struct LedgerStore {
    db: Database,
}

impl LedgerStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(USER_TX_INDEX)?;
            let _ = write_txn.open_table(WALLET_OWNERS)?;
            let _ = write_txn.open_table(WALLET_CHALLENGES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create a fresh account. Overwrites nothing: existing ids are rejected.
    ///
    /// User ids must not contain `|`, the separator of the transaction
    /// index key; allowing it would let one user's records alias into
    /// another's index range.
    pub fn create_account(&self, user_id: &str, username: &str, email: &str) -> LedgerResult<Account> {
        if user_id.is_empty() || user_id.contains('|') {
            return Err(LedgerError::InvalidUserId(user_id.to_string()));
        }
        let account = Account::new(user_id, username, email);
        let json = serde_json::to_vec(&account)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            if table.get(user_id)?.is_some() {
                return Err(LedgerError::AccountExists(user_id.to_string()));
            }
            table.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(account)
    }

    /// Look up an account by user id.
    pub fn get_account(&self, user_id: &str) -> LedgerResult<Account> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        match table.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(LedgerError::AccountNotFound(user_id.to_string())),
        }
    }

    /// Balance snapshot: `(balance, locked, available)`.
    pub fn balances(&self, user_id: &str) -> LedgerResult<AccountBalances> {
        Ok(AccountBalances::from(&self.get_account(user_id)?))
    }

    /// Credit `amount` to an account with a synchronously completed record
    /// (rewards, bonuses, refunds).
    pub fn credit(
        &self,
        user_id: &str,
        amount: u64,
        kind: TxKind,
        metadata: Option<(&str, serde_json::Value)>,
    ) -> LedgerResult<LedgerRecord> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let mut record = LedgerRecord::new_completed(user_id, kind, amount);
        if let Some((key, value)) = metadata {
            record = record.with_metadata(key, value);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account = read_account(&accounts, user_id)?;
            account.balance_minor += amount;
            account.updated_at = Utc::now();
            write_account(&mut accounts, &account)?;

            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;
            insert_record(&mut records, &mut index, &record)?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Debit `amount` from an account's available balance with a
    /// synchronously completed record (penalties).
    pub fn debit(
        &self,
        user_id: &str,
        amount: u64,
        kind: TxKind,
        metadata: Option<(&str, serde_json::Value)>,
    ) -> LedgerResult<LedgerRecord> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let mut record = LedgerRecord::new_completed(user_id, kind, amount);
        if let Some((key, value)) = metadata {
            record = record.with_metadata(key, value);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account = read_account(&accounts, user_id)?;
            let available = account.available_minor();
            if amount > available {
                return Err(LedgerError::InsufficientFunds {
                    available,
                    requested: amount,
                });
            }
            account.balance_minor -= amount;
            account.updated_at = Utc::now();
            write_account(&mut accounts, &account)?;

            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;
            insert_record(&mut records, &mut index, &record)?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    // =========================================================================
    // Payout unit of work
    // =========================================================================

    /// Reserve the full available balance and create a pending payout record,
    /// in one transaction.
    ///
    /// Rejects if another payout is pending/processing for the user (at most
    /// one in-flight payout per account) or if nothing is available.
    pub fn reserve_for_payout(
        &self,
        user_id: &str,
        from_address: Option<String>,
    ) -> LedgerResult<LedgerRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;

            let mut account = read_account(&accounts, user_id)?;
            let available = account.available_minor();
            if available == 0 {
                return Err(LedgerError::NothingToPayOut);
            }

            // Idempotency guard, checked inside the write transaction so a
            // concurrent initiate cannot slip past it.
            if scan_inflight_payout(&index, &records, user_id)?.is_some() {
                return Err(LedgerError::PayoutInFlight);
            }

            reserve_funds(&mut account, available)?;

            let record = LedgerRecord::new_pending(user_id, TxKind::Payout, available)
                .with_addresses(from_address, account.wallet_address.clone());

            write_account(&mut accounts, &account)?;
            insert_record(&mut records, &mut index, &record)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Move a payout record `pending → processing` when the worker picks
    /// it up.
    pub fn mark_processing(&self, record_id: &str) -> LedgerResult<LedgerRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut record = read_record(&records, record_id)?;
            check_transition(&record, TxStatus::Processing)?;
            record.status = TxStatus::Processing;
            record.processed_at = Some(Utc::now());
            write_record(&mut records, &record)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Settle a confirmed payout: record → completed with the on-chain
    /// reference, balance and locked both decrease by the reserved amount.
    pub fn settle_payout(&self, record_id: &str, tx_hash: &str) -> LedgerResult<LedgerRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut records = write_txn.open_table(TRANSACTIONS)?;

            let mut record = read_record(&records, record_id)?;
            check_transition(&record, TxStatus::Completed)?;

            let mut account = read_account(&accounts, &record.user_id)?;
            settle_funds(&mut account, record.amount_minor);
            write_account(&mut accounts, &account)?;

            record.status = TxStatus::Completed;
            record.tx_hash = Some(tx_hash.to_string());
            record.completed_at = Some(Utc::now());
            write_record(&mut records, &record)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Fail a payout: record → failed with error detail, the reservation is
    /// released back to available balance in the same transaction.
    pub fn fail_payout(&self, record_id: &str, error: &str) -> LedgerResult<LedgerRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut records = write_txn.open_table(TRANSACTIONS)?;

            let mut record = read_record(&records, record_id)?;
            check_transition(&record, TxStatus::Failed)?;

            let mut account = read_account(&accounts, &record.user_id)?;
            release_funds(&mut account, record.amount_minor);
            write_account(&mut accounts, &account)?;

            record.status = TxStatus::Failed;
            record.error = Some(error.to_string());
            record.failed_at = Some(Utc::now());
            write_record(&mut records, &record)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Cancel a payout that has not started processing; releases the
    /// reservation.
    pub fn cancel_payout(&self, record_id: &str) -> LedgerResult<LedgerRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut records = write_txn.open_table(TRANSACTIONS)?;

            let mut record = read_record(&records, record_id)?;
            check_transition(&record, TxStatus::Cancelled)?;

            let mut account = read_account(&accounts, &record.user_id)?;
            release_funds(&mut account, record.amount_minor);
            write_account(&mut accounts, &account)?;

            record.status = TxStatus::Cancelled;
            record.failed_at = Some(Utc::now());
            write_record(&mut records, &record)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    // =========================================================================
    // Donation transfer
    // =========================================================================

    /// Atomic peer-to-peer transfer with paired completed records.
    ///
    /// Either the balance move and both records commit, or none do.
    pub fn donate(
        &self,
        from_user: &str,
        to_user: &str,
        amount: u64,
        message: Option<&str>,
    ) -> LedgerResult<(LedgerRecord, LedgerRecord)> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if from_user == to_user {
            return Err(LedgerError::SelfTransfer);
        }

        let write_txn = self.db.begin_write()?;
        let pair = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;

            let mut sender = read_account(&accounts, from_user)?;
            let mut recipient = read_account(&accounts, to_user)?;

            let available = sender.available_minor();
            if amount > available {
                return Err(LedgerError::InsufficientFunds {
                    available,
                    requested: amount,
                });
            }

            sender.balance_minor -= amount;
            sender.updated_at = Utc::now();
            recipient.balance_minor += amount;
            recipient.updated_at = Utc::now();

            let mut sent = LedgerRecord::new_completed(from_user, TxKind::DonationSent, amount)
                .with_metadata("to_user_id", serde_json::json!(to_user));
            let mut received =
                LedgerRecord::new_completed(to_user, TxKind::DonationReceived, amount)
                    .with_metadata("from_user_id", serde_json::json!(from_user));
            if let Some(text) = message {
                sent = sent.with_metadata("message", serde_json::json!(text));
                received = received.with_metadata("message", serde_json::json!(text));
            }

            write_account(&mut accounts, &sender)?;
            write_account(&mut accounts, &recipient)?;
            insert_record(&mut records, &mut index, &sent)?;
            insert_record(&mut records, &mut index, &received)?;
            (sent, received)
        };
        write_txn.commit()?;
        Ok(pair)
    }

    // =========================================================================
    // Ledger queries
    // =========================================================================

    /// Look up a single record by id.
    pub fn get_record(&self, record_id: &str) -> LedgerResult<LedgerRecord> {
        let read_txn = self.db.begin_read()?;
        let records = read_txn.open_table(TRANSACTIONS)?;
        read_record(&records, record_id)
    }

    /// List a user's records, newest first.
    pub fn list_transactions(&self, user_id: &str, limit: usize) -> LedgerResult<Vec<LedgerRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_TX_INDEX)?;
        let records = read_txn.open_table(TRANSACTIONS)?;

        let prefix = make_prefix(user_id);
        let prefix_end = make_prefix_end(user_id);

        let mut results = Vec::new();
        for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let record_id = entry.1.value().to_string();
            if let Some(value) = records.get(record_id.as_str())? {
                results.push(serde_json::from_slice(value.value())?);
            }
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }

    /// Find the user's pending/processing payout, if any.
    pub fn find_inflight_payout(&self, user_id: &str) -> LedgerResult<Option<LedgerRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_TX_INDEX)?;
        let records = read_txn.open_table(TRANSACTIONS)?;
        scan_inflight_payout(&index, &records, user_id)
    }

    /// Whether any record for the user is pending/processing.
    pub fn has_inflight_transactions(&self, user_id: &str) -> LedgerResult<bool> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_TX_INDEX)?;
        let records = read_txn.open_table(TRANSACTIONS)?;
        scan_any_inflight(&index, &records, user_id)
    }

    // =========================================================================
    // Wallet binding
    // =========================================================================

    /// Store the user's pending challenge, superseding any prior one.
    pub fn put_challenge(&self, user_id: &str, challenge: &WalletChallenge) -> LedgerResult<()> {
        let json = serde_json::to_vec(challenge)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLET_CHALLENGES)?;
            table.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read the user's pending challenge, if any.
    pub fn get_challenge(&self, user_id: &str) -> LedgerResult<Option<WalletChallenge>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLET_CHALLENGES)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Drop the user's pending challenge.
    pub fn clear_challenge(&self, user_id: &str) -> LedgerResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLET_CHALLENGES)?;
            table.remove(user_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// User id currently owning an address, if any.
    pub fn wallet_owner(&self, address: &str) -> LedgerResult<Option<String>> {
        let addr = address.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLET_OWNERS)?;
        Ok(table.get(addr.as_str())?.map(|v| v.value().to_string()))
    }

    /// Bind a verified wallet to the account, in one transaction: enforces
    /// address uniqueness, sets the wallet fields, consumes the pending
    /// challenge, and appends a `wallet_connected` record.
    pub fn connect_wallet(&self, user_id: &str, address: &str) -> LedgerResult<Account> {
        let addr_key = address.to_lowercase();
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let account = {
            let mut owners = write_txn.open_table(WALLET_OWNERS)?;
            match owners.get(addr_key.as_str())? {
                Some(owner) if owner.value() != user_id => {
                    return Err(LedgerError::WalletTaken);
                }
                _ => {}
            }
            owners.insert(addr_key.as_str(), user_id)?;

            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account = read_account(&accounts, user_id)?;
            account.wallet_address = Some(address.to_string());
            account.wallet_verified = true;
            account.wallet_connected_at = Some(now);
            account.updated_at = now;
            write_account(&mut accounts, &account)?;

            let mut challenges = write_txn.open_table(WALLET_CHALLENGES)?;
            challenges.remove(user_id)?;

            let record = LedgerRecord::new_completed(user_id, TxKind::WalletConnected, 0)
                .with_addresses(Some(address.to_string()), Some(user_id.to_string()))
                .with_metadata("wallet_address", serde_json::json!(address))
                .with_metadata("verification_method", serde_json::json!("signature"));
            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;
            insert_record(&mut records, &mut index, &record)?;

            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    /// Unbind the account's wallet, in one transaction. Rejects while any
    /// record is pending/processing (an in-flight payout would lose its
    /// destination). Returns the previous address.
    pub fn disconnect_wallet(&self, user_id: &str) -> LedgerResult<String> {
        let write_txn = self.db.begin_write()?;
        let previous = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account = read_account(&accounts, user_id)?;
            let previous = account.wallet_address.clone().ok_or(LedgerError::NoWallet)?;

            let mut records = write_txn.open_table(TRANSACTIONS)?;
            let mut index = write_txn.open_table(USER_TX_INDEX)?;
            if scan_any_inflight(&index, &records, user_id)? {
                return Err(LedgerError::TransactionsInFlight);
            }

            account.wallet_address = None;
            account.wallet_verified = false;
            account.wallet_connected_at = None;
            account.updated_at = Utc::now();
            write_account(&mut accounts, &account)?;

            let mut owners = write_txn.open_table(WALLET_OWNERS)?;
            owners.remove(previous.to_lowercase().as_str())?;

            let mut challenges = write_txn.open_table(WALLET_CHALLENGES)?;
            challenges.remove(user_id)?;

            let record = LedgerRecord::new_completed(user_id, TxKind::WalletDisconnected, 0)
                .with_addresses(Some(previous.clone()), Some(user_id.to_string()))
                .with_metadata("previous_wallet_address", serde_json::json!(previous));
            insert_record(&mut records, &mut index, &record)?;

            previous
        };
        write_txn.commit()?;
        Ok(previous)
    }
}

// =============================================================================
// Intra-transaction helpers
// =============================================================================

fn read_account(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    user_id: &str,
) -> LedgerResult<Account> {
    let bytes = {
        let value = table
            .get(user_id)?
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.to_string()))?;
        value.value().to_vec()
    };
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_account(
    table: &mut Table<&'static str, &'static [u8]>,
    account: &Account,
) -> LedgerResult<()> {
    let json = serde_json::to_vec(account)?;
    table.insert(account.user_id.as_str(), json.as_slice())?;
    Ok(())
}

fn read_record(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    record_id: &str,
) -> LedgerResult<LedgerRecord> {
    let bytes = {
        let value = table
            .get(record_id)?
            .ok_or_else(|| LedgerError::RecordNotFound(record_id.to_string()))?;
        value.value().to_vec()
    };
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_record(
    table: &mut Table<&'static str, &'static [u8]>,
    record: &LedgerRecord,
) -> LedgerResult<()> {
    let json = serde_json::to_vec(record)?;
    table.insert(record.id.as_str(), json.as_slice())?;
    Ok(())
}

/// Insert a record plus its index entry.
fn insert_record(
    records: &mut Table<&'static str, &'static [u8]>,
    index: &mut Table<&'static [u8], &'static str>,
    record: &LedgerRecord,
) -> LedgerResult<()> {
    write_record(records, record)?;
    let key = make_index_key(&record.user_id, record.initiated_at.timestamp(), &record.id);
    index.insert(key.as_slice(), record.id.as_str())?;
    Ok(())
}

/// Reject writes that would move a terminal record or skip a state.
fn check_transition(record: &LedgerRecord, next: TxStatus) -> LedgerResult<()> {
    if record.status.is_terminal() {
        return Err(LedgerError::Terminal {
            id: record.id.clone(),
            status: record.status,
        });
    }
    if !record.status.can_transition_to(next) {
        return Err(LedgerError::InvalidTransition {
            from: record.status,
            to: next,
        });
    }
    Ok(())
}

/// Scan a user's records for an in-flight payout.
fn scan_inflight_payout(
    index: &impl ReadableTable<&'static [u8], &'static str>,
    records: &impl ReadableTable<&'static str, &'static [u8]>,
    user_id: &str,
) -> LedgerResult<Option<LedgerRecord>> {
    let prefix = make_prefix(user_id);
    let prefix_end = make_prefix_end(user_id);
    for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
        let entry = entry?;
        let record_id = entry.1.value().to_string();
        if let Some(value) = records.get(record_id.as_str())? {
            let record: LedgerRecord = serde_json::from_slice(value.value())?;
            if record.kind == TxKind::Payout && record.is_in_flight() {
                return Ok(Some(record));
            }
        }
    }
    Ok(None)
}

/// Whether any record for the user is pending/processing.
fn scan_any_inflight(
    index: &impl ReadableTable<&'static [u8], &'static str>,
    records: &impl ReadableTable<&'static str, &'static [u8]>,
    user_id: &str,
) -> LedgerResult<bool> {
    let prefix = make_prefix(user_id);
    let prefix_end = make_prefix_end(user_id);
    for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
        let entry = entry?;
        let record_id = entry.1.value().to_string();
        if let Some(value) = records.get(record_id.as_str())? {
            let record: LedgerRecord = serde_json::from_slice(value.value())?;
            if record.is_in_flight() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

// =============================================================================
// Tests
// =============================================================================
