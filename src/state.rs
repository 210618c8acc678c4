// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::config::ServiceConfig;
use crate::ledger::{Account, LedgerError, LedgerStore};
use crate::payout::PayoutExecutor;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub payouts: Arc<PayoutExecutor>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(
        ledger: Arc<LedgerStore>,
        payouts: Arc<PayoutExecutor>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            ledger,
            payouts,
            config,
        }
    }

    /// Fetch the caller's account, provisioning it on first contact.
    pub fn account_for(&self, user: &AuthenticatedUser) -> Result<Account, LedgerError> {
        match self.ledger.get_account(&user.user_id) {
            Err(LedgerError::AccountNotFound(_)) => {
                tracing::info!(user_id = %user.user_id, "provisioning account");
                self.ledger
                    .create_account(&user.user_id, &user.username, &user.email)
            }
            other => other,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over a temp-dir ledger with no settlement worker. The
    /// returned receiver keeps the payout queue open; tests may drain or
    /// drop it to simulate shutdown.
    pub fn for_tests() -> (
        Self,
        tempfile::TempDir,
        tokio::sync::mpsc::Receiver<crate::payout::PayoutJob>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(ServiceConfig::for_tests());
        let ledger = Arc::new(LedgerStore::open(&dir.path().join("ledger.redb")).unwrap());
        let (payouts, receiver) =
            PayoutExecutor::new(ledger.clone(), None, config.payout_queue_depth);
        (Self::new(ledger, Arc::new(payouts), config), dir, receiver)
    }
}
