// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Asynchronous payout execution.
//!
//! `initiate` does the synchronous part of a payout (reserve + pending
//! record, one store transaction) and hands the record id to a single
//! worker over a bounded queue. The worker settles against the chain and
//! resolves the record. A full queue rolls the reservation back before
//! the caller sees the error, so no reservation is ever stranded by
//! backpressure.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::blockchain::SettlementNetwork;
use crate::ledger::{LedgerError, LedgerRecord, LedgerStore};

/// Default bound of the payout queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Work item handed to the settlement worker.
#[derive(Debug)]
pub struct PayoutJob {
    pub record_id: String,
}

/// Payout initiation failures.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("no verified wallet connected")]
    NoWallet,

    #[error("payout queue is full, try again later")]
    QueueFull,

    #[error("payout executor is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Front half of the payout pipeline: validates, reserves, enqueues.
pub struct PayoutExecutor {
    ledger: Arc<LedgerStore>,
    queue: mpsc::Sender<PayoutJob>,
    treasury_address: Option<String>,
}

impl PayoutExecutor {
    /// Create the executor and the receiving end of its queue. The caller
    /// passes the receiver to [`spawn_worker`].
    pub fn new(
        ledger: Arc<LedgerStore>,
        treasury_address: Option<String>,
        queue_depth: usize,
    ) -> (Self, mpsc::Receiver<PayoutJob>) {
        let (queue, receiver) = mpsc::channel(queue_depth);
        (
            Self {
                ledger,
                queue,
                treasury_address,
            },
            receiver,
        )
    }

    /// Start a payout of the user's full available balance.
    ///
    /// On success the returned record is `pending` and its amount is
    /// already reserved; the worker resolves it later. All rejection
    /// paths leave balances untouched.
    pub fn initiate(&self, user_id: &str) -> Result<LedgerRecord, PayoutError> {
        let account = self.ledger.get_account(user_id)?;
        if !account.wallet_verified || account.wallet_address.is_none() {
            return Err(PayoutError::NoWallet);
        }

        let record = self
            .ledger
            .reserve_for_payout(user_id, self.treasury_address.clone())?;

        let job = PayoutJob {
            record_id: record.id.clone(),
        };
        match self.queue.try_send(job) {
            Ok(()) => {
                tracing::info!(
                    record_id = %record.id,
                    user_id = %user_id,
                    amount_minor = record.amount_minor,
                    "payout queued"
                );
                Ok(record)
            }
            Err(e) => {
                // Roll the reservation back before reporting, so a
                // rejected initiate never holds funds.
                let reason = match &e {
                    mpsc::error::TrySendError::Full(_) => "payout queue full",
                    mpsc::error::TrySendError::Closed(_) => "payout executor unavailable",
                };
                if let Err(rollback) = self.ledger.fail_payout(&record.id, reason) {
                    tracing::error!(
                        record_id = %record.id,
                        error = %rollback,
                        "failed to roll back payout reservation"
                    );
                }
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(PayoutError::QueueFull),
                    mpsc::error::TrySendError::Closed(_) => Err(PayoutError::ShuttingDown),
                }
            }
        }
    }
}

/// Spawn the single settlement worker. Jobs are processed strictly in
/// order; cancellation stops the worker after the in-hand job resolves.
pub fn spawn_worker(
    mut receiver: mpsc::Receiver<PayoutJob>,
    ledger: Arc<LedgerStore>,
    network: Arc<dyn SettlementNetwork>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("payout worker shutting down");
                    break;
                }
                job = receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };
            process_job(&ledger, network.as_ref(), &job).await;
        }
    })
}

async fn process_job(ledger: &LedgerStore, network: &dyn SettlementNetwork, job: &PayoutJob) {
    let record = match ledger.mark_processing(&job.record_id) {
        Ok(record) => record,
        Err(e) => {
            // Already resolved (e.g. cancelled between enqueue and pickup).
            tracing::warn!(record_id = %job.record_id, error = %e, "skipping payout job");
            return;
        }
    };

    let to = match record.to_address.as_deref() {
        Some(to) => to,
        None => {
            fail(ledger, &record.id, "payout record has no destination address");
            return;
        }
    };

    match network.transfer(to, record.amount_minor).await {
        Ok(receipt) => match ledger.settle_payout(&record.id, &receipt.tx_hash) {
            Ok(_) => {
                tracing::info!(
                    record_id = %record.id,
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    "payout settled"
                );
            }
            Err(e) => {
                tracing::error!(record_id = %record.id, error = %e, "failed to settle payout");
            }
        },
        Err(e) => fail(ledger, &record.id, &e.to_string()),
    }
}

fn fail(ledger: &LedgerStore, record_id: &str, reason: &str) {
    match ledger.fail_payout(record_id, reason) {
        Ok(_) => {
            tracing::warn!(record_id = %record_id, reason = %reason, "payout failed");
        }
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "failed to mark payout failed");
        }
    }
}
