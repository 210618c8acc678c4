// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use civicpay_server::api::router;
use civicpay_server::blockchain::{
    AvaxSettlement, SettlementNetwork, UnconfiguredSettlement, AVAX_FUJI, CIVIC_TOKEN,
};
use civicpay_server::config::ServiceConfig;
use civicpay_server::ledger::{LedgerStore, TxKind};
use civicpay_server::payout::{spawn_worker, PayoutExecutor};
use civicpay_server::state::AppState;

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env();
    init_tracing(&config.log_format);

    let ledger = Arc::new(
        LedgerStore::open(&config.ledger_path()).expect("Failed to open ledger database"),
    );

    // Settlement: real chain client when a treasury key is configured,
    // otherwise a stand-in that fails payouts cleanly.
    let (network, treasury_address): (Arc<dyn SettlementNetwork>, Option<String>) =
        match &config.treasury_signer_key {
            Some(key) => {
                let signer: PrivateKeySigner = key
                    .trim()
                    .trim_start_matches("0x")
                    .parse()
                    .expect("Invalid TREASURY_SIGNER_KEY");
                let address = format!("{:?}", signer.address());
                let settlement = AvaxSettlement::new(AVAX_FUJI, CIVIC_TOKEN, signer)
                    .expect("Failed to build settlement client");
                tracing::info!(treasury = %address, chain = AVAX_FUJI.name, "settlement configured");
                (Arc::new(settlement), Some(address))
            }
            None => {
                tracing::warn!(
                    "TREASURY_SIGNER_KEY not set; payouts will fail until configured"
                );
                (Arc::new(UnconfiguredSettlement), None)
            }
        };

    let (payouts, receiver) = PayoutExecutor::new(
        ledger.clone(),
        treasury_address,
        config.payout_queue_depth,
    );

    let cancel = CancellationToken::new();
    let worker = spawn_worker(receiver, ledger.clone(), network, cancel.clone());

    seed_dev_account(&ledger);

    let state = AppState::new(ledger, Arc::new(payouts), Arc::new(config.clone()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .expect("Failed to bind listener");
    tracing::info!(
        addr = %config.bind_addr(),
        "CivicPay server listening (docs at /docs)"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");

    // Let the in-hand payout resolve before exiting.
    cancel.cancel();
    worker.await.ok();
}

/// Seed a development account from `SEED_USER_ID` / `SEED_USERNAME` /
/// `SEED_EMAIL` / `SEED_BALANCE` (minor units). No-op when unset or the
/// account already exists.
fn seed_dev_account(ledger: &LedgerStore) {
    let Ok(user_id) = std::env::var("SEED_USER_ID") else {
        return;
    };
    let username = std::env::var("SEED_USERNAME").unwrap_or_else(|_| user_id.clone());
    let email = std::env::var("SEED_EMAIL").unwrap_or_else(|_| format!("{user_id}@example.com"));

    match ledger.create_account(&user_id, &username, &email) {
        Ok(_) => {
            if let Some(balance) = std::env::var("SEED_BALANCE")
                .ok()
                .and_then(|b| b.parse::<u64>().ok())
                .filter(|b| *b > 0)
            {
                ledger
                    .credit(&user_id, balance, TxKind::BonusAdded, None)
                    .expect("Failed to seed balance");
            }
            tracing::info!(user_id = %user_id, "seeded development account");
        }
        Err(e) => {
            tracing::debug!(user_id = %user_id, error = %e, "seed account skipped");
        }
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
