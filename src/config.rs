// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_NAME` | Display name embedded in wallet challenges | `CivicPay` |
//! | `DATA_DIR` | Directory holding the ledger database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 secret for API tokens | dev-only default |
//! | `TREASURY_SIGNER_KEY` | Hex private key funding payouts | Unset: payouts fail cleanly |
//! | `PAYOUT_QUEUE_DEPTH` | Bound of the payout queue | `64` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

/// Environment variable for the application display name.
pub const APP_NAME_ENV: &str = "APP_NAME";

/// Environment variable for the ledger data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable for the HS256 token secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable for the treasury signer private key (hex).
///
/// When unset the service runs without settlement capability: payout
/// requests are accepted, fail during processing, and release their
/// reservation.
pub const TREASURY_SIGNER_KEY_ENV: &str = "TREASURY_SIGNER_KEY";

/// Environment variable for the payout queue bound.
pub const PAYOUT_QUEUE_DEPTH_ENV: &str = "PAYOUT_QUEUE_DEPTH";

/// Environment variable for the log format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Development fallback for `JWT_SECRET`.
pub const DEV_JWT_SECRET: &str = "civicpay-dev-secret";

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub app_name: String,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub treasury_signer_key: Option<String>,
    pub payout_queue_depth: usize,
    pub log_format: String,
}

impl ServiceConfig {
    /// Load configuration from the environment, falling back to
    /// development defaults.
    pub fn from_env() -> Self {
        let app_name = std::env::var(APP_NAME_ENV).unwrap_or_else(|_| "CivicPay".to_string());
        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/data"));
        let host = std::env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let jwt_secret =
            std::env::var(JWT_SECRET_ENV).unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
        let treasury_signer_key = std::env::var(TREASURY_SIGNER_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let payout_queue_depth = std::env::var(PAYOUT_QUEUE_DEPTH_ENV)
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(crate::payout::DEFAULT_QUEUE_DEPTH);
        let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

        Self {
            app_name,
            data_dir,
            host,
            port,
            jwt_secret,
            treasury_signer_key,
            payout_queue_depth,
            log_format,
        }
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path of the ledger database file.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.redb")
    }
}

#[cfg(test)]
impl ServiceConfig {
    /// Config for tests: dev secret, tiny queue, temp-friendly paths.
    pub fn for_tests() -> Self {
        Self {
            app_name: "CivicPay".to_string(),
            data_dir: PathBuf::from("/tmp"),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            treasury_signer_key: None,
            payout_queue_depth: 8,
            log_format: "pretty".to_string(),
        }
    }
}
