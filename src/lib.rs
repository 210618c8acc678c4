// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! CivicPay - Reward Ledger and Wallet Service
//!
//! Off-chain reward balances with an append-only transaction ledger,
//! signature-verified wallet binding, peer-to-peer donations, and
//! asynchronous payouts settled on Avalanche C-Chain.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token authentication (HS256 JWT)
//! - `ledger` - Accounts, ledger records, and the embedded redb store
//! - `wallet` - Wallet binding challenges and EIP-191 verification
//! - `payout` - Bounded-queue payout execution
//! - `blockchain` - Avalanche C-Chain settlement

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payout;
pub mod state;
pub mod wallet;
