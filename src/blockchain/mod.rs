// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Blockchain integration for Avalanche C-Chain.
//!
//! Payouts settle as ERC-20 transfers of the reward token, signed by
//! the treasury key and confirmed before the ledger records them.

pub mod erc20;
pub mod settlement;
pub mod types;

pub use settlement::{AvaxSettlement, SettlementNetwork, TransferReceipt, UnconfiguredSettlement};
pub use types::{ChainError, NetworkConfig, AVAX_FUJI, CIVIC_TOKEN};
