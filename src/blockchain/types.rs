// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Blockchain types and constants.

/// Avalanche network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Avalanche C-Chain Mainnet configuration.
#[allow(dead_code)]
pub const AVAX_MAINNET: NetworkConfig = NetworkConfig {
    name: "Avalanche C-Chain",
    chain_id: 43114,
    rpc_url: "https://api.avax.network/ext/bc/C/rpc",
    explorer_url: "https://snowtrace.io",
};

/// Avalanche Fuji Testnet configuration.
pub const AVAX_FUJI: NetworkConfig = NetworkConfig {
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    rpc_url: "https://api.avax-test.network/ext/bc/C/rpc",
    explorer_url: "https://testnet.snowtrace.io",
};

/// ERC-20 token metadata.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
    /// Fuji testnet contract address
    pub fuji_address: Option<&'static str>,
}

/// CivicPay reward token (`CIVIC`) deployed on Fuji.
///
/// 6 decimals, so the ledger's minor units map 1:1 to the token's
/// smallest unit.
pub const CIVIC_TOKEN: Erc20Token = Erc20Token {
    symbol: "CIVIC",
    name: "CivicPay Reward Token",
    decimals: 6,
    fuji_address: Some("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"),
};

/// Errors from the settlement network.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {0} reverted on-chain")]
    Reverted(String),

    #[error("Transaction {0} not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("No treasury signer configured")]
    NotConfigured,
}

/// Format token units to a human-readable amount (for logs).
pub fn format_amount(amount: u64, decimals: u8) -> String {
    if amount == 0 {
        return "0".to_string();
    }

    let divisor = 10u64.pow(decimals as u32);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder == 0 {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0, 6), "0");
        assert_eq!(format_amount(1_000_000, 6), "1");
        assert_eq!(format_amount(1_500_000, 6), "1.5");
        assert_eq!(format_amount(123, 6), "0.000123");
    }

    #[test]
    fn civic_token_matches_minor_units() {
        assert_eq!(CIVIC_TOKEN.decimals, 6);
        assert!(CIVIC_TOKEN.fuji_address.is_some());
    }
}
