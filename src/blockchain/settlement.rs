// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Settlement network seam for payouts.
//!
//! The payout executor talks to the chain through [`SettlementNetwork`],
//! so tests can substitute a mock and a deployment without a treasury
//! signer degrades to [`UnconfiguredSettlement`] instead of panicking.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};
use async_trait::async_trait;

use super::erc20::IERC20;
use super::types::{format_amount, ChainError, Erc20Token, NetworkConfig};

/// Confirmed on-chain transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where the transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
}

/// Submits a token transfer and waits for its confirmation.
#[async_trait]
pub trait SettlementNetwork: Send + Sync {
    /// Transfer `amount_minor` token units from the treasury to `to`.
    ///
    /// Resolves only once the transaction is confirmed on-chain (or
    /// definitively failed). A returned error means no funds moved, or
    /// the move was reverted.
    async fn transfer(&self, to: &str, amount_minor: u64) -> Result<TransferReceipt, ChainError>;
}

type SigningProvider = alloy::providers::fillers::FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::fillers::JoinFill<
            alloy::providers::Identity,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::GasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::BlobGasFiller,
                    alloy::providers::fillers::JoinFill<
                        alloy::providers::fillers::NonceFiller,
                        alloy::providers::fillers::ChainIdFiller,
                    >,
                >,
            >,
        >,
        alloy::providers::fillers::WalletFiller<EthereumWallet>,
    >,
    alloy::providers::RootProvider<alloy::network::Ethereum>,
>;

/// Receipt polling cadence.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up waiting for a receipt after this many polls.
const CONFIRMATION_MAX_POLLS: u32 = 90;

/// Real settlement over Avalanche C-Chain: ERC-20 transfers signed by
/// the treasury key.
pub struct AvaxSettlement {
    network: NetworkConfig,
    token: Erc20Token,
    provider: SigningProvider,
}

impl AvaxSettlement {
    /// Build a settlement client from the treasury signer.
    pub fn new(
        network: NetworkConfig,
        token: Erc20Token,
        signer: PrivateKeySigner,
    ) -> Result<Self, ChainError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self {
            network,
            token,
            provider,
        })
    }

    /// Current gas prices: base fee from the latest block, standard
    /// Avalanche priority fee, max fee leaves headroom for a base fee
    /// increase.
    async fn get_gas_prices(&self) -> Result<(u128, u128), ChainError> {
        let block = self
            .provider
            .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get block: {}", e)))?
            .ok_or_else(|| ChainError::RpcError("No latest block".to_string()))?;

        let base_fee: u128 = block
            .header
            .base_fee_per_gas
            .map(|f| f as u128)
            .unwrap_or(25_000_000_000u128); // 25 gwei default

        let priority_fee: u128 = 1_500_000_000; // 1.5 gwei
        let max_fee = base_fee.saturating_mul(2).saturating_add(priority_fee);

        Ok((max_fee, priority_fee))
    }

    /// Poll for the receipt until the transaction confirms or the poll
    /// budget runs out.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TransferReceipt, ChainError> {
        let hash = tx_hash
            .parse()
            .map_err(|e| ChainError::RpcError(format!("Invalid tx hash: {}", e)))?;

        for _ in 0..CONFIRMATION_MAX_POLLS {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {}", e)))?;

            if let Some(receipt) = receipt {
                if !receipt.status() {
                    return Err(ChainError::Reverted(tx_hash.to_string()));
                }
                return Ok(TransferReceipt {
                    tx_hash: tx_hash.to_string(),
                    block_number: receipt.block_number.unwrap_or(0),
                    gas_used: receipt.gas_used as u64,
                });
            }

            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }

        Err(ChainError::ConfirmationTimeout(tx_hash.to_string()))
    }
}

#[async_trait]
impl SettlementNetwork for AvaxSettlement {
    async fn transfer(&self, to: &str, amount_minor: u64) -> Result<TransferReceipt, ChainError> {
        let to_addr = Address::from_str(to)
            .map_err(|e| ChainError::InvalidAddress(format!("Invalid to address: {}", e)))?;
        let token_address = self
            .token
            .fuji_address
            .ok_or_else(|| ChainError::InvalidAddress("Token has no contract address".into()))?;
        let token_addr = Address::from_str(token_address)
            .map_err(|e| ChainError::InvalidAddress(format!("Invalid token address: {}", e)))?;

        // Encode the transfer(to, amount) call
        let call = IERC20::transferCall {
            to: to_addr,
            amount: U256::from(amount_minor),
        };
        let data = call.abi_encode();

        let (max_fee_per_gas, priority_fee) = self.get_gas_prices().await?;

        let tx = TransactionRequest::default()
            .to(token_addr)
            .input(data.into())
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(priority_fee);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {}", e)))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::info!(
            tx_hash = %tx_hash,
            to = %to,
            amount = %format_amount(amount_minor, self.token.decimals),
            token = self.token.symbol,
            chain = self.network.name,
            "submitted settlement transfer"
        );

        self.wait_for_confirmation(&tx_hash).await
    }
}

/// Settlement stand-in for deployments without a treasury key. Every
/// transfer fails cleanly, so payouts fail and release their reservation
/// instead of stranding funds.
pub struct UnconfiguredSettlement;

#[async_trait]
impl SettlementNetwork for UnconfiguredSettlement {
    async fn transfer(&self, _to: &str, _amount_minor: u64) -> Result<TransferReceipt, ChainError> {
        Err(ChainError::NotConfigured)
    }
}
