// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Wallet signature verification (EIP-191 personal-sign).
//!
//! The wallet signs the challenge message with its secp256k1 key; we
//! recover the signing address from the signature and compare it against
//! the claimed address. Nothing supplied by the client is trusted: a
//! signature is valid iff it was produced by the private key for exactly
//! this message.

use alloy::primitives::{Address, Signature};
use std::str::FromStr;

/// Signature verification failures.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature does not match the wallet address")]
    SignerMismatch,
}

/// Validate an EVM wallet address: `0x` followed by 40 hex characters.
pub fn validate_wallet_address(address: &str) -> Result<(), VerifyError> {
    if !address.starts_with("0x") {
        return Err(VerifyError::InvalidAddress(
            "address must start with 0x".to_string(),
        ));
    }
    if address.len() != 42 {
        return Err(VerifyError::InvalidAddress(
            "address must be 42 characters (0x + 40 hex)".to_string(),
        ));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VerifyError::InvalidAddress(
            "address must contain only hex characters".to_string(),
        ));
    }
    Ok(())
}

/// Verify an EIP-191 personal-sign signature over `message`.
///
/// Returns `Ok(())` iff the address recovered from `signature` equals
/// `claimed_address` (case-insensitive, addresses are checksummed hex).
pub fn verify_personal_sign(
    claimed_address: &str,
    message: &str,
    signature: &str,
) -> Result<(), VerifyError> {
    validate_wallet_address(claimed_address)?;

    let expected = Address::from_str(claimed_address)
        .map_err(|e| VerifyError::InvalidAddress(e.to_string()))?;

    let sig_hex = signature.strip_prefix("0x").unwrap_or(signature);
    let sig_bytes = alloy::hex::decode(sig_hex)
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;
    let signature = Signature::from_raw(&sig_bytes)
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;

    // EIP-191: the recovery hashes "\x19Ethereum Signed Message:\n{len}{msg}".
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;

    if recovered != expected {
        return Err(VerifyError::SignerMismatch);
    }
    Ok(())
}
