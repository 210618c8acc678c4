// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! # Authentication Module
//!
//! Bearer-token authentication for the CivicPay API.
//!
//! ## Auth Flow
//!
//! 1. The identity service authenticates the user and issues an HS256
//!    JWT over the shared `JWT_SECRET`
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. This server verifies the signature and expiry, and extracts
//!    `sub` → canonical `user_id` plus the `username`/`email` claims
//!
//! All payment and wallet endpoints require authentication; only the
//! health probe is public. Clock skew tolerance is 60 seconds.

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{ApiClaims, AuthenticatedUser};
pub use error::AuthError;
pub use extractor::Auth;
