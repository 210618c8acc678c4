// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};

/// Claims carried in a CivicPay API token (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaims {
    /// Subject: the canonical user id
    pub sub: String,

    /// Display name, embedded in wallet challenges
    #[serde(default)]
    pub username: String,

    /// Contact email
    #[serde(default)]
    pub email: String,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// The verified caller, as seen by handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

impl From<ApiClaims> for AuthenticatedUser {
    fn from(claims: ApiClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
        }
    }
}
