// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ledger::LedgerError;
use crate::payout::PayoutError;
use crate::wallet::VerifyError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match &e {
            LedgerError::AccountNotFound(_) | LedgerError::RecordNotFound(_) => {
                ApiError::not_found(e.to_string())
            }
            LedgerError::InsufficientFunds { .. }
            | LedgerError::NothingToPayOut
            | LedgerError::PayoutInFlight
            | LedgerError::SelfTransfer
            | LedgerError::ZeroAmount
            | LedgerError::WalletTaken
            | LedgerError::NoWallet
            | LedgerError::TransactionsInFlight
            | LedgerError::AccountExists(_)
            | LedgerError::InvalidUserId(_) => ApiError::bad_request(e.to_string()),
            LedgerError::Terminal { .. } | LedgerError::InvalidTransition { .. } => {
                ApiError::bad_request(e.to_string())
            }
            _ => {
                tracing::error!(error = %e, "ledger storage error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<PayoutError> for ApiError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::NoWallet => ApiError::bad_request(e.to_string()),
            PayoutError::QueueFull | PayoutError::ShuttingDown => {
                ApiError::service_unavailable(e.to_string())
            }
            PayoutError::Ledger(inner) => inner.into(),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let busy = ApiError::service_unavailable("busy");
        assert_eq!(busy.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn ledger_errors_map_to_statuses() {
        let e: ApiError = LedgerError::AccountNotFound("u1".into()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = LedgerError::InsufficientFunds {
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);

        let e: ApiError = LedgerError::PayoutInFlight.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn payout_backpressure_maps_to_503() {
        let e: ApiError = PayoutError::QueueFull.into();
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
