// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    ledger::{TxKind, TxStatus},
    models::{
        BalanceResponse, DisconnectRequest, DisconnectResponse, DonateRequest, DonateResponse,
        GenerateMessageRequest, GenerateMessageResponse, PayoutResponse, TransactionView,
        TransactionsResponse, VerifySignatureRequest, VerifySignatureResponse,
        WalletStatusResponse,
    },
    state::AppState,
};

pub mod health;
pub mod payments;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/payment/balance", get(payments::get_balance))
        .route("/payment/payout", get(payments::request_payout))
        .route("/payment/donate", post(payments::donate))
        .route("/payment/transactions", get(payments::list_transactions))
        .route("/wallet/generate-message", post(wallet::generate_message))
        .route("/wallet/verify-signature", post(wallet::verify_signature))
        .route("/wallet/status", get(wallet::wallet_status))
        .route("/wallet/disconnect", post(wallet::disconnect));

    Router::new()
        .nest("/v1", v1_routes)
        .route("/healthz", get(health::healthz))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        payments::get_balance,
        payments::request_payout,
        payments::donate,
        payments::list_transactions,
        wallet::generate_message,
        wallet::verify_signature,
        wallet::wallet_status,
        wallet::disconnect,
        health::healthz
    ),
    components(
        schemas(
            TxKind,
            TxStatus,
            BalanceResponse,
            PayoutResponse,
            DonateRequest,
            DonateResponse,
            TransactionView,
            TransactionsResponse,
            GenerateMessageRequest,
            GenerateMessageResponse,
            VerifySignatureRequest,
            VerifySignatureResponse,
            WalletStatusResponse,
            DisconnectRequest,
            DisconnectResponse,
            health::HealthResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Payments", description = "Balances, payouts, donations, and history"),
        (name = "Wallet", description = "Wallet binding and verification"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ApiClaims;
    use crate::ledger::TxKind;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    fn token(state: &AppState, user_id: &str, username: &str) -> String {
        let claims = ApiClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            iat: 1_700_000_000,
            exp: 9_999_999_999,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        )
        .unwrap()
    }

    fn authed_request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"));
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir, _rx) = AppState::for_tests();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn healthz_is_public() {
        let (state, _dir, _rx) = AppState::for_tests();
        let app = router(state);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn balance_requires_auth() {
        let (state, _dir, _rx) = AppState::for_tests();
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/payment/balance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn balance_provisions_account_on_first_contact() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "user_1", "ada");
        let app = router(state);

        let response = app
            .oneshot(authed_request("GET", "/v1/payment/balance", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["balance"], 0);
        assert_eq!(body["availableBalance"], 0);
        assert_eq!(body["walletConnected"], false);
    }

    #[tokio::test]
    async fn wallet_verification_round_trip() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "user_1", "ada");
        let app = router(state.clone());

        let signer = PrivateKeySigner::random();
        let address = format!("{:?}", signer.address());

        // Issue the challenge
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/generate-message",
                &token,
                Some(serde_json::json!({ "walletAddress": address })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let message = body["verificationMessage"].as_str().unwrap().to_string();
        assert!(message.contains("User: ada"));

        // Sign and verify
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", alloy::hex::encode(signature.as_bytes()));
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/verify-signature",
                &token,
                Some(serde_json::json!({
                    "walletAddress": address,
                    "signature": sig_hex,
                    "message": message,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["walletVerified"], true);

        // Status reflects the binding, challenge consumed
        let response = app
            .oneshot(authed_request("GET", "/v1/wallet/status", &token, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["hasWallet"], true);
        assert_eq!(body["isVerified"], true);
        assert_eq!(body["hasPendingVerification"], false);
    }

    #[tokio::test]
    async fn verify_with_wrong_signer_leaves_account_unchanged() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "user_1", "ada");
        let app = router(state.clone());

        let claimed = PrivateKeySigner::random();
        let attacker = PrivateKeySigner::random();
        let address = format!("{:?}", claimed.address());

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/generate-message",
                &token,
                Some(serde_json::json!({ "walletAddress": address })),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        let message = body["verificationMessage"].as_str().unwrap().to_string();

        let signature = attacker.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", alloy::hex::encode(signature.as_bytes()));
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/verify-signature",
                &token,
                Some(serde_json::json!({
                    "walletAddress": address,
                    "signature": sig_hex,
                    "message": message,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(authed_request("GET", "/v1/wallet/status", &token, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["hasWallet"], false);
        // A failed signature does not consume the challenge
        assert_eq!(body["hasPendingVerification"], true);
    }

    #[tokio::test]
    async fn verify_with_expired_challenge_is_rejected() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "user_1", "ada");
        let app = router(state.clone());

        let signer = PrivateKeySigner::random();
        let address = format!("{:?}", signer.address());

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/generate-message",
                &token,
                Some(serde_json::json!({ "walletAddress": address })),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        let message = body["verificationMessage"].as_str().unwrap().to_string();

        // Age the stored challenge past its expiry.
        let mut challenge = state.ledger.get_challenge("user_1").unwrap().unwrap();
        challenge.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
        state.ledger.put_challenge("user_1", &challenge).unwrap();

        // Even a correct signature is rejected once the window closed.
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", alloy::hex::encode(signature.as_bytes()));
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/verify-signature",
                &token,
                Some(serde_json::json!({
                    "walletAddress": address,
                    "signature": sig_hex,
                    "message": message,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The expired challenge is consumed and the wallet stays unbound.
        assert!(state.ledger.get_challenge("user_1").unwrap().is_none());
        let response = app
            .oneshot(authed_request("GET", "/v1/wallet/status", &token, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["hasWallet"], false);
        assert_eq!(body["hasPendingVerification"], false);
    }

    #[tokio::test]
    async fn verify_requires_exact_address_match() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "user_1", "ada");
        let app = router(state.clone());

        let signer = PrivateKeySigner::random();
        let address = format!("{:?}", signer.address());

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/generate-message",
                &token,
                Some(serde_json::json!({ "walletAddress": address })),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        let message = body["verificationMessage"].as_str().unwrap().to_string();

        // Same wallet, but the address string differs in case from the
        // challenged one.
        let recased = address.to_uppercase().replacen("0X", "0x", 1);
        assert_ne!(recased, address);
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", alloy::hex::encode(signature.as_bytes()));
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/verify-signature",
                &token,
                Some(serde_json::json!({
                    "walletAddress": recased,
                    "signature": sig_hex,
                    "message": message,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(authed_request("GET", "/v1/wallet/status", &token, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["hasWallet"], false);
    }

    #[tokio::test]
    async fn donation_flow_moves_funds() {
        let (state, _dir, _rx) = AppState::for_tests();
        let sender_token = token(&state, "alice", "alice");
        let recipient_token = token(&state, "bob", "bob");
        let app = router(state.clone());

        // Provision both accounts, fund the sender
        for t in [&sender_token, &recipient_token] {
            app.clone()
                .oneshot(authed_request("GET", "/v1/payment/balance", t, None))
                .await
                .unwrap();
        }
        state
            .ledger
            .credit("alice", 10_000_000, TxKind::RewardReceived, None)
            .unwrap();

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/payment/donate",
                &sender_token,
                Some(serde_json::json!({
                    "toUserId": "bob",
                    "amount": 4_000_000u64,
                    "message": "great report",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["amount"], 4_000_000);
        assert_eq!(body["from"], "alice");
        assert_eq!(body["to"], "bob");

        // Both sides see it in their history
        let response = app
            .clone()
            .oneshot(authed_request(
                "GET",
                "/v1/payment/transactions",
                &recipient_token,
                None,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["transactions"][0]["type"], "donation_received");
        assert_eq!(body["transactions"][0]["amount"], 4_000_000);
    }

    #[tokio::test]
    async fn donation_to_unknown_recipient_is_404() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "alice", "alice");
        let app = router(state);

        let response = app
            .oneshot(authed_request(
                "POST",
                "/v1/payment/donate",
                &token,
                Some(serde_json::json!({ "toUserId": "nobody", "amount": 1u64 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn payout_without_wallet_is_400() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "alice", "alice");
        let app = router(state.clone());

        app.clone()
            .oneshot(authed_request("GET", "/v1/payment/balance", &token, None))
            .await
            .unwrap();
        state
            .ledger
            .credit("alice", 1_000_000, TxKind::RewardReceived, None)
            .unwrap();

        let response = app
            .oneshot(authed_request("GET", "/v1/payment/payout", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn payout_with_wallet_is_accepted() {
        let (state, _dir, mut rx) = AppState::for_tests();
        let token = token(&state, "alice", "alice");
        let app = router(state.clone());

        app.clone()
            .oneshot(authed_request("GET", "/v1/payment/balance", &token, None))
            .await
            .unwrap();
        state
            .ledger
            .connect_wallet("alice", "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")
            .unwrap();
        state
            .ledger
            .credit("alice", 7_000_000, TxKind::RewardReceived, None)
            .unwrap();

        let response = app
            .oneshot(authed_request("GET", "/v1/payment/payout", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["amount"], 7_000_000);
        assert_eq!(body["status"], "pending");

        // The job landed on the queue
        let job = rx.recv().await.unwrap();
        assert_eq!(job.record_id, body["transactionId"].as_str().unwrap());
    }

    #[tokio::test]
    async fn disconnect_requires_confirmation() {
        let (state, _dir, _rx) = AppState::for_tests();
        let token = token(&state, "alice", "alice");
        let app = router(state.clone());

        app.clone()
            .oneshot(authed_request("GET", "/v1/payment/balance", &token, None))
            .await
            .unwrap();
        state
            .ledger
            .connect_wallet("alice", "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")
            .unwrap();

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/disconnect",
                &token,
                Some(serde_json::json!({ "confirmDisconnect": false })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(authed_request(
                "POST",
                "/v1/wallet/disconnect",
                &token,
                Some(serde_json::json!({ "confirmDisconnect": true })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["previousWalletAddress"],
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"
        );
    }
}
