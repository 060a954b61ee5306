//! End-to-end REST flows through the `Paradex` facade against a mockito server
//!
//! Covers L1 key derivation, onboarding, auth, signed order submission and
//! the token refresh paths as a caller would hit them, plus the HTTP layer's
//! retries, hooks and timeouts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mockito::{Matcher, Server};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use paradex_sdk::api::{AuthProvider, HttpClient, RequestHook, RetryPolicy};
use paradex_sdk::ParadexApiClient;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use paradex_sdk::types::{Order, OrderSide};
use paradex_sdk::{ClientConfig, Paradex, ParadexError, ParadexSubkey};

const L1_ADDRESS: &str = "0xd2c7314539dCe7752c8120af4eC2AA750Cf2035e";
const L1_PRIVATE_KEY: &str = "0xf8e4d1d772cdd44e5e77615ad11cc071c94e4c06dc21150d903f28e6aa6abdff";
const L2_PRIVATE_KEY: &str = "0x543b6cf6c91817a87174aaea4fb370ac1c694e864d7740d728f8344d53e815";
const L2_ADDRESS: &str = "0x129c135ed63df9353885e292be4426b8ed6122b13c6c0e1bb787288a1f5adfa";

const SYSTEM_CONFIG_JSON: &str = r#"{
    "starknet_fullnode_rpc_url": "https://pathfinder.api.testnet.paradex.trade/rpc/v0.5",
    "starknet_chain_id": "PRIVATE_SN_POTC_SEPOLIA",
    "paraclear_address": "0x286003f7c7bfc3f94e8f0af48b48302e7aee2fb13c23b141479ba00832ef2c6",
    "paraclear_decimals": 8,
    "paraclear_account_proxy_hash": "0x3530cc4759d78042f1b543bf797f5f3d647cde0388c33734cf91b7f7b9314a9",
    "paraclear_account_hash": "0x41cb0280ebadaa75f996d8d92c6f265f6d040bb3ba442e5f86a554f1765244e",
    "bridged_tokens": [
        {
            "name": "TEST USDC",
            "symbol": "USDC",
            "decimals": 6,
            "l1_token_address": "0x29A873159D5e14AcBd63913D4A7E2df04570c666",
            "l2_token_address": "0x6f373b346561036d98ea10fb3e60d2f459c872b1933b50b21fe6ef4fda3b75e"
        }
    ],
    "l1_chain_id": "11155111",
    "some_future_field": {"ignored": true}
}"#;

fn jwt_expiring_at(exp_secs: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp_secs));
    format!("{}.{}.sig", header, claims)
}

fn fresh_jwt() -> String {
    jwt_expiring_at(paradex_sdk::utils::current_time_secs() + 3600)
}

fn config_for(server: &Server) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api_url = Some(server.url());
    config
}

async fn mock_system_config(server: &mut Server) -> mockito::Mock {
    server
        .mock("GET", "/system/config")
        .with_status(200)
        .with_body(SYSTEM_CONFIG_JSON)
        .create_async()
        .await
}

#[tokio::test]
async fn test_l1_key_flow_onboards_authenticates_and_trades() {
    let mut server = Server::new_async().await;
    let _config = mock_system_config(&mut server).await;
    let onboarding = server
        .mock("POST", "/onboarding")
        .match_header("PARADEX-ETHEREUM-ACCOUNT", L1_ADDRESS)
        .match_header("PARADEX-STARKNET-ACCOUNT", L2_ADDRESS)
        .match_header("PARADEX-STARKNET-SIGNATURE", Matcher::Regex(r#"^\["\d+","\d+"\]$"#.into()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let jwt = fresh_jwt();
    let auth = server
        .mock("POST", "/auth")
        .match_header("PARADEX-STARKNET-ACCOUNT", L2_ADDRESS)
        .match_header("PARADEX-SIGNATURE-EXPIRATION", Matcher::Regex(r"^\d+$".into()))
        .with_status(200)
        .with_body(json!({"jwt_token": jwt}).to_string())
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/orders")
        .match_header("Authorization", format!("Bearer {}", jwt).as_str())
        .match_body(Matcher::PartialJson(json!({
            "market": "ETH-USD-PERP",
            "side": "BUY",
            "type": "LIMIT",
            "size": "0.5",
            "price": "2500.1"
        })))
        .with_status(201)
        .with_body(r#"{"id":"order-1","status":"NEW"}"#)
        .create_async()
        .await;

    let mut paradex = Paradex::with_config(config_for(&server)).await.unwrap();
    let account = paradex
        .init_account(L1_ADDRESS, Some(L1_PRIVATE_KEY), None)
        .await
        .unwrap();
    assert_eq!(account.address_hex(), L2_ADDRESS);

    let mut order = Order::limit(
        "ETH-USD-PERP",
        OrderSide::Buy,
        Decimal::new(5, 1),
        Decimal::new(25001, 1),
    );
    let result = paradex.api_client().submit_order(&mut order).await.unwrap();

    assert_eq!(result["id"], "order-1");
    let signature: Vec<String> = serde_json::from_str(&order.signature).unwrap();
    assert_eq!(signature.len(), 2);

    onboarding.assert_async().await;
    auth.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_expired_session_is_refreshed_before_private_call() {
    let mut server = Server::new_async().await;
    let _config = mock_system_config(&mut server).await;
    let _onboarding = server
        .mock("POST", "/onboarding")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    // first login hands out an already expired token, the refresh a fresh one
    let stale_auth = server
        .mock("POST", "/auth")
        .with_status(200)
        .with_body(json!({"jwt_token": jwt_expiring_at(1)}).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut paradex = Paradex::with_config(config_for(&server)).await.unwrap();
    paradex
        .init_account(L1_ADDRESS, None, Some(L2_PRIVATE_KEY))
        .await
        .unwrap();

    stale_auth.remove_async().await;
    let fresh = fresh_jwt();
    let refresh = server
        .mock("POST", "/auth")
        .with_status(200)
        .with_body(json!({"jwt_token": fresh}).to_string())
        .expect(1)
        .create_async()
        .await;
    let positions = server
        .mock("GET", "/positions")
        .match_header("Authorization", format!("Bearer {}", fresh).as_str())
        .with_status(200)
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let result = paradex.api_client().fetch_positions().await.unwrap();
    assert_eq!(result["results"], json!([]));
    refresh.assert_async().await;
    positions.assert_async().await;

    // the WebSocket side asks the same client for its token
    let provider: Arc<dyn AuthProvider> = paradex.api_client().clone();
    assert_eq!(provider.bearer_token().await.unwrap(), Some(fresh));
}

#[tokio::test]
async fn test_subkey_cannot_transfer_or_onboard() {
    let mut server = Server::new_async().await;
    let _config = mock_system_config(&mut server).await;
    let _auth = server
        .mock("POST", "/auth")
        .with_status(200)
        .with_body(json!({"jwt_token": fresh_jwt()}).to_string())
        .create_async()
        .await;

    let subkey = ParadexSubkey::with_config(config_for(&server), L2_PRIVATE_KEY, L2_ADDRESS)
        .await
        .unwrap();
    let account = subkey.init_account().unwrap();

    let err = account
        .transfer_on_l2(L2_ADDRESS, Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, ParadexError::Unsupported(_)), "Got: {}", err);

    let err = subkey.api_client().onboarding().await.unwrap_err();
    assert!(matches!(err, ParadexError::Unsupported(_)), "Got: {}", err);
}

#[tokio::test]
async fn test_api_error_body_is_surfaced() {
    let mut server = Server::new_async().await;
    let _config = mock_system_config(&mut server).await;
    let _markets = server
        .mock("GET", "/markets")
        .match_query(Matcher::UrlEncoded("market".into(), "NOPE".into()))
        .with_status(400)
        .with_body(r#"{"error":"INVALID_REQUEST_PARAMETER","message":"market not found"}"#)
        .create_async()
        .await;

    let paradex = Paradex::with_config(config_for(&server)).await.unwrap();
    let err = paradex
        .api_client()
        .fetch_markets(Some("NOPE"))
        .await
        .unwrap_err();

    match err {
        ParadexError::Api { status, code, message } => {
            assert_eq!(status, 400);
            assert_eq!(code, "INVALID_REQUEST_PARAMETER");
            assert_eq!(message, "market not found");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_public_endpoints_need_no_account() {
    let mut server = Server::new_async().await;
    let _config = mock_system_config(&mut server).await;
    let bbo = server
        .mock("GET", "/bbo/BTC-USD-PERP")
        .match_header("Authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"market":"BTC-USD-PERP","bid":"65000","ask":"65001"}"#)
        .create_async()
        .await;

    let paradex = Paradex::with_config(config_for(&server)).await.unwrap();
    let value: Value = paradex.api_client().fetch_bbo("BTC-USD-PERP").await.unwrap();
    assert_eq!(value["ask"], "65001");
    bbo.assert_async().await;

    let err = paradex.api_client().fetch_balances().await.unwrap_err();
    assert!(matches!(err, ParadexError::AccountNotInitialized), "Got: {}", err);
}

// ============================================================================
// HTTP layer
// ============================================================================

fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 10,
        max_delay_ms: 50,
    }
}

fn api_with_retries(server: &Server, max_retries: u32) -> ParadexApiClient {
    let http = HttpClient::new().with_retry_policy(fast_retries(max_retries));
    ParadexApiClient::with_http_client(&config_for(server), http)
}

#[derive(Default)]
struct RecordingHook {
    requests: Mutex<Vec<(Method, String, HeaderMap)>>,
    responses: Mutex<Vec<Option<StatusCode>>>,
}

impl RequestHook for RecordingHook {
    fn on_request(&self, method: &Method, url: &str, headers: &HeaderMap) {
        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), url.to_string(), headers.clone()));
    }

    fn on_response(&self, _method: &Method, _url: &str, status: Option<StatusCode>, _elapsed: Duration) {
        self.responses.lock().unwrap().push(status);
    }
}

/// Address that accepts connections and never answers
async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/system/time")
        .with_status(503)
        .with_body("unavailable")
        .expect(2)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/system/time")
        .with_status(200)
        .with_body(r#"{"server_time":1700000000000}"#)
        .expect(1)
        .create_async()
        .await;

    let api = api_with_retries(&server, 3);
    let value = api.fetch_system_time().await.unwrap();
    assert_eq!(value["server_time"], 1700000000000u64);

    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/system/state")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/system/state")
        .with_status(200)
        .with_body(r#"{"status":"ok"}"#)
        .create_async()
        .await;

    let api = api_with_retries(&server, 1);
    let value = api.fetch_system_state().await.unwrap();
    assert_eq!(value["status"], "ok");

    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let bad = server
        .mock("GET", "/markets")
        .match_query(Matcher::UrlEncoded("market".into(), "NOPE".into()))
        .with_status(400)
        .with_body(r#"{"error":"INVALID_REQUEST_PARAMETER","message":"bad market"}"#)
        .expect(1)
        .create_async()
        .await;

    let api = api_with_retries(&server, 3);
    let err = api.fetch_markets(Some("NOPE")).await.unwrap_err();
    assert!(matches!(err, ParadexError::Api { status: 400, .. }), "Got: {}", err);
    bad.assert_async().await;
}

#[tokio::test]
async fn test_exhausted_retries_return_last_error() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/system/time")
        .with_status(502)
        .with_body("bad gateway")
        .expect(3)
        .create_async()
        .await;

    let api = api_with_retries(&server, 2);
    let err = api.fetch_system_time().await.unwrap_err();
    match err {
        ParadexError::Api { status, message, .. } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("unexpected error: {}", other),
    }
    failing.assert_async().await;
}

#[tokio::test]
async fn test_hooks_see_redacted_headers_and_status() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/account")
        .match_header("Authorization", "Bearer secret-token")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let hook = Arc::new(RecordingHook::default());
    let http = HttpClient::new().with_hook(hook.clone());
    http.request(
        Method::GET,
        &format!("{}/account", server.url()),
        &[],
        None,
        &[("Authorization", "Bearer secret-token".to_string())],
    )
    .await
    .unwrap();
    m.assert_async().await;

    let requests = hook.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (method, url, headers) = &requests[0];
    assert_eq!(*method, Method::GET);
    assert!(url.ends_with("/account"));
    assert_eq!(headers["authorization"], "[REDACTED]");
    assert_eq!(*hook.responses.lock().unwrap(), vec![Some(StatusCode::OK)]);
}

#[tokio::test]
async fn test_transport_errors_are_retried_and_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/system/time", listener.local_addr().unwrap());
    drop(listener);

    let hook = Arc::new(RecordingHook::default());
    let http = HttpClient::new()
        .with_retry_policy(fast_retries(2))
        .with_hook(hook.clone());

    let err = http.request(Method::GET, &url, &[], None, &[]).await.unwrap_err();
    assert!(matches!(err, ParadexError::ConnectionFailed(_)), "Got: {}", err);
    assert_eq!(hook.requests.lock().unwrap().len(), 3);
    assert_eq!(*hook.responses.lock().unwrap(), vec![None, None, None]);
}

#[tokio::test]
async fn test_per_request_timeout_overrides_default() {
    let url = format!("{}/system/time", silent_server().await);

    let http = HttpClient::new().with_timeout(Duration::from_secs(30));
    let err = http
        .request_with_timeout(Method::GET, &url, &[], None, &[], Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, ParadexError::NetworkTimeout(100)), "Got: {}", err);

    let http = HttpClient::new().with_timeout(Duration::from_millis(150));
    let err = http.request(Method::GET, &url, &[], None, &[]).await.unwrap_err();
    assert!(matches!(err, ParadexError::NetworkTimeout(150)), "Got: {}", err);
}
