//! Paradex REST client
//!
//! Public endpoints are plain GETs. Private endpoints go through
//! [`ParadexApiClient::private_request`], which keeps the session token fresh:
//! it re-authenticates when the token is within the refresh buffer of expiry
//! and retries once after a 401.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};

use super::auth::{AuthProvider, SessionToken};
use super::http_client::{HttpClient, QueryParams, RetryPolicy};
use crate::account::ParadexAccount;
use crate::config::ClientConfig;
use crate::error::{ParadexError, ParadexResult};
use crate::types::{AuthResponse, Order, SystemConfig};

pub struct ParadexApiClient {
    http: HttpClient,
    api_url: String,
    auto_auth: bool,
    system_config: RwLock<Option<SystemConfig>>,
    account: RwLock<Option<Arc<ParadexAccount>>>,
    token: RwLock<Option<SessionToken>>,
    refresh_lock: Mutex<()>,
}

fn opt_param<'a>(params: &mut Vec<(&'a str, String)>, name: &'a str, value: Option<&str>) {
    if let Some(v) = value {
        params.push((name, v.to_string()));
    }
}

fn is_unauthorized(err: &ParadexError) -> bool {
    matches!(err, ParadexError::Api { status: 401, .. })
}

impl ParadexApiClient {
    /// Client on the default transport, retrying `config.http_max_retries` times.
    pub fn new(config: &ClientConfig) -> Self {
        let http = HttpClient::new().with_retry_policy(RetryPolicy::new(config.http_max_retries));
        Self::with_http_client(config, http)
    }

    /// Client sending every request through `http`.
    pub fn with_http_client(config: &ClientConfig, http: HttpClient) -> Self {
        Self {
            http,
            api_url: config.api_url(),
            auto_auth: config.auto_auth,
            system_config: RwLock::new(None),
            account: RwLock::new(None),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// GET /system/config and cache the result.
    pub async fn fetch_system_config(&self) -> ParadexResult<SystemConfig> {
        let value = self.public_get("system/config", &[]).await?;
        let config: SystemConfig = serde_json::from_value(value)
            .map_err(|e| ParadexError::InvalidResponse(format!("Invalid system config JSON: {}", e)))?;

        tracing::info!(chain_id = %config.starknet_chain_id, "Fetched system config");
        *self.system_config.write().await = Some(config.clone());
        Ok(config)
    }

    pub async fn system_config(&self) -> Option<SystemConfig> {
        self.system_config.read().await.clone()
    }

    pub async fn account(&self) -> Option<Arc<ParadexAccount>> {
        self.account.read().await.clone()
    }

    /// Attach the account, onboard it (main accounts only) and authenticate.
    #[tracing::instrument(skip(self, account), fields(address = %account.address_hex()))]
    pub async fn init_account(&self, account: Arc<ParadexAccount>) -> ParadexResult<()> {
        let is_subkey = account.is_subkey();
        *self.account.write().await = Some(account);

        if !is_subkey {
            self.onboarding().await?;
        }
        self.auth().await?;
        Ok(())
    }

    async fn require_account(&self) -> ParadexResult<Arc<ParadexAccount>> {
        self.account().await.ok_or(ParadexError::AccountNotInitialized)
    }

    /// POST /onboarding; rejected for subkeys.
    pub async fn onboarding(&self) -> ParadexResult<()> {
        let account = self.require_account().await?;
        let headers = account.onboarding_headers()?;
        let body = json!({ "public_key": account.public_key_hex() });

        self.http
            .request(Method::POST, &self.url("onboarding"), &[], Some(&body), &headers)
            .await?;

        tracing::info!(address = %account.address_hex(), "Account onboarded");
        Ok(())
    }

    /// POST /auth; stores and returns the new JWT.
    pub async fn auth(&self) -> ParadexResult<String> {
        let account = self.require_account().await?;
        let headers = account.auth_headers()?;

        let value = self
            .http
            .request(Method::POST, &self.url("auth"), &[], None, &headers)
            .await
            .map_err(|e| match e {
                ParadexError::Api { status, code, message } if status == 401 || status == 403 => {
                    ParadexError::AuthenticationFailed(format!("{} {}: {}", status, code, message))
                }
                other => other,
            })?;

        let auth: AuthResponse = serde_json::from_value(value)
            .map_err(|e| ParadexError::InvalidResponse(format!("No jwt_token in auth response: {}", e)))?;

        let token = SessionToken::new(auth.jwt_token.clone());
        match token.expires_at() {
            Some(at) => tracing::info!("JWT obtained successfully, expires at: {}", at),
            None => tracing::info!("JWT obtained successfully"),
        }
        *self.token.write().await = Some(token);
        Ok(auth.jwt_token)
    }

    /// Use an externally obtained JWT.
    pub async fn set_token(&self, jwt: impl Into<String>) {
        *self.token.write().await = Some(SessionToken::new(jwt));
    }

    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.as_ref().map(|t| t.jwt().to_string())
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Valid bearer token, refreshing it when needed.
    pub async fn ensure_token(&self) -> ParadexResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if !self.auto_auth || !token.needs_refresh() {
                return Ok(token.jwt().to_string());
            }
        }

        if !self.auto_auth {
            return Err(ParadexError::AuthenticationFailed(
                "No token set and automatic authentication is disabled".into(),
            ));
        }

        let _guard = self.refresh_lock.lock().await;
        // another task may have refreshed while we waited
        if let Some(token) = self.token.read().await.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.jwt().to_string());
            }
        }

        tracing::debug!("Refreshing JWT");
        self.auth().await
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    pub async fn public_get(&self, path: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.http
            .request(Method::GET, &self.url(path), params, None, &[])
            .await
    }

    /// Authenticated request with one re-auth retry on 401.
    pub async fn private_request(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams<'_>,
        body: Option<&Value>,
    ) -> ParadexResult<Value> {
        let url = self.url(path);
        let token = self.ensure_token().await?;
        let headers = [("Authorization", format!("Bearer {}", token))];

        let can_reauth = self.auto_auth && self.account().await.is_some();

        match self
            .http
            .request(method.clone(), &url, params, body, &headers)
            .await
        {
            Err(e) if can_reauth && is_unauthorized(&e) => {
                tracing::warn!(path = %path, "401 from API, re-authenticating");
                self.invalidate_token().await;
                let token = self.ensure_token().await?;
                let headers = [("Authorization", format!("Bearer {}", token))];
                self.http.request(method, &url, params, body, &headers).await
            }
            other => other,
        }
    }

    pub async fn private_get(&self, path: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_request(Method::GET, path, params, None).await
    }

    pub async fn private_post(&self, path: &str, body: &Value) -> ParadexResult<Value> {
        self.private_request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn private_put(&self, path: &str, body: &Value) -> ParadexResult<Value> {
        self.private_request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn private_delete(&self, path: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_request(Method::DELETE, path, params, None).await
    }

    // ------------------------------------------------------------------------
    // Public endpoints
    // ------------------------------------------------------------------------

    pub async fn fetch_system_state(&self) -> ParadexResult<Value> {
        self.public_get("system/state", &[]).await
    }

    pub async fn fetch_system_time(&self) -> ParadexResult<Value> {
        self.public_get("system/time", &[]).await
    }

    pub async fn fetch_markets(&self, market: Option<&str>) -> ParadexResult<Value> {
        let mut params = Vec::new();
        opt_param(&mut params, "market", market);
        self.public_get("markets", &params).await
    }

    /// `market` accepts `ALL`
    pub async fn fetch_markets_summary(&self, market: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        let mut query = vec![("market", market.to_string())];
        query.extend_from_slice(params);
        self.public_get("markets/summary", &query).await
    }

    pub async fn fetch_orderbook(&self, market: &str, depth: Option<u32>) -> ParadexResult<Value> {
        let params: Vec<(&str, String)> = depth.map(|d| ("depth", d.to_string())).into_iter().collect();
        self.public_get(&format!("orderbook/{}", market), &params).await
    }

    pub async fn fetch_bbo(&self, market: &str) -> ParadexResult<Value> {
        self.public_get(&format!("bbo/{}", market), &[]).await
    }

    pub async fn fetch_trades(&self, market: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        let mut query = vec![("market", market.to_string())];
        query.extend_from_slice(params);
        self.public_get("trades", &query).await
    }

    pub async fn fetch_funding_data(&self, market: &str, params: &QueryParams<'_>) -> ParadexResult<Value> {
        let mut query = vec![("market", market.to_string())];
        query.extend_from_slice(params);
        self.public_get("funding/data", &query).await
    }

    // ------------------------------------------------------------------------
    // Account endpoints
    // ------------------------------------------------------------------------

    pub async fn fetch_account_summary(&self) -> ParadexResult<Value> {
        self.private_get("account", &[]).await
    }

    pub async fn fetch_account_info(&self) -> ParadexResult<Value> {
        self.private_get("account/info", &[]).await
    }

    pub async fn fetch_balances(&self) -> ParadexResult<Value> {
        self.private_get("balance", &[]).await
    }

    pub async fn fetch_positions(&self) -> ParadexResult<Value> {
        self.private_get("positions", &[]).await
    }

    pub async fn fetch_fills(&self, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_get("fills", params).await
    }

    pub async fn fetch_funding_payments(&self, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_get("funding/payments", params).await
    }

    pub async fn fetch_transactions(&self, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_get("transactions", params).await
    }

    pub async fn fetch_transfers(&self, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_get("transfers", params).await
    }

    // ------------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------------

    pub async fn fetch_orders(&self, market: Option<&str>) -> ParadexResult<Value> {
        let mut params = Vec::new();
        opt_param(&mut params, "market", market);
        self.private_get("orders", &params).await
    }

    pub async fn fetch_orders_history(&self, params: &QueryParams<'_>) -> ParadexResult<Value> {
        self.private_get("orders-history", params).await
    }

    pub async fn fetch_order(&self, order_id: &str) -> ParadexResult<Value> {
        self.private_get(&format!("orders/{}", order_id), &[]).await
    }

    pub async fn fetch_order_by_client_id(&self, client_id: &str) -> ParadexResult<Value> {
        self.private_get(&format!("orders/by_client_id/{}", client_id), &[])
            .await
    }

    /// Sign when unsigned, then return the request body.
    async fn signed_order_body(&self, order: &mut Order) -> ParadexResult<Value> {
        if order.signature.is_empty() {
            let account = self.require_account().await?;
            account.sign_order(order)?;
        }
        Ok(order.dump_to_value())
    }

    #[tracing::instrument(skip(self, order), fields(order = %order))]
    pub async fn submit_order(&self, order: &mut Order) -> ParadexResult<Value> {
        let body = self.signed_order_body(order).await?;
        let result = self.private_post("orders", &body).await?;
        tracing::info!(id = %result.get("id").and_then(serde_json::Value::as_str).unwrap_or("-"), "Order submitted");
        Ok(result)
    }

    pub async fn submit_orders_batch(&self, orders: &mut [Order]) -> ParadexResult<Value> {
        let mut bodies = Vec::with_capacity(orders.len());
        for order in orders.iter_mut() {
            bodies.push(self.signed_order_body(order).await?);
        }
        self.private_post("orders/batch", &Value::Array(bodies)).await
    }

    pub async fn modify_order(&self, order_id: &str, order: &mut Order) -> ParadexResult<Value> {
        let mut body = self.signed_order_body(order).await?;
        body["id"] = Value::String(order_id.to_string());
        self.private_put(&format!("orders/{}", order_id), &body).await
    }

    pub async fn cancel_order(&self, order_id: &str) -> ParadexResult<Value> {
        self.private_delete(&format!("orders/{}", order_id), &[]).await
    }

    pub async fn cancel_order_by_client_id(&self, client_id: &str) -> ParadexResult<Value> {
        self.private_delete(&format!("orders/by_client_id/{}", client_id), &[])
            .await
    }

    /// Cancel every open order, optionally restricted to one market.
    pub async fn cancel_all_orders(&self, market: Option<&str>) -> ParadexResult<Value> {
        let mut params = Vec::new();
        opt_param(&mut params, "market", market);
        self.private_delete("orders", &params).await
    }
}

#[async_trait]
impl AuthProvider for ParadexApiClient {
    async fn bearer_token(&self) -> ParadexResult<Option<String>> {
        if self.account().await.is_none() {
            return Ok(self.current_token().await);
        }
        self.ensure_token().await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::test_keys::*;
    use crate::api::auth::make_jwt;
    use crate::types::fixtures::{mock_system_config, MOCK_SYSTEM_CONFIG_JSON};
    use crate::types::OrderSide;
    use crate::utils::current_time_secs;
    use mockito::Matcher;
    use rust_decimal::Decimal;

    fn client_for(server: &mockito::Server) -> ParadexApiClient {
        let mut config = ClientConfig::default();
        config.api_url = Some(server.url());
        ParadexApiClient::new(&config)
    }

    fn account() -> Arc<ParadexAccount> {
        Arc::new(
            ParadexAccount::from_l2_private_key(&mock_system_config(), TEST_L1_ADDRESS, TEST_L2_PRIVATE_KEY)
                .unwrap(),
        )
    }

    fn fresh_jwt() -> String {
        make_jwt(current_time_secs() + 3600)
    }

    #[tokio::test]
    async fn test_fetch_system_config() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/system/config")
            .with_status(200)
            .with_body(MOCK_SYSTEM_CONFIG_JSON)
            .create_async()
            .await;

        let client = client_for(&server);
        let config = client.fetch_system_config().await.unwrap();
        assert_eq!(config.starknet_chain_id, "PRIVATE_SN_POTC_SEPOLIA");
        assert!(client.system_config().await.is_some());
    }

    #[tokio::test]
    async fn test_init_account_onboards_then_authenticates() {
        let mut server = mockito::Server::new_async().await;
        let onboarding = server
            .mock("POST", "/onboarding")
            .match_header("PARADEX-ETHEREUM-ACCOUNT", TEST_L1_ADDRESS)
            .match_header("PARADEX-STARKNET-ACCOUNT", TEST_L2_ADDRESS)
            .match_body(Matcher::Json(json!({"public_key": TEST_L2_PUBLIC_KEY})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let jwt = fresh_jwt();
        let auth = server
            .mock("POST", "/auth")
            .match_header("PARADEX-STARKNET-ACCOUNT", TEST_L2_ADDRESS)
            .match_header("PARADEX-TIMESTAMP", Matcher::Regex(r"^\d+$".into()))
            .with_status(200)
            .with_body(json!({"jwt_token": jwt}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        client.init_account(account()).await.unwrap();

        onboarding.assert_async().await;
        auth.assert_async().await;
        assert_eq!(client.current_token().await, Some(jwt));
    }

    #[tokio::test]
    async fn test_subkey_init_skips_onboarding() {
        let mut server = mockito::Server::new_async().await;
        let onboarding = server
            .mock("POST", "/onboarding")
            .expect(0)
            .create_async()
            .await;
        let _auth = server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(json!({"jwt_token": fresh_jwt()}).to_string())
            .create_async()
            .await;

        let subkey = Arc::new(
            ParadexAccount::subkey(&mock_system_config(), TEST_L2_PRIVATE_KEY, TEST_L2_ADDRESS).unwrap(),
        );
        let client = client_for(&server);
        client.init_account(subkey).await.unwrap();
        onboarding.assert_async().await;
    }

    #[tokio::test]
    async fn test_private_request_uses_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let jwt = fresh_jwt();
        let m = server
            .mock("GET", "/account")
            .match_header("Authorization", format!("Bearer {}", jwt).as_str())
            .with_status(200)
            .with_body(r#"{"account":"0x1"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client.set_token(jwt).await;
        let summary = client.fetch_account_summary().await.unwrap();
        assert_eq!(summary["account"], "0x1");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let new_jwt = fresh_jwt();
        let auth = server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(json!({"jwt_token": new_jwt}).to_string())
            .create_async()
            .await;
        let positions = server
            .mock("GET", "/positions")
            .match_header("Authorization", format!("Bearer {}", new_jwt).as_str())
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        *client.account.write().await = Some(account());
        client.set_token(make_jwt(1)).await;

        client.fetch_positions().await.unwrap();
        auth.assert_async().await;
        positions.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_retries_once_after_reauth() {
        let mut server = mockito::Server::new_async().await;
        let stale = fresh_jwt();
        let rejected = server
            .mock("GET", "/balance")
            .match_header("Authorization", format!("Bearer {}", stale).as_str())
            .with_status(401)
            .with_body(r#"{"error":"INVALID_TOKEN","message":"expired"}"#)
            .expect(1)
            .create_async()
            .await;
        let renewed = make_jwt(current_time_secs() + 7200);
        let auth = server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(json!({"jwt_token": renewed}).to_string())
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/balance")
            .match_header("Authorization", format!("Bearer {}", renewed).as_str())
            .with_status(200)
            .with_body(r#"{"results":[{"token":"USDC","size":"10"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        *client.account.write().await = Some(account());
        client.set_token(stale).await;

        let balances = client.fetch_balances().await.unwrap();
        assert_eq!(balances["results"][0]["token"], "USDC");
        rejected.assert_async().await;
        auth.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_manual_token_without_auto_auth() {
        let mut server = mockito::Server::new_async().await;
        let expired = make_jwt(1);
        let m = server
            .mock("GET", "/orders")
            .match_header("Authorization", format!("Bearer {}", expired).as_str())
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let mut config = ClientConfig::default();
        config.api_url = Some(server.url());
        config.auto_auth = false;
        let client = ParadexApiClient::new(&config);
        client.set_token(expired).await;

        client.fetch_orders(None).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_private_request_without_token_or_account_fails() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let err = client.fetch_positions().await.unwrap_err();
        assert!(matches!(err, ParadexError::AccountNotInitialized), "Got: {}", err);
    }

    #[tokio::test]
    async fn test_submit_order_signs_and_posts() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/orders")
            .match_body(Matcher::PartialJson(json!({
                "market": "ETH-USD-PERP",
                "side": "BUY",
                "type": "LIMIT",
                "size": "0.1",
                "price": "1500",
                "instruction": "GTC",
            })))
            .with_status(201)
            .with_body(r#"{"id":"order-1","status":"NEW"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        *client.account.write().await = Some(account());
        client.set_token(fresh_jwt()).await;

        let mut order = Order::limit(
            "ETH-USD-PERP",
            OrderSide::Buy,
            Decimal::new(1, 1),
            Decimal::from(1500),
        );
        let result = client.submit_order(&mut order).await.unwrap();
        assert_eq!(result["id"], "order-1");
        assert!(order.signature.starts_with("[\""));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_all_orders_with_market() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("DELETE", "/orders")
            .match_query(Matcher::UrlEncoded("market".into(), "BTC-USD-PERP".into()))
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        client.set_token(fresh_jwt()).await;
        let result = client.cancel_all_orders(Some("BTC-USD-PERP")).await.unwrap();
        assert_eq!(result, Value::Null);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_public_orderbook_depth() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/orderbook/ETH-USD-PERP")
            .match_query(Matcher::UrlEncoded("depth".into(), "5".into()))
            .with_status(200)
            .with_body(r#"{"market":"ETH-USD-PERP","bids":[],"asks":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let book = client.fetch_orderbook("ETH-USD-PERP", Some(5)).await.unwrap();
        assert_eq!(book["market"], "ETH-USD-PERP");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/markets")
            .with_status(429)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_markets(None).await.unwrap_err();
        assert!(matches!(err, ParadexError::RateLimited));
    }

    #[tokio::test]
    async fn test_auth_provider_without_account_returns_manual_token() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        assert_eq!(client.bearer_token().await.unwrap(), None);
        client.set_token("manual").await;
        assert_eq!(client.bearer_token().await.unwrap(), Some("manual".to_string()));
    }
}
