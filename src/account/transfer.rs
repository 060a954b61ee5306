//! On-chain USDC transfers between Paraclear accounts
//!
//! The transfer is an INVOKE v1 transaction calling `transfer` on the
//! Paraclear contract through the account's `__execute__` entry point,
//! signed with the L2 key and submitted to the Starknet full node.

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use starknet_core::crypto::compute_hash_on_elements;
use starknet_core::types::Felt;
use starknet_core::utils::{cairo_short_string_to_felt, get_selector_from_name};

use super::keys::parse_felt_hex;
use super::paradex_account::ParadexAccount;
use crate::api::http_client::build_http_client;
use crate::error::{ParadexError, ParadexResult};
use crate::types::JsonRpcError;

/// Bounds for the randomized max fee, in wei
const MAX_FEE_RANGE: (u64, u64) = (1_000_000_000_000_000_000, 10_000_000_000_000_000_000);

/// A single contract call inside a multicall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Felt,
    pub selector: Felt,
    pub calldata: Vec<Felt>,
}

/// `__execute__` calldata for a Cairo 0 account:
/// `[n, (to, selector, offset, len)*n, total_len, calldata...]`
pub fn encode_execute_calldata(calls: &[Call]) -> Vec<Felt> {
    let mut call_array = Vec::with_capacity(calls.len() * 4);
    let mut flat = Vec::new();

    for call in calls {
        call_array.push(call.to);
        call_array.push(call.selector);
        call_array.push(Felt::from(flat.len() as u64));
        call_array.push(Felt::from(call.calldata.len() as u64));
        flat.extend_from_slice(&call.calldata);
    }

    let mut out = Vec::with_capacity(2 + call_array.len() + flat.len());
    out.push(Felt::from(calls.len() as u64));
    out.extend(call_array);
    out.push(Felt::from(flat.len() as u64));
    out.extend(flat);
    out
}

/// Transaction hash of an INVOKE v1 transaction
pub fn invoke_v1_hash(
    sender: Felt,
    calldata: &[Felt],
    max_fee: Felt,
    chain_id: Felt,
    nonce: Felt,
) -> ParadexResult<Felt> {
    let prefix = cairo_short_string_to_felt("invoke")
        .map_err(|e| ParadexError::Signing(format!("Invalid invoke prefix: {}", e)))?;
    Ok(compute_hash_on_elements(&[
        prefix,
        Felt::ONE,
        sender,
        Felt::ZERO,
        compute_hash_on_elements(calldata),
        max_fee,
        chain_id,
        nonce,
    ]))
}

/// `amount * 10^decimals`, truncated
pub(crate) fn scale_amount(amount: Decimal, decimals: u32) -> ParadexResult<Felt> {
    if amount <= Decimal::ZERO {
        return Err(ParadexError::InvalidOrder(format!(
            "Transfer amount must be > 0 (got {})",
            amount
        )));
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    amount
        .checked_mul(factor)
        .and_then(|v| v.trunc().to_u128())
        .map(Felt::from)
        .ok_or_else(|| ParadexError::InvalidOrder(format!("Transfer amount out of range: {}", amount)))
}

fn random_max_fee() -> Felt {
    Felt::from(rand::thread_rng().gen_range(MAX_FEE_RANGE.0..=MAX_FEE_RANGE.1))
}

fn felt_hex(value: &Felt) -> String {
    format!("0x{:x}", value)
}

// ============================================================================
// Starknet JSON-RPC
// ============================================================================

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Minimal Starknet full-node client: nonce lookup and invoke submission
pub struct StarknetRpcClient {
    http: reqwest::Client,
    url: String,
}

impl StarknetRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: build_http_client(),
            url: url.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> ParadexResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParadexError::ConnectionFailed(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ParadexError::InvalidResponse(format!("Failed to read {} response: {}", method, e))
        })?;

        if !status.is_success() {
            return Err(ParadexError::Api {
                status: status.as_u16(),
                code: method.to_string(),
                message: text,
            });
        }

        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|e| {
            ParadexError::InvalidResponse(format!("Invalid {} JSON: {} - {}", method, e, text))
        })?;

        if let Some(err) = parsed.error {
            return Err(ParadexError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        parsed
            .result
            .ok_or_else(|| ParadexError::InvalidResponse(format!("No result in {} response", method)))
    }

    pub async fn get_nonce(&self, address: Felt) -> ParadexResult<Felt> {
        let result = self
            .call(
                "starknet_getNonce",
                json!({ "block_id": "pending", "contract_address": felt_hex(&address) }),
            )
            .await?;
        let nonce = result
            .as_str()
            .ok_or_else(|| ParadexError::InvalidResponse(format!("Unexpected nonce: {}", result)))?;
        parse_felt_hex(nonce, "nonce").map_err(|e| ParadexError::InvalidResponse(e.to_string()))
    }

    /// Submit a signed INVOKE v1 transaction and return its hash.
    pub async fn add_invoke_transaction(
        &self,
        sender: Felt,
        calldata: &[Felt],
        signature: [Felt; 2],
        max_fee: Felt,
        nonce: Felt,
    ) -> ParadexResult<Felt> {
        let tx = json!({
            "type": "INVOKE",
            "sender_address": felt_hex(&sender),
            "calldata": calldata.iter().map(felt_hex).collect::<Vec<_>>(),
            "max_fee": felt_hex(&max_fee),
            "version": "0x1",
            "signature": signature.iter().map(felt_hex).collect::<Vec<_>>(),
            "nonce": felt_hex(&nonce),
        });

        let result = self
            .call("starknet_addInvokeTransaction", json!({ "invoke_transaction": tx }))
            .await?;

        let hash = result
            .get("transaction_hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ParadexError::InvalidResponse(format!("No transaction_hash in {}", result)))?;
        parse_felt_hex(hash, "transaction hash").map_err(|e| ParadexError::InvalidResponse(e.to_string()))
    }
}

// ============================================================================
// Account integration
// ============================================================================

impl ParadexAccount {
    /// Paraclear `transfer(recipient, token, amount)` call for the settlement token
    pub fn transfer_call(&self, target_l2_address: &str, amount: Decimal) -> ParadexResult<Call> {
        let config = self.system_config();
        let paraclear = parse_felt_hex(&config.paraclear_address, "paraclear_address")
            .map_err(|e| ParadexError::Config(e.to_string()))?;
        let token = parse_felt_hex(&config.settlement_token()?.l2_token_address, "l2_token_address")
            .map_err(|e| ParadexError::Config(e.to_string()))?;
        let recipient = parse_felt_hex(target_l2_address, "target L2 address")?;
        let selector = get_selector_from_name("transfer")
            .map_err(|e| ParadexError::Signing(format!("Invalid selector: {}", e)))?;

        Ok(Call {
            to: paraclear,
            selector,
            calldata: vec![recipient, token, scale_amount(amount, config.paraclear_decimals)?],
        })
    }

    /// Transfer USDC on L2 to another Paraclear account; returns the tx hash.
    #[tracing::instrument(skip(self), fields(from = %self.address_hex()))]
    pub async fn transfer_on_l2(&self, target_l2_address: &str, amount: Decimal) -> ParadexResult<Felt> {
        let rpc = StarknetRpcClient::new(self.system_config().starknet_fullnode_rpc_url.clone());
        self.transfer_on_l2_via(&rpc, target_l2_address, amount).await
    }

    pub(crate) async fn transfer_on_l2_via(
        &self,
        rpc: &StarknetRpcClient,
        target_l2_address: &str,
        amount: Decimal,
    ) -> ParadexResult<Felt> {
        self.ensure_main("on-chain transfer")?;

        let call = self.transfer_call(target_l2_address, amount)?;
        let calldata = encode_execute_calldata(&[call]);
        let nonce = rpc.get_nonce(self.address()).await?;
        let max_fee = random_max_fee();

        let hash = invoke_v1_hash(self.address(), &calldata, max_fee, self.l2_chain_id(), nonce)?;
        let signature = self.sign_hash(hash)?;

        let tx_hash = rpc
            .add_invoke_transaction(self.address(), &calldata, [signature.r, signature.s], max_fee, nonce)
            .await?;

        tracing::info!(
            tx_hash = %felt_hex(&tx_hash),
            to = %target_l2_address,
            amount = %amount,
            "L2 transfer submitted"
        );
        Ok(tx_hash)
    }
}
