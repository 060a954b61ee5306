//! Block trade endpoints
//!
//! Request and response bodies stay as JSON: the venue's block trade schema
//! is wide and changes more often than the SDK.

use serde_json::Value;

use super::rest::ParadexApiClient;
use crate::error::ParadexResult;

impl ParadexApiClient {
    /// Block trades where the account is initiator, signer or offerer.
    pub async fn list_block_trades(&self, status: Option<&str>, market: Option<&str>) -> ParadexResult<Value> {
        let mut params = Vec::new();
        if let Some(status) = status {
            params.push(("status", status.to_string()));
        }
        if let Some(market) = market {
            params.push(("market", market.to_string()));
        }
        self.private_get("block-trades", &params).await
    }

    pub async fn create_block_trade(&self, block_trade: &Value) -> ParadexResult<Value> {
        self.private_post("block-trades", block_trade).await
    }

    pub async fn get_block_trade(&self, block_trade_id: &str) -> ParadexResult<Value> {
        self.private_get(&format!("block-trades/{}", block_trade_id), &[])
            .await
    }

    /// Only the initiator can cancel, and only before execution.
    pub async fn cancel_block_trade(&self, block_trade_id: &str) -> ParadexResult<Value> {
        self.private_delete(&format!("block-trades/{}", block_trade_id), &[])
            .await
    }

    pub async fn execute_block_trade(&self, block_trade_id: &str, execution: &Value) -> ParadexResult<Value> {
        self.private_post(&format!("block-trades/{}/execute", block_trade_id), execution)
            .await
    }

    pub async fn get_block_trade_offers(&self, block_trade_id: &str) -> ParadexResult<Value> {
        self.private_get(&format!("block-trades/{}/offers", block_trade_id), &[])
            .await
    }

    pub async fn create_block_trade_offer(&self, block_trade_id: &str, offer: &Value) -> ParadexResult<Value> {
        self.private_post(&format!("block-trades/{}/offers", block_trade_id), offer)
            .await
    }

    pub async fn get_block_trade_offer(&self, block_trade_id: &str, offer_id: &str) -> ParadexResult<Value> {
        self.private_get(
            &format!("block-trades/{}/offers/{}", block_trade_id, offer_id),
            &[],
        )
        .await
    }

    pub async fn cancel_block_trade_offer(&self, block_trade_id: &str, offer_id: &str) -> ParadexResult<Value> {
        self.private_delete(
            &format!("block-trades/{}/offers/{}", block_trade_id, offer_id),
            &[],
        )
        .await
    }

    pub async fn execute_block_trade_offer(
        &self,
        block_trade_id: &str,
        offer_id: &str,
        execution: &Value,
    ) -> ParadexResult<Value> {
        self.private_post(
            &format!("block-trades/{}/offers/{}/execute", block_trade_id, offer_id),
            execution,
        )
        .await
    }
}
