//! Order model and its on-chain encoding

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::constants::{BUY_SIDE, PARACLEAR_DECIMALS, SELL_SIDE};
use crate::error::{ParadexError, ParadexResult};
use crate::utils::current_time_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn opposite(&self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Encoding used in signed messages: "1" for BUY, "2" for SELL
    pub fn chain_side(&self) -> String {
        match self {
            OrderSide::Buy => BUY_SIDE.to_string(),
            OrderSide::Sell => SELL_SIDE.to_string(),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-in-force instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    #[default]
    Gtc,
    Ioc,
    PostOnly,
}

impl Instruction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::Gtc => "GTC",
            Instruction::Ioc => "IOC",
            Instruction::PostOnly => "POST_ONLY",
        }
    }
}

/// Scale a decimal by 10^8 and truncate toward zero
pub(crate) fn to_chain_units(value: Decimal) -> ParadexResult<String> {
    value
        .checked_mul(Decimal::from(10u64.pow(PARACLEAR_DECIMALS)))
        .and_then(|scaled| scaled.trunc().to_i128())
        .map(|v| v.to_string())
        .ok_or_else(|| ParadexError::InvalidOrder(format!("Value out of range: {}", value)))
}

/// An order as submitted to POST /orders
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub market: String,
    pub order_type: OrderType,
    pub order_side: OrderSide,
    pub size: Decimal,
    /// Ignored for market orders
    pub limit_price: Decimal,
    pub client_id: String,
    pub instruction: Instruction,
    pub reduce_only: bool,
    /// Flattened Starknet signature, empty until signed
    pub signature: String,
    /// Signature time in milliseconds; doubles as a nonce
    pub signature_timestamp: u64,
}

impl Order {
    pub fn new(
        market: impl Into<String>,
        order_type: OrderType,
        order_side: OrderSide,
        size: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            market: market.into(),
            order_type,
            order_side,
            size,
            limit_price,
            client_id: String::new(),
            instruction: Instruction::default(),
            reduce_only: false,
            signature: String::new(),
            signature_timestamp: current_time_ms(),
        }
    }

    pub fn limit(market: impl Into<String>, side: OrderSide, size: Decimal, price: Decimal) -> Self {
        Self::new(market, OrderType::Limit, side, size, price)
    }

    pub fn market(market: impl Into<String>, side: OrderSide, size: Decimal) -> Self {
        Self::new(market, OrderType::Market, side, size, Decimal::ZERO)
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instruction = instruction;
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_signature_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.signature_timestamp = timestamp_ms;
        self
    }

    /// Validate basic invariants before signing
    pub fn validate(&self) -> ParadexResult<()> {
        if self.market.trim().is_empty() {
            return Err(ParadexError::InvalidOrder("market cannot be empty".into()));
        }
        if self.size <= Decimal::ZERO {
            return Err(ParadexError::InvalidOrder(format!(
                "size must be > 0 (got {})",
                self.size
            )));
        }
        if self.order_type == OrderType::Limit && self.limit_price <= Decimal::ZERO {
            return Err(ParadexError::InvalidOrder(format!(
                "limit price must be > 0 (got {})",
                self.limit_price
            )));
        }
        Ok(())
    }

    /// Limit price scaled to 8 decimals; market orders sign "0"
    pub fn chain_price(&self) -> ParadexResult<String> {
        match self.order_type {
            OrderType::Market => Ok("0".to_string()),
            OrderType::Limit => to_chain_units(self.limit_price),
        }
    }

    pub fn chain_size(&self) -> ParadexResult<String> {
        to_chain_units(self.size)
    }

    /// Request body for POST /orders
    pub fn dump_to_value(&self) -> Value {
        let mut body = json!({
            "market": self.market,
            "side": self.order_side.as_str(),
            "size": self.size.to_string(),
            "type": self.order_type.as_str(),
            "client_id": self.client_id,
            "instruction": self.instruction.as_str(),
            "signature": self.signature,
            "signature_timestamp": self.signature_timestamp,
        });

        if self.order_type == OrderType::Limit {
            body["price"] = Value::String(self.limit_price.to_string());
        }
        if self.reduce_only {
            body["flags"] = json!(["REDUCE_ONLY"]);
        }

        body
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.market, self.order_type, self.order_side, self.size
        )?;
        if self.order_type == OrderType::Limit {
            write!(f, "@{}", self.limit_price)?;
        }
        if !self.client_id.is_empty() {
            write!(f, ";client_id={}", self.client_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_chain_encoding_limit() {
        let order = Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("0.1"), dec("1500"));
        assert_eq!(order.chain_size().unwrap(), "10000000");
        assert_eq!(order.chain_price().unwrap(), "150000000000");
        assert_eq!(order.order_side.chain_side(), "1");
    }

    #[test]
    fn test_chain_encoding_truncates() {
        let order = Order::limit("BTC-USD-PERP", OrderSide::Sell, dec("0.123456789"), dec("1.999999999"));
        assert_eq!(order.chain_size().unwrap(), "12345678");
        assert_eq!(order.chain_price().unwrap(), "199999999");
        assert_eq!(order.order_side.chain_side(), "2");
    }

    #[test]
    fn test_chain_encoding_out_of_range() {
        let huge = Decimal::from_str_exact("1000000000000000000000").unwrap();
        match to_chain_units(huge) {
            Err(ParadexError::InvalidOrder(msg)) => assert!(msg.contains("out of range"), "Got: {}", msg),
            other => panic!("unexpected result: {:?}", other),
        }

        let order = Order::limit("ETH-USD-PERP", OrderSide::Buy, huge, dec("1500"));
        assert!(order.chain_size().is_err());
        assert_eq!(order.chain_price().unwrap(), "150000000000");
    }

    #[test]
    fn test_market_order_signs_zero_price() {
        let order = Order::market("ETH-USD-PERP", OrderSide::Sell, dec("1"));
        assert_eq!(order.chain_price().unwrap(), "0");
    }

    #[test]
    fn test_dump_limit_order() {
        let order = Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("0.1"), dec("1500.5"))
            .with_client_id("cid-1")
            .with_signature_timestamp(1634736000000)
            .with_reduce_only(true);
        let body = order.dump_to_value();
        assert_eq!(body["market"], "ETH-USD-PERP");
        assert_eq!(body["side"], "BUY");
        assert_eq!(body["type"], "LIMIT");
        assert_eq!(body["size"], "0.1");
        assert_eq!(body["price"], "1500.5");
        assert_eq!(body["client_id"], "cid-1");
        assert_eq!(body["instruction"], "GTC");
        assert_eq!(body["signature_timestamp"], 1634736000000u64);
        assert_eq!(body["flags"], json!(["REDUCE_ONLY"]));
    }

    #[test]
    fn test_dump_market_order_has_no_price() {
        let order = Order::market("ETH-USD-PERP", OrderSide::Sell, dec("2"))
            .with_instruction(Instruction::Ioc);
        let body = order.dump_to_value();
        assert!(body.get("price").is_none());
        assert!(body.get("flags").is_none());
        assert_eq!(body["instruction"], "IOC");
    }

    #[test]
    fn test_validate() {
        assert!(Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("1"), dec("10")).validate().is_ok());
        assert!(Order::limit("", OrderSide::Buy, dec("1"), dec("10")).validate().is_err());
        assert!(Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("0"), dec("10")).validate().is_err());
        assert!(Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("1"), dec("0")).validate().is_err());
        assert!(Order::market("ETH-USD-PERP", OrderSide::Buy, dec("1")).validate().is_ok());
    }

    #[test]
    fn test_side_serde_and_opposite() {
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"SELL\"");
        assert_eq!(serde_json::to_string(&Instruction::PostOnly).unwrap(), "\"POST_ONLY\"");
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
    }

    #[test]
    fn test_display() {
        let order = Order::limit("ETH-USD-PERP", OrderSide::Buy, dec("0.1"), dec("1500"))
            .with_client_id("abc");
        assert_eq!(order.to_string(), "ETH-USD-PERP LIMIT BUY 0.1@1500;client_id=abc");
    }
}
