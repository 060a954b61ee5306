//! Block trade model signed by both counterparties

use rust_decimal::Decimal;

use super::order::{to_chain_units, Order};
use crate::error::ParadexResult;

/// One matched trade inside a block trade
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub price: Decimal,
    pub size: Decimal,
    pub maker_order: Order,
    pub taker_order: Order,
}

impl Trade {
    pub fn new(price: Decimal, size: Decimal, maker_order: Order, taker_order: Order) -> Self {
        Self {
            price,
            size,
            maker_order,
            taker_order,
        }
    }

    pub fn chain_price(&self) -> ParadexResult<String> {
        to_chain_units(self.price)
    }

    pub fn chain_size(&self) -> ParadexResult<String> {
        to_chain_units(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockTrade {
    /// Encoded as a Cairo short string, e.g. "1.0"
    pub version: String,
    pub trades: Vec<Trade>,
}

impl BlockTrade {
    pub fn new(version: impl Into<String>, trades: Vec<Trade>) -> Self {
        Self {
            version: version.into(),
            trades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use std::str::FromStr;

    #[test]
    fn test_trade_chain_values() {
        let price = Decimal::from_str("1500.50").unwrap();
        let size = Decimal::from_str("0.5").unwrap();
        let maker = Order::limit("ETH-USD-PERP", OrderSide::Sell, size, price);
        let taker = Order::limit("ETH-USD-PERP", OrderSide::Buy, size, price);
        let trade = Trade::new(price, size, maker, taker);

        assert_eq!(trade.chain_price().unwrap(), "150050000000");
        assert_eq!(trade.chain_size().unwrap(), "50000000");
    }
}
