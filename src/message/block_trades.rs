use std::collections::BTreeMap;

use serde_json::{json, Value};
use starknet_core::types::Felt;

use super::order::order_message_fields;
use super::typed_data::{TypeMember, TypedData};
use super::{domain_type, order_members, paradex_domain};
use crate::error::ParadexResult;
use crate::types::BlockTrade;

pub fn build_block_trade_message(chain_id: Felt, block_trade: &BlockTrade) -> ParadexResult<TypedData> {
    let trades = block_trade
        .trades
        .iter()
        .map(|trade| -> ParadexResult<Value> {
            Ok(json!({
                "price": trade.chain_price()?,
                "size": trade.chain_size()?,
                "maker_order": order_message_fields(&trade.maker_order)?,
                "taker_order": order_message_fields(&trade.taker_order)?,
            }))
        })
        .collect::<ParadexResult<Vec<Value>>>()?;

    let mut types = BTreeMap::from([domain_type()]);
    types.insert(
        "BlockTrade".to_string(),
        vec![
            TypeMember::new("version", "shortstring"),
            TypeMember::new("trades", "Trade*"),
        ],
    );
    types.insert(
        "Trade".to_string(),
        vec![
            TypeMember::new("price", "felt"),
            TypeMember::new("size", "felt"),
            TypeMember::new("maker_order", "Order"),
            TypeMember::new("taker_order", "Order"),
        ],
    );
    types.insert("Order".to_string(), order_members());

    Ok(TypedData::new(
        types,
        "BlockTrade",
        paradex_domain(chain_id),
        json!({
            "version": block_trade.version,
            "trades": trades,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, OrderSide, Trade};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample_block_trade() -> BlockTrade {
        let price = Decimal::from_str("1500.50").unwrap();
        let size = Decimal::from_str("0.1").unwrap();
        let maker = Order::limit("ETH-USD-PERP", OrderSide::Sell, size, price)
            .with_signature_timestamp(1634736000000);
        let taker = Order::limit("ETH-USD-PERP", OrderSide::Buy, size, price)
            .with_signature_timestamp(1634736000001);
        BlockTrade::new("1.0", vec![Trade::new(price, size, maker, taker)])
    }

    #[test]
    fn test_build_block_trade_message() {
        let td = build_block_trade_message(Felt::ONE, &sample_block_trade()).unwrap();
        assert_eq!(td.primary_type, "BlockTrade");
        assert_eq!(td.message["version"], "1.0");

        let trade = &td.message["trades"][0];
        assert_eq!(trade["price"], "150050000000");
        assert_eq!(trade["size"], "10000000");
        assert_eq!(trade["maker_order"]["side"], "2");
        assert_eq!(trade["taker_order"]["side"], "1");
        assert_eq!(trade["taker_order"]["timestamp"], "1634736000001");
    }

    #[test]
    fn test_block_trade_type_string() {
        let td = build_block_trade_message(Felt::ONE, &sample_block_trade()).unwrap();
        assert_eq!(
            td.encode_type("BlockTrade").unwrap(),
            "BlockTrade(version:shortstring,trades:Trade*)\
             Order(timestamp:felt,market:felt,side:felt,orderType:felt,size:felt,price:felt)\
             Trade(price:felt,size:felt,maker_order:Order,taker_order:Order)"
        );
        assert!(td.message_hash(Felt::from(42u64)).is_ok());
    }

    #[test]
    fn test_empty_block_trade_hashes() {
        let td = build_block_trade_message(Felt::ONE, &BlockTrade::new("1.0", vec![])).unwrap();
        assert_eq!(td.message["trades"], json!([]));
        assert!(td.message_hash(Felt::ONE).is_ok());
    }
}
