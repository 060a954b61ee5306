use std::collections::BTreeMap;

use serde_json::{json, Value};
use starknet_core::types::Felt;

use super::typed_data::TypedData;
use super::{domain_type, order_members, paradex_domain};
use crate::error::ParadexResult;
use crate::types::Order;

/// Order fields as they appear inside signed messages
pub(crate) fn order_message_fields(order: &Order) -> ParadexResult<Value> {
    Ok(json!({
        "timestamp": order.signature_timestamp.to_string(),
        "market": order.market,
        "side": order.order_side.chain_side(),
        "orderType": order.order_type.as_str(),
        "size": order.chain_size()?,
        "price": order.chain_price()?,
    }))
}

pub fn build_order_message(chain_id: Felt, order: &Order) -> ParadexResult<TypedData> {
    let mut types = BTreeMap::from([domain_type()]);
    types.insert("Order".to_string(), order_members());

    Ok(TypedData::new(
        types,
        "Order",
        paradex_domain(chain_id),
        order_message_fields(order)?,
    ))
}
