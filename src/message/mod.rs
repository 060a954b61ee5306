//! Typed message builders
//!
//! Every builder returns a document that is hashed and signed by the account:
//! - [`build_auth_message`]: POST /auth request signature
//! - [`build_onboarding_message`]: one-time onboarding constant
//! - [`build_order_message`]: order submission
//! - [`build_block_trade_message`]: block trade agreement
//! - [`build_stark_key_message`]: EIP-712 message signed on L1 to derive the L2 key

mod auth;
mod block_trades;
mod onboarding;
mod order;
mod stark_key;
pub mod typed_data;

use serde_json::{json, Value};
use starknet_core::types::Felt;

use crate::config::constants::{DOMAIN_NAME, DOMAIN_VERSION};
use typed_data::{TypeMember, STARKNET_DOMAIN_TYPE};

pub use auth::build_auth_message;
pub use block_trades::build_block_trade_message;
pub use onboarding::build_onboarding_message;
pub use order::build_order_message;
pub use stark_key::{build_stark_key_message, StarkKeyMessage};
pub use typed_data::TypedData;

/// Paradex domain for L2 messages; `chainId` is hex-encoded
pub(crate) fn paradex_domain(chain_id: Felt) -> Value {
    json!({
        "name": DOMAIN_NAME,
        "chainId": format!("0x{:x}", chain_id),
        "version": DOMAIN_VERSION,
    })
}

pub(crate) fn domain_type() -> (String, Vec<TypeMember>) {
    (
        STARKNET_DOMAIN_TYPE.to_string(),
        vec![
            TypeMember::new("name", "felt"),
            TypeMember::new("chainId", "felt"),
            TypeMember::new("version", "felt"),
        ],
    )
}

pub(crate) fn order_members() -> Vec<TypeMember> {
    vec![
        TypeMember::new("timestamp", "felt"),
        TypeMember::new("market", "felt"),
        TypeMember::new("side", "felt"),
        TypeMember::new("orderType", "felt"),
        TypeMember::new("size", "felt"),
        TypeMember::new("price", "felt"),
    ]
}
