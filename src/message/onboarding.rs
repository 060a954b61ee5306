use std::collections::BTreeMap;

use serde_json::json;
use starknet_core::types::Felt;

use super::typed_data::{TypeMember, TypedData};
use super::{domain_type, paradex_domain};

pub fn build_onboarding_message(chain_id: Felt) -> TypedData {
    let mut types = BTreeMap::from([domain_type()]);
    types.insert("Constant".to_string(), vec![TypeMember::new("action", "felt")]);

    TypedData::new(
        types,
        "Constant",
        paradex_domain(chain_id),
        json!({ "action": "Onboarding" }),
    )
}
