use std::collections::BTreeMap;

use serde_json::json;
use starknet_core::types::Felt;

use super::typed_data::{TypeMember, TypedData};
use super::{domain_type, paradex_domain};

/// Request signature for POST /v1/auth. Timestamps are in seconds.
pub fn build_auth_message(chain_id: Felt, timestamp: u64, expiry: u64) -> TypedData {
    let mut types = BTreeMap::from([domain_type()]);
    types.insert(
        "Request".to_string(),
        vec![
            TypeMember::new("method", "felt"),
            TypeMember::new("path", "felt"),
            TypeMember::new("body", "felt"),
            TypeMember::new("timestamp", "felt"),
            TypeMember::new("expiration", "felt"),
        ],
    );

    TypedData::new(
        types,
        "Request",
        paradex_domain(chain_id),
        json!({
            "method": "POST",
            "path": "/v1/auth",
            "body": "",
            "timestamp": timestamp,
            "expiration": expiry,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_auth_message() {
        let td = build_auth_message(Felt::ONE, 2, 3);
        assert_eq!(
            serde_json::to_value(&td).unwrap(),
            json!({
                "message": {
                    "method": "POST",
                    "path": "/v1/auth",
                    "body": "",
                    "timestamp": 2,
                    "expiration": 3,
                },
                "domain": {"name": "Paradex", "chainId": "0x1", "version": "1"},
                "primaryType": "Request",
                "types": {
                    "StarkNetDomain": [
                        {"name": "name", "type": "felt"},
                        {"name": "chainId", "type": "felt"},
                        {"name": "version", "type": "felt"},
                    ],
                    "Request": [
                        {"name": "method", "type": "felt"},
                        {"name": "path", "type": "felt"},
                        {"name": "body", "type": "felt"},
                        {"name": "timestamp", "type": "felt"},
                        {"name": "expiration", "type": "felt"},
                    ],
                },
            })
        );
    }

    #[test]
    fn test_auth_message_hashes() {
        let td = build_auth_message(Felt::from(7u64), 1706868900, 1706955300);
        assert!(td.message_hash(Felt::ONE).is_ok());
    }
}
