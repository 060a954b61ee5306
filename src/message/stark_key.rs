//! EIP-712 message signed with the L1 key to derive the Stark key

use std::borrow::Cow;

use alloy_primitives::{B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde_json::{json, Value};

use crate::config::constants::{DOMAIN_NAME, DOMAIN_VERSION};

sol! {
    /// `Constant(string action)` on the Ethereum side
    #[derive(Debug, PartialEq)]
    struct Constant {
        string action;
    }
}

/// Action string signed on L1
pub const STARK_KEY_ACTION: &str = "STARK Key";

#[derive(Debug, Clone)]
pub struct StarkKeyMessage {
    pub l1_chain_id: u64,
    domain: Eip712Domain,
    message: Constant,
}

impl StarkKeyMessage {
    /// `keccak256("\x19\x01" || domainSeparator || hashStruct(message))`
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// JSON typed-data document, as shown to wallets
    pub fn to_value(&self) -> Value {
        json!({
            "message": { "action": self.message.action },
            "domain": {
                "name": DOMAIN_NAME,
                "chainId": self.l1_chain_id,
                "version": DOMAIN_VERSION,
            },
            "primaryType": "Constant",
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"},
                ],
                "Constant": [
                    {"name": "action", "type": "string"},
                ],
            },
        })
    }
}

pub fn build_stark_key_message(l1_chain_id: u64) -> StarkKeyMessage {
    StarkKeyMessage {
        l1_chain_id,
        domain: Eip712Domain {
            name: Some(Cow::Borrowed(DOMAIN_NAME)),
            version: Some(Cow::Borrowed(DOMAIN_VERSION)),
            chain_id: Some(U256::from(l1_chain_id)),
            verifying_contract: None,
            salt: None,
        },
        message: Constant {
            action: STARK_KEY_ACTION.to_string(),
        },
    }
}
