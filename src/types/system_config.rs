//! System configuration returned by GET /system/config

use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;
use starknet_core::utils::cairo_short_string_to_felt;

use crate::error::{ParadexError, ParadexResult};

/// Token bridged from L1 to Paradex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgedToken {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub l1_token_address: String,
    #[serde(default)]
    pub l1_bridge_address: String,
    #[serde(default)]
    pub l2_token_address: String,
    #[serde(default)]
    pub l2_bridge_address: String,
}

fn default_paraclear_decimals() -> u32 {
    crate::config::constants::PARACLEAR_DECIMALS
}

/// Venue system configuration. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub ws_api_url: String,
    #[serde(default)]
    pub starknet_gateway_url: String,
    #[serde(default)]
    pub starknet_fullnode_rpc_url: String,
    /// e.g. "PRIVATE_SN_POTC_SEPOLIA"
    pub starknet_chain_id: String,
    #[serde(default)]
    pub block_explorer_url: String,
    #[serde(default)]
    pub paraclear_address: String,
    #[serde(default = "default_paraclear_decimals")]
    pub paraclear_decimals: u32,
    pub paraclear_account_proxy_hash: String,
    pub paraclear_account_hash: String,
    #[serde(default)]
    pub oracle_address: String,
    #[serde(default)]
    pub bridged_tokens: Vec<BridgedToken>,
    #[serde(default)]
    pub l1_core_contract_address: String,
    #[serde(default)]
    pub l1_operator_address: String,
    /// Decimal string, e.g. "11155111"
    pub l1_chain_id: String,
    #[serde(default)]
    pub liquidation_fee: String,
}

impl SystemConfig {
    /// Starknet chain id as the felt encoding of its short string
    pub fn l2_chain_id(&self) -> ParadexResult<Felt> {
        cairo_short_string_to_felt(&self.starknet_chain_id).map_err(|e| {
            ParadexError::Config(format!(
                "Invalid starknet_chain_id '{}': {}",
                self.starknet_chain_id, e
            ))
        })
    }

    pub fn l1_chain_id(&self) -> ParadexResult<u64> {
        self.l1_chain_id.trim().parse().map_err(|_| {
            ParadexError::Config(format!("Invalid l1_chain_id '{}'", self.l1_chain_id))
        })
    }

    /// L2 address of the first bridged token (USDC)
    pub fn settlement_token(&self) -> ParadexResult<&BridgedToken> {
        self.bridged_tokens
            .first()
            .ok_or_else(|| ParadexError::Config("System config has no bridged tokens".into()))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::mock_system_config;
    use super::*;

    #[test]
    fn test_parse_mock_config() {
        let config = mock_system_config();
        assert_eq!(config.starknet_chain_id, "PRIVATE_SN_POTC_SEPOLIA");
        assert_eq!(config.paraclear_decimals, 8);
        assert_eq!(config.l1_chain_id().unwrap(), 11155111);
        assert_eq!(
            config.settlement_token().unwrap().l2_token_address,
            "0x6f373b346561036d98ea10fb3e60d2f459c872b1933b50b21fe6ef4fda3b75e"
        );
    }

    #[test]
    fn test_l2_chain_id_is_short_string() {
        let config = mock_system_config();
        let expected = cairo_short_string_to_felt("PRIVATE_SN_POTC_SEPOLIA").unwrap();
        assert_eq!(config.l2_chain_id().unwrap(), expected);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: SystemConfig = serde_json::from_str(
            r#"{
                "starknet_chain_id": "SN",
                "paraclear_account_proxy_hash": "0x1",
                "paraclear_account_hash": "0x2",
                "l1_chain_id": "1",
                "some_new_field": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.paraclear_decimals, 8);
        assert!(config.bridged_tokens.is_empty());
        assert!(config.settlement_token().is_err());
    }

    #[test]
    fn test_invalid_l1_chain_id() {
        let mut config = mock_system_config();
        config.l1_chain_id = "sepolia".into();
        assert!(config.l1_chain_id().is_err());
    }
}
