//! Paraclear account address derivation
//!
//! Accounts are deployed as a proxy whose constructor calls `initialize` on
//! the implementation class, so the address is a function of the public key
//! and the two class hashes published in `/system/config`.

use starknet_core::types::Felt;
use starknet_core::utils::{get_contract_address, get_selector_from_name};

use super::keys::parse_felt_hex;
use crate::error::{ParadexError, ParadexResult};
use crate::types::SystemConfig;

/// Constructor calldata of the account proxy
pub fn account_constructor_calldata(account_hash: Felt, public_key: Felt) -> ParadexResult<Vec<Felt>> {
    let initialize = get_selector_from_name("initialize")
        .map_err(|e| ParadexError::Signing(format!("Invalid selector: {}", e)))?;
    Ok(vec![account_hash, initialize, Felt::TWO, public_key, Felt::ZERO])
}

/// Starknet address of the account proxy owned by `public_key`.
#[tracing::instrument(skip(account_hash, proxy_hash), fields(public_key = %format!("0x{:x}", public_key)))]
pub fn compute_account_address(
    public_key: Felt,
    account_hash: Felt,
    proxy_hash: Felt,
) -> ParadexResult<Felt> {
    let calldata = account_constructor_calldata(account_hash, public_key)?;
    let address = get_contract_address(public_key, proxy_hash, &calldata, Felt::ZERO);

    tracing::debug!(
        derived_address = %format!("0x{:x}", address),
        "Address derivation completed"
    );

    Ok(address)
}

/// Same as [`compute_account_address`], reading class hashes from the system config
pub fn account_address_for(config: &SystemConfig, public_key: Felt) -> ParadexResult<Felt> {
    let account_hash = parse_felt_hex(&config.paraclear_account_hash, "paraclear_account_hash")
        .map_err(|e| ParadexError::Config(e.to_string()))?;
    let proxy_hash = parse_felt_hex(&config.paraclear_account_proxy_hash, "paraclear_account_proxy_hash")
        .map_err(|e| ParadexError::Config(e.to_string()))?;
    compute_account_address(public_key, account_hash, proxy_hash)
}
