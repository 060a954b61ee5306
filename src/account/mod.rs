//! Paradex accounts
//!
//! - `keys`: L1 → L2 key derivation and Stark key helpers
//! - `address`: Paraclear account address derivation
//! - `paradex_account`: main and subkey accounts, message signing
//! - `transfer`: on-chain L2 transfers through the Starknet full node

pub mod address;
pub mod keys;
mod paradex_account;
mod transfer;

pub use address::compute_account_address;
pub use keys::{derive_stark_key, grind_key, l1_address_from_private_key};
pub use paradex_account::{flatten_signature, AccountKind, ParadexAccount, SignedHeaders};
pub use transfer::{encode_execute_calldata, invoke_v1_hash, Call, StarknetRpcClient};

#[cfg(test)]
pub(crate) use paradex_account::test_keys;
