//! L2 key material
//!
//! Stark keys are derived from an L1 signature over the "STARK Key" EIP-712
//! message: the signature's `r` seeds a SHA-256 grinding loop whose output is
//! reduced into the Stark curve order.

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use sha2::{Digest, Sha256};
use starknet_core::types::Felt;
use starknet_signers::SigningKey;

use crate::config::constants::STARK_EC_ORDER_HEX;
use crate::error::{ParadexError, ParadexResult};
use crate::message::build_stark_key_message;

fn ec_order() -> BigUint {
    // constant is valid hex
    BigUint::parse_bytes(STARK_EC_ORDER_HEX.as_bytes(), 16).unwrap_or_else(BigUint::zero)
}

/// Minimal big-endian bytes with an even hex length (zero encodes as one 0x00 byte)
fn padded_bytes(value: &BigUint) -> Vec<u8> {
    value.to_bytes_be()
}

fn indexed_sha256(seed: &BigUint, index: u64) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(padded_bytes(seed));
    hasher.update(padded_bytes(&BigUint::from(index)));
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Grind a 256-bit seed into a uniformly distributed key below the curve order.
pub fn grind_key(key_seed: &BigUint) -> BigUint {
    let order = ec_order();
    let sha256_max_digest = BigUint::one() << 256;
    let max_allowed_value = &sha256_max_digest - (&sha256_max_digest % &order);

    let mut index = 0u64;
    let mut key = indexed_sha256(key_seed, index);
    while key >= max_allowed_value {
        index += 1;
        key = indexed_sha256(key_seed, index);
    }

    key % order
}

fn parse_l1_signer(l1_private_key: &str) -> ParadexResult<PrivateKeySigner> {
    let key = l1_private_key.trim();
    let key = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key);

    let bytes = hex::decode(key)
        .ok()
        .filter(|b| b.len() == 32)
        .ok_or_else(|| ParadexError::InvalidKey("Invalid L1 private key".into()))?;

    PrivateKeySigner::from_slice(&bytes)
        .map_err(|_| ParadexError::InvalidKey("Invalid L1 private key".into()))
}

/// Checksummed Ethereum address of an L1 private key
pub fn l1_address_from_private_key(l1_private_key: &str) -> ParadexResult<String> {
    Ok(parse_l1_signer(l1_private_key)?.address().to_checksum(None))
}

/// Derive the L2 private key from an L1 private key.
#[tracing::instrument(skip(l1_private_key))]
pub fn derive_stark_key(l1_private_key: &str, l1_chain_id: u64) -> ParadexResult<Felt> {
    let signer = parse_l1_signer(l1_private_key)?;
    let hash = build_stark_key_message(l1_chain_id).signing_hash();

    let signature = signer
        .sign_hash_sync(&hash)
        .map_err(|e| ParadexError::Signing(format!("STARK key message signing failed: {}", e)))?;

    let r_bytes = signature.r().to_be_bytes::<32>();
    let key = grind_key(&BigUint::from_bytes_be(&r_bytes));

    felt_from_biguint(&key)
}

pub(crate) fn felt_from_biguint(value: &BigUint) -> ParadexResult<Felt> {
    Felt::from_hex(&format!("0x{}", value.to_str_radix(16)))
        .map_err(|e| ParadexError::InvalidKey(format!("Value does not fit a felt: {}", e)))
}

/// Parse a hex felt ("0x..." or bare hex)
pub fn parse_felt_hex(value: &str, what: &str) -> ParadexResult<Felt> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParadexError::InvalidKey(format!("{} is empty", what)));
    }
    let normalized = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed.to_string()
    } else {
        format!("0x{}", trimmed)
    };
    Felt::from_hex(&normalized).map_err(|_| ParadexError::InvalidKey(format!("Invalid {}", what)))
}

/// Public key of a Stark private key
pub fn public_key_from_private(private_key: Felt) -> Felt {
    SigningKey::from_secret_scalar(private_key)
        .verifying_key()
        .scalar()
}
