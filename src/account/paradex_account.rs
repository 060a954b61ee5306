//! Paradex account: L2 key pair, account address and message signing
//!
//! A main account is tied to an L1 (Ethereum) address and may onboard or move
//! funds on chain. A subkey carries only an L2 key and the address of the
//! account it acts for; it can authenticate and sign orders, nothing else.

use std::fmt;

use num_bigint::BigUint;
use starknet_core::crypto::Signature;
use starknet_core::types::Felt;
use starknet_signers::{SigningKey, VerifyingKey};

use super::address::account_address_for;
use super::keys::{derive_stark_key, parse_felt_hex, public_key_from_private};
use crate::config::constants::AUTH_SIGNATURE_EXPIRY_SECS;
use crate::config::logging::sanitize_signature;
use crate::config::Credentials;
use crate::error::{ParadexError, ParadexResult};
use crate::message::{
    build_auth_message, build_block_trade_message, build_onboarding_message, build_order_message,
    TypedData,
};
use crate::types::{BlockTrade, Order, SystemConfig};
use crate::utils::{current_time_ms, current_time_secs};

/// Header name/value pairs produced by signing helpers
pub type SignedHeaders = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    Main { l1_address: String },
    Subkey,
}

#[derive(Clone)]
pub struct ParadexAccount {
    kind: AccountKind,
    config: SystemConfig,
    l2_chain_id: Felt,
    private_key: Felt,
    public_key: Felt,
    address: Felt,
}

/// `["<r>","<s>"]` with decimal components
pub fn flatten_signature(signature: &Signature) -> String {
    let r = BigUint::from_bytes_be(&signature.r.to_bytes_be()).to_string();
    let s = BigUint::from_bytes_be(&signature.s.to_bytes_be()).to_string();
    format!("[\"{}\",\"{}\"]", r, s)
}

impl ParadexAccount {
    /// Main account whose L2 key is derived from the L1 private key.
    #[tracing::instrument(skip(config, l1_private_key), fields(l1_address = %l1_address))]
    pub fn from_l1_private_key(
        config: &SystemConfig,
        l1_address: &str,
        l1_private_key: &str,
    ) -> ParadexResult<Self> {
        let private_key = derive_stark_key(l1_private_key, config.l1_chain_id()?)?;
        Self::main(config, l1_address, private_key)
    }

    /// Main account with an already known L2 private key.
    #[tracing::instrument(skip(config, l2_private_key), fields(l1_address = %l1_address))]
    pub fn from_l2_private_key(
        config: &SystemConfig,
        l1_address: &str,
        l2_private_key: &str,
    ) -> ParadexResult<Self> {
        let private_key = parse_felt_hex(l2_private_key, "L2 private key")?;
        Self::main(config, l1_address, private_key)
    }

    fn main(config: &SystemConfig, l1_address: &str, private_key: Felt) -> ParadexResult<Self> {
        if l1_address.trim().is_empty() {
            return Err(ParadexError::InvalidKey("L1 address is required".into()));
        }

        let public_key = public_key_from_private(private_key);
        let address = account_address_for(config, public_key)?;

        let account = Self {
            kind: AccountKind::Main {
                l1_address: l1_address.trim().to_string(),
            },
            config: config.clone(),
            l2_chain_id: config.l2_chain_id()?,
            private_key,
            public_key,
            address,
        };
        tracing::info!(address = %account.address_hex(), "Paradex account initialized");
        Ok(account)
    }

    /// L2-only account acting for `l2_address`.
    #[tracing::instrument(skip(config, l2_private_key), fields(l2_address = %l2_address))]
    pub fn subkey(config: &SystemConfig, l2_private_key: &str, l2_address: &str) -> ParadexResult<Self> {
        if l2_private_key.trim().is_empty() {
            return Err(ParadexError::InvalidKey("Subkey: L2 private key is required".into()));
        }
        if l2_address.trim().is_empty() {
            return Err(ParadexError::InvalidKey("Subkey: L2 address is required".into()));
        }

        let private_key = parse_felt_hex(l2_private_key, "L2 private key")?;
        let address = parse_felt_hex(l2_address, "L2 address")?;

        let account = Self {
            kind: AccountKind::Subkey,
            config: config.clone(),
            l2_chain_id: config.l2_chain_id()?,
            private_key,
            public_key: public_key_from_private(private_key),
            address,
        };
        tracing::info!(address = %account.address_hex(), "Paradex subkey initialized");
        Ok(account)
    }

    /// Build whichever account kind the credentials describe.
    pub fn from_credentials(config: &SystemConfig, credentials: &Credentials) -> ParadexResult<Self> {
        credentials.validate()?;

        if credentials.is_subkey() {
            let (Some(key), Some(address)) = (&credentials.l2_private_key, &credentials.l2_address)
            else {
                return Err(ParadexError::AccountNotInitialized);
            };
            return Self::subkey(config, key, address);
        }

        let l1_address = credentials
            .l1_address
            .as_deref()
            .ok_or(ParadexError::AccountNotInitialized)?;

        match (&credentials.l2_private_key, &credentials.l1_private_key) {
            (Some(l2_key), _) => Self::from_l2_private_key(config, l1_address, l2_key),
            (None, Some(l1_key)) => Self::from_l1_private_key(config, l1_address, l1_key),
            (None, None) => Err(ParadexError::AccountNotInitialized),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn is_subkey(&self) -> bool {
        self.kind == AccountKind::Subkey
    }

    pub fn l1_address(&self) -> Option<&str> {
        match &self.kind {
            AccountKind::Main { l1_address } => Some(l1_address),
            AccountKind::Subkey => None,
        }
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn address_hex(&self) -> String {
        format!("0x{:x}", self.address)
    }

    pub fn public_key(&self) -> Felt {
        self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{:x}", self.public_key)
    }

    pub fn l2_chain_id(&self) -> Felt {
        self.l2_chain_id
    }

    pub fn system_config(&self) -> &SystemConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn private_key(&self) -> Felt {
        self.private_key
    }

    // ------------------------------------------------------------------------
    // Signing
    // ------------------------------------------------------------------------

    pub fn sign_hash(&self, hash: Felt) -> ParadexResult<Signature> {
        SigningKey::from_secret_scalar(self.private_key)
            .sign(&hash)
            .map_err(|e| ParadexError::Signing(format!("Signing failed: {}", e)))
    }

    /// Sign a typed-data document against this account's address.
    pub fn sign_message(&self, typed_data: &TypedData) -> ParadexResult<Signature> {
        let hash = typed_data.message_hash(self.address)?;
        tracing::debug!(
            primary_type = %typed_data.primary_type,
            message_hash = %format!("0x{:x}", hash),
            "Signing typed data"
        );
        self.sign_hash(hash)
    }

    /// Flattened signature over a typed-data document
    pub fn sign_typed_data(&self, typed_data: &TypedData) -> ParadexResult<String> {
        Ok(flatten_signature(&self.sign_message(typed_data)?))
    }

    pub fn verify_message(&self, typed_data: &TypedData, signature: &Signature) -> ParadexResult<bool> {
        let hash = typed_data.message_hash(self.address)?;
        VerifyingKey::from_scalar(self.public_key)
            .verify(&hash, signature)
            .map_err(|e| ParadexError::Signing(format!("Verification failed: {}", e)))
    }

    pub fn onboarding_signature(&self) -> ParadexResult<String> {
        self.ensure_main("onboarding")?;
        self.sign_typed_data(&build_onboarding_message(self.l2_chain_id))
    }

    pub fn onboarding_headers(&self) -> ParadexResult<SignedHeaders> {
        let l1_address = self
            .l1_address()
            .ok_or_else(|| ParadexError::Unsupported("onboarding with a subkey".into()))?
            .to_string();
        Ok(vec![
            ("PARADEX-ETHEREUM-ACCOUNT", l1_address),
            ("PARADEX-STARKNET-ACCOUNT", self.address_hex()),
            ("PARADEX-STARKNET-SIGNATURE", self.onboarding_signature()?),
        ])
    }

    /// Signature for POST /auth; timestamps in seconds.
    pub fn auth_signature(&self, timestamp: u64, expiry: u64) -> ParadexResult<String> {
        self.sign_typed_data(&build_auth_message(self.l2_chain_id, timestamp, expiry))
    }

    /// Headers for POST /auth, valid for 24 hours.
    pub fn auth_headers(&self) -> ParadexResult<SignedHeaders> {
        let timestamp = current_time_secs();
        let expiry = timestamp + AUTH_SIGNATURE_EXPIRY_SECS;
        let signature = self.auth_signature(timestamp, expiry)?;

        tracing::debug!(
            account = %self.address_hex(),
            timestamp,
            expiry,
            signature = %sanitize_signature(&signature),
            "Auth headers signed"
        );

        Ok(vec![
            ("PARADEX-STARKNET-ACCOUNT", self.address_hex()),
            ("PARADEX-STARKNET-SIGNATURE", signature),
            ("PARADEX-TIMESTAMP", timestamp.to_string()),
            ("PARADEX-SIGNATURE-EXPIRATION", expiry.to_string()),
        ])
    }

    /// Sign `order` in place, stamping the signature time when unset.
    pub fn sign_order(&self, order: &mut Order) -> ParadexResult<String> {
        order.validate()?;
        if order.signature_timestamp == 0 {
            order.signature_timestamp = current_time_ms();
        }
        let signature = self.sign_typed_data(&build_order_message(self.l2_chain_id, order)?)?;
        order.signature = signature.clone();
        Ok(signature)
    }

    pub fn sign_block_trade(&self, block_trade: &BlockTrade) -> ParadexResult<String> {
        self.sign_typed_data(&build_block_trade_message(self.l2_chain_id, block_trade)?)
    }

    pub(crate) fn ensure_main(&self, operation: &str) -> ParadexResult<()> {
        if self.is_subkey() {
            return Err(ParadexError::Unsupported(format!(
                "{} is not available for subkeys",
                operation
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ParadexAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParadexAccount")
            .field("kind", &self.kind)
            .field("address", &self.address_hex())
            .field("public_key", &self.public_key_hex())
            .field("private_key", &"***")
            .finish()
    }
}
