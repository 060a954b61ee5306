//! Starknet typed data (SNIP-12 revision 0, Pedersen)
//!
//! Paradex signs every L2 message with the legacy revision of the typed data
//! standard:
//! - type strings are written `Name(field:type,...)` without quotes, with the
//!   referenced struct types appended in alphabetical order
//! - `type_hash = starknet_keccak(type_string)`
//! - `struct_hash = H([type_hash, *encoded_fields])`
//! - `message_hash = H(["StarkNet Message", domain_hash, account, struct_hash])`
//!
//! where `H` is `compute_hash_on_elements` (Pedersen chain with length suffix).
//!
//! Field values typed `felt`/`shortstring`/`string` accept JSON integers,
//! decimal strings, `0x` hex strings, and otherwise fall back to a Cairo
//! short string. `T*` arrays hash the encoded elements with `H`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use starknet_core::crypto::compute_hash_on_elements;
use starknet_core::types::Felt;
use starknet_core::utils::{cairo_short_string_to_felt, get_selector_from_name, starknet_keccak};

use crate::error::{ParadexError, ParadexResult};

/// Name of the domain separator type
pub const STARKNET_DOMAIN_TYPE: &str = "StarkNetDomain";

/// Prefix mixed into every message hash
const STARKNET_MESSAGE_PREFIX: &str = "StarkNet Message";

/// Single field of a struct type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

impl TypeMember {
    pub fn new(name: &str, r#type: &str) -> Self {
        Self {
            name: name.to_string(),
            r#type: r#type.to_string(),
        }
    }
}

/// Typed data document, serialized in the venue's JSON layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypeMember>>,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

fn typed_data_err(msg: impl Into<String>) -> ParadexError {
    ParadexError::TypedData(msg.into())
}

/// Parse a JSON value into a felt the way revision 0 encoders do.
pub fn parse_felt(value: &Value) -> ParadexResult<Felt> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(Felt::from)
            .ok_or_else(|| typed_data_err(format!("Number {} does not fit a felt", n))),
        Value::Bool(b) => Ok(if *b { Felt::ONE } else { Felt::ZERO }),
        Value::String(s) => parse_felt_str(s),
        other => Err(typed_data_err(format!("Cannot encode {} as felt", other))),
    }
}

fn parse_felt_str(s: &str) -> ParadexResult<Felt> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(typed_data_err(format!("Invalid hex value '{}'", s)));
        }
        return Felt::from_hex(s).map_err(|e| typed_data_err(format!("Invalid hex value '{}': {}", s, e)));
    }

    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return Felt::from_dec_str(s)
            .map_err(|e| typed_data_err(format!("Invalid decimal value '{}': {}", s, e)));
    }

    cairo_short_string_to_felt(s)
        .map_err(|e| typed_data_err(format!("Invalid short string '{}': {}", s, e)))
}

impl TypedData {
    pub fn new(
        types: BTreeMap<String, Vec<TypeMember>>,
        primary_type: impl Into<String>,
        domain: Value,
        message: Value,
    ) -> Self {
        Self {
            types,
            primary_type: primary_type.into(),
            domain,
            message,
        }
    }

    fn members(&self, type_name: &str) -> ParadexResult<&Vec<TypeMember>> {
        self.types
            .get(type_name)
            .ok_or_else(|| typed_data_err(format!("Unknown type '{}'", type_name)))
    }

    fn collect_dependencies(&self, type_name: &str, deps: &mut BTreeSet<String>) {
        let Some(members) = self.types.get(type_name) else {
            return;
        };
        for member in members {
            let base = member.r#type.trim_end_matches('*');
            if self.types.contains_key(base) && deps.insert(base.to_string()) {
                self.collect_dependencies(base, deps);
            }
        }
    }

    /// Type string of `type_name` followed by its dependencies, sorted
    pub fn encode_type(&self, type_name: &str) -> ParadexResult<String> {
        self.members(type_name)?;

        let mut deps = BTreeSet::new();
        self.collect_dependencies(type_name, &mut deps);
        deps.remove(type_name);

        let mut encoded = String::new();
        for name in std::iter::once(type_name).chain(deps.iter().map(String::as_str)) {
            let fields: Vec<String> = self
                .members(name)?
                .iter()
                .map(|m| format!("{}:{}", m.name, m.r#type))
                .collect();
            encoded.push_str(&format!("{}({})", name, fields.join(",")));
        }
        Ok(encoded)
    }

    pub fn type_hash(&self, type_name: &str) -> ParadexResult<Felt> {
        Ok(starknet_keccak(self.encode_type(type_name)?.as_bytes()))
    }

    fn encode_value(&self, type_name: &str, value: &Value) -> ParadexResult<Felt> {
        if self.types.contains_key(type_name) {
            return self.struct_hash(type_name, value);
        }

        if let Some(element_type) = type_name.strip_suffix('*') {
            let items = value.as_array().ok_or_else(|| {
                typed_data_err(format!("Expected array for type '{}', got {}", type_name, value))
            })?;
            let encoded = items
                .iter()
                .map(|item| self.encode_value(element_type, item))
                .collect::<ParadexResult<Vec<Felt>>>()?;
            return Ok(compute_hash_on_elements(&encoded));
        }

        match type_name {
            "felt" | "shortstring" | "string" | "bool" | "ContractAddress" | "ClassHash"
            | "timestamp" | "u128" => parse_felt(value),
            "selector" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| typed_data_err(format!("Selector must be a string, got {}", value)))?;
                get_selector_from_name(name)
                    .map_err(|e| typed_data_err(format!("Invalid selector '{}': {}", name, e)))
            }
            other => Err(typed_data_err(format!("Unsupported type '{}'", other))),
        }
    }

    /// Hash a struct instance of `type_name`
    pub fn struct_hash(&self, type_name: &str, data: &Value) -> ParadexResult<Felt> {
        let members = self.members(type_name)?;
        let object = data.as_object().ok_or_else(|| {
            typed_data_err(format!("Expected object for type '{}', got {}", type_name, data))
        })?;

        let mut elements = Vec::with_capacity(members.len() + 1);
        elements.push(self.type_hash(type_name)?);
        for member in members {
            let value = object.get(&member.name).ok_or_else(|| {
                typed_data_err(format!("Missing field '{}' in '{}'", member.name, type_name))
            })?;
            elements.push(self.encode_value(&member.r#type, value)?);
        }

        Ok(compute_hash_on_elements(&elements))
    }

    /// Final hash signed by the account at `account_address`
    pub fn message_hash(&self, account_address: Felt) -> ParadexResult<Felt> {
        let prefix = cairo_short_string_to_felt(STARKNET_MESSAGE_PREFIX)
            .map_err(|e| typed_data_err(e.to_string()))?;
        let domain_hash = self.struct_hash(STARKNET_DOMAIN_TYPE, &self.domain)?;
        let message_hash = self.struct_hash(&self.primary_type, &self.message)?;

        Ok(compute_hash_on_elements(&[
            prefix,
            domain_hash,
            account_address,
            message_hash,
        ]))
    }
}
