//! Protocol constants and client defaults
//!
//! Numeric values mirror what the Paradex venue and Starknet expect on the wire.

use std::time::Duration;

// =============================================================================
// Chain Encoding
// =============================================================================

/// Decimals used by Paraclear for sizes and prices on chain
pub const PARACLEAR_DECIMALS: u32 = 8;

/// Order side encoding in signed messages
pub const BUY_SIDE: u64 = 1;
pub const SELL_SIDE: u64 = 2;

/// Order of the Stark curve (private keys are reduced modulo this value)
pub const STARK_EC_ORDER_HEX: &str =
    "0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f";

/// Typed data domain name
pub const DOMAIN_NAME: &str = "Paradex";

/// Typed data domain version
pub const DOMAIN_VERSION: &str = "1";

// =============================================================================
// Authentication
// =============================================================================

/// Lifetime of the auth signature sent to POST /auth (24 hours)
pub const AUTH_SIGNATURE_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// Assumed JWT lifetime when the token carries no `exp` claim (5 minutes)
pub const JWT_LIFETIME_MS: u64 = 300_000;

/// Refresh the JWT when it is this close to expiry (2 minutes)
pub const JWT_REFRESH_BUFFER_MS: u64 = 120_000;

// =============================================================================
// Transport
// =============================================================================

/// Timeout for REST API calls
pub const REST_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket read timeout (reader wakes up, not an error)
pub const WS_TIMEOUT_SECS: u64 = 20;

/// Timeout waiting for a JSON-RPC response over the WebSocket
pub const WS_RPC_TIMEOUT_SECS: u64 = 5;

/// How long `pump_once` waits for a frame
pub const WS_PUMP_POLL_MS: u64 = 1;

/// First retry delay for REST calls; doubles per attempt
pub const HTTP_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Cap on the REST retry delay
pub const HTTP_RETRY_MAX_DELAY_MS: u64 = 60_000;
