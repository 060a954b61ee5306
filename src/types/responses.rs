//! Wire types shared by the REST and WebSocket clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of POST /auth
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub jwt_token: String,
}

/// Error body returned by the REST API on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Paginated list wrapper (`{"results": [...], "next": ..., "prev": ...}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginatedResults<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
