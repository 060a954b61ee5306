//! Data types shared across the SDK

mod block_trade;
mod order;
mod responses;
mod system_config;

pub use block_trade::{BlockTrade, Trade};
pub use order::{Instruction, Order, OrderSide, OrderType};
pub use responses::{ApiErrorBody, AuthResponse, JsonRpcError, PaginatedResults};
pub use system_config::{BridgedToken, SystemConfig};

#[cfg(test)]
pub(crate) use system_config::fixtures;
