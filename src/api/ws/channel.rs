//! WebSocket channel names
//!
//! Channels are addressed by name templates such as `bbo.{market}`; the first
//! dot-separated segment identifies the channel kind in incoming messages.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ParadexError, ParadexResult};

/// Parameters substituted into a channel template
pub type ChannelParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParadexWebsocketChannel {
    /// Private: account status
    Account,
    /// Private: PnL calculation data
    BalanceEvents,
    Bbo,
    /// Private
    Fills,
    FundingData,
    /// Private
    FundingPayments,
    FundingRateComparison,
    MarketsSummary,
    /// Private
    Orders,
    /// Snapshot of depth `depth` every `refresh_rate`, optionally grouped by price tick
    OrderBook,
    /// Private
    Positions,
    Trades,
    /// Private: fills busted on chain
    Tradebusts,
    /// Private
    Transactions,
    Transfers,
}

use ParadexWebsocketChannel::*;

impl ParadexWebsocketChannel {
    pub const ALL: [ParadexWebsocketChannel; 15] = [
        Account,
        BalanceEvents,
        Bbo,
        Fills,
        FundingData,
        FundingPayments,
        FundingRateComparison,
        MarketsSummary,
        Orders,
        OrderBook,
        Positions,
        Trades,
        Tradebusts,
        Transactions,
        Transfers,
    ];

    /// Channel name template
    pub fn template(&self) -> &'static str {
        match self {
            Account => "account",
            BalanceEvents => "balance_events",
            Bbo => "bbo.{market}",
            Fills => "fills.{market}",
            FundingData => "funding_data.{market}",
            FundingPayments => "funding_payments.{market}",
            FundingRateComparison => "funding_rate_comparison.{market}",
            MarketsSummary => "markets_summary.{market}",
            Orders => "orders.{market}",
            OrderBook => "order_book.{market}.snapshot@{depth}@{refresh_rate}",
            Positions => "positions",
            Trades => "trades.{market}",
            Tradebusts => "tradebusts",
            Transactions => "transaction",
            Transfers => "transfers",
        }
    }

    /// First segment of the channel name
    pub fn prefix(&self) -> &'static str {
        let template = self.template();
        template.split('.').next().unwrap_or(template)
    }

    pub fn is_private(&self) -> bool {
        matches!(
            self,
            Account
                | BalanceEvents
                | Fills
                | FundingPayments
                | Orders
                | Positions
                | Tradebusts
                | Transactions
                | Transfers
        )
    }

    /// Concrete channel name; every placeholder must have a parameter.
    ///
    /// `markets_summary` defaults to `market=ALL`, and `order_book` appends
    /// `@{price_tick}` when that parameter is given.
    pub fn format(&self, params: &ChannelParams) -> ParadexResult<String> {
        let mut params = params.clone();
        if *self == MarketsSummary && params.is_empty() {
            params.insert("market".to_string(), "ALL".to_string());
        }

        let mut name = String::with_capacity(self.template().len() + 16);
        let mut rest = self.template();
        while let Some(start) = rest.find('{') {
            name.push_str(&rest[..start]);
            let end = rest[start..]
                .find('}')
                .map(|i| start + i)
                .ok_or_else(|| ParadexError::Config(format!("Malformed template '{}'", self.template())))?;
            let key = &rest[start + 1..end];
            let value = params.get(key).ok_or_else(|| {
                ParadexError::Config(format!(
                    "Missing parameter '{}' for channel '{}'",
                    key,
                    self.prefix()
                ))
            })?;
            name.push_str(value);
            rest = &rest[end + 1..];
        }
        name.push_str(rest);

        if *self == OrderBook {
            if let Some(tick) = params.get("price_tick") {
                name.push('@');
                name.push_str(tick);
            }
        }

        Ok(name)
    }

    /// Channel kind of an incoming channel name, matched on its first segment
    pub fn from_channel_name(name: &str) -> Option<Self> {
        let prefix = name.split('.').next()?;
        Self::ALL.iter().copied().find(|c| c.prefix() == prefix)
    }
}

impl fmt::Display for ParadexWebsocketChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for ParadexWebsocketChannel {
    type Err = ParadexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.prefix() == key)
            .ok_or_else(|| ParadexError::Config(format!("Unknown channel '{}'", s)))
    }
}

/// Build parameters from `(key, value)` pairs
pub fn channel_params<const N: usize>(pairs: [(&str, &str); N]) -> ChannelParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
