//! Core domain types for journal entries, exit legs and realized P/L.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "buy")]
    Long,
    #[serde(alias = "sell")]
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[default]
    Open,
    Partial,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Partial => "partial",
            TradeStatus::Closed => "closed",
        }
    }
}

/// One (possibly partial) close of a position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExitLeg {
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
    pub price: f64,
    pub lot: f64,
    /// Pip result recorded at exit time. Derived from prices when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pips: Option<f64>,
}

/// Account-currency result of a trade as reported by the broker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLoss {
    #[serde(default)]
    pub trade_profit_loss: f64,
    #[serde(default)]
    pub swap: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub net_profit: f64,
}

impl ProfitLoss {
    /// Builds a breakdown whose net is the sum of its parts. Commission is a cost and
    /// is always stored as a non-positive amount.
    pub fn from_parts(trade_profit_loss: f64, swap: f64, commission: f64) -> Self {
        let commission = -commission.abs();
        Self {
            trade_profit_loss,
            swap,
            commission,
            net_profit: trade_profit_loss + swap + commission,
        }
    }
}

/// Risk tolerance in force when the trade was entered and the lot it implied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskSnapshot {
    pub tolerance: f64,
    pub recommended_lot: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: String,
    pub pair: String,
    pub direction: Direction,

    #[serde(default)]
    pub entry_time: Option<NaiveDateTime>,
    pub entry_price: f64,
    pub lot_size: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,

    #[serde(default)]
    pub exits: Vec<ExitLeg>,
    /// `None` while the currency result has not been registered.
    #[serde(default)]
    pub profit_loss: Option<ProfitLoss>,

    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub entry_emotion: String,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub method_id: Option<String>,
    #[serde(default)]
    pub risk: Option<RiskSnapshot>,
    #[serde(default)]
    pub broker: Option<String>,

    #[serde(default)]
    pub status: TradeStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl TradeRecord {
    pub fn is_closed_or_partial(&self) -> bool {
        !self.exits.is_empty()
    }

    /// Timestamp of the final exit leg, if any.
    pub fn last_exit_time(&self) -> Option<NaiveDateTime> {
        self.exits.last().and_then(|e| e.time)
    }

    pub fn exited_lot(&self) -> f64 {
        self.exits.iter().map(|e| e.lot).sum()
    }

    /// Weighted-average exit price across all legs.
    pub fn avg_exit_price(&self) -> Option<f64> {
        let lot = self.exited_lot();
        if lot <= 0.0 {
            return None;
        }
        let weighted: f64 = self.exits.iter().map(|e| e.price * e.lot).sum();
        Some(weighted / lot)
    }
}

/// User-supplied fields for a new journal entry.
#[derive(Debug, Clone, Default)]
pub struct NewTrade {
    pub pair: String,
    pub direction: Direction,
    pub entry_time: Option<NaiveDateTime>,
    pub entry_price: f64,
    pub lot_size: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub reasons: Vec<String>,
    pub scenario: String,
    pub entry_emotion: String,
    pub memo: String,
    pub tags: Vec<String>,
    pub method_id: Option<String>,
    pub broker: Option<String>,
    /// Account-currency rate of the quote currency, used for lot sizing.
    pub quote_rate: Option<f64>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TradeUpdate {
    pub pair: Option<String>,
    pub direction: Option<Direction>,
    pub entry_time: Option<NaiveDateTime>,
    pub entry_price: Option<f64>,
    pub lot_size: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub scenario: Option<String>,
    pub entry_emotion: Option<String>,
    pub reflection: Option<String>,
    pub memo: Option<String>,
    pub method_id: Option<String>,
    pub broker: Option<String>,
}
