//! Typed errors for journal mutations and report periods.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JournalError {
    #[error("trade not found: {0}")]
    NotFound(String),

    #[error("invalid currency pair '{0}' (expected e.g. USD/JPY)")]
    InvalidPair(String),

    #[error("unknown direction '{0}' (use long/short)")]
    InvalidDirection(String),

    #[error("invalid {field}: {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("lot size {0} out of range (0.01..=100)")]
    InvalidLot(f64),

    #[error("{0}")]
    PriceLogic(String),

    #[error("exit lot {requested} exceeds remaining lot {remaining}")]
    ExitLotExceeds { requested: f64, remaining: f64 },

    #[error("exit time {exit} is not after entry time {entry}")]
    ExitBeforeEntry {
        entry: NaiveDateTime,
        exit: NaiveDateTime,
    },

    #[error("exit time {exit} is earlier than the previous exit at {last}")]
    ExitOutOfOrder {
        last: NaiveDateTime,
        exit: NaiveDateTime,
    },

    #[error("exit #{index} does not exist on trade {id}")]
    ExitNotFound { id: String, index: usize },

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("withdrawal {amount} exceeds the capital balance {balance}")]
    WithdrawalExceedsBalance { amount: f64, balance: f64 },

    #[error("date range ends ({end}) before it starts ({start})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid {kind} period index {index} for {year}")]
    InvalidPeriod {
        kind: &'static str,
        year: i32,
        index: u32,
    },
}

pub type Result<T> = std::result::Result<T, JournalError>;
