//! Trade arithmetic: pips, remaining lots, risk/reward and holding time.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::types::{Direction, ExitLeg, TradeRecord};
use crate::utils::round_to;

/// Quote-currency scale: JPY-quoted pairs move in 0.01, everything else in 0.0001.
pub fn pip_multiplier(pair: &str) -> f64 {
    if pair.to_ascii_uppercase().contains("JPY") {
        100.0
    } else {
        10_000.0
    }
}

/// Signed pips for one price move, rounded to 0.1.
pub fn calculate_pips(pair: &str, direction: Direction, entry: f64, exit: f64) -> f64 {
    if !entry.is_finite() || !exit.is_finite() {
        return 0.0;
    }
    let diff = match direction {
        Direction::Long => exit - entry,
        Direction::Short => entry - exit,
    };
    round_to(diff * pip_multiplier(pair), 1)
}

/// Pips of a single exit leg; a recorded value takes precedence over prices.
pub fn exit_pips(trade: &TradeRecord, exit: &ExitLeg) -> f64 {
    exit.pips.unwrap_or_else(|| {
        calculate_pips(&trade.pair, trade.direction, trade.entry_price, exit.price)
    })
}

/// Lot-weighted pip result over all exit legs. Open trades yield 0.
pub fn trade_pips(trade: &TradeRecord) -> f64 {
    match trade.exits.as_slice() {
        [] => 0.0,
        [only] => exit_pips(trade, only),
        exits => {
            let (weighted, lots) = exits.iter().fold((0.0, 0.0), |(w, l), e| {
                (w + exit_pips(trade, e) * e.lot, l + e.lot)
            });
            if lots > 0.0 {
                round_to(weighted / lots, 1)
            } else {
                0.0
            }
        }
    }
}

/// Lots still open; never negative.
pub fn remaining_lot(trade: &TradeRecord) -> f64 {
    (trade.lot_size - trade.exited_lot()).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskReward {
    pub risk: f64,
    pub reward: f64,
    pub ratio: f64,
}

pub fn risk_reward(entry: f64, stop_loss: f64, take_profit: f64, direction: Direction) -> RiskReward {
    let (risk, reward) = match direction {
        Direction::Long => ((entry - stop_loss).abs(), (take_profit - entry).abs()),
        Direction::Short => ((stop_loss - entry).abs(), (entry - take_profit).abs()),
    };
    let ratio = if risk > 0.0 { reward / risk } else { 0.0 };
    RiskReward {
        risk: round_to(risk, 5),
        reward: round_to(reward, 5),
        ratio: round_to(ratio, 2),
    }
}

/// Planned R:R at entry; 0 without both stop and target.
pub fn initial_rr(trade: &TradeRecord) -> f64 {
    match (trade.stop_loss, trade.take_profit) {
        (Some(sl), Some(tp)) => risk_reward(trade.entry_price, sl, tp, trade.direction).ratio,
        _ => 0.0,
    }
}

/// Realised R-multiple against the initial stop, using the lot-weighted exit price.
pub fn trade_rr(trade: &TradeRecord) -> Option<f64> {
    let avg_exit = trade.avg_exit_price()?;
    let sl = trade.stop_loss?;
    let (reward, risk) = match trade.direction {
        Direction::Long => (avg_exit - trade.entry_price, trade.entry_price - sl),
        Direction::Short => (trade.entry_price - avg_exit, sl - trade.entry_price),
    };
    if risk <= 0.0 {
        return None;
    }
    Some(round_to(reward / risk, 2))
}

/// Minutes between entry and the final exit. `None` when a timestamp is missing
/// or the exit precedes the entry.
pub fn holding_minutes(trade: &TradeRecord) -> Option<i64> {
    let entry = trade.entry_time?;
    let exit = trade.last_exit_time()?;
    minutes_between(entry, exit)
}

fn minutes_between(entry: NaiveDateTime, exit: NaiveDateTime) -> Option<i64> {
    let minutes = (exit - entry).num_minutes();
    (minutes >= 0).then_some(minutes)
}

pub fn format_holding(minutes: i64) -> String {
    let days = minutes / (60 * 24);
    let hours = (minutes % (60 * 24)) / 60;
    let mins = minutes % 60;
    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}
