//! Input checks applied before the journal accepts an entry or exit.

use crate::calc::remaining_lot;
use crate::error::{JournalError, Result};
use crate::types::{Direction, ExitLeg, TradeRecord};

pub const MIN_LOT: f64 = 0.01;
pub const MAX_LOT: f64 = 100.0;
/// Tolerance for float lot sums.
pub const LOT_EPSILON: f64 = 1e-9;

/// Stop and target must bracket the entry on the correct sides.
pub fn check_price_logic(
    direction: Direction,
    entry: f64,
    stop_loss: f64,
    take_profit: f64,
) -> Result<()> {
    let problem = match direction {
        Direction::Long if entry <= stop_loss => Some("long stop loss must be below the entry"),
        Direction::Long if entry >= take_profit => Some("long take profit must be above the entry"),
        Direction::Short if entry >= stop_loss => Some("short stop loss must be above the entry"),
        Direction::Short if entry <= take_profit => {
            Some("short take profit must be below the entry")
        }
        _ => None,
    };
    match problem {
        Some(msg) => Err(JournalError::PriceLogic(msg.to_string())),
        None => Ok(()),
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(JournalError::InvalidPrice { field, value })
    }
}

/// Entry-leg checks: prices, lot range and stop/target placement.
pub fn check_entry(trade: &TradeRecord) -> Result<()> {
    if trade.pair.trim().is_empty() {
        return Err(JournalError::InvalidPair(trade.pair.clone()));
    }
    check_positive("entry price", trade.entry_price)?;
    if !(MIN_LOT..=MAX_LOT).contains(&trade.lot_size) {
        return Err(JournalError::InvalidLot(trade.lot_size));
    }
    if let Some(sl) = trade.stop_loss {
        check_positive("stop loss", sl)?;
    }
    if let Some(tp) = trade.take_profit {
        check_positive("take profit", tp)?;
    }
    if let (Some(sl), Some(tp)) = (trade.stop_loss, trade.take_profit) {
        check_price_logic(trade.direction, trade.entry_price, sl, tp)?;
    }
    Ok(())
}

/// Exit-leg checks against the trade's current state: the new leg may not
/// close more than the remaining lot nor precede the entry.
pub fn check_exit(trade: &TradeRecord, exit: &ExitLeg) -> Result<()> {
    check_positive("exit price", exit.price)?;
    if !(exit.lot.is_finite() && exit.lot > 0.0) {
        return Err(JournalError::InvalidLot(exit.lot));
    }
    let remaining = remaining_lot(trade);
    if exit.lot > remaining + LOT_EPSILON {
        return Err(JournalError::ExitLotExceeds {
            requested: exit.lot,
            remaining,
        });
    }
    if let (Some(entry), Some(time)) = (trade.entry_time, exit.time) {
        if time <= entry {
            return Err(JournalError::ExitBeforeEntry { entry, exit: time });
        }
    }
    // The final leg must stay the latest so it can serve as the trade's exit time.
    if let (Some(last), Some(time)) = (trade.exits.iter().filter_map(|e| e.time).max(), exit.time) {
        if time < last {
            return Err(JournalError::ExitOutOfOrder { last, exit: time });
        }
    }
    Ok(())
}

/// Re-validates every exit after an edit of the entry leg: lots must still fit.
pub fn check_exits_fit(trade: &TradeRecord) -> Result<()> {
    let exited = trade.exited_lot();
    if exited > trade.lot_size + LOT_EPSILON {
        return Err(JournalError::ExitLotExceeds {
            requested: exited,
            remaining: trade.lot_size,
        });
    }
    if let Some(entry) = trade.entry_time {
        if let Some(time) = trade.exits.iter().filter_map(|e| e.time).find(|t| *t <= entry) {
            return Err(JournalError::ExitBeforeEntry { entry, exit: time });
        }
    }
    Ok(())
}
