//! Month-by-month trend for a year and the day-by-day results of one month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calc::trade_pips;
use crate::error::Result;
use crate::period::{filter_by_period, Period, PeriodKind};
use crate::stats::aggregate;
use crate::types::TradeRecord;
use crate::utils::round_to;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: u32,
    pub trades: usize,
    pub pips: f64,
    /// Registered net result.
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    /// Last month of the window.
    pub month: u32,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub year: i32,
    pub months: Vec<MonthPoint>,
    pub moving_average_3: Vec<MovingAverage>,
    pub moving_average_6: Vec<MovingAverage>,
}

fn moving_average(months: &[MonthPoint], window: usize) -> Vec<MovingAverage> {
    months
        .windows(window)
        .map(|w| MovingAverage {
            month: w[w.len() - 1].month,
            net: round_to(w.iter().map(|m| m.net).sum::<f64>() / window as f64, 0),
        })
        .collect()
}

/// Twelve monthly points (by last exit time) plus 3- and 6-month moving
/// averages of the net result.
pub fn monthly_trend(trades: &[TradeRecord], year: i32) -> Result<Trend> {
    let mut months = Vec::with_capacity(12);
    for month in 1..=12 {
        let period = Period::new(PeriodKind::Monthly, year, month)?;
        let s = aggregate(&filter_by_period(trades, &period));
        months.push(MonthPoint {
            month,
            trades: s.closed_trades,
            pips: s.pips.total,
            net: s.currency.net,
        });
    }
    Ok(Trend {
        year,
        moving_average_3: moving_average(&months, 3),
        moving_average_6: moving_average(&months, 6),
        months,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayResult {
    pub trades: usize,
    pub pips: f64,
    pub net: f64,
}

/// Closed results per final-exit date within one month. Days without a closed
/// trade are absent.
pub fn daily_results(
    trades: &[TradeRecord],
    year: i32,
    month: u32,
) -> Result<BTreeMap<NaiveDate, DayResult>> {
    let period = Period::new(PeriodKind::Monthly, year, month)?;
    let mut days: BTreeMap<NaiveDate, DayResult> = BTreeMap::new();
    for t in filter_by_period(trades, &period) {
        let Some(exit) = t.last_exit_time() else { continue };
        let day = days.entry(exit.date()).or_default();
        day.trades += 1;
        day.pips = round_to(day.pips + trade_pips(&t), 1);
        day.net += t.profit_loss.map(|pl| pl.net_profit).unwrap_or(0.0);
    }
    Ok(days)
}
