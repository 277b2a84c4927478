//! Aggregate statistics over a set of journal trades.
//!
//! Everything here is a pure function of its input slice. Sequence-dependent
//! figures (streaks, drawdown) are always computed over [`time_ordered`] so
//! every caller sees the same ordering: ascending by last exit time.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::calc::{holding_minutes, trade_pips, trade_rr};
use crate::session::{session_of, Session};
use crate::types::TradeRecord;
use crate::utils::{ratio_or_zero, round_to};

/// Stand-in for an infinite ratio (winners but no losers).
pub const RATIO_SENTINEL: f64 = 999.99;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipStats {
    pub wins: usize,
    pub losses: usize,
    /// Trades that closed at exactly zero pips.
    pub pushes: usize,
    pub total: f64,
    pub win_sum: f64,
    /// Positive magnitude.
    pub loss_sum: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_win: f64,
    pub max_loss: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub profit_factor: f64,
    pub risk_reward: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrencyStats {
    /// Closed trades carrying a currency result.
    pub registered: usize,
    /// Percentage of closed trades that are registered.
    pub registration_rate: f64,
    pub wins: usize,
    pub losses: usize,
    pub net: f64,
    pub win_sum: f64,
    /// Positive magnitude.
    pub loss_sum: f64,
    pub swap_total: f64,
    pub commission_total: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_win: f64,
    pub max_loss: f64,
    pub profit_factor: f64,
    pub risk_reward: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub pips: f64,
}

impl BucketStats {
    fn record(&mut self, pips: f64) {
        self.trades += 1;
        self.pips += pips;
        if pips > 0.0 {
            self.wins += 1;
        } else if pips < 0.0 {
            self.losses += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub pips: PipStats,
    pub currency: CurrencyStats,
    pub avg_hold_minutes: f64,
    pub avg_rr: f64,
    pub by_pair: BTreeMap<String, BucketStats>,
    /// Indexed by entry weekday, 0 = Sunday.
    pub by_weekday: [BucketStats; 7],
    /// Indexed by [`Session::index`].
    pub by_session: [BucketStats; 4],
}

impl StatisticsSummary {
    pub fn session(&self, s: Session) -> &BucketStats {
        &self.by_session[s.index()]
    }
}

/// Closed or partially closed trades with both an entry time and a final exit
/// time, ascending by final exit time. Ties keep input order.
pub fn time_ordered(trades: &[TradeRecord]) -> Vec<&TradeRecord> {
    let mut ordered: Vec<&TradeRecord> = trades
        .iter()
        .filter(|t| t.is_closed_or_partial() && t.entry_time.is_some())
        .filter(|t| t.last_exit_time().is_some())
        .collect();
    ordered.sort_by_key(|t| t.last_exit_time());
    ordered
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub max_win: usize,
    pub max_loss: usize,
}

/// Longest runs of winners and losers in sequence order. A zero result breaks
/// both runs.
pub fn streaks<I>(results: I) -> Streaks
where
    I: IntoIterator<Item = f64>,
{
    let (mut cur_win, mut cur_loss) = (0usize, 0usize);
    let mut out = Streaks::default();
    for r in results {
        if r > 0.0 {
            cur_win += 1;
            cur_loss = 0;
            out.max_win = out.max_win.max(cur_win);
        } else if r < 0.0 {
            cur_loss += 1;
            cur_win = 0;
            out.max_loss = out.max_loss.max(cur_loss);
        } else {
            cur_win = 0;
            cur_loss = 0;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drawdown {
    pub max: f64,
    /// Highest running total reached (never below the 0 start).
    pub peak: f64,
}

/// Largest peak-to-trough fall of the running total, starting from 0.
pub fn max_drawdown<I>(results: I) -> Drawdown
where
    I: IntoIterator<Item = f64>,
{
    let (mut cumulative, mut peak, mut max) = (0.0f64, 0.0f64, 0.0f64);
    for r in results {
        cumulative += r;
        peak = peak.max(cumulative);
        max = max.max(peak - cumulative);
    }
    Drawdown { max, peak }
}

/// `wins / losses`, the sentinel when only wins exist, 0 when both are empty.
fn guarded_ratio(wins: f64, losses: f64) -> f64 {
    if losses > 0.0 {
        wins / losses
    } else if wins > 0.0 {
        RATIO_SENTINEL
    } else {
        0.0
    }
}

fn expectancy(wins: usize, losses: usize, avg_win: f64, avg_loss: f64) -> f64 {
    let decided = (wins + losses) as f64;
    let win_frac = ratio_or_zero(wins as f64, decided);
    let loss_frac = ratio_or_zero(losses as f64, decided);
    win_frac * avg_win - loss_frac * avg_loss
}

pub fn aggregate(trades: &[TradeRecord]) -> StatisticsSummary {
    let closed: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_closed_or_partial()).collect();
    let mut summary = StatisticsSummary {
        total_trades: trades.len(),
        closed_trades: closed.len(),
        open_trades: trades.len() - closed.len(),
        ..Default::default()
    };

    let mut hold_total = 0i64;
    let mut hold_count = 0usize;
    let mut rr_total = 0.0;
    let mut rr_count = 0usize;

    for t in &closed {
        let pips = trade_pips(t);
        summary.pips.total += pips;
        if pips > 0.0 {
            summary.pips.wins += 1;
            summary.pips.win_sum += pips;
            summary.pips.max_win = summary.pips.max_win.max(pips);
        } else if pips < 0.0 {
            summary.pips.losses += 1;
            summary.pips.loss_sum += -pips;
            summary.pips.max_loss = summary.pips.max_loss.max(-pips);
        } else {
            summary.pips.pushes += 1;
        }

        summary.by_pair.entry(t.pair.clone()).or_default().record(pips);
        if let Some(entry) = t.entry_time {
            summary.by_weekday[entry.weekday().num_days_from_sunday() as usize].record(pips);
            summary.by_session[session_of(entry).index()].record(pips);
        }

        if let Some(m) = holding_minutes(t) {
            hold_total += m;
            hold_count += 1;
        }
        if let Some(rr) = trade_rr(t) {
            rr_total += rr;
            rr_count += 1;
        }

        if let Some(pl) = &t.profit_loss {
            let c = &mut summary.currency;
            c.registered += 1;
            c.net += pl.net_profit;
            c.swap_total += pl.swap;
            c.commission_total += pl.commission;
            if pl.net_profit > 0.0 {
                c.wins += 1;
                c.win_sum += pl.net_profit;
                c.max_win = c.max_win.max(pl.net_profit);
            } else if pl.net_profit < 0.0 {
                c.losses += 1;
                c.loss_sum += -pl.net_profit;
                c.max_loss = c.max_loss.max(-pl.net_profit);
            }
        }
    }

    summary.avg_hold_minutes = ratio_or_zero(hold_total as f64, hold_count as f64);
    summary.avg_rr = round_to(ratio_or_zero(rr_total, rr_count as f64), 2);

    let ordered = time_ordered(trades);
    finish_pips(&mut summary.pips, &ordered);
    finish_currency(&mut summary.currency, closed.len(), &ordered);

    summary
}

fn finish_pips(p: &mut PipStats, ordered: &[&TradeRecord]) {
    p.total = round_to(p.total, 1);
    p.win_rate = round_to(
        ratio_or_zero(p.wins as f64, (p.wins + p.losses) as f64) * 100.0,
        1,
    );
    p.avg_win = ratio_or_zero(p.win_sum, p.wins as f64);
    p.avg_loss = ratio_or_zero(p.loss_sum, p.losses as f64);
    p.profit_factor = round_to(guarded_ratio(p.win_sum, p.loss_sum), 2);
    p.risk_reward = round_to(guarded_ratio(p.avg_win, p.avg_loss), 2);
    p.expectancy = round_to(expectancy(p.wins, p.losses, p.avg_win, p.avg_loss), 1);

    let series: Vec<f64> = ordered.iter().map(|t| trade_pips(t)).collect();
    let s = streaks(series.iter().copied());
    p.max_win_streak = s.max_win;
    p.max_loss_streak = s.max_loss;
    p.max_drawdown = round_to(max_drawdown(series).max, 1);
}

fn finish_currency(c: &mut CurrencyStats, closed: usize, ordered: &[&TradeRecord]) {
    c.registration_rate = round_to(
        ratio_or_zero(c.registered as f64, closed as f64) * 100.0,
        1,
    );
    c.win_rate = round_to(
        ratio_or_zero(c.wins as f64, (c.wins + c.losses) as f64) * 100.0,
        1,
    );
    c.avg_win = ratio_or_zero(c.win_sum, c.wins as f64);
    c.avg_loss = ratio_or_zero(c.loss_sum, c.losses as f64);
    c.profit_factor = round_to(guarded_ratio(c.win_sum, c.loss_sum), 2);
    c.risk_reward = round_to(guarded_ratio(c.avg_win, c.avg_loss), 2);
    c.expectancy = expectancy(c.wins, c.losses, c.avg_win, c.avg_loss);

    let dd = max_drawdown(
        ordered
            .iter()
            .filter_map(|t| t.profit_loss.as_ref().map(|pl| pl.net_profit)),
    );
    c.max_drawdown = dd.max;
    c.max_drawdown_pct = if dd.peak > 0.0 {
        round_to(dd.max / dd.peak * 100.0, 1)
    } else {
        0.0
    };
}
