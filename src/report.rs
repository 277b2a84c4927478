//! Plain-text rendering of trades and summaries.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tabled::{Table, Tabled};

use crate::calc::{format_holding, holding_minutes, initial_rr, remaining_lot, trade_pips, trade_rr};
use crate::capital::{CapitalRecord, CapitalSummary};
use crate::session::Session;
use crate::stats::{BucketStats, StatisticsSummary};
use crate::trend::{DayResult, Trend};
use crate::types::TradeRecord;
use crate::utils::{ratio_or_zero, WEEKDAY_NAMES};

fn ts(t: Option<chrono::NaiveDateTime>) -> String {
    t.map(|v| v.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x}")).unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct TradeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Dir")]
    direction: &'static str,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Price")]
    price: f64,
    #[tabled(rename = "Lot")]
    lot: f64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Pips")]
    pips: String,
    #[tabled(rename = "Net")]
    net: String,
}

impl From<&TradeRecord> for TradeRow {
    fn from(t: &TradeRecord) -> Self {
        Self {
            id: t.id.chars().take(8).collect(),
            pair: t.pair.clone(),
            direction: t.direction.as_str(),
            entry: ts(t.entry_time),
            price: t.entry_price,
            lot: t.lot_size,
            status: t.status.as_str(),
            pips: if t.exits.is_empty() {
                "-".to_string()
            } else {
                format!("{:.1}", trade_pips(t))
            },
            net: opt(t.profit_loss.map(|p| p.net_profit)),
        }
    }
}

pub fn trade_table<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> String {
    let rows: Vec<TradeRow> = trades.into_iter().map(TradeRow::from).collect();
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct ExitRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Price")]
    price: f64,
    #[tabled(rename = "Lot")]
    lot: f64,
    #[tabled(rename = "Pips")]
    pips: String,
}

/// Full view of one trade: entry fields, derived figures and every exit leg.
pub fn trade_detail(t: &TradeRecord) -> String {
    let mut fields = vec![
        FieldRow { field: "id", value: t.id.clone() },
        FieldRow { field: "pair", value: t.pair.clone() },
        FieldRow { field: "direction", value: t.direction.as_str().to_string() },
        FieldRow { field: "entry", value: format!("{} @ {}", ts(t.entry_time), t.entry_price) },
        FieldRow { field: "lot", value: format!("{} (remaining {:.2})", t.lot_size, remaining_lot(t)) },
        FieldRow { field: "stop loss", value: opt(t.stop_loss) },
        FieldRow { field: "take profit", value: opt(t.take_profit) },
        FieldRow { field: "status", value: t.status.as_str().to_string() },
    ];
    if t.stop_loss.is_some() && t.take_profit.is_some() {
        fields.push(FieldRow { field: "planned r:r", value: format!("{:.2}", initial_rr(t)) });
    }
    if !t.exits.is_empty() {
        fields.push(FieldRow { field: "pips", value: format!("{:.1}", trade_pips(t)) });
    }
    if let Some(rr) = trade_rr(t) {
        fields.push(FieldRow { field: "r multiple", value: format!("{rr:.2}") });
    }
    if let Some(m) = holding_minutes(t) {
        fields.push(FieldRow { field: "held", value: format_holding(m) });
    }
    if let Some(pl) = t.profit_loss {
        fields.push(FieldRow {
            field: "profit/loss",
            value: format!(
                "trade {} swap {} commission {} net {}",
                pl.trade_profit_loss, pl.swap, pl.commission, pl.net_profit
            ),
        });
    }
    if let Some(r) = t.risk {
        fields.push(FieldRow {
            field: "risk",
            value: format!("tolerance {} recommended lot {}", r.tolerance, r.recommended_lot),
        });
    }
    for (field, value) in [
        ("scenario", &t.scenario),
        ("emotion", &t.entry_emotion),
        ("reflection", &t.reflection),
        ("memo", &t.memo),
    ] {
        if !value.is_empty() {
            fields.push(FieldRow { field, value: value.clone() });
        }
    }
    if !t.reasons.is_empty() {
        fields.push(FieldRow { field: "reasons", value: t.reasons.join(", ") });
    }
    fields.push(FieldRow { field: "tags", value: t.tags.join(", ") });

    let mut out = Table::new(fields).to_string();
    if !t.exits.is_empty() {
        let exits: Vec<ExitRow> = t
            .exits
            .iter()
            .enumerate()
            .map(|(index, e)| ExitRow {
                index,
                time: ts(e.time),
                price: e.price,
                lot: e.lot,
                pips: opt(e.pips),
            })
            .collect();
        out.push('\n');
        out.push_str(&Table::new(exits).to_string());
    }
    out
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Pips")]
    pips: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn metric(metric: &'static str, pips: impl ToString, amount: impl ToString) -> MetricRow {
    MetricRow {
        metric,
        pips: pips.to_string(),
        amount: amount.to_string(),
    }
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    name: String,
    #[tabled(rename = "Trades")]
    trades: usize,
    #[tabled(rename = "Wins")]
    wins: usize,
    #[tabled(rename = "Losses")]
    losses: usize,
    #[tabled(rename = "Win %")]
    win_rate: String,
    #[tabled(rename = "Pips")]
    pips: String,
}

fn bucket_row(name: impl Into<String>, b: &BucketStats) -> BucketRow {
    BucketRow {
        name: name.into(),
        trades: b.trades,
        wins: b.wins,
        losses: b.losses,
        win_rate: format!("{:.1}", ratio_or_zero(b.wins as f64 * 100.0, b.trades as f64)),
        pips: format!("{:.1}", b.pips),
    }
}

/// Headline metrics followed by pair, weekday and session breakdowns.
pub fn summary_tables(s: &StatisticsSummary) -> String {
    let p = &s.pips;
    let c = &s.currency;
    let rows = vec![
        metric("trades (closed/open)", format!("{}/{}", s.closed_trades, s.open_trades), format!("{} registered", c.registered)),
        metric("wins / losses", format!("{}/{} ({} even)", p.wins, p.losses, p.pushes), format!("{}/{}", c.wins, c.losses)),
        metric("win rate %", format!("{:.1}", p.win_rate), format!("{:.1}", c.win_rate)),
        metric("total", format!("{:.1}", p.total), format!("{:.0}", c.net)),
        metric("average win", format!("{:.1}", p.avg_win), format!("{:.0}", c.avg_win)),
        metric("average loss", format!("{:.1}", p.avg_loss), format!("{:.0}", c.avg_loss)),
        metric("largest win", format!("{:.1}", p.max_win), format!("{:.0}", c.max_win)),
        metric("largest loss", format!("{:.1}", p.max_loss), format!("{:.0}", c.max_loss)),
        metric("profit factor", format!("{:.2}", p.profit_factor), format!("{:.2}", c.profit_factor)),
        metric("risk reward", format!("{:.2}", p.risk_reward), format!("{:.2}", c.risk_reward)),
        metric("expectancy", format!("{:.1}", p.expectancy), format!("{:.0}", c.expectancy)),
        metric("max drawdown", format!("{:.1}", p.max_drawdown), format!("{:.0} ({:.1}%)", c.max_drawdown, c.max_drawdown_pct)),
        metric("win / loss streak", format!("{}/{}", p.max_win_streak, p.max_loss_streak), "-"),
        metric("swap / commission", "-", format!("{:.0} / {:.0}", c.swap_total, c.commission_total)),
        metric("avg hold", format_holding(s.avg_hold_minutes.round() as i64), "-"),
        metric("avg r multiple", format!("{:.2}", s.avg_rr), "-"),
    ];

    let mut out = Table::new(rows).to_string();

    if !s.by_pair.is_empty() {
        let pairs: Vec<BucketRow> = s.by_pair.iter().map(|(k, b)| bucket_row(k.as_str(), b)).collect();
        out.push_str("\n\nBy pair\n");
        out.push_str(&Table::new(pairs).to_string());
    }

    let days: Vec<BucketRow> = s
        .by_weekday
        .iter()
        .enumerate()
        .filter(|(_, b)| b.trades > 0)
        .map(|(i, b)| bucket_row(WEEKDAY_NAMES[i], b))
        .collect();
    if !days.is_empty() {
        out.push_str("\n\nBy weekday\n");
        out.push_str(&Table::new(days).to_string());
    }

    let sessions: Vec<BucketRow> = Session::ALL
        .iter()
        .map(|sess| bucket_row(sess.display_name(), s.session(*sess)))
        .collect();
    if sessions.iter().any(|r| r.trades > 0) {
        out.push_str("\n\nBy session\n");
        out.push_str(&Table::new(sessions).to_string());
    }
    out
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: u32,
    #[tabled(rename = "Trades")]
    trades: usize,
    #[tabled(rename = "Pips")]
    pips: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "3m avg")]
    avg3: String,
    #[tabled(rename = "6m avg")]
    avg6: String,
}

pub fn trend_table(t: &Trend) -> String {
    let avg = |list: &[crate::trend::MovingAverage], month: u32| {
        list.iter()
            .find(|m| m.month == month)
            .map(|m| format!("{:.0}", m.net))
            .unwrap_or_else(|| "-".to_string())
    };
    let rows: Vec<MonthRow> = t
        .months
        .iter()
        .map(|m| MonthRow {
            month: m.month,
            trades: m.trades,
            pips: format!("{:.1}", m.pips),
            net: format!("{:.0}", m.net),
            avg3: avg(&t.moving_average_3, m.month),
            avg6: avg(&t.moving_average_6, m.month),
        })
        .collect();
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Day")]
    weekday: &'static str,
    #[tabled(rename = "Trades")]
    trades: usize,
    #[tabled(rename = "Pips")]
    pips: String,
    #[tabled(rename = "Net")]
    net: String,
}

pub fn calendar_table(days: &BTreeMap<NaiveDate, DayResult>) -> String {
    let rows: Vec<DayRow> = days
        .iter()
        .map(|(d, r)| DayRow {
            date: d.format("%Y-%m-%d").to_string(),
            weekday: WEEKDAY_NAMES[d.weekday().num_days_from_sunday() as usize],
            trades: r.trades,
            pips: format!("{:.1}", r.pips),
            net: format!("{:.0}", r.net),
        })
        .collect();
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct CapitalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Note")]
    note: String,
}

/// Ledger rows followed by the balance and return figures.
pub fn capital_tables(records: &[CapitalRecord], summary: &CapitalSummary) -> String {
    let rows: Vec<CapitalRow> = records
        .iter()
        .map(|r| CapitalRow {
            id: r.id.chars().take(8).collect(),
            date: r.date.format("%Y-%m-%d").to_string(),
            kind: r.kind.as_str(),
            amount: format!("{:.0}", r.amount),
            balance: format!("{:.0}", r.balance),
            note: r.note.clone(),
        })
        .collect();
    let totals = vec![
        FieldRow { field: "deposits", value: format!("{:.0}", summary.deposits) },
        FieldRow { field: "withdrawals", value: format!("{:.0}", summary.withdrawals) },
        FieldRow { field: "balance", value: format!("{:.0}", summary.balance) },
        FieldRow { field: "net profit", value: format!("{:.0}", summary.net_profit) },
        FieldRow { field: "profit rate %", value: format!("{:.2}", summary.profit_rate) },
        FieldRow { field: "max drawdown %", value: format!("{:.2}", summary.drawdown_pct) },
    ];
    format!("{}\n{}", Table::new(rows), Table::new(totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;
    use crate::testutil::{closed_trade, open_trade, with_net};
    use crate::types::Direction;

    #[test]
    fn list_shortens_ids_and_blanks_open_pips() {
        let mut t = open_trade("USD/JPY", "2024-01-10 10:00");
        t.id = "0123456789abcdef".into();
        let out = trade_table([&t]);
        assert!(out.contains("01234567"));
        assert!(!out.contains("0123456789"));
        assert!(out.contains("open"));
    }

    #[test]
    fn summary_has_breakdowns_only_when_populated() {
        assert!(!summary_tables(&aggregate(&[])).contains("By pair"));

        let trades = vec![
            with_net(closed_trade("USD/JPY", Direction::Long, 10.0, "2024-03-04 12:00"), 1000.0),
            closed_trade("EUR/USD", Direction::Short, -5.0, "2024-03-05 12:00"),
        ];
        let out = summary_tables(&aggregate(&trades));
        assert!(out.contains("By pair"));
        assert!(out.contains("EUR/USD"));
        assert!(out.contains("Monday"));
        assert!(out.contains("By session"));
    }

    #[test]
    fn detail_lists_exit_legs() {
        let t = closed_trade("USD/JPY", Direction::Long, 12.5, "2024-03-04 12:00");
        let out = trade_detail(&t);
        assert!(out.contains("12.5"));
        assert!(out.contains("1h 0m"));
    }

    #[test]
    fn trend_table_marks_months_without_averages() {
        let trades = vec![with_net(
            closed_trade("USD/JPY", Direction::Long, 10.0, "2024-01-15 12:00"),
            3_000.0,
        )];
        let t = crate::trend::monthly_trend(&trades, 2024).unwrap();
        let out = trend_table(&t);
        assert!(out.contains("3m avg"));
        assert!(out.contains("3000"));
        assert!(out.contains("1000"));
    }

    #[test]
    fn calendar_rows_carry_weekday() {
        let trades = vec![with_net(
            closed_trade("USD/JPY", Direction::Long, 10.0, "2024-03-04 12:00"),
            3_000.0,
        )];
        let days = crate::trend::daily_results(&trades, 2024, 3).unwrap();
        let out = calendar_table(&days);
        assert!(out.contains("2024-03-04"));
        assert!(out.contains("Monday"));
    }

    #[test]
    fn capital_tables_show_rates() {
        use crate::capital::{capital_summary, recalculate_balances, CapitalKind};
        let mut ledger = vec![CapitalRecord {
            id: "0123456789abcdef".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            kind: CapitalKind::Deposit,
            amount: 1_000_000.0,
            balance: 0.0,
            note: "initial".into(),
            created_at: None,
        }];
        recalculate_balances(&mut ledger);
        let trades = vec![with_net(
            closed_trade("USD/JPY", Direction::Long, 10.0, "2024-03-04 12:00"),
            50_000.0,
        )];
        let out = capital_tables(&ledger, &capital_summary(&ledger, &aggregate(&trades)));
        assert!(out.contains("01234567"));
        assert!(!out.contains("0123456789"));
        assert!(out.contains("5.00"));
        assert!(out.contains("deposit"));
    }
}
