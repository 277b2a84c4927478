//! Yearly CSV export with a totals row.

use std::io::Write;

use chrono::Datelike;

use crate::types::TradeRecord;

const HEADER: [&str; 11] = [
    "date",
    "pair",
    "direction",
    "lot",
    "entry_price",
    "exit_price",
    "trade_pl",
    "swap",
    "commission",
    "net_pl",
    "memo",
];

/// Year a trade is filed under: final exit, else entry.
fn filing_year(t: &TradeRecord) -> Option<i32> {
    t.last_exit_time().or(t.entry_time).map(|ts| ts.year())
}

fn opt_price(v: Option<f64>) -> String {
    v.map(|p| format!("{p}")).unwrap_or_default()
}

/// Writes every trade filed under `year`; returns the number of trade rows.
pub fn export_year<W: Write>(trades: &[TradeRecord], year: i32, out: W) -> anyhow::Result<usize> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(HEADER)?;

    let mut totals = [0.0f64; 4];
    let mut rows = 0usize;
    for t in trades.iter().filter(|t| filing_year(t) == Some(year)) {
        let date = t
            .last_exit_time()
            .or(t.entry_time)
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let pl = t.profit_loss.unwrap_or_default();
        totals[0] += pl.trade_profit_loss;
        totals[1] += pl.swap;
        totals[2] += pl.commission;
        totals[3] += pl.net_profit;

        w.write_record([
            date,
            t.pair.clone(),
            t.direction.as_str().to_string(),
            format!("{}", t.lot_size),
            format!("{}", t.entry_price),
            opt_price(t.avg_exit_price()),
            format!("{}", pl.trade_profit_loss),
            format!("{}", pl.swap),
            format!("{}", pl.commission),
            format!("{}", pl.net_profit),
            t.memo.clone(),
        ])?;
        rows += 1;
    }

    // The blank separator still needs a full-width record for csv's length check.
    w.write_record([""; 11])?;
    let mut total_row = vec!["total".to_string()];
    total_row.extend(std::iter::repeat(String::new()).take(5));
    total_row.extend(totals.iter().map(|v| format!("{v}")));
    total_row.push(String::new());
    w.write_record(&total_row)?;
    w.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{closed_trade, open_trade, with_net};
    use crate::types::Direction;

    #[test]
    fn rows_and_totals_for_one_year() {
        let mut a = with_net(closed_trade("USD/JPY", Direction::Long, 10.0, "2024-03-01 12:00"), 1000.0);
        a.memo = "trend, pullback".into();
        let b = with_net(closed_trade("EUR/USD", Direction::Short, -5.0, "2024-07-01 12:00"), -400.0);
        let other_year = closed_trade("EUR/USD", Direction::Short, -5.0, "2023-07-01 12:00");
        let open = open_trade("GBP/JPY", "2024-08-01 09:00");

        let mut buf = Vec::new();
        let n = export_year(&[a, b, other_year, open], 2024, &mut buf).unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert!(lines[1].starts_with("2024-03-01 12:00,USD/JPY,long,1,150,0,"));
        assert!(lines[1].ends_with("\"trend, pullback\""));
        assert_eq!(lines.last().copied(), Some("total,,,,,,600,0,0,600,"));
    }
}
