//! Deposit and withdrawal ledger, and account-level return figures.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::stats::StatisticsSummary;
use crate::utils::{ratio_or_zero, round_to};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapitalKind {
    Deposit,
    Withdrawal,
}

impl CapitalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapitalKind::Deposit => "deposit",
            CapitalKind::Withdrawal => "withdrawal",
        }
    }

    fn signed(self, amount: f64) -> f64 {
        match self {
            CapitalKind::Deposit => amount,
            CapitalKind::Withdrawal => -amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapitalRecord {
    pub id: String,
    pub date: NaiveDate,
    pub kind: CapitalKind,
    /// Always positive; the direction comes from `kind`.
    pub amount: f64,
    /// Invested capital after this record, in date order.
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Sorts by date (stable) and rewrites every running balance.
pub fn recalculate_balances(records: &mut [CapitalRecord]) {
    records.sort_by_key(|r| r.date);
    let mut balance = 0.0;
    for r in records.iter_mut() {
        balance += r.kind.signed(r.amount);
        r.balance = balance;
    }
}

/// Balance after the latest record; 0 for an empty ledger.
pub fn current_balance(records: &[CapitalRecord]) -> f64 {
    records
        .iter()
        .max_by_key(|r| r.date)
        .map(|r| r.balance)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapitalSummary {
    pub deposits: f64,
    pub withdrawals: f64,
    pub balance: f64,
    /// Registered net result over closed trades.
    pub net_profit: f64,
    /// `net_profit / balance` in percent.
    pub profit_rate: f64,
    /// Currency max drawdown relative to the invested balance, in percent.
    pub drawdown_pct: f64,
}

/// Account-level figures; the rates are 0 while no capital is invested.
pub fn capital_summary(records: &[CapitalRecord], stats: &StatisticsSummary) -> CapitalSummary {
    let (deposits, withdrawals) = records.iter().fold((0.0, 0.0), |(d, w), r| match r.kind {
        CapitalKind::Deposit => (d + r.amount, w),
        CapitalKind::Withdrawal => (d, w + r.amount),
    });
    let balance = current_balance(records);
    let net_profit = stats.currency.net;
    let positive = if balance > 0.0 { balance } else { 0.0 };
    CapitalSummary {
        deposits,
        withdrawals,
        balance,
        net_profit,
        profit_rate: round_to(ratio_or_zero(net_profit, positive) * 100.0, 2),
        drawdown_pct: round_to(ratio_or_zero(stats.currency.max_drawdown, positive) * 100.0, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;
    use crate::testutil::{closed_trade, with_net};
    use crate::types::Direction;

    fn rec(date: &str, kind: CapitalKind, amount: f64) -> CapitalRecord {
        CapitalRecord {
            id: date.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kind,
            amount,
            balance: 0.0,
            note: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn balances_follow_date_order_not_insert_order() {
        let mut ledger = vec![
            rec("2024-03-01", CapitalKind::Withdrawal, 100_000.0),
            rec("2024-01-01", CapitalKind::Deposit, 1_000_000.0),
            rec("2024-02-01", CapitalKind::Deposit, 500_000.0),
        ];
        recalculate_balances(&mut ledger);
        let balances: Vec<f64> = ledger.iter().map(|r| r.balance).collect();
        assert_eq!(balances, vec![1_000_000.0, 1_500_000.0, 1_400_000.0]);
        assert_eq!(current_balance(&ledger), 1_400_000.0);
        assert_eq!(current_balance(&[]), 0.0);
    }

    #[test]
    fn profit_rate_and_drawdown_against_capital() {
        let mut ledger = vec![rec("2024-01-01", CapitalKind::Deposit, 1_000_000.0)];
        recalculate_balances(&mut ledger);
        let trades = vec![
            with_net(closed_trade("USD/JPY", Direction::Long, 20.0, "2024-05-01 12:00"), 80_000.0),
            with_net(closed_trade("USD/JPY", Direction::Long, -10.0, "2024-05-02 12:00"), -30_000.0),
        ];
        let s = capital_summary(&ledger, &aggregate(&trades));
        assert_eq!(s.balance, 1_000_000.0);
        assert_eq!(s.net_profit, 50_000.0);
        assert_eq!(s.profit_rate, 5.0);
        assert_eq!(s.drawdown_pct, 3.0);
    }

    #[test]
    fn empty_ledger_has_zero_rates() {
        let trades = vec![with_net(
            closed_trade("USD/JPY", Direction::Long, 20.0, "2024-05-01 12:00"),
            80_000.0,
        )];
        let s = capital_summary(&[], &aggregate(&trades));
        assert_eq!(s.profit_rate, 0.0);
        assert_eq!(s.drawdown_pct, 0.0);
        assert_eq!(s.net_profit, 80_000.0);
    }
}
