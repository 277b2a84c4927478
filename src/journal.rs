//! Persisted trade journal. A single JSON document holding every trade.

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calc::{calculate_pips, remaining_lot};
use crate::capital::{current_balance, recalculate_balances, CapitalKind, CapitalRecord};
use crate::error::{JournalError, Result};
use crate::risk::RiskEngine;
use crate::tags::refresh_tags;
use crate::types::{ExitLeg, NewTrade, ProfitLoss, TradeRecord, TradeStatus, TradeUpdate};
use crate::validate::{check_entry, check_exit, check_exits_fit, LOT_EPSILON};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Journal {
    /// Trades in insertion order.
    pub trades: Vec<TradeRecord>,
    /// Deposits and withdrawals in date order.
    #[serde(default)]
    pub capital: Vec<CapitalRecord>,
}

/// Older exports stored the bare trade array.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Journal(Journal),
    Trades(Vec<TradeRecord>),
}

fn derive_status(trade: &TradeRecord) -> TradeStatus {
    if trade.exits.is_empty() {
        TradeStatus::Open
    } else if remaining_lot(trade) > LOT_EPSILON {
        TradeStatus::Partial
    } else {
        TradeStatus::Closed
    }
}

impl Journal {
    /// Reads the journal at `path`. A missing file yields an empty journal; a file
    /// that exists but cannot be read or parsed is an error, so nothing is saved
    /// over it.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("No journal at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("read journal {}", path.display()))?;
        let parsed: OnDisk = serde_json::from_str(&s)
            .with_context(|| format!("parse journal {}", path.display()))?;
        let mut journal = match parsed {
            OnDisk::Journal(j) => j,
            OnDisk::Trades(trades) => Self {
                trades,
                ..Default::default()
            },
        };
        // Older files carry no status field.
        for t in &mut journal.trades {
            t.status = derive_status(t);
        }
        recalculate_balances(&mut journal.capital);
        Ok(journal)
    }

    /// Writes to a sibling temp file and renames it over `path`, so an interrupted
    /// save never leaves a truncated journal.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file_name = path
            .file_name()
            .with_context(|| format!("journal path {} has no file name", path.display()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let s = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, s).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replace {} with {}", path.display(), tmp.display()))?;
        debug!("Saved {} trades to {}", self.trades.len(), path.display());
        Ok(())
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter().filter(|t| t.status != TradeStatus::Closed)
    }

    /// Index of the trade whose id equals `id` or uniquely starts with it.
    fn position(&self, id: &str) -> Result<usize> {
        if let Some(i) = self.trades.iter().position(|t| t.id == id) {
            return Ok(i);
        }
        let mut hits = self
            .trades
            .iter()
            .enumerate()
            .filter(|(_, t)| !id.is_empty() && t.id.starts_with(id));
        match (hits.next(), hits.next()) {
            (Some((i, _)), None) => Ok(i),
            _ => Err(JournalError::NotFound(id.to_string())),
        }
    }

    pub fn get(&self, id: &str) -> Result<&TradeRecord> {
        self.position(id).map(|i| &self.trades[i])
    }

    pub fn add_trade(
        &mut self,
        new: NewTrade,
        risk: &RiskEngine,
        now: NaiveDateTime,
    ) -> Result<&TradeRecord> {
        let snapshot = risk.pre_check(&new);
        let mut trade = TradeRecord {
            id: Uuid::new_v4().to_string(),
            pair: new.pair,
            direction: new.direction,
            entry_time: new.entry_time,
            entry_price: new.entry_price,
            lot_size: new.lot_size,
            stop_loss: new.stop_loss,
            take_profit: new.take_profit,
            exits: Vec::new(),
            profit_loss: None,
            reasons: new.reasons,
            scenario: new.scenario,
            entry_emotion: new.entry_emotion,
            reflection: String::new(),
            memo: new.memo,
            tags: new.tags,
            method_id: new.method_id,
            risk: snapshot,
            broker: new.broker,
            status: TradeStatus::Open,
            created_at: Some(now),
            updated_at: Some(now),
        };
        check_entry(&trade)?;
        let pair = trade.pair.clone();
        refresh_tags(&mut trade, &pair);

        info!(
            "Added {} {} {:.2} @ {} (id={})",
            trade.direction.as_str(),
            trade.pair,
            trade.lot_size,
            trade.entry_price,
            trade.id
        );
        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn update_trade(
        &mut self,
        id: &str,
        update: TradeUpdate,
        now: NaiveDateTime,
    ) -> Result<&TradeRecord> {
        let i = self.position(id)?;
        let before = &self.trades[i];
        let mut t = before.clone();
        let previous_pair = t.pair.clone();

        if let Some(v) = update.pair {
            t.pair = v;
        }
        if let Some(v) = update.direction {
            t.direction = v;
        }
        if let Some(v) = update.entry_time {
            t.entry_time = Some(v);
        }
        if let Some(v) = update.entry_price {
            t.entry_price = v;
        }
        if let Some(v) = update.lot_size {
            t.lot_size = v;
        }
        if let Some(v) = update.stop_loss {
            t.stop_loss = Some(v);
        }
        if let Some(v) = update.take_profit {
            t.take_profit = Some(v);
        }
        if let Some(v) = update.scenario {
            t.scenario = v;
        }
        if let Some(v) = update.entry_emotion {
            t.entry_emotion = v;
        }
        if let Some(v) = update.reflection {
            t.reflection = v;
        }
        if let Some(v) = update.memo {
            t.memo = v;
        }
        if let Some(v) = update.method_id {
            t.method_id = Some(v);
        }
        if let Some(v) = update.broker {
            t.broker = Some(v);
        }

        check_entry(&t)?;
        check_exits_fit(&t)?;
        // Only an edited entry leg invalidates recorded pips; note edits keep overrides.
        let entry_changed = t.pair != previous_pair
            || t.direction != before.direction
            || t.entry_price != before.entry_price;
        if entry_changed {
            for e in &mut t.exits {
                e.pips = Some(calculate_pips(&t.pair, t.direction, t.entry_price, e.price));
            }
        }
        t.status = derive_status(&t);
        t.updated_at = Some(now);
        refresh_tags(&mut t, &previous_pair);

        info!("Updated trade {}", t.id);
        self.trades[i] = t;
        Ok(&self.trades[i])
    }

    /// Records a (partial) exit; the pip result is fixed at this point.
    pub fn add_exit(&mut self, id: &str, mut exit: ExitLeg, now: NaiveDateTime) -> Result<&TradeRecord> {
        let i = self.position(id)?;
        let t = &mut self.trades[i];
        check_exit(t, &exit)?;
        if exit.pips.is_none() {
            exit.pips = Some(calculate_pips(&t.pair, t.direction, t.entry_price, exit.price));
        }
        t.exits.push(exit);
        t.status = derive_status(t);
        t.updated_at = Some(now);
        let pair = t.pair.clone();
        refresh_tags(t, &pair);

        info!(
            "Exit on {} {}: status={} remaining={:.2}",
            t.pair,
            t.id,
            t.status.as_str(),
            remaining_lot(t)
        );
        Ok(&self.trades[i])
    }

    pub fn remove_exit(&mut self, id: &str, index: usize, now: NaiveDateTime) -> Result<&TradeRecord> {
        let i = self.position(id)?;
        let t = &mut self.trades[i];
        if index >= t.exits.len() {
            return Err(JournalError::ExitNotFound {
                id: t.id.clone(),
                index,
            });
        }
        t.exits.remove(index);
        t.status = derive_status(t);
        t.updated_at = Some(now);
        let pair = t.pair.clone();
        refresh_tags(t, &pair);
        Ok(&self.trades[i])
    }

    /// Registers (or with `None`, clears) the account-currency result.
    pub fn set_profit_loss(
        &mut self,
        id: &str,
        pl: Option<ProfitLoss>,
        now: NaiveDateTime,
    ) -> Result<&TradeRecord> {
        let i = self.position(id)?;
        let t = &mut self.trades[i];
        t.profit_loss = pl;
        t.updated_at = Some(now);
        Ok(&self.trades[i])
    }

    pub fn delete_trade(&mut self, id: &str) -> Result<TradeRecord> {
        let i = self.position(id)?;
        let removed = self.trades.remove(i);
        info!("Deleted trade {} ({})", removed.id, removed.pair);
        Ok(removed)
    }

    pub fn capital_records(&self) -> &[CapitalRecord] {
        &self.capital
    }

    pub fn capital_balance(&self) -> f64 {
        current_balance(&self.capital)
    }

    /// Records a deposit or withdrawal. A withdrawal may not exceed the balance.
    pub fn add_capital(
        &mut self,
        kind: CapitalKind,
        date: NaiveDate,
        amount: f64,
        note: String,
        now: NaiveDateTime,
    ) -> Result<&CapitalRecord> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(JournalError::InvalidAmount(amount));
        }
        let balance = self.capital_balance();
        if kind == CapitalKind::Withdrawal && amount > balance {
            return Err(JournalError::WithdrawalExceedsBalance { amount, balance });
        }
        let id = Uuid::new_v4().to_string();
        self.capital.push(CapitalRecord {
            id: id.clone(),
            date,
            kind,
            amount,
            balance: 0.0,
            note,
            created_at: Some(now),
        });
        recalculate_balances(&mut self.capital);
        info!(
            "Capital {} {} on {}; balance {}",
            kind.as_str(),
            amount,
            date,
            self.capital_balance()
        );
        let i = self
            .capital
            .iter()
            .position(|r| r.id == id)
            .ok_or(JournalError::NotFound(id))?;
        Ok(&self.capital[i])
    }

    pub fn delete_capital(&mut self, id: &str) -> Result<CapitalRecord> {
        let i = self
            .capital
            .iter()
            .position(|r| r.id == id || (!id.is_empty() && r.id.starts_with(id)))
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        let removed = self.capital.remove(i);
        recalculate_balances(&mut self.capital);
        info!("Deleted capital record {}", removed.id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskCfg;
    use crate::testutil::{at, exit_at};
    use crate::types::Direction;

    fn no_risk() -> RiskEngine {
        RiskEngine::new(&RiskCfg::default())
    }

    fn usdjpy_long() -> NewTrade {
        NewTrade {
            pair: "USD/JPY".into(),
            direction: Direction::Long,
            entry_time: Some(at("2024-01-10 10:00")),
            entry_price: 150.00,
            lot_size: 1.0,
            stop_loss: Some(149.50),
            take_profit: Some(151.00),
            tags: vec!["breakout".into()],
            ..Default::default()
        }
    }

    fn journal_with_one() -> (Journal, String) {
        let mut j = Journal::default();
        let id = j
            .add_trade(usdjpy_long(), &no_risk(), at("2024-01-10 10:00"))
            .unwrap()
            .id
            .clone();
        (j, id)
    }

    #[test]
    fn new_trade_is_open_and_tagged() {
        let (j, id) = journal_with_one();
        let t = j.get(&id).unwrap();
        assert_eq!(t.status, TradeStatus::Open);
        assert!(t.tags.contains(&"USD/JPY".to_string()));
        assert!(t.tags.contains(&"breakout".to_string()));
        assert_eq!(j.open_positions().count(), 1);
    }

    #[test]
    fn invalid_entry_rejected() {
        let mut j = Journal::default();
        let mut bad = usdjpy_long();
        bad.stop_loss = Some(150.5);
        assert!(matches!(
            j.add_trade(bad, &no_risk(), at("2024-01-10 10:00")),
            Err(JournalError::PriceLogic(_))
        ));
        assert!(j.trades().is_empty());
    }

    #[test]
    fn status_transitions_open_partial_closed() {
        let (mut j, id) = journal_with_one();
        let now = at("2024-01-10 12:00");

        let t = j.add_exit(&id, exit_at("2024-01-10 11:00", 150.20, 0.4), now).unwrap();
        assert_eq!(t.status, TradeStatus::Partial);
        assert_eq!(t.exits[0].pips, Some(20.0));

        let t = j.add_exit(&id, exit_at("2024-01-10 11:30", 149.90, 0.6), now).unwrap();
        assert_eq!(t.status, TradeStatus::Closed);
        assert!(t.tags.contains(&"win".to_string()));
        assert_eq!(j.open_positions().count(), 0);

        let err = j.add_exit(&id, exit_at("2024-01-10 11:45", 150.0, 0.1), now);
        assert!(matches!(err, Err(JournalError::ExitLotExceeds { .. })));

        let t = j.remove_exit(&id, 1, now).unwrap();
        assert_eq!(t.status, TradeStatus::Partial);
    }

    #[test]
    fn editing_entry_price_recomputes_exit_pips() {
        let (mut j, id) = journal_with_one();
        let now = at("2024-01-10 12:00");
        j.add_exit(&id, exit_at("2024-01-10 11:00", 150.20, 1.0), now).unwrap();
        let t = j
            .update_trade(
                &id,
                TradeUpdate {
                    entry_price: Some(150.10),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(t.exits[0].pips, Some(10.0));

        let shrink = TradeUpdate {
            lot_size: Some(0.5),
            ..Default::default()
        };
        assert!(j.update_trade(&id, shrink, now).is_err());
    }

    #[test]
    fn ids_resolve_by_unique_prefix() {
        let (mut j, id) = journal_with_one();
        assert_eq!(j.get(&id[..8]).unwrap().id, id);
        assert!(matches!(j.get("zzz"), Err(JournalError::NotFound(_))));
        let removed = j.delete_trade(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(j.trades().is_empty());
    }

    #[test]
    fn profit_loss_registration() {
        let (mut j, id) = journal_with_one();
        let now = at("2024-01-10 12:00");
        let pl = ProfitLoss::from_parts(2_000.0, 50.0, 30.0);
        let t = j.set_profit_loss(&id, Some(pl), now).unwrap();
        assert_eq!(t.profit_loss.unwrap().net_profit, 2_020.0);
        assert_eq!(t.profit_loss.unwrap().commission, -30.0);
    }

    #[test]
    fn save_and_reload_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.json");
        let (mut j, id) = journal_with_one();
        j.add_exit(&id, exit_at("2024-01-10 11:00", 150.20, 1.0), at("2024-01-10 12:00"))
            .unwrap();
        j.save(&path).unwrap();

        let loaded = Journal::load(&path).unwrap();
        assert!(!dir.path().join("nested").join("journal.json.tmp").exists());
        assert_eq!(loaded.trades().len(), 1);
        let t = &loaded.trades()[0];
        assert_eq!(t.id, id);
        assert_eq!(t.status, TradeStatus::Closed);
        assert_eq!(t.exits[0].pips, Some(20.0));
        assert_eq!(t.entry_time, Some(at("2024-01-10 10:00")));
        assert_eq!(t.tags, j.trades()[0].tags);
    }

    #[test]
    fn bare_array_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy.json");
        fs::write(
            &legacy,
            r#"[{"id":"a1","pair":"EUR/USD","direction":"sell","entry_price":1.1,"lot_size":1.0,
                "exits":[{"time":"2024-01-10T11:00:00","price":1.095,"lot":1.0}]}]"#,
        )
        .unwrap();
        let j = Journal::load(&legacy).unwrap();
        assert_eq!(j.trades().len(), 1);
        assert_eq!(j.trades()[0].direction, Direction::Short);
        assert_eq!(j.trades()[0].status, TradeStatus::Closed);
        assert!(j.trades()[0].profit_loss.is_none());
        assert!(j.capital_records().is_empty());

        assert!(Journal::load(&dir.path().join("missing.json")).unwrap().trades().is_empty());
    }

    #[test]
    fn unreadable_file_is_an_error_and_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let truncated = r#"{"trades":[{"id":"keep-me","pair":"USD/JPY","direction":"long""#;
        fs::write(&path, truncated).unwrap();

        assert!(Journal::load(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), truncated);
    }

    #[test]
    fn note_edit_keeps_recorded_pips() {
        let (mut j, id) = journal_with_one();
        let now = at("2024-01-10 12:00");
        let mut leg = exit_at("2024-01-10 11:00", 150.20, 1.0);
        leg.pips = Some(18.5);
        j.add_exit(&id, leg, now).unwrap();

        let memo_only = TradeUpdate {
            memo: Some("spread widened".into()),
            reflection: Some("exited early".into()),
            ..Default::default()
        };
        let t = j.update_trade(&id, memo_only, now).unwrap();
        assert_eq!(t.exits[0].pips, Some(18.5));

        let reprice = TradeUpdate {
            entry_price: Some(150.10),
            ..Default::default()
        };
        let t = j.update_trade(&id, reprice, now).unwrap();
        assert_eq!(t.exits[0].pips, Some(10.0));
    }

    #[test]
    fn out_of_order_exit_rejected() {
        let (mut j, id) = journal_with_one();
        let now = at("2024-01-10 13:00");
        j.add_exit(&id, exit_at("2024-01-10 12:00", 150.20, 0.5), now).unwrap();
        let err = j.add_exit(&id, exit_at("2024-01-10 11:00", 150.30, 0.5), now);
        assert!(matches!(err, Err(JournalError::ExitOutOfOrder { .. })));
        assert_eq!(j.get(&id).unwrap().exits.len(), 1);
    }

    #[test]
    fn capital_ledger_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let now = at("2024-01-10 12:00");
        let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        let mut j = Journal::default();
        j.add_capital(CapitalKind::Deposit, day("2024-01-05"), 500_000.0, String::new(), now)
            .unwrap();
        let over = j.add_capital(CapitalKind::Withdrawal, day("2024-02-01"), 600_000.0, String::new(), now);
        assert!(matches!(over, Err(JournalError::WithdrawalExceedsBalance { .. })));
        assert_eq!(
            j.add_capital(CapitalKind::Deposit, day("2024-02-01"), -1.0, String::new(), now),
            Err(JournalError::InvalidAmount(-1.0))
        );
        let w = j
            .add_capital(CapitalKind::Withdrawal, day("2024-02-01"), 100_000.0, "fees".into(), now)
            .unwrap();
        assert_eq!(w.balance, 400_000.0);
        let w_id = w.id.clone();

        j.save(&path).unwrap();
        let mut loaded = Journal::load(&path).unwrap();
        assert_eq!(loaded.capital_balance(), 400_000.0);
        loaded.delete_capital(&w_id).unwrap();
        assert_eq!(loaded.capital_balance(), 500_000.0);
    }
}
