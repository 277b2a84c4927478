//! Builders shared by unit tests.

use chrono::{Duration, NaiveDateTime};

use crate::types::{Direction, ExitLeg, ProfitLoss, TradeRecord, TradeStatus};

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("test timestamp")
}

pub fn exit_at(time: &str, price: f64, lot: f64) -> ExitLeg {
    ExitLeg {
        time: Some(at(time)),
        price,
        lot,
        pips: None,
    }
}

pub fn open_trade(pair: &str, entry: &str) -> TradeRecord {
    TradeRecord {
        id: format!("{pair}-{entry}"),
        pair: pair.to_string(),
        direction: Direction::Long,
        entry_time: Some(at(entry)),
        entry_price: 150.0,
        lot_size: 1.0,
        stop_loss: None,
        take_profit: None,
        exits: Vec::new(),
        profit_loss: None,
        reasons: Vec::new(),
        scenario: String::new(),
        entry_emotion: String::new(),
        reflection: String::new(),
        memo: String::new(),
        tags: Vec::new(),
        method_id: None,
        risk: None,
        broker: None,
        status: TradeStatus::Open,
        created_at: None,
        updated_at: None,
    }
}

/// Fully closed one-lot trade with a recorded pip result, entered one hour
/// before `exit`.
pub fn closed_trade(pair: &str, direction: Direction, pips: f64, exit: &str) -> TradeRecord {
    let exit_time = at(exit);
    let entry_time = exit_time - Duration::hours(1);
    let mut t = open_trade(pair, &entry_time.format("%Y-%m-%d %H:%M").to_string());
    t.id = format!("{pair}-{exit}");
    t.direction = direction;
    t.exits = vec![ExitLeg {
        time: Some(exit_time),
        price: 0.0,
        lot: 1.0,
        pips: Some(pips),
    }];
    t.status = TradeStatus::Closed;
    t
}

pub fn with_net(mut t: TradeRecord, net: f64) -> TradeRecord {
    t.profit_loss = Some(ProfitLoss {
        trade_profit_loss: net,
        swap: 0.0,
        commission: 0.0,
        net_profit: net,
    });
    t
}
