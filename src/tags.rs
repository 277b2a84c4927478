//! Automatic trade tags: pair, result, weekday, session and move size.

use chrono::Datelike;

use crate::calc::trade_pips;
use crate::session::{session_of, Session};
use crate::types::{TradeRecord, TradeStatus};
use crate::utils::WEEKDAY_NAMES;

const RESULT_TAGS: [&str; 2] = ["win", "loss"];
const MOVE_TAGS: [&str; 3] = ["large-move", "medium-move", "small-move"];

pub fn move_size_tag(pips: f64) -> &'static str {
    let abs = pips.abs();
    if abs > 50.0 {
        "large-move"
    } else if abs > 20.0 {
        "medium-move"
    } else {
        "small-move"
    }
}

/// Tags derived from the trade itself, in a stable order.
pub fn generate_tags(trade: &TradeRecord) -> Vec<String> {
    let mut tags = vec![trade.pair.clone()];

    let pips = trade_pips(trade);
    if trade.status == TradeStatus::Closed {
        if pips > 0.0 {
            tags.push("win".to_string());
        } else if pips < 0.0 {
            tags.push("loss".to_string());
        }
    }

    if let Some(entry) = trade.entry_time {
        tags.push(WEEKDAY_NAMES[entry.weekday().num_days_from_sunday() as usize].to_string());
        tags.push(session_of(entry).tag().to_string());
    }

    tags.push(move_size_tag(pips).to_string());
    tags
}

fn is_auto_tag(tag: &str, pair: &str) -> bool {
    tag == pair
        || RESULT_TAGS.contains(&tag)
        || MOVE_TAGS.contains(&tag)
        || WEEKDAY_NAMES.contains(&tag)
        || Session::ALL.iter().any(|s| s.tag() == tag)
}

/// Replaces previously generated tags, keeping user tags after them.
pub fn refresh_tags(trade: &mut TradeRecord, previous_pair: &str) {
    let user: Vec<String> = trade
        .tags
        .iter()
        .filter(|t| !is_auto_tag(t, previous_pair) && !is_auto_tag(t, &trade.pair))
        .cloned()
        .collect();
    let mut tags = generate_tags(trade);
    for t in user {
        if !tags.contains(&t) {
            tags.push(t);
        }
    }
    trade.tags = tags;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{closed_trade, open_trade};
    use crate::types::Direction;

    #[test]
    fn closed_winner_tags() {
        // exit Wednesday 2024-01-10 16:00, entry 15:00 winter table -> Tokyo
        let t = closed_trade("USD/JPY", Direction::Long, 35.0, "2024-01-10 16:00");
        assert_eq!(
            generate_tags(&t),
            vec!["USD/JPY", "win", "Wednesday", "tokyo-session", "medium-move"]
        );
    }

    #[test]
    fn open_trade_has_no_result_tag() {
        let t = open_trade("EUR/USD", "2024-01-10 22:30");
        assert_eq!(
            generate_tags(&t),
            vec!["EUR/USD", "Wednesday", "newyork-session", "small-move"]
        );
    }

    #[test]
    fn refresh_keeps_user_tags_once() {
        let mut t = closed_trade("USD/JPY", Direction::Long, -60.0, "2024-01-10 16:00");
        t.tags = vec!["USD/JPY".into(), "breakout".into(), "small-move".into()];
        refresh_tags(&mut t, "USD/JPY");
        assert_eq!(
            t.tags,
            vec!["USD/JPY", "loss", "Wednesday", "tokyo-session", "large-move", "breakout"]
        );
    }

    #[test]
    fn move_buckets() {
        assert_eq!(move_size_tag(50.0), "medium-move");
        assert_eq!(move_size_tag(-50.1), "large-move");
        assert_eq!(move_size_tag(20.0), "small-move");
    }
}
