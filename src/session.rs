//! Trading session buckets by entry hour, shifted for U.S. daylight saving.
//!
//! Journal timestamps are the trader's wall clock (JST). New York and London
//! open an hour earlier in local terms while the U.S. is on summer time.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Oceania,
    Tokyo,
    London,
    NewYork,
}

impl Session {
    pub const ALL: [Session; 4] = [
        Session::Oceania,
        Session::Tokyo,
        Session::London,
        Session::NewYork,
    ];

    pub fn index(self) -> usize {
        match self {
            Session::Oceania => 0,
            Session::Tokyo => 1,
            Session::London => 2,
            Session::NewYork => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Session::Oceania => "Oceania",
            Session::Tokyo => "Tokyo",
            Session::London => "London",
            Session::NewYork => "New York",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Session::Oceania => "oceania-session",
            Session::Tokyo => "tokyo-session",
            Session::London => "london-session",
            Session::NewYork => "newyork-session",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTable {
    /// U.S. daylight saving in effect.
    Summer,
    Winter,
}

impl SessionTable {
    pub fn for_date(date: NaiveDate) -> Self {
        if is_us_dst(date) {
            SessionTable::Summer
        } else {
            SessionTable::Winter
        }
    }

    pub fn session_for_hour(self, hour: u32) -> Session {
        let (tokyo_end, london_end) = match self {
            SessionTable::Summer => (15, 21),
            SessionTable::Winter => (16, 22),
        };
        match hour {
            3..=8 => Session::Oceania,
            h if (9..tokyo_end).contains(&h) => Session::Tokyo,
            h if (tokyo_end..london_end).contains(&h) => Session::London,
            _ => Session::NewYork,
        }
    }
}

/// U.S. rule since 2007: second Sunday of March (inclusive) to the first Sunday
/// of November (exclusive), judged on the calendar date.
pub fn is_us_dst(date: NaiveDate) -> bool {
    match date.month() {
        4..=10 => true,
        3 => nth_sunday(date.year(), 3, 2).is_some_and(|start| date >= start),
        11 => nth_sunday(date.year(), 11, 1).is_some_and(|end| date < end),
        _ => false,
    }
}

fn nth_sunday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)
}

pub fn session_of(entry: NaiveDateTime) -> Session {
    SessionTable::for_date(entry.date()).session_for_hour(entry.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::at;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn dst_window_2024() {
        assert!(!is_us_dst(d(2024, 3, 9)));
        assert!(is_us_dst(d(2024, 3, 10)));
        assert!(is_us_dst(d(2024, 7, 1)));
        assert!(is_us_dst(d(2024, 11, 2)));
        assert!(!is_us_dst(d(2024, 11, 3)));
        assert!(!is_us_dst(d(2024, 1, 15)));
        assert!(!is_us_dst(d(2024, 12, 31)));
    }

    #[test]
    fn dst_when_march_starts_on_sunday() {
        // 2026-03-01 is a Sunday, so the switch is on the 8th.
        assert!(!is_us_dst(d(2026, 3, 7)));
        assert!(is_us_dst(d(2026, 3, 8)));
    }

    #[test]
    fn table_switches_on_dst_start_day() {
        let after = at("2024-03-10 03:30");
        let before = at("2024-03-09 03:30");
        assert_eq!(SessionTable::for_date(after.date()), SessionTable::Summer);
        assert_eq!(SessionTable::for_date(before.date()), SessionTable::Winter);
        assert_eq!(session_of(after), Session::Oceania);
        assert_eq!(session_of(before), Session::Oceania);
    }

    #[test]
    fn afternoon_bucket_moves_with_dst() {
        assert_eq!(session_of(at("2024-03-10 15:30")), Session::London);
        assert_eq!(session_of(at("2024-03-09 15:30")), Session::Tokyo);
        assert_eq!(session_of(at("2024-03-10 21:30")), Session::NewYork);
        assert_eq!(session_of(at("2024-03-09 21:30")), Session::London);
    }

    #[test]
    fn small_hours_belong_to_new_york() {
        assert_eq!(session_of(at("2024-01-10 00:15")), Session::NewYork);
        assert_eq!(session_of(at("2024-01-10 02:59")), Session::NewYork);
        assert_eq!(session_of(at("2024-01-10 09:00")), Session::Tokyo);
    }
}
