//! Parse user input: currency pairs, timestamps and directions.
//! Accepted pairs: "USD/JPY", "usdjpy", "USD-JPY", "usd_jpy".

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{JournalError, Result};
use crate::types::Direction;
use crate::utils::sanitize_symbol;

fn pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z]{3})\s*[/\-_ ]?\s*([A-Z]{3})$").expect("pair regex compiles")
    })
}

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$")
            .expect("timestamp regex compiles")
    })
}

/// Normalises a pair to `BASE/QUOTE` upper case.
pub fn parse_pair(text: &str) -> Result<String> {
    let t = sanitize_symbol(text);
    let c = pair_re()
        .captures(&t)
        .ok_or_else(|| JournalError::InvalidPair(text.trim().to_string()))?;
    if c[1] == c[2] {
        return Err(JournalError::InvalidPair(text.trim().to_string()));
    }
    Ok(format!("{}/{}", &c[1], &c[2]))
}

/// `2024-03-10 03:30`, `2024/03/10 03:30`, `2024-03-10T03:30:15` or a bare date
/// (midnight).
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let t = text.trim();
    let invalid = || JournalError::InvalidTimestamp(t.to_string());
    let c = timestamp_re().captures(t).ok_or_else(invalid)?;

    // Absent optional groups (time, seconds) read as zero.
    let num = |i: usize| -> Option<u32> {
        c.get(i)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))
    };
    let year: i32 = c[1].parse().map_err(|_| invalid())?;
    let (month, day) = (num(2).ok_or_else(invalid)?, num(3).ok_or_else(invalid)?);
    let (hour, min, sec) = (
        num(4).ok_or_else(invalid)?,
        num(5).ok_or_else(invalid)?,
        num(6).ok_or_else(invalid)?,
    );

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .ok_or_else(invalid)
}

pub fn parse_direction(text: &str) -> Result<Direction> {
    match text.trim().to_ascii_lowercase().as_str() {
        "long" | "buy" | "l" | "b" => Ok(Direction::Long),
        "short" | "sell" | "s" => Ok(Direction::Short),
        _ => Err(JournalError::InvalidDirection(text.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::at;

    // ---------- pairs ----------

    #[test]
    fn pair_variants_normalise() {
        assert_eq!(parse_pair("USD/JPY").unwrap(), "USD/JPY");
        assert_eq!(parse_pair(" usdjpy ").unwrap(), "USD/JPY");
        assert_eq!(parse_pair("eur-usd").unwrap(), "EUR/USD");
        assert_eq!(parse_pair("gbp_jpy").unwrap(), "GBP/JPY");
    }

    #[test]
    fn bad_pairs_rejected() {
        assert!(parse_pair("").is_err());
        assert!(parse_pair("USDJP").is_err());
        assert!(parse_pair("USD/USD").is_err());
        assert!(parse_pair("BTC/USDT").is_err());
    }

    // ---------- timestamps ----------

    #[test]
    fn timestamp_formats() {
        assert_eq!(parse_timestamp("2024-03-10 03:30").unwrap(), at("2024-03-10 03:30"));
        assert_eq!(parse_timestamp("2024/03/10 03:30").unwrap(), at("2024-03-10 03:30"));
        assert_eq!(parse_timestamp("2024-3-9T7:05").unwrap(), at("2024-03-09 07:05"));
        assert_eq!(parse_timestamp("2024-03-10").unwrap(), at("2024-03-10 00:00"));
        assert_eq!(
            parse_timestamp("2024-03-10T03:30:15").unwrap().format("%S").to_string(),
            "15"
        );
    }

    #[test]
    fn impossible_dates_rejected() {
        assert!(parse_timestamp("2024-02-30 10:00").is_err());
        assert!(parse_timestamp("2024-01-01 24:00").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }

    // ---------- directions ----------

    #[test]
    fn direction_aliases() {
        assert_eq!(parse_direction("BUY").unwrap(), Direction::Long);
        assert_eq!(parse_direction("short").unwrap(), Direction::Short);
        assert!(parse_direction("flat").is_err());
    }
}
