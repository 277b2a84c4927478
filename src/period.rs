//! Calendar report periods and the last-exit period filter.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::types::TradeRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    /// Arbitrary inclusive date range.
    Custom,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Weekly => "weekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Quarterly => "quarterly",
            PeriodKind::Yearly => "yearly",
            PeriodKind::Custom => "custom",
        }
    }
}

/// A validated period with half-open bounds `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub kind: PeriodKind,
    pub year: i32,
    /// ISO week, month or quarter number; always 1 for yearly periods.
    pub index: u32,
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(kind: PeriodKind, year: i32, index: u32) -> Result<Self> {
        let invalid = || JournalError::InvalidPeriod {
            kind: kind.as_str(),
            year,
            index,
        };
        let (index, start, end) = match kind {
            PeriodKind::Weekly => {
                let start =
                    NaiveDate::from_isoywd_opt(year, index, Weekday::Mon).ok_or_else(invalid)?;
                (index, start, start + Duration::days(7))
            }
            PeriodKind::Monthly => {
                let start = NaiveDate::from_ymd_opt(year, index, 1).ok_or_else(invalid)?;
                (index, start, first_of_month_after(year, index, 1).ok_or_else(invalid)?)
            }
            PeriodKind::Quarterly => {
                if !(1..=4).contains(&index) {
                    return Err(invalid());
                }
                let month = (index - 1) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                (index, start, first_of_month_after(year, month, 3).ok_or_else(invalid)?)
            }
            PeriodKind::Yearly => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(invalid)?;
                (1, start, end)
            }
            PeriodKind::Custom => return Err(invalid()),
        };
        Ok(Self {
            kind,
            year,
            index,
            start,
            end,
        })
    }

    /// The period of `kind` that contains `at`. Weekly periods use the ISO year,
    /// which differs from the calendar year around New Year.
    pub fn containing(kind: PeriodKind, at: NaiveDateTime) -> Result<Self> {
        let date = at.date();
        match kind {
            PeriodKind::Weekly => Self::new(kind, date.iso_week().year(), iso_week(date)),
            PeriodKind::Monthly => Self::new(kind, date.year(), date.month()),
            PeriodKind::Quarterly => Self::new(kind, date.year(), (date.month() - 1) / 3 + 1),
            PeriodKind::Yearly => Self::new(kind, date.year(), 1),
            PeriodKind::Custom => Self::range(date, date),
        }
    }

    /// Every day from `first` through `last`, both inclusive.
    pub fn range(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let end = last
            .succ_opt()
            .filter(|_| first <= last)
            .ok_or(JournalError::InvalidRange {
                start: first,
                end: last,
            })?;
        Ok(Self {
            kind: PeriodKind::Custom,
            year: first.year(),
            index: 0,
            start: first,
            end,
        })
    }

    /// Year an index-only period request refers to. Week numbers belong to the
    /// ISO year, which differs from the calendar year around New Year.
    pub fn default_year(kind: PeriodKind, at: NaiveDateTime) -> i32 {
        match kind {
            PeriodKind::Weekly => at.date().iso_week().year(),
            _ => at.year(),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start.and_hms_opt(0, 0, 0).unwrap_or_default()
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end.and_hms_opt(0, 0, 0).unwrap_or_default()
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start() && t < self.end()
    }

    pub fn label(&self) -> String {
        match self.kind {
            PeriodKind::Weekly => {
                let last = self.end - Duration::days(1);
                format!(
                    "{} W{:02} ({} - {})",
                    self.year,
                    self.index,
                    self.start.format("%m/%d"),
                    last.format("%m/%d")
                )
            }
            PeriodKind::Monthly => format!("{}-{:02}", self.year, self.index),
            PeriodKind::Quarterly => format!("{} Q{}", self.year, self.index),
            PeriodKind::Yearly => format!("{}", self.year),
            PeriodKind::Custom => {
                let last = self.end - Duration::days(1);
                format!("{} - {}", self.start, last)
            }
        }
    }
}

fn first_of_month_after(year: i32, month: u32, months: u32) -> Option<NaiveDate> {
    let zero_based = month - 1 + months;
    NaiveDate::from_ymd_opt(year + (zero_based / 12) as i32, zero_based % 12 + 1, 1)
}

/// ISO 8601 week number (week 1 holds the year's first Thursday).
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Trades whose final exit falls inside `period`. Open trades and trades
/// without a final exit time never match.
pub fn filter_by_period(trades: &[TradeRecord], period: &Period) -> Vec<TradeRecord> {
    trades
        .iter()
        .filter(|t| t.last_exit_time().is_some_and(|ts| period.contains(ts)))
        .cloned()
        .collect()
}
