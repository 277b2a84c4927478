//! Entry point. Wires CLI -> Journal -> Stats -> tables.

mod calc;
mod capital;
mod config;
mod error;
mod export;
mod journal;
mod parser;
mod period;
mod report;
mod risk;
mod session;
mod stats;
mod tags;
mod trend;
mod types;
mod utils;
mod validate;

#[cfg(test)]
mod testutil;

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use std::{fs::File, io, path::PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::calc::remaining_lot;
use crate::capital::CapitalKind;
use crate::journal::Journal;
use crate::parser::{parse_direction, parse_pair, parse_timestamp};
use crate::period::{filter_by_period, Period, PeriodKind};
use crate::types::{ExitLeg, NewTrade, ProfitLoss, TradeUpdate};

/// FX trade journal with pip and account-currency statistics.
#[derive(Parser, Debug)]
#[command(name = "journal")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (falls back to $JOURNAL_CONFIG, then config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new entry
    Add(AddArgs),
    /// Record a full or partial exit
    Exit(ExitArgs),
    /// Edit entry fields or notes
    Edit(EditArgs),
    /// Register the account-currency result
    Pl(PlArgs),
    /// Delete a trade
    Delete { id: String },
    /// List trades
    List {
        /// Only open and partially closed positions
        #[arg(long)]
        open: bool,
    },
    /// Show one trade in full
    Show { id: String },
    /// Statistics over the whole journal
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Statistics for one calendar period
    Report(ReportArgs),
    /// Deposits, withdrawals and return on capital
    Capital {
        #[command(subcommand)]
        action: CapitalAction,
    },
    /// Month-by-month net result with moving averages
    Trend {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Day-by-day results of one month
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Yearly CSV export
    Export {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum CapitalAction {
    /// Add funds to the account
    Deposit(CapitalArgs),
    /// Take funds out of the account
    Withdraw(CapitalArgs),
    /// Delete a ledger record
    Delete { id: String },
    /// Ledger with balance and return figures
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
struct CapitalArgs {
    #[arg(long)]
    amount: f64,
    /// YYYY-MM-DD; defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Parser, Debug)]
struct AddArgs {
    /// Currency pair, e.g. USD/JPY or usdjpy
    #[arg(long)]
    pair: String,
    /// long|short (buy|sell accepted)
    #[arg(long)]
    direction: String,
    #[arg(long)]
    price: f64,
    #[arg(long)]
    lot: f64,
    /// Entry time (YYYY-MM-DD HH:MM); defaults to now
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    sl: Option<f64>,
    #[arg(long)]
    tp: Option<f64>,
    #[arg(long = "reason")]
    reasons: Vec<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long, default_value = "")]
    scenario: String,
    #[arg(long, default_value = "")]
    emotion: String,
    #[arg(long, default_value = "")]
    memo: String,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    broker: Option<String>,
    /// Account-currency rate of the quote currency, for lot sizing on non-JPY pairs
    #[arg(long)]
    quote_rate: Option<f64>,
}

#[derive(Parser, Debug)]
struct ExitArgs {
    id: String,
    #[arg(long, required_unless_present = "remove")]
    price: Option<f64>,
    /// Defaults to the remaining lot
    #[arg(long)]
    lot: Option<f64>,
    /// Exit time (YYYY-MM-DD HH:MM); defaults to now
    #[arg(long)]
    time: Option<String>,
    /// Override the computed pip result
    #[arg(long)]
    pips: Option<f64>,
    /// Remove the exit leg at this index instead of adding one
    #[arg(long, conflicts_with_all = ["lot", "pips"])]
    remove: Option<usize>,
}

#[derive(Parser, Debug)]
struct EditArgs {
    id: String,
    #[arg(long)]
    pair: Option<String>,
    #[arg(long)]
    direction: Option<String>,
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    lot: Option<f64>,
    #[arg(long)]
    sl: Option<f64>,
    #[arg(long)]
    tp: Option<f64>,
    #[arg(long)]
    scenario: Option<String>,
    #[arg(long)]
    emotion: Option<String>,
    #[arg(long)]
    reflection: Option<String>,
    #[arg(long)]
    memo: Option<String>,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    broker: Option<String>,
}

#[derive(Parser, Debug)]
struct PlArgs {
    id: String,
    /// Realised trade result before swap and commission
    #[arg(long, required_unless_present = "clear", allow_negative_numbers = true)]
    trade: Option<f64>,
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    swap: f64,
    /// Sign is ignored; commission is always a cost
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    commission: f64,
    /// Mark the trade as unregistered again
    #[arg(long)]
    clear: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportKind {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl From<ReportKind> for PeriodKind {
    fn from(k: ReportKind) -> Self {
        match k {
            ReportKind::Weekly => PeriodKind::Weekly,
            ReportKind::Monthly => PeriodKind::Monthly,
            ReportKind::Quarterly => PeriodKind::Quarterly,
            ReportKind::Yearly => PeriodKind::Yearly,
            ReportKind::Custom => PeriodKind::Custom,
        }
    }
}

#[derive(Parser, Debug)]
struct ReportArgs {
    #[arg(value_enum)]
    kind: ReportKind,
    /// Defaults to the period containing today
    #[arg(long, requires = "index")]
    year: Option<i32>,
    /// ISO week, month or quarter number
    #[arg(long)]
    index: Option<u32>,
    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<String>,
    /// Last day of a custom range, inclusive
    #[arg(long, requires = "from")]
    to: Option<String>,
    #[arg(long)]
    json: bool,
}

fn parse_day(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .or_else(|_| parse_timestamp(s).map(|t| t.date()))
        .with_context(|| format!("invalid date: {s}"))
}

fn time_or_now(s: Option<&str>, now: NaiveDateTime) -> anyhow::Result<NaiveDateTime> {
    match s {
        Some(s) => Ok(parse_timestamp(s)?),
        None => Ok(now),
    }
}

fn add_capital(
    journal: &mut Journal,
    kind: CapitalKind,
    c: CapitalArgs,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let date = match c.date.as_deref() {
        Some(d) => parse_day(d)?,
        None => now.date(),
    };
    let r = journal.add_capital(kind, date, c.amount, c.note, now)?;
    println!("{} {} {:.0} (balance {:.0})", r.id, r.kind.as_str(), r.amount, r.balance);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let cfg_path = cli
        .config
        .or_else(|| std::env::var_os("JOURNAL_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let cfg = config::AppConfig::load_or_default(&cfg_path)?;
    let journal_path = cfg.journal.path.clone();

    let mut journal = Journal::load(&journal_path)?;
    let risk = risk::RiskEngine::new(&cfg.risk);
    let now = Local::now().naive_local();

    let mutated = match cli.command {
        Commands::Add(a) => {
            let new = NewTrade {
                pair: parse_pair(&a.pair)?,
                direction: parse_direction(&a.direction)?,
                entry_time: Some(time_or_now(a.time.as_deref(), now)?),
                entry_price: a.price,
                lot_size: a.lot,
                stop_loss: a.sl,
                take_profit: a.tp,
                reasons: a.reasons,
                scenario: a.scenario,
                entry_emotion: a.emotion,
                memo: a.memo,
                tags: a.tags,
                method_id: a.method,
                broker: a.broker,
                quote_rate: a.quote_rate,
            };
            let t = journal.add_trade(new, &risk, now)?;
            if let Some(r) = t.risk {
                println!("recommended lot: {:.2}", r.recommended_lot);
            }
            println!("{}", t.id);
            true
        }
        Commands::Exit(a) => {
            let t = if let Some(index) = a.remove {
                journal.remove_exit(&a.id, index, now)?
            } else {
                let lot = match a.lot {
                    Some(l) => l,
                    None => remaining_lot(journal.get(&a.id)?),
                };
                let leg = ExitLeg {
                    time: Some(time_or_now(a.time.as_deref(), now)?),
                    price: a.price.context("--price is required")?,
                    lot,
                    pips: a.pips,
                };
                journal.add_exit(&a.id, leg, now)?
            };
            println!("{}", report::trade_detail(t));
            true
        }
        Commands::Edit(a) => {
            let update = TradeUpdate {
                pair: a.pair.as_deref().map(parse_pair).transpose()?,
                direction: a.direction.as_deref().map(parse_direction).transpose()?,
                entry_time: a.time.as_deref().map(parse_timestamp).transpose()?,
                entry_price: a.price,
                lot_size: a.lot,
                stop_loss: a.sl,
                take_profit: a.tp,
                scenario: a.scenario,
                entry_emotion: a.emotion,
                reflection: a.reflection,
                memo: a.memo,
                method_id: a.method,
                broker: a.broker,
            };
            let t = journal.update_trade(&a.id, update, now)?;
            println!("{}", report::trade_detail(t));
            true
        }
        Commands::Pl(a) => {
            let pl = match (a.clear, a.trade) {
                (false, Some(trade)) => Some(ProfitLoss::from_parts(trade, a.swap, a.commission)),
                _ => None,
            };
            let t = journal.set_profit_loss(&a.id, pl, now)?;
            println!("{}", report::trade_detail(t));
            true
        }
        Commands::Delete { id } => {
            let removed = journal.delete_trade(&id)?;
            println!("deleted {} {}", removed.id, removed.pair);
            true
        }
        Commands::List { open } => {
            if open {
                println!("{}", report::trade_table(journal.open_positions()));
            } else {
                println!("{}", report::trade_table(journal.trades()));
            }
            false
        }
        Commands::Show { id } => {
            println!("{}", report::trade_detail(journal.get(&id)?));
            false
        }
        Commands::Stats { json } => {
            let summary = stats::aggregate(journal.trades());
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", report::summary_tables(&summary));
            }
            false
        }
        Commands::Report(a) => {
            let kind = PeriodKind::from(a.kind);
            let period = match (&a.from, &a.to, a.year, a.index) {
                (Some(from), Some(to), _, _) => Period::range(parse_day(from)?, parse_day(to)?)?,
                _ if kind == PeriodKind::Custom => anyhow::bail!("custom report needs --from and --to"),
                (_, _, Some(year), Some(index)) => Period::new(kind, year, index)?,
                (_, _, None, Some(index)) => {
                    Period::new(kind, Period::default_year(kind, now), index)?
                }
                _ => Period::containing(kind, now)?,
            };
            let trades = filter_by_period(journal.trades(), &period);
            let summary = stats::aggregate(&trades);
            if a.json {
                let body = serde_json::json!({ "period": period, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{} report: {}", kind.as_str(), period.label());
                println!("{}", report::summary_tables(&summary));
            }
            false
        }
        Commands::Capital { action } => match action {
            CapitalAction::Deposit(c) => {
                add_capital(&mut journal, CapitalKind::Deposit, c, now)?;
                true
            }
            CapitalAction::Withdraw(c) => {
                add_capital(&mut journal, CapitalKind::Withdrawal, c, now)?;
                true
            }
            CapitalAction::Delete { id } => {
                let removed = journal.delete_capital(&id)?;
                println!("deleted {} {} {}", removed.id, removed.kind.as_str(), removed.amount);
                true
            }
            CapitalAction::List { json } => {
                let summary =
                    capital::capital_summary(journal.capital_records(), &stats::aggregate(journal.trades()));
                if json {
                    let body = serde_json::json!({
                        "records": journal.capital_records(),
                        "summary": summary,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                } else {
                    println!("{}", report::capital_tables(journal.capital_records(), &summary));
                }
                false
            }
        },
        Commands::Trend { year, json } => {
            let t = trend::monthly_trend(journal.trades(), year.unwrap_or(now.year()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&t)?);
            } else {
                println!("{} trend", t.year);
                println!("{}", report::trend_table(&t));
            }
            false
        }
        Commands::Calendar { year, month, json } => {
            let year = year.unwrap_or(now.year());
            let month = month.unwrap_or(now.month());
            let days = trend::daily_results(journal.trades(), year, month)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                println!("{year}-{month:02}");
                println!("{}", report::calendar_table(&days));
            }
            false
        }
        Commands::Export { year, out } => {
            let year = year.unwrap_or(now.year());
            let rows = match &out {
                Some(p) => {
                    let f = File::create(p).with_context(|| format!("create {}", p.display()))?;
                    export::export_year(journal.trades(), year, f)?
                }
                None => export::export_year(journal.trades(), year, io::stdout().lock())?,
            };
            info!("Exported {} trades for {}", rows, year);
            false
        }
    };

    if mutated {
        journal
            .save(&journal_path)
            .with_context(|| format!("save journal {}", journal_path.display()))?;
    }
    Ok(())
}
