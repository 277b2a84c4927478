//! Position sizing from the configured loss tolerance.

use tracing::warn;

use crate::calc::pip_multiplier;
use crate::config::RiskCfg;
use crate::types::{NewTrade, RiskSnapshot};
use crate::utils::round_to;

pub struct RiskEngine {
    /// Maximum loss per trade in account currency; sizing is off when unset.
    tolerance: Option<f64>,
    /// Currency units per lot.
    lot_unit: f64,
    default_quote_rate: Option<f64>,
}

impl RiskEngine {
    pub fn new(cfg: &RiskCfg) -> Self {
        Self {
            tolerance: cfg.tolerance.filter(|t| *t > 0.0),
            lot_unit: cfg.lot_unit,
            default_quote_rate: cfg.quote_rate,
        }
    }

    /// Lot that loses exactly the tolerance when the stop is hit.
    ///
    /// One pip of one currency unit is worth 0.01 for JPY-quoted pairs and
    /// `0.0001 * quote_rate` otherwise.
    pub fn optimal_lot(&self, pair: &str, entry: f64, stop: f64, quote_rate: Option<f64>) -> Option<f64> {
        let tolerance = self.tolerance?;
        let stop_pips = (entry - stop).abs() * pip_multiplier(pair);
        if !stop_pips.is_finite() || stop_pips <= 0.0 || self.lot_unit <= 0.0 {
            return None;
        }
        let pip_value = if pip_multiplier(pair) == 100.0 {
            0.01
        } else {
            let rate = quote_rate.or(self.default_quote_rate)?;
            if rate <= 0.0 {
                return None;
            }
            0.0001 * rate
        };
        Some(round_to(tolerance / (stop_pips * self.lot_unit * pip_value), 2))
    }

    /// Snapshot for a new entry. Logs a warning when the entered lot is larger
    /// than the recommendation; the entry is still accepted.
    pub fn pre_check(&self, trade: &NewTrade) -> Option<RiskSnapshot> {
        let stop = trade.stop_loss?;
        let lot = self.optimal_lot(&trade.pair, trade.entry_price, stop, trade.quote_rate)?;
        if trade.lot_size > lot {
            warn!(
                "Lot {:.2} on {} exceeds recommended {:.2} for tolerance {:.0}",
                trade.lot_size,
                trade.pair,
                lot,
                self.tolerance.unwrap_or_default()
            );
        }
        Some(RiskSnapshot {
            tolerance: self.tolerance.unwrap_or_default(),
            recommended_lot: lot,
        })
    }
}
