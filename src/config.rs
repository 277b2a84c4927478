//! Load and validate runtime configuration.

use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize, Clone)]
pub struct JournalCfg {
    /// JSON file holding every trade. Defaults to the platform data directory.
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
}

impl Default for JournalCfg {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskCfg {
    /// Maximum loss per trade in account currency.
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default = "default_lot_unit")]
    pub lot_unit: f64,
    /// Account-currency value of one unit of the quote currency (non-JPY pairs).
    #[serde(default)]
    pub quote_rate: Option<f64>,
}

impl Default for RiskCfg {
    fn default() -> Self {
        Self {
            tolerance: None,
            lot_unit: default_lot_unit(),
            quote_rate: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub journal: JournalCfg,
    #[serde(default)]
    pub risk: RiskCfg,
}

fn default_lot_unit() -> f64 {
    10_000.0
}

fn default_journal_path() -> PathBuf {
    ProjectDirs::from("", "", "trade-journal")
        .map(|dirs| dirs.data_dir().join("journal.json"))
        .unwrap_or_else(|| PathBuf::from("data/journal.json"))
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.risk.lot_unit <= 0.0 {
            anyhow::bail!("risk.lot_unit must be positive, got {}", self.risk.lot_unit);
        }
        if let Some(t) = self.risk.tolerance {
            if t < 0.0 {
                anyhow::bail!("risk.tolerance must not be negative, got {}", t);
            }
        }
        Ok(())
    }
}
