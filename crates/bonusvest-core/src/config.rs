use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::WindowAlignment;

/// Top-level simulation config, parsed from one or more TOML files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub windows: WindowConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

impl SimConfig {
    /// Load config from a TOML file path.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = read_config(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and merge multiple TOML files (later files override earlier).
    pub fn from_toml_files(paths: &[&Path]) -> Result<Self, ConfigError> {
        let Some((first, rest)) = paths.split_first() else {
            return Err(ConfigError::Parse("no config files provided".into()));
        };

        let mut base: toml::Value = toml::from_str(&read_config(first)?)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        for path in rest {
            let overlay: toml::Value = toml::from_str(&read_config(path)?)
                .map_err(|e| ConfigError::Parse(e.to_string()))?;
            merge_toml(&mut base, overlay);
        }

        base.try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) = (base, overlay) {
        for (key, value) in overlay_table {
            if let Some(base_value) = base_table.get_mut(&key) {
                if base_value.is_table() && value.is_table() {
                    merge_toml(base_value, value);
                    continue;
                }
            }
            base_table.insert(key, value);
        }
    }
}

/// How lots still unvested at the end of a window enter the final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnvestedValuation {
    /// Value remaining lots at the last month's stock price.
    #[default]
    MarkToMarket,
    /// Count only proceeds that have already matured.
    Discard,
}

/// Cash-flow and vesting rules shared by both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParams {
    #[serde(default = "default_1000")]
    pub monthly_investment: f64,
    /// Months (counted from the window's second month) that receive a contribution.
    #[serde(default = "default_36")]
    pub investment_months: u32,
    #[serde(default = "default_72")]
    pub window_months: u32,
    #[serde(default = "default_one_third")]
    pub bonus_fraction: f64,
    #[serde(default = "default_3")]
    pub vesting_delay_years: u32,
    #[serde(default = "default_3")]
    pub vesting_month: u32,
    #[serde(default = "default_1")]
    pub vesting_day: u32,
    #[serde(default)]
    pub unvested_valuation: UnvestedValuation,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            monthly_investment: 1000.0,
            investment_months: 36,
            window_months: 72,
            bonus_fraction: 1.0 / 3.0,
            vesting_delay_years: 3,
            vesting_month: 3,
            vesting_day: 1,
            unvested_valuation: UnvestedValuation::MarkToMarket,
        }
    }
}

impl StrategyParams {
    /// Reject parameter sets the simulators cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.monthly_investment.is_finite() || self.monthly_investment <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "monthly_investment must be positive, got {}",
                self.monthly_investment
            )));
        }
        if self.investment_months == 0 {
            return Err(ConfigError::invalid(
                "investment_months must be at least 1 (total invested would be zero)",
            ));
        }
        if self.window_months < 2 {
            return Err(ConfigError::invalid(format!(
                "window_months must be at least 2, got {}",
                self.window_months
            )));
        }
        if self.investment_months > self.window_months {
            return Err(ConfigError::invalid(format!(
                "investment_months ({}) must not exceed window_months ({})",
                self.investment_months, self.window_months
            )));
        }
        if !self.bonus_fraction.is_finite() || self.bonus_fraction < 0.0 {
            return Err(ConfigError::invalid(format!(
                "bonus_fraction must be non-negative, got {}",
                self.bonus_fraction
            )));
        }
        if self.vesting_delay_years == 0 {
            return Err(ConfigError::invalid("vesting_delay_years must be at least 1"));
        }
        // Leap year so that Feb 29 is accepted as a vesting date.
        if NaiveDate::from_ymd_opt(2000, self.vesting_month, self.vesting_day).is_none() {
            return Err(ConfigError::invalid(format!(
                "invalid vesting date: month {} day {}",
                self.vesting_month, self.vesting_day
            )));
        }
        Ok(())
    }

    /// Total cash contributed over the investment horizon.
    #[inline]
    pub fn total_invested(&self) -> f64 {
        self.investment_months as f64 * self.monthly_investment
    }

    #[inline]
    pub fn window_len(&self) -> usize {
        self.window_months as usize
    }

    #[inline]
    pub fn horizon_len(&self) -> usize {
        self.investment_months as usize
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub alignment: WindowAlignment,
    /// Run windows sequentially instead of across the rayon pool.
    #[serde(default)]
    pub sequential: bool,
}

/// Where historical prices come from and how the instruments are labelled.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub index_json: Option<PathBuf>,
    #[serde(default)]
    pub stock_json: Option<PathBuf>,
    #[serde(default)]
    pub csv: Option<PathBuf>,
    /// Closes before this instant (epoch seconds) are ignored.
    #[serde(default = "default_start_epoch")]
    pub start_epoch: i64,
    #[serde(default = "default_index_label")]
    pub index_label: String,
    #[serde(default = "default_stock_label")]
    pub stock_label: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            index_json: None,
            stock_json: None,
            csv: None,
            start_epoch: default_start_epoch(),
            index_label: default_index_label(),
            stock_label: default_stock_label(),
        }
    }
}

/// Flat-return price generator settings for single-window runs.
#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_120")]
    pub months: u32,
    /// Months of contributions within the synthetic window.
    #[serde(default = "default_60")]
    pub investment_months: u32,
    #[serde(default = "default_100")]
    pub index_start_price: f64,
    #[serde(default = "default_10")]
    pub index_annual_return_pct: f64,
    #[serde(default = "default_50")]
    pub stock_start_price: f64,
    #[serde(default)]
    pub stock_annual_return_pct: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            months: 120,
            investment_months: 60,
            index_start_price: 100.0,
            index_annual_return_pct: 10.0,
            stock_start_price: 50.0,
            stock_annual_return_pct: 0.0,
        }
    }
}

impl SyntheticConfig {
    /// `base` with its window stretched over the whole synthetic series and
    /// this section's contribution horizon.
    pub fn strategy_params(&self, base: &StrategyParams) -> StrategyParams {
        StrategyParams {
            window_months: self.months,
            investment_months: self.investment_months,
            ..base.clone()
        }
    }
}

// Default value helpers
fn default_1() -> u32 { 1 }
fn default_3() -> u32 { 3 }
fn default_36() -> u32 { 36 }
fn default_60() -> u32 { 60 }
fn default_72() -> u32 { 72 }
fn default_120() -> u32 { 120 }
fn default_10() -> f64 { 10.0 }
fn default_50() -> f64 { 50.0 }
fn default_100() -> f64 { 100.0 }
fn default_1000() -> f64 { 1000.0 }
fn default_one_third() -> f64 { 1.0 / 3.0 }
// 2000-06-01T04:00:00Z, first monthly bar on or after June 2000
fn default_start_epoch() -> i64 { 959_832_000 }
fn default_index_label() -> String { "SPY".into() }
fn default_stock_label() -> String { "UBS".into() }
fn default_start_date() -> NaiveDate { NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default() }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
