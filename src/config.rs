//! Runtime assumptions: exchange rate, tax year, and India relief mode.
//!
//! Values resolve in order of increasing precedence: built-in defaults, an
//! optional TOML file, then command-line flags.
//!
//! ```toml
//! exchange_rate_usd_to_inr = 87
//! tax_year = 2025
//! india_relief = "none"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::core::{
    DEFAULT_EXCHANGE_RATE_USD_TO_INR, Evaluator, IndiaRelief, MAX_EXCHANGE_RATE, TaxYear,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("tax year {0} is not supported; only 2025 brackets are available")]
    UnsupportedTaxYear(i32),

    #[error("exchange rate must be > 0 and <= 1000000000000, got {0}")]
    InvalidExchangeRate(Decimal),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CliIndiaRelief {
    None,
    #[serde(alias = "foreign_tax_credit", alias = "ftc")]
    ForeignTaxCredit,
}

impl From<CliIndiaRelief> for IndiaRelief {
    fn from(value: CliIndiaRelief) -> Self {
        match value {
            CliIndiaRelief::None => IndiaRelief::None,
            CliIndiaRelief::ForeignTaxCredit => IndiaRelief::ForeignTaxCredit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    exchange_rate_usd_to_inr: Option<Decimal>,
    tax_year: Option<i32>,
    india_relief: Option<CliIndiaRelief>,
}

/// Flags shared by every command that evaluates a withdrawal.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML file with exchange_rate_usd_to_inr, tax_year and india_relief
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fixed USD to INR exchange rate
    #[arg(long, global = true, value_parser = parse_decimal_arg)]
    pub exchange_rate: Option<Decimal>,

    /// Tax year whose brackets are applied
    #[arg(long, global = true)]
    pub tax_year: Option<i32>,

    /// How RNOR/ROR India liability accounts for U.S. tax already paid
    #[arg(long, global = true, value_enum)]
    pub india_relief: Option<CliIndiaRelief>,
}

fn parse_decimal_arg(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| format!("'{raw}' is not a decimal number: {e}"))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub exchange_rate: Decimal,
    pub tax_year: TaxYear,
    pub india_relief: IndiaRelief,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE_USD_TO_INR,
            tax_year: TaxYear::default(),
            india_relief: IndiaRelief::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut config = Self::default();
        if let Some(rate) = file.exchange_rate_usd_to_inr {
            config.exchange_rate = validate_exchange_rate(rate)?;
        }
        if let Some(year) = file.tax_year {
            config.tax_year = resolve_tax_year(year)?;
        }
        if let Some(relief) = file.india_relief {
            config.india_relief = relief.into();
        }
        Ok(config)
    }

    pub fn apply_overrides(&mut self, args: &ConfigArgs) -> Result<(), ConfigError> {
        if let Some(rate) = args.exchange_rate {
            self.exchange_rate = validate_exchange_rate(rate)?;
        }
        if let Some(year) = args.tax_year {
            self.tax_year = resolve_tax_year(year)?;
        }
        if let Some(relief) = args.india_relief {
            self.india_relief = relief.into();
        }
        Ok(())
    }

    pub fn evaluator(&self) -> Result<Evaluator, ConfigError> {
        Evaluator::new(self.tax_year, self.exchange_rate, self.india_relief)
            .map_err(|_| ConfigError::InvalidExchangeRate(self.exchange_rate))
    }
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_overrides(self)?;
        tracing::debug!(
            exchange_rate = %config.exchange_rate,
            tax_year = config.tax_year.year(),
            india_relief = ?config.india_relief,
            "resolved configuration"
        );
        Ok(config)
    }
}

fn validate_exchange_rate(rate: Decimal) -> Result<Decimal, ConfigError> {
    if rate <= Decimal::ZERO || rate > MAX_EXCHANGE_RATE {
        return Err(ConfigError::InvalidExchangeRate(rate));
    }
    Ok(rate)
}

fn resolve_tax_year(year: i32) -> Result<TaxYear, ConfigError> {
    TaxYear::from_year(year).ok_or(ConfigError::UnsupportedTaxYear(year))
}
