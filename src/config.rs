//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a missing file still yields a
//! runnable shop (the reference tax schedule and a demo account).

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use tracing::info;

use crate::types::TaxGrade;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub shop: ShopConfig,
    pub tax_grades: Vec<TaxGradeConfig>,
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ShopConfig {
    pub name: String,
    pub currency: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "BETSHOP".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

/// One configured tax bracket. Omitted bounds mean 0 / unbounded.
#[derive(Debug, Deserialize, Clone)]
pub struct TaxGradeConfig {
    #[serde(default)]
    pub lower_bound: Option<Decimal>,
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxGradeConfig {
    pub fn to_tax_grade(&self) -> TaxGrade {
        TaxGrade {
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            rate: self.rate,
        }
    }
}

/// Settings for the demo scenario run by the binary.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DemoConfig {
    pub username: String,
    pub starting_balance: Decimal,
    pub deposit_amount: Decimal,
    pub bet_amount: Decimal,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            username: "demo".to_string(),
            starting_balance: dec!(800.00),
            deposit_amount: dec!(200.00),
            bet_amount: dec!(50.00),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does
    /// not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// The configured tax schedule, or the reference schedule when none
    /// is configured: 10% to 10k, 15% to 30k, 30% above.
    pub fn tax_grades(&self) -> Vec<TaxGrade> {
        if self.tax_grades.is_empty() {
            return vec![
                TaxGrade {
                    lower_bound: None,
                    upper_bound: Some(dec!(10_000.00)),
                    rate: dec!(0.10),
                },
                TaxGrade {
                    lower_bound: Some(dec!(10_000.00)),
                    upper_bound: Some(dec!(30_000.00)),
                    rate: dec!(0.15),
                },
                TaxGrade {
                    lower_bound: Some(dec!(30_000.00)),
                    upper_bound: None,
                    rate: dec!(0.30),
                },
            ];
        }

        self.tax_grades.iter().map(|g| g.to_tax_grade()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
