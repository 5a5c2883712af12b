use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::output::read_json;
use crate::preprocess::resample::{Aggregation, Frequency};

// ---------------------------------------------------------------------------
// Per-task settings
//
// Defaults are the values the analyses were first run with; a JSON file
// passed with `--config` overrides any subset, and CLI flags override that.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisConfig {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub target: Option<String>,
    pub test_size: f32,
    /// Fraction of the non-test rows held back to choose between candidates.
    pub validation_size: f32,
    pub random_state: u64,
    pub knn_k: usize,
    pub n_trees: u16,
}

impl Default for IrisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/iris.csv"),
            outdir: PathBuf::from("output/iris"),
            target: None,
            test_size: 0.2,
            validation_size: 0.25,
            random_state: 42,
            knn_k: 5,
            n_trees: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnemploymentConfig {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub date_column: Option<String>,
    pub rate_column: Option<String>,
    pub year_column: Option<String>,
    pub month_column: Option<String>,
    pub region_column: Option<String>,
    pub frequency: Frequency,
    pub aggregation: Aggregation,
}

impl Default for UnemploymentConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/unemployment.csv"),
            outdir: PathBuf::from("output/unemployment"),
            date_column: None,
            rate_column: None,
            year_column: None,
            month_column: None,
            region_column: None,
            frequency: Frequency::Monthly,
            aggregation: Aggregation::Mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarPriceConfig {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub target: Option<String>,
    pub test_size: f32,
    pub random_state: u64,
    pub n_trees: u16,
}

impl Default for CarPriceConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/car data.csv"),
            outdir: PathBuf::from("output/car_price"),
            target: None,
            test_size: 0.2,
            random_state: 42,
            n_trees: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub iris: IrisConfig,
    pub unemployment: UnemploymentConfig,
    pub car_price: CarPriceConfig,
}

impl AppConfig {
    /// Built-in defaults, or a JSON file layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config = read_json(path).context("loading config")?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
