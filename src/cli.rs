use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{CarPriceConfig, IrisConfig, UnemploymentConfig};
use crate::preprocess::resample::{Aggregation, Frequency};

#[derive(Parser, Debug)]
#[command(name = "intern-analytics", version, about = "Batch analyses over small tabular datasets")]
pub struct Cli {
    #[arg(long, global = true, help = "JSON file overriding the built-in defaults")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pick the best of several classifiers for the iris species
    Iris(IrisArgs),
    /// Monthly unemployment rate series and charts
    Unemployment(UnemploymentArgs),
    /// Random-forest regression of used-car prices
    CarPrice(CarPriceArgs),
}

#[derive(Args, Debug)]
pub struct IrisArgs {
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
    #[arg(long, help = "Label column (default: species/class/variety/...)")]
    pub target: Option<String>,
    #[arg(long)]
    pub test_size: Option<f32>,
    #[arg(long)]
    pub validation_size: Option<f32>,
    #[arg(long)]
    pub random_state: Option<u64>,
}

impl IrisArgs {
    pub fn apply(self, cfg: &mut IrisConfig) {
        if let Some(v) = self.input {
            cfg.input = v;
        }
        if let Some(v) = self.outdir {
            cfg.outdir = v;
        }
        if self.target.is_some() {
            cfg.target = self.target;
        }
        if let Some(v) = self.test_size {
            cfg.test_size = v;
        }
        if let Some(v) = self.validation_size {
            cfg.validation_size = v;
        }
        if let Some(v) = self.random_state {
            cfg.random_state = v;
        }
    }
}

#[derive(Args, Debug)]
pub struct UnemploymentArgs {
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
    #[arg(long = "date-col")]
    pub date_column: Option<String>,
    #[arg(long = "rate-col")]
    pub rate_column: Option<String>,
    #[arg(long = "region-col")]
    pub region_column: Option<String>,
    #[arg(long, value_enum)]
    pub frequency: Option<Frequency>,
    #[arg(long, value_enum)]
    pub aggregation: Option<Aggregation>,
}

impl UnemploymentArgs {
    pub fn apply(self, cfg: &mut UnemploymentConfig) {
        if let Some(v) = self.input {
            cfg.input = v;
        }
        if let Some(v) = self.outdir {
            cfg.outdir = v;
        }
        if self.date_column.is_some() {
            cfg.date_column = self.date_column;
        }
        if self.rate_column.is_some() {
            cfg.rate_column = self.rate_column;
        }
        if self.region_column.is_some() {
            cfg.region_column = self.region_column;
        }
        if let Some(v) = self.frequency {
            cfg.frequency = v;
        }
        if let Some(v) = self.aggregation {
            cfg.aggregation = v;
        }
    }
}

#[derive(Args, Debug)]
pub struct CarPriceArgs {
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
    #[arg(long, help = "Price column (default: Selling_Price/price/...)")]
    pub target: Option<String>,
    #[arg(long)]
    pub test_size: Option<f32>,
    #[arg(long)]
    pub random_state: Option<u64>,
    #[arg(long)]
    pub n_trees: Option<u16>,
}

impl CarPriceArgs {
    pub fn apply(self, cfg: &mut CarPriceConfig) {
        if let Some(v) = self.input {
            cfg.input = v;
        }
        if let Some(v) = self.outdir {
            cfg.outdir = v;
        }
        if self.target.is_some() {
            cfg.target = self.target;
        }
        if let Some(v) = self.test_size {
            cfg.test_size = v;
        }
        if let Some(v) = self.random_state {
            cfg.random_state = v;
        }
        if let Some(v) = self.n_trees {
            cfg.n_trees = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "intern-analytics",
            "car-price",
            "-i",
            "cars.csv",
            "--n-trees",
            "12",
            "--config",
            "cfg.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        let Commands::CarPrice(args) = cli.command else {
            panic!("expected car-price");
        };
        let mut cfg = CarPriceConfig {
            random_state: 7,
            ..CarPriceConfig::default()
        };
        args.apply(&mut cfg);
        assert_eq!(cfg.input, PathBuf::from("cars.csv"));
        assert_eq!(cfg.n_trees, 12);
        assert_eq!(cfg.random_state, 7);
        assert_eq!(cfg.outdir, CarPriceConfig::default().outdir);
    }

    #[test]
    fn unemployment_enums_parse() {
        let cli = Cli::parse_from([
            "intern-analytics",
            "unemployment",
            "--frequency",
            "quarterly",
            "--aggregation",
            "max",
            "--rate-col",
            "Rate",
        ]);
        let Commands::Unemployment(args) = cli.command else {
            panic!("expected unemployment");
        };
        let mut cfg = UnemploymentConfig::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.frequency, Frequency::Quarterly);
        assert_eq!(cfg.aggregation, Aggregation::Max);
        assert_eq!(cfg.rate_column.as_deref(), Some("Rate"));
    }
}
