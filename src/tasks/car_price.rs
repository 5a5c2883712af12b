use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::config::CarPriceConfig;
use crate::data::filter::drop_missing;
use crate::data::loader::load_file;
use crate::error::DataError;
use crate::model::metrics::MetricsReport;
use crate::model::regressor::{SavedRegressor, evaluate, fit_forest};
use crate::model::split::{to_matrix, train_test};
use crate::output::{prepare_dir, write_json, write_metrics};
use crate::preprocess::encode::{encode_features, numeric_target};
use crate::preprocess::{CAR_TARGET_ALIASES, find_target_column};

pub const MODEL_FILE: &str = "rf_model.json";
pub const METRICS_FILE: &str = "metrics.txt";

#[derive(Debug)]
pub struct CarPriceSummary {
    pub target: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: MetricsReport,
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for CarPriceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "car-price: target '{}', {} train / {} test rows",
            self.target, self.train_rows, self.test_rows
        )?;
        for (name, value) in self.metrics.entries() {
            writeln!(f, "  {name}: {value:.4}")?;
        }
        super::list_outputs(f, &self.outputs)
    }
}

/// Random-forest regression of the sale price.
pub fn run(cfg: &CarPriceConfig) -> Result<CarPriceSummary> {
    let table = load_file(&cfg.input)?;

    let target = find_target_column(&table, cfg.target.as_deref(), CAR_TARGET_ALIASES)
        .ok_or_else(|| DataError::NoTargetColumn {
            available: table.column_names().to_vec(),
        })?;
    log::info!("Using target column: {target}");

    let table = drop_missing(&table, &[target.as_str()])?;
    if table.is_empty() {
        return Err(DataError::EmptyDataset { stage: "dropping rows without a target" }.into());
    }
    let features = encode_features(&table, &target)?;
    let y = numeric_target(&table, &target)?;

    let split = train_test(to_matrix(&features.rows)?, y, cfg.test_size, cfg.random_state)?;
    log::info!(
        "Train/test sizes: {} {}",
        split.y_train.len(),
        split.y_test.len()
    );

    log::info!("Training random forest ({} trees)...", cfg.n_trees);
    let model = fit_forest(&split.x_train, &split.y_train, cfg.n_trees, cfg.random_state)?;
    let metrics = evaluate(&model, &split.x_test, &split.y_test)?;
    log::info!(
        "Test MSE: {:.4}, R2: {:.4}",
        metrics.get("mse").unwrap_or(f64::NAN),
        metrics.get("r2").unwrap_or(f64::NAN)
    );

    prepare_dir(&cfg.outdir)?;
    let model_path = cfg.outdir.join(MODEL_FILE);
    write_json(
        &model_path,
        &SavedRegressor {
            target: target.clone(),
            feature_names: features.names,
            n_trees: cfg.n_trees,
            seed: cfg.random_state,
            model,
        },
    )?;
    let metrics_path = cfg.outdir.join(METRICS_FILE);
    write_metrics(&metrics_path, &metrics)?;

    Ok(CarPriceSummary {
        target,
        train_rows: split.y_train.len(),
        test_rows: split.y_test.len(),
        metrics,
        outputs: vec![model_path, metrics_path],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::read_json;
    use crate::tasks::fixtures::{dir_listing, write_cars};

    fn config(dir: &std::path::Path) -> CarPriceConfig {
        CarPriceConfig {
            input: write_cars(dir),
            outdir: dir.join("out"),
            n_trees: 20,
            ..CarPriceConfig::default()
        }
    }

    #[test]
    fn trains_and_writes_model_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let summary = run(&cfg).unwrap();

        assert_eq!(summary.target, "Selling_Price");
        // 60 rows, one without a price
        assert_eq!(summary.train_rows + summary.test_rows, 59);
        assert!((11..=12).contains(&summary.test_rows));

        let metrics = std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap();
        assert!(metrics.starts_with("mse: "));
        assert!(metrics.contains("\nr2: "));

        let saved: SavedRegressor = read_json(&cfg.outdir.join(MODEL_FILE)).unwrap();
        assert_eq!(saved.target, "Selling_Price");
        assert!(saved.feature_names.contains(&"Fuel_Type_Diesel".to_string()));
        assert!(!saved.feature_names.contains(&"Car_Name".to_string()));
    }

    #[test]
    fn reruns_are_deterministic_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let first = run(&cfg).unwrap();
        let first_metrics = std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap();
        let second = run(&cfg).unwrap();

        assert_eq!(first.metrics, second.metrics);
        assert_eq!(
            std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap(),
            first_metrics
        );
        assert_eq!(dir_listing(&cfg.outdir), vec![METRICS_FILE, MODEL_FILE]);
    }

    /// 30 cars; `kms(i)` and `price(i)` pick each row's raw cell text.
    fn write_marked_cars(
        dir: &std::path::Path,
        kms: impl Fn(usize) -> String,
        price: impl Fn(usize) -> String,
    ) -> std::path::PathBuf {
        let mut text = String::from("Car_Name,Year,Selling_Price,Present_Price,Kms_Driven,Fuel_Type\n");
        for i in 0..30 {
            let fuel = if i % 2 == 0 { "Petrol" } else { "Diesel" };
            text.push_str(&format!(
                "car{i},{},{},{:.2},{},{fuel}\n",
                2008 + i % 10,
                price(i),
                4.0 + (i % 6) as f64,
                kms(i)
            ));
        }
        let path = dir.join("marked.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn default_price(i: usize) -> String {
        format!("{:.2}", 2.0 + (i % 6) as f64 * 0.8 + (i % 10) as f64 * 0.3)
    }

    #[test]
    fn nan_features_are_imputed() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_marked_cars(
            dir.path(),
            |i| if i % 3 == 0 { "NaN".into() } else { (10_000 + i * 900).to_string() },
            default_price,
        );
        let summary = run(&CarPriceConfig { input, ..config(dir.path()) }).unwrap();
        assert_eq!(summary.train_rows + summary.test_rows, 30);
        assert!(summary.metrics.get("mse").unwrap().is_finite());

        let saved: SavedRegressor = read_json(&cfg_model(dir.path())).unwrap();
        // still one numeric feature, not a one-hot expansion of the markers
        assert!(saved.feature_names.contains(&"Kms_Driven".to_string()));
    }

    #[test]
    fn na_target_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_marked_cars(
            dir.path(),
            |i| (10_000 + i * 900).to_string(),
            |i| if i == 5 { "NA".into() } else { default_price(i) },
        );
        let summary = run(&CarPriceConfig { input, ..config(dir.path()) }).unwrap();
        assert_eq!(summary.train_rows + summary.test_rows, 29);
    }

    #[test]
    fn identifier_only_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.csv");
        let mut text = String::from("Car_Name,Selling_Price\n");
        for i in 0..20 {
            text.push_str(&format!("car{i},{}.5\n", i % 7));
        }
        std::fs::write(&path, text).unwrap();

        let cfg = CarPriceConfig { input: path, ..config(dir.path()) };
        let err = run(&cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::EmptyDataset { stage: "feature encoding" })
        ));
        assert!(!cfg.outdir.exists());
    }

    fn cfg_model(dir: &std::path::Path) -> std::path::PathBuf {
        dir.join("out").join(MODEL_FILE)
    }

    #[test]
    fn missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CarPriceConfig {
            input: dir.path().join("absent.csv"),
            outdir: dir.path().join("out"),
            ..CarPriceConfig::default()
        };
        assert!(run(&cfg).is_err());
        assert!(!cfg.outdir.exists());
    }

    #[test]
    fn unknown_target_lists_columns() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CarPriceConfig {
            target: Some("mileage".into()),
            ..config(dir.path())
        };
        // "mileage" is absent but the Selling_Price alias still resolves
        assert_eq!(run(&cfg).unwrap().target, "Selling_Price");

        let path = dir.path().join("no_target.csv");
        std::fs::write(&path, "Year,Kms\n2014,100\n").unwrap();
        let err = run(&CarPriceConfig { input: path, ..config(dir.path()) }).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::NoTargetColumn { available } if available.len() == 2));
    }
}
