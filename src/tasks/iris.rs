use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::config::IrisConfig;
use crate::data::filter::drop_missing;
use crate::data::loader::load_file;
use crate::data::model::{Table, Value};
use crate::error::DataError;
use crate::model::classifier::{
    ClassifierKind, ClassifierParams, SavedClassifier, Selection, select_best,
};
use crate::model::metrics::MetricsReport;
use crate::model::split::{to_matrix, train_test};
use crate::output::{prepare_dir, write_json, write_metrics, write_table_csv};
use crate::preprocess::encode::{LabelEncoder, encode_features};
use crate::preprocess::{IRIS_TARGET_ALIASES, find_target_column};

pub const MODEL_FILE: &str = "best_model.json";
pub const METRICS_FILE: &str = "metrics.txt";
pub const CANDIDATES_FILE: &str = "candidates.csv";

#[derive(Debug)]
pub struct IrisSummary {
    pub target: String,
    pub classes: Vec<String>,
    pub best: ClassifierKind,
    pub validation_accuracy: f64,
    pub test_accuracy: f64,
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for IrisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "iris: best model {} for '{}' over classes [{}]",
            self.best.name(),
            self.target,
            self.classes.join(", ")
        )?;
        writeln!(f, "  validation accuracy: {:.4}", self.validation_accuracy)?;
        writeln!(f, "  test accuracy: {:.4}", self.test_accuracy)?;
        super::list_outputs(f, &self.outputs)
    }
}

fn candidates_table(selection: &Selection) -> Result<Table, DataError> {
    let best = selection.best.kind();
    Table::new(
        vec![
            "candidate".to_string(),
            "validation_accuracy".to_string(),
            "selected".to_string(),
        ],
        selection
            .scores
            .iter()
            .map(|s| {
                vec![
                    Value::String(s.kind.name().to_string()),
                    Value::Float(s.validation_accuracy),
                    Value::Bool(s.kind == best),
                ]
            })
            .collect(),
    )
}

/// Fit every candidate classifier, keep the best on the validation rows, and
/// report its accuracy on the held-out test rows.
pub fn run(cfg: &IrisConfig) -> Result<IrisSummary> {
    let table = load_file(&cfg.input)?;

    let target = find_target_column(&table, cfg.target.as_deref(), IRIS_TARGET_ALIASES)
        .ok_or_else(|| DataError::NoTargetColumn {
            available: table.column_names().to_vec(),
        })?;
    log::info!("Using target column: {target}");

    let table = drop_missing(&table, &[target.as_str()])?;
    if table.is_empty() {
        return Err(DataError::EmptyDataset { stage: "dropping rows without a label" }.into());
    }
    let features = encode_features(&table, &target)?;
    let labels = LabelEncoder::fit(&table, &target)?;
    let y = labels.transform(&table, &target)?;
    log::info!(
        "{} rows, {} features, classes: {}",
        features.n_rows(),
        features.n_features(),
        labels.classes.join(", ")
    );

    let outer = train_test(to_matrix(&features.rows)?, y, cfg.test_size, cfg.random_state)?;
    let inner = train_test(outer.x_train, outer.y_train, cfg.validation_size, cfg.random_state)?;
    log::info!(
        "Train/validation/test sizes: {} {} {}",
        inner.y_train.len(),
        inner.y_test.len(),
        outer.y_test.len()
    );

    let params = ClassifierParams {
        knn_k: cfg.knn_k,
        n_trees: cfg.n_trees,
        seed: cfg.random_state,
    };
    log::info!("Scoring {} candidates...", ClassifierKind::ALL.len());
    let selection = select_best(
        &ClassifierKind::ALL,
        &inner.x_train,
        &inner.y_train,
        &inner.x_test,
        &inner.y_test,
        params,
    )?;
    let best = selection.best.kind();
    let validation_accuracy = selection.best_score();
    let test_accuracy = selection.best.score(&outer.x_test, &outer.y_test)?;
    log::info!("Best: {} (test accuracy {test_accuracy:.4})", best.name());

    let candidates = candidates_table(&selection)?;
    let classes = labels.classes.clone();
    let saved = SavedClassifier {
        kind: best,
        feature_names: features.names,
        labels,
        model: selection.best,
    };

    let mut metrics = MetricsReport::new();
    for s in &selection.scores {
        metrics.push(format!("validation_accuracy_{}", s.kind.name()), s.validation_accuracy);
    }
    metrics.push("best_validation_accuracy", validation_accuracy);
    metrics.push("test_accuracy", test_accuracy);
    let predicted = saved.predict_labels(&outer.x_test)?;
    for (code, class) in classes.iter().enumerate() {
        let hits: Vec<bool> = outer
            .y_test
            .iter()
            .zip(&predicted)
            .filter(|&(&y, _)| y == code as i32)
            .map(|(_, p)| p == class)
            .collect();
        if !hits.is_empty() {
            let recall = hits.iter().filter(|&&h| h).count() as f64 / hits.len() as f64;
            metrics.push(format!("test_recall_{class}"), recall);
        }
    }

    prepare_dir(&cfg.outdir)?;
    let candidates_path = cfg.outdir.join(CANDIDATES_FILE);
    write_table_csv(&candidates_path, &candidates)?;
    let metrics_path = cfg.outdir.join(METRICS_FILE);
    write_metrics(&metrics_path, &metrics)?;
    let model_path = cfg.outdir.join(MODEL_FILE);
    write_json(&model_path, &saved)?;

    Ok(IrisSummary {
        target,
        classes,
        best,
        validation_accuracy,
        test_accuracy,
        outputs: vec![model_path, metrics_path, candidates_path],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::read_json;
    use crate::tasks::fixtures::{dir_listing, write_iris};

    fn config(dir: &std::path::Path) -> IrisConfig {
        IrisConfig {
            input: write_iris(dir),
            outdir: dir.join("out"),
            n_trees: 15,
            ..IrisConfig::default()
        }
    }

    #[test]
    fn selects_and_persists_best_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let summary = run(&cfg).unwrap();

        assert_eq!(summary.target, "species");
        assert_eq!(summary.classes, vec!["setosa", "versicolor", "virginica"]);
        assert!(summary.test_accuracy >= 0.9, "{summary}");

        let saved: SavedClassifier = read_json(&cfg.outdir.join(MODEL_FILE)).unwrap();
        assert_eq!(saved.kind, summary.best);
        // the Id column is an identifier, not a feature
        assert_eq!(
            saved.feature_names,
            vec!["sepal_length", "sepal_width", "petal_length", "petal_width"]
        );
        let probe = crate::model::split::to_matrix(&[
            vec![5.0, 3.4, 1.5, 0.2],
            vec![6.6, 3.0, 5.6, 2.0],
        ])
        .unwrap();
        assert_eq!(saved.predict_labels(&probe).unwrap(), vec!["setosa", "virginica"]);

        let metrics = std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap();
        assert!(metrics.contains("validation_accuracy_knn: "));
        assert!(metrics.contains("\ntest_accuracy: "));
        assert!(metrics.contains("test_recall_"));

        let candidates = std::fs::read_to_string(cfg.outdir.join(CANDIDATES_FILE)).unwrap();
        assert_eq!(candidates.lines().count(), 1 + ClassifierKind::ALL.len());
    }

    #[test]
    fn rerun_gives_same_choice_and_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let first = run(&cfg).unwrap();
        let metrics = std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap();
        let second = run(&cfg).unwrap();

        assert_eq!(first.best, second.best);
        assert_eq!(first.test_accuracy, second.test_accuracy);
        assert_eq!(std::fs::read_to_string(cfg.outdir.join(METRICS_FILE)).unwrap(), metrics);
        assert_eq!(
            dir_listing(&cfg.outdir),
            vec![MODEL_FILE, CANDIDATES_FILE, METRICS_FILE]
        );
    }

    #[test]
    fn too_small_validation_split_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = IrisConfig {
            validation_size: 0.001,
            ..config(dir.path())
        };
        let err = run(&cfg).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::EmptySplit { .. })));
        assert!(!cfg.outdir.exists());
    }
}
