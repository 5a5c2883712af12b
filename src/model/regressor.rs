use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::metrics::{mean_absolute_error, mean_squared_error, r2_score, MetricsReport};
use crate::error::DataError;

pub type ForestRegressor = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fit a seeded random forest.
pub fn fit_forest(
    x: &DenseMatrix<f64>,
    y: &Vec<f64>,
    n_trees: u16,
    seed: u64,
) -> Result<ForestRegressor, DataError> {
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(n_trees.into())
        .with_seed(seed);
    Ok(RandomForestRegressor::fit(x, y, params)?)
}

/// Score on held-out rows: `mse` and `r2` first (the historical report),
/// then `rmse` and `mae`.
pub fn evaluate(
    model: &ForestRegressor,
    x_test: &DenseMatrix<f64>,
    y_test: &[f64],
) -> Result<MetricsReport, DataError> {
    let predicted = model.predict(x_test)?;
    let mse = mean_squared_error(y_test, &predicted);

    let mut report = MetricsReport::new();
    report.push("mse", mse);
    report.push("r2", r2_score(y_test, &predicted));
    report.push("rmse", mse.sqrt());
    report.push("mae", mean_absolute_error(y_test, &predicted));
    Ok(report)
}

/// What `rf_model.json` holds.
#[derive(Serialize, Deserialize)]
pub struct SavedRegressor {
    pub target: String,
    pub feature_names: Vec<String>,
    pub n_trees: u16,
    pub seed: u64,
    pub model: ForestRegressor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::split::{to_matrix, train_test};

    /// y = 3·x0 − x1 on a small grid.
    fn linear_grid() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for a in 0..8 {
            for b in 0..5 {
                rows.push(vec![a as f64, b as f64]);
                y.push(3.0 * a as f64 - b as f64);
            }
        }
        (rows, y)
    }

    #[test]
    fn same_seed_same_metrics() {
        let (rows, y) = linear_grid();
        let run = || {
            let split = train_test(to_matrix(&rows).unwrap(), y.clone(), 0.2, 42).unwrap();
            let model = fit_forest(&split.x_train, &split.y_train, 20, 42).unwrap();
            evaluate(&model, &split.x_test, &split.y_test).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn forest_beats_the_mean() {
        let (rows, y) = linear_grid();
        let split = train_test(to_matrix(&rows).unwrap(), y, 0.2, 42).unwrap();
        let model = fit_forest(&split.x_train, &split.y_train, 20, 42).unwrap();
        let report = evaluate(&model, &split.x_test, &split.y_test).unwrap();
        assert!(report.get("r2").unwrap() > 0.5);
        let names: Vec<&str> = report.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["mse", "r2", "rmse", "mae"]);
    }

    #[test]
    fn saved_regressor_predicts_after_reload() {
        let (rows, y) = linear_grid();
        let x = to_matrix(&rows).unwrap();
        let saved = SavedRegressor {
            target: "y".into(),
            feature_names: vec!["a".into(), "b".into()],
            n_trees: 10,
            seed: 3,
            model: fit_forest(&x, &y, 10, 3).unwrap(),
        };
        let head = to_matrix(&rows[..4]).unwrap();
        let before = saved.model.predict(&head).unwrap();
        let restored: SavedRegressor =
            serde_json::from_str(&serde_json::to_string(&saved).unwrap()).unwrap();
        assert_eq!(restored.model.predict(&head).unwrap(), before);
    }
}
