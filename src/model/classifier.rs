use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};

use super::metrics::accuracy;
use crate::error::DataError;
use crate::preprocess::encode::LabelEncoder;

type Matrix = DenseMatrix<f64>;
type Labels = Vec<i32>;

// ---------------------------------------------------------------------------
// Candidate estimators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Knn,
    LogisticRegression,
    DecisionTree,
    RandomForest,
}

impl ClassifierKind {
    /// Every candidate, in tie-break order.
    pub const ALL: [ClassifierKind; 4] = [
        ClassifierKind::Knn,
        ClassifierKind::LogisticRegression,
        ClassifierKind::DecisionTree,
        ClassifierKind::RandomForest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClassifierKind::Knn => "knn",
            ClassifierKind::LogisticRegression => "logistic_regression",
            ClassifierKind::DecisionTree => "decision_tree",
            ClassifierKind::RandomForest => "random_forest",
        }
    }
}

/// Hyperparameters shared by the candidate set.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierParams {
    pub knn_k: usize,
    pub n_trees: u16,
    pub seed: u64,
}

/// A fitted classifier of one of the candidate kinds.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    Knn(KNNClassifier<f64, i32, Matrix, Labels, Euclidian<f64>>),
    LogisticRegression(LogisticRegression<f64, i32, Matrix, Labels>),
    DecisionTree(DecisionTreeClassifier<f64, i32, Matrix, Labels>),
    RandomForest(RandomForestClassifier<f64, i32, Matrix, Labels>),
}

impl Classifier {
    pub fn fit(
        kind: ClassifierKind,
        x: &Matrix,
        y: &Labels,
        params: ClassifierParams,
    ) -> Result<Self, DataError> {
        let model = match kind {
            ClassifierKind::Knn => Classifier::Knn(KNNClassifier::fit(
                x,
                y,
                KNNClassifierParameters::default().with_k(params.knn_k),
            )?),
            ClassifierKind::LogisticRegression => Classifier::LogisticRegression(
                LogisticRegression::fit(x, y, LogisticRegressionParameters::default())?,
            ),
            ClassifierKind::DecisionTree => Classifier::DecisionTree(DecisionTreeClassifier::fit(
                x,
                y,
                DecisionTreeClassifierParameters::default(),
            )?),
            ClassifierKind::RandomForest => Classifier::RandomForest(RandomForestClassifier::fit(
                x,
                y,
                RandomForestClassifierParameters::default()
                    .with_n_trees(params.n_trees.into())
                    .with_seed(params.seed),
            )?),
        };
        Ok(model)
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            Classifier::Knn(_) => ClassifierKind::Knn,
            Classifier::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            Classifier::DecisionTree(_) => ClassifierKind::DecisionTree,
            Classifier::RandomForest(_) => ClassifierKind::RandomForest,
        }
    }

    pub fn predict(&self, x: &Matrix) -> Result<Labels, DataError> {
        let predicted = match self {
            Classifier::Knn(m) => m.predict(x)?,
            Classifier::LogisticRegression(m) => m.predict(x)?,
            Classifier::DecisionTree(m) => m.predict(x)?,
            Classifier::RandomForest(m) => m.predict(x)?,
        };
        Ok(predicted)
    }

    pub fn score(&self, x: &Matrix, y: &Labels) -> Result<f64, DataError> {
        Ok(accuracy(y, &self.predict(x)?))
    }
}

// ---------------------------------------------------------------------------
// Model selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub kind: ClassifierKind,
    pub validation_accuracy: f64,
}

pub struct Selection {
    pub best: Classifier,
    pub scores: Vec<CandidateScore>,
}

impl Selection {
    pub fn best_score(&self) -> f64 {
        let kind = self.best.kind();
        self.scores
            .iter()
            .find(|s| s.kind == kind)
            .map_or(0.0, |s| s.validation_accuracy)
    }
}

/// Fit every candidate on the training rows and keep the one with the
/// highest validation accuracy; ties go to the earlier candidate.
pub fn select_best(
    kinds: &[ClassifierKind],
    x_train: &Matrix,
    y_train: &Labels,
    x_val: &Matrix,
    y_val: &Labels,
    params: ClassifierParams,
) -> Result<Selection, DataError> {
    let mut best: Option<(Classifier, f64)> = None;
    let mut scores = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        let model = Classifier::fit(kind, x_train, y_train, params)?;
        let validation_accuracy = model.score(x_val, y_val)?;
        log::info!("  {:<20} validation accuracy {validation_accuracy:.4}", kind.name());
        scores.push(CandidateScore {
            kind,
            validation_accuracy,
        });
        if best.as_ref().map_or(true, |(_, s)| validation_accuracy > *s) {
            best = Some((model, validation_accuracy));
        }
    }

    let (best, _) = best.ok_or(DataError::EmptyDataset { stage: "candidate selection" })?;
    Ok(Selection { best, scores })
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

/// What `best_model.json` holds: the estimator plus what is needed to feed
/// it and read its output.
#[derive(Serialize, Deserialize)]
pub struct SavedClassifier {
    pub kind: ClassifierKind,
    pub feature_names: Vec<String>,
    pub labels: LabelEncoder,
    pub model: Classifier,
}

impl SavedClassifier {
    /// Predict class names; codes the encoder never saw come back as `<unknown>`.
    pub fn predict_labels(&self, x: &Matrix) -> Result<Vec<String>, DataError> {
        Ok(self
            .model
            .predict(x)?
            .into_iter()
            .map(|code| self.labels.decode(code).unwrap_or("<unknown>").to_string())
            .collect())
    }
}
