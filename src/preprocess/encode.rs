use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::model::{ColumnType, Table, Value};
use crate::error::DataError;

/// Text columns that identify a row rather than describe it.
const IDENTIFIER_COLUMNS: &[&str] = &["car_name", "name", "id"];

// ---------------------------------------------------------------------------
// FeatureSet – the numeric predictor matrix
// ---------------------------------------------------------------------------

/// Predictor columns flattened to `f64`, one inner vector per row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureSet {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }
}

/// Builds the predictor matrix from every column except `target`.
///
/// * identifier columns (`car_name`, `name`, `id`) are dropped,
/// * numeric and bool columns are kept in order, nulls imputed with the
///   column mean,
/// * text columns are one-hot encoded after them as `<col>_<value>`, sorted
///   categories with the first one dropped; a null row is all zeros.
pub fn encode_features(table: &Table, target: &str) -> Result<FeatureSet, DataError> {
    table.require_column(target)?;
    let mut dropped: Vec<&str> = vec![target];
    for name in table.column_names() {
        if IDENTIFIER_COLUMNS.contains(&name.to_lowercase().as_str()) {
            log::debug!("Dropping identifier column '{name}'");
            dropped.push(name);
        }
    }
    let table = &table.drop_columns(&dropped);

    let mut numeric: Vec<usize> = Vec::new();
    let mut categorical: Vec<usize> = Vec::new();
    for (col, name) in table.column_names().iter().enumerate() {
        match table.column_type(col) {
            ColumnType::Integer | ColumnType::Float | ColumnType::Bool => numeric.push(col),
            ColumnType::Text | ColumnType::Date => categorical.push(col),
            ColumnType::Empty => log::warn!("Dropping all-null column '{name}'"),
        }
    }

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for &col in &numeric {
        names.push(table.column_names()[col].clone());
        columns.push(impute_mean(table.column_values(col).map(Value::as_f64).collect()));
    }

    for &col in &categorical {
        let name = &table.column_names()[col];
        let categories: BTreeSet<String> =
            table.unique_values(col).iter().map(Value::to_string).collect();
        for category in categories.iter().skip(1) {
            names.push(format!("{name}_{category}"));
            columns.push(
                table
                    .column_values(col)
                    .map(|v| if !v.is_null() && v.to_string() == *category { 1.0 } else { 0.0 })
                    .collect(),
            );
        }
    }

    if names.is_empty() {
        return Err(DataError::EmptyDataset { stage: "feature encoding" });
    }

    let rows = (0..table.n_rows())
        .map(|r| columns.iter().map(|c| c[r]).collect())
        .collect();

    log::info!(
        "Encoded {} features ({} numeric, {} one-hot source columns)",
        names.len(),
        numeric.len(),
        categorical.len()
    );
    Ok(FeatureSet { names, rows })
}

fn impute_mean(values: Vec<Option<f64>>) -> Vec<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let mean = if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    };
    values.into_iter().map(|v| v.unwrap_or(mean)).collect()
}

/// Read the target column as numbers; every row must have one.
pub fn numeric_target(table: &Table, target: &str) -> Result<Vec<f64>, DataError> {
    let col = table.require_column(target)?;
    table
        .column_values(col)
        .enumerate()
        .map(|(row, v)| {
            v.as_f64().ok_or_else(|| DataError::NotNumeric {
                column: target.to_string(),
                row,
                value: v.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LabelEncoder – class names ↔ integer codes
// ---------------------------------------------------------------------------

/// Maps the sorted distinct labels of a column to `0..k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(table: &Table, column: &str) -> Result<Self, DataError> {
        let col = table.require_column(column)?;
        let classes: BTreeSet<String> =
            table.unique_values(col).iter().map(Value::to_string).collect();
        Ok(LabelEncoder {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn encode(&self, value: &Value) -> Option<i32> {
        let label = value.to_string();
        self.classes
            .binary_search(&label)
            .ok()
            .map(|i| i as i32)
    }

    pub fn decode(&self, code: i32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    /// Encode a whole column; a null or unseen label is an error.
    pub fn transform(&self, table: &Table, column: &str) -> Result<Vec<i32>, DataError> {
        let col = table.require_column(column)?;
        table
            .column_values(col)
            .enumerate()
            .map(|(row, v)| {
                self.encode(v).ok_or_else(|| DataError::NotNumeric {
                    column: column.to_string(),
                    row,
                    value: v.to_string(),
                })
            })
            .collect()
    }
}
