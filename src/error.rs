use thiserror::Error;

/// Domain failures raised while loading, reshaping or modelling a table.
///
/// I/O problems are reported through `anyhow` context at the call site; this
/// enum only covers what is wrong with the *data*.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("column '{name}' not found (available: {})", available.join(", "))]
    ColumnNotFound { name: String, available: Vec<String> },

    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column '{name}' has {found} values but the table has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}', row {row}: '{value}' is not numeric")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("no usable date column found; pass --date-col")]
    NoDateColumn,

    #[error("could not detect the rate column; pass --rate-col")]
    NoRateColumn,

    #[error("could not find a target column; pass --target with one of: {}", available.join(", "))]
    NoTargetColumn { available: Vec<String> },

    #[error("dataset is empty after {stage}")]
    EmptyDataset { stage: &'static str },

    #[error("split of {rows} rows with test fraction {fraction} leaves an empty side")]
    EmptySplit { rows: usize, fraction: f32 },

    #[error("estimator failed: {0}")]
    Model(#[from] smartcore::error::Failed),
}
