use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

use crate::error::DataError;

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common Pandas dtypes.
/// Category sets and region grouping key on `Value`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so Value can live in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

/// Renders the value the way it is written back to CSV: full float precision,
/// ISO dates, and an empty string for `Null`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

/// Cell texts read as missing, the same set Pandas' `read_csv` uses.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl Value {
    /// A float cell; NaN and infinities are missing.
    pub fn float(v: f64) -> Value {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }

    /// Interpret the value as an `f64` (bools count as 0/1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Guess the type of a raw text cell.
    pub fn infer(s: &str) -> Value {
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::float(f);
        }
        if s == "true" || s == "false" {
            return Value::Bool(s == "true");
        }
        Value::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ColumnType – the dtype inferred for a whole column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Date,
    Text,
    /// Every cell is null.
    Empty,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    fn of(value: &Value) -> Option<ColumnType> {
        match value {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Date(_) => Some(ColumnType::Date),
            Value::String(_) => Some(ColumnType::Text),
        }
    }

    fn unify(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Empty, b) => b,
            (a, Empty) => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Rows × named columns, loaded verbatim from a file.
///
/// Every row holds exactly one cell per column; the constructors enforce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    column_names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DataError> {
        let expected = column_names.len();
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != expected)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(DataError::RaggedRow {
                row,
                expected,
                found,
            });
        }
        Ok(Table { column_names, rows })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.column_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`] but fails with the list of known columns.
    pub fn require_column(&self, name: &str) -> Result<usize, DataError> {
        self.column_index(name)
            .ok_or_else(|| DataError::ColumnNotFound {
                name: name.to_string(),
                available: self.column_names.clone(),
            })
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    pub fn column_type(&self, col: usize) -> ColumnType {
        self.column_values(col)
            .filter_map(ColumnType::of)
            .fold(ColumnType::Empty, ColumnType::unify)
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.n_cols()).map(|c| self.column_type(c)).collect()
    }

    /// Sorted distinct non-null values of a column.
    pub fn unique_values(&self, col: usize) -> BTreeSet<Value> {
        self.column_values(col)
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// A new table holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            column_names: self.column_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Replace an existing column or append a new one.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Table, DataError> {
        if values.len() != self.n_rows() {
            return Err(DataError::ColumnLength {
                name: name.to_string(),
                expected: self.n_rows(),
                found: values.len(),
            });
        }
        match self.column_index(name) {
            Some(col) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[col] = v;
                }
            }
            None => {
                self.column_names.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(self)
    }

    /// Drop the named columns; unknown names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        let keep: Vec<usize> = (0..self.n_cols())
            .filter(|&c| !names.contains(&self.column_names[c].as_str()))
            .collect();
        Table {
            column_names: keep.iter().map(|&c| self.column_names[c].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&c| r[c].clone()).collect())
                .collect(),
        }
    }
}
