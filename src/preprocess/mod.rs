/// Preprocessing: cleaning and reshaping a loaded [`Table`] before modelling.
///
/// * `encode`   – feature matrix / target split, one-hot and label encoding
/// * `rates`    – date and rate column detection for the unemployment series
/// * `resample` – bucket a dated series to a coarser frequency
pub mod encode;
pub mod rates;
pub mod resample;

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::data::model::{Table, Value};

// ---------------------------------------------------------------------------
// Cell cleaning
// ---------------------------------------------------------------------------

/// Strip `%` signs, thousands separators and whitespace, then parse.
pub fn clean_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Float(v) => Some(*v).filter(|v| v.is_finite()),
        Value::Integer(i) => Some(*i as f64),
        Value::String(s) => s
            .replace(['%', ','], "")
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite()),
        _ => None,
    }
}

const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y",
    "%d-%b-%Y",
];
const SHORT_YEAR_FORMATS: &[&str] = &["%d-%m-%y", "%d/%m/%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M:%S", "%d/%m/%Y %H:%M",
];
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%b %Y", "%B %Y", "%b-%Y"];

/// Parse a date, day first when ambiguous.  Month-only text maps to the
/// first of the month.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = match value {
        Value::Date(d) => return Some(*d),
        Value::String(s) => s.trim(),
        _ => return None,
    };

    // %Y happily reads "19" as year 19, so four-digit formats are tried
    // first and anything below year 1000 falls through to the short forms.
    let full_year = |d: &NaiveDate| d.year() >= 1000;
    DATE_FORMATS
        .iter()
        .filter_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .find(full_year)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
                .find(full_year)
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
        .or_else(|| {
            let padded = format!("1 {s}");
            MONTH_FORMATS
                .iter()
                .filter_map(|f| NaiveDate::parse_from_str(&padded, &format!("%d {f}")).ok())
                .find(full_year)
        })
}

// ---------------------------------------------------------------------------
// Target column lookup
// ---------------------------------------------------------------------------

pub const CAR_TARGET_ALIASES: &[&str] = &[
    "price", "Price", "selling_price", "Selling_Price", "selling price", "Selling Price",
    "target", "y", "label",
];

pub const IRIS_TARGET_ALIASES: &[&str] = &["species", "Species", "class", "variety", "target", "label"];

fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Resolve the target column: the requested name first (case-insensitive,
/// spaces and underscores equivalent), then the aliases in order.
pub fn find_target_column(table: &Table, requested: Option<&str>, aliases: &[&str]) -> Option<String> {
    let candidates: HashMap<String, &String> = table
        .column_names()
        .iter()
        .map(|c| (normalize_name(c), c))
        .collect();

    if let Some(requested) = requested {
        if let Some(c) = candidates.get(&normalize_name(requested)) {
            return Some((*c).clone());
        }
        if table.column_index(requested).is_some() {
            return Some(requested.to_string());
        }
    }

    aliases
        .iter()
        .find_map(|alias| candidates.get(&normalize_name(alias)))
        .map(|c| (*c).clone())
}
