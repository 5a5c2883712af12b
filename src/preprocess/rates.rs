use chrono::{Datelike, NaiveDate};

use super::{clean_numeric, parse_date};
use crate::data::model::{Table, Value};
use crate::error::DataError;

const DATE_CANDIDATES: &[&str] = &["Date", "date", "DATE", "Period", "Month"];
const RATE_KEYWORDS: &[&str] = &["unemployment", "rate", "estimated unemployment"];
const REGION_CANDIDATES: &[&str] = &["Region", "region", "State", "state", "Area"];

/// Column names the caller may pin instead of relying on detection.
#[derive(Debug, Clone, Default)]
pub struct RateColumns {
    pub date: Option<String>,
    pub rate: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub region: Option<String>,
}

/// The input table with `Year`, `Month` and `<rate>_clean` filled in.
#[derive(Debug, Clone)]
pub struct PreparedRates {
    pub table: Table,
    pub year_column: String,
    pub month_column: String,
    pub clean_column: String,
    pub region_column: Option<String>,
}

fn count_dates(table: &Table, col: usize) -> usize {
    table
        .column_values(col)
        .filter(|v| parse_date(v).is_some())
        .count()
}

/// Pick the date column: the provided one, then a well-known name where more
/// than a quarter of rows parse, then any non-numeric column where more than
/// half parse.
pub fn detect_date_column(table: &Table, provided: Option<&str>) -> Result<String, DataError> {
    if let Some(p) = provided.filter(|p| table.column_index(p).is_some()) {
        return Ok(p.to_string());
    }

    let n = table.n_rows();
    for name in DATE_CANDIDATES {
        if let Some(col) = table.column_index(name) {
            if count_dates(table, col) * 4 > n {
                return Ok(name.to_string());
            }
        }
    }

    (0..table.n_cols())
        .filter(|&c| !table.column_type(c).is_numeric())
        .find(|&c| count_dates(table, c) * 2 > n)
        .map(|c| table.column_names()[c].clone())
        .ok_or(DataError::NoDateColumn)
}

/// Pick the rate column: the provided one, then the first name containing a
/// rate keyword, then the first column (other than `exclude`) whose values
/// are mostly numeric after cleaning.
pub fn detect_rate_column(
    table: &Table,
    provided: Option<&str>,
    exclude: &[&str],
) -> Result<String, DataError> {
    if let Some(p) = provided.filter(|p| table.column_index(p).is_some()) {
        return Ok(p.to_string());
    }

    let names = table.column_names();
    for key in RATE_KEYWORDS {
        if let Some(name) = names
            .iter()
            .filter(|c| !exclude.contains(&c.as_str()))
            .find(|c| c.to_lowercase().contains(key))
        {
            return Ok(name.clone());
        }
    }

    let n = table.n_rows();
    (0..table.n_cols())
        .filter(|&c| !exclude.contains(&names[c].as_str()))
        .find(|&c| table.column_values(c).filter_map(clean_numeric).count() * 2 > n)
        .map(|c| names[c].clone())
        .ok_or(DataError::NoRateColumn)
}

pub fn detect_region_column(table: &Table, provided: Option<&str>) -> Option<String> {
    provided
        .into_iter()
        .chain(REGION_CANDIDATES.iter().copied())
        .find(|c| table.column_index(c).is_some())
        .map(str::to_string)
}

/// Parse dates into `Year`/`Month`, clean the rate column, and locate the
/// region column.  Pre-existing year and month columns are used as-is when
/// both are named in `columns`.
pub fn prepare(table: Table, columns: &RateColumns) -> Result<PreparedRates, DataError> {
    let existing_year_month = match (&columns.year, &columns.month) {
        (Some(y), Some(m)) if table.column_index(y).is_some() && table.column_index(m).is_some() => {
            Some((y.clone(), m.clone()))
        }
        _ => None,
    };

    let (table, year_column, month_column, date_column) = match existing_year_month {
        Some((year, month)) => {
            log::info!("Using existing '{year}'/'{month}' columns");
            (table, year, month, None)
        }
        None => {
            let date_column = detect_date_column(&table, columns.date.as_deref())?;
            log::info!("Using date column '{date_column}'");
            let col = table.require_column(&date_column)?;
            let dates: Vec<Option<NaiveDate>> = table.column_values(col).map(parse_date).collect();
            let unparsed = dates.iter().filter(|d| d.is_none()).count();
            if unparsed > 0 {
                log::warn!("{unparsed} values in '{date_column}' are not dates");
            }

            let table = table
                .with_column(&date_column, dates.iter().map(|d| d.map_or(Value::Null, Value::Date)).collect())?
                .with_column(
                    "Year",
                    dates.iter().map(|d| d.map_or(Value::Null, |d| Value::Integer(d.year() as i64))).collect(),
                )?
                .with_column(
                    "Month",
                    dates.iter().map(|d| d.map_or(Value::Null, |d| Value::Integer(d.month() as i64))).collect(),
                )?;
            (table, "Year".to_string(), "Month".to_string(), Some(date_column))
        }
    };

    let mut exclude: Vec<&str> = vec![year_column.as_str(), month_column.as_str()];
    if let Some(d) = date_column.as_deref() {
        exclude.push(d);
    }
    let rate_column = detect_rate_column(&table, columns.rate.as_deref(), &exclude)?;
    log::info!("Using rate column '{rate_column}'");

    let col = table.require_column(&rate_column)?;
    let cleaned: Vec<Value> = table
        .column_values(col)
        .map(|v| clean_numeric(v).map_or(Value::Null, Value::Float))
        .collect();
    let clean_column = format!("{rate_column}_clean");
    let table = table.with_column(&clean_column, cleaned)?;

    let region_column = detect_region_column(&table, columns.region.as_deref());

    Ok(PreparedRates {
        table,
        year_column,
        month_column,
        clean_column,
        region_column,
    })
}

impl PreparedRates {
    /// `(first of month, cleaned rate)` for every row where year, month and
    /// rate are all present, restricted to `rows` when given.
    pub fn monthly_points(&self, rows: Option<&[usize]>) -> Result<Vec<(NaiveDate, f64)>, DataError> {
        let y = self.table.require_column(&self.year_column)?;
        let m = self.table.require_column(&self.month_column)?;
        let r = self.table.require_column(&self.clean_column)?;

        let all: Vec<usize>;
        let rows = match rows {
            Some(rows) => rows,
            None => {
                all = (0..self.table.n_rows()).collect();
                &all
            }
        };

        Ok(rows
            .iter()
            .filter_map(|&i| {
                let year = self.table.cell(i, y).as_f64()?;
                let month = self.table.cell(i, m).as_f64()?;
                let rate = self.table.cell(i, r).as_f64()?;
                let date = NaiveDate::from_ymd_opt(year as i32, month as u32, 1)?;
                Some((date, rate))
            })
            .collect())
    }
}
