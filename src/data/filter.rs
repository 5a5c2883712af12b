use std::collections::BTreeMap;

use super::model::{Table, Value};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Row predicates over a table
// ---------------------------------------------------------------------------

/// Return indices of rows with a non-null value in every named column.
pub fn complete_indices(table: &Table, columns: &[&str]) -> Result<Vec<usize>, DataError> {
    let cols = columns
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| cols.iter().all(|&c| !row[c].is_null()))
        .map(|(i, _)| i)
        .collect())
}

/// `dropna(subset=columns)`: keep only rows complete in the named columns.
pub fn drop_missing(table: &Table, columns: &[&str]) -> Result<Table, DataError> {
    let keep = complete_indices(table, columns)?;
    let dropped = table.n_rows() - keep.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} rows with missing {}", columns.join("/"));
    }
    Ok(table.select_rows(&keep))
}

/// Partition row indices by the value of one column.
///
/// Rows where the column is null belong to no group.
pub fn group_indices(table: &Table, column: &str) -> Result<BTreeMap<Value, Vec<usize>>, DataError> {
    let col = table.require_column(column)?;
    let mut groups: BTreeMap<Value, Vec<usize>> = BTreeMap::new();
    for (i, val) in table.column_values(col).enumerate() {
        if val.is_null() {
            continue;
        }
        groups.entry(val.clone()).or_default().push(i);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Table {
        Table::new(
            vec!["Region".into(), "Rate".into()],
            vec![
                vec![Value::String("Assam".into()), Value::Float(4.2)],
                vec![Value::String("Bihar".into()), Value::Null],
                vec![Value::Null, Value::Float(3.0)],
                vec![Value::String("Assam".into()), Value::Float(5.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn drop_missing_checks_only_named_columns() {
        let t = regions();
        assert_eq!(drop_missing(&t, &["Rate"]).unwrap().n_rows(), 3);
        assert_eq!(drop_missing(&t, &["Region", "Rate"]).unwrap().n_rows(), 2);
        assert!(drop_missing(&t, &["Nope"]).is_err());
    }

    #[test]
    fn groups_skip_null_keys() {
        let groups = group_indices(&regions(), "Region").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Value::String("Assam".into())], vec![0, 3]);
        assert_eq!(groups[&Value::String("Bihar".into())], vec![1]);
    }
}
