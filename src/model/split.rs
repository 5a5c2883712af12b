use std::fmt::{Debug, Display};

use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::model_selection::train_test_split;

use crate::error::DataError;

/// One shuffled train/test partition of a feature matrix and its target.
pub struct Split<T> {
    pub x_train: DenseMatrix<f64>,
    pub x_test: DenseMatrix<f64>,
    pub y_train: Vec<T>,
    pub y_test: Vec<T>,
}

/// Row-major features to a dense matrix.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyDataset { stage: "preprocessing" });
    }
    Ok(DenseMatrix::from_2d_vec(&rows.to_vec()))
}

/// Shuffle with `seed` and hold out `test_size` of the rows.
///
/// The held-out count is `floor(n * test_size)`; a split leaving either
/// side empty is rejected.
pub fn train_test<T>(
    x: DenseMatrix<f64>,
    y: Vec<T>,
    test_size: f32,
    seed: u64,
) -> Result<Split<T>, DataError>
where
    T: Debug + Display + Copy,
{
    let n = y.len();
    let n_test = (n as f32 * test_size) as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::EmptySplit {
            rows: n,
            fraction: test_size,
        });
    }

    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, test_size, true, Some(seed));
    log::debug!(
        "Split {n} rows into {} train / {} test",
        y_train.len(),
        y_test.len()
    );
    Ok(Split {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![i as f64, (i * 2) as f64]).collect()
    }

    #[test]
    fn split_sizes_follow_fraction() {
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let split = train_test(to_matrix(&rows(10)).unwrap(), y, 0.2, 42).unwrap();
        assert_eq!(split.y_train.len(), 8);
        assert_eq!(split.y_test.len(), 2);
    }

    #[test]
    fn same_seed_same_partition() {
        let y: Vec<i32> = (0..20).collect();
        let a = train_test(to_matrix(&rows(20)).unwrap(), y.clone(), 0.25, 7).unwrap();
        let b = train_test(to_matrix(&rows(20)).unwrap(), y, 0.25, 7).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.y_train, b.y_train);
    }

    #[test]
    fn tiny_inputs_are_rejected() {
        let err = train_test(to_matrix(&rows(3)).unwrap(), vec![1.0, 2.0, 3.0], 0.2, 1);
        assert!(matches!(err, Err(DataError::EmptySplit { rows: 3, .. })));
        assert!(matches!(to_matrix(&[]), Err(DataError::EmptyDataset { .. })));
    }
}
