use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Scalar evaluation metrics
// ---------------------------------------------------------------------------

/// Fraction of exact matches.  Empty input scores 0.
pub fn accuracy<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    hits as f64 / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(a, b)| (a - b).powi(2)))
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(a, b)| (a - b).abs()))
}

/// Coefficient of determination.  With a constant `y_true` it is 1 for a
/// perfect prediction and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let y_mean = mean(y_true.iter().copied());
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(a, b)| (a - b).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// MetricsReport
// ---------------------------------------------------------------------------

/// Ordered `name: value` pairs, written verbatim to `metrics.txt`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    entries: Vec<(String, f64)>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            let _ = writeln!(out, "{name}: {value}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy::<i32>(&[], &[]), 0.0);
    }

    #[test]
    fn regression_errors() {
        let y = [3.0, -0.5, 2.0, 7.0];
        let p = [2.5, 0.0, 2.0, 8.0];
        assert!((mean_squared_error(&y, &p) - 0.375).abs() < 1e-12);
        assert!((mean_absolute_error(&y, &p) - 0.5).abs() < 1e-12);
        assert!((r2_score(&y, &p) - 0.948_608_137_044_967_9).abs() < 1e-12);
    }

    #[test]
    fn r2_with_constant_truth() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn report_renders_in_insertion_order() {
        let mut report = MetricsReport::new();
        report.push("mse", 0.5);
        report.push("r2", 0.25);
        assert_eq!(report.to_text(), "mse: 0.5\nr2: 0.25\n");
        assert_eq!(report.get("r2"), Some(0.25));
        assert_eq!(report.get("mae"), None);
    }
}
