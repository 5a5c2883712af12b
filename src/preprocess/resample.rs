use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Frequency / Aggregation
// ---------------------------------------------------------------------------

/// Bucket size, labelled by the bucket's first day (Pandas `MS`, `QS`, `YS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Prefix for output file names.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Capitalised label for chart titles.
    pub fn title(self) -> &'static str {
        match self {
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// Months per bucket.
    fn span(self) -> i32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 12,
        }
    }

    /// Consecutive integer key of the bucket containing `date`.
    fn key(self, date: NaiveDate) -> i32 {
        (date.year() * 12 + date.month0() as i32).div_euclid(self.span())
    }

    fn start(self, key: i32) -> Option<NaiveDate> {
        let months = key * self.span();
        NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)
    }
}

/// Reducer applied to the values falling in one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Sum,
    Min,
    Max,
}

impl Aggregation {
    /// An empty bucket sums to zero and has no mean, min or max.
    fn reduce(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return match self {
                Aggregation::Sum => Some(0.0),
                _ => None,
            };
        }
        let v = match self {
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(v)
    }
}

// ---------------------------------------------------------------------------
// TimeSeries
// ---------------------------------------------------------------------------

/// A regular series of bucket-start dates; `None` marks an empty bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Buckets that hold a value.
    pub fn observed(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// `(min, max)` over the present values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|(_, v)| *v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Bucket dated observations and reduce each bucket.
///
/// Every bucket between the first and last observation is emitted, so the
/// result is regular even when the input has gaps.  Non-finite values are
/// ignored.
pub fn resample(points: &[(NaiveDate, f64)], freq: Frequency, agg: Aggregation) -> TimeSeries {
    let mut buckets: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for &(date, value) in points {
        if value.is_finite() {
            buckets.entry(freq.key(date)).or_default().push(value);
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return TimeSeries::default();
    };

    let points = (first..=last)
        .filter_map(|key| {
            let start = freq.start(key)?;
            let values = buckets.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            Some((start, agg.reduce(values)))
        })
        .collect();
    TimeSeries { points }
}
