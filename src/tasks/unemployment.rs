use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{LineChart, render_line_chart};
use crate::color::{ColorMap, generate_palette};
use crate::config::UnemploymentConfig;
use crate::data::filter::group_indices;
use crate::data::loader::load_file;
use crate::data::model::Value;
use crate::error::DataError;
use crate::output::{prepare_dir, write_series_csv, write_table_csv, write_wide_series_csv};
use crate::preprocess::rates::{PreparedRates, RateColumns, prepare};
use crate::preprocess::resample::{TimeSeries, resample};

pub const PREPROCESSED_FILE: &str = "preprocessed_input.csv";

#[derive(Debug)]
pub struct UnemploymentSummary {
    pub rate_column: String,
    pub region_column: Option<String>,
    pub buckets: usize,
    pub observed: usize,
    pub regions: usize,
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for UnemploymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "unemployment: '{}' over {} buckets ({} with data)",
            self.rate_column, self.buckets, self.observed
        )?;
        if let Some(region) = &self.region_column {
            writeln!(f, "  {} series by '{region}'", self.regions)?;
        }
        super::list_outputs(f, &self.outputs)
    }
}

/// One resampled series per non-null value of the region column.
fn regional_series(
    prepared: &PreparedRates,
    region_column: &str,
    cfg: &UnemploymentConfig,
) -> Result<Vec<(Value, TimeSeries)>, DataError> {
    let groups = group_indices(&prepared.table, region_column)?;
    let mut out = Vec::with_capacity(groups.len());
    for (region, rows) in groups {
        let points = prepared.monthly_points(Some(rows.as_slice()))?;
        let series = resample(&points, cfg.frequency, cfg.aggregation);
        if series.is_empty() {
            log::debug!("Region {region} has no dated rates");
            continue;
        }
        out.push((region, series));
    }
    Ok(out)
}

/// Clean the rates, aggregate them per period overall and per region, and
/// chart both.
pub fn run(cfg: &UnemploymentConfig) -> Result<UnemploymentSummary> {
    let table = load_file(&cfg.input)?;

    let columns = RateColumns {
        date: cfg.date_column.clone(),
        rate: cfg.rate_column.clone(),
        year: cfg.year_column.clone(),
        month: cfg.month_column.clone(),
        region: cfg.region_column.clone(),
    };
    let prepared = prepare(table, &columns)?;
    let rate_column = prepared
        .clean_column
        .strip_suffix("_clean")
        .unwrap_or(&prepared.clean_column)
        .to_string();

    let points = prepared.monthly_points(None)?;
    if points.is_empty() {
        return Err(DataError::EmptyDataset { stage: "cleaning rates" }.into());
    }
    let overall = resample(&points, cfg.frequency, cfg.aggregation);
    log::info!(
        "{} {} buckets from {} observations",
        overall.len(),
        cfg.frequency.label(),
        points.len()
    );

    let regional = match &prepared.region_column {
        Some(column) => regional_series(&prepared, column, cfg)?,
        None => Vec::new(),
    };

    let label = cfg.frequency.label();
    prepare_dir(&cfg.outdir)?;
    let mut outputs = Vec::new();

    let path = cfg.outdir.join(PREPROCESSED_FILE);
    write_table_csv(&path, &prepared.table)?;
    outputs.push(path);

    let path = cfg.outdir.join(format!("{label}_timeseries.csv"));
    write_series_csv(&path, &overall, "rate")?;
    outputs.push(path);

    let path = cfg.outdir.join(format!("{label}_timeseries.png"));
    let colour = generate_palette(1)[0];
    let chart = LineChart::new()
        .with_title(format!("{} Unemployment Rate (aggregated)", cfg.frequency.title()))
        .with_axis_labels("Date", "Unemployment rate")
        .with_series("rate", colour, &overall);
    render_line_chart(&path, &chart)?;
    outputs.push(path);

    if let (Some(column), false) = (&prepared.region_column, regional.is_empty()) {
        let regions: BTreeSet<Value> = regional.iter().map(|(r, _)| r.clone()).collect();
        let colours = ColorMap::new(column, &regions);
        for (name, hex) in colours.legend_entries() {
            log::info!("  {column} {name}: {hex}");
        }

        let named: Vec<(String, &TimeSeries)> =
            regional.iter().map(|(r, s)| (r.to_string(), s)).collect();
        let path = cfg.outdir.join(format!("{label}_by_region.csv"));
        write_wide_series_csv(&path, &named)?;
        outputs.push(path);

        let chart = LineChart::new()
            .with_title(format!("{} Unemployment Rate by {column}", cfg.frequency.title()))
            .with_axis_labels("Date", "Unemployment rate")
            .with_legend();
        let chart = regional.iter().fold(chart, |chart, (region, series)| {
            chart.with_series(region.to_string(), colours.color_for(region), series)
        });
        let path = cfg.outdir.join(format!("{label}_by_region.png"));
        render_line_chart(&path, &chart)?;
        outputs.push(path);
    }

    Ok(UnemploymentSummary {
        rate_column,
        region_column: prepared.region_column.clone(),
        buckets: overall.len(),
        observed: overall.observed(),
        regions: regional.len(),
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::resample::Frequency;
    use crate::tasks::fixtures::{dir_listing, write_unemployment};

    fn config(dir: &std::path::Path) -> UnemploymentConfig {
        UnemploymentConfig {
            input: write_unemployment(dir),
            outdir: dir.join("out"),
            ..UnemploymentConfig::default()
        }
    }

    #[test]
    fn writes_overall_and_regional_series() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let summary = run(&cfg).unwrap();

        assert_eq!(summary.rate_column, "Estimated Unemployment Rate (%)");
        assert_eq!(summary.region_column.as_deref(), Some("Region"));
        assert_eq!(summary.regions, 2);
        // January to May with nothing in April
        assert_eq!((summary.buckets, summary.observed), (5, 4));

        let monthly = std::fs::read_to_string(cfg.outdir.join("monthly_timeseries.csv")).unwrap();
        let lines: Vec<&str> = monthly.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,rate",
                "2020-01-01,7",
                "2020-02-01,8",
                "2020-03-01,9",
                "2020-04-01,",
                "2020-05-01,10",
            ]
        );

        let by_region = std::fs::read_to_string(cfg.outdir.join("monthly_by_region.csv")).unwrap();
        assert!(by_region.starts_with("date,Assam,Bihar\n2020-01-01,4,10\n"));

        let preprocessed = std::fs::read_to_string(cfg.outdir.join(PREPROCESSED_FILE)).unwrap();
        let header = preprocessed.lines().next().unwrap();
        assert!(header.ends_with("Year,Month,Estimated Unemployment Rate (%)_clean"));
        assert!(preprocessed.contains("2020-02-29"));
        assert_eq!(preprocessed.lines().count(), 1 + 9);

        let png = std::fs::read(cfg.outdir.join("monthly_by_region.png")).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let chart = image::open(cfg.outdir.join("monthly_timeseries.png")).unwrap().to_rgb8();
        let dark = |p: &image::Rgb<u8>| p.0.iter().all(|&c| c < 100);
        // the title sits in the band above the plot area
        assert!((14..29).any(|y| (0..chart.width()).any(|x| dark(chart.get_pixel(x, y)))));
    }

    #[test]
    fn rerun_keeps_the_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        run(&cfg).unwrap();
        let first = dir_listing(&cfg.outdir);
        run(&cfg).unwrap();
        assert_eq!(dir_listing(&cfg.outdir), first);
        assert_eq!(
            first,
            vec![
                "monthly_by_region.csv",
                "monthly_by_region.png",
                "monthly_timeseries.csv",
                "monthly_timeseries.png",
                PREPROCESSED_FILE,
            ]
        );
    }

    #[test]
    fn quarterly_without_regions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "Date,Rate\n15-01-2021,3.5%\n15-02-2021,4.5%\n15-07-2021,6\n").unwrap();
        let cfg = UnemploymentConfig {
            input: path,
            outdir: dir.path().join("out"),
            frequency: Frequency::Quarterly,
            ..UnemploymentConfig::default()
        };
        let summary = run(&cfg).unwrap();
        assert_eq!(summary.region_column, None);
        assert_eq!((summary.buckets, summary.observed), (3, 2));
        assert_eq!(
            dir_listing(&cfg.outdir),
            vec![PREPROCESSED_FILE, "quarterly_timeseries.csv", "quarterly_timeseries.png"]
        );
    }

    #[test]
    fn missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = UnemploymentConfig {
            input: dir.path().join("absent.csv"),
            outdir: dir.path().join("out"),
            ..UnemploymentConfig::default()
        };
        assert!(run(&cfg).is_err());
        assert!(!cfg.outdir.exists());
    }
}
