mod glyphs;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use image::{Rgb, RgbImage};

use crate::preprocess::resample::TimeSeries;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([228, 228, 228]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const TITLE_SCALE: u32 = 3;

// ---------------------------------------------------------------------------
// Line chart description
// ---------------------------------------------------------------------------

pub struct ChartSeries<'a> {
    pub name: String,
    pub color: Rgb<u8>,
    pub series: &'a TimeSeries,
}

/// A dated line chart, rendered headless to PNG.
pub struct LineChart<'a> {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub legend: bool,
    pub series: Vec<ChartSeries<'a>>,
}

impl<'a> LineChart<'a> {
    /// 1000×400, the 10×4 inch figure at 100 dpi.
    pub fn new() -> Self {
        LineChart {
            width: 1000,
            height: 400,
            title: None,
            x_label: None,
            y_label: None,
            legend: false,
            series: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_axis_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = Some(x.into());
        self.y_label = Some(y.into());
        self
    }

    /// Draw a keyed box of series names to the right of the plot.
    pub fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }

    pub fn with_series(mut self, name: impl Into<String>, color: Rgb<u8>, series: &'a TimeSeries) -> Self {
        self.series.push(ChartSeries {
            name: name.into(),
            color,
            series,
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Plot area geometry
// ---------------------------------------------------------------------------

struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn px(&self, day: f64) -> f64 {
        self.left + (day - self.x_min) / (self.x_max - self.x_min) * (self.right - self.left)
    }

    fn py(&self, value: f64) -> f64 {
        self.bottom - (value - self.y_min) / (self.y_max - self.y_min) * (self.bottom - self.top)
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Round a raw tick spacing up to 1, 2 or 5 × 10^k.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

const MAX_DECIMALS: usize = 6;

/// Tick values between `lo` and `hi` and the decimals to print them with.
/// A span too narrow to step through gets a single tick at `lo`.
fn y_ticks(lo: f64, hi: f64) -> (Vec<f64>, usize) {
    let step = nice_step((hi - lo) / 5.0);
    if !step.is_finite() || step <= 0.0 {
        return (vec![lo], 0);
    }
    let decimals = if step >= 1.0 {
        0
    } else {
        ((-step.log10().floor()) as usize).min(MAX_DECIMALS)
    };
    let first = (lo / step).ceil();
    let last = (hi / step).floor();
    if !(last - first).is_finite() || last - first > 50.0 {
        return (vec![lo], decimals);
    }
    let ticks = (first as i64..=last as i64).map(|k| k as f64 * step).collect();
    (ticks, decimals)
}

/// Month starts between `first` and `last`, thinned to at most `max` labels.
fn month_ticks(first: NaiveDate, last: NaiveDate, max: usize) -> Vec<NaiveDate> {
    let Some(start) = NaiveDate::from_ymd_opt(first.year(), first.month(), 1) else {
        return Vec::new();
    };
    let months = ((last.year() - start.year()) * 12 + last.month() as i32 - start.month() as i32).max(0) as usize + 1;
    let step = months.div_ceil(max.max(1)).max(1);
    (0..months)
        .step_by(step)
        .filter_map(|m| start.checked_add_months(Months::new(m as u32)))
        .filter(|d| *d >= first && *d <= last)
        .collect()
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

const LEGEND_ROW: u32 = glyphs::HEIGHT + 6;
const SWATCH: u32 = 16;

/// Column layout of the legend: rows per column and the column width.
struct LegendLayout {
    rows: usize,
    column_width: u32,
    columns: usize,
}

impl LegendLayout {
    fn new(chart: &LineChart, plot_height: u32) -> Option<Self> {
        if !chart.legend || chart.series.is_empty() {
            return None;
        }
        let rows = ((plot_height.saturating_sub(8)) / LEGEND_ROW).max(1) as usize;
        let widest = chart
            .series
            .iter()
            .map(|s| glyphs::text_width(&s.name))
            .max()
            .unwrap_or(0);
        Some(LegendLayout {
            rows,
            column_width: SWATCH + 6 + widest + 10,
            columns: chart.series.len().div_ceil(rows),
        })
    }

    fn width(&self) -> u32 {
        self.columns as u32 * self.column_width + 8
    }
}

fn draw_legend(img: &mut RgbImage, layout: &LegendLayout, left: i64, top: i64, chart: &LineChart) {
    let shown = chart.series.len().min(layout.rows) as i64;
    let (right, bottom) = (left + layout.width() as i64, top + shown * LEGEND_ROW as i64 + 8);
    for x in left..=right {
        put(img, x, top, AXIS);
        put(img, x, bottom, AXIS);
    }
    for y in top..=bottom {
        put(img, left, y, AXIS);
        put(img, right, y, AXIS);
    }
    for (i, s) in chart.series.iter().enumerate() {
        let x = left + 6 + (i / layout.rows) as i64 * layout.column_width as i64;
        let y = top + 6 + (i % layout.rows) as i64 * LEGEND_ROW as i64;
        let mid = y + (glyphs::HEIGHT / 2) as i64;
        for dx in 0..SWATCH as i64 {
            put(img, x + dx, mid - 1, s.color);
            put(img, x + dx, mid, s.color);
            put(img, x + dx, mid + 1, s.color);
        }
        glyphs::draw_text(img, x + SWATCH as i64 + 6, y, &s.name, AXIS);
    }
}

// ---------------------------------------------------------------------------
// Rasterisation
// ---------------------------------------------------------------------------

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham with a 2px pen.
fn draw_line(img: &mut RgbImage, (x0, y0): (f64, f64), (x1, y1): (f64, f64), color: Rgb<u8>) {
    let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
    let (xe, ye) = (x1.round() as i64, y1.round() as i64);
    let dx = (xe - x).abs();
    let dy = -(ye - y).abs();
    let sx = if x < xe { 1 } else { -1 };
    let sy = if y < ye { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        put(img, x + 1, y, color);
        put(img, x, y + 1, color);
        if x == xe && y == ye {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_dot(img: &mut RgbImage, (x, y): (f64, f64), color: Rgb<u8>) {
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for dx in -2..=2 {
        for dy in -2..=2 {
            put(img, cx + dx, cy + dy, color);
        }
    }
}

/// Render the chart and write it as PNG, replacing any existing file.
///
/// Consecutive present buckets are joined; an empty bucket breaks the line
/// and an isolated point is drawn as a dot.
pub fn render_line_chart(path: &Path, chart: &LineChart) -> Result<()> {
    let mut img = RgbImage::from_pixel(chart.width, chart.height, WHITE);

    let dates = chart
        .series
        .iter()
        .flat_map(|s| [s.series.first_date(), s.series.last_date()])
        .flatten();
    let (first, last) = dates.fold((None::<NaiveDate>, None::<NaiveDate>), |(lo, hi), d| {
        (Some(lo.map_or(d, |l| l.min(d))), Some(hi.map_or(d, |h| h.max(d))))
    });
    let values = chart
        .series
        .iter()
        .filter_map(|s| s.series.value_range())
        .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)));

    let frame = match (first, last, values) {
        (Some(first), Some(last), Some((lo, hi))) => {
            let (mut x_min, mut x_max) = (day_number(first), day_number(last));
            if x_max - x_min < 1.0 {
                x_min -= 15.0;
                x_max += 15.0;
            }
            let pad = if hi > lo { (hi - lo) * 0.05 } else { (lo.abs() * 0.05).max(1.0) };
            Some(Frame {
                left: if chart.y_label.is_some() { 90.0 } else { 70.0 },
                right: chart.width as f64 - 20.0,
                top: if chart.title.is_some() { 44.0 } else { 20.0 },
                bottom: chart.height as f64 - if chart.x_label.is_some() { 56.0 } else { 40.0 },
                x_min,
                x_max,
                y_min: lo - pad,
                y_max: hi + pad,
            })
        }
        _ => None,
    };

    if let Some(title) = &chart.title {
        let w = glyphs::scaled_width(title, TITLE_SCALE) as i64;
        glyphs::draw_scaled(&mut img, (chart.width as i64 - w) / 2, 14, title, AXIS, TITLE_SCALE);
    }

    if let Some(mut frame) = frame {
        let legend = LegendLayout::new(chart, (frame.bottom - frame.top) as u32);
        if let Some(layout) = &legend {
            frame.right -= layout.width() as f64 + 12.0;
        }
        if frame.right - frame.left < 50.0 {
            log::warn!("Legend leaves no room to plot in {}", path.display());
        }
        draw_axes(&mut img, &frame, first, last);
        draw_axis_labels(&mut img, &frame, chart);
        for s in &chart.series {
            draw_series(&mut img, &frame, s);
        }
        if let Some(layout) = &legend {
            draw_legend(&mut img, layout, frame.right as i64 + 12, frame.top as i64, chart);
        }
    } else {
        log::warn!("Nothing to plot for {}; writing an empty chart", path.display());
    }

    img.save(path)
        .with_context(|| format!("writing chart {}", path.display()))?;
    log::info!("Saved chart to {}", path.display());
    Ok(())
}

fn draw_axes(img: &mut RgbImage, frame: &Frame, first: Option<NaiveDate>, last: Option<NaiveDate>) {
    let (left, right) = (frame.left as i64, frame.right as i64);
    let (top, bottom) = (frame.top as i64, frame.bottom as i64);

    let (ticks, decimals) = y_ticks(frame.y_min, frame.y_max);
    for v in ticks {
        let y = frame.py(v).round() as i64;
        for x in left..=right {
            put(img, x, y, GRID);
        }
        let label = format!("{v:.decimals$}");
        let w = glyphs::text_width(&label) as i64;
        glyphs::draw_text(img, left - 8 - w, y - (glyphs::HEIGHT / 2) as i64, &label, AXIS);
    }

    if let (Some(first), Some(last)) = (first, last) {
        for d in month_ticks(first, last, 8) {
            let x = frame.px(day_number(d)).round() as i64;
            for y in top..=bottom {
                put(img, x, y, GRID);
            }
            let label = format!("{:04}-{:02}", d.year(), d.month());
            let w = glyphs::text_width(&label) as i64;
            glyphs::draw_text(img, x - w / 2, bottom + 10, &label, AXIS);
        }
    }

    for x in left..=right {
        put(img, x, bottom, AXIS);
    }
    for y in top..=bottom {
        put(img, left, y, AXIS);
    }
}

fn draw_axis_labels(img: &mut RgbImage, frame: &Frame, chart: &LineChart) {
    if let Some(label) = &chart.x_label {
        let w = glyphs::text_width(label) as i64;
        let centre = ((frame.left + frame.right) / 2.0) as i64;
        glyphs::draw_text(img, centre - w / 2, frame.bottom as i64 + 32, label, AXIS);
    }
    if let Some(label) = &chart.y_label {
        let h = glyphs::text_width(label) as i64;
        let centre = ((frame.top + frame.bottom) / 2.0) as i64;
        glyphs::draw_vertical(img, 8, centre - h / 2, label, AXIS, WHITE);
    }
}

fn draw_series(img: &mut RgbImage, frame: &Frame, s: &ChartSeries) {
    let points: Vec<Option<(f64, f64)>> = s
        .series
        .points
        .iter()
        .map(|(d, v)| v.map(|v| (frame.px(day_number(*d)), frame.py(v))))
        .collect();

    for (i, p) in points.iter().enumerate() {
        let Some(p) = *p else { continue };
        let prev = i.checked_sub(1).and_then(|j| points[j]);
        let next = points.get(i + 1).copied().flatten();
        match next {
            Some(n) => draw_line(img, p, n, s.color),
            None if prev.is_none() => draw_dot(img, p, s.color),
            None => {}
        }
    }
    log::debug!("Plotted series '{}' ({} buckets)", s.name, s.series.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(0.37), 0.5);
        assert_eq!(nice_step(1.2), 2.0);
        assert_eq!(nice_step(40.0), 50.0);
        let (ticks, decimals) = y_ticks(0.0, 10.0);
        assert_eq!(ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(decimals, 0);
    }

    #[test]
    fn month_ticks_are_thinned() {
        let ticks = month_ticks(ymd(2019, 1, 1), ymd(2020, 12, 1), 8);
        assert!(ticks.len() <= 8);
        assert_eq!(ticks[0], ymd(2019, 1, 1));
        assert_eq!(month_ticks(ymd(2020, 3, 1), ymd(2020, 3, 1), 8), vec![ymd(2020, 3, 1)]);
    }

    #[test]
    fn renders_png_with_series_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let series = TimeSeries {
            points: vec![
                (ymd(2020, 1, 1), Some(5.0)),
                (ymd(2020, 2, 1), Some(7.0)),
                (ymd(2020, 3, 1), None),
                (ymd(2020, 4, 1), Some(6.0)),
            ],
        };
        let red = Rgb([200, 0, 0]);
        render_line_chart(&path, &LineChart::new().with_series("rate", red, &series)).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (1000, 400));
        assert!(img.pixels().any(|p| *p == red));
    }

    #[test]
    fn flat_span_gets_one_tick() {
        assert_eq!(y_ticks(1e20, 1e20), (vec![1e20], 0));
        let (_, decimals) = y_ticks(0.0, 1e-12);
        assert!(decimals <= MAX_DECIMALS);
    }

    #[test]
    fn huge_values_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        let series = TimeSeries {
            points: vec![(ymd(2020, 1, 1), Some(1e20)), (ymd(2020, 2, 1), Some(1e20))],
        };
        let red = Rgb([200, 0, 0]);
        render_line_chart(&path, &LineChart::new().with_series("rate", red, &series)).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert!(img.pixels().any(|p| *p == red));
    }

    #[test]
    fn title_labels_and_legend_are_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let series = TimeSeries {
            points: vec![(ymd(2020, 1, 1), Some(5.0)), (ymd(2020, 2, 1), Some(7.0))],
        };
        let (red, blue) = (Rgb([200, 0, 0]), Rgb([0, 0, 200]));

        let bare = dir.path().join("bare.png");
        render_line_chart(&bare, &LineChart::new().with_series("Assam", red, &series)).unwrap();
        let labelled = dir.path().join("labelled.png");
        let chart = LineChart::new()
            .with_title("Monthly Unemployment Rate (aggregated)")
            .with_axis_labels("Date", "Unemployment rate")
            .with_legend()
            .with_series("Assam", red, &series)
            .with_series("Bihar", blue, &series);
        render_line_chart(&labelled, &chart).unwrap();

        let bare = image::open(&bare).unwrap().to_rgb8();
        let img = image::open(&labelled).unwrap().to_rgb8();
        let inked = |img: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>| {
            ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
                .any(|(x, y)| *img.get_pixel(x, y) == AXIS)
        };
        // title band above the plot
        assert!(inked(&img, 0..1000, 10..32));
        assert!(!inked(&bare, 0..1000, 10..18));
        // x label under the month ticks, y label down the left edge
        assert!(inked(&img, 0..1000, 370..390));
        assert!(inked(&img, 0..20, 100..300));
        // legend swatches sit right of the plot
        let right_strip = |c: Rgb<u8>| (900..1000).any(|x| (44..120).any(|y| *img.get_pixel(x, y) == c));
        assert!(right_strip(red) && right_strip(blue));
    }

    #[test]
    fn empty_chart_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let series = TimeSeries::default();
        render_line_chart(&path, &LineChart::new().with_series("rate", WHITE, &series)).unwrap();
        assert!(path.exists());
    }
}
