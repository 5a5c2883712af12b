//! Writes deterministic synthetic inputs for the three analyses under
//! `data/`, shaped like the public datasets they stand in for.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Months, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Iris
// ---------------------------------------------------------------------------

struct Flower {
    measurements: [f64; 4],
    species: &'static str,
}

fn iris_rows(rng: &mut SimpleRng) -> Vec<Flower> {
    // per-species (mean, std) of sepal length/width, petal length/width
    let species: [(&str, [(f64, f64); 4]); 3] = [
        ("Iris-setosa", [(5.01, 0.35), (3.43, 0.38), (1.46, 0.17), (0.25, 0.11)]),
        ("Iris-versicolor", [(5.94, 0.52), (2.77, 0.31), (4.26, 0.47), (1.33, 0.20)]),
        ("Iris-virginica", [(6.59, 0.64), (2.97, 0.32), (5.55, 0.55), (2.03, 0.27)]),
    ];
    let mut rows = Vec::with_capacity(150);
    for (name, dims) in &species {
        for _ in 0..50 {
            let mut measurements = [0.0; 4];
            for (m, &(mean, sd)) in measurements.iter_mut().zip(dims) {
                // one decimal like the original measurements
                *m = (rng.gauss(mean, sd).max(0.1) * 10.0).round() / 10.0;
            }
            rows.push(Flower { measurements, species: *name });
        }
    }
    rows
}

const IRIS_COLUMNS: [&str; 4] = ["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm"];

fn write_iris_csv(path: &Path, rows: &[Flower]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(std::iter::once("Id").chain(IRIS_COLUMNS).chain(["Species"]))?;
    for (i, row) in rows.iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(row.measurements.iter().map(|m| format!("{m:.1}")));
        record.push(row.species.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_iris_parquet(path: &Path, rows: &[Flower]) -> Result<()> {
    let mut fields = vec![Field::new("Id", DataType::Int64, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int64Array::from_iter_values(1..=rows.len() as i64))];
    for (k, name) in IRIS_COLUMNS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.measurements[k]),
        )));
    }
    fields.push(Field::new("Species", DataType::Utf8, false));
    columns.push(Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.species))));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building iris batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unemployment
// ---------------------------------------------------------------------------

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(1))?.pred_opt()
}

fn write_unemployment(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let regions = [
        ("Andhra Pradesh", 5.5),
        ("Assam", 4.5),
        ("Bihar", 10.5),
        ("Delhi", 16.0),
        ("Kerala", 8.0),
        ("Tripura", 25.0),
    ];
    let start = NaiveDate::from_ymd_opt(2019, 5, 1).context("start date")?;

    // Kaggle's export pads every header and cell with a leading space
    let mut text = String::from(
        "Region, Date, Frequency, Estimated Unemployment Rate (%), Estimated Employed, \
         Estimated Labour Participation Rate (%), Area\n",
    );
    for (region, base) in &regions {
        for area in ["Rural", "Urban"] {
            for m in 0..14 {
                let first = start + Months::new(m);
                let Some(date) = last_day_of_month(first) else {
                    continue;
                };
                // lockdown spike in April and May 2020
                let shock = if first.year() == 2020 && (4..=5).contains(&first.month()) { 15.0 } else { 0.0 };
                let urban = if area == "Urban" { 2.0 } else { 0.0 };
                let rate = (base + urban + shock + rng.gauss(0.0, 1.2)).max(0.0);
                let employed = 4_000_000.0 + rng.gauss(0.0, 250_000.0);
                let participation = 42.0 + rng.gauss(0.0, 2.5);
                let _ = writeln!(
                    text,
                    "{region}, {}, Monthly, {rate:.2}, {employed:.0}, {participation:.2}, {area}",
                    date.format("%d-%m-%Y")
                );
            }
        }
    }
    // the real file ends with blank records
    text.push_str(",,,,,,\n,,,,,,\n");
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Car prices
// ---------------------------------------------------------------------------

fn write_cars(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let models = [
        ("ritz", 5.6),
        ("sx4", 9.5),
        ("ciaz", 9.9),
        ("swift", 6.9),
        ("fortuner", 30.6),
        ("innova", 18.6),
        ("city", 13.6),
        ("Royal Enfield Classic 350", 1.5),
    ];
    let fuels = ["Petrol", "Petrol", "Petrol", "Diesel", "CNG"];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Car_Name",
        "Year",
        "Selling_Price",
        "Present_Price",
        "Kms_Driven",
        "Fuel_Type",
        "Seller_Type",
        "Transmission",
        "Owner",
    ])?;
    for _ in 0..300 {
        let (name, list_price) = models[rng.below(models.len())];
        let year = 2004 + rng.below(15) as i64;
        let age = (2019 - year) as f64;
        let present = (list_price * (1.0 + rng.gauss(0.0, 0.08))).max(0.3);
        let kms = (5_000.0 + age * 9_000.0 + rng.gauss(0.0, 8_000.0)).max(500.0) as i64;
        let fuel = fuels[rng.below(fuels.len())];
        let seller = if rng.next_f64() < 0.35 { "Individual" } else { "Dealer" };
        let transmission = if rng.next_f64() < 0.13 { "Automatic" } else { "Manual" };
        let owner = if rng.next_f64() < 0.05 { 1 } else { 0 };

        let mut price = present * 0.88f64.powf(age) - kms as f64 / 400_000.0;
        if fuel == "Diesel" {
            price *= 1.15;
        }
        if seller == "Individual" {
            price *= 0.9;
        }
        let price = (price + rng.gauss(0.0, 0.2)).max(0.1);

        writer.write_record([
            name.to_string(),
            year.to_string(),
            format!("{price:.2}"),
            format!("{present:.2}"),
            kms.to_string(),
            fuel.to_string(),
            seller.to_string(),
            transmission.to_string(),
            owner.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let dir = Path::new("data");
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut rng = SimpleRng::new(42);

    let flowers = iris_rows(&mut rng);
    write_iris_csv(&dir.join("iris.csv"), &flowers)?;
    write_iris_parquet(&dir.join("iris.parquet"), &flowers)?;
    write_unemployment(&dir.join("unemployment.csv"), &mut rng)?;
    write_cars(&dir.join("car data.csv"), &mut rng)?;

    println!(
        "Wrote {} flowers, 168 unemployment records and 300 cars to {}",
        flowers.len(),
        dir.display()
    );
    Ok(())
}
