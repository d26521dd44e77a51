use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

/// (scientific name, common name, relative weight)
const TAXA: [(&str, &str, usize); 6] = [
    ("Ursus americanus", "American Black Bear", 60),
    ("Ursus americanus kermodei", "Kermode Black Bear", 4),
    ("Ursus arctos horribilis", "Grizzly Bear", 22),
    ("Ursus arctos", "Brown Bear", 8),
    ("Ursidae", "Bears", 3),
    ("Ursinae", "Typical Bears", 3),
];

/// Observation hotspots around BC: (lat, lon).
const HOTSPOTS: [(f64, f64); 7] = [
    (49.28, -123.12),
    (50.12, -122.95),
    (50.67, -120.33),
    (53.92, -122.75),
    (49.15, -125.90),
    (52.37, -126.75),
    (51.00, -118.20),
];

#[derive(Debug, Serialize)]
struct Row {
    id: u64,
    observed_on: String,
    scientific_name: String,
    common_name: String,
    latitude: f64,
    longitude: f64,
    image_url: String,
    quality_grade: &'static str,
}

fn generate(n: usize, rng: &mut SimpleRng) -> Vec<Row> {
    let total_weight: usize = TAXA.iter().map(|t| t.2).sum();

    (0..n)
        .map(|i| {
            let mut pick = rng.below(total_weight);
            let (sci, common, _) = TAXA
                .iter()
                .find(|t| {
                    if pick < t.2 {
                        true
                    } else {
                        pick -= t.2;
                        false
                    }
                })
                .copied()
                .unwrap_or(TAXA[0]);

            // More recent years get more observations.
            let year = 2012 + (rng.next_f64().sqrt() * 13.0) as i32;
            let month = 4 + rng.below(7);
            let day = 1 + rng.below(28);

            let (lat, lon) = HOTSPOTS[rng.below(HOTSPOTS.len())];
            let id = 10_000_000 + i as u64 * 37;

            Row {
                id,
                observed_on: format!("{year:04}-{month:02}-{day:02}"),
                scientific_name: sci.to_string(),
                common_name: common.to_string(),
                latitude: rng.gauss(lat, 0.35),
                longitude: rng.gauss(lon, 0.5),
                image_url: if rng.below(5) == 0 {
                    String::new()
                } else {
                    format!("https://inaturalist-open-data.s3.amazonaws.com/photos/{id}/medium.jpg")
                },
                quality_grade: if rng.below(3) == 0 { "needs_id" } else { "research" },
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn string_column(rows: &[Row], field: impl Fn(&Row) -> &str) -> StringArray {
    StringArray::from(rows.iter().map(field).collect::<Vec<_>>())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("observed_on", DataType::Utf8, false),
        Field::new("scientific_name", DataType::Utf8, false),
        Field::new("common_name", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("image_url", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(string_column(rows, |r| r.observed_on.as_str())),
            Arc::new(string_column(rows, |r| r.scientific_name.as_str())),
            Arc::new(string_column(rows, |r| r.common_name.as_str())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.latitude).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.longitude).collect::<Vec<_>>())),
            Arc::new(string_column(rows, |r| r.image_url.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Usage: `generate_sample [OUTPUT] [COUNT]`
/// OUTPUT ends in `.csv` (default `bear_observations_bc.csv`) or `.parquet`.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args
        .next()
        .unwrap_or_else(|| "bear_observations_bc.csv".to_string());
    let count: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid count '{n}'"))?,
        None => 2_000,
    };

    let mut rng = SimpleRng::new(42);
    let rows = generate(count, &mut rng);

    let path = Path::new(&output);
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(path, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(path, &rows)?,
        _ => bail!("output must end in .csv or .parquet: {output}"),
    }

    println!("Wrote {} observations to {output}", rows.len());
    Ok(())
}
