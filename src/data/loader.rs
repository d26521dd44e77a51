use std::path::Path;

use arrow::array::{Array, Float32Array, Float64Array};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::error::LoadError;
use super::model::RawObservation;

/// Columns every source must provide. Anything else is ignored.
pub const OBSERVED_ON: &str = "observed_on";
pub const SCIENTIFIC_NAME: &str = "scientific_name";
pub const COMMON_NAME: &str = "common_name";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const IMAGE_URL: &str = "image_url";

/// In the order [`resolve_columns`] returns their positions.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    OBSERVED_ON,
    SCIENTIFIC_NAME,
    COMMON_NAME,
    LATITUDE,
    LONGITUDE,
    IMAGE_URL,
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load raw observation rows from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, required columns located by name
/// * `.json`         – `[{ "observed_on": "...", "latitude": 49.2, ... }, ...]`
/// * `.parquet`      – one column per field, text or numeric
pub fn load_records(path: &Path) -> Result<Vec<RawObservation>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, b','),
        "tsv" => load_csv(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: other.to_string(),
        }),
    }
}

// -- Field helpers shared by all formats --

/// Positions of [`REQUIRED_COLUMNS`], in that order. The first column `find`
/// cannot locate is reported.
fn resolve_columns(
    mut find: impl FnMut(&str) -> Option<usize>,
) -> Result<[usize; REQUIRED_COLUMNS.len()], LoadError> {
    let mut positions = [0; REQUIRED_COLUMNS.len()];
    for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = find(name).ok_or_else(|| LoadError::MissingColumn {
            column: name.to_string(),
        })?;
    }
    Ok(positions)
}

/// A text value that must be present and non-blank.
fn required_text(value: Option<String>, row: usize, col: &str) -> Result<String, LoadError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LoadError::malformed(row, format!("missing value for '{col}'"))),
    }
}

fn parse_coordinate(value: Option<&str>, row: usize, col: &str) -> Result<f64, LoadError> {
    let text = value.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Err(LoadError::malformed(row, format!("missing value for '{col}'")));
    }
    let parsed: f64 = text
        .parse()
        .map_err(|_| LoadError::malformed(row, format!("'{text}' in '{col}' is not a number")))?;
    if !parsed.is_finite() {
        return Err(LoadError::malformed(row, format!("'{text}' in '{col}' is not finite")));
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, delimiter: u8) -> Result<Vec<RawObservation>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| LoadError::unavailable(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| LoadError::unavailable(path, e))?
        .clone();

    let [date_idx, sci_idx, common_idx, lat_idx, lon_idx, img_idx] =
        resolve_columns(|name| headers.iter().position(|h| h.trim() == name))?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            if e.is_io_error() {
                LoadError::unavailable(path, e)
            } else {
                LoadError::malformed(row_no, e.to_string())
            }
        })?;

        let text = |idx: usize| record.get(idx).map(str::to_string);

        rows.push(RawObservation {
            observed_on: required_text(text(date_idx), row_no, OBSERVED_ON)?,
            scientific_name: required_text(text(sci_idx), row_no, SCIENTIFIC_NAME)?,
            common_name: required_text(text(common_idx), row_no, COMMON_NAME)?,
            latitude: parse_coordinate(record.get(lat_idx), row_no, LATITUDE)?,
            longitude: parse_coordinate(record.get(lon_idx), row_no, LONGITUDE)?,
            image_url: text(img_idx).unwrap_or_default(),
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "observed_on": "2019-06-14",
///     "scientific_name": "Ursus americanus",
///     "common_name": "American Black Bear",
///     "latitude": 49.28,
///     "longitude": -123.12,
///     "image_url": "https://..."
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawObservation>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::unavailable(path, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| LoadError::unavailable(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::malformed(0, "expected a top-level JSON array"))?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::malformed(i, "row is not a JSON object"))?;

        let lat = json_text(obj, LATITUDE);
        let lon = json_text(obj, LONGITUDE);

        rows.push(RawObservation {
            observed_on: required_text(json_text(obj, OBSERVED_ON), i, OBSERVED_ON)?,
            scientific_name: required_text(json_text(obj, SCIENTIFIC_NAME), i, SCIENTIFIC_NAME)?,
            common_name: required_text(json_text(obj, COMMON_NAME), i, COMMON_NAME)?,
            latitude: parse_coordinate(lat.as_deref(), i, LATITUDE)?,
            longitude: parse_coordinate(lon.as_deref(), i, LONGITUDE)?,
            image_url: json_text(obj, IMAGE_URL).unwrap_or_default(),
        });
    }

    Ok(rows)
}

/// Scalar JSON value as text; `null` and absent keys are `None`.
fn json_text(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    match obj.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of observations.
///
/// Text fields may be any Arrow type with a display form (Utf8, LargeUtf8,
/// Date32, Timestamp, …). Coordinates may be Float64, Float32 or text.
/// Works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<Vec<RawObservation>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::unavailable(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::unavailable(path, e))?;
    let reader = builder.build().map_err(|e| LoadError::unavailable(path, e))?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::unavailable(path, e))?;
        let schema = batch.schema();

        let [date_col, sci_col, common_col, lat_col, lon_col, img_col] =
            resolve_columns(|name| schema.index_of(name).ok())?.map(|i| batch.column(i));

        for i in 0..batch.num_rows() {
            let row = rows.len();
            rows.push(RawObservation {
                observed_on: required_text(arrow_text(date_col.as_ref(), i), row, OBSERVED_ON)?,
                scientific_name: required_text(
                    arrow_text(sci_col.as_ref(), i),
                    row,
                    SCIENTIFIC_NAME,
                )?,
                common_name: required_text(arrow_text(common_col.as_ref(), i), row, COMMON_NAME)?,
                latitude: arrow_coordinate(lat_col.as_ref(), i, row, LATITUDE)?,
                longitude: arrow_coordinate(lon_col.as_ref(), i, row, LONGITUDE)?,
                image_url: arrow_text(img_col.as_ref(), i).unwrap_or_default(),
            });
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Display form of a single cell; nulls (and undisplayable cells) are `None`.
fn arrow_text(col: &dyn Array, i: usize) -> Option<String> {
    if col.is_null(i) {
        return None;
    }
    array_value_to_string(col, i).ok()
}

fn arrow_coordinate(col: &dyn Array, i: usize, row: usize, name: &str) -> Result<f64, LoadError> {
    if col.is_null(i) {
        return Err(LoadError::malformed(row, format!("missing value for '{name}'")));
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return parse_coordinate(Some(&arr.value(i).to_string()), row, name);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        return parse_coordinate(Some(&arr.value(i).to_string()), row, name);
    }
    parse_coordinate(arrow_text(col, i).as_deref(), row, name)
}
