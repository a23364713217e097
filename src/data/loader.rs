use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray, ListArray,
    TimestampMillisecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{AttributeValue, Attributes, ProfileDataset, Variable};
use super::time::{parse_timestamp, UNIX_SECONDS_UNITS};
use crate::error::ProfileError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Open a profile dataset from a path or URL. Dispatch by scheme/extension.
///
/// Supported sources:
/// * `http(s)://…`, `.nc`, `.nc4`, `.cdf`, `.netcdf` – netCDF / OPeNDAP
/// * `.json`    – `{ "variables": { name: { "shape", "data", "attributes" } } }`
/// * `.csv`     – one column per variable, optional units row (ERDDAP style)
/// * `.parquet` – one row per dive cycle, list columns hold the samples
///
/// Any failure is reported as [`ProfileError::DataAccess`]; there is no retry.
pub fn load_source(location: &str) -> Result<ProfileDataset, ProfileError> {
    let location = location.trim();
    load_inner(location).map_err(|e| ProfileError::data_access(location, e))
}

fn load_inner(location: &str) -> Result<ProfileDataset> {
    if location.is_empty() {
        bail!("no path or URL given");
    }
    if is_url(location) {
        return load_netcdf(location);
    }

    let path = Path::new(location);
    if !path.exists() {
        bail!("no such file");
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "nc" | "nc4" | "cdf" | "netcdf" => load_netcdf(location),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn is_url(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(feature = "netcdf")]
fn load_netcdf(location: &str) -> Result<ProfileDataset> {
    super::netcdf_io::load_netcdf(location)
}

#[cfg(not(feature = "netcdf"))]
fn load_netcdf(_location: &str) -> Result<ProfileDataset> {
    bail!("netCDF support not compiled in (rebuild with `--features netcdf`)")
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonDataset {
    #[serde(default)]
    attributes: BTreeMap<String, serde_json::Value>,
    variables: BTreeMap<String, JsonVariable>,
}

#[derive(Debug, Deserialize)]
struct JsonVariable {
    /// Omitted shape means a single stream.
    shape: Option<Vec<usize>>,
    data: Vec<Option<f64>>,
    #[serde(default)]
    attributes: BTreeMap<String, serde_json::Value>,
}

/// Expected JSON schema (an xarray `to_dict()`-like layout, flattened):
///
/// ```json
/// {
///   "attributes": { "title": "CP05MOAS-A6264 R00012" },
///   "variables": {
///     "time":  { "shape": [1, 3], "data": [0, 1, 2],
///                "attributes": { "units": "seconds since 1900-01-01" } },
///     "depth": { "shape": [1, 3], "data": [0.0, 5.0, null] }
///   }
/// }
/// ```
fn load_json(path: &Path) -> Result<ProfileDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonDataset = serde_json::from_str(&text).context("parsing JSON")?;

    let mut variables = Vec::with_capacity(root.variables.len());
    for (name, var) in root.variables {
        let values: Vec<f64> = var.data.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let shape = var.shape.unwrap_or_else(|| vec![values.len()]);
        let mut variable = Variable::new(name.clone(), shape, values)
            .with_context(|| format!("variable '{name}'"))?;
        variable.attributes = json_attributes(&var.attributes);
        variables.push(variable);
    }

    let mut dataset = ProfileDataset::from_variables(path.display().to_string(), variables);
    dataset.attributes = json_attributes(&root.attributes);
    Ok(dataset)
}

fn json_attributes(map: &BTreeMap<String, serde_json::Value>) -> Attributes {
    map.iter()
        .filter_map(|(k, v)| json_to_attribute(v).map(|a| (k.clone(), a)))
        .collect()
}

fn json_to_attribute(val: &serde_json::Value) -> Option<AttributeValue> {
    use serde_json::Value as JsonValue;
    match val {
        JsonValue::String(s) => Some(AttributeValue::Text(s.clone())),
        JsonValue::Number(n) => n.as_f64().map(AttributeValue::Number),
        JsonValue::Bool(b) => Some(AttributeValue::Text(b.to_string())),
        JsonValue::Array(items) => {
            let numbers: Option<Vec<f64>> = items.iter().map(|v| v.as_f64()).collect();
            numbers.map(AttributeValue::Numbers)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with variable names, an optional second row of
/// units (as ERDDAP writes it), then one sample per row. Cells holding
/// ISO-8601 timestamps become Unix seconds; blank cells become NaN.
fn load_csv(path: &Path) -> Result<ProfileDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let records: Vec<csv::StringRecord> = reader
        .records()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {row_no}")))
        .collect::<Result<_>>()?;

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    let mut units: Vec<Option<String>> = vec![None; headers.len()];
    let mut is_timestamp = vec![false; headers.len()];

    let mut data = records.as_slice();
    if let [first, second, ..] = records.as_slice() {
        if is_units_row(first, second) {
            for (idx, cell) in first.iter().enumerate().take(headers.len()) {
                let cell = cell.trim();
                if !cell.is_empty() {
                    units[idx] = Some(cell.to_string());
                }
            }
            data = &data[1..];
        }
    }

    for record in data {
        for (idx, column) in columns.iter_mut().enumerate() {
            let cell = record.get(idx).unwrap_or("").trim();
            let (value, timestamp) = parse_cell(cell);
            is_timestamp[idx] |= timestamp;
            column.push(value);
        }
    }

    let variables = headers
        .into_iter()
        .zip(columns)
        .enumerate()
        .map(|(idx, (name, values))| {
            let unit = if is_timestamp[idx] {
                Some(UNIX_SECONDS_UNITS.to_string())
            } else {
                units[idx].take()
            };
            let var = Variable::from_series(name, values);
            match unit {
                Some(u) => var.with_attribute("units", AttributeValue::Text(u)),
                None => var,
            }
        })
        .collect();

    Ok(ProfileDataset::from_variables(path.display().to_string(), variables))
}

/// `first` is a units row when some column whose value in `second` is a
/// number or timestamp holds something else in `first`. Text columns such
/// as trajectory names say nothing either way.
fn is_units_row(first: &csv::StringRecord, second: &csv::StringRecord) -> bool {
    let parses = |cell: &str| cell.parse::<f64>().is_ok() || parse_timestamp(cell).is_some();
    first.iter().zip(second.iter()).any(|(unit, value)| {
        let (unit, value) = (unit.trim(), value.trim());
        !unit.is_empty() && parses(value) && !parses(unit)
    })
}

fn parse_cell(cell: &str) -> (f64, bool) {
    if cell.is_empty() {
        return (f64::NAN, false);
    }
    if let Ok(v) = cell.parse::<f64>() {
        return (v, false);
    }
    match parse_timestamp(cell) {
        Some(t) => (t.timestamp_millis() as f64 / 1000.0, true),
        None => (f64::NAN, false),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one dive cycle per row.
///
/// Expected schema:
/// - List<Float64|Float32> columns – per-cycle sample streams → `[cycles, samples]`
/// - Float/Int/Timestamp scalar columns – one value per cycle → `[cycles]`
/// - Field metadata (e.g. `units`, `long_name`) becomes variable attributes
fn load_parquet(path: &Path) -> Result<ProfileDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    // Per column: field, per-row sample vectors.
    let mut columns: BTreeMap<String, (Arc<Field>, Vec<Vec<f64>>)> = BTreeMap::new();
    let mut skipped: Vec<String> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for (idx, field) in schema.fields().iter().enumerate() {
            let col = batch.column(idx);
            let rows = match column_rows(col) {
                Ok(rows) => rows,
                Err(e) => {
                    if !skipped.contains(field.name()) {
                        log::debug!("skipping parquet column '{}': {e:#}", field.name());
                        skipped.push(field.name().clone());
                    }
                    continue;
                }
            };
            columns
                .entry(field.name().clone())
                .or_insert_with(|| (field.clone(), Vec::new()))
                .1
                .extend(rows);
        }
    }

    let mut variables = Vec::with_capacity(columns.len());
    for (name, (field, rows)) in columns {
        let is_list = matches!(field.data_type(), DataType::List(_) | DataType::LargeList(_));
        let mut variable = if is_list {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let mut values = Vec::with_capacity(rows.len() * width);
            for row in &rows {
                values.extend_from_slice(row);
                values.extend(std::iter::repeat(f64::NAN).take(width - row.len()));
            }
            Variable::new(name.clone(), vec![rows.len(), width], values)
                .with_context(|| format!("column '{name}'"))?
        } else {
            Variable::from_series(name.clone(), rows.into_iter().flatten().collect())
        };

        for (key, value) in field.metadata() {
            variable
                .attributes
                .insert(key.clone(), AttributeValue::Text(value.clone()));
        }
        if matches!(field.data_type(), DataType::Timestamp(_, _)) {
            variable.attributes.insert(
                "units".into(),
                AttributeValue::Text(UNIX_SECONDS_UNITS.to_string()),
            );
        }
        variables.push(variable);
    }

    Ok(ProfileDataset::from_variables(path.display().to_string(), variables))
}

// -- Parquet / Arrow helpers --

/// Convert every row of a column to a sample vector (length 1 for scalars).
fn column_rows(col: &Arc<dyn Array>) -> Result<Vec<Vec<f64>>> {
    match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            (0..list_arr.len())
                .map(|row| {
                    if list_arr.is_null(row) {
                        Ok(Vec::new())
                    } else {
                        numeric_values(&list_arr.value(row))
                    }
                })
                .collect()
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            (0..list_arr.len())
                .map(|row| {
                    if list_arr.is_null(row) {
                        Ok(Vec::new())
                    } else {
                        numeric_values(&list_arr.value(row))
                    }
                })
                .collect()
        }
        _ => Ok(numeric_values(col)?.into_iter().map(|v| vec![v]).collect()),
    }
}

/// Flat numeric array → `Vec<f64>`, nulls as NaN. Timestamps become Unix seconds.
fn numeric_values(arr: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = arr.as_any();
    if let Some(a) = any.downcast_ref::<Float64Array>() {
        Ok(a.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(a) = any.downcast_ref::<Float32Array>() {
        Ok(a.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        Ok(a.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)).collect())
    } else if let Some(a) = any.downcast_ref::<Int32Array>() {
        Ok(a.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else if let Some(a) = any.downcast_ref::<TimestampSecondArray>() {
        Ok(a.iter().map(|v| v.map_or(f64::NAN, |s| s as f64)).collect())
    } else if let Some(a) = any.downcast_ref::<TimestampMillisecondArray>() {
        Ok(a.iter()
            .map(|v| v.map_or(f64::NAN, |ms| ms as f64 / 1000.0))
            .collect())
    } else {
        match arr.data_type() {
            DataType::Timestamp(unit @ (TimeUnit::Microsecond | TimeUnit::Nanosecond), _) => {
                let scale = if *unit == TimeUnit::Microsecond { 1e-6 } else { 1e-9 };
                let cast = arrow::compute::cast(arr, &DataType::Int64)
                    .context("casting timestamp column")?;
                let ticks = cast
                    .as_any()
                    .downcast_ref::<Int64Array>()
                    .context("expected Int64Array after cast")?;
                Ok(ticks
                    .iter()
                    .map(|v| v.map_or(f64::NAN, |t| t as f64 * scale))
                    .collect())
            }
            other => bail!("unsupported column type {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::Schema;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::series::extract;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_data_access_error() {
        let err = load_source("/definitely/not/here/cp_6264.nc").unwrap_err();
        match err {
            ProfileError::DataAccess { location, reason } => {
                assert_eq!(location, "/definitely/not/here/cp_6264.nc");
                assert!(reason.contains("no such file"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unsupported_extension_is_data_access_error() {
        let file = write_temp(".txt", "hello");
        let err = load_source(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ProfileError::DataAccess { .. }));
    }

    #[test]
    fn json_round_trip_of_profile_layout() {
        let file = write_temp(
            ".json",
            r#"{
                "attributes": { "title": "Pioneer AUV" },
                "variables": {
                    "time": { "shape": [1, 3], "data": [0, 1, 2],
                              "attributes": { "units": "seconds since 1900-01-01" } },
                    "depth": { "shape": [1, 3], "data": [0.0, 5.0, null] },
                    "dissolved_nitrate": { "data": [1, 2, 3] }
                }
            }"#,
        );
        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.title(), "Pioneer AUV");
        assert_eq!(ds.variable("time").unwrap().shape, vec![1, 3]);
        assert_eq!(
            ds.variable("time").unwrap().units(),
            Some("seconds since 1900-01-01")
        );
        let depth = extract(&ds, "depth", 0).unwrap();
        assert_eq!(depth.len(), 3);
        assert!(depth.values[2].is_nan());
        assert_eq!(ds.variable("dissolved_nitrate").unwrap().shape, vec![3]);
    }

    #[test]
    fn malformed_json_is_data_access_error() {
        let file = write_temp(".json", r#"{ "variables": { "time": { "shape": [2], "data": [1] } } }"#);
        let err = load_source(file.path().to_str().unwrap()).unwrap_err();
        match err {
            ProfileError::DataAccess { reason, .. } => assert!(reason.contains("time"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_with_units_row_and_timestamps() {
        let file = write_temp(
            ".csv",
            "time,depth,salinity\nUTC,m,1\n2019-07-10T09:00:00Z,0.5,33.1\n2019-07-10T09:00:10Z,1.5,\n",
        );
        let ds = load_source(file.path().to_str().unwrap()).unwrap();

        let time = ds.variable("time").unwrap();
        assert_eq!(time.values, vec![1_562_749_200.0, 1_562_749_210.0]);
        assert_eq!(time.units(), Some(UNIX_SECONDS_UNITS));

        let depth = ds.variable("depth").unwrap();
        assert_eq!(depth.values, vec![0.5, 1.5]);
        assert_eq!(depth.units(), Some("m"));

        let salinity = ds.variable("salinity").unwrap();
        assert_eq!(salinity.values[0], 33.1);
        assert!(salinity.values[1].is_nan());
    }

    #[test]
    fn csv_without_units_row() {
        let file = write_temp(".csv", "time,depth\n0,0\n1,5\n2,10\n");
        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.variable("depth").unwrap().values, vec![0.0, 5.0, 10.0]);
        assert_eq!(ds.variable("depth").unwrap().units(), None);
    }

    #[test]
    fn csv_text_column_does_not_make_a_units_row() {
        let file = write_temp(
            ".csv",
            "time,depth,trajectory,nitrate\n0,0,cp_6264,1\n1,5,cp_6264,2\n2,10,cp_6264,3\n",
        );
        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        let depth = ds.variable("depth").unwrap();
        assert_eq!(depth.values, vec![0.0, 5.0, 10.0]);
        assert_eq!(depth.units(), None);
        assert_eq!(ds.variable("nitrate").unwrap().values, vec![1.0, 2.0, 3.0]);

        let trajectory = ds.variable("trajectory").unwrap();
        assert_eq!(trajectory.values.len(), 3);
        assert!(trajectory.values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn parquet_rows_are_dive_cycles() {
        let item = Arc::new(Field::new("item", DataType::Float64, true));
        let mut depth_builder = ListBuilder::new(Float64Builder::new());
        for row in [vec![0.0, 5.0, 10.0], vec![1.0, 6.0]] {
            for v in row {
                depth_builder.values().append_value(v);
            }
            depth_builder.append(true);
        }
        let depth = depth_builder.finish();
        let lat = Float64Array::from(vec![40.1, 40.2]);

        let depth_field = Field::new("depth", DataType::List(item), false).with_metadata(
            [("units".to_string(), "m".to_string())].into_iter().collect(),
        );
        let schema = Arc::new(Schema::new(vec![
            depth_field,
            Field::new("precise_lat", DataType::Float64, false),
        ]));
        let batch =
            RecordBatch::try_new(schema.clone(), vec![Arc::new(depth), Arc::new(lat)]).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        let depth = ds.variable("depth").unwrap();
        assert_eq!(depth.shape, vec![2, 3]);
        assert_eq!(depth.units(), Some("m"));
        assert_eq!(extract(&ds, "depth", 0).unwrap().values, vec![0.0, 5.0, 10.0]);
        let second = extract(&ds, "depth", 1).unwrap().values;
        assert_eq!(&second[..2], &[1.0, 6.0]);
        assert!(second[2].is_nan());
        assert_eq!(ds.variable("precise_lat").unwrap().shape, vec![2]);
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn netcdf_file_loads_with_fill_masked() {
        let file = tempfile::Builder::new().suffix(".nc").tempfile().unwrap();
        {
            let mut nc = netcdf::create(file.path()).unwrap();
            nc.add_dimension("cycle", 2).unwrap();
            nc.add_dimension("obs", 3).unwrap();
            nc.add_attribute("title", "CP05MOAS-A6264").unwrap();

            let mut depth = nc.add_variable::<i16>("depth", &["cycle", "obs"]).unwrap();
            depth.put_attribute("units", "m").unwrap();
            depth.put_values(&[0i16, 5, 10, 1, 6, 11], ..).unwrap();

            let mut nitrate = nc
                .add_variable::<f32>("dissolved_nitrate", &["cycle", "obs"])
                .unwrap();
            nitrate.put_attribute("_FillValue", -999.0f32).unwrap();
            nitrate.put_attribute("units", "umol L-1").unwrap();
            nitrate
                .put_values(&[1.0f32, 2.0, 3.0, 4.0, -999.0, 6.0], ..)
                .unwrap();
        }

        let ds = load_source(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.title(), "CP05MOAS-A6264");

        let depth = ds.variable("depth").unwrap();
        assert_eq!(depth.shape, vec![2, 3]);
        assert_eq!(depth.units(), Some("m"));
        assert_eq!(extract(&ds, "depth", 1).unwrap().values, vec![1.0, 6.0, 11.0]);

        let nitrate = ds.variable("dissolved_nitrate").unwrap();
        assert_eq!(nitrate.shape, vec![2, 3]);
        assert_eq!(nitrate.units(), Some("umol L-1"));
        assert_eq!(
            nitrate.attributes.get("_FillValue"),
            Some(&AttributeValue::Number(-999.0))
        );
        let second = extract(&ds, "dissolved_nitrate", 1).unwrap().values;
        assert_eq!(second.len(), 3);
        assert_eq!(second[0], 4.0);
        assert!(second[1].is_nan());
        assert_eq!(second[2], 6.0);
    }

    #[cfg(not(feature = "netcdf"))]
    #[test]
    fn netcdf_url_without_feature_reports_it() {
        let err = load_source("https://opendap.oceanobservatories.org/cp_6264.nc").unwrap_err();
        match err {
            ProfileError::DataAccess { reason, .. } => {
                assert!(reason.contains("netCDF support"), "{reason}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
