//! Writes `sample_deployment.parquet`: a synthetic AUV deployment laid out
//! one dive cycle per row, with list columns holding the samples.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// 2019-07-10T09:00:00Z in seconds since 1900-01-01.
const DEPLOYMENT_START: f64 = 3_771_738_000.0;
const SAMPLE_INTERVAL_S: f64 = 10.0;
const MAX_DEPTH_M: f64 = 80.0;
const DIVE_CYCLES: usize = 3;
const SAMPLES_PER_CYCLE: usize = 720;
const YOS_PER_CYCLE: f64 = 4.0;

/// Deterministic Gaussian sensor noise (splitmix64 + Box-Muller).
struct Noise {
    state: u64,
}

impl Noise {
    fn new(seed: u64) -> Self {
        Noise { state: seed }
    }

    /// Uniform in `(0, 1]`.
    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        ((z >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    fn gauss(&mut self, std_dev: f64) -> f64 {
        let (u1, u2) = (self.uniform(), self.uniform());
        std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Saw-tooth yo: surface → `MAX_DEPTH_M` → surface, `YOS_PER_CYCLE` times.
fn yo_depth(i: usize) -> f64 {
    let phase = (i as f64 / SAMPLES_PER_CYCLE as f64 * YOS_PER_CYCLE).fract();
    let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
    1.0 + tri * (MAX_DEPTH_M - 1.0)
}

/// Nitrate is depleted at the surface and rises below the mixed layer.
fn nitrate(depth: f64, offshore: f64) -> f64 {
    let nitracline = 20.0 + 15.0 * offshore;
    0.5 + 14.0 / (1.0 + (-(depth - nitracline) / 6.0).exp())
}

/// Subsurface chlorophyll maximum sitting just above the nitracline.
fn chlorophyll(depth: f64, offshore: f64) -> f64 {
    let peak = 15.0 + 15.0 * offshore;
    0.1 + 3.5 * (-(depth - peak).powi(2) / (2.0 * 6.0f64.powi(2))).exp()
}

fn salinity(depth: f64, offshore: f64) -> f64 {
    32.4 + 1.2 * offshore + 1.8 * (depth / 60.0).tanh()
}

fn list_field(name: &str, units: &str, long_name: &str) -> Field {
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    Field::new(name, DataType::List(item), false).with_metadata(HashMap::from([
        ("units".to_string(), units.to_string()),
        ("long_name".to_string(), long_name.to_string()),
    ]))
}

fn main() {
    let mut noise = Noise::new(42);

    let names = [
        "time",
        "depth",
        "dissolved_nitrate",
        "chlorophyll_a",
        "salinity",
        "precise_lat",
    ];
    let mut builders: Vec<ListBuilder<Float64Builder>> = names
        .iter()
        .map(|_| ListBuilder::new(Float64Builder::new()))
        .collect();

    for cycle in 0..DIVE_CYCLES {
        for i in 0..SAMPLES_PER_CYCLE {
            let k = cycle * SAMPLES_PER_CYCLE + i;
            // The vehicle heads offshore over the deployment.
            let offshore = k as f64 / (DIVE_CYCLES * SAMPLES_PER_CYCLE) as f64;
            let depth = yo_depth(i) + noise.gauss(0.2);

            let row = [
                DEPLOYMENT_START + k as f64 * SAMPLE_INTERVAL_S,
                depth,
                (nitrate(depth, offshore) + noise.gauss(0.3)).max(0.0),
                (chlorophyll(depth, offshore) + noise.gauss(0.08)).max(0.0),
                salinity(depth, offshore) + noise.gauss(0.02),
                40.10 - 0.35 * offshore,
            ];
            for (builder, value) in builders.iter_mut().zip(row) {
                builder.values().append_value(value);
            }
        }
        for builder in &mut builders {
            builder.append(true);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        list_field("time", "seconds since 1900-01-01 00:00:00", "Time"),
        list_field("depth", "m", "Depth"),
        list_field("dissolved_nitrate", "umol L-1", "Nitrate"),
        list_field("chlorophyll_a", "ug L-1", "Chlorophyll"),
        list_field("salinity", "1", "Salinity"),
        list_field("precise_lat", "degrees_north", "Latitude"),
    ]));

    let columns = builders
        .into_iter()
        .map(|mut b| Arc::new(b.finish()) as arrow::array::ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let output_path = "sample_deployment.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {DIVE_CYCLES} dive cycles ({SAMPLES_PER_CYCLE} samples each) of {} variables to {output_path}",
        names.len()
    );
}
