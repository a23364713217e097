/// Data layer: core types, loading, and dive-cycle extraction.
///
/// Architecture:
/// ```text
///  .nc / OPeNDAP URL / .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  open + decode → ProfileDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ ProfileDataset │  name → Variable { shape, values, attributes }
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  series   │  slice one dive cycle, flatten → FlatSeries
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
#[cfg(feature = "netcdf")]
pub mod netcdf_io;
pub mod series;
pub mod time;
