/// Data layer: core types, loading, and row filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  column names, rows of Value
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  null / group predicates → row indices
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
