/// Data layer: loading, schema validation, derivation, filtering, summary.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  normalize headers (columns), validate → Vec<Customer>
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ CustomerDataset  │  buckets derived (bucket), filter domains
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSelection → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   view    │  render() → (FilteredView, Summary)
///   └──────────┘
/// ```

pub mod bucket;
pub mod columns;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod summary;
pub mod view;
