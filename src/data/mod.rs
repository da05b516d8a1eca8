/// Data layer: result tables, panel indexing, and cross-section selection.
///
/// Architecture:
/// ```text
///  .parquet(.gzip) / .csv / .json   (one per method)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ResultTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ PanelIndex  │  group by date (+ expiry) → ordered cross-sections
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Study    │  one index per method + day alignment
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ selector  │  (day, method) → projected, moneyness-sorted table
///   └──────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod panel;
pub mod selector;
pub mod study;
