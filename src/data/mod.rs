//! Data layer: core types, loading, cleaning, aggregation and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Vec<RawObservation>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  year floor, taxa exclusion, name canonicalization
//!   └───────────┘        (memoized per source by `cache`)
//!        │
//!        ▼
//!   ┌──────────────┐     ┌───────────┐
//!   │ CleanedTable  │ ──▶ │ aggregate  │ → AggregateTable
//!   └──────────────┘     └───────────┘
//!        │                      │
//!        ▼                      ▼
//!   ┌──────────┐
//!   │  filter   │  year interval + category set → indices
//!   └──────────┘
//!        │
//!        ▼
//!     metrics, chart, map
//! ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod normalize;
