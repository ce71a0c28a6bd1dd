/// Data layer: loading, ranking, filtering and chart preparation.
///
/// Architecture:
/// ```text
///   remote / local CSV (ISO-8859-1)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + decode + parse → Table (cached per source)
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌───────────┐         ┌──────────┐
///   │ aggregate  │ options │  filter   │  FilterCriteria → FilteredView
///   └───────────┘         └──────────┘
///                               │
///                               ▼
///                         ┌──────────┐
///                         │  chart    │  map points, pie counts, bar averages
///                         └──────────┘
/// ```

pub mod aggregate;
pub mod chart;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
