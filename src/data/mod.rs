/// Data layer: core types, loading, cleaning, previewing and exporting.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .xls bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Table
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ transform  │  mean imputation, column selection → new Table
///   └───────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ preview   │   │  export   │  Table → CSV / XLSX bytes
///   └──────────┘   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;
pub mod preview;
pub mod transform;
