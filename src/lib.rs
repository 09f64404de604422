//! Aggregations behind a bike-sharing usage dashboard.
//!
//! ```text
//!  sample ──► Dataset (daily, hourly)
//!                │
//!                ▼
//!            analysis  best group by total, weather averages, totals
//!                │
//!                ▼
//!            summary   DashboardSummary → text / JSON
//! ```

pub mod analysis;
pub mod data;
pub mod error;
pub mod sample;
pub mod summary;

pub use analysis::{
    average_metrics_for_group, find_category_with_highest_total, CategoryTotal, WeatherAverages,
};
pub use data::model::{Dataset, FieldValue, Row};
pub use data::schema::ColumnSchema;
pub use error::{AggregateError, Result};
pub use summary::{DashboardSummary, SummaryConfig};
