/// Data layer: core types, column schema, and grouping.
///
/// Architecture:
/// ```text
///   Vec<Row>
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  rows, column index, unique values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  group   │  key → running sum / count (ordered)
///   └──────────┘
/// ```

pub mod group;
pub mod model;
pub mod schema;
