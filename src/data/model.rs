use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::{AggregateError, Result};

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used as a `BTreeMap` key by the grouping layer, so it must be `Ord`.
/// Serialized untagged: cells appear in JSON as plain numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// ISO-8601 date kept as text.
    Date(String),
    Null,
}

static NULL_VALUE: FieldValue = FieldValue::Null;

// -- Manual Eq/Ord so FieldValue can key a BTreeMap --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Numeric view of the cell; `None` for non-numbers and nulls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Key used for grouping: integral floats become integers, so `2.0`
    /// and `2` land in one group.
    pub fn group_key(&self) -> FieldValue {
        match self {
            FieldValue::Float(f)
                if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) =>
            {
                FieldValue::Integer(*f as i64)
            }
            other => other.clone(),
        }
    }

    /// Filter equality on group keys. A match value of `2` selects cells
    /// holding `2.0`, exactly the rows grouped under `2`.
    pub fn matches(&self, other: &FieldValue) -> bool {
        self.group_key() == other.group_key()
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

// ---------------------------------------------------------------------------
// Row – one observation
// ---------------------------------------------------------------------------

/// A single observation: column_name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub fields: BTreeMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(column.to_string(), value.into());
        self
    }

    /// Cell for `column`; absent columns read as [`FieldValue::Null`].
    pub fn get(&self, column: &str) -> &FieldValue {
        self.fields.get(column).unwrap_or(&NULL_VALUE)
    }
}

// ---------------------------------------------------------------------------
// Dataset – an ordered collection of rows
// ---------------------------------------------------------------------------

/// All rows with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Rows in their original order.
    pub rows: Vec<Row>,
    /// Sorted union of the column names over all rows.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
}

impl Dataset {
    /// Build column indices from the rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();

        for row in &rows {
            for (col, val) in &row.fields {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();
        Dataset {
            rows,
            column_names,
            unique_values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column)
    }

    /// Fail with [`AggregateError::MissingColumn`] unless `column` exists.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(AggregateError::MissingColumn(column.to_string()))
        }
    }

    /// Rows (with their index) whose `column` cell matches `value`.
    pub fn rows_matching<'a>(
        &'a self,
        column: &'a str,
        value: &'a FieldValue,
    ) -> impl Iterator<Item = (usize, &'a Row)> + 'a {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, row)| row.get(column).matches(value))
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Dataset::from_rows(iter.into_iter().collect())
    }
}
