use std::collections::BTreeMap;

use log::{debug, warn};

use super::model::{Dataset, FieldValue, Row};
use crate::error::{AggregateError, Result};

// ---------------------------------------------------------------------------
// Running sum / count for one group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Running {
    pub sum: f64,
    /// Number of non-null values folded into `sum`.
    pub count: usize,
}

impl Running {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Arithmetic mean; `None` when no value was pushed.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Groups keyed by cell value. `BTreeMap` keeps keys ascending, which fixes
/// the iteration order and therefore the tie-break of every max lookup.
pub type Groups = BTreeMap<FieldValue, Running>;

/// Read `column` of `row` as a number.
///
/// Nulls and non-finite floats (NaN, ±inf) are missing values and yield
/// `Ok(None)`, so sums and means skip them.
pub fn numeric_cell(row: &Row, row_index: usize, column: &str) -> Result<Option<f64>> {
    let cell = row.get(column);
    if cell.is_null() {
        return Ok(None);
    }
    match cell.as_f64() {
        Some(v) if v.is_finite() => Ok(Some(v)),
        Some(_) => Ok(None),
        None => Err(AggregateError::NonNumeric {
            column: column.to_string(),
            row: row_index,
            value: cell.clone(),
        }),
    }
}

/// Fold `value_column` into one [`Running`] per distinct `group_column` value.
///
/// * Rows with a null grouping cell belong to no group.
/// * Keys go through [`FieldValue::group_key`], so `2` and `2.0` share a
///   group, the same rows [`FieldValue::matches`] selects.
/// * Null value cells are skipped, but their group is still created
///   (with a zero sum), matching a sum that ignores missing values.
pub fn group_by(dataset: &Dataset, group_column: &str, value_column: &str) -> Result<Groups> {
    dataset.require_column(group_column)?;
    dataset.require_column(value_column)?;

    let mut groups = Groups::new();
    let mut skipped = 0usize;

    for (i, row) in dataset.rows.iter().enumerate() {
        let key = row.get(group_column);
        if key.is_null() {
            skipped += 1;
            continue;
        }
        let running = groups.entry(key.group_key()).or_default();
        if let Some(v) = numeric_cell(row, i, value_column)? {
            running.push(v);
        }
    }

    if skipped > 0 {
        warn!("{skipped} row(s) without a '{group_column}' value left out of grouping");
    }
    debug!(
        "grouped {} rows by '{group_column}' over '{value_column}': {} groups",
        dataset.len(),
        groups.len()
    );
    Ok(groups)
}

/// Key with the largest sum. Ties keep the first (smallest) key.
pub fn max_by_sum(groups: &Groups) -> Option<(&FieldValue, f64)> {
    let mut best: Option<(&FieldValue, f64)> = None;
    for (key, running) in groups {
        match best {
            Some((_, best_sum)) if running.sum <= best_sum => {}
            _ => best = Some((key, running.sum)),
        }
    }
    best
}
