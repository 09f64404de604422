//! Aggregation helpers: best group by summed count, weather averages for a
//! group, and the smaller totals the dashboard shows next to them.

use log::debug;
use serde::Serialize;

use crate::data::group::{self, Running};
use crate::data::model::{Dataset, FieldValue};
use crate::data::schema::ColumnSchema;
use crate::error::{AggregateError, Result};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The group with the highest total and that total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: FieldValue,
    pub total: f64,
}

/// Mean humidity, temperature and windspeed over a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherAverages {
    pub humidity: f64,
    pub temp: f64,
    pub windspeed: f64,
}

/// Per-metric display multipliers. Stored values stay normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherScale {
    pub humidity: f64,
    pub temp: f64,
    pub windspeed: f64,
}

impl WeatherScale {
    pub const IDENTITY: WeatherScale = WeatherScale {
        humidity: 1.0,
        temp: 1.0,
        windspeed: 1.0,
    };

    /// Everything ×100.
    pub const PERCENT: WeatherScale = WeatherScale {
        humidity: 100.0,
        temp: 100.0,
        windspeed: 100.0,
    };

    /// Only windspeed ×100.
    pub const WIND_PERCENT: WeatherScale = WeatherScale {
        humidity: 1.0,
        temp: 1.0,
        windspeed: 100.0,
    };
}

impl WeatherAverages {
    pub fn scaled(&self, scale: WeatherScale) -> Self {
        WeatherAverages {
            humidity: self.humidity * scale.humidity,
            temp: self.temp * scale.temp,
            windspeed: self.windspeed * scale.windspeed,
        }
    }
}

/// Casual vs registered users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserSplit {
    pub casual: f64,
    pub registered: f64,
    pub total: f64,
    pub casual_percent: f64,
    pub registered_percent: f64,
}

/// Equal-width bins; `edges` has one entry more than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Casual and registered histograms binned over one shared range, so they
/// stack bin by bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHistograms {
    pub casual: Histogram,
    pub registered: Histogram,
}

/// Weather means of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupWeather {
    pub group: FieldValue,
    #[serde(flatten)]
    pub averages: WeatherAverages,
}

// ---------------------------------------------------------------------------
// Best group by total
// ---------------------------------------------------------------------------

/// Group rows by `group_column`, sum `value_column` per group, and return the
/// group with the largest sum.
///
/// Ties go to the smallest group key. Fails with
/// [`AggregateError::EmptyInput`] when there is nothing to group.
pub fn find_category_with_highest_total(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<CategoryTotal> {
    if dataset.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    let groups = group::group_by(dataset, group_column, value_column)?;
    let (category, total) = group::max_by_sum(&groups).ok_or(AggregateError::EmptyInput)?;

    debug!("highest '{value_column}' total by '{group_column}': {category} ({total})");
    Ok(CategoryTotal {
        category: category.clone(),
        total,
    })
}

pub fn find_season_with_highest_shares(
    dataset: &Dataset,
    schema: &ColumnSchema,
) -> Result<CategoryTotal> {
    find_category_with_highest_total(dataset, &schema.season, &schema.count)
}

pub fn find_hour_with_highest_shares(
    dataset: &Dataset,
    schema: &ColumnSchema,
) -> Result<CategoryTotal> {
    find_category_with_highest_total(dataset, &schema.hour, &schema.count)
}

// ---------------------------------------------------------------------------
// Weather averages
// ---------------------------------------------------------------------------

/// Mean humidity, temp and windspeed over the rows where
/// `group_column == match_value`, using the default column names.
pub fn average_metrics_for_group(
    dataset: &Dataset,
    group_column: &str,
    match_value: &FieldValue,
) -> Result<WeatherAverages> {
    average_metrics_for_group_with(dataset, &ColumnSchema::default(), group_column, match_value)
}

/// [`average_metrics_for_group`] with explicit weather column names.
///
/// Fails with [`AggregateError::EmptyGroup`] when no row matches, and with
/// [`AggregateError::NoValues`] when a weather column is null in every
/// matching row.
pub fn average_metrics_for_group_with(
    dataset: &Dataset,
    schema: &ColumnSchema,
    group_column: &str,
    match_value: &FieldValue,
) -> Result<WeatherAverages> {
    let empty_group = || AggregateError::EmptyGroup {
        column: group_column.to_string(),
        value: match_value.clone(),
    };
    if dataset.is_empty() {
        return Err(empty_group());
    }
    dataset.require_column(group_column)?;
    let columns = schema.weather_columns();
    for col in columns {
        dataset.require_column(col)?;
    }

    let mut acc = [Running::default(); 3];
    let mut matched = 0usize;
    for (i, row) in dataset.rows_matching(group_column, match_value) {
        matched += 1;
        for (running, col) in acc.iter_mut().zip(columns) {
            if let Some(v) = group::numeric_cell(row, i, col)? {
                running.push(v);
            }
        }
    }
    if matched == 0 {
        return Err(empty_group());
    }

    debug!("weather averages over {matched} row(s) where '{group_column}' == {match_value}");
    means(&acc, columns)
}

fn means(acc: &[Running; 3], columns: [&str; 3]) -> Result<WeatherAverages> {
    let mean = |i: usize| {
        acc[i]
            .mean()
            .ok_or_else(|| AggregateError::NoValues(columns[i].to_string()))
    };
    Ok(WeatherAverages {
        humidity: mean(0)?,
        temp: mean(1)?,
        windspeed: mean(2)?,
    })
}

// ---------------------------------------------------------------------------
// Totals and per-group series
// ---------------------------------------------------------------------------

/// Sum of a numeric column. Nulls are skipped; an empty dataset sums to 0.
pub fn column_total(dataset: &Dataset, column: &str) -> Result<f64> {
    if dataset.is_empty() {
        return Ok(0.0);
    }
    dataset.require_column(column)?;

    let mut running = Running::default();
    for (i, row) in dataset.rows.iter().enumerate() {
        if let Some(v) = group::numeric_cell(row, i, column)? {
            running.push(v);
        }
    }
    Ok(running.sum)
}

/// Casual and registered totals with their share of the combined total.
/// Both shares are 0 when there are no users at all.
pub fn user_split(dataset: &Dataset, schema: &ColumnSchema) -> Result<UserSplit> {
    let casual = column_total(dataset, &schema.casual)?;
    let registered = column_total(dataset, &schema.registered)?;
    let total = casual + registered;

    let percent = |part: f64| if total > 0.0 { part / total * 100.0 } else { 0.0 };
    Ok(UserSplit {
        casual,
        registered,
        total,
        casual_percent: percent(casual),
        registered_percent: percent(registered),
    })
}

/// Per-group sums of `value_column`, ascending by group key.
pub fn totals_by_group(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<(FieldValue, f64)>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }
    let groups = group::group_by(dataset, group_column, value_column)?;
    Ok(groups.into_iter().map(|(k, r)| (k, r.sum)).collect())
}

/// Per-group weather means, ascending by group key.
pub fn weather_means_by_group(
    dataset: &Dataset,
    schema: &ColumnSchema,
    group_column: &str,
) -> Result<Vec<GroupWeather>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }
    let columns = schema.weather_columns();
    let humidity = group::group_by(dataset, group_column, columns[0])?;
    let temp = group::group_by(dataset, group_column, columns[1])?;
    let windspeed = group::group_by(dataset, group_column, columns[2])?;

    // All three share the key set: keys come from the grouping column alone.
    humidity
        .into_iter()
        .map(|(key, h)| -> Result<GroupWeather> {
            let t = temp.get(&key).copied().unwrap_or_default();
            let w = windspeed.get(&key).copied().unwrap_or_default();
            let averages = means(&[h, t, w], columns)?;
            Ok(GroupWeather {
                group: key,
                averages,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Finite values of a numeric column in row order.
fn column_values(dataset: &Dataset, column: &str) -> Result<Vec<f64>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }
    dataset.require_column(column)?;

    let mut values = Vec::with_capacity(dataset.len());
    for (i, row) in dataset.rows.iter().enumerate() {
        if let Some(v) = group::numeric_cell(row, i, column)? {
            values.push(v);
        }
    }
    Ok(values)
}

fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |range, &v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Count `values` into `bins` equal-width bins spanning `range`.
///
/// The last bin is closed, so the maximum lands in it. Values outside
/// `range` are not counted. A zero-width range is widened to ±0.5.
fn bin_values(values: &[f64], bins: usize, range: (f64, f64)) -> Result<Histogram> {
    if bins == 0 {
        return Err(AggregateError::ZeroBins);
    }
    let (lo, hi) = if range.0 == range.1 {
        (range.0 - 0.5, range.1 + 0.5)
    } else {
        range
    };
    let width = (hi - lo) / bins as f64;

    let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
    edges.push(hi);

    let mut counts = vec![0usize; bins];
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(Histogram { edges, counts })
}

/// Histogram of one numeric column over its own min..max range.
///
/// Fails with [`AggregateError::NoValues`] when the column holds no finite
/// value and with [`AggregateError::ZeroBins`] when `bins` is 0.
pub fn histogram(dataset: &Dataset, column: &str, bins: usize) -> Result<Histogram> {
    let values = column_values(dataset, column)?;
    let range = value_range(&values).ok_or_else(|| AggregateError::NoValues(column.to_string()))?;
    bin_values(&values, bins, range)
}

/// Casual and registered histograms over the range covering both columns.
pub fn user_histograms(
    dataset: &Dataset,
    schema: &ColumnSchema,
    bins: usize,
) -> Result<UserHistograms> {
    let casual = column_values(dataset, &schema.casual)?;
    let registered = column_values(dataset, &schema.registered)?;
    let range = value_range(casual.iter().chain(&registered))
        .ok_or_else(|| AggregateError::NoValues(schema.casual.clone()))?;

    debug!("user histograms: {bins} bins over {range:?}");
    Ok(UserHistograms {
        casual: bin_values(&casual, bins, range)?,
        registered: bin_values(&registered, bins, range)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn seasons() -> Dataset {
        Dataset::from_rows(vec![
            Row::new().with("season", 1_i64).with("count", 10_i64),
            Row::new().with("season", 2_i64).with("count", 30_i64),
            Row::new().with("season", 1_i64).with("count", 5_i64),
        ])
    }

    fn hours() -> Dataset {
        Dataset::from_rows(vec![
            Row::new()
                .with("hour", 5_i64)
                .with("humidity", 0.5)
                .with("temp", 0.2)
                .with("windspeed", 0.1),
            Row::new()
                .with("hour", 5_i64)
                .with("humidity", 0.7)
                .with("temp", 0.4)
                .with("windspeed", 0.3),
            Row::new()
                .with("hour", 6_i64)
                .with("humidity", 0.9)
                .with("temp", 0.9)
                .with("windspeed", 0.9),
        ])
    }

    #[test]
    fn highest_total_picks_largest_sum() {
        let best = find_category_with_highest_total(&seasons(), "season", "count").unwrap();
        assert_eq!(best.category, FieldValue::Integer(2));
        assert_eq!(best.total, 30.0);
    }

    #[test]
    fn highest_total_on_empty_dataset_fails() {
        let err = find_category_with_highest_total(&Dataset::default(), "season", "count");
        assert!(matches!(err, Err(AggregateError::EmptyInput)));
    }

    #[test]
    fn highest_total_with_all_null_keys_fails() {
        let ds = Dataset::from_rows(vec![Row::new()
            .with("season", FieldValue::Null)
            .with("count", 3_i64)]);
        let err = find_category_with_highest_total(&ds, "season", "count");
        assert!(matches!(err, Err(AggregateError::EmptyInput)));
    }

    #[test]
    fn highest_total_missing_column() {
        let err = find_category_with_highest_total(&seasons(), "hour", "count");
        assert!(matches!(err, Err(AggregateError::MissingColumn(c)) if c == "hour"));
    }

    #[test]
    fn highest_total_is_idempotent() {
        let ds = seasons();
        let a = find_category_with_highest_total(&ds, "season", "count").unwrap();
        let b = find_category_with_highest_total(&ds, "season", "count").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn averages_for_matching_rows() {
        let avg = average_metrics_for_group(&hours(), "hour", &FieldValue::Integer(5)).unwrap();
        assert!(close(avg.humidity, 0.6));
        assert!(close(avg.temp, 0.3));
        assert!(close(avg.windspeed, 0.2));
    }

    #[test]
    fn averages_for_absent_value_fail() {
        let err = average_metrics_for_group(&hours(), "hour", &FieldValue::Integer(23));
        match err {
            Err(AggregateError::EmptyGroup { column, value }) => {
                assert_eq!(column, "hour");
                assert_eq!(value, FieldValue::Integer(23));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn averages_skip_nulls_and_reject_all_null() {
        let ds = Dataset::from_rows(vec![
            Row::new()
                .with("hour", 1_i64)
                .with("humidity", 0.4)
                .with("temp", FieldValue::Null)
                .with("windspeed", 0.2),
            Row::new()
                .with("hour", 1_i64)
                .with("humidity", FieldValue::Null)
                .with("temp", FieldValue::Null)
                .with("windspeed", 0.4),
        ]);
        let err = average_metrics_for_group(&ds, "hour", &FieldValue::Integer(1));
        assert!(matches!(err, Err(AggregateError::NoValues(c)) if c == "temp"));

        let schema = ColumnSchema {
            temp: "humidity".into(),
            ..ColumnSchema::default()
        };
        let avg = average_metrics_for_group_with(&ds, &schema, "hour", &FieldValue::Integer(1))
            .unwrap();
        assert!(close(avg.humidity, 0.4));
        assert!(close(avg.windspeed, 0.3));
    }

    #[test]
    fn averages_skip_nan_cells() {
        let ds = Dataset::from_rows(vec![
            Row::new()
                .with("hour", 5_i64)
                .with("humidity", 0.5)
                .with("temp", 0.2)
                .with("windspeed", f64::NAN),
            Row::new()
                .with("hour", 5_i64)
                .with("humidity", 0.7)
                .with("temp", 0.4)
                .with("windspeed", 0.3),
        ]);
        let avg = average_metrics_for_group(&ds, "hour", &FieldValue::Integer(5)).unwrap();
        assert!(close(avg.humidity, 0.6));
        assert!(close(avg.temp, 0.3));
        assert!(close(avg.windspeed, 0.3));

        let table = weather_means_by_group(&ds, &ColumnSchema::default(), "hour").unwrap();
        assert!(close(table[0].averages.windspeed, 0.3));
    }

    #[test]
    fn highest_total_ignores_nan_counts() {
        let ds = Dataset::from_rows(vec![
            Row::new().with("season", 1_i64).with("count", 500_i64),
            Row::new().with("season", 2_i64).with("count", f64::NAN),
            Row::new().with("season", 3_i64).with("count", 1_i64),
        ]);
        let best = find_category_with_highest_total(&ds, "season", "count").unwrap();
        assert_eq!(best.category, FieldValue::Integer(1));
        assert_eq!(best.total, 500.0);
        assert_eq!(column_total(&ds, "count").unwrap(), 501.0);
    }

    #[test]
    fn total_and_averages_cover_the_same_rows() {
        let ds = Dataset::from_rows(vec![
            Row::new()
                .with("season", 2_i64)
                .with("count", 10_i64)
                .with("humidity", 0.2)
                .with("temp", 0.2)
                .with("windspeed", 0.2),
            Row::new()
                .with("season", 2.0)
                .with("count", 10_i64)
                .with("humidity", 0.6)
                .with("temp", 0.6)
                .with("windspeed", 0.6),
            Row::new()
                .with("season", 1_i64)
                .with("count", 15_i64)
                .with("humidity", 0.9)
                .with("temp", 0.9)
                .with("windspeed", 0.9),
        ]);
        let best = find_category_with_highest_total(&ds, "season", "count").unwrap();
        assert_eq!(best.category, FieldValue::Integer(2));
        assert_eq!(best.total, 20.0);

        let avg = average_metrics_for_group(&ds, "season", &best.category).unwrap();
        assert!(close(avg.humidity, 0.4));

        let totals = totals_by_group(&ds, "season", "count").unwrap();
        assert_eq!(
            totals,
            vec![(FieldValue::Integer(1), 15.0), (FieldValue::Integer(2), 20.0)]
        );
    }

    #[test]
    fn histogram_bins_cover_min_to_max() {
        let ds: Dataset = (0..=10_i64).map(|v| Row::new().with("casual", v)).collect();
        let h = histogram(&ds, "casual", 5).unwrap();
        assert_eq!(h.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(h.counts, vec![2, 2, 2, 2, 3]);
        assert_eq!(h.counts.iter().sum::<usize>(), 11);
    }

    #[test]
    fn histogram_edge_cases() {
        let flat = Dataset::from_rows(vec![
            Row::new().with("casual", 5_i64),
            Row::new().with("casual", 5_i64),
            Row::new().with("casual", f64::NAN),
        ]);
        let h = histogram(&flat, "casual", 4).unwrap();
        assert_eq!(h.edges, vec![4.5, 4.75, 5.0, 5.25, 5.5]);
        assert_eq!(h.counts, vec![0, 0, 2, 0]);

        assert!(matches!(histogram(&flat, "casual", 0), Err(AggregateError::ZeroBins)));
        assert!(matches!(
            histogram(&Dataset::default(), "casual", 3),
            Err(AggregateError::NoValues(c)) if c == "casual"
        ));
    }

    #[test]
    fn user_histograms_share_one_range() {
        let ds = Dataset::from_rows(vec![
            Row::new().with("casual", 0_i64).with("registered", 20_i64),
            Row::new().with("casual", 10_i64).with("registered", 40_i64),
        ]);
        let h = user_histograms(&ds, &ColumnSchema::default(), 4).unwrap();
        assert_eq!(h.casual.edges, h.registered.edges);
        assert_eq!(h.casual.edges, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(h.casual.counts, vec![1, 1, 0, 0]);
        assert_eq!(h.registered.counts, vec![0, 0, 1, 1]);
    }

    #[test]
    fn scaling_is_per_metric() {
        let avg = WeatherAverages {
            humidity: 0.5,
            temp: 0.25,
            windspeed: 0.125,
        };
        assert_eq!(avg.scaled(WeatherScale::IDENTITY), avg);
        let wind = avg.scaled(WeatherScale::WIND_PERCENT);
        assert_eq!((wind.humidity, wind.temp, wind.windspeed), (0.5, 0.25, 12.5));
        let pct = avg.scaled(WeatherScale::PERCENT);
        assert_eq!((pct.humidity, pct.temp, pct.windspeed), (50.0, 25.0, 12.5));
    }

    #[test]
    fn split_percentages() {
        let ds = Dataset::from_rows(vec![
            Row::new().with("casual", 10_i64).with("registered", 30_i64),
            Row::new().with("casual", 15_i64).with("registered", 45_i64),
        ]);
        let split = user_split(&ds, &ColumnSchema::default()).unwrap();
        assert_eq!(split.total, 100.0);
        assert!(close(split.casual_percent, 25.0));
        assert!(close(split.registered_percent, 75.0));

        let zero = Dataset::from_rows(vec![Row::new()
            .with("casual", 0_i64)
            .with("registered", 0_i64)]);
        let split = user_split(&zero, &ColumnSchema::default()).unwrap();
        assert_eq!((split.casual_percent, split.registered_percent), (0.0, 0.0));
    }

    #[test]
    fn totals_and_means_by_group_are_key_ordered() {
        let totals = totals_by_group(&seasons(), "season", "count").unwrap();
        assert_eq!(
            totals,
            vec![(FieldValue::Integer(1), 15.0), (FieldValue::Integer(2), 30.0)]
        );

        let table = weather_means_by_group(&hours(), &ColumnSchema::default(), "hour").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].group, FieldValue::Integer(5));
        assert!(close(table[0].averages.temp, 0.3));
        assert_eq!(table[1].group, FieldValue::Integer(6));
        assert!(close(table[1].averages.windspeed, 0.9));

        assert!(totals_by_group(&Dataset::default(), "season", "count")
            .unwrap()
            .is_empty());
        assert_eq!(column_total(&Dataset::default(), "count").unwrap(), 0.0);
    }
}
