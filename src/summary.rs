use std::fmt;

use log::info;
use serde::Serialize;

use crate::analysis::{
    self, GroupWeather, UserHistograms, UserSplit, WeatherAverages, WeatherScale,
};
use crate::data::model::{Dataset, FieldValue};
use crate::data::schema::ColumnSchema;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Column names, the display scaling applied to each weather readout, and
/// the histogram resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    pub schema: ColumnSchema,
    /// Scaling for the best-season weather sentence.
    pub season_scale: WeatherScale,
    /// Scaling for the best-hour weather sentence.
    pub hour_scale: WeatherScale,
    /// Scaling for the per-season weather table.
    pub table_scale: WeatherScale,
    /// Bins of the casual vs registered histogram.
    pub histogram_bins: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            schema: ColumnSchema::default(),
            season_scale: WeatherScale::WIND_PERCENT,
            hour_scale: WeatherScale::PERCENT,
            table_scale: WeatherScale::WIND_PERCENT,
            histogram_bins: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary parts
// ---------------------------------------------------------------------------

/// First and last date present in the daily data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub from: FieldValue,
    pub to: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub total_users: f64,
    pub registered_users: f64,
    pub casual_users: f64,
}

/// Best season by total count, with its (scaled) weather averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonHighlight {
    pub season: FieldValue,
    pub total: f64,
    pub weather: WeatherAverages,
}

/// Best hour by total count, with its (scaled) weather averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourHighlight {
    pub hour: FieldValue,
    pub total: f64,
    pub weather: WeatherAverages,
}

/// Everything the dashboard shows, as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub period: Option<Period>,
    pub metrics: Metrics,
    pub users: UserSplit,
    /// Distribution of daily casual and registered counts.
    pub user_histograms: UserHistograms,
    pub season: SeasonHighlight,
    pub hour: HourHighlight,
    pub count_by_season: Vec<(FieldValue, f64)>,
    pub count_by_hour: Vec<(FieldValue, f64)>,
    pub weather_by_season: Vec<GroupWeather>,
}

impl DashboardSummary {
    /// Compute the summary of already-filtered daily and hourly data.
    ///
    /// Both datasets must be non-empty; the highlights fail with
    /// [`crate::error::AggregateError::EmptyInput`] otherwise.
    pub fn build(daily: &Dataset, hourly: &Dataset, config: &SummaryConfig) -> Result<Self> {
        let schema = &config.schema;

        let period = daily.unique_values.get(&schema.date).and_then(|dates| {
            let from = dates.iter().find(|d| !d.is_null())?;
            let to = dates.iter().next_back()?;
            Some(Period {
                from: from.clone(),
                to: to.clone(),
            })
        });

        let metrics = Metrics {
            total_users: analysis::column_total(daily, &schema.count)?,
            registered_users: analysis::column_total(daily, &schema.registered)?,
            casual_users: analysis::column_total(daily, &schema.casual)?,
        };
        let users = analysis::user_split(daily, schema)?;
        let user_histograms = analysis::user_histograms(daily, schema, config.histogram_bins)?;

        let best_season = analysis::find_season_with_highest_shares(daily, schema)?;
        let season_weather = analysis::average_metrics_for_group_with(
            daily,
            schema,
            &schema.season,
            &best_season.category,
        )?;

        let best_hour = analysis::find_hour_with_highest_shares(hourly, schema)?;
        let hour_weather = analysis::average_metrics_for_group_with(
            hourly,
            schema,
            &schema.hour,
            &best_hour.category,
        )?;

        let weather_by_season = analysis::weather_means_by_group(daily, schema, &schema.season)?
            .into_iter()
            .map(|g| GroupWeather {
                averages: g.averages.scaled(config.table_scale),
                ..g
            })
            .collect();

        info!(
            "summary built from {} daily / {} hourly rows: best season {}, best hour {}",
            daily.len(),
            hourly.len(),
            best_season.category,
            best_hour.category
        );

        Ok(DashboardSummary {
            period,
            metrics,
            users,
            user_histograms,
            season: SeasonHighlight {
                season: best_season.category,
                total: best_season.total,
                weather: season_weather.scaled(config.season_scale),
            },
            hour: HourHighlight {
                hour: best_hour.category,
                total: best_hour.total,
                weather: hour_weather.scaled(config.hour_scale),
            },
            count_by_season: analysis::totals_by_group(daily, &schema.season, &schema.count)?,
            count_by_hour: analysis::totals_by_group(hourly, &schema.hour, &schema.count)?,
            weather_by_season,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Counts are whole numbers; print them without a trailing `.0`.
struct Total(f64);

impl fmt::Display for Total {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{:.2}", self.0)
        }
    }
}

fn weather_sentence(f: &mut fmt::Formatter<'_>, during: &str, w: &WeatherAverages) -> fmt::Result {
    write!(
        f,
        "During this {during}, the average humidity was {:.2}, the average temperature was {:.2}, \
         and the average windspeed was {:.2}.",
        w.humidity, w.temp, w.windspeed
    )
}

impl fmt::Display for SeasonHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The season with the most bike sharing is {} with a total of {} sharing.",
            self.season,
            Total(self.total)
        )?;
        weather_sentence(f, "season", &self.weather)
    }
}

impl fmt::Display for HourHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The hour with the most bike sharing is {}.00 with a total of {} sharing.",
            self.hour,
            Total(self.total)
        )?;
        weather_sentence(f, "hour", &self.weather)
    }
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.period {
            writeln!(f, "From {} to {} there were:", p.from, p.to)?;
        }
        writeln!(f, "  Total Users:      {}", Total(self.metrics.total_users))?;
        writeln!(f, "  Registered Users: {}", Total(self.metrics.registered_users))?;
        writeln!(f, "  Casual Users:     {}", Total(self.metrics.casual_users))?;
        writeln!(f)?;
        writeln!(
            f,
            "From {} users, {:.2}% are registered, and {:.2}% are casual.",
            Total(self.users.total),
            self.users.registered_percent,
            self.users.casual_percent
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.season)?;
        writeln!(f)?;
        write!(f, "{}", self.hour)
    }
}
