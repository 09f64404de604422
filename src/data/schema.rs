use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Column names of the daily / hourly datasets
// ---------------------------------------------------------------------------

/// Names of the columns the aggregations read.
///
/// Defaults match the published bike-sharing exports. A JSON override may
/// name any subset of fields; the rest keep their defaults:
///
/// ```json
/// { "date": "day", "count": "cnt" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub date: String,
    pub season: String,
    pub hour: String,
    pub count: String,
    pub casual: String,
    pub registered: String,
    pub humidity: String,
    pub temp: String,
    pub windspeed: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            date: "dteday".into(),
            season: "season".into(),
            hour: "hour".into(),
            count: "count".into(),
            casual: "casual".into(),
            registered: "registered".into(),
            humidity: "humidity".into(),
            temp: "temp".into(),
            windspeed: "windspeed".into(),
        }
    }
}

impl ColumnSchema {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Weather columns in display order: humidity, temp, windspeed.
    pub fn weather_columns(&self) -> [&str; 3] {
        [
            self.humidity.as_str(),
            self.temp.as_str(),
            self.windspeed.as_str(),
        ]
    }
}
