//! Synthetic daily / hourly bike-sharing data.
//!
//! Hourly rows are generated first; each daily row is the sum (counts) or
//! mean (weather) of its 24 hours, so both datasets always agree.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate, Weekday};
use log::info;

use crate::data::model::{Dataset, FieldValue, Row};
use crate::data::schema::ColumnSchema;

/// Registered riders per hour on a working day (commuter peaks at 8 and 17-18).
const REGISTERED_PROFILE: [f64; 24] = [
    12.0, 6.0, 4.0, 2.0, 2.0, 8.0, 35.0, 120.0, 230.0, 130.0, 70.0, 80.0, //
    100.0, 95.0, 85.0, 100.0, 180.0, 320.0, 300.0, 210.0, 150.0, 110.0, 80.0, 45.0,
];

/// Casual riders per hour, afternoon heavy.
const CASUAL_PROFILE: [f64; 24] = [
    5.0, 3.0, 2.0, 1.0, 1.0, 1.0, 3.0, 8.0, 15.0, 20.0, 30.0, 40.0, //
    50.0, 55.0, 58.0, 57.0, 55.0, 52.0, 45.0, 35.0, 25.0, 18.0, 13.0, 9.0,
];

/// The two generated datasets.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub daily: Dataset,
    pub hourly: Dataset,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Season code 1-4 by quarter of the year.
fn season_of(month: u32) -> i64 {
    ((month - 1) / 3 + 1) as i64
}

fn count(rng: &mut SimpleRng, expected: f64) -> i64 {
    rng.gauss(expected, expected.sqrt().max(1.0)).round().max(0.0) as i64
}

/// Generate `days` consecutive days of data from `start`, named per `schema`.
///
/// The same `seed` and `start` always yield identical datasets.
pub fn generate(seed: u64, start: NaiveDate, days: usize, schema: &ColumnSchema) -> SampleData {
    let mut rng = SimpleRng::new(seed);
    let mut daily = Vec::with_capacity(days);
    let mut hourly = Vec::with_capacity(days * 24);

    for day in start.iter_days().take(days) {
        let date = FieldValue::Date(day.format("%Y-%m-%d").to_string());
        let season = season_of(day.month());
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);

        let phase = 2.0 * PI * (day.ordinal0() as f64 - 15.0) / 365.0;
        let day_temp = (0.5 - 0.3 * phase.cos() + rng.gauss(0.0, 0.04)).clamp(0.0, 1.0);
        let day_humidity = (0.6 + rng.gauss(0.0, 0.12)).clamp(0.0, 1.0);
        let day_wind = (0.19 + rng.gauss(0.0, 0.07)).clamp(0.0, 1.0);

        // Riders like mild weather and dislike wind.
        let comfort = (0.4 + day_temp - 0.5 * day_wind).max(0.1);
        let (casual_factor, registered_factor) = if weekend { (2.2, 0.6) } else { (1.0, 1.0) };

        let mut casual_sum = 0i64;
        let mut registered_sum = 0i64;
        let mut weather_sum = [0.0f64; 3];

        for hour in 0..24 {
            let diurnal = (2.0 * PI * (hour as f64 - 9.0) / 24.0).sin();
            let temp = (day_temp + 0.06 * diurnal).clamp(0.0, 1.0);
            let humidity = (day_humidity - 0.1 * diurnal + rng.gauss(0.0, 0.03)).clamp(0.0, 1.0);
            let wind = (day_wind + 0.04 * diurnal + rng.gauss(0.0, 0.02)).clamp(0.0, 1.0);

            let casual = count(&mut rng, CASUAL_PROFILE[hour] * casual_factor * comfort);
            let registered = count(&mut rng, REGISTERED_PROFILE[hour] * registered_factor * comfort);

            casual_sum += casual;
            registered_sum += registered;
            weather_sum[0] += humidity;
            weather_sum[1] += temp;
            weather_sum[2] += wind;

            hourly.push(
                Row::new()
                    .with(&schema.date, date.clone())
                    .with(&schema.season, season)
                    .with(&schema.hour, hour as i64)
                    .with(&schema.casual, casual)
                    .with(&schema.registered, registered)
                    .with(&schema.count, casual + registered)
                    .with(&schema.humidity, humidity)
                    .with(&schema.temp, temp)
                    .with(&schema.windspeed, wind),
            );
        }

        daily.push(
            Row::new()
                .with(&schema.date, date)
                .with(&schema.season, season)
                .with("weekday", day.weekday().num_days_from_sunday() as i64)
                .with(&schema.casual, casual_sum)
                .with(&schema.registered, registered_sum)
                .with(&schema.count, casual_sum + registered_sum)
                .with(&schema.humidity, weather_sum[0] / 24.0)
                .with(&schema.temp, weather_sum[1] / 24.0)
                .with(&schema.windspeed, weather_sum[2] / 24.0),
        );
    }

    info!(
        "generated {} daily and {} hourly rows from {start} (seed {seed})",
        daily.len(),
        hourly.len()
    );
    SampleData {
        daily: Dataset::from_rows(daily),
        hourly: Dataset::from_rows(hourly),
    }
}
