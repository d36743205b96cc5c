//! Point series and their construction from NWS grid data layers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChartError, ChartResult};

pub const TEMPERATURE_LABEL: &str = "Temperature";
pub const DEW_POINT_LABEL: &str = "Dew Point";

const TEMPERATURE_LAYER: &str = "temperature";
const DEW_POINT_LAYER: &str = "dewpoint";
const DURATION_SEPARATOR: char = '/';
/// Longest validity interval accepted for one record (two weeks).
pub const MAX_DURATION_HOURS: i64 = 24 * 14;

/// A single sample; `index` is its position in the owning series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub time: DateTime<Utc>,
    pub value: f64,
    pub index: usize,
}

/// Time-ordered samples of one variable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeries {
    pub label: String,
    pub points: Vec<Point>,
}

impl TimeSeries {
    /// Builds a series from `(time, value)` samples, sorting by time and
    /// assigning indices.
    pub fn from_samples(
        label: impl Into<String>,
        samples: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        let mut samples: Vec<_> = samples.into_iter().collect();
        samples.sort_by_key(|(time, _)| *time);
        let points = samples
            .into_iter()
            .enumerate()
            .map(|(index, (time, value))| Point { time, value, index })
            .collect();
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Values of the points adjacent to `point` in this series.
    pub fn neighbor_values(&self, point: &Point) -> (Option<f64>, Option<f64>) {
        let prev = point
            .index
            .checked_sub(1)
            .and_then(|idx| self.points.get(idx))
            .map(|p| p.value);
        let next = self.points.get(point.index + 1).map(|p| p.value);
        (prev, next)
    }

    /// Min/max of the values, `None` for an empty series.
    pub fn value_extent(&self) -> Option<(f64, f64)> {
        value_extent(self.points.iter().map(|p| p.value))
    }

    /// Last point at or before `time`.
    pub fn latest_at(&self, time: DateTime<Utc>) -> Option<&Point> {
        self.points.iter().rev().find(|p| p.time <= time)
    }
}

pub fn value_extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// How a `validTime` duration suffix turns into samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Repeat the value once per hour of the validity interval instead of
    /// keeping only its start.
    pub expand_duration_to_hourly_points: bool,
}

/// One record of a grid data layer.
#[derive(Debug, Deserialize)]
pub struct GridValue {
    #[serde(rename = "validTime")]
    pub valid_time: String,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GridLayer {
    #[serde(default)]
    pub uom: Option<String>,
    pub values: Vec<GridValue>,
}

#[derive(Debug, Deserialize)]
struct GridProperties {
    temperature: Option<GridLayer>,
    dewpoint: Option<GridLayer>,
}

#[derive(Debug, Deserialize)]
struct GridResponse {
    properties: GridProperties,
}

/// Temperature and dew point series of one forecast grid cell.
#[derive(Clone, Debug)]
pub struct WeatherReport {
    pub temperature: TimeSeries,
    pub dew_point: TimeSeries,
}

impl WeatherReport {
    pub fn series(&self) -> [&TimeSeries; 2] {
        [&self.temperature, &self.dew_point]
    }
}

/// Parses a `forecastGridData` response body.
pub fn parse_grid_data(body: &[u8], options: ParseOptions) -> ChartResult<WeatherReport> {
    let response: GridResponse = serde_json::from_slice(body)?;
    let temperature = response
        .properties
        .temperature
        .ok_or_else(|| ChartError::MissingVariable(TEMPERATURE_LAYER.to_string()))?;
    let dew_point = response
        .properties
        .dewpoint
        .ok_or_else(|| ChartError::MissingVariable(DEW_POINT_LAYER.to_string()))?;

    Ok(WeatherReport {
        temperature: parse_layer(TEMPERATURE_LABEL, &temperature.values, options)?,
        dew_point: parse_layer(DEW_POINT_LABEL, &dew_point.values, options)?,
    })
}

/// Turns layer records into a series; one bad record rejects the whole layer.
pub fn parse_layer(
    label: &str,
    values: &[GridValue],
    options: ParseOptions,
) -> ChartResult<TimeSeries> {
    let mut samples = Vec::with_capacity(values.len());
    for record in values {
        let (start, hours) = parse_valid_time(&record.valid_time)?;
        let Some(value) = record.value else {
            debug!(series = label, valid_time = %record.valid_time, "Skipping empty record");
            continue;
        };
        if options.expand_duration_to_hourly_points {
            for h in 0..hours.max(1) {
                let time = start
                    .checked_add_signed(Duration::hours(h))
                    .ok_or_else(|| ChartError::UnparseableDuration(record.valid_time.clone()))?;
                samples.push((time, value));
            }
        } else {
            samples.push((start, value));
        }
    }
    Ok(TimeSeries::from_samples(label, samples))
}

/// Splits `2024-03-09T05:00:00+00:00/PT2H` into its start instant and the
/// whole number of hours the value is valid for (1 when there is no suffix).
pub fn parse_valid_time(raw: &str) -> ChartResult<(DateTime<Utc>, i64)> {
    let trimmed = raw.trim();
    let (instant, duration) = match trimmed.split_once(DURATION_SEPARATOR) {
        Some((instant, duration)) => (instant, Some(duration)),
        None => (trimmed, None),
    };
    let start = DateTime::parse_from_rfc3339(instant)
        .map_err(|_| ChartError::UnparseableTime(instant.to_string()))?
        .with_timezone(&Utc);
    let hours = duration.map_or(Ok(1), parse_duration_hours)?;
    Ok((start, hours))
}

/// Parses an ISO-8601 duration made of days and hours (`PT3H`, `P1D`, `P1DT6H`).
///
/// Durations longer than [`MAX_DURATION_HOURS`] are rejected.
pub fn parse_duration_hours(raw: &str) -> ChartResult<i64> {
    let unparseable = || ChartError::UnparseableDuration(raw.to_string());
    let body = raw.strip_prefix('P').ok_or_else(unparseable)?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut hours = 0_i64;
    let mut components = 0;
    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D').ok_or_else(unparseable)?;
        let days = parse_component(days).ok_or_else(unparseable)?;
        hours = days.checked_mul(24).ok_or_else(unparseable)?;
        components += 1;
    }
    if let Some(time) = time_part {
        let h = time.strip_suffix('H').ok_or_else(unparseable)?;
        let h = parse_component(h).ok_or_else(unparseable)?;
        hours = hours.checked_add(h).ok_or_else(unparseable)?;
        components += 1;
    }

    if components == 0 || hours == 0 || hours > MAX_DURATION_HOURS {
        return Err(unparseable());
    }
    Ok(hours)
}

fn parse_component(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn record(valid_time: &str, value: Option<f64>) -> GridValue {
        GridValue {
            valid_time: valid_time.to_string(),
            value,
        }
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration_hours("PT1H").unwrap(), 1);
        assert_eq!(parse_duration_hours("PT13H").unwrap(), 13);
        assert_eq!(parse_duration_hours("P1D").unwrap(), 24);
        assert_eq!(parse_duration_hours("P1DT6H").unwrap(), 30);
    }

    #[test]
    fn rejects_malformed_durations() {
        for raw in ["", "P", "PT", "T2H", "PT2M", "PTH", "P-1D", "PT1.5H", "PT0H"] {
            assert!(
                matches!(
                    parse_duration_hours(raw),
                    Err(ChartError::UnparseableDuration(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_durations_are_rejected() {
        for raw in ["P999999999999999999D", "PT9223372036854775807H", "P1DT9223372036854775807H"] {
            assert!(
                matches!(
                    parse_duration_hours(raw),
                    Err(ChartError::UnparseableDuration(_))
                ),
                "{raw} should be rejected"
            );
        }
        let err = parse_valid_time("2024-03-09T05:00:00+00:00/P999999999999999999D").unwrap_err();
        assert!(matches!(err, ChartError::UnparseableDuration(_)));
    }

    #[test]
    fn durations_are_capped_at_two_weeks() {
        assert_eq!(parse_duration_hours("P14D").unwrap(), MAX_DURATION_HOURS);
        assert!(parse_duration_hours("P14DT1H").is_err());
        assert!(parse_duration_hours("PT100000H").is_err());

        let values = [record("2024-03-09T05:00:00+00:00/PT100000H", Some(1.5))];
        let options = ParseOptions {
            expand_duration_to_hourly_points: true,
        };
        let err = parse_layer(TEMPERATURE_LABEL, &values, options).unwrap_err();
        assert!(matches!(err, ChartError::UnparseableDuration(raw) if raw == "PT100000H"));
    }

    #[test]
    fn valid_time_without_suffix_is_one_hour() {
        let (start, hours) = parse_valid_time("2024-03-09T05:00:00+00:00").unwrap();
        assert_eq!(start, utc("2024-03-09T05:00:00Z"));
        assert_eq!(hours, 1);
    }

    #[test]
    fn drop_strategy_keeps_start_instants() {
        let values = [
            record("2024-03-09T05:00:00+00:00/PT2H", Some(1.5)),
            record("2024-03-09T07:00:00+00:00/PT1H", Some(2.0)),
        ];
        let series = parse_layer(TEMPERATURE_LABEL, &values, ParseOptions::default()).unwrap();
        let times: Vec<_> = series.points.iter().map(|p| p.time).collect();
        assert_eq!(
            times,
            vec![utc("2024-03-09T05:00:00Z"), utc("2024-03-09T07:00:00Z")]
        );
        assert_eq!(series.points[1].index, 1);
    }

    #[test]
    fn expand_strategy_emits_hourly_points() {
        let values = [
            record("2024-03-09T05:00:00+00:00/PT2H", Some(1.5)),
            record("2024-03-09T07:00:00+00:00/PT1H", Some(2.0)),
        ];
        let options = ParseOptions {
            expand_duration_to_hourly_points: true,
        };
        let series = parse_layer(TEMPERATURE_LABEL, &values, options).unwrap();
        let values: Vec<_> = series.points.iter().map(|p| (p.index, p.value)).collect();
        assert_eq!(values, vec![(0, 1.5), (1, 1.5), (2, 2.0)]);
        assert_eq!(series.points[1].time, utc("2024-03-09T06:00:00Z"));
    }

    #[test]
    fn bad_suffix_rejects_the_layer() {
        let values = [
            record("2024-03-09T05:00:00+00:00/PT2H", Some(1.5)),
            record("2024-03-09T07:00:00+00:00/PT30M", Some(2.0)),
        ];
        let err = parse_layer(TEMPERATURE_LABEL, &values, ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::UnparseableDuration(raw) if raw == "PT30M"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let values = [
            record("2024-03-09T05:00:00+00:00/PT1H", None),
            record("2024-03-09T06:00:00+00:00/PT1H", Some(3.0)),
        ];
        let series = parse_layer(DEW_POINT_LABEL, &values, ParseOptions::default()).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].index, 0);
    }

    #[test]
    fn parses_grid_response() {
        let body = br#"{
            "properties": {
                "temperature": {"uom": "wmoUnit:degC", "values": [
                    {"validTime": "2024-03-09T05:00:00+00:00/PT1H", "value": 4.0}
                ]},
                "dewpoint": {"uom": "wmoUnit:degC", "values": [
                    {"validTime": "2024-03-09T05:00:00+00:00/PT1H", "value": -1.0}
                ]}
            }
        }"#;
        let report = parse_grid_data(body, ParseOptions::default()).unwrap();
        assert_eq!(report.temperature.label, TEMPERATURE_LABEL);
        assert!((report.dew_point.points[0].value + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_layer_is_reported() {
        let body = br#"{"properties": {"temperature": {"values": []}}}"#;
        let err = parse_grid_data(body, ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::MissingVariable(name) if name == "dewpoint"));
    }

    #[test]
    fn neighbors_follow_series_order() {
        let series = TimeSeries::from_samples(
            TEMPERATURE_LABEL,
            [
                (utc("2024-03-09T06:00:00Z"), 2.0),
                (utc("2024-03-09T05:00:00Z"), 1.0),
                (utc("2024-03-09T07:00:00Z"), 3.0),
            ],
        );
        assert_eq!(series.neighbor_values(&series.points[0]), (None, Some(2.0)));
        assert_eq!(
            series.neighbor_values(&series.points[1]),
            (Some(1.0), Some(3.0))
        );
        assert_eq!(series.neighbor_values(&series.points[2]), (Some(2.0), None));
    }
}
