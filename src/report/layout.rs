//! Pixel layout of a chart: scales, axis labels, night shading and the point
//! labels that survive placement.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::bucket::{Boundary, Granularity, ReferenceZone, compute_boundaries};
use crate::color::{Color, ColorScale, ensure_contrast};
use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::extrema::extract_extrema;
use crate::location::Coordinates;
use crate::placement::{LabelSite, PlacementDecision};
use crate::scale::{LinearScale, TimeScale};
use crate::series::{Point, TimeSeries, WeatherReport, value_extent};
use crate::solar::{NightInterval, night_intervals_for_day};

const OUTER_SPACING_BOTTOM: f64 = 18.0;
const INNER_SPACING_TOP: f64 = 30.0;
const INNER_SPACING_BOTTOM: f64 = 30.0;
const LABEL_MIN_CONTRAST: f64 = 1.5;
const FLAT_DOMAIN_PADDING: f64 = 1.0;
const Y_TICK_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Hourly axis, every point labelled.
    #[default]
    Day,
    /// Daily axis, only daily extrema labelled.
    Week,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => f.write_str("day"),
            Self::Week => f.write_str("week"),
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(format!("unknown view: {other} (expected day or week)")),
        }
    }
}

impl View {
    const fn axis_granularity(self) -> Granularity {
        match self {
            Self::Day => Granularity::Hour,
            Self::Week => Granularity::Day,
        }
    }
}

/// Tick label centred in one axis boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisLabel {
    pub boundary: Boundary,
    pub text: String,
}

/// Horizontal grid line at a round value and its pixel row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueTick {
    pub value: f64,
    pub y: f64,
}

/// A labelled point with its resolved placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLabel {
    pub series: String,
    pub point: Point,
    pub text: String,
    pub marker_color: Color,
    pub text_color: Color,
    pub decision: PlacementDecision,
}

/// Line for one series, coloured by its scale at the mean value.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesLine {
    pub label: String,
    pub points: Vec<Point>,
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct ChartLayout {
    pub view: View,
    pub zone: ReferenceZone,
    pub width: f64,
    pub height: f64,
    pub inner_height: f64,
    pub x_domain: [DateTime<Utc>; 2],
    pub time_scale: TimeScale,
    pub value_scale: LinearScale,
    /// Value range visible between the plot's bottom and top pixel rows.
    pub y_range: [f64; 2],
    pub axis_labels: Vec<AxisLabel>,
    pub value_ticks: Vec<ValueTick>,
    pub nights: Vec<NightInterval>,
    pub lines: Vec<SeriesLine>,
    pub labels: Vec<PointLabel>,
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c.mul_add(9.0 / 5.0, 32.0)
}

/// `"55°"`, rounded to whole degrees Fahrenheit.
pub fn format_temperature(celsius: f64) -> String {
    // Adding zero turns a rounded -0 into 0.
    let degrees = celsius_to_fahrenheit(celsius).round() + 0.0;
    format!("{degrees}°")
}

/// Lays out `report` for the window that starts an hour before `now`.
#[allow(clippy::cast_precision_loss)]
pub fn layout_chart(
    report: &WeatherReport,
    coordinates: Coordinates,
    view: View,
    now: DateTime<Utc>,
    config: &ChartConfig,
) -> ChartResult<ChartLayout> {
    let x0 = now - Duration::hours(1);
    let x1 = x0 + Duration::days(i64::from(config.days));
    let x_domain = [x0, x1];

    let values = report
        .series()
        .into_iter()
        .flat_map(|series| series.points.iter().map(|p| p.value));
    let (lo, hi) = value_extent(values).ok_or(ChartError::NoData)?;
    let y_domain = if hi - lo < f64::EPSILON {
        [lo - FLAT_DOMAIN_PADDING, hi + FLAT_DOMAIN_PADDING]
    } else {
        [lo, hi]
    };

    let day_width = match view {
        View::Day => config.day_width_px,
        View::Week => config.week_day_width_px,
    };
    let width = f64::from(day_width) * f64::from(config.days);
    let height = f64::from(config.height);
    let inner_height = height - OUTER_SPACING_BOTTOM;

    let time_scale = TimeScale::new(x_domain, [0.0, width])?;
    let value_scale = LinearScale::new(
        y_domain,
        [inner_height - INNER_SPACING_BOTTOM, INNER_SPACING_TOP],
    )?;
    let y_range = [value_scale.invert(inner_height), value_scale.invert(0.0)];
    let value_ticks = value_scale
        .ticks(Y_TICK_COUNT)
        .into_iter()
        .map(|value| ValueTick {
            value,
            y: value_scale.map(value),
        })
        .collect();

    let zone = config.zone;
    let day_boundaries = compute_boundaries(x0, x1, Granularity::Day, zone)?;
    let axis_boundaries = match view.axis_granularity() {
        Granularity::Day => day_boundaries.clone(),
        Granularity::Hour => compute_boundaries(x0, x1, Granularity::Hour, zone)?,
    };

    let axis_labels = axis_boundaries
        .iter()
        .filter(|b| b.midpoint() >= x0 && b.midpoint() <= x1)
        .map(|b| {
            let local = zone.local(b.start);
            let text = match view {
                View::Day => local.hour().to_string(),
                View::Week => format!(
                    "{} {}/{}",
                    weekday_label(local.weekday()),
                    local.month(),
                    local.day()
                ),
            };
            AxisLabel {
                boundary: *b,
                text,
            }
        })
        .collect();

    let nights = day_boundaries
        .iter()
        .flat_map(|day| night_intervals_for_day(day, coordinates.latitude, coordinates.longitude))
        .filter(|night| !night.is_empty())
        .collect();

    let background = Color::WHITE;
    let mut lines = Vec::new();
    let mut labels = Vec::new();
    for series in report.series() {
        let scale = config
            .color_scale(&series.label)
            .unwrap_or_else(|| ColorScale::new(y_domain[0], y_domain[1]));
        let mean = series.points.iter().map(|p| p.value).sum::<f64>()
            / series.points.len().max(1) as f64;
        lines.push(SeriesLine {
            label: series.label.clone(),
            points: series.points.clone(),
            color: scale.color(mean),
        });

        let candidates = match view {
            View::Day => series.points.clone(),
            View::Week => extract_extrema(&series.points, &day_boundaries),
        };
        for point in candidates
            .into_iter()
            .filter(|p| p.time >= x0 && p.time <= x1)
        {
            let Some(decision) = label_point(
                series,
                point,
                &time_scale,
                &value_scale,
                [width, height],
                config,
            ) else {
                continue;
            };
            let marker_color = scale.color(point.value);
            labels.push(PointLabel {
                series: series.label.clone(),
                point,
                text: format_temperature(point.value),
                marker_color,
                text_color: ensure_contrast(marker_color, background, LABEL_MIN_CONTRAST),
                decision,
            });
        }
    }

    Ok(ChartLayout {
        view,
        zone,
        width,
        height,
        inner_height,
        x_domain,
        time_scale,
        value_scale,
        y_range,
        axis_labels,
        value_ticks,
        nights,
        lines,
        labels,
    })
}

/// Latest reading of one series at or before the chart's `now`.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentReading {
    pub label: String,
    pub point: Option<Point>,
}

/// Figures shown next to the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSummary {
    pub now: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub zone: ReferenceZone,
    pub view: View,
    pub current: Vec<CurrentReading>,
    /// Warmest and coldest temperature inside the chart window.
    pub high: Option<Point>,
    pub low: Option<Point>,
}

pub fn summarize(
    report: &WeatherReport,
    layout: &ChartLayout,
    coordinates: Coordinates,
    now: DateTime<Utc>,
) -> ChartSummary {
    let current = report
        .series()
        .into_iter()
        .map(|series| CurrentReading {
            label: series.label.clone(),
            point: series.latest_at(now).copied(),
        })
        .collect();

    let [x0, x1] = layout.x_domain;
    let window = || {
        report
            .temperature
            .points
            .iter()
            .filter(move |p| p.time >= x0 && p.time <= x1)
    };
    // First occurrence wins on ties, matching the extrema reducer.
    let high = window()
        .fold(None::<&Point>, |acc, p| match acc {
            Some(best) if best.value >= p.value => Some(best),
            _ => Some(p),
        })
        .copied();
    let low = window()
        .fold(None::<&Point>, |acc, p| match acc {
            Some(best) if best.value <= p.value => Some(best),
            _ => Some(p),
        })
        .copied();

    ChartSummary {
        now,
        coordinates,
        zone: layout.zone,
        view: layout.view,
        current,
        high,
        low,
    }
}

fn label_point(
    series: &TimeSeries,
    point: Point,
    time_scale: &TimeScale,
    value_scale: &LinearScale,
    [plot_width, plot_height]: [f64; 2],
    config: &ChartConfig,
) -> Option<PlacementDecision> {
    let (prev, next) = series.neighbor_values(&point);
    let site = LabelSite {
        x: time_scale.map(point.time),
        y: value_scale.map(point.value),
        plot_width,
        plot_height,
    };
    let decision = config
        .placer
        .place(&series.label, &point, prev, next, site);
    decision.visible.then_some(decision)
}

const fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Su",
        Weekday::Mon => "M",
        Weekday::Tue => "Tu",
        Weekday::Wed => "W",
        Weekday::Thu => "Th",
        Weekday::Fri => "F",
        Weekday::Sat => "Sa",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{DEW_POINT_LABEL, TEMPERATURE_LABEL};

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    /// Hourly sine-ish temperatures starting at `start`.
    fn report(start: DateTime<Utc>, hours: i64) -> WeatherReport {
        let wave = |h: i64, base: f64| {
            #[allow(clippy::cast_precision_loss)]
            let phase = (h % 24) as f64 / 24.0 * std::f64::consts::TAU;
            base + 6.0 * phase.sin()
        };
        WeatherReport {
            temperature: TimeSeries::from_samples(
                TEMPERATURE_LABEL,
                (0..hours).map(|h| (start + Duration::hours(h), wave(h, 15.0))),
            ),
            dew_point: TimeSeries::from_samples(
                DEW_POINT_LABEL,
                (0..hours).map(|h| (start + Duration::hours(h), wave(h, 8.0) - 2.0)),
            ),
        }
    }

    fn nyc() -> Coordinates {
        Coordinates::new(40.7128, -74.006).unwrap()
    }

    #[test]
    fn formats_fahrenheit() {
        assert_eq!(format_temperature(0.0), "32°");
        assert_eq!(format_temperature(21.4), "71°");
        assert_eq!(format_temperature(-40.0), "-40°");
    }

    #[test]
    fn parses_views() {
        assert_eq!("Week".parse::<View>().unwrap(), View::Week);
        assert!("month".parse::<View>().is_err());
    }

    #[test]
    fn week_view_labels_days_and_extrema() {
        let now = utc("2024-01-15T17:00:00Z");
        let data = report(now - Duration::hours(6), 24 * 8);
        let layout =
            layout_chart(&data, nyc(), View::Week, now, &ChartConfig::default()).unwrap();

        assert!((layout.width - 1400.0).abs() < f64::EPSILON);
        assert!((layout.inner_height - 382.0).abs() < f64::EPSILON);
        // Jan 15 2024 is a Monday.
        assert_eq!(layout.axis_labels[0].text, "M 1/15");
        assert!(layout.axis_labels.iter().any(|l| l.text == "Su 1/21"));
        // At most a min and a max per series and day.
        assert!(layout.labels.len() <= 2 * 2 * 8);
        assert!(!layout.labels.is_empty());
        assert!(layout.nights.len() >= 14);
    }

    #[test]
    fn day_view_hides_labels_near_edges() {
        let now = utc("2024-01-15T17:00:00Z");
        let data = report(now - Duration::hours(6), 24 * 8);
        let config = ChartConfig::default();
        let layout = layout_chart(&data, nyc(), View::Day, now, &config).unwrap();

        assert_eq!(layout.axis_labels[0].text, "11");
        for label in &layout.labels {
            let x = layout.time_scale.map(label.point.time);
            let y = layout.value_scale.map(label.point.value);
            assert!(label.decision.visible);
            assert!(x >= 30.0 && (layout.width - x).abs() >= 30.0);
            assert!(y >= 30.0 && (layout.height - y).abs() >= 30.0);
        }
        // The first point inside the window sits on the left edge.
        let x0 = layout.x_domain[0];
        assert!(layout.labels.iter().all(|l| l.point.time > x0));
    }

    #[test]
    fn label_colors_keep_contrast() {
        let now = utc("2024-07-01T17:00:00Z");
        let data = report(now, 24 * 7);
        let layout =
            layout_chart(&data, nyc(), View::Week, now, &ChartConfig::default()).unwrap();
        for label in &layout.labels {
            assert!(crate::color::contrast(label.text_color, Color::WHITE) >= 1.5);
        }
    }

    #[test]
    fn y_range_spans_inner_spacing() {
        let now = utc("2024-01-15T17:00:00Z");
        let data = report(now, 48);
        let layout = layout_chart(&data, nyc(), View::Day, now, &ChartConfig::default()).unwrap();
        let [bottom, top] = layout.y_range;
        let [lo, hi] = layout.value_scale.domain();
        assert!(bottom < lo && top > hi);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn value_ticks_are_round_and_visible() {
        let now = utc("2024-01-15T17:00:00Z");
        let data = report(now, 48);
        let layout = layout_chart(&data, nyc(), View::Day, now, &ChartConfig::default()).unwrap();
        let [bottom, top] = layout.y_range;

        assert!((3..=7).contains(&layout.value_ticks.len()));
        for pair in layout.value_ticks.windows(2) {
            assert!(pair[0].value < pair[1].value);
            assert!(pair[0].y > pair[1].y);
        }
        for tick in &layout.value_ticks {
            assert!(tick.value >= bottom && tick.value <= top);
            assert_eq!(tick.y, layout.value_scale.map(tick.value));
            assert!(tick.y >= 30.0 - 1e-9 && tick.y <= layout.inner_height - 30.0 + 1e-9);
            assert_eq!(tick.value % 5.0, 0.0);
        }
    }

    #[test]
    fn summary_reports_current_and_extremes() {
        let now = utc("2024-01-15T17:30:00Z");
        let data = report(utc("2024-01-15T12:00:00Z"), 48);
        let config = ChartConfig::default();
        let layout = layout_chart(&data, nyc(), View::Day, now, &config).unwrap();
        let summary = summarize(&data, &layout, nyc(), now);

        assert_eq!(summary.current.len(), 2);
        let temperature = summary.current[0].point.unwrap();
        assert_eq!(temperature.time, utc("2024-01-15T17:00:00Z"));
        let (high, low) = (summary.high.unwrap(), summary.low.unwrap());
        assert!(high.value > low.value);
        assert!(high.time >= layout.x_domain[0] && low.time >= layout.x_domain[0]);
    }

    #[test]
    fn empty_report_is_rejected() {
        let empty = WeatherReport {
            temperature: TimeSeries::from_samples(TEMPERATURE_LABEL, []),
            dew_point: TimeSeries::from_samples(DEW_POINT_LABEL, []),
        };
        let err = layout_chart(
            &empty,
            nyc(),
            View::Day,
            utc("2024-01-15T17:00:00Z"),
            &ChartConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::NoData));
    }
}
