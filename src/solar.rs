//! Sunrise/sunset and night intervals for shading day buckets.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::bucket::Boundary;

/// Solar longitude-time: one degree of longitude is four minutes.
const SECONDS_PER_DEGREE_LONGITUDE: f64 = 240.0;
/// Day-of-year span in which the sun stands north of the equator.
const NORTHERN_SUMMER_DAYS: std::ops::RangeInclusive<u32> = 80..=266;

/// Sunrise and sunset of one solar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SunTimes {
    Regular {
        sunrise: DateTime<Utc>,
        sunset: DateTime<Utc>,
    },
    /// Polar day: the sun stays above the horizon.
    AlwaysUp,
    /// Polar night: the sun never rises.
    AlwaysDown,
}

/// Shaded span `[start, end)`; may be empty in polar conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NightInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NightInterval {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Sunrise and sunset on `date` at the given coordinates.
///
/// When the sunrise equation has no solution the day is classified by
/// whether the sun is in the latitude's own hemisphere (polar day) or not.
#[allow(deprecated)]
pub fn sun_times(date: NaiveDate, latitude: f64, longitude: f64) -> SunTimes {
    let (rise, set) =
        sunrise::sunrise_sunset(latitude, longitude, date.year(), date.month(), date.day());

    let window_start = date.and_time(NaiveTime::MIN).and_utc() - Duration::days(1);
    let window_end = window_start + Duration::days(3);
    let regular = match (DateTime::from_timestamp(rise, 0), DateTime::from_timestamp(set, 0)) {
        (Some(sunrise), Some(sunset))
            if window_start <= sunrise
                && sunset <= window_end
                && sunrise < sunset
                && sunset - sunrise < Duration::days(1) - Duration::minutes(1) =>
        {
            Some(SunTimes::Regular { sunrise, sunset })
        }
        _ => None,
    };

    regular.unwrap_or_else(|| polar_case(date, latitude))
}

fn polar_case(date: NaiveDate, latitude: f64) -> SunTimes {
    let sun_north = NORTHERN_SUMMER_DAYS.contains(&date.ordinal());
    if (latitude >= 0.0) == sun_north {
        SunTimes::AlwaysUp
    } else {
        SunTimes::AlwaysDown
    }
}

/// Calendar date of local mean solar time at `longitude`.
#[allow(clippy::cast_possible_truncation)]
pub fn solar_date(instant: DateTime<Utc>, longitude: f64) -> NaiveDate {
    let shift = Duration::seconds((longitude * SECONDS_PER_DEGREE_LONGITUDE).round() as i64);
    (instant + shift).date_naive()
}

/// Night before sunrise and after sunset within a day boundary.
///
/// Sun times are taken for the solar date at the boundary's midpoint rather
/// than for the date of `d1`: `d1` is a midnight and sits between two solar
/// days, while the midpoint always falls inside the day being shaded.
/// Intervals are clamped into `[d0, d1]`: under polar night the first interval
/// covers the whole day and the second is empty, under polar day both are
/// empty.
pub fn night_intervals_for_day(
    boundary: &Boundary,
    latitude: f64,
    longitude: f64,
) -> [NightInterval; 2] {
    let (d0, d1) = (boundary.start, boundary.end);
    let date = solar_date(boundary.midpoint(), longitude);
    match sun_times(date, latitude, longitude) {
        SunTimes::Regular { sunrise, sunset } => [
            NightInterval {
                start: d0,
                end: sunrise.clamp(d0, d1),
            },
            NightInterval {
                start: sunset.clamp(d0, d1),
                end: d1,
            },
        ],
        SunTimes::AlwaysDown => [
            NightInterval { start: d0, end: d1 },
            NightInterval { start: d1, end: d1 },
        ],
        SunTimes::AlwaysUp => [
            NightInterval { start: d0, end: d0 },
            NightInterval { start: d1, end: d1 },
        ],
    }
}
