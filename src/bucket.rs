//! Calendar-aligned hour/day buckets in a fixed reference time zone.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour => f.write_str("hour"),
            Self::Day => f.write_str("day"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(format!("unknown granularity: {other}")),
        }
    }
}

/// Half-open interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Boundary {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + self.duration() / 2
    }
}

/// Reference zone used for all calendar arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceZone(Tz);

impl ReferenceZone {
    pub const fn new(tz: Tz) -> Self {
        Self(tz)
    }

    pub const fn tz(self) -> Tz {
        self.0
    }

    /// Resolve a local wall-clock time to an instant, preferring the earlier
    /// reading for repeated times and rounding down through skipped ones.
    pub fn resolve_earlier(self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.0.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => {
                // Reading a skipped wall clock with the post-jump offset lands
                // exactly one gap length before it.
                let after = self
                    .0
                    .offset_from_utc_datetime(&(local + Duration::days(1)))
                    .fix();
                let offset = Duration::seconds(i64::from(after.local_minus_utc()));
                Utc.from_utc_datetime(&(local - offset))
            }
        }
    }

    pub fn local(self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.0).naive_local()
    }

    pub fn local_midnight(self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_earlier(date.and_time(NaiveTime::MIN))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self(chrono_tz::America::New_York)
    }
}

impl FromStr for ReferenceZone {
    type Err = ChartError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| ChartError::UnknownTimeZone(raw.to_string()))
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

/// Tiles `[start, end]` with contiguous calendar units of the reference zone.
///
/// The first boundary starts at the unit containing `start` (rounded down even
/// across a DST gap). Units are emitted while their start is before `end`, so a
/// trailing partial unit covering `end` is always complete and an `end` that
/// falls exactly on a unit edge closes the last boundary. A zero-width query
/// still yields the single unit that contains it.
///
/// This deliberately stops one unit short of a loop that also emits the unit
/// starting at `end`: a local-midnight to local-midnight query over two days
/// yields exactly two day boundaries, and an hour query from 15:00 to 17:00
/// yields two hours, not three.
pub fn compute_boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
    zone: ReferenceZone,
) -> ChartResult<Vec<Boundary>> {
    if start > end {
        return Err(ChartError::InvalidRange { start, end });
    }

    let boundaries = match granularity {
        Granularity::Day => day_boundaries(start, end, zone),
        Granularity::Hour => hour_boundaries(start, end, zone),
    };
    Ok(boundaries)
}

fn day_boundaries(start: DateTime<Utc>, end: DateTime<Utc>, zone: ReferenceZone) -> Vec<Boundary> {
    let mut date = zone.local(start).date();
    let mut current = zone.local_midnight(date);
    let mut boundaries = Vec::new();

    loop {
        let Some(next_date) = date.succ_opt() else {
            break;
        };
        let next = zone.local_midnight(next_date);
        boundaries.push(Boundary::new(current, next));
        if next >= end {
            break;
        }
        date = next_date;
        current = next;
    }

    boundaries
}

fn hour_boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone: ReferenceZone,
) -> Vec<Boundary> {
    let local = zone.local(start);
    let top_of_hour = local
        .date()
        .and_hms_opt(local.hour(), 0, 0)
        .unwrap_or(local);
    let mut current = zone.resolve_earlier(top_of_hour);
    let mut boundaries = Vec::new();

    loop {
        // Hours are exact durations, so DST days get 23 or 25 of them.
        let next = current + Duration::hours(1);
        boundaries.push(Boundary::new(current, next));
        if next >= end {
            break;
        }
        current = next;
    }

    boundaries
}
