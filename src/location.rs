//! `LAT,LON` coordinate pairs as accepted by the NWS points endpoint.

use std::fmt;
use std::str::FromStr;

use crate::error::{ChartError, ChartResult};

const FRACTION_DIGITS: usize = 4;
const MAX_INTEGER_DIGITS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> ChartResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ChartError::InvalidCoordinates(format!(
                "{latitude},{longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Renders the same four-decimal form the parser accepts.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = ChartError;

    /// Accepts exactly `-?D{1,3}.DDDD,-?D{1,3}.DDDD`.
    fn from_str(raw: &str) -> ChartResult<Self> {
        let invalid = || ChartError::InvalidCoordinates(raw.to_string());
        let (lat, lon) = raw.trim().split_once(',').ok_or_else(invalid)?;
        let latitude = parse_component(lat).ok_or_else(invalid)?;
        let longitude = parse_component(lon).ok_or_else(invalid)?;
        Self::new(latitude, longitude).map_err(|_| invalid())
    }
}

fn parse_component(raw: &str) -> Option<f64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let (integer, fraction) = digits.split_once('.')?;
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let valid = (1..=MAX_INTEGER_DIGITS).contains(&integer.len())
        && fraction.len() == FRACTION_DIGITS
        && all_digits(integer)
        && all_digits(fraction);
    if !valid {
        return None;
    }
    raw.parse().ok()
}
