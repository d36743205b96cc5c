//! Affine mappings from data domains to pixel ranges.

use chrono::{DateTime, Utc};

use crate::error::{ChartError, ChartResult};

/// Continuous real domain mapped onto a pixel range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    #[allow(clippy::float_cmp)]
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> ChartResult<Self> {
        let [d0, d1] = domain;
        if !d0.is_finite() || !d1.is_finite() || d0 == d1 {
            return Err(ChartError::InvalidDomain { d0, d1 });
        }
        Ok(Self { domain, range })
    }

    pub const fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub const fn range(&self) -> [f64; 2] {
        self.range
    }

    /// Interpolates `x`; the domain endpoints land exactly on the range endpoints.
    pub fn map(&self, x: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let t = (x - d0) / (d1 - d0);
        r0.mul_add(1.0 - t, r1 * t)
    }

    /// About `count` round values (1, 2 or 5 times a power of ten apart)
    /// covering the domain, in ascending order.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [d0, d1] = self.domain;
        let (lo, hi) = (d0.min(d1), d0.max(d1));
        if count == 0 {
            return Vec::new();
        }
        let step = (hi - lo) / count as f64;
        let power = step.log10().floor();
        let error = step / 10_f64.powf(power);
        let factor = if error >= 50_f64.sqrt() {
            10.0
        } else if error >= 10_f64.sqrt() {
            5.0
        } else if error >= 2_f64.sqrt() {
            2.0
        } else {
            1.0
        };

        // Negative powers divide by an integral inverse to keep values round.
        let inverse = 10_f64.powf(-power) / factor;
        let increment = factor * 10_f64.powf(power);
        let to_value = |i: i64| {
            if power < 0.0 {
                i as f64 / inverse
            } else {
                i as f64 * increment
            }
        };
        let (first, last) = if power < 0.0 {
            ((lo * inverse).ceil(), (hi * inverse).floor())
        } else {
            ((lo / increment).ceil(), (hi / increment).floor())
        };
        if !first.is_finite() || !last.is_finite() || first > last {
            return Vec::new();
        }
        (first as i64..=last as i64).map(to_value).collect()
    }

    /// Pixel back to domain; a degenerate range maps everything to `d0`.
    #[allow(clippy::float_cmp)]
    pub fn invert(&self, pixel: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if r0 == r1 {
            return d0;
        }
        let t = (pixel - r0) / (r1 - r0);
        d0.mul_add(1.0 - t, d1 * t)
    }
}

/// Time domain in epoch milliseconds mapped onto a pixel range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    pub fn new(domain: [DateTime<Utc>; 2], range: [f64; 2]) -> ChartResult<Self> {
        let inner = LinearScale::new([millis(domain[0]), millis(domain[1])], range)?;
        Ok(Self { inner })
    }

    pub fn map(&self, time: DateTime<Utc>) -> f64 {
        self.inner.map(millis(time))
    }

    pub const fn range(&self) -> [f64; 2] {
        self.inner.range()
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn endpoints_map_exactly() {
        let cases = [
            ([0.0, 1.0], [0.0, 100.0]),
            ([-3.7, 41.2], [370.0, 30.0]),
            ([0.1, 0.3], [0.1, 0.3]),
            ([1e12, 1.7e12], [0.0, 5250.0]),
        ];
        for (domain, range) in cases {
            let scale = LinearScale::new(domain, range).unwrap();
            assert_eq!(scale.map(domain[0]), range[0]);
            assert_eq!(scale.map(domain[1]), range[1]);
        }
    }

    #[test]
    fn midpoint_maps_to_range_midpoint() {
        let scale = LinearScale::new([10.0, 20.0], [400.0, 0.0]).unwrap();
        assert!((scale.map(15.0) - 200.0).abs() < 1e-9);
        assert!((scale.invert(200.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_outside_the_domain() {
        let scale = LinearScale::new([0.0, 10.0], [0.0, 100.0]).unwrap();
        assert!((scale.map(-1.0) + 10.0).abs() < 1e-9);
        assert!((scale.map(12.0) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn ticks_are_round_and_inside_the_domain() {
        let scale = LinearScale::new([-3.7, 21.2], [370.0, 30.0]).unwrap();
        assert_eq!(scale.ticks(5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);

        let narrow = LinearScale::new([0.12, 0.58], [0.0, 100.0]).unwrap();
        assert_eq!(narrow.ticks(5), vec![0.2, 0.3, 0.4, 0.5]);

        let inverted = LinearScale::new([10.0, 0.0], [0.0, 100.0]).unwrap();
        assert_eq!(inverted.ticks(5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert!(inverted.ticks(0).is_empty());
    }

    #[test]
    fn rejects_degenerate_domains() {
        assert!(matches!(
            LinearScale::new([3.0, 3.0], [0.0, 1.0]),
            Err(ChartError::InvalidDomain { .. })
        ));
        assert!(LinearScale::new([f64::NAN, 3.0], [0.0, 1.0]).is_err());
        assert!(LinearScale::new([0.0, f64::INFINITY], [0.0, 1.0]).is_err());
        let now = Utc::now();
        assert!(TimeScale::new([now, now], [0.0, 1.0]).is_err());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn time_scale_maps_instants() {
        let start = DateTime::<Utc>::UNIX_EPOCH + Duration::days(19_000);
        let end = start + Duration::days(7);
        let scale = TimeScale::new([start, end], [0.0, 1400.0]).unwrap();
        assert_eq!(scale.map(start), 0.0);
        assert_eq!(scale.map(end), 1400.0);
        assert!((scale.map(start + Duration::days(1)) - 200.0).abs() < 1e-6);
    }
}
