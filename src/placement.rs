//! Decides whether and where a point label is drawn.
//!
//! Two policies are supported. `ShapeBased` looks at the point's neighbours in
//! the full series and pushes the label away from the line: above peaks, below
//! valleys, up-left on a rise and up-right on a fall. `SeriesIdentity` ignores
//! the shape and puts every label of a series on a fixed side, which keeps
//! overlapping series readable.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use crate::series::Point;

pub const DEFAULT_EDGE_MARGIN_PX: f64 = 30.0;
pub const MIN_EDGE_MARGIN_PX: f64 = 10.0;
pub const MAX_EDGE_MARGIN_PX: f64 = 30.0;
pub const DEFAULT_LABEL_OFFSET_PX: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Baseline {
    Top,
    Middle,
    #[default]
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Above,
    Below,
}

impl FromStr for Side {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            other => Err(format!("unknown label side: {other}")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlacementPolicy {
    #[default]
    ShapeBased,
    SeriesIdentity(HashMap<String, Side>),
}

/// Where a label is drawn relative to its point, in pixels (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementDecision {
    pub visible: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub anchor: TextAnchor,
    pub baseline: Baseline,
}

impl PlacementDecision {
    const fn neutral() -> Self {
        Self {
            visible: true,
            offset_x: 0.0,
            offset_y: 0.0,
            anchor: TextAnchor::Start,
            baseline: Baseline::Bottom,
        }
    }

    const fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::neutral()
        }
    }
}

/// Pixel-space inputs for one label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelSite {
    pub x: f64,
    pub y: f64,
    pub plot_width: f64,
    pub plot_height: f64,
}

impl LabelSite {
    fn near_edge(&self, margin: f64) -> bool {
        self.x < margin
            || self.y < margin
            || (self.plot_width - self.x).abs() < margin
            || (self.plot_height - self.y).abs() < margin
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacer {
    policy: PlacementPolicy,
    edge_margin: f64,
    offset: f64,
}

impl Default for LabelPlacer {
    fn default() -> Self {
        Self::new(PlacementPolicy::default())
    }
}

impl LabelPlacer {
    pub const fn new(policy: PlacementPolicy) -> Self {
        Self {
            policy,
            edge_margin: DEFAULT_EDGE_MARGIN_PX,
            offset: DEFAULT_LABEL_OFFSET_PX,
        }
    }

    /// Margin is clamped into the supported 10..=30 px band.
    #[must_use]
    pub fn with_edge_margin(mut self, margin: f64) -> Self {
        self.edge_margin = margin.clamp(MIN_EDGE_MARGIN_PX, MAX_EDGE_MARGIN_PX);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub const fn policy(&self) -> &PlacementPolicy {
        &self.policy
    }

    pub const fn edge_margin(&self) -> f64 {
        self.edge_margin
    }

    /// `prev`/`next` are the neighbouring values in the unreduced series; a
    /// missing neighbour marks the point as a series endpoint.
    pub fn place(
        &self,
        series_label: &str,
        point: &Point,
        prev: Option<f64>,
        next: Option<f64>,
        site: LabelSite,
    ) -> PlacementDecision {
        if site.near_edge(self.edge_margin) {
            return PlacementDecision::hidden();
        }
        let (Some(prev), Some(next)) = (prev, next) else {
            return PlacementDecision::neutral();
        };

        match &self.policy {
            PlacementPolicy::ShapeBased => self.by_shape(point.value, prev, next),
            PlacementPolicy::SeriesIdentity(sides) => sides
                .get(series_label)
                .map_or_else(PlacementDecision::neutral, |side| self.on_side(*side)),
        }
    }

    fn by_shape(&self, value: f64, prev: f64, next: f64) -> PlacementDecision {
        let d = self.offset;
        if prev < value && next < value {
            self.on_side(Side::Above)
        } else if prev > value && next > value {
            self.on_side(Side::Below)
        } else if prev < value && next > value {
            PlacementDecision {
                visible: true,
                offset_x: -d,
                offset_y: -d,
                anchor: TextAnchor::End,
                baseline: Baseline::Middle,
            }
        } else if prev > value && next < value {
            PlacementDecision {
                visible: true,
                offset_x: d,
                offset_y: -d,
                anchor: TextAnchor::Start,
                baseline: Baseline::Middle,
            }
        } else {
            PlacementDecision::neutral()
        }
    }

    fn on_side(&self, side: Side) -> PlacementDecision {
        match side {
            Side::Above => PlacementDecision {
                visible: true,
                offset_x: 0.0,
                offset_y: -self.offset,
                anchor: TextAnchor::Middle,
                baseline: Baseline::Bottom,
            },
            Side::Below => PlacementDecision {
                visible: true,
                offset_x: 0.0,
                offset_y: self.offset,
                anchor: TextAnchor::Middle,
                baseline: Baseline::Top,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn point(value: f64) -> Point {
        Point {
            time: DateTime::<Utc>::UNIX_EPOCH,
            value,
            index: 1,
        }
    }

    fn center() -> LabelSite {
        LabelSite {
            x: 200.0,
            y: 200.0,
            plot_width: 400.0,
            plot_height: 400.0,
        }
    }

    fn shape() -> LabelPlacer {
        LabelPlacer::new(PlacementPolicy::ShapeBased)
    }

    #[test]
    fn hides_labels_near_each_edge() {
        let placer = shape();
        let sites = [
            LabelSite { x: 5.0, ..center() },
            LabelSite { y: 29.0, ..center() },
            LabelSite { x: 395.0, ..center() },
            LabelSite { y: 371.0, ..center() },
        ];
        for site in sites {
            let decision = placer.place("Temperature", &point(5.0), Some(1.0), Some(1.0), site);
            assert!(!decision.visible, "{site:?} should be hidden");
        }
        let endpoint = placer.place("Temperature", &point(5.0), None, Some(1.0), sites[0]);
        assert!(!endpoint.visible);
    }

    #[test]
    fn margin_is_configurable() {
        let placer = shape().with_edge_margin(12.0);
        let site = LabelSite { x: 20.0, ..center() };
        assert!(placer.place("T", &point(5.0), Some(1.0), Some(1.0), site).visible);
        assert!((shape().with_edge_margin(100.0).edge_margin() - 30.0).abs() < f64::EPSILON);
        assert!((shape().with_edge_margin(0.0).edge_margin() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn endpoints_are_neutral() {
        let placer = shape();
        let first = placer.place("T", &point(5.0), None, Some(9.0), center());
        let last = placer.place("T", &point(5.0), Some(9.0), None, center());
        assert_eq!(first, PlacementDecision::neutral());
        assert_eq!(last, PlacementDecision::neutral());
    }

    #[test]
    fn peaks_go_above_and_valleys_below() {
        let placer = shape();
        let peak = placer.place("T", &point(5.0), Some(1.0), Some(2.0), center());
        assert!(peak.offset_y < 0.0);
        assert_eq!(peak.anchor, TextAnchor::Middle);

        let valley = placer.place("T", &point(0.0), Some(1.0), Some(2.0), center());
        assert!(valley.offset_y > 0.0);
        assert_eq!(valley.baseline, Baseline::Top);
    }

    #[test]
    fn slopes_go_up_and_sideways() {
        let placer = shape();
        let rising = placer.place("T", &point(1.5), Some(1.0), Some(2.0), center());
        assert!(rising.offset_x < 0.0 && rising.offset_y < 0.0);
        assert_eq!(rising.anchor, TextAnchor::End);

        let falling = placer.place("T", &point(1.5), Some(2.0), Some(1.0), center());
        assert!(falling.offset_x > 0.0 && falling.offset_y < 0.0);
        assert_eq!(falling.anchor, TextAnchor::Start);
    }

    #[test]
    fn equal_neighbours_are_neutral() {
        let placer = shape();
        let plateau = placer.place("T", &point(1.0), Some(1.0), Some(2.0), center());
        assert_eq!(plateau, PlacementDecision::neutral());
    }

    #[test]
    fn default_policy_is_shape_based() {
        assert_eq!(PlacementPolicy::default(), PlacementPolicy::ShapeBased);
        assert_eq!(LabelPlacer::default().policy(), &PlacementPolicy::ShapeBased);
    }

    #[test]
    fn series_identity_ignores_shape() {
        let sides = HashMap::from([
            ("Temperature".to_string(), Side::Above),
            ("Dew Point".to_string(), Side::Below),
        ]);
        let placer = LabelPlacer::new(PlacementPolicy::SeriesIdentity(sides));

        let valley = placer.place("Temperature", &point(0.0), Some(1.0), Some(2.0), center());
        assert!(valley.offset_y < 0.0);
        let peak = placer.place("Dew Point", &point(5.0), Some(1.0), Some(2.0), center());
        assert!(peak.offset_y > 0.0);
        let unknown = placer.place("Wind", &point(5.0), Some(1.0), Some(2.0), center());
        assert_eq!(unknown, PlacementDecision::neutral());
    }
}
