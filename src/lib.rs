//! Temperature and dew point charts from NWS grid forecasts.
//!
//! The core is pure and deterministic: calendar bucketing in a reference time
//! zone, per-bucket extrema, linear scales, label placement and night
//! intervals. `fetch`, `data` and `report` wire it to the NWS API, CSV files
//! and a Plotly HTML page.

pub mod bucket;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod extrema;
pub mod fetch;
pub mod location;
pub mod placement;
pub mod report;
pub mod scale;
pub mod series;
pub mod solar;

pub use bucket::{Boundary, Granularity, ReferenceZone, compute_boundaries};
pub use color::{Color, ColorScale, contrast, darken_to_min_contrast, parse_color};
pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use extrema::extract_extrema;
pub use location::Coordinates;
pub use placement::{LabelPlacer, LabelSite, PlacementDecision, PlacementPolicy, Side};
pub use scale::{LinearScale, TimeScale};
pub use series::{ParseOptions, Point, TimeSeries, WeatherReport, parse_grid_data};
pub use solar::{NightInterval, SunTimes, night_intervals_for_day, solar_date, sun_times};
