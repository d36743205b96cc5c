//! Chart configuration loaded from an optional TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::bucket::ReferenceZone;
use crate::color::ColorScale;
use crate::placement::{
    DEFAULT_EDGE_MARGIN_PX, DEFAULT_LABEL_OFFSET_PX, LabelPlacer, MAX_EDGE_MARGIN_PX,
    MIN_EDGE_MARGIN_PX, PlacementPolicy, Side,
};
use crate::series::{DEW_POINT_LABEL, ParseOptions, TEMPERATURE_LABEL};

pub const DEFAULT_CONFIG_PATH: &str = "config/chart.toml";
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_HEIGHT_PX: u32 = 400;
pub const DEFAULT_DAY_WIDTH_PX: u32 = 750;
pub const DEFAULT_WEEK_DAY_WIDTH_PX: u32 = 200;
const MAX_DAYS: u32 = 14;
const MIN_HEIGHT_PX: u32 = 100;
const POLICY_SHAPE: &str = "shape";
const POLICY_SERIES: &str = "series";
const TEMPERATURE_SCALE: [f64; 2] = [0.0, 35.0];
const DEW_POINT_SCALE: [f64; 2] = [0.0, 21.0];

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    chart: Option<ChartSection>,
    placement: Option<PlacementSection>,
    series: Option<SeriesSection>,
    color_scales: Option<HashMap<String, [f64; 2]>>,
}

#[derive(Debug, Deserialize)]
struct ChartSection {
    time_zone: Option<String>,
    days: Option<u32>,
    height: Option<u32>,
    day_width_px: Option<u32>,
    week_day_width_px: Option<u32>,
    label_margin_px: Option<f64>,
    label_offset_px: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlacementSection {
    policy: Option<String>,
    sides: Option<HashMap<String, Side>>,
}

#[derive(Debug, Deserialize)]
struct SeriesSection {
    #[serde(alias = "expand_durations")]
    expand_duration_to_hourly_points: Option<bool>,
}

/// Fully resolved settings for one chart.
#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub zone: ReferenceZone,
    pub days: u32,
    pub height: u32,
    pub day_width_px: u32,
    pub week_day_width_px: u32,
    pub placer: LabelPlacer,
    pub parse: ParseOptions,
    pub color_scales: HashMap<String, ColorScale>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            zone: ReferenceZone::default(),
            days: DEFAULT_DAYS,
            height: DEFAULT_HEIGHT_PX,
            day_width_px: DEFAULT_DAY_WIDTH_PX,
            week_day_width_px: DEFAULT_WEEK_DAY_WIDTH_PX,
            placer: LabelPlacer::default(),
            parse: ParseOptions::default(),
            color_scales: default_color_scales(),
        }
    }
}

impl ChartConfig {
    pub fn color_scale(&self, label: &str) -> Option<ColorScale> {
        self.color_scales.get(label).copied()
    }
}

fn default_color_scales() -> HashMap<String, ColorScale> {
    HashMap::from([
        (
            TEMPERATURE_LABEL.to_string(),
            ColorScale::new(TEMPERATURE_SCALE[0], TEMPERATURE_SCALE[1]),
        ),
        (
            DEW_POINT_LABEL.to_string(),
            ColorScale::new(DEW_POINT_SCALE[0], DEW_POINT_SCALE[1]),
        ),
    ])
}

fn default_sides() -> HashMap<String, Side> {
    HashMap::from([
        (TEMPERATURE_LABEL.to_string(), Side::Above),
        (DEW_POINT_LABEL.to_string(), Side::Below),
    ])
}

/// Reads `path`; a missing default path falls back to built-in settings.
pub fn load_config(path: &Path) -> Result<ChartConfig, String> {
    if !path.exists() {
        if path == Path::new(DEFAULT_CONFIG_PATH) {
            tracing::info!(
                "Chart config {} not found, using built-in defaults",
                path.display()
            );
            return Ok(ChartConfig::default());
        }
        return Err(format!("Chart config {} does not exist", path.display()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read chart config {}: {err}", path.display()))?;
    parse_config(&raw).map_err(|err| format!("Invalid chart config {}: {err}", path.display()))
}

/// Parses TOML text and resolves it over the defaults.
pub fn parse_config(raw: &str) -> Result<ChartConfig, String> {
    let file: ConfigFile = toml::from_str(raw).map_err(|err| err.to_string())?;
    let config = resolve(file)?;
    validate(&config)?;
    Ok(config)
}

fn resolve(file: ConfigFile) -> Result<ChartConfig, String> {
    let mut cfg = ChartConfig::default();
    let mut margin = DEFAULT_EDGE_MARGIN_PX;
    let mut offset = DEFAULT_LABEL_OFFSET_PX;

    if let Some(chart) = file.chart {
        if let Some(zone) = chart.time_zone {
            cfg.zone = zone.parse().map_err(|err| format!("chart.time_zone: {err}"))?;
        }
        if let Some(days) = chart.days {
            cfg.days = days;
        }
        if let Some(height) = chart.height {
            cfg.height = height;
        }
        if let Some(width) = chart.day_width_px {
            cfg.day_width_px = width;
        }
        if let Some(width) = chart.week_day_width_px {
            cfg.week_day_width_px = width;
        }
        if let Some(value) = chart.label_margin_px {
            if !value.is_finite() || !(MIN_EDGE_MARGIN_PX..=MAX_EDGE_MARGIN_PX).contains(&value) {
                return Err(format!(
                    "chart.label_margin_px must be within {MIN_EDGE_MARGIN_PX}..={MAX_EDGE_MARGIN_PX}"
                ));
            }
            margin = value;
        }
        if let Some(value) = chart.label_offset_px {
            if !value.is_finite() || value < 0.0 {
                return Err("chart.label_offset_px must be >= 0".to_string());
            }
            offset = value;
        }
    }

    let policy = match file.placement {
        None => PlacementPolicy::default(),
        Some(placement) => {
            let name = placement
                .policy
                .unwrap_or_else(|| POLICY_SHAPE.to_string())
                .to_lowercase();
            match name.as_str() {
                POLICY_SHAPE => {
                    if placement.sides.is_some() {
                        tracing::warn!("placement.sides ignored for the shape policy");
                    }
                    PlacementPolicy::ShapeBased
                }
                POLICY_SERIES => {
                    PlacementPolicy::SeriesIdentity(placement.sides.unwrap_or_else(default_sides))
                }
                other => return Err(format!("Unknown placement policy: {other}")),
            }
        }
    };
    cfg.placer = LabelPlacer::new(policy)
        .with_edge_margin(margin)
        .with_offset(offset);

    if let Some(series) = file.series
        && let Some(expand) = series.expand_duration_to_hourly_points
    {
        cfg.parse.expand_duration_to_hourly_points = expand;
    }

    if let Some(scales) = file.color_scales {
        for (label, [min, max]) in scales {
            cfg.color_scales.insert(label, ColorScale::new(min, max));
        }
    }

    Ok(cfg)
}

fn validate(cfg: &ChartConfig) -> Result<(), String> {
    if !(1..=MAX_DAYS).contains(&cfg.days) {
        return Err(format!("chart.days must be within 1..={MAX_DAYS}"));
    }
    if cfg.height < MIN_HEIGHT_PX {
        return Err(format!("chart.height must be >= {MIN_HEIGHT_PX}"));
    }
    if cfg.day_width_px == 0 || cfg.week_day_width_px == 0 {
        return Err("day widths must be > 0".to_string());
    }
    for (label, scale) in &cfg.color_scales {
        if !scale.min.is_finite() || !scale.max.is_finite() || scale.min >= scale.max {
            return Err(format!("color_scales.{label} must be an increasing [min, max]"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.zone, ReferenceZone::default());
        assert_eq!(cfg.days, DEFAULT_DAYS);
        assert_eq!(cfg.placer, LabelPlacer::default());
        assert!(!cfg.parse.expand_duration_to_hourly_points);
        assert_eq!(
            cfg.color_scale(DEW_POINT_LABEL),
            Some(ColorScale::new(0.0, 21.0))
        );
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = parse_config(
            r#"
            [chart]
            time_zone = "Europe/London"
            days = 3
            label_margin_px = 12

            [placement]
            policy = "series"

            [placement.sides]
            Temperature = "below"

            [series]
            expand_duration_to_hourly_points = true

            [color_scales]
            Temperature = [-10, 40]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.zone.to_string(), "Europe/London");
        assert_eq!(cfg.days, 3);
        assert!((cfg.placer.edge_margin() - 12.0).abs() < f64::EPSILON);
        assert_eq!(
            cfg.placer.policy(),
            &PlacementPolicy::SeriesIdentity(HashMap::from([(
                TEMPERATURE_LABEL.to_string(),
                Side::Below
            )]))
        );
        assert!(cfg.parse.expand_duration_to_hourly_points);
        assert_eq!(
            cfg.color_scale(TEMPERATURE_LABEL),
            Some(ColorScale::new(-10.0, 40.0))
        );
    }

    #[test]
    fn series_policy_defaults_its_sides() {
        let cfg = parse_config("[placement]\npolicy = \"SERIES\"\n").unwrap();
        assert_eq!(
            cfg.placer.policy(),
            &PlacementPolicy::SeriesIdentity(default_sides())
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "[chart]\ntime_zone = \"Mars/Olympus\"\n",
            "[chart]\nlabel_margin_px = 45\n",
            "[chart]\ndays = 0\n",
            "[placement]\npolicy = \"random\"\n",
            "[color_scales]\nTemperature = [5, 5]\n",
            "[chart\n",
        ];
        for raw in cases {
            assert!(parse_config(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
