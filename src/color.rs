//! Colour parsing, WCAG contrast and the Turbo sequential scale.

use std::fmt;
use std::str::FromStr;

use crate::error::{ChartError, ChartResult};

/// Step applied per darkening iteration (a factor of `0.7^0.1`).
const DARKEN_STEP: f64 = 0.1;
const DARKER_BASE: f64 = 0.7;
/// Upper bound on darkening iterations; black is reached well before this.
const MAX_DARKEN_STEPS: usize = 1_000;

/// sRGB colour with floating channels in `0.0..=255.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const WHITE: Self = Self::new(255.0, 255.0, 255.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Multiplies every channel by `0.7^k`.
    #[must_use]
    pub fn darker(self, k: f64) -> Self {
        let factor = DARKER_BASE.powf(k);
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Relative luminance of the linearised channels.
    pub fn luminance(self) -> f64 {
        let [r, g, b] = [self.r, self.g, self.b].map(|c| linearize(c / 255.0));
        0.0722f64.mul_add(b, 0.2126f64.mul_add(r, 0.7152 * g))
    }

    /// Channels rounded and clamped to bytes.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let byte = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        (byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.to_rgb8();
        write!(f, "rgb({r}, {g}, {b})")
    }
}

impl FromStr for Color {
    type Err = ChartError;

    fn from_str(raw: &str) -> ChartResult<Self> {
        parse_color(raw)
    }
}

fn linearize(v: f64) -> f64 {
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Accepts `#rgb`, `#rrggbb` and `rgb(r, g, b)`.
pub fn parse_color(raw: &str) -> ChartResult<Color> {
    let trimmed = raw.trim();
    let unparseable = || ChartError::UnparseableColor(raw.to_string());

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(unparseable);
    }

    let args = trimmed
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(unparseable)?;
    let channels: Vec<f64> = args
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| unparseable())?;
    match channels.as_slice() {
        [r, g, b] if [r, g, b].iter().all(|c| (0.0..=255.0).contains(*c)) => {
            Ok(Color::new(*r, *g, *b))
        }
        _ => Err(unparseable()),
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(f64::from);
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(hex[i..=i].repeat(2).as_str());
            Some(Color::new(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Color::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// WCAG contrast ratio, always `>= 1`.
pub fn contrast(c1: Color, c2: Color) -> f64 {
    let l1 = c1.luminance();
    let l2 = c2.luminance();
    (l1.max(l2) + 0.05) / (l1.min(l2) + 0.05)
}

/// Darkens `color` in small steps until it reaches `min_contrast` against
/// `background`; gives up at black.
pub fn darken_to_min_contrast(
    color: &str,
    background: &str,
    min_contrast: f64,
) -> ChartResult<Color> {
    let background = parse_color(background)?;
    let color = parse_color(color)?;
    Ok(ensure_contrast(color, background, min_contrast))
}

pub fn ensure_contrast(color: Color, background: Color, min_contrast: f64) -> Color {
    let mut resolved = color;
    for _ in 0..MAX_DARKEN_STEPS {
        if contrast(resolved, background) >= min_contrast {
            break;
        }
        resolved = resolved.darker(DARKEN_STEP);
    }
    resolved
}

/// Turbo colour map over a value domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn color(&self, value: f64) -> Color {
        let span = self.max - self.min;
        let t = if span.abs() < f64::EPSILON {
            0.5
        } else {
            (value - self.min) / span
        };
        turbo(t)
    }
}

/// Polynomial approximation of the Turbo colour map for `t` in `0..=1`.
pub fn turbo(t: f64) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let channel = |c: f64| c.round().clamp(0.0, 255.0);
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    Color::new(channel(r), channel(g), channel(b))
}
