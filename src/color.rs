// src/color.rs
//! Pair colors.
//!
//! Every conflict pair gets its own color drawn from a hue wheel. The wheel
//! position lives in a [`ColorCounter`] that the host persists between runs,
//! so consecutive runs keep rotating instead of restarting at red.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HighlightError;

/// Degrees on the hue wheel
const HUE_RANGE: i64 = 360;

pub const DEFAULT_HUE_STEP: i64 = 20;
pub const DEFAULT_SATURATION: f64 = 80.0;
pub const DEFAULT_LIGHTNESS: f64 = 70.0;

/// A highlight color as a lowercase `#rrggbb` string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    /// Parse a `#rrggbb` string (any case). Alpha is not accepted.
    pub fn parse(value: &str) -> Result<Self, HighlightError> {
        let hex = value
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| HighlightError::InvalidColor(value.to_string()))?;
        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02x}{:02x}{:02x}", r, g, b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = HighlightError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// Convert HSL (hue in degrees, saturation and lightness in percent) to a color.
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> Color {
    let s = saturation / 100.0;
    let l = lightness / 100.0;

    let k = |n: f64| (n + hue / 30.0) % 12.0;
    let a = s * l.min(1.0 - l);
    let f = |n: f64| l - a * (-1.0f64).max((k(n) - 3.0).min((9.0 - k(n)).min(1.0)));

    let channel = |n: f64| (255.0 * f(n)).round().clamp(0.0, 255.0) as u8;
    Color::from_rgb(channel(0.0), channel(8.0), channel(4.0))
}

/// Persisted hue position, always kept in `[0, 360)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorCounter {
    hue: i64,
}

impl ColorCounter {
    /// Any integer is accepted and folded into range, so `-20` becomes `340`.
    pub fn new(hue: i64) -> Self {
        Self {
            hue: hue.rem_euclid(HUE_RANGE),
        }
    }

    pub fn hue(&self) -> i64 {
        self.hue
    }

    /// Move the counter forward by `step` degrees and return the new hue.
    pub fn advance(&mut self, step: i64) -> i64 {
        self.hue = (self.hue + step).rem_euclid(HUE_RANGE);
        self.hue
    }
}

/// Deterministic, restartable color sequence
#[derive(Debug, Clone)]
pub struct ColorCycler {
    counter: ColorCounter,
    step: i64,
    saturation: f64,
    lightness: f64,
}

impl ColorCycler {
    pub fn new(counter: ColorCounter) -> Self {
        Self {
            counter,
            step: DEFAULT_HUE_STEP,
            saturation: DEFAULT_SATURATION,
            lightness: DEFAULT_LIGHTNESS,
        }
    }

    pub fn with_palette(counter: ColorCounter, step: i64, saturation: f64, lightness: f64) -> Self {
        Self {
            counter,
            step,
            saturation,
            lightness,
        }
    }

    /// Advance the hue and return the color at the new position.
    pub fn next_color(&mut self) -> Color {
        let hue = self.counter.advance(self.step);
        log::debug!("drawing color at hue {}", hue);
        hsl_to_hex(hue as f64, self.saturation, self.lightness)
    }

    pub fn reset(&mut self, start_hue: i64) {
        self.counter = ColorCounter::new(start_hue);
    }

    pub fn counter(&self) -> ColorCounter {
        self.counter
    }

    pub fn step(&self) -> i64 {
        self.step
    }
}

impl Iterator for ColorCycler {
    type Item = Color;

    fn next(&mut self) -> Option<Color> {
        Some(self.next_color())
    }
}
