//! RGB to HSV conversion for colour commands.
//!
//! Input channels arrive as raw JSON numbers, so range and integer checks
//! happen here rather than in the type system. Output components are normalised to `[0, 1]`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid RGB values. Each value should be an integer between 0 and 255 (got {}).", join(.0))]
    OutOfRange(Vec<f64>),
    #[error("Invalid RGB values. Expected 3 channels, got {0}.")]
    ChannelCount(usize),
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    /// Value channel as a brightness percentage, truncated.
    pub fn level(&self) -> u8 {
        (self.value * 100.0) as u8
    }
}

/// Convert a `[r, g, b]` slice of JSON numbers. Fractional channels count as
/// out of range.
pub fn parse_rgb(channels: &[f64]) -> Result<Hsv, ValidationError> {
    let [red, green, blue] = *channels else {
        return Err(ValidationError::ChannelCount(channels.len()));
    };

    let invalid: Vec<f64> = [red, green, blue]
        .into_iter()
        .filter(|c| c.fract() != 0.0 || !(0.0..=255.0).contains(c))
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::OutOfRange(invalid));
    }

    rgb_to_hsv(red as i64, green as i64, blue as i64)
}

pub fn rgb_to_hsv(red: i64, green: i64, blue: i64) -> Result<Hsv, ValidationError> {
    let invalid: Vec<f64> = [red, green, blue]
        .into_iter()
        .filter(|c| !(0..=255).contains(c))
        .map(|c| c as f64)
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::OutOfRange(invalid));
    }

    let r = red as f64 / 255.0;
    let g = green as f64 / 255.0;
    let b = blue as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let sector = if chroma == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / chroma).rem_euclid(6.0)
    } else if max == g {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };

    Ok(Hsv {
        hue: sector / 6.0,
        saturation: if max > 0.0 { chroma / max } else { 0.0 },
        value: max,
    })
}
