//! Slot values and their fixed source-literal rendering.
//!
//! Integer fields (`x`, `y`, `rotate`) round half away from zero; `scale`
//! rounds to two decimals and always prints two fractional digits. The
//! format never depends on locale.

use super::marker::MarkerPair;
use crate::text::{decode_string_literal, encode_string_literal};
use crate::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Screen offset of a draggable element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Offset, rotation (degrees) and scale of a draggable element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub rotate: f64,
    pub scale: f64,
}

/// Payload written into a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    Text(String),
    Position(Position),
    Transform(Transform),
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Transform {
    pub fn new(x: f64, y: f64, rotate: f64, scale: f64) -> Self {
        Self { x, y, rotate, scale }
    }
}

impl SlotValue {
    /// Reject values that cannot be rendered as numeric literals.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidValue`] when a numeric field is NaN,
    /// infinite, or too large to render as an integer literal.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields: Vec<(&str, f64)> = match self {
            Self::Text(_) => Vec::new(),
            Self::Position(p) => vec![("x", p.x), ("y", p.y)],
            Self::Transform(t) => vec![
                ("x", t.x),
                ("y", t.y),
                ("rotate", t.rotate),
                ("scale", t.scale),
            ],
        };
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(AppError::InvalidValue(format!(
                    "{} must be a finite number, got {}",
                    field, value
                )));
            }
            // Scale keeps two decimals, so its hundredths must stay in range.
            let magnitude = if field == "scale" { value * 100.0 } else { value };
            if !fits_integer_literal(magnitude) {
                return Err(AppError::InvalidValue(format!(
                    "{} is out of range, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Render the literal that goes between the markers, without the markers.
    pub fn render_body(&self) -> String {
        match self {
            Self::Text(text) => encode_string_literal(text),
            Self::Position(p) => format!("{{ x: {}, y: {} }}", round_int(p.x), round_int(p.y)),
            Self::Transform(t) => format!(
                "{{ x: {}, y: {}, rotate: {}, scale: {} }}",
                round_int(t.x),
                round_int(t.y),
                round_int(t.rotate),
                format_scale(t.scale)
            ),
        }
    }

    /// Parse the content found between a slot's markers.
    ///
    /// Quoted content reads as text; an object with `rotate` and `scale` reads
    /// as a transform; an object with only `x` and `y` reads as a position.
    ///
    /// # Returns
    /// The parsed value, or `None` when the content has none of these shapes.
    pub fn parse(inner: &str) -> Option<Self> {
        let trimmed = inner.trim();
        if trimmed.starts_with('"') {
            return decode_string_literal(trimmed).map(Self::Text);
        }
        if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
            return None;
        }

        let fields: HashMap<&str, f64> = field_pattern()
            .captures_iter(trimmed)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = caps.get(2)?.as_str().parse::<f64>().ok()?;
                Some((key, value))
            })
            .collect();

        let x = *fields.get("x")?;
        let y = *fields.get("y")?;
        match (fields.get("rotate"), fields.get("scale")) {
            (Some(rotate), Some(scale)) => Some(Self::Transform(Transform::new(x, y, *rotate, *scale))),
            (None, None) => Some(Self::Position(Position::new(x, y))),
            _ => None,
        }
    }
}

/// Render a full slot: start token, literal, end token.
///
/// # Returns
/// `<start> <literal> <end>` using the pair's canonical tokens.
pub fn render(marker: &MarkerPair, value: &SlotValue) -> String {
    format!(
        "{} {} {}",
        marker.start_token(),
        value.render_body(),
        marker.end_token()
    )
}

fn fits_integer_literal(value: f64) -> bool {
    let rounded = value.round();
    rounded.is_finite() && rounded.abs() < i64::MAX as f64
}

/// Round to the nearest integer, halves away from zero.
pub fn round_int(value: f64) -> i64 {
    // `as` saturates out-of-range floats; -0.0 becomes 0.
    value.round() as i64
}

/// Round to two decimals and print exactly two fractional digits.
pub fn format_scale(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.2}", rounded)
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(-?\d+(?:\.\d+)?)")
            .expect("static field pattern compiles")
    })
}
