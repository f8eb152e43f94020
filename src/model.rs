//! Data models for the load planner.
//!
//! This module defines the caller-owned input of one planning pass:
//! - `RawField`: a numeric form field as the user typed it (number or text)
//! - `ItemDescriptor`: one cargo item with raw dimensions, weight and flags
//! - `ParsedItem`: the same item after explicit optional-number parsing
//!
//! Parsing never fails. Empty, non-numeric, non-finite, zero or negative
//! values become `None`, which the aggregator treats as "absent" and the
//! layout planner treats as a zero extent.

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{CENTIMETERS_PER_METER, Vec3};

/// A raw numeric field as supplied by the form: either a JSON number or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
}

impl RawField {
    /// Parses the field, see [`parse_optional_positive_number`].
    pub fn parse(&self) -> Option<f64> {
        match self {
            RawField::Number(value) => accept_positive(*value),
            RawField::Text(raw) => parse_optional_positive_number(raw),
        }
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawField::Number(value) => write!(f, "{}", value),
            RawField::Text(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<f64> for RawField {
    fn from(value: f64) -> Self {
        RawField::Number(value)
    }
}

impl From<&str> for RawField {
    fn from(raw: &str) -> Self {
        RawField::Text(raw.to_owned())
    }
}

/// Parses a raw text field into a strictly positive, finite number.
///
/// # Parameters
/// * `raw` - The text exactly as entered (surrounding whitespace is ignored)
///
/// # Returns
/// `Some(value)` for a positive finite number, `None` for anything else
///
/// # Examples
/// ```
/// use sea_freight_planner::model::parse_optional_positive_number;
///
/// assert_eq!(parse_optional_positive_number(" 40 "), Some(40.0));
/// assert_eq!(parse_optional_positive_number(""), None);
/// assert_eq!(parse_optional_positive_number("abc"), None);
/// ```
pub fn parse_optional_positive_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(accept_positive)
}

fn accept_positive(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// One cargo item as described by the user.
///
/// # Fields
/// * `length`, `width`, `height` - Dimensions in centimeters (may be absent)
/// * `weight` - Weight in kg (may be absent)
/// * `fragile` - Item must not bear load; terminates its column in the layout
/// * `heavy` - Display hint only
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "length": 40, "width": 30, "height": 20, "weight": 5, "fragile": false, "heavy": false
}))]
pub struct ItemDescriptor {
    #[serde(default)]
    pub length: Option<RawField>,
    #[serde(default)]
    pub width: Option<RawField>,
    #[serde(default)]
    pub height: Option<RawField>,
    #[serde(default)]
    pub weight: Option<RawField>,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub heavy: bool,
}

impl ItemDescriptor {
    /// Creates a fully specified item from numeric values.
    pub fn new(length: f64, width: f64, height: f64, weight: f64) -> Self {
        Self {
            length: Some(length.into()),
            width: Some(width.into()),
            height: Some(height.into()),
            weight: Some(weight.into()),
            fragile: false,
            heavy: false,
        }
    }

    /// Marks the item as fragile (builder style).
    pub fn fragile(mut self) -> Self {
        self.fragile = true;
        self
    }

    /// Marks the item as heavy (builder style).
    pub fn heavy(mut self) -> Self {
        self.heavy = true;
        self
    }

    /// Applies explicit optional-number parsing to every numeric field.
    pub fn parse(&self) -> ParsedItem {
        ParsedItem {
            length_cm: parse_field(&self.length),
            width_cm: parse_field(&self.width),
            height_cm: parse_field(&self.height),
            weight_kg: parse_field(&self.weight),
            fragile: self.fragile,
            heavy: self.heavy,
        }
    }
}

fn parse_field(field: &Option<RawField>) -> Option<f64> {
    field.as_ref().and_then(RawField::parse)
}

/// Renders an optional raw field the way the user entered it.
pub fn raw_text(field: &Option<RawField>) -> String {
    field.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// An item after parsing; `None` marks an absent value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParsedItem {
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fragile: bool,
    pub heavy: bool,
}

impl ParsedItem {
    /// Returns `true` if length, width and height are all present.
    pub fn has_all_dimensions(&self) -> bool {
        self.length_cm.is_some() && self.width_cm.is_some() && self.height_cm.is_some()
    }

    /// Volume in cubic meters, or `None` unless all three dimensions are present.
    pub fn volume_cbm(&self) -> Option<f64> {
        match (self.length_cm, self.width_cm, self.height_cm) {
            (Some(l), Some(w), Some(h)) => Some(
                (l / CENTIMETERS_PER_METER)
                    * (w / CENTIMETERS_PER_METER)
                    * (h / CENTIMETERS_PER_METER),
            ),
            _ => None,
        }
    }

    /// Weight contribution in kg; absent weight contributes zero.
    pub fn weight_or_zero(&self) -> f64 {
        self.weight_kg.unwrap_or(0.0)
    }

    /// Scene-frame extent in meters as (length, height, width).
    ///
    /// Height maps to the vertical axis; absent dimensions become zero.
    pub fn scene_size(&self) -> Vec3 {
        let to_meters = |cm: Option<f64>| cm.unwrap_or(0.0) / CENTIMETERS_PER_METER;
        Vec3::new(
            to_meters(self.length_cm),
            to_meters(self.height_cm),
            to_meters(self.width_cm),
        )
    }
}
