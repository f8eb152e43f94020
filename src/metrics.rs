//! Aggregate shipping metrics and container recommendation.
//!
//! Totals are recomputed from scratch on every call; there is no incremental
//! state. The container class is a step function of the reported (rounded)
//! volume only.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::ItemDescriptor;

/// Upper bound (inclusive) of the 20ft bucket in cubic meters.
pub const TWENTY_FOOT_MAX_CBM: f64 = 28.0;
/// Upper bound (inclusive) of the 40ft bucket in cubic meters.
pub const FORTY_FOOT_MAX_CBM: f64 = 58.0;

/// Recommended sea-freight container class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ContainerClass {
    #[serde(rename = "20ft")]
    TwentyFoot,
    #[serde(rename = "40ft")]
    FortyFoot,
    #[serde(rename = "multiple-or-40HC")]
    MultipleOrHighCube,
}

impl ContainerClass {
    /// Maps a total volume to a container class.
    ///
    /// Boundaries belong to the lower bucket: 28.0 is still "20ft" and 58.0
    /// is still "40ft".
    pub fn for_volume(total_cbm: f64) -> Self {
        if total_cbm <= TWENTY_FOOT_MAX_CBM {
            ContainerClass::TwentyFoot
        } else if total_cbm <= FORTY_FOOT_MAX_CBM {
            ContainerClass::FortyFoot
        } else {
            ContainerClass::MultipleOrHighCube
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ContainerClass::TwentyFoot => "20ft",
            ContainerClass::FortyFoot => "40ft",
            ContainerClass::MultipleOrHighCube => "multiple-or-40HC",
        }
    }

    /// Human-readable recommendation shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            ContainerClass::TwentyFoot => "20ft Container",
            ContainerClass::FortyFoot => "40ft Container",
            ContainerClass::MultipleOrHighCube => "Requires multiple containers or 40HC",
        }
    }
}

impl fmt::Display for ContainerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Aggregate result of one planning pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregateResult {
    /// Total volume in cubic meters, rounded to 3 decimals
    pub total_volume_cbm: f64,
    /// Sum of all present weights in kg
    pub total_weight_kg: f64,
    pub recommended_container: ContainerClass,
    /// Number of items in the input
    pub item_count: usize,
    /// Number of items that contributed to the volume
    pub measured_item_count: usize,
}

/// Computes totals and the container recommendation for an item list.
///
/// # Parameters
/// * `items` - The items in input order (order does not affect the result)
///
/// # Returns
/// The `AggregateResult`; malformed values contribute zero instead of failing
///
/// # Examples
/// ```
/// use sea_freight_planner::metrics::{aggregate, ContainerClass};
/// use sea_freight_planner::model::ItemDescriptor;
///
/// let result = aggregate(&[ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)]);
/// assert_eq!(result.total_volume_cbm, 0.024);
/// assert_eq!(result.recommended_container, ContainerClass::TwentyFoot);
/// ```
pub fn aggregate(items: &[ItemDescriptor]) -> AggregateResult {
    let mut raw_volume = 0.0;
    let mut total_weight = 0.0;
    let mut measured = 0;

    for parsed in items.iter().map(ItemDescriptor::parse) {
        if let Some(volume) = parsed.volume_cbm() {
            raw_volume += volume;
            measured += 1;
        }
        total_weight += parsed.weight_or_zero();
    }

    let total_volume_cbm = round_to_millis(raw_volume);
    AggregateResult {
        total_volume_cbm,
        total_weight_kg: total_weight,
        recommended_container: ContainerClass::for_volume(total_volume_cbm),
        item_count: items.len(),
        measured_item_count: measured,
    }
}

/// Rounds to 3 decimal places, half away from zero.
pub fn round_to_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawField;
    use test_case::test_case;

    #[test_case(0.0, ContainerClass::TwentyFoot; "empty")]
    #[test_case(28.0, ContainerClass::TwentyFoot; "twenty foot boundary")]
    #[test_case(28.001, ContainerClass::FortyFoot; "just above twenty foot")]
    #[test_case(58.0, ContainerClass::FortyFoot; "forty foot boundary")]
    #[test_case(58.001, ContainerClass::MultipleOrHighCube; "just above forty foot")]
    #[test_case(120.0, ContainerClass::MultipleOrHighCube; "far above")]
    fn container_thresholds(volume: f64, expected: ContainerClass) {
        assert_eq!(ContainerClass::for_volume(volume), expected);
    }

    #[test]
    fn container_class_is_monotonic() {
        let mut previous = ContainerClass::for_volume(0.0);
        for step in 0..=1000 {
            let class = ContainerClass::for_volume(step as f64 * 0.1);
            assert!(class >= previous, "class decreased at volume {}", step as f64 * 0.1);
            previous = class;
        }
    }

    #[test]
    fn single_item_metrics() {
        let result = aggregate(&[ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)]);
        assert_eq!(result.total_volume_cbm, 0.024);
        assert_eq!(result.total_weight_kg, 5.0);
        assert_eq!(result.recommended_container, ContainerClass::TwentyFoot);
        assert_eq!(result.item_count, 1);
        assert_eq!(result.measured_item_count, 1);
    }

    #[test]
    fn items_without_dimensions_have_zero_volume() {
        let items = vec![ItemDescriptor::default(), ItemDescriptor::default()];
        let result = aggregate(&items);
        assert_eq!(result.total_volume_cbm, 0.0);
        assert_eq!(result.total_weight_kg, 0.0);
        assert_eq!(result.recommended_container, ContainerClass::TwentyFoot);
        assert_eq!(result.measured_item_count, 0);
    }

    #[test]
    fn partial_dimensions_skip_volume_but_keep_weight() {
        let items = vec![
            ItemDescriptor::new(100.0, 100.0, 100.0, 10.0),
            ItemDescriptor {
                length: Some(RawField::Number(200.0)),
                width: Some(RawField::Text(String::new())),
                height: Some(RawField::Number(200.0)),
                weight: Some(RawField::Text("4.5".to_string())),
                ..Default::default()
            },
        ];
        let result = aggregate(&items);
        assert_eq!(result.total_volume_cbm, 1.0);
        assert_eq!(result.total_weight_kg, 14.5);
        assert_eq!(result.measured_item_count, 1);
    }

    #[test]
    fn unparsable_weight_contributes_zero() {
        let mut item = ItemDescriptor::new(10.0, 10.0, 10.0, 1.0);
        item.weight = Some(RawField::Text("heavy-ish".to_string()));
        let result = aggregate(&[item, ItemDescriptor::new(10.0, 10.0, 10.0, 2.0)]);
        assert_eq!(result.total_weight_kg, 2.0);
    }

    #[test]
    fn volume_of_exactly_fifty_eight_stays_in_forty_foot() {
        let result = aggregate(&[ItemDescriptor::new(1000.0, 580.0, 100.0, 0.0)]);
        assert_eq!(result.total_volume_cbm, 58.0);
        assert_eq!(result.recommended_container, ContainerClass::FortyFoot);
    }

    #[test]
    fn volume_is_rounded_to_three_decimals() {
        let items = vec![ItemDescriptor::new(11.0, 11.0, 11.0, 1.0); 3];
        let result = aggregate(&items);
        // 3 * 0.001331 = 0.003993
        assert_eq!(result.total_volume_cbm, 0.004);
    }

    #[test]
    fn serializes_container_codes() {
        let json = serde_json::to_string(&ContainerClass::MultipleOrHighCube).expect("serializes");
        assert_eq!(json, "\"multiple-or-40HC\"");
        assert_eq!(ContainerClass::TwentyFoot.code(), "20ft");
        assert_eq!(ContainerClass::FortyFoot.to_string(), "40ft Container");
    }
}
