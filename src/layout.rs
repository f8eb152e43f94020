//! Stacking layout planner for the 3D load visualization.
//!
//! Turns an ordered item list into one placed box per item using a single
//! left-to-right pass:
//! - the first item rests on the ground at the origin column
//! - a non-fragile predecessor means the item is stacked on top of it,
//!   separated by `spacing`
//! - a fragile predecessor closes the column; the item starts a new column
//!   on the ground, leaving `spacing` between the longest box of the closed
//!   column and the new box
//!
//! The pass is a fold over an explicit accumulator (`StackState`), so partial
//! sequences can be placed and the accumulator inspected in between.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{ItemDescriptor, ParsedItem};
use crate::types::{Dimensional, Positioned, Vec3};

/// Configuration for the layout planner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Gap in meters between stacked boxes and between columns
    pub spacing: f64,
}

impl LayoutConfig {
    pub const DEFAULT_SPACING: f64 = 0.05;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: Self::DEFAULT_SPACING,
        }
    }
}

/// Builder for `LayoutConfig`.
#[derive(Clone, Debug, Default)]
pub struct LayoutConfigBuilder {
    config: LayoutConfig,
}

impl LayoutConfigBuilder {
    /// Sets the spacing in meters.
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.config.spacing = spacing;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> LayoutConfig {
        self.config
    }
}

/// Display color of a placed item, chosen by precedence fragile > heavy > normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemColor {
    Fragile,
    Heavy,
    Normal,
}

impl ItemColor {
    /// Picks the color for an item's flags.
    pub fn for_flags(fragile: bool, heavy: bool) -> Self {
        if fragile {
            ItemColor::Fragile
        } else if heavy {
            ItemColor::Heavy
        } else {
            ItemColor::Normal
        }
    }

    /// CSS color name used by renderers.
    pub fn css(&self) -> &'static str {
        match self {
            ItemColor::Fragile => "red",
            ItemColor::Heavy => "brown",
            ItemColor::Normal => "skyblue",
        }
    }
}

/// Computed placement of one input item.
///
/// # Fields
/// * `index` - Position of the item in the input list
/// * `column` - Zero-based column the item was stacked into
/// * `position` - Center of the bounding box in meters
/// * `size` - Extent as (length, height, width) in meters
/// * `color` - Display color
/// * `degenerate` - At least one dimension was absent and placed as zero
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacedItem {
    pub index: usize,
    pub column: usize,
    pub position: Vec3,
    pub size: Vec3,
    pub color: ItemColor,
    pub degenerate: bool,
}

impl Positioned for PlacedItem {
    fn center(&self) -> Vec3 {
        self.position
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.size
    }
}

/// Accumulator threaded through the stacking pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StackState {
    /// Horizontal offset of the current column
    pub current_x: f64,
    /// Depth offset; no depth-axis placement happens, so this stays 0
    pub current_z: f64,
    /// Vertical center of the most recently placed item
    pub stack_y: f64,
    /// Height of the most recently placed item
    pub previous_height: f64,
    /// Largest length of any item in the current column
    pub column_length: f64,
    pub previous_was_fragile: bool,
    /// Index of the current column
    pub column: usize,
    /// Number of items placed so far
    pub placed: usize,
}

impl StackState {
    /// Creates the initial state of a pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the next item will open a new column.
    pub fn next_starts_column(&self) -> bool {
        self.placed > 0 && self.previous_was_fragile
    }

    /// Places one item and advances the accumulator.
    ///
    /// # Parameters
    /// * `item` - The parsed item to place next
    /// * `config` - Planner configuration (spacing)
    ///
    /// # Returns
    /// The `PlacedItem` for this step
    pub fn place(&mut self, item: &ParsedItem, config: &LayoutConfig) -> PlacedItem {
        let size = item.scene_size();
        let (length, height) = (size.x, size.y);

        if self.placed == 0 {
            self.stack_y = height / 2.0;
        } else if self.previous_was_fragile {
            self.current_x += self.column_length / 2.0 + config.spacing + length / 2.0;
            self.stack_y = height / 2.0;
            self.column += 1;
            self.column_length = 0.0;
        } else {
            self.stack_y += self.previous_height / 2.0 + config.spacing + height / 2.0;
        }

        let placed = PlacedItem {
            index: self.placed,
            column: self.column,
            position: Vec3::new(self.current_x, self.stack_y, self.current_z),
            size,
            color: ItemColor::for_flags(item.fragile, item.heavy),
            degenerate: !item.has_all_dimensions(),
        };

        self.previous_height = height;
        self.column_length = self.column_length.max(length);
        self.previous_was_fragile = item.fragile;
        self.placed += 1;

        placed
    }
}

/// Result of a full stacking pass.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    /// One entry per input item, index-aligned with the input
    pub placed: Vec<PlacedItem>,
    /// Accumulator after the last item
    pub final_state: StackState,
}

impl LayoutPlan {
    /// Number of columns used (0 for an empty plan).
    pub fn column_count(&self) -> usize {
        if self.placed.is_empty() {
            0
        } else {
            self.final_state.column + 1
        }
    }

    /// Number of items placed with a zero extent.
    pub fn degenerate_count(&self) -> usize {
        self.placed.iter().filter(|p| p.degenerate).count()
    }
}

/// Events emitted during the pass for live visualization.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum LayoutEvent {
    /// A new column is opened (including the first one).
    ColumnStarted { column: usize, x: f64 },
    /// An item was placed.
    ItemPlaced { item: PlacedItem },
    /// The pass is complete.
    Finished { items: usize, columns: usize },
}

/// Plans the layout with the default configuration.
pub fn plan_default(items: &[ItemDescriptor]) -> LayoutPlan {
    plan_layout(items, &LayoutConfig::default())
}

/// Plans the layout for an ordered item list.
///
/// # Parameters
/// * `items` - Items in input order (the order determines stacking)
/// * `config` - Planner configuration
///
/// # Returns
/// `LayoutPlan` with one placed item per input item
pub fn plan_layout(items: &[ItemDescriptor], config: &LayoutConfig) -> LayoutPlan {
    plan_layout_with_progress(items, config, |_| {})
}

/// Plans the layout and reports every step through a callback.
///
/// Suitable for SSE streaming; the placed items equal those of `plan_layout`.
pub fn plan_layout_with_progress(
    items: &[ItemDescriptor],
    config: &LayoutConfig,
    mut on_event: impl FnMut(&LayoutEvent),
) -> LayoutPlan {
    let (placed, final_state) = items.iter().map(ItemDescriptor::parse).fold(
        (Vec::with_capacity(items.len()), StackState::new()),
        |(mut placed, mut state), item| {
            let opens_column = state.placed == 0 || state.next_starts_column();
            let step = state.place(&item, config);
            if opens_column {
                on_event(&LayoutEvent::ColumnStarted {
                    column: step.column,
                    x: step.position.x,
                });
            }
            on_event(&LayoutEvent::ItemPlaced { item: step });
            placed.push(step);
            (placed, state)
        },
    );

    let plan = LayoutPlan {
        placed,
        final_state,
    };
    on_event(&LayoutEvent::Finished {
        items: plan.placed.len(),
        columns: plan.column_count(),
    });
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::find_overlaps;
    use crate::types::EPSILON_GENERAL;

    fn cube(side_cm: f64) -> ItemDescriptor {
        ItemDescriptor::new(side_cm, side_cm, side_cm, 10.0)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON_GENERAL,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_item_rests_on_ground() {
        let plan = plan_default(&[ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)]);
        let placed = plan.placed[0];

        assert_eq!(placed.position, Vec3::new(0.0, 0.1, 0.0));
        assert_eq!(placed.size, Vec3::new(0.4, 0.2, 0.3));
        assert_eq!(placed.color, ItemColor::Normal);
        assert!(!placed.degenerate);
        assert_eq!(plan.column_count(), 1);
    }

    #[test]
    fn fragile_item_closes_its_column() {
        let plan = plan_default(&[cube(50.0).fragile(), cube(50.0)]);
        let second = plan.placed[1];

        assert_close(second.position.x, 0.55);
        assert_close(second.position.y, 0.25);
        assert_eq!(second.column, 1);
        assert_eq!(plan.placed[0].color, ItemColor::Fragile);
    }

    #[test]
    fn non_fragile_items_stack_with_spacing() {
        let plan = plan_default(&[cube(100.0), cube(100.0), cube(100.0)]);
        let ys: Vec<f64> = plan.placed.iter().map(|p| p.position.y).collect();

        assert_close(ys[0], 0.5);
        assert_close(ys[1], 1.55);
        assert_close(ys[2], 2.6);
        assert!(plan.placed.iter().all(|p| p.position.x == 0.0 && p.column == 0));
    }

    #[test]
    fn gap_between_stacked_boxes_of_different_heights_is_spacing() {
        let plan = plan_default(&[
            ItemDescriptor::new(50.0, 50.0, 200.0, 1.0),
            ItemDescriptor::new(50.0, 50.0, 20.0, 1.0),
        ]);
        let lower = plan.placed[0];
        let upper = plan.placed[1];
        let gap =
            (upper.position.y - upper.size.y / 2.0) - (lower.position.y + lower.size.y / 2.0);
        assert_close(gap, LayoutConfig::DEFAULT_SPACING);
    }

    #[test]
    fn new_column_leaves_spacing_between_box_faces() {
        let plan = plan_default(&[
            ItemDescriptor::new(120.0, 80.0, 60.0, 1.0).fragile(),
            ItemDescriptor::new(40.0, 40.0, 40.0, 1.0),
        ]);
        assert_close(plan.placed[1].position.x, 0.6 + 0.05 + 0.2);
        assert_close(plan.placed[1].position.y, 0.2);
    }

    #[test]
    fn longer_item_after_short_fragile_does_not_overlap() {
        let plan = plan_default(&[
            ItemDescriptor::new(10.0, 50.0, 50.0, 1.0).fragile(),
            ItemDescriptor::new(100.0, 50.0, 50.0, 1.0),
        ]);
        assert_close(plan.placed[1].position.x, 0.05 + 0.05 + 0.5);
        assert!(find_overlaps(&plan.placed).is_empty());
    }

    #[test]
    fn new_column_clears_longest_box_of_closed_column() {
        let plan = plan_default(&[
            ItemDescriptor::new(200.0, 50.0, 50.0, 1.0),
            ItemDescriptor::new(10.0, 50.0, 10.0, 1.0).fragile(),
            ItemDescriptor::new(50.0, 50.0, 50.0, 1.0),
        ]);
        assert_close(plan.placed[2].position.x, 1.0 + 0.05 + 0.25);
        assert_eq!(plan.placed[2].column, 1);
        assert!(find_overlaps(&plan.placed).is_empty());
    }

    #[test]
    fn fragile_item_may_sit_on_top_of_a_stack() {
        let plan = plan_default(&[cube(100.0), cube(100.0).fragile(), cube(100.0)]);
        assert_eq!(plan.placed[1].column, 0);
        assert_close(plan.placed[1].position.y, 1.55);
        assert_eq!(plan.placed[2].column, 1);
        assert_close(plan.placed[2].position.y, 0.5);
    }

    #[test]
    fn color_precedence_is_fragile_heavy_normal() {
        assert_eq!(ItemColor::for_flags(true, true), ItemColor::Fragile);
        assert_eq!(ItemColor::for_flags(false, true), ItemColor::Heavy);
        assert_eq!(ItemColor::for_flags(false, false), ItemColor::Normal);
        assert_eq!(ItemColor::Heavy.css(), "brown");
    }

    #[test]
    fn planning_is_deterministic() {
        let items = vec![
            ItemDescriptor::new(33.3, 12.7, 45.1, 3.0).heavy(),
            ItemDescriptor::new(21.9, 88.0, 17.3, 1.0).fragile(),
            ItemDescriptor::new(61.0, 14.2, 9.9, 2.0),
            ItemDescriptor::default(),
        ];
        let first = plan_default(&items);
        let second = plan_default(&items);

        for (a, b) in first.placed.iter().zip(&second.placed) {
            assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
            assert_eq!(a.position.y.to_bits(), b.position.y.to_bits());
            assert_eq!(a.position.z.to_bits(), b.position.z.to_bits());
        }
    }

    #[test]
    fn missing_dimensions_produce_degenerate_box() {
        let plan = plan_default(&[cube(100.0), ItemDescriptor::default()]);
        let flat = plan.placed[1];

        assert!(flat.degenerate);
        assert_eq!(flat.size, Vec3::zero());
        assert_close(flat.position.y, 1.05);
        assert_eq!(plan.degenerate_count(), 1);
    }

    #[test]
    fn accumulator_can_be_fed_incrementally() {
        let config = LayoutConfig::default();
        let mut state = StackState::new();

        state.place(&cube(100.0).parse(), &config);
        assert_close(state.stack_y, 0.5);
        assert!(!state.next_starts_column());

        state.place(&cube(100.0).fragile().parse(), &config);
        assert_close(state.stack_y, 1.55);
        assert!(state.next_starts_column());

        let placed = state.place(&cube(50.0).parse(), &config);
        assert_close(placed.position.x, 0.5 + 0.05 + 0.25);
        assert_close(state.column_length, 0.5);
        assert_eq!(state.column, 1);
        assert_eq!(state.placed, 3);
    }

    #[test]
    fn custom_spacing_is_respected() {
        let config = LayoutConfig::builder().spacing(0.0).build();
        let plan = plan_layout(&[cube(100.0), cube(100.0)], &config);
        assert_close(plan.placed[1].position.y, 1.5);
    }

    #[test]
    fn progress_events_mirror_the_plan() {
        let items = vec![cube(50.0).fragile(), cube(50.0), cube(50.0)];
        let mut events = Vec::new();
        let plan = plan_layout_with_progress(&items, &LayoutConfig::default(), |evt| {
            events.push(evt.clone())
        });

        let placed_from_events: Vec<PlacedItem> = events
            .iter()
            .filter_map(|evt| match evt {
                LayoutEvent::ItemPlaced { item } => Some(*item),
                _ => None,
            })
            .collect();
        assert_eq!(placed_from_events, plan.placed);

        let columns: Vec<(usize, f64)> = events
            .iter()
            .filter_map(|evt| match evt {
                LayoutEvent::ColumnStarted { column, x } => Some((*column, *x)),
                _ => None,
            })
            .collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], (0, 0.0));
        assert_eq!(columns[1].0, 1);
        assert_eq!(columns[1].1, plan.placed[1].position.x);

        assert!(matches!(
            events.last(),
            Some(LayoutEvent::Finished { items: 3, columns: 2 })
        ));
    }

    #[test]
    fn empty_input_yields_empty_plan() {
        let mut events = Vec::new();
        let plan = plan_layout_with_progress(&[], &LayoutConfig::default(), |evt| {
            events.push(evt.clone())
        });
        assert!(plan.placed.is_empty());
        assert_eq!(plan.column_count(), 0);
        assert_eq!(events.len(), 1);
    }
}
