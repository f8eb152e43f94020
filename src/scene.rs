//! Scene snapshots for export.
//!
//! Rendering the interactive 3D scene is host specific, so exporters only
//! depend on the `SceneCapture` capability. The built-in implementation draws
//! a front elevation (x to the right, y up) of the placed boxes as SVG.

use svg::Document;
use svg::node::element::{Group, Line, Rectangle, Title};

use crate::layout::PlacedItem;
use crate::types::BoundingBox;

/// A captured image of the layout.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneImage {
    /// MIME type of `data`
    pub media_type: &'static str,
    /// Suggested file name inside exports
    pub file_name: &'static str,
    pub data: Vec<u8>,
}

/// Capability to capture an image of a computed layout.
///
/// Returns `None` when there is nothing renderable; callers must fall back
/// to text-only output.
pub trait SceneCapture {
    fn capture_scene_image(&self, placed: &[PlacedItem]) -> Option<SceneImage>;
}

/// Capture that never produces an image.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSceneCapture;

impl SceneCapture for NoSceneCapture {
    fn capture_scene_image(&self, _placed: &[PlacedItem]) -> Option<SceneImage> {
        None
    }
}

/// Front-elevation SVG renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvgSceneCapture {
    /// Pixels per scene meter
    pub px_per_meter: f64,
    /// Margin around the drawing in pixels
    pub margin_px: f64,
}

impl SvgSceneCapture {
    pub const DEFAULT_PX_PER_METER: f64 = 100.0;
    pub const DEFAULT_MARGIN_PX: f64 = 20.0;

    pub fn new(px_per_meter: f64) -> Self {
        Self {
            px_per_meter,
            margin_px: Self::DEFAULT_MARGIN_PX,
        }
    }

    /// Builds the SVG document, or `None` if every box is degenerate.
    pub fn render(&self, placed: &[PlacedItem]) -> Option<Document> {
        let boxes: Vec<(&PlacedItem, BoundingBox)> = placed
            .iter()
            .filter(|p| !p.size.is_degenerate())
            .map(|p| (p, BoundingBox::of(p)))
            .collect();
        if boxes.is_empty() {
            return None;
        }

        let min_x = boxes.iter().map(|(_, b)| b.min.x).fold(f64::INFINITY, f64::min);
        let max_x = boxes.iter().map(|(_, b)| b.max.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = boxes.iter().map(|(_, b)| b.max.y).fold(0.0, f64::max);

        let scale = self.px_per_meter;
        let width = (max_x - min_x) * scale + 2.0 * self.margin_px;
        let height = max_y * scale + 2.0 * self.margin_px;
        let ground_px = height - self.margin_px;
        let stroke_width = (scale * 0.005).max(0.5);

        // svg y grows downwards, so flip around the ground line
        let to_px_x = |x: f64| (x - min_x) * scale + self.margin_px;
        let to_px_y = |y: f64| ground_px - y * scale;

        let mut items_group = Group::new().set("id", "items");
        for (item, bbox) in &boxes {
            let rect = Rectangle::new()
                .set("x", to_px_x(bbox.min.x))
                .set("y", to_px_y(bbox.max.y))
                .set("width", bbox.dimensions().x * scale)
                .set("height", bbox.dimensions().y * scale)
                .set("fill", item.color.css())
                .set("stroke", "black")
                .set("stroke-width", stroke_width)
                .add(Title::new(format!(
                    "item {}, column {}, center: [{:.3}, {:.3}, {:.3}]",
                    item.index + 1,
                    item.column,
                    item.position.x,
                    item.position.y,
                    item.position.z
                )));
            items_group = items_group.add(rect);
        }

        let ground = Line::new()
            .set("x1", 0.0)
            .set("y1", ground_px)
            .set("x2", width)
            .set("y2", ground_px)
            .set("stroke", "gray")
            .set("stroke-width", stroke_width);

        let document = Document::new()
            .set("viewBox", (0.0, 0.0, width, height))
            .set("width", width)
            .set("height", height)
            .add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", "white"),
            )
            .add(ground)
            .add(items_group);

        Some(document)
    }
}

impl Default for SvgSceneCapture {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PX_PER_METER)
    }
}

impl SceneCapture for SvgSceneCapture {
    fn capture_scene_image(&self, placed: &[PlacedItem]) -> Option<SceneImage> {
        let document = self.render(placed)?;
        Some(SceneImage {
            media_type: "image/svg+xml",
            file_name: "layout.svg",
            data: document.to_string().into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::plan_default;
    use crate::model::ItemDescriptor;

    #[test]
    fn renders_one_rectangle_per_solid_item() {
        let plan = plan_default(&[
            ItemDescriptor::new(40.0, 30.0, 20.0, 5.0).fragile(),
            ItemDescriptor::new(40.0, 30.0, 20.0, 5.0).heavy(),
            ItemDescriptor::default(),
        ]);
        let image = SvgSceneCapture::default()
            .capture_scene_image(&plan.placed)
            .expect("solid items are renderable");
        let svg = String::from_utf8(image.data).expect("svg is utf-8");

        assert_eq!(image.media_type, "image/svg+xml");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("fill=\"red\""));
        assert!(svg.contains("fill=\"brown\""));
        assert_eq!(svg.matches("<title>").count(), 2);
    }

    #[test]
    fn nothing_renderable_yields_none() {
        let plan = plan_default(&[ItemDescriptor::default()]);
        assert!(SvgSceneCapture::default().capture_scene_image(&plan.placed).is_none());
        assert!(SvgSceneCapture::default().capture_scene_image(&[]).is_none());
    }

    #[test]
    fn no_scene_capture_never_renders() {
        let plan = plan_default(&[ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)]);
        assert!(NoSceneCapture.capture_scene_image(&plan.placed).is_none());
    }
}
