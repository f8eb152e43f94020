//! Paginated load report export.
//!
//! A report lists every item as entered, the aggregate metrics, and, when a
//! scene snapshot is available, a final visualization page. The document can
//! be rendered to plain text or packaged as a zip archive together with the
//! snapshot file.

use std::io::{Cursor, Seek, Write};

use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::PlacedItem;
use crate::metrics::AggregateResult;
use crate::model::{ItemDescriptor, raw_text};
use crate::scene::{SceneCapture, SceneImage};

pub const REPORT_TITLE: &str = "Sea Freight Load Report";
pub const VISUALIZATION_TITLE: &str = "3D Load Visualization";
pub const REPORT_FILE_NAME: &str = "report.txt";

/// Errors while packaging a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not write report archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("could not write report entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for report layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum number of item entries per page (at least 1)
    pub items_per_page: usize,
}

impl ReportOptions {
    pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            items_per_page: Self::DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// One page of the report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPage {
    pub heading: Option<String>,
    pub lines: Vec<String>,
    pub image: Option<SceneImage>,
}

/// A complete, paginated report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    pub pages: Vec<ReportPage>,
}

impl ReportDocument {
    /// Builds the report.
    ///
    /// # Parameters
    /// * `items` - Raw items in input order
    /// * `metrics` - Aggregate result of the same items
    /// * `placed` - Layout of the same items, handed to `capture`
    /// * `capture` - Snapshot capability; `None` from it yields a text-only report
    /// * `options` - Pagination options
    pub fn build(
        items: &[ItemDescriptor],
        metrics: &AggregateResult,
        placed: &[PlacedItem],
        capture: &dyn SceneCapture,
        options: ReportOptions,
    ) -> Self {
        let per_page = options.items_per_page.max(1);
        let entries: Vec<[String; 2]> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| item_lines(idx, item))
            .collect();

        let mut pages: Vec<ReportPage> = entries
            .chunks(per_page)
            .map(|chunk| ReportPage {
                heading: None,
                lines: chunk.iter().flatten().cloned().collect(),
                image: None,
            })
            .collect();
        if pages.is_empty() {
            pages.push(ReportPage {
                heading: None,
                lines: Vec::new(),
                image: None,
            });
        }
        if let Some(first) = pages.first_mut() {
            first.heading = Some(REPORT_TITLE.to_string());
        }
        if let Some(last) = pages.last_mut() {
            last.lines.extend(summary_lines(metrics));
        }

        match capture.capture_scene_image(placed) {
            Some(image) => pages.push(ReportPage {
                heading: Some(VISUALIZATION_TITLE.to_string()),
                lines: Vec::new(),
                image: Some(image),
            }),
            None => warn!("🖼️ No scene snapshot available, exporting text-only report"),
        }

        Self { pages }
    }

    /// Returns the snapshot embedded in the report, if any.
    pub fn image(&self) -> Option<&SceneImage> {
        self.pages.iter().find_map(|page| page.image.as_ref())
    }

    /// Renders the report as plain text with page separators.
    pub fn render_text(&self) -> String {
        let total = self.pages.len();
        let mut out = String::new();
        for (idx, page) in self.pages.iter().enumerate() {
            if idx > 0 {
                out.push('\u{c}');
                out.push('\n');
            }
            if let Some(heading) = &page.heading {
                out.push_str(heading);
                out.push_str("\n\n");
            }
            for line in &page.lines {
                out.push_str(line);
                out.push('\n');
            }
            if let Some(image) = &page.image {
                out.push_str(&format!("[image: {}]\n", image.file_name));
            }
            out.push_str(&format!("\n-- Page {} of {} --\n", idx + 1, total));
        }
        out
    }

    /// Writes the report as a zip archive (`report.txt` plus the snapshot).
    pub fn write_archive<W: Write + Seek>(&self, writer: W) -> Result<W, ReportError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(REPORT_FILE_NAME, options)?;
        zip.write_all(self.render_text().as_bytes())?;

        if let Some(image) = self.image() {
            zip.start_file(image.file_name, options)?;
            zip.write_all(&image.data)?;
        }

        Ok(zip.finish()?)
    }

    /// Packages the archive into memory.
    pub fn to_archive_bytes(&self) -> Result<Vec<u8>, ReportError> {
        Ok(self.write_archive(Cursor::new(Vec::new()))?.into_inner())
    }
}

fn item_lines(idx: usize, item: &ItemDescriptor) -> [String; 2] {
    let weight = item.parse().weight_or_zero();
    [
        format!(
            "Item {}: {}cm x {}cm x {}cm, Weight: {}kg",
            idx + 1,
            raw_text(&item.length),
            raw_text(&item.width),
            raw_text(&item.height),
            weight
        ),
        format!(
            "   Fragile: {}, Heavy: {}",
            yes_no(item.fragile),
            yes_no(item.heavy)
        ),
    ]
}

fn summary_lines(metrics: &AggregateResult) -> Vec<String> {
    vec![
        String::new(),
        format!("Total CBM: {:.3} m³", metrics.total_volume_cbm),
        format!("Total Weight: {} kg", metrics.total_weight_kg),
        format!("Suggested Container: {}", metrics.recommended_container.label()),
    ]
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use crate::layout::plan_default;
    use crate::metrics::aggregate;
    use crate::scene::{NoSceneCapture, SvgSceneCapture};

    fn build(
        items: &[ItemDescriptor],
        capture: &dyn SceneCapture,
        per_page: usize,
    ) -> ReportDocument {
        let metrics = aggregate(items);
        let plan = plan_default(items);
        ReportDocument::build(
            items,
            &metrics,
            &plan.placed,
            capture,
            ReportOptions {
                items_per_page: per_page,
            },
        )
    }

    #[test]
    fn lists_items_and_summary() {
        let items = vec![ItemDescriptor::new(40.0, 30.0, 20.0, 5.0).fragile()];
        let report = build(&items, &NoSceneCapture, 20);
        let text = report.render_text();

        assert_eq!(report.pages.len(), 1);
        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Item 1: 40cm x 30cm x 20cm, Weight: 5kg"));
        assert!(text.contains("   Fragile: Yes, Heavy: No"));
        assert!(text.contains("Total CBM: 0.024 m³"));
        assert!(text.contains("Total Weight: 5 kg"));
        assert!(text.contains("Suggested Container: 20ft Container"));
        assert!(report.image().is_none());
    }

    #[test]
    fn keeps_raw_text_of_unparsable_fields() {
        let items = vec![ItemDescriptor {
            length: Some("12,5".into()),
            weight: Some("n/a".into()),
            ..Default::default()
        }];
        let text = build(&items, &NoSceneCapture, 20).render_text();
        assert!(text.contains("Item 1: 12,5cm x cm x cm, Weight: 0kg"));
    }

    #[test]
    fn paginates_items() {
        let items = vec![ItemDescriptor::new(10.0, 10.0, 10.0, 1.0); 5];
        let report = build(&items, &NoSceneCapture, 2);

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.pages[0].heading.as_deref(), Some(REPORT_TITLE));
        assert_eq!(report.pages[0].lines.len(), 4);
        assert!(report.pages[2].lines.iter().any(|l| l.starts_with("Total CBM")));
        assert!(report.render_text().contains("-- Page 3 of 3 --"));
    }

    #[test]
    fn appends_visualization_page_when_snapshot_exists() {
        let items = vec![ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)];
        let report = build(&items, &SvgSceneCapture::default(), 20);

        assert_eq!(report.pages.len(), 2);
        let last = report.pages.last().expect("visualization page");
        assert_eq!(last.heading.as_deref(), Some(VISUALIZATION_TITLE));
        assert!(last.image.is_some());
    }

    #[test]
    fn empty_item_list_still_has_summary_page() {
        let report = build(&[], &SvgSceneCapture::default(), 20);
        assert_eq!(report.pages.len(), 1);
        assert!(report.render_text().contains("Total CBM: 0.000 m³"));
    }

    #[test]
    fn archive_contains_snapshot_only_when_available() {
        let items = vec![ItemDescriptor::new(40.0, 30.0, 20.0, 5.0)];

        let with_image = build(&items, &SvgSceneCapture::default(), 20)
            .to_archive_bytes()
            .expect("archive");
        let mut archive = zip::ZipArchive::new(Cursor::new(with_image)).expect("readable zip");
        assert_eq!(archive.len(), 2);
        let mut text = String::new();
        archive
            .by_name(REPORT_FILE_NAME)
            .expect("report entry")
            .read_to_string(&mut text)
            .expect("utf-8 report");
        assert!(text.contains("Suggested Container"));
        assert!(archive.by_name("layout.svg").is_ok());

        let text_only = build(&items, &NoSceneCapture, 20)
            .to_archive_bytes()
            .expect("archive");
        let archive = zip::ZipArchive::new(Cursor::new(text_only)).expect("readable zip");
        assert_eq!(archive.len(), 1);
    }
}
