//! Two-pass report rendering.
//!
//! Pass 1 lays out the cover and every section without a table of contents and records the
//! composition-time page of each section.  The [`TocPlan`] built from those pages decides how
//! many contents pages to insert after the cover.  Pass 2 lays out cover, contents and
//! sections again, stamps `Page N of M` footers from the first content page on, and checks that
//! every section landed on the page its contents entry promises.

use std::fs;
use std::path::Path;

use genpdf::elements::{PageBreak, Paragraph};
use genpdf::{Alignment, Element, Margins};
use log::{debug, info};

use crate::builder::{DocumentBuilder, PageTracker};
use crate::compose::{AnchorLog, DocumentSource, SectionAnchor, SectionSpec};
use crate::config::LayoutSettings;
use crate::error::{ReportError, ReportResult};
use crate::layout::Theme;
use crate::toc::{ResolvedTocEntry, TocEntry, TocPlan, TOC_INSERT_POSITION};

/// Finished PDF together with its page bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReport {
    /// Serialized PDF.
    pub bytes: Vec<u8>,
    /// Number of pages in the document.
    pub page_count: usize,
    /// Contents entries with their final page numbers.
    pub toc: Vec<ResolvedTocEntry>,
}

impl RenderedReport {
    /// Size of the serialized document in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Writes the PDF to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> ReportResult<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }

    /// Embeds a PDF outline pointing at every contents entry.
    #[cfg(feature = "bookmarks")]
    pub fn with_bookmarks(mut self) -> ReportResult<Self> {
        self.bytes = crate::bookmarks::apply_toc_bookmarks(&self.bytes, &self.toc)?;
        Ok(self)
    }
}

struct PassOutput {
    bytes: Vec<u8>,
    page_count: usize,
    anchors: Vec<Option<usize>>,
}

/// Footer label for `page`, e.g. `Page 3 of 12`.
pub fn page_label(page: usize, total: Option<usize>) -> String {
    match total {
        Some(total) => format!("Page {page} of {total}"),
        None => format!("Page {page}"),
    }
}

/// Lays out a [`DocumentSource`] into a PDF.
#[derive(Clone, Debug, Default)]
pub struct ReportRenderer {
    layout: LayoutSettings,
    theme: Theme,
}

impl ReportRenderer {
    /// Creates a renderer with the given page layout and the default theme.
    pub fn new(layout: LayoutSettings) -> Self {
        Self {
            layout,
            theme: Theme::default(),
        }
    }

    /// Overrides the theme and returns the updated renderer.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Renders `source`, inserting a table of contents when the layout asks for one.
    pub fn render(&self, source: &dyn DocumentSource) -> ReportResult<RenderedReport> {
        let sections = source.sections();

        if !self.layout.table_of_contents {
            let pass = self.render_pass(source, &sections, None, TOC_INSERT_POSITION, None)?;
            let toc = collect_entries(&sections, &pass.anchors)
                .into_iter()
                .map(|entry| ResolvedTocEntry {
                    title: entry.title,
                    page: entry.composed_page,
                })
                .collect();
            info!("rendered '{}' ({} pages, no contents)", source.title(), pass.page_count);
            return Ok(RenderedReport {
                bytes: pass.bytes,
                page_count: pass.page_count,
                toc,
            });
        }

        let composed = self.render_pass(source, &sections, None, TOC_INSERT_POSITION, None)?;
        let plan = TocPlan::new(
            collect_entries(&sections, &composed.anchors),
            self.layout.effective_toc_entries_per_page(),
        );
        debug!(
            "pass 1 produced {} pages; inserting {} contents page(s) at position {}",
            composed.page_count,
            plan.toc_pages(),
            plan.insert_position()
        );

        let total = composed.page_count + plan.toc_pages();
        let final_pass = self.render_pass(
            source,
            &sections,
            Some(&plan),
            plan.first_numbered_page(),
            Some(total),
        )?;
        verify_anchors(&plan, &sections, &final_pass.anchors)?;

        info!("rendered '{}' ({} pages)", source.title(), final_pass.page_count);
        Ok(RenderedReport {
            bytes: final_pass.bytes,
            page_count: final_pass.page_count,
            toc: plan.resolved(),
        })
    }

    fn render_pass(
        &self,
        source: &dyn DocumentSource,
        sections: &[SectionSpec],
        plan: Option<&TocPlan>,
        first_numbered_page: usize,
        total_pages: Option<usize>,
    ) -> ReportResult<PassOutput> {
        let tracker = PageTracker::new();
        let anchors = AnchorLog::with_sections(sections.len());
        let title = source.title();

        let header_title = title.clone();
        let header_style = self.theme.label();
        let footer_style = self.theme.small();
        let mut document = DocumentBuilder::new()
            .with_title(title)
            .with_paper_size(self.layout.page_size())
            .with_margins(self.layout.margins())
            .with_font_size(self.layout.font_size)
            .with_tracker(tracker.clone())
            .with_header(move |page| {
                (page >= first_numbered_page).then(|| {
                    Paragraph::new(header_title.clone())
                        .aligned(Alignment::Right)
                        .styled(header_style)
                        .padded(Margins::trbl(0, 0, 3, 0))
                })
            })
            .with_footer(self.layout.footer_height_mm, move |page| {
                (page >= first_numbered_page).then(|| {
                    Paragraph::new(page_label(page, total_pages))
                        .aligned(Alignment::Center)
                        .styled(footer_style)
                })
            })
            .build()
            .map_err(ReportError::font)?;

        document.push(source.cover(&self.theme)?);
        if let Some(plan) = plan {
            document.push(PageBreak::new());
            document.push(plan.build(&self.theme, &self.layout.toc_title)?);
        }
        for index in 0..sections.len() {
            document.push(PageBreak::new());
            document.push(SectionAnchor::new(index, anchors.clone(), tracker.clone()));
            document.push(source.build_section(index, &self.theme)?);
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::render)?;

        Ok(PassOutput {
            bytes,
            page_count: tracker.current(),
            anchors: anchors.pages(),
        })
    }
}

fn collect_entries(sections: &[SectionSpec], anchors: &[Option<usize>]) -> Vec<TocEntry> {
    sections
        .iter()
        .zip(anchors)
        .filter(|(section, _)| section.in_toc())
        .filter_map(|(section, page)| page.map(|page| TocEntry::new(section.title(), page)))
        .collect()
}

fn verify_anchors(
    plan: &TocPlan,
    sections: &[SectionSpec],
    anchors: &[Option<usize>],
) -> ReportResult<()> {
    let actual = collect_entries(sections, anchors);
    for (expected, actual) in plan.entries().iter().zip(&actual) {
        let promised = plan.printed_page(expected);
        if promised != actual.composed_page {
            return Err(ReportError::LayoutDrift {
                title: expected.title.clone(),
                expected: promised,
                actual: actual.composed_page,
            });
        }
    }
    if actual.len() != plan.entries().len() {
        return Err(ReportError::layout(format!(
            "{} sections were placed in the final pass but {} were planned",
            actual.len(),
            plan.entries().len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<SectionSpec> {
        vec![
            SectionSpec::new("Summary"),
            SectionSpec::unlisted("Notes"),
            SectionSpec::new("Details"),
        ]
    }

    #[test]
    fn page_labels() {
        assert_eq!(page_label(3, Some(9)), "Page 3 of 9");
        assert_eq!(page_label(4, None), "Page 4");
    }

    #[test]
    fn unlisted_and_unplaced_sections_are_skipped() {
        let entries = collect_entries(&sections(), &[Some(2), Some(3), None]);
        assert_eq!(entries, vec![TocEntry::new("Summary", 2)]);
    }

    #[test]
    fn shifted_anchors_verify() {
        let plan = TocPlan::new(collect_entries(&sections(), &[Some(2), Some(3), Some(4)]), 30);
        assert!(verify_anchors(&plan, &sections(), &[Some(3), Some(4), Some(5)]).is_ok());
    }

    #[test]
    fn drift_is_reported() {
        let plan = TocPlan::new(collect_entries(&sections(), &[Some(2), Some(3), Some(4)]), 30);
        let err = verify_anchors(&plan, &sections(), &[Some(3), Some(4), Some(6)]).unwrap_err();
        match err {
            ReportError::LayoutDrift {
                title,
                expected,
                actual,
            } => {
                assert_eq!(title, "Details");
                assert_eq!(expected, 5);
                assert_eq!(actual, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
