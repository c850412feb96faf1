//! Page composition: ordered logical sections and the anchors that record where they start.
//!
//! A [`DocumentSource`] describes a report as a cover plus a list of sections.  The renderer
//! asks the source for fresh elements on every pass and places a [`SectionAnchor`] at the top of
//! each section.  When `genpdf` lays the anchor out it reads the page number from the shared
//! [`PageTracker`], which yields the composition-time page number of the section.

use std::cell::RefCell;
use std::rc::Rc;

use genpdf::elements::LinearLayout;
use genpdf::error::Error;
use genpdf::style::Style;
use genpdf::{render, Element, RenderResult};

use crate::builder::PageTracker;
use crate::error::ReportResult;
use crate::layout::Theme;

/// Metadata for one logical section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSpec {
    title: String,
    in_toc: bool,
}

impl SectionSpec {
    /// A section listed in the table of contents.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            in_toc: true,
        }
    }

    /// A section left out of the table of contents.
    pub fn unlisted(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            in_toc: false,
        }
    }

    /// Section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the section appears in the table of contents.
    pub fn in_toc(&self) -> bool {
        self.in_toc
    }
}

/// A report that can be laid out as cover plus sections.
///
/// Builders are invoked once per render pass and must return identical content each time,
/// otherwise the table of contents cannot be trusted.
pub trait DocumentSource {
    /// Document title stored in the PDF metadata and the running header.
    fn title(&self) -> String;

    /// Builds the cover page content.
    fn cover(&self, theme: &Theme) -> ReportResult<LinearLayout>;

    /// Lists the sections following the cover, in order.
    fn sections(&self) -> Vec<SectionSpec>;

    /// Builds the content of the section at `index` in [`DocumentSource::sections`].
    fn build_section(&self, index: usize, theme: &Theme) -> ReportResult<LinearLayout>;
}

/// Page numbers recorded by the anchors of one render pass, indexed by section.
#[derive(Clone, Debug, Default)]
pub struct AnchorLog(Rc<RefCell<Vec<Option<usize>>>>);

impl AnchorLog {
    /// Creates a log with one empty slot per section.
    pub fn with_sections(count: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![None; count])))
    }

    /// Records `page` for `slot` unless the slot already holds a page.
    pub fn record(&self, slot: usize, page: usize) {
        let mut pages = self.0.borrow_mut();
        if let Some(entry) = pages.get_mut(slot) {
            entry.get_or_insert(page);
        }
    }

    /// Returns the recorded pages.
    pub fn pages(&self) -> Vec<Option<usize>> {
        self.0.borrow().clone()
    }
}

/// Zero-size element recording the page on which it is first laid out.
pub struct SectionAnchor {
    slot: usize,
    log: AnchorLog,
    tracker: PageTracker,
}

impl SectionAnchor {
    /// Creates an anchor writing into `slot` of `log`.
    pub fn new(slot: usize, log: AnchorLog, tracker: PageTracker) -> Self {
        Self { slot, log, tracker }
    }
}

impl Element for SectionAnchor {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        _area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        self.log.record(self.slot, self.tracker.current());
        Ok(RenderResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_recorded_page_wins() {
        let log = AnchorLog::with_sections(2);
        log.record(0, 3);
        log.record(0, 4);
        log.record(5, 1);
        assert_eq!(log.pages(), vec![Some(3), None]);
    }

    #[test]
    fn unlisted_sections_stay_out_of_the_toc() {
        assert!(SectionSpec::new("Summary").in_toc());
        assert!(!SectionSpec::unlisted("Appendix").in_toc());
    }
}
