//! Table of contents planning and back-patching.
//!
//! Sections are first laid out without a table of contents, which yields their
//! composition-time page numbers.  The contents pages are then inserted directly after the
//! cover, so every content page moves back by the number of inserted pages.  [`TocPlan`] owns
//! that offset and is the only place page numbers are adjusted.

use genpdf::elements::{LinearLayout, PageBreak, Paragraph};
use genpdf::Element;

use crate::error::ReportResult;
use crate::layout::{Column, Row, TableSpec, Theme};

/// Absolute page position at which the contents pages are inserted (directly after the cover).
pub const TOC_INSERT_POSITION: usize = 2;

/// Section title together with its composition-time page number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Section title.
    pub title: String,
    /// Page the section started on before the contents pages were inserted.
    pub composed_page: usize,
}

impl TocEntry {
    /// Creates an entry.
    pub fn new(title: impl Into<String>, composed_page: usize) -> Self {
        Self {
            title: title.into(),
            composed_page,
        }
    }
}

/// Entry with the page number printed in the final document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTocEntry {
    /// Section title.
    pub title: String,
    /// Page number in the final document.
    pub page: usize,
}

/// Layout decision for the contents pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocPlan {
    entries: Vec<TocEntry>,
    entries_per_page: usize,
    toc_pages: usize,
}

impl TocPlan {
    /// Plans contents pages for `entries`, printing at most `entries_per_page` per page.
    ///
    /// At least one page is inserted, even for an empty list.
    pub fn new(entries: Vec<TocEntry>, entries_per_page: usize) -> Self {
        let entries_per_page = entries_per_page.max(1);
        let toc_pages = ((entries.len() + entries_per_page - 1) / entries_per_page).max(1);
        Self {
            entries,
            entries_per_page,
            toc_pages,
        }
    }

    /// Number of inserted contents pages.
    pub fn toc_pages(&self) -> usize {
        self.toc_pages
    }

    /// Absolute position of the first inserted page.
    pub fn insert_position(&self) -> usize {
        TOC_INSERT_POSITION
    }

    /// First page that carries a page-number footer: the page after the last contents page.
    pub fn first_numbered_page(&self) -> usize {
        TOC_INSERT_POSITION + self.toc_pages
    }

    /// Page number printed for `entry`: its composition-time page shifted by the inserted pages.
    pub fn printed_page(&self, entry: &TocEntry) -> usize {
        if entry.composed_page >= TOC_INSERT_POSITION {
            entry.composed_page + self.toc_pages
        } else {
            entry.composed_page
        }
    }

    /// Planned entries.
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Entries with their final page numbers.
    pub fn resolved(&self) -> Vec<ResolvedTocEntry> {
        self.entries
            .iter()
            .map(|entry| ResolvedTocEntry {
                title: entry.title.clone(),
                page: self.printed_page(entry),
            })
            .collect()
    }

    /// Builds the contents pages, one table per page, separated by page breaks.
    pub fn build(&self, theme: &Theme, title: &str) -> ReportResult<LinearLayout> {
        let mut layout = LinearLayout::vertical();
        layout.push(Paragraph::new(title.to_string()).styled(theme.title()));
        layout.push(genpdf::elements::Break::new(1.0));

        let resolved = self.resolved();
        if resolved.is_empty() {
            layout.push(Paragraph::new("No sections").styled(theme.label()));
            return Ok(layout);
        }

        for (page_index, chunk) in resolved.chunks(self.entries_per_page).enumerate() {
            if page_index > 0 {
                layout.push(PageBreak::new());
            }
            let mut table = TableSpec::new(vec![Column::text("Section", 8), Column::figure("Page", 1)]);
            for entry in chunk {
                table.push_row(Row::new([entry.title.clone(), entry.page.to_string()]));
            }
            layout.push(table.build(theme)?);
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(count: usize) -> Vec<TocEntry> {
        (0..count)
            .map(|index| TocEntry::new(format!("Section {index}"), index + 2))
            .collect()
    }

    #[test]
    fn single_page_adds_one() {
        let plan = TocPlan::new(entries(4), 30);
        assert_eq!(plan.toc_pages(), 1);
        assert_eq!(plan.insert_position(), 2);
        assert_eq!(plan.first_numbered_page(), 3);
        for (entry, resolved) in plan.entries().iter().zip(plan.resolved()) {
            assert_eq!(resolved.page, entry.composed_page + 1);
        }
    }

    #[test]
    fn long_lists_shift_by_every_inserted_page() {
        let plan = TocPlan::new(entries(25), 10);
        assert_eq!(plan.toc_pages(), 3);
        assert_eq!(plan.first_numbered_page(), 5);
        assert_eq!(plan.printed_page(&TocEntry::new("x", 2)), 5);
    }

    #[test]
    fn empty_plans_still_insert_a_page() {
        let plan = TocPlan::new(Vec::new(), 0);
        assert_eq!(plan.toc_pages(), 1);
        assert!(plan.resolved().is_empty());
    }

    #[test]
    fn cover_page_is_not_shifted() {
        let plan = TocPlan::new(entries(1), 5);
        assert_eq!(plan.printed_page(&TocEntry::new("Cover", 1)), 1);
    }
}
