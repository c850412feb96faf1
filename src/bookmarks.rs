//! PDF outline injection built on top of `lopdf`.

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

use crate::toc::ResolvedTocEntry;

/// Errors that can occur while embedding an outline into a rendered PDF document.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written by `lopdf`.
    #[error("failed to process PDF bytes: {0}")]
    Parse(#[from] lopdf::Error),
    /// The trailer has no `/Root` catalog.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object was not a dictionary, preventing outline injection.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// A contents entry points past the last page.
    #[error("contents entry '{title}' refers to missing page {page}")]
    MissingPage {
        /// Title of the entry.
        title: String,
        /// The requested (1-indexed) page number.
        page: usize,
    },
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

/// Adds a flat `/Outlines` tree with one `/Dest [page /Fit]` entry per contents entry.
///
/// The bytes are returned unchanged when there is nothing to link.
pub fn apply_toc_bookmarks(
    pdf_bytes: &[u8],
    entries: &[ResolvedTocEntry],
) -> Result<Vec<u8>, BookmarkError> {
    if entries.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    write_toc_outline(&mut document, entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Writes the outline root, one sibling item per entry, and links the root from the catalog.
///
/// Every page and the catalog are resolved before the document is touched, so a failure leaves
/// it unchanged.
fn write_toc_outline(
    document: &mut Document,
    entries: &[ResolvedTocEntry],
) -> Result<(), BookmarkError> {
    let pages = document.get_pages();
    let targets = entries
        .iter()
        .map(|entry| {
            u32::try_from(entry.page)
                .ok()
                .and_then(|page| pages.get(&page).copied())
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: entry.title.clone(),
                    page: entry.page,
                })
        })
        .collect::<Result<Vec<ObjectId>, _>>()?;
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    if !matches!(document.objects.get(&catalog_id), Some(Object::Dictionary(_))) {
        return Err(BookmarkError::InvalidCatalog);
    }

    let root_id = document.new_object_id();
    let item_ids: Vec<ObjectId> = entries.iter().map(|_| document.new_object_id()).collect();

    for (index, (entry, page_ref)) in entries.iter().zip(&targets).enumerate() {
        let mut item = Dictionary::new();
        item.set("Title", Object::string_literal(entry.title.as_str()));
        item.set("Parent", Object::Reference(root_id));
        item.set(
            "Dest",
            Object::Array(vec![Object::Reference(*page_ref), Object::Name(b"Fit".to_vec())]),
        );
        if let Some(prev) = index.checked_sub(1).map(|prev| item_ids[prev]) {
            item.set("Prev", Object::Reference(prev));
        }
        if let Some(next) = item_ids.get(index + 1) {
            item.set("Next", Object::Reference(*next));
        }
        document.objects.insert(item_ids[index], Object::Dictionary(item));
    }

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"Outlines".to_vec()));
    root.set("Count", Object::Integer(item_ids.len() as i64));
    if let (Some(first), Some(last)) = (item_ids.first(), item_ids.last()) {
        root.set("First", Object::Reference(*first));
        root.set("Last", Object::Reference(*last));
    }
    document.objects.insert(root_id, Object::Dictionary(root));

    if let Some(Object::Dictionary(catalog)) = document.objects.get_mut(&catalog_id) {
        catalog.set("Outlines", Object::Reference(root_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outlines_leave_bytes_untouched() {
        let bytes = b"not even a pdf".to_vec();
        assert_eq!(apply_toc_bookmarks(&bytes, &[]).unwrap(), bytes);
    }

    fn three_page_pdf() -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let kids: Vec<Object> = (0..3)
            .map(|_| {
                let mut page = Dictionary::new();
                page.set("Type", Object::Name(b"Page".to_vec()));
                page.set("Parent", Object::Reference(pages_id));
                Object::Reference(document.add_object(page))
            })
            .collect();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(3));
        pages.set("Kids", Object::Array(kids));
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();
        bytes
    }

    fn entry(title: &str, page: usize) -> ResolvedTocEntry {
        ResolvedTocEntry {
            title: title.into(),
            page,
        }
    }

    #[test]
    fn outline_items_point_at_their_pages() {
        let entries = [entry("Summary", 2), entry("Breakdown", 3)];
        let bytes = apply_toc_bookmarks(&three_page_pdf(), &entries).unwrap();

        let document = Document::load_mem(&bytes).unwrap();
        let pages = document.get_pages();
        let root_id = document
            .catalog()
            .unwrap()
            .get(b"Outlines")
            .and_then(Object::as_reference)
            .unwrap();
        let root = document.get_dictionary(root_id).unwrap();
        assert_eq!(root.get(b"Count").and_then(Object::as_i64).unwrap(), 2);

        let first_id = root.get(b"First").and_then(Object::as_reference).unwrap();
        let first = document.get_dictionary(first_id).unwrap();
        assert_eq!(first.get(b"Title").and_then(Object::as_str).unwrap(), b"Summary");
        let dest = first.get(b"Dest").and_then(Object::as_array).unwrap();
        assert_eq!(dest[0].as_reference().unwrap(), pages[&2]);

        let last_id = root.get(b"Last").and_then(Object::as_reference).unwrap();
        let last = document.get_dictionary(last_id).unwrap();
        assert_eq!(last.get(b"Prev").and_then(Object::as_reference).unwrap(), first_id);
        assert!(last.get(b"Next").is_err());
    }

    #[test]
    fn entries_past_the_last_page_are_rejected() {
        let entries = [entry("Summary", 2), entry("Appendix", 9)];
        assert!(matches!(
            apply_toc_bookmarks(&three_page_pdf(), &entries),
            Err(BookmarkError::MissingPage { page: 9, .. })
        ));
    }

    #[test]
    fn unparsable_documents_are_reported() {
        let entries = [ResolvedTocEntry {
            title: "Summary".into(),
            page: 3,
        }];
        assert!(matches!(
            apply_toc_bookmarks(b"garbage", &entries),
            Err(BookmarkError::Parse(_))
        ));
    }
}
