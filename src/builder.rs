//! Document construction helpers.
//!
//! [`DocumentBuilder`] produces a `genpdf::Document` with the report fonts, paper size, and a
//! page decorator that applies margins, running headers and a fixed-height footer.  The decorator
//! also advances a shared [`PageTracker`] so elements can find out which physical page they are
//! being laid out on.

use std::cell::Cell;
use std::rc::Rc;

use genpdf::error::{Error, ErrorKind};
use genpdf::style;
use genpdf::{self, Element, Margins, Mm, PageDecorator, Position, Size};

use crate::fonts;

type PageElementFactory = dyn Fn(usize) -> Option<Box<dyn Element>>;

/// Shared counter holding the 1-based number of the page currently being laid out.
#[derive(Clone, Debug, Default)]
pub struct PageTracker(Rc<Cell<usize>>);

impl PageTracker {
    /// Creates a tracker positioned before the first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current page number, `0` before the first page starts.
    pub fn current(&self) -> usize {
        self.0.get()
    }

    fn advance(&self) -> usize {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

/// Builder for `genpdf::Document` instances pre-configured for reports.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    font_size: Option<u8>,
    header: Option<Box<PageElementFactory>>,
    footer: Option<FooterSpec>,
    tracker: PageTracker,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PDF document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Sets the base font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Shares `tracker` with the page decorator instead of a private one.
    pub fn with_tracker(mut self, tracker: PageTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Configures a header callback invoked for every page; `None` leaves the page bare.
    pub fn with_header<F, E>(mut self, header: F) -> Self
    where
        F: Fn(usize) -> Option<E> + 'static,
        E: Element + 'static,
    {
        self.header = Some(Box::new(move |page| {
            header(page).map(|element| Box::new(element) as Box<dyn Element>)
        }));
        self
    }

    /// Configures a footer with a fixed height.  The height is reserved on every page, even those
    /// for which the callback returns `None`.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> Option<E> + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        let decorator =
            ConfiguredPageDecorator::new(self.tracker, self.margins, self.header, self.footer);
        document.set_page_decorator(decorator);

        Ok(document)
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<PageElementFactory>,
}

impl FooterSpec {
    /// Creates a new footer specification.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> Option<E> + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| {
                factory(page).map(|element| Box::new(element) as Box<dyn Element>)
            }),
        }
    }
}

struct ConfiguredPageDecorator {
    tracker: PageTracker,
    margins: Option<Margins>,
    header: Option<Box<PageElementFactory>>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(
        tracker: PageTracker,
        margins: Option<Margins>,
        header: Option<Box<PageElementFactory>>,
        footer: Option<FooterSpec>,
    ) -> Self {
        Self {
            tracker,
            margins,
            header,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.tracker.advance();

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(mut element) = self.header.as_ref().and_then(|header| header(page)) {
            let result = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            if let Some(mut element) = (footer.factory)(page) {
                let mut footer_area = area.clone();
                footer_area.add_offset(Position::new(0, available - footer.height));
                let result = element.render(context, footer_area, style)?;
                if result.has_more {
                    return Err(Error::new(
                        "Footer element does not fit into the reserved space",
                        ErrorKind::PageSizeExceeded,
                    ));
                }
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
