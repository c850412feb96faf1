//! Reusable drawing helpers shared by every report kind.

pub mod card;
pub mod logo;
pub mod table;
pub mod theme;

use genpdf::elements::{Break, Paragraph};
use genpdf::{Element, Mm};

pub use card::{category_card, legend_row, metric_card, Card, Swatch};
pub use table::{grid, Column, Row, TableSpec};
pub use theme::{Theme, Tone};

pub(crate) fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Section heading followed by a half-line gap.
pub fn heading(theme: &Theme, text: &str) -> genpdf::elements::LinearLayout {
    let mut layout = genpdf::elements::LinearLayout::vertical();
    layout.push(Paragraph::new(text.to_string()).styled(theme.heading()));
    layout.push(Break::new(0.5));
    layout
}
