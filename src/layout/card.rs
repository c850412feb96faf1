//! Boxed layout primitives: cards, KPI tiles, category tiles and legend rows.
//!
//! `genpdf` cannot fill shapes, so borders and swatches are drawn with strokes through
//! [`genpdf::render::Area::draw_line`].

use genpdf::elements::{LinearLayout, Paragraph, TableLayout};
use genpdf::error::Error;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Margins, Mm, Position, RenderResult, Size};

use crate::aggregate::CategoryTotals;
use crate::layout::mm;
use crate::layout::theme::{Theme, Tone};
use crate::money::{format_percent, MoneyFormat};
use rust_decimal::Decimal;

const DEFAULT_CARD_PADDING_MM: f64 = 2.5;
const SWATCH_SIZE_MM: f64 = 3.0;
const SWATCH_STROKES: usize = 12;

/// Draws the outline of a `width × height` rectangle anchored at the area origin.
fn draw_rectangle(area: &mut render::Area<'_>, width: Mm, height: Mm, color: Color) {
    let zero = Mm::default();
    area.draw_line(
        vec![
            Position::new(zero, zero),
            Position::new(width, zero),
            Position::new(width, height),
            Position::new(zero, height),
            Position::new(zero, zero),
        ],
        Style::new().with_color(color),
    );
}

/// Wraps an element in a bordered, padded box spanning the full available width.
pub struct Card<E: Element> {
    inner: E,
    padding: Mm,
    border: Color,
}

impl<E: Element> Card<E> {
    /// Creates a card around `inner` with the default padding and a light grey border.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            padding: mm(DEFAULT_CARD_PADDING_MM),
            border: Theme::default().border,
        }
    }

    /// Sets the border colour and returns the updated card.
    pub fn with_border(mut self, border: Color) -> Self {
        self.border = border;
        self
    }

    /// Sets the inner padding and returns the updated card.
    pub fn with_padding(mut self, padding: impl Into<Mm>) -> Self {
        self.padding = padding.into();
        self
    }
}

impl<E: Element> Element for Card<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut inner_area = area.clone();
        inner_area.add_margins(Margins::all(self.padding));
        let inner = self.inner.render(context, inner_area, style)?;

        let width = area.size().width;
        let mut height = inner.size.height + self.padding + self.padding;
        if height > area.size().height {
            height = area.size().height;
        }
        draw_rectangle(&mut area, width, height, self.border);

        let mut result = RenderResult::default();
        result.size = Size::new(width, height);
        result.has_more = inner.has_more;
        Ok(result)
    }
}

/// A small square filled with horizontal strokes, used as a legend key.
pub struct Swatch {
    color: Color,
    size: Mm,
}

impl Swatch {
    /// Creates a swatch of the default size.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            size: mm(SWATCH_SIZE_MM),
        }
    }
}

impl Element for Swatch {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        mut area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.size > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let line_style = Style::new().with_color(self.color);
        for stroke in 0..=SWATCH_STROKES {
            let y = self.size * (stroke as f64 / SWATCH_STROKES as f64);
            area.draw_line(
                vec![Position::new(0, y), Position::new(self.size, y)],
                line_style,
            );
        }

        result.size = Size::new(self.size, self.size);
        Ok(result)
    }
}

/// KPI tile: muted label, large value and an optional coloured caption.
pub fn metric_card(
    theme: &Theme,
    label: &str,
    value: impl Into<String>,
    caption: Option<String>,
    tone: Tone,
) -> Card<LinearLayout> {
    let mut layout = LinearLayout::vertical();
    layout.push(Paragraph::new(label.to_uppercase()).styled(theme.label()));
    layout.push(Paragraph::new(value.into()).styled(theme.value(Tone::Neutral)));
    if let Some(caption) = caption {
        layout.push(Paragraph::new(caption).styled(theme.small().with_color(theme.color(tone))));
    }
    Card::new(layout).with_border(theme.border)
}

/// Category tile: name, budget/anticipated figures, variance and share of the total.
pub fn category_card(
    theme: &Theme,
    money: &MoneyFormat,
    category: &CategoryTotals,
    share: Option<Decimal>,
) -> Card<LinearLayout> {
    let totals = &category.totals;
    let variance = category.variance();
    let mut layout = LinearLayout::vertical();

    layout.push(Paragraph::new(category.label()).styled(theme.subheading()));
    layout.push(figure_line(theme, "Original budget", money.format(totals.original_budget), Tone::Neutral));
    layout.push(figure_line(theme, "Anticipated final", money.format(totals.anticipated_final), Tone::Neutral));
    layout.push(figure_line(
        theme,
        "Variance",
        format!(
            "{} ({})",
            money.format_signed(variance),
            format_percent(totals.variance_percent())
        ),
        Tone::for_variance(variance),
    ));
    layout.push(
        Paragraph::new(format!(
            "{} of total  |  {} items, {} PC",
            format_percent(share),
            category.item_count,
            category.pc_item_count
        ))
        .styled(theme.label()),
    );

    let border = match Tone::for_variance(variance) {
        Tone::Negative => theme.negative,
        _ => theme.border,
    };
    Card::new(layout).with_border(border)
}

fn figure_line(theme: &Theme, label: &str, value: String, tone: Tone) -> Paragraph {
    let mut paragraph = Paragraph::new(StyledString::new(format!("{label}: "), theme.label()));
    paragraph.push_styled(value, theme.small().bold().with_color(theme.color(tone)));
    paragraph
}

/// Legend entry: swatch, bold label and a muted description.
pub fn legend_row(
    theme: &Theme,
    color: Color,
    label: &str,
    description: &str,
) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(vec![1, 5, 24]);
    table
        .row()
        .element(Swatch::new(color))
        .element(Paragraph::new(label.to_string()).styled(theme.small().bold()))
        .element(Paragraph::new(description.to_string()).styled(theme.label()))
        .push()?;
    Ok(table)
}
