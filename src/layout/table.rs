//! Declarative tables emitted as framed `genpdf` table layouts.

use genpdf::elements::{FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Element, Margins};

use crate::error::{ReportError, ReportResult};
use crate::layout::mm;
use crate::layout::theme::Theme;

/// Column definition: heading, relative width and text alignment.
#[derive(Clone, Debug)]
pub struct Column {
    heading: String,
    weight: usize,
    alignment: Alignment,
}

impl Column {
    /// Left aligned text column.
    pub fn text(heading: impl Into<String>, weight: usize) -> Self {
        Self {
            heading: heading.into(),
            weight,
            alignment: Alignment::Left,
        }
    }

    /// Right aligned figure column.
    pub fn figure(heading: impl Into<String>, weight: usize) -> Self {
        Self {
            heading: heading.into(),
            weight,
            alignment: Alignment::Right,
        }
    }

    /// Centered column.
    pub fn centered(heading: impl Into<String>, weight: usize) -> Self {
        Self {
            heading: heading.into(),
            weight,
            alignment: Alignment::Center,
        }
    }
}

/// One body row.  Each cell may carry its own style, e.g. a red variance.
#[derive(Clone, Debug, Default)]
pub struct Row {
    cells: Vec<(String, Option<Style>)>,
}

impl Row {
    /// Creates a row from plain cell texts.
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(|cell| (cell.into(), None)).collect(),
        }
    }

    /// Appends a plain cell.
    pub fn cell(mut self, text: impl Into<String>) -> Self {
        self.cells.push((text.into(), None));
        self
    }

    /// Appends a styled cell.
    pub fn styled_cell(mut self, text: impl Into<String>, style: Style) -> Self {
        self.cells.push((text.into(), Some(style)));
        self
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Table description that can be validated and turned into a `TableLayout`.
#[derive(Clone, Debug, Default)]
pub struct TableSpec {
    columns: Vec<Column>,
    rows: Vec<Row>,
    footer: Option<Row>,
}

impl TableSpec {
    /// Creates a table with the given columns and no rows.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Appends a body row.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Appends a body row and returns the updated table.
    pub fn with_row(mut self, row: Row) -> Self {
        self.push_row(row);
        self
    }

    /// Sets the bold totals row.
    pub fn with_footer(mut self, footer: Row) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Number of body rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Checks that every row matches the column count.
    pub fn validate(&self) -> ReportResult<()> {
        if self.columns.is_empty() {
            return Err(ReportError::layout("table has no columns"));
        }
        let expected = self.columns.len();
        for (index, row) in self.rows.iter().chain(self.footer.iter()).enumerate() {
            if row.len() != expected {
                return Err(ReportError::layout(format!(
                    "row {} has {} cells but the table has {} columns",
                    index,
                    row.len(),
                    expected
                )));
            }
        }
        Ok(())
    }

    /// Builds the framed table: heading row, body rows, then the footer row in bold.
    pub fn build(&self, theme: &Theme) -> ReportResult<TableLayout> {
        self.validate()?;

        let weights = self.columns.iter().map(|column| column.weight.max(1)).collect();
        let mut table = TableLayout::new(weights);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        let heading_style = theme.small().bold().with_color(theme.primary);
        let mut heading = table.row();
        for column in &self.columns {
            heading.push_element(cell(&column.heading, column.alignment, heading_style));
        }
        heading.push()?;

        let body_style = theme.small();
        for row in &self.rows {
            push_row(&mut table, &self.columns, row, body_style)?;
        }
        if let Some(footer) = &self.footer {
            push_row(&mut table, &self.columns, footer, body_style.bold())?;
        }

        Ok(table)
    }
}

fn cell(text: &str, alignment: Alignment, style: Style) -> impl Element {
    Paragraph::new(text.to_string())
        .aligned(alignment)
        .styled(style)
        .padded(Margins::vh(mm(0.8), mm(1.2)))
}

fn push_row(
    table: &mut TableLayout,
    columns: &[Column],
    row: &Row,
    base: Style,
) -> ReportResult<()> {
    let mut table_row = table.row();
    for (column, (text, style)) in columns.iter().zip(&row.cells) {
        let style = match style {
            Some(style) => base.and(*style),
            None => base,
        };
        table_row.push_element(cell(text, column.alignment, style));
    }
    table_row.push()?;
    Ok(())
}

/// Lays out `cells` in a borderless grid with `columns` equal-width columns.
///
/// The final row is padded with empty cells so every row has the same width.
pub fn grid<E: Element + 'static>(cells: Vec<E>, columns: usize) -> ReportResult<TableLayout> {
    if columns == 0 {
        return Err(ReportError::layout("grid needs at least one column"));
    }

    let mut table = TableLayout::new(vec![1; columns]);
    let mut cells = cells.into_iter().peekable();
    while cells.peek().is_some() {
        let mut row = table.row();
        for _ in 0..columns {
            match cells.next() {
                Some(element) => row.push_element(element.padded(Margins::all(mm(1.5)))),
                None => row.push_element(LinearLayout::vertical()),
            }
        }
        row.push()?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_rows_are_rejected() {
        let table = TableSpec::new(vec![Column::text("Code", 1), Column::figure("Amount", 2)])
            .with_row(Row::new(["A1", "R 10.00"]))
            .with_row(Row::new(["A2"]));
        let err = table.validate().unwrap_err();
        assert!(matches!(err, ReportError::Layout(message) if message.contains("row 1")));
    }

    #[test]
    fn footer_is_validated_too() {
        let table = TableSpec::new(vec![Column::text("Code", 1)])
            .with_row(Row::new(["A1"]))
            .with_footer(Row::new(["Total", "extra"]));
        assert!(table.validate().is_err());
    }

    #[test]
    fn empty_tables_need_columns() {
        assert!(TableSpec::default().validate().is_err());
        let ok = TableSpec::new(vec![Column::centered("Status", 1)]).with_row(Row::default().cell("OK"));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.row_count(), 1);
    }
}
