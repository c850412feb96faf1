//! Cost report layout: cover, executive summary, category grid, project information,
//! detailed line items and variations.

use genpdf::elements::{Break, LinearLayout, Paragraph};
use genpdf::{Alignment, Element};

use crate::aggregate::{CategoryTotals, ReportSummary, Totals};
use crate::compose::{DocumentSource, SectionSpec};
use crate::config::CompanySettings;
use crate::error::{ReportError, ReportResult};
use crate::layout::logo::logo_from_path;
use crate::layout::{
    category_card, grid, heading, legend_row, metric_card, Column, Row, TableSpec, Theme, Tone,
};
use crate::model::{Category, CostReport, Variation};
use crate::money::{format_percent, MoneyFormat};

/// Logical pages of a cost report in print order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostSection {
    /// KPI dashboard, legend and category summary table.
    ExecutiveSummary,
    /// Grid of category detail cards.
    CategoryBreakdown,
    /// Project fields and notes.
    ProjectInformation,
    /// One table per category.
    LineItems,
    /// Variation summary and per-variation tables.
    Variations,
}

impl CostSection {
    /// Title printed on the page and in the contents.
    pub fn title(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "Executive Summary",
            Self::CategoryBreakdown => "Category Breakdown",
            Self::ProjectInformation => "Project Information",
            Self::LineItems => "Detailed Line Items",
            Self::Variations => "Variations",
        }
    }
}

/// [`DocumentSource`] for a [`CostReport`].
pub struct CostReportDocument<'a> {
    report: &'a CostReport,
    summary: ReportSummary,
    company: CompanySettings,
    money: MoneyFormat,
}

impl<'a> CostReportDocument<'a> {
    /// Aggregates `report` and prepares it for rendering.
    ///
    /// Fails with [`ReportError::Amount`] when a figure overflows.
    pub fn new(report: &'a CostReport, company: CompanySettings) -> ReportResult<Self> {
        let money = company.money_format();
        Ok(Self {
            report,
            summary: ReportSummary::from_report(report)?,
            company,
            money,
        })
    }

    /// The aggregated figures printed by the document.
    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    /// Sections in print order; variations are left out when the report has none.
    pub fn section_kinds(&self) -> Vec<CostSection> {
        let mut kinds = vec![
            CostSection::ExecutiveSummary,
            CostSection::CategoryBreakdown,
            CostSection::ProjectInformation,
            CostSection::LineItems,
        ];
        if !self.report.variations.is_empty() {
            kinds.push(CostSection::Variations);
        }
        kinds
    }

    fn executive_summary(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let grand = &self.summary.grand;
        let variations = &self.summary.variations;
        let mut layout = heading(theme, CostSection::ExecutiveSummary.title());

        let cards = vec![
            metric_card(
                theme,
                "Original budget",
                self.money.format(grand.original_budget),
                Some(format!("{} categories", self.summary.categories.len())),
                Tone::Neutral,
            ),
            metric_card(
                theme,
                "Anticipated final",
                self.money.format(grand.anticipated_final),
                Some(format!(
                    "{} since previous report",
                    self.money.format_signed(grand.movement())
                )),
                Tone::for_variance(grand.movement()),
            ),
            metric_card(
                theme,
                "Variance",
                self.money.format_signed(grand.variance()),
                Some(format!(
                    "{} of original budget, {} over budget",
                    format_percent(grand.variance_percent()),
                    self.summary.categories_over_budget()
                )),
                Tone::for_variance(grand.variance()),
            ),
            metric_card(
                theme,
                "Variations (net)",
                self.money.format_signed(variations.net()),
                Some(format!(
                    "{} orders: credits {}, debits {}",
                    variations.count,
                    self.money.format(variations.credits),
                    self.money.format(variations.debits)
                )),
                Tone::for_variance(variations.net()),
            ),
        ];
        layout.push(grid(cards, 2)?);
        layout.push(Break::new(0.5));

        layout.push(legend_row(theme, theme.positive, "Saving", "Anticipated final below the original budget")?);
        layout.push(legend_row(theme, theme.negative, "Overrun", "Anticipated final above the original budget")?);
        layout.push(legend_row(theme, theme.border, "On budget", "No variance against the original budget")?);
        layout.push(Break::new(1.0));

        let mut table = TableSpec::new(vec![
            Column::text("Category", 5),
            Column::figure("Original Budget", 3),
            Column::figure("Previous Report", 3),
            Column::figure("Anticipated Final", 3),
            Column::figure("Variance", 3),
        ]);
        for category in &self.summary.categories {
            table.push_row(self.totals_row(theme, category.label(), &category.totals));
        }
        let table = table.with_footer(self.totals_row(theme, "Grand total".to_string(), grand));
        layout.push(table.build(theme)?);
        Ok(layout)
    }

    fn totals_row(&self, theme: &Theme, label: String, totals: &Totals) -> Row {
        Row::default()
            .cell(label)
            .cell(self.money.format(totals.original_budget))
            .cell(self.money.format(totals.previous_report))
            .cell(self.money.format(totals.anticipated_final))
            .styled_cell(
                self.money.format_signed(totals.variance()),
                theme.small().with_color(theme.color(Tone::for_variance(totals.variance()))),
            )
    }

    fn category_breakdown(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let mut layout = heading(theme, CostSection::CategoryBreakdown.title());
        if self.summary.categories.is_empty() {
            layout.push(Paragraph::new("No cost categories have been captured.").styled(theme.label()));
            return Ok(layout);
        }

        let cards = self
            .summary
            .categories
            .iter()
            .map(|category| {
                category_card(theme, &self.money, category, self.summary.share_of_total(category))
            })
            .collect();
        layout.push(grid(cards, 2)?);
        Ok(layout)
    }

    fn project_information(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let report = self.report;
        let mut layout = heading(theme, CostSection::ProjectInformation.title());

        let mut table = TableSpec::new(vec![Column::text("Field", 1), Column::text("Value", 3)]);
        for (label, value) in report.project.fields() {
            table.push_row(Row::new([label.to_string(), value]));
        }
        table.push_row(Row::new(["Report number".to_string(), report.report_number.to_string()]));
        table.push_row(Row::new(["Revision".to_string(), report.revision_label().to_string()]));
        table.push_row(Row::new([
            "Report date".to_string(),
            report.report_date.format("%d %B %Y").to_string(),
        ]));
        layout.push(table.build(theme)?);

        if !report.notes.is_empty() {
            layout.push(Break::new(1.0));
            layout.push(Paragraph::new("Notes").styled(theme.subheading()));
            for note in report.notes.iter().filter(|note| !note.trim().is_empty()) {
                layout.push(Paragraph::new(note.trim().to_string()));
                layout.push(Break::new(0.3));
            }
        }
        Ok(layout)
    }

    fn line_items(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let mut layout = heading(theme, CostSection::LineItems.title());
        if self.report.categories.is_empty() {
            layout.push(Paragraph::new("No line items have been captured.").styled(theme.label()));
            return Ok(layout);
        }

        for (category, totals) in self.report.categories.iter().zip(&self.summary.categories) {
            layout.push(Paragraph::new(totals.label()).styled(theme.subheading()));
            layout.push(Break::new(0.3));
            layout.push(self.line_item_table(theme, category, totals).build(theme)?);
            layout.push(Break::new(1.0));
        }
        Ok(layout)
    }

    fn line_item_table(&self, theme: &Theme, category: &Category, totals: &CategoryTotals) -> TableSpec {
        let mut table = TableSpec::new(vec![
            Column::text("Code", 2),
            Column::text("Description", 6),
            Column::figure("Qty", 2),
            Column::figure("Rate", 3),
            Column::figure("Original", 3),
            Column::figure("Previous", 3),
            Column::figure("Anticipated", 3),
            Column::figure("Variance", 3),
        ]);

        for item in &category.line_items {
            let description = if item.pc_item {
                format!("{} (PC)", item.description)
            } else {
                item.description.clone()
            };
            let quantity = match (&item.quantity, &item.unit) {
                (Some(quantity), Some(unit)) => format!("{} {}", quantity.normalize(), unit),
                (Some(quantity), None) => quantity.normalize().to_string(),
                _ => String::new(),
            };
            let rate = item.rate.map(|rate| self.money.format(rate)).unwrap_or_default();
            let variance = item.variance();

            table.push_row(
                Row::default()
                    .cell(item.code.clone())
                    .cell(description)
                    .cell(quantity)
                    .cell(rate)
                    .cell(self.money.format(item.original_budget))
                    .cell(self.money.format(item.previous_report))
                    .cell(self.money.format(item.anticipated_final()))
                    .styled_cell(
                        self.money.format_signed(variance),
                        theme.small().with_color(theme.color(Tone::for_variance(variance))),
                    ),
            );
        }

        table.with_footer(
            Row::new(["", "Subtotal", "", ""])
                .cell(self.money.format(totals.totals.original_budget))
                .cell(self.money.format(totals.totals.previous_report))
                .cell(self.money.format(totals.totals.anticipated_final))
                .cell(self.money.format_signed(totals.variance())),
        )
    }

    fn variations(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let mut layout = heading(theme, CostSection::Variations.title());

        let mut summary = TableSpec::new(vec![
            Column::text("Code", 2),
            Column::text("Description", 6),
            Column::text("Tenant", 3),
            Column::centered("Type", 2),
            Column::figure("Amount", 3),
        ]);
        for variation in &self.report.variations {
            let signed = variation.signed_total();
            summary.push_row(
                Row::default()
                    .cell(variation.code.clone())
                    .cell(variation.description.clone())
                    .cell(variation.tenant.clone().unwrap_or_default())
                    .cell(variation.kind.label())
                    .styled_cell(
                        self.money.format_signed(signed),
                        theme.small().with_color(theme.color(Tone::for_variance(signed))),
                    ),
            );
        }
        let net = self.summary.variations.net();
        let summary = summary.with_footer(
            Row::new(["", "Net variations", "", ""]).cell(self.money.format_signed(net)),
        );
        layout.push(summary.build(theme)?);

        for variation in self.report.variations.iter().filter(|v| !v.lines.is_empty()) {
            layout.push(Break::new(1.0));
            layout.push(
                Paragraph::new(format!("{} - {}", variation.code, variation.description))
                    .styled(theme.subheading()),
            );
            layout.push(Break::new(0.3));
            layout.push(self.variation_table(variation).build(theme)?);
        }
        Ok(layout)
    }

    fn variation_table(&self, variation: &Variation) -> TableSpec {
        let mut table = TableSpec::new(vec![
            Column::text("Description", 6),
            Column::figure("Qty", 2),
            Column::figure("Rate", 3),
            Column::figure("Amount", 3),
        ]);
        for line in &variation.lines {
            table.push_row(
                Row::default()
                    .cell(line.description.clone())
                    .cell(line.quantity.map(|q| q.normalize().to_string()).unwrap_or_default())
                    .cell(line.rate.map(|rate| self.money.format(rate)).unwrap_or_default())
                    .cell(self.money.format(line.total())),
            );
        }
        table.with_footer(Row::new([
            format!("{} total", variation.kind.label()),
            String::new(),
            String::new(),
            self.money.format(variation.magnitude()),
        ]))
    }
}

impl DocumentSource for CostReportDocument<'_> {
    fn title(&self) -> String {
        format!("{} - {}", self.report.project.name, self.report.title())
    }

    fn cover(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let report = self.report;
        let mut layout = LinearLayout::vertical();

        if let Some(path) = &self.company.logo {
            layout.push(logo_from_path(path, self.company.logo_width_mm, Alignment::Left)?);
            layout.push(Break::new(2.0));
        } else {
            layout.push(Break::new(6.0));
        }

        layout.push(Paragraph::new(self.company.name.clone()).styled(theme.label()));
        layout.push(Break::new(4.0));
        layout.push(Paragraph::new(report.project.name.clone()).styled(theme.title()));
        layout.push(Paragraph::new(report.title()).styled(theme.heading()));
        layout.push(Break::new(1.0));
        layout.push(Paragraph::new(format!("Revision {}", report.revision_label())));
        layout.push(Paragraph::new(report.report_date.format("%d %B %Y").to_string()));
        if let Some(client) = &report.project.client {
            layout.push(Break::new(2.0));
            layout.push(Paragraph::new(format!("Prepared for {client}")).styled(theme.subheading()));
        }
        layout.push(Break::new(3.0));
        layout.push(
            Paragraph::new(format!(
                "Anticipated final cost {}",
                self.money.format(self.summary.grand.anticipated_final)
            ))
            .styled(theme.value(Tone::Accent)),
        );
        Ok(layout)
    }

    fn sections(&self) -> Vec<SectionSpec> {
        self.section_kinds()
            .into_iter()
            .map(|kind| SectionSpec::new(kind.title()))
            .collect()
    }

    fn build_section(&self, index: usize, theme: &Theme) -> ReportResult<LinearLayout> {
        let kind = self
            .section_kinds()
            .get(index)
            .copied()
            .ok_or_else(|| ReportError::layout(format!("no cost report section at index {index}")))?;
        match kind {
            CostSection::ExecutiveSummary => self.executive_summary(theme),
            CostSection::CategoryBreakdown => self.category_breakdown(theme),
            CostSection::ProjectInformation => self.project_information(theme),
            CostSection::LineItems => self.line_items(theme),
            CostSection::Variations => self.variations(theme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineItem, VariationKind, VariationLine};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn report() -> CostReport {
        CostReport {
            id: "r".into(),
            report_number: 7,
            revision: "C".into(),
            categories: vec![Category::new("A", "Electrical")
                .with_item(LineItem::new("A1", "Cabling", dec!(100)).with_anticipated(dec!(120)))],
            ..CostReport::default()
        }
    }

    #[test]
    fn variations_section_only_when_present() {
        let mut report = report();
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        let titles: Vec<_> = document.sections().iter().map(|s| s.title().to_string()).collect();
        assert_eq!(
            titles,
            ["Executive Summary", "Category Breakdown", "Project Information", "Detailed Line Items"]
        );

        report.variations.push(
            Variation::new("VO-1", "Extra", VariationKind::Debit)
                .with_line(VariationLine::amount("x", dec!(5))),
        );
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        assert_eq!(document.sections().len(), 5);
        assert_eq!(document.section_kinds().last(), Some(&CostSection::Variations));
    }

    #[test]
    fn line_item_tables_match_their_columns() {
        let report = report();
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        let theme = Theme::default();
        let table = document.line_item_table(&theme, &report.categories[0], &document.summary().categories[0]);
        assert!(table.validate().is_ok());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn variation_tables_match_their_columns() {
        let variation = Variation::new("VO-2", "Omit", VariationKind::Credit)
            .with_line(VariationLine::amount("a", dec!(10)));
        let report = CostReport {
            variations: vec![variation.clone()],
            ..report()
        };
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        assert!(document.variation_table(&variation).validate().is_ok());
        assert_eq!(document.summary().variations.net(), dec!(-10));
    }

    #[test]
    fn overflowing_reports_cannot_be_composed() {
        let mut report = report();
        report.categories[0]
            .line_items
            .push(LineItem::new("A2", "Feeders", dec!(1)).with_measure(Decimal::MAX, "m", dec!(3)));
        let err = CostReportDocument::new(&report, CompanySettings::default())
            .err()
            .expect("overflow is reported");
        assert!(matches!(err, ReportError::Amount(_)));
    }

    #[test]
    fn out_of_range_sections_are_layout_errors() {
        let report = report();
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        let err = document.build_section(42, &Theme::default()).err().expect("section 42 is out of range");
        assert!(matches!(err, ReportError::Layout(_)));
    }

    #[test]
    fn title_names_project_and_report() {
        let mut report = report();
        report.project.name = "Harbour Mall".into();
        let document = CostReportDocument::new(&report, CompanySettings::default()).unwrap();
        assert_eq!(document.title(), "Harbour Mall - Cost Report No. 7");
    }
}
