//! Totals derived from a [`CostReport`].
//!
//! Every figure printed in the executive summary, the category grid and the detailed tables is
//! computed here once, so the PDF never sums anything on its own.

use rust_decimal::Decimal;

use crate::error::{ReportError, ReportResult};
use crate::model::{Category, CostReport, VariationKind};

/// Money columns shared by categories and the grand total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of original budgets.
    pub original_budget: Decimal,
    /// Sum of previous report amounts.
    pub previous_report: Decimal,
    /// Sum of anticipated finals.
    pub anticipated_final: Decimal,
}

impl Totals {
    /// Anticipated final minus original budget.
    pub fn variance(&self) -> Decimal {
        self.anticipated_final.saturating_sub(self.original_budget)
    }

    /// Anticipated final minus previous report.
    pub fn movement(&self) -> Decimal {
        self.anticipated_final.saturating_sub(self.previous_report)
    }

    /// Variance as a percentage of the original budget, `None` for a zero budget.
    pub fn variance_percent(&self) -> Option<Decimal> {
        if self.original_budget.is_zero() {
            return None;
        }
        self.variance()
            .checked_div(self.original_budget)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    fn checked_add(&self, other: &Totals) -> Option<Totals> {
        Some(Totals {
            original_budget: self.original_budget.checked_add(other.original_budget)?,
            previous_report: self.previous_report.checked_add(other.previous_report)?,
            anticipated_final: self.anticipated_final.checked_add(other.anticipated_final)?,
        })
    }

    /// Fails when variance or movement would not fit.
    fn ensure_differences(&self, context: impl FnOnce() -> String) -> ReportResult<()> {
        let variance = self.anticipated_final.checked_sub(self.original_budget);
        let movement = self.anticipated_final.checked_sub(self.previous_report);
        match (variance, movement) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(ReportError::amount(context())),
        }
    }
}

/// Aggregated figures for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotals {
    /// Category code.
    pub code: String,
    /// Category name.
    pub name: String,
    /// Money totals.
    pub totals: Totals,
    /// Number of line items.
    pub item_count: usize,
    /// Number of Prime Cost allowances.
    pub pc_item_count: usize,
}

impl CategoryTotals {
    /// Sums the line items of `category`.
    ///
    /// Fails with [`ReportError::Amount`] when a row or a sum does not fit in a `Decimal`.
    pub fn from_category(category: &Category) -> ReportResult<Self> {
        let mut totals = Totals::default();
        let mut pc_item_count = 0;
        for item in &category.line_items {
            let context = || format!("line item {} of category {}", item.code, category.code);
            let row = Totals {
                original_budget: item.original_budget,
                previous_report: item.previous_report,
                anticipated_final: item
                    .checked_anticipated_final()
                    .ok_or_else(|| ReportError::amount(context()))?,
            };
            row.ensure_differences(context)?;
            totals = totals
                .checked_add(&row)
                .ok_or_else(|| ReportError::amount(format!("category {} totals", category.code)))?;
            if item.pc_item {
                pc_item_count += 1;
            }
        }
        totals.ensure_differences(|| format!("category {} totals", category.code))?;

        Ok(Self {
            code: category.code.clone(),
            name: category.name.clone(),
            totals,
            item_count: category.line_items.len(),
            pc_item_count,
        })
    }

    /// Anticipated final minus original budget.
    pub fn variance(&self) -> Decimal {
        self.totals.variance()
    }

    /// Display label combining code and name.
    pub fn label(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.code, self.name)
        }
    }
}

/// Credit/debit totals over all variations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariationSummary {
    /// Number of variations.
    pub count: usize,
    /// Sum of credit magnitudes (positive number).
    pub credits: Decimal,
    /// Sum of debit magnitudes.
    pub debits: Decimal,
}

impl VariationSummary {
    /// Debits minus credits.
    pub fn net(&self) -> Decimal {
        self.debits.saturating_sub(self.credits)
    }
}

/// Everything the report pages print, computed in one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
    /// Per-category totals in input order.
    pub categories: Vec<CategoryTotals>,
    /// Sum over all categories.
    pub grand: Totals,
    /// Variation totals.
    pub variations: VariationSummary,
}

impl ReportSummary {
    /// Aggregates `report` with checked arithmetic.
    ///
    /// Once this succeeds every figure the report prints is exact, so the saturating accessors
    /// on the model never clip.
    pub fn from_report(report: &CostReport) -> ReportResult<Self> {
        let categories = report
            .categories
            .iter()
            .map(CategoryTotals::from_category)
            .collect::<ReportResult<Vec<_>>>()?;

        let mut grand = Totals::default();
        for category in &categories {
            grand = grand
                .checked_add(&category.totals)
                .ok_or_else(|| ReportError::amount("grand totals"))?;
        }
        grand.ensure_differences(|| "grand totals".to_string())?;

        let mut variations = VariationSummary::default();
        for variation in &report.variations {
            let context = || format!("variation {}", variation.code);
            let magnitude = variation
                .checked_magnitude()
                .ok_or_else(|| ReportError::amount(context()))?;
            let bucket = match variation.kind {
                VariationKind::Credit => &mut variations.credits,
                VariationKind::Debit => &mut variations.debits,
            };
            *bucket = bucket
                .checked_add(magnitude)
                .ok_or_else(|| ReportError::amount(context()))?;
            variations.count += 1;
        }
        variations
            .debits
            .checked_sub(variations.credits)
            .ok_or_else(|| ReportError::amount("net variations"))?;

        Ok(Self {
            categories,
            grand,
            variations,
        })
    }

    /// Share of the grand anticipated final held by `category`, in percent.
    pub fn share_of_total(&self, category: &CategoryTotals) -> Option<Decimal> {
        if self.grand.anticipated_final.is_zero() {
            return None;
        }
        category
            .totals
            .anticipated_final
            .checked_div(self.grand.anticipated_final)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    /// Number of categories projected to finish over budget.
    pub fn categories_over_budget(&self) -> usize {
        self.categories
            .iter()
            .filter(|category| category.variance() > Decimal::ZERO)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineItem, Variation, VariationLine};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sample_report() -> CostReport {
        CostReport {
            id: "r1".into(),
            report_number: 3,
            categories: vec![
                Category::new("A", "Electrical")
                    .with_item(LineItem::new("A1", "Cabling", dec!(1000)).with_anticipated(dec!(1250)))
                    .with_item(LineItem::new("A2", "Lighting", dec!(500)).pc()),
                Category::new("B", "Mechanical").with_item(
                    LineItem::new("B1", "HVAC", dec!(2000))
                        .with_previous(dec!(2100))
                        .with_anticipated(dec!(1800)),
                ),
            ],
            variations: vec![
                Variation::new("VO-1", "Omit", VariationKind::Credit)
                    .with_line(VariationLine::amount("x", dec!(100))),
                Variation::new("VO-2", "Add", VariationKind::Debit)
                    .with_line(VariationLine::amount("y", dec!(350))),
            ],
            ..CostReport::default()
        }
    }

    #[test]
    fn category_totals_sum_line_items() {
        let summary = ReportSummary::from_report(&sample_report()).unwrap();
        let electrical = &summary.categories[0];
        assert_eq!(electrical.totals.original_budget, dec!(1500));
        assert_eq!(electrical.totals.anticipated_final, dec!(1250));
        assert_eq!(electrical.variance(), dec!(-250));
        assert_eq!(electrical.pc_item_count, 1);
        assert_eq!(electrical.label(), "A - Electrical");

        let mechanical = &summary.categories[1];
        assert_eq!(mechanical.totals.movement(), dec!(-300));
    }

    #[test]
    fn grand_totals_and_variations() {
        let summary = ReportSummary::from_report(&sample_report()).unwrap();
        assert_eq!(summary.grand.original_budget, dec!(3500));
        assert_eq!(summary.grand.anticipated_final, dec!(3050));
        assert_eq!(summary.variations.count, 2);
        assert_eq!(summary.variations.credits, dec!(100));
        assert_eq!(summary.variations.net(), dec!(250));
        assert_eq!(summary.categories_over_budget(), 0);
    }

    #[test]
    fn percentages_guard_against_zero() {
        let totals = Totals::default();
        assert_eq!(totals.variance_percent(), None);

        let summary = ReportSummary::from_report(&CostReport::default()).unwrap();
        assert!(summary.categories.is_empty());
        assert_eq!(summary.grand, Totals::default());

        let budget = Totals {
            original_budget: dec!(200),
            previous_report: dec!(200),
            anticipated_final: dec!(250),
        };
        assert_eq!(budget.variance_percent(), Some(dec!(25)));
    }

    #[test]
    fn overflowing_amounts_are_errors_not_panics() {
        let measured = CostReport {
            categories: vec![Category::new("A", "Electrical").with_item(
                LineItem::new("A1", "Feeders", dec!(10))
                    .with_measure(dec!(100000000000000), "m", dec!(1000000000000000)),
            )],
            ..CostReport::default()
        };
        let err = ReportSummary::from_report(&measured).unwrap_err();
        assert!(matches!(err, ReportError::Amount(ref context) if context.contains("A1")));

        let summed = CostReport {
            categories: vec![Category::new("B", "Mechanical")
                .with_item(LineItem::new("B1", "Plant", Decimal::MAX))
                .with_item(LineItem::new("B2", "Plant", Decimal::MAX))],
            ..CostReport::default()
        };
        assert!(matches!(
            ReportSummary::from_report(&summed),
            Err(ReportError::Amount(_))
        ));

        let variations = CostReport {
            variations: vec![
                Variation::new("VO-1", "Add", VariationKind::Debit)
                    .with_line(VariationLine::amount("a", Decimal::MAX))
                    .with_line(VariationLine::amount("b", Decimal::MAX)),
            ],
            ..CostReport::default()
        };
        assert!(matches!(
            ReportSummary::from_report(&variations),
            Err(ReportError::Amount(ref context)) if context == "variation VO-1"
        ));
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (-1_000_000_00i64..1_000_000_00i64).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn line_item() -> impl Strategy<Value = LineItem> {
        (amount(), amount(), proptest::option::of(amount())).prop_map(
            |(budget, previous, anticipated)| LineItem {
                original_budget: budget,
                previous_report: previous,
                anticipated_final: anticipated,
                ..LineItem::default()
            },
        )
    }

    fn report() -> impl Strategy<Value = CostReport> {
        proptest::collection::vec(proptest::collection::vec(line_item(), 0..6), 0..6).prop_map(
            |groups| CostReport {
                categories: groups
                    .into_iter()
                    .enumerate()
                    .map(|(index, items)| Category {
                        code: index.to_string(),
                        line_items: items,
                        ..Category::default()
                    })
                    .collect(),
                ..CostReport::default()
            },
        )
    }

    proptest! {
        #[test]
        fn variance_is_anticipated_minus_original(report in report()) {
            let summary = ReportSummary::from_report(&report).unwrap();
            for category in &summary.categories {
                prop_assert_eq!(
                    category.totals.anticipated_final - category.totals.original_budget,
                    category.variance()
                );
            }
        }

        #[test]
        fn grand_total_is_sum_of_categories(report in report()) {
            let summary = ReportSummary::from_report(&report).unwrap();
            let original: Decimal = summary.categories.iter().map(|c| c.totals.original_budget).sum();
            let previous: Decimal = summary.categories.iter().map(|c| c.totals.previous_report).sum();
            let anticipated: Decimal = summary.categories.iter().map(|c| c.totals.anticipated_final).sum();
            prop_assert_eq!(summary.grand.original_budget, original);
            prop_assert_eq!(summary.grand.previous_report, previous);
            prop_assert_eq!(summary.grand.anticipated_final, anticipated);
        }
    }
}
