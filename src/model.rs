//! Data structures describing a cost report.
//!
//! The types mirror the rows the back office keeps for a report (project, categories, line
//! items and variations).  They derive `serde` so an export of those rows can be read straight
//! from JSON, and they never reference the rendering crate so they can be produced or persisted
//! without pulling in `genpdf`.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregate::ReportSummary;
use crate::error::{ReportError, ReportResult};

/// Project the report belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Identifier used as the storage prefix for generated artifacts.
    pub id: String,
    /// Display name of the project.
    pub name: String,
    /// Internal project number.
    #[serde(default)]
    pub number: Option<String>,
    /// Client the report is prepared for.
    #[serde(default)]
    pub client: Option<String>,
    /// Site location.
    #[serde(default)]
    pub location: Option<String>,
    /// Main contractor.
    #[serde(default)]
    pub contractor: Option<String>,
    /// Consulting practice preparing the report.
    #[serde(default)]
    pub prepared_by: Option<String>,
}

impl ProjectInfo {
    /// Returns the populated project fields as label/value pairs in display order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("Project", self.name.clone())];
        let optional = [
            ("Project number", &self.number),
            ("Client", &self.client),
            ("Location", &self.location),
            ("Main contractor", &self.contractor),
            ("Prepared by", &self.prepared_by),
        ];
        for (label, value) in optional {
            if let Some(value) = value.as_ref().filter(|value| !value.trim().is_empty()) {
                fields.push((label, value.clone()));
            }
        }
        fields
    }
}

/// A single priced row within a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Bill reference, e.g. `A1.3`.
    pub code: String,
    /// Description of the work.
    pub description: String,
    /// Measured quantity.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Unit of measure for `quantity`.
    #[serde(default)]
    pub unit: Option<String>,
    /// Rate per unit.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Amount allowed in the original budget.
    #[serde(default)]
    pub original_budget: Decimal,
    /// Anticipated final reported in the previous cost report.
    #[serde(default)]
    pub previous_report: Decimal,
    /// Explicit anticipated final; derived from quantity and rate when absent.
    #[serde(default)]
    pub anticipated_final: Option<Decimal>,
    /// Prime Cost allowance for work not yet fully priced.
    #[serde(default)]
    pub pc_item: bool,
}

impl LineItem {
    /// Creates an item with the given budget that is anticipated to finish on budget.
    pub fn new(code: impl Into<String>, description: impl Into<String>, budget: Decimal) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            original_budget: budget,
            previous_report: budget,
            ..Self::default()
        }
    }

    /// Sets the previous report amount and returns the updated item.
    pub fn with_previous(mut self, previous: Decimal) -> Self {
        self.previous_report = previous;
        self
    }

    /// Sets an explicit anticipated final and returns the updated item.
    pub fn with_anticipated(mut self, anticipated: Decimal) -> Self {
        self.anticipated_final = Some(anticipated);
        self
    }

    /// Sets quantity and rate and returns the updated item.
    pub fn with_measure(mut self, quantity: Decimal, unit: impl Into<String>, rate: Decimal) -> Self {
        self.quantity = Some(quantity);
        self.unit = Some(unit.into());
        self.rate = Some(rate);
        self
    }

    /// Marks the item as a Prime Cost allowance.
    pub fn pc(mut self) -> Self {
        self.pc_item = true;
        self
    }

    /// Anticipated final cost: the explicit value, else `quantity × rate`, else zero.
    ///
    /// `None` when `quantity × rate` overflows.
    pub fn checked_anticipated_final(&self) -> Option<Decimal> {
        if let Some(value) = self.anticipated_final {
            return Some(value);
        }
        match (self.quantity, self.rate) {
            (Some(quantity), Some(rate)) => quantity.checked_mul(rate),
            _ => Some(Decimal::ZERO),
        }
    }

    /// Like [`checked_anticipated_final`](Self::checked_anticipated_final), saturating on
    /// overflow. Reports that passed [`ReportSummary::from_report`] never saturate.
    ///
    /// [`ReportSummary::from_report`]: crate::aggregate::ReportSummary::from_report
    pub fn anticipated_final(&self) -> Decimal {
        self.checked_anticipated_final().unwrap_or_else(|| {
            let quantity = self.quantity.unwrap_or_default();
            quantity.saturating_mul(self.rate.unwrap_or_default())
        })
    }

    /// Difference between the anticipated final and the original budget.
    pub fn variance(&self) -> Decimal {
        self.anticipated_final().saturating_sub(self.original_budget)
    }
}

/// Named cost grouping owning a set of line items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Short code, e.g. `A`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priced rows in display order.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Category {
    /// Creates an empty category.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a line item and returns the updated category.
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }
}

/// Direction of a variation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationKind {
    /// Reduces the contract value.
    Credit,
    /// Increases the contract value.
    #[default]
    Debit,
}

impl VariationKind {
    /// Label used in tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }
}

/// Priced row belonging to a variation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationLine {
    /// Description of the change.
    pub description: String,
    /// Quantity, defaults to one.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Rate per unit.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Explicit amount overriding `quantity × rate`.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl VariationLine {
    /// Creates a line with an explicit amount.
    pub fn amount(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount: Some(amount),
            ..Self::default()
        }
    }

    /// Unsigned amount of the line, `None` when `quantity × rate` overflows.
    pub fn checked_total(&self) -> Option<Decimal> {
        if let Some(amount) = self.amount {
            return Some(amount.abs());
        }
        let quantity = self.quantity.unwrap_or(Decimal::ONE);
        quantity
            .checked_mul(self.rate.unwrap_or(Decimal::ZERO))
            .map(|total| total.abs())
    }

    /// Unsigned amount of the line, saturating on overflow.
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }
}

/// Change order adjusting the contract value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Variation order reference, e.g. `VO-004`.
    pub code: String,
    /// Description of the change.
    pub description: String,
    /// Tenant the variation was raised for, if any.
    #[serde(default)]
    pub tenant: Option<String>,
    /// Credit or debit.
    #[serde(default)]
    pub kind: VariationKind,
    /// Priced rows.
    #[serde(default)]
    pub lines: Vec<VariationLine>,
}

impl Variation {
    /// Creates a variation without lines.
    pub fn new(code: impl Into<String>, description: impl Into<String>, kind: VariationKind) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            kind,
            ..Self::default()
        }
    }

    /// Sets the tenant and returns the updated variation.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Appends a line and returns the updated variation.
    pub fn with_line(mut self, line: VariationLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Unsigned sum of the line amounts, `None` on overflow.
    pub fn checked_magnitude(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.checked_total()?))
    }

    /// Unsigned sum of the line amounts, saturating on overflow.
    pub fn magnitude(&self) -> Decimal {
        self.checked_magnitude().unwrap_or(Decimal::MAX)
    }

    /// Signed total: negative for credits, positive for debits.
    pub fn signed_total(&self) -> Decimal {
        match self.kind {
            VariationKind::Credit => -self.magnitude(),
            VariationKind::Debit => self.magnitude(),
        }
    }
}

/// Complete input for one cost report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostReport {
    /// Identifier of the report row.
    pub id: String,
    /// Project the report belongs to.
    pub project: ProjectInfo,
    /// Sequential report number.
    pub report_number: u32,
    /// Revision label, e.g. `A`.
    #[serde(default)]
    pub revision: String,
    /// Date the report is issued.
    pub report_date: NaiveDate,
    /// Cost categories in display order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Variation orders in display order.
    #[serde(default)]
    pub variations: Vec<Variation>,
    /// Free-text notes printed with the project information.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl CostReport {
    /// Reads a report from a JSON file.
    ///
    /// Reports whose amounts overflow when aggregated are rejected here.
    pub fn from_json_file(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();
        read_json_file::<Self>(path)?.checked(path)
    }

    /// Parses a report from JSON text.
    pub fn from_json_str(text: &str) -> ReportResult<Self> {
        parse_json::<Self>(text, Path::new(""))?.checked(Path::new(""))
    }

    fn checked(self, path: &Path) -> ReportResult<Self> {
        match ReportSummary::from_report(&self) {
            Ok(_) => Ok(self),
            Err(err) => Err(ReportError::Input {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Human readable title, e.g. `Cost Report No. 12`.
    pub fn title(&self) -> String {
        format!("Cost Report No. {}", self.report_number)
    }

    /// Revision label with a fallback for unrevised reports.
    pub fn revision_label(&self) -> &str {
        if self.revision.trim().is_empty() {
            "0"
        } else {
            self.revision.trim()
        }
    }
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> ReportResult<T> {
    let text = fs::read_to_string(path).map_err(|err| ReportError::Input {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    parse_json(&text, path)
}

pub(crate) fn parse_json<T: DeserializeOwned>(text: &str, path: &Path) -> ReportResult<T> {
    serde_json::from_str(text).map_err(|err| ReportError::Input {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
