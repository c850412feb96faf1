//! Cable schedule layout.

use genpdf::elements::{Break, LinearLayout, Paragraph};
use genpdf::{Alignment, Element};

use super::{CableSchedule, ScheduleSummary};
use crate::compose::{DocumentSource, SectionSpec};
use crate::config::CompanySettings;
use crate::error::{ReportError, ReportResult};
use crate::layout::logo::logo_from_path;
use crate::layout::{grid, heading, metric_card, Column, Row, TableSpec, Theme, Tone};
use crate::money::MoneyFormat;

const SECTION_TITLES: [&str; 3] = ["Schedule Summary", "Cable Schedule", "Cost Breakdown"];

/// [`DocumentSource`] for a [`CableSchedule`].
pub struct CableScheduleDocument<'a> {
    schedule: &'a CableSchedule,
    summary: ScheduleSummary,
    max_drop_percent: f64,
    company: CompanySettings,
    money: MoneyFormat,
}

impl<'a> CableScheduleDocument<'a> {
    /// Assesses every cable against `max_drop_percent` and prepares the schedule for rendering.
    pub fn new(schedule: &'a CableSchedule, company: CompanySettings, max_drop_percent: f64) -> Self {
        let money = company.money_format();
        Self {
            schedule,
            summary: ScheduleSummary::from_schedule(schedule, max_drop_percent),
            max_drop_percent,
            company,
            money,
        }
    }

    /// Totals printed by the document.
    pub fn summary(&self) -> &ScheduleSummary {
        &self.summary
    }

    fn schedule_summary(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let summary = &self.summary;
        let failing = summary.non_compliant.len();
        let mut layout = heading(theme, SECTION_TITLES[0]);

        let cards = vec![
            metric_card(
                theme,
                "Cables",
                summary.cable_count.to_string(),
                Some(format!("{} sizes", summary.by_size.len())),
                Tone::Neutral,
            ),
            metric_card(
                theme,
                "Total length",
                format!("{:.1} m", summary.total_length_m),
                None,
                Tone::Neutral,
            ),
            metric_card(
                theme,
                "Total cost",
                self.money.format(summary.total_cost.total()),
                Some(format!(
                    "supply {}, installation {}",
                    self.money.format(summary.total_cost.supply),
                    self.money.format(summary.total_cost.installation)
                )),
                Tone::Accent,
            ),
            metric_card(
                theme,
                "Compliance",
                format!("{} of {} OK", summary.cable_count - failing, summary.cable_count),
                Some(format!(
                    "worst volt drop {:.2}% (limit {:.1}%)",
                    summary.worst_drop_percent, self.max_drop_percent
                )),
                if failing == 0 { Tone::Positive } else { Tone::Negative },
            ),
        ];
        layout.push(grid(cards, 2)?);

        if failing > 0 {
            layout.push(Break::new(1.0));
            layout.push(
                Paragraph::new(format!("Non-compliant cables: {}", summary.non_compliant.join(", ")))
                    .styled(theme.small().with_color(theme.negative)),
            );
        }
        Ok(layout)
    }

    fn cable_table(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let mut layout = heading(theme, SECTION_TITLES[1]);
        let mut table = TableSpec::new(vec![
            Column::text("Tag", 2),
            Column::text("From", 2),
            Column::text("To", 2),
            Column::figure("Size", 2),
            Column::figure("Length", 2),
            Column::figure("Load", 2),
            Column::figure("Rating", 2),
            Column::figure("Vd %", 2),
            Column::centered("Status", 2),
            Column::text("Suggested", 2),
        ]);

        for (cable, assessment) in self.schedule.cables.iter().zip(&self.summary.assessments) {
            let status_tone = if assessment.is_compliant() {
                Tone::Positive
            } else {
                Tone::Negative
            };
            let suggested = if assessment.is_compliant() {
                String::new()
            } else {
                cable
                    .recommended_size(self.max_drop_percent)
                    .map(|conductor| format!("{} mm²", conductor.size_mm2))
                    .unwrap_or_else(|| "none".to_string())
            };
            table.push_row(
                Row::default()
                    .cell(cable.tag.clone())
                    .cell(cable.from.clone())
                    .cell(cable.to.clone())
                    .cell(format!("{}c {} mm²", cable.cores, cable.size_mm2))
                    .cell(format!("{:.1} m", cable.length_m))
                    .cell(format!("{:.1} A {}", cable.load_current_a, cable.phase.label()))
                    .cell(format!("{:.1} A", assessment.derated_rating_a))
                    .cell(format!("{:.2}", assessment.voltage_drop_percent))
                    .styled_cell(
                        assessment.compliance.label(),
                        theme.small().with_color(theme.color(status_tone)),
                    )
                    .cell(suggested),
            );
        }
        if self.schedule.cables.is_empty() {
            layout.push(Paragraph::new("No cables have been scheduled.").styled(theme.label()));
        } else {
            layout.push(table.build(theme)?);
        }
        Ok(layout)
    }

    fn cost_breakdown(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let mut layout = heading(theme, SECTION_TITLES[2]);
        let mut table = TableSpec::new(vec![
            Column::text("Size", 2),
            Column::figure("Cables", 1),
            Column::figure("Length", 2),
            Column::figure("Supply", 3),
            Column::figure("Installation", 3),
            Column::figure("Terminations", 3),
            Column::figure("Total", 3),
        ]);
        for size in &self.summary.by_size {
            table.push_row(
                Row::default()
                    .cell(format!("{} mm²", size.size_mm2))
                    .cell(size.count.to_string())
                    .cell(format!("{:.1} m", size.length_m))
                    .cell(self.money.format(size.cost.supply))
                    .cell(self.money.format(size.cost.installation))
                    .cell(self.money.format(size.cost.terminations))
                    .cell(self.money.format(size.cost.total())),
            );
        }
        let total = &self.summary.total_cost;
        let table = table.with_footer(Row::new([
            "Total".to_string(),
            self.summary.cable_count.to_string(),
            format!("{:.1} m", self.summary.total_length_m),
            self.money.format(total.supply),
            self.money.format(total.installation),
            self.money.format(total.terminations),
            self.money.format(total.total()),
        ]));
        layout.push(table.build(theme)?);
        Ok(layout)
    }
}

impl DocumentSource for CableScheduleDocument<'_> {
    fn title(&self) -> String {
        format!("{} - {}", self.schedule.project.name, self.schedule.title())
    }

    fn cover(&self, theme: &Theme) -> ReportResult<LinearLayout> {
        let schedule = self.schedule;
        let mut layout = LinearLayout::vertical();
        if let Some(path) = &self.company.logo {
            layout.push(logo_from_path(path, self.company.logo_width_mm, Alignment::Left)?);
            layout.push(Break::new(2.0));
        } else {
            layout.push(Break::new(6.0));
        }
        layout.push(Paragraph::new(self.company.name.clone()).styled(theme.label()));
        layout.push(Break::new(4.0));
        layout.push(Paragraph::new(schedule.project.name.clone()).styled(theme.title()));
        layout.push(Paragraph::new(schedule.title()).styled(theme.heading()));
        layout.push(Break::new(1.0));
        layout.push(Paragraph::new(format!("Revision {}", schedule.revision_label())));
        layout.push(Paragraph::new(schedule.schedule_date.format("%d %B %Y").to_string()));
        Ok(layout)
    }

    fn sections(&self) -> Vec<SectionSpec> {
        SECTION_TITLES.iter().map(|title| SectionSpec::new(*title)).collect()
    }

    fn build_section(&self, index: usize, theme: &Theme) -> ReportResult<LinearLayout> {
        match index {
            0 => self.schedule_summary(theme),
            1 => self.cable_table(theme),
            2 => self.cost_breakdown(theme),
            _ => Err(ReportError::layout(format!("no cable schedule section at index {index}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_fixed() {
        let schedule = CableSchedule::default();
        let document = CableScheduleDocument::new(&schedule, CompanySettings::default(), 5.0);
        let titles: Vec<_> = document.sections().iter().map(|s| s.title().to_string()).collect();
        assert_eq!(titles, SECTION_TITLES);
        assert!(document.build_section(3, &Theme::default()).is_err());
    }
}
