//! Cable schedules: per-cable electrical checks, costing and schedule totals.

pub mod report;
pub mod sizing;

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::model::{parse_json, read_json_file, ProjectInfo};

pub use report::CableScheduleDocument;
pub use sizing::{
    conductor_for, derated_rating, recommend_size, voltage_drop_percent, voltage_drop_v, Circuit,
    ConductorSize, DeratingFactors, Phase, COPPER_PVC,
};

/// One cable run in a schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CableEntry {
    /// Cable tag, e.g. `C-01`.
    pub tag: String,
    /// Supplying board.
    #[serde(default)]
    pub from: String,
    /// Load or downstream board.
    #[serde(default)]
    pub to: String,
    /// Conductor cross-section in mm².
    pub size_mm2: f64,
    /// Number of cores.
    #[serde(default = "default_cores")]
    pub cores: u8,
    /// Route length in m.
    pub length_m: f64,
    /// Design load current in A.
    pub load_current_a: f64,
    /// Supply voltage in V.
    pub voltage_v: f64,
    /// Supply configuration.
    #[serde(default)]
    pub phase: Phase,
    /// Installation method description.
    #[serde(default)]
    pub installation: Option<String>,
    /// Rating correction factors.
    #[serde(default)]
    pub derating: DeratingFactors,
    /// Supply cost per metre.
    #[serde(default)]
    pub supply_rate: Decimal,
    /// Installation cost per metre.
    #[serde(default)]
    pub install_rate: Decimal,
    /// Cost of both terminations.
    #[serde(default)]
    pub termination_cost: Decimal,
}

fn default_cores() -> u8 {
    4
}

/// Outcome of checking a cable against its load and the voltage drop limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compliance {
    /// Rating and voltage drop are within limits.
    Compliant,
    /// Derated rating is below the load current.
    Overloaded,
    /// Voltage drop exceeds the limit.
    ExcessiveDrop,
    /// Size is not in the conductor table.
    UnknownSize,
    /// Voltage or length is not positive, or the load is negative.
    InvalidInput,
}

impl Compliance {
    /// Table label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Compliant => "OK",
            Self::Overloaded => "Overloaded",
            Self::ExcessiveDrop => "Volt drop",
            Self::UnknownSize => "Unknown size",
            Self::InvalidInput => "Invalid input",
        }
    }
}

/// Electrical figures for one cable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CableAssessment {
    /// Voltage drop in V.
    pub voltage_drop_v: f64,
    /// Voltage drop in percent of the supply voltage.
    pub voltage_drop_percent: f64,
    /// Derated current rating in A.
    pub derated_rating_a: f64,
    /// Overall result.
    pub compliance: Compliance,
}

impl CableAssessment {
    /// Whether the cable passes every check.
    pub fn is_compliant(&self) -> bool {
        self.compliance == Compliance::Compliant
    }
}

/// Cost split of one cable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CableCost {
    /// Supply rate times length.
    pub supply: Decimal,
    /// Installation rate times length.
    pub installation: Decimal,
    /// Termination cost.
    pub terminations: Decimal,
}

impl CableCost {
    /// Sum of all parts.
    pub fn total(&self) -> Decimal {
        self.supply
            .saturating_add(self.installation)
            .saturating_add(self.terminations)
    }
}

impl CableEntry {
    /// Circuit parameters of the run.
    pub fn circuit(&self) -> Circuit {
        Circuit {
            load_current_a: self.load_current_a,
            length_m: self.length_m,
            voltage_v: self.voltage_v,
            phase: self.phase,
        }
    }

    /// Checks the cable against its load and `max_drop_percent`.
    ///
    /// Invalid circuit parameters are flagged before the size is looked up.
    pub fn assess(&self, max_drop_percent: f64) -> CableAssessment {
        let failed = |compliance| CableAssessment {
            voltage_drop_v: 0.0,
            voltage_drop_percent: 0.0,
            derated_rating_a: 0.0,
            compliance,
        };
        let circuit = self.circuit();
        if !circuit.is_valid() {
            return failed(Compliance::InvalidInput);
        }
        let Some(conductor) = conductor_for(self.size_mm2) else {
            return failed(Compliance::UnknownSize);
        };

        let drop = voltage_drop_v(
            self.phase,
            self.load_current_a,
            self.length_m,
            conductor.resistance_ohm_per_km,
        );
        let Some(percent) = voltage_drop_percent(drop, self.voltage_v) else {
            return failed(Compliance::InvalidInput);
        };
        let rating = derated_rating(conductor, &self.derating);
        let compliance = if rating < self.load_current_a {
            Compliance::Overloaded
        } else if percent > max_drop_percent {
            Compliance::ExcessiveDrop
        } else {
            Compliance::Compliant
        };

        CableAssessment {
            voltage_drop_v: drop,
            voltage_drop_percent: percent,
            derated_rating_a: rating,
            compliance,
        }
    }

    /// Smallest conductor that would satisfy the load and drop limit for this run.
    pub fn recommended_size(&self, max_drop_percent: f64) -> Option<&'static ConductorSize> {
        recommend_size(&self.circuit(), max_drop_percent, &self.derating)
    }

    /// Supply, installation and termination cost; invalid lengths count as zero metres.
    pub fn cost(&self) -> CableCost {
        let length = length_decimal(self.length_m);
        CableCost {
            supply: self.supply_rate.saturating_mul(length).round_dp(2),
            installation: self.install_rate.saturating_mul(length).round_dp(2),
            terminations: self.termination_cost,
        }
    }
}

fn length_decimal(length_m: f64) -> Decimal {
    if !length_m.is_finite() || length_m <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::try_from(length_m).unwrap_or_default().round_dp(3)
}

/// A project's cable schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CableSchedule {
    /// Schedule id.
    pub id: String,
    /// Owning project.
    pub project: ProjectInfo,
    /// Schedule name, e.g. `Main distribution`.
    #[serde(default)]
    pub name: String,
    /// Schedule number used in file names.
    #[serde(default)]
    pub schedule_number: u32,
    /// Revision label.
    #[serde(default)]
    pub revision: String,
    /// Issue date.
    pub schedule_date: NaiveDate,
    /// Cable runs in display order.
    #[serde(default)]
    pub cables: Vec<CableEntry>,
}

impl CableSchedule {
    /// Reads a schedule from a JSON file.
    ///
    /// Cables with a non-positive voltage or length, or a negative load, are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();
        read_json_file::<Self>(path)?.checked(path)
    }

    /// Parses a schedule from JSON text.
    pub fn from_json_str(text: &str) -> ReportResult<Self> {
        parse_json::<Self>(text, Path::new(""))?.checked(Path::new(""))
    }

    fn checked(self, path: &Path) -> ReportResult<Self> {
        match self.cables.iter().find(|cable| !cable.circuit().is_valid()) {
            Some(cable) => Err(ReportError::Input {
                path: path.to_path_buf(),
                message: format!(
                    "cable {} needs a positive voltage and length and a non-negative load",
                    cable.tag
                ),
            }),
            None => Ok(self),
        }
    }

    /// Human readable title.
    pub fn title(&self) -> String {
        if self.name.trim().is_empty() {
            "Cable Schedule".to_string()
        } else {
            format!("Cable Schedule - {}", self.name.trim())
        }
    }

    /// Revision label with a fallback for unrevised schedules.
    pub fn revision_label(&self) -> &str {
        match self.revision.trim() {
            "" => "0",
            revision => revision,
        }
    }
}

/// Totals for one conductor size.
#[derive(Clone, Debug, PartialEq)]
pub struct SizeTotals {
    /// Conductor size in mm².
    pub size_mm2: f64,
    /// Number of cables.
    pub count: usize,
    /// Combined length in m.
    pub length_m: f64,
    /// Combined cost.
    pub cost: CableCost,
}

/// Schedule-wide totals and checks.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleSummary {
    /// Number of cables.
    pub cable_count: usize,
    /// Combined length in m.
    pub total_length_m: f64,
    /// Combined cost.
    pub total_cost: CableCost,
    /// Per-size totals, smallest size first.
    pub by_size: Vec<SizeTotals>,
    /// Assessment per cable, in schedule order.
    pub assessments: Vec<CableAssessment>,
    /// Largest voltage drop in percent.
    pub worst_drop_percent: f64,
    /// Tags of cables failing a check.
    pub non_compliant: Vec<String>,
}

impl ScheduleSummary {
    /// Assesses and totals every cable in `schedule`.
    pub fn from_schedule(schedule: &CableSchedule, max_drop_percent: f64) -> Self {
        let mut summary = Self {
            cable_count: schedule.cables.len(),
            total_length_m: 0.0,
            total_cost: CableCost::default(),
            by_size: Vec::new(),
            assessments: Vec::with_capacity(schedule.cables.len()),
            worst_drop_percent: 0.0,
            non_compliant: Vec::new(),
        };

        for cable in &schedule.cables {
            let assessment = cable.assess(max_drop_percent);
            let cost = cable.cost();

            summary.total_length_m += cable.length_m;
            add_cost(&mut summary.total_cost, &cost);
            summary.worst_drop_percent = summary.worst_drop_percent.max(assessment.voltage_drop_percent);
            if !assessment.is_compliant() {
                summary.non_compliant.push(cable.tag.clone());
            }
            summary.assessments.push(assessment);

            match summary
                .by_size
                .iter_mut()
                .find(|totals| (totals.size_mm2 - cable.size_mm2).abs() < 1e-9)
            {
                Some(totals) => {
                    totals.count += 1;
                    totals.length_m += cable.length_m;
                    add_cost(&mut totals.cost, &cost);
                }
                None => summary.by_size.push(SizeTotals {
                    size_mm2: cable.size_mm2,
                    count: 1,
                    length_m: cable.length_m,
                    cost,
                }),
            }
        }

        summary
            .by_size
            .sort_by(|a, b| a.size_mm2.total_cmp(&b.size_mm2));
        summary
    }
}

fn add_cost(total: &mut CableCost, cost: &CableCost) {
    total.supply = total.supply.saturating_add(cost.supply);
    total.installation = total.installation.saturating_add(cost.installation);
    total.terminations = total.terminations.saturating_add(cost.terminations);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cable(tag: &str, size: f64, length: f64, load: f64) -> CableEntry {
        CableEntry {
            tag: tag.into(),
            from: "MDB".into(),
            to: "DB-1".into(),
            size_mm2: size,
            cores: 4,
            length_m: length,
            load_current_a: load,
            voltage_v: 400.0,
            phase: Phase::Three,
            supply_rate: dec!(85.50),
            install_rate: dec!(20),
            termination_cost: dec!(350),
            ..CableEntry::default()
        }
    }

    #[test]
    fn assessment_flags_overload_before_drop() {
        assert_eq!(cable("A", 16.0, 50.0, 60.0).assess(5.0).compliance, Compliance::Compliant);
        assert_eq!(cable("B", 2.5, 50.0, 60.0).assess(5.0).compliance, Compliance::Overloaded);
        assert_eq!(cable("C", 6.0, 200.0, 40.0).assess(5.0).compliance, Compliance::ExcessiveDrop);
        assert_eq!(cable("D", 7.0, 10.0, 1.0).assess(5.0).compliance, Compliance::UnknownSize);
    }

    #[test]
    fn invalid_circuits_are_flagged() {
        let mut dead = cable("E", 16.0, 50.0, 60.0);
        dead.voltage_v = 0.0;
        let assessment = dead.assess(5.0);
        assert_eq!(assessment.compliance, Compliance::InvalidInput);
        assert!(!assessment.is_compliant());
        assert!(dead.recommended_size(5.0).is_none());

        let mut reversed = cable("F", 7.0, -10.0, 1.0);
        assert_eq!(reversed.assess(5.0).compliance, Compliance::InvalidInput);
        assert_eq!(reversed.cost().supply, Decimal::ZERO);
        reversed.length_m = 10.0;
        assert_eq!(reversed.assess(5.0).compliance, Compliance::UnknownSize);

        let schedule = CableSchedule {
            cables: vec![cable("C1", 16.0, 10.0, 30.0), dead],
            ..CableSchedule::default()
        };
        let summary = ScheduleSummary::from_schedule(&schedule, 5.0);
        assert_eq!(summary.non_compliant, vec!["E".to_string()]);
    }

    #[test]
    fn schedules_with_invalid_cables_are_rejected_on_load() {
        let err = CableSchedule::from_json_str(
            r#"{
                "id": "cs-2",
                "project": { "id": "p1", "name": "Harbour Mall" },
                "schedule_date": "2026-10-17",
                "cables": [
                    { "tag": "C7", "size_mm2": 10, "length_m": 12,
                      "load_current_a": 32, "voltage_v": -230 }
                ]
            }"#,
        )
        .unwrap_err();
        match err {
            ReportError::Input { message, .. } => assert!(message.contains("C7"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cost_scales_with_length() {
        let cost = cable("A", 16.0, 12.5, 10.0).cost();
        assert_eq!(cost.supply, dec!(1068.75));
        assert_eq!(cost.installation, dec!(250));
        assert_eq!(cost.total(), dec!(1668.75));
    }

    #[test]
    fn summary_groups_by_size() {
        let schedule = CableSchedule {
            cables: vec![
                cable("C1", 16.0, 10.0, 30.0),
                cable("C2", 4.0, 20.0, 20.0),
                cable("C3", 16.0, 30.0, 200.0),
            ],
            ..CableSchedule::default()
        };
        let summary = ScheduleSummary::from_schedule(&schedule, 5.0);

        assert_eq!(summary.cable_count, 3);
        assert!((summary.total_length_m - 60.0).abs() < 1e-9);
        assert_eq!(summary.by_size.len(), 2);
        assert_eq!(summary.by_size[0].size_mm2, 4.0);
        assert_eq!(summary.by_size[1].count, 2);
        assert_eq!(summary.non_compliant, vec!["C3".to_string()]);

        let per_size: Decimal = summary.by_size.iter().map(|s| s.cost.total()).sum();
        assert_eq!(per_size, summary.total_cost.total());
    }

    #[test]
    fn schedule_titles() {
        let mut schedule = CableSchedule::default();
        assert_eq!(schedule.title(), "Cable Schedule");
        assert_eq!(schedule.revision_label(), "0");
        schedule.name = "Main distribution".into();
        assert_eq!(schedule.title(), "Cable Schedule - Main distribution");
    }

    #[test]
    fn schedules_parse_with_defaults() {
        let schedule: CableSchedule = serde_json::from_str(
            r#"{
                "id": "cs-1",
                "project": { "id": "p1", "name": "Harbour Mall" },
                "schedule_date": "2026-10-17",
                "cables": [
                    { "tag": "C1", "size_mm2": 10, "length_m": 35.5,
                      "load_current_a": 32, "voltage_v": 230, "phase": "single",
                      "supply_rate": "45.10" }
                ]
            }"#,
        )
        .expect("parse schedule");
        let cable = &schedule.cables[0];
        assert_eq!(cable.cores, 4);
        assert_eq!(cable.phase, Phase::Single);
        assert_eq!(cable.derating, DeratingFactors::default());
        assert_eq!(cable.supply_rate, dec!(45.10));
    }
}
