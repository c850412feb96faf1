//! Conductor data, voltage drop and derating for copper PVC cables.

use serde::{Deserialize, Serialize};

/// Supply configuration of a circuit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Single phase, two conductors carrying the load current.
    Single,
    /// Balanced three phase.
    #[default]
    Three,
}

impl Phase {
    /// Multiplier applied to `I × L × R` for the circuit's voltage drop.
    pub fn drop_factor(self) -> f64 {
        match self {
            Self::Single => 2.0,
            Self::Three => 3f64.sqrt(),
        }
    }

    /// Short label used in tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "1ph",
            Self::Three => "3ph",
        }
    }
}

/// One row of the conductor table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConductorSize {
    /// Nominal cross-section in mm².
    pub size_mm2: f64,
    /// Conductor resistance in Ω/km.
    pub resistance_ohm_per_km: f64,
    /// Current rating before derating, in A.
    pub base_rating_a: f64,
}

const fn conductor(size_mm2: f64, resistance_ohm_per_km: f64, base_rating_a: f64) -> ConductorSize {
    ConductorSize {
        size_mm2,
        resistance_ohm_per_km,
        base_rating_a,
    }
}

/// Copper conductors with PVC insulation, multicore, clipped direct.
pub const COPPER_PVC: &[ConductorSize] = &[
    conductor(1.5, 12.1, 19.5),
    conductor(2.5, 7.41, 27.0),
    conductor(4.0, 4.61, 36.0),
    conductor(6.0, 3.08, 46.0),
    conductor(10.0, 1.83, 63.0),
    conductor(16.0, 1.15, 85.0),
    conductor(25.0, 0.727, 112.0),
    conductor(35.0, 0.524, 138.0),
    conductor(50.0, 0.387, 168.0),
    conductor(70.0, 0.268, 213.0),
    conductor(95.0, 0.193, 258.0),
    conductor(120.0, 0.153, 299.0),
    conductor(150.0, 0.124, 344.0),
    conductor(185.0, 0.0991, 392.0),
    conductor(240.0, 0.0754, 461.0),
    conductor(300.0, 0.0601, 530.0),
];

/// Looks a nominal size up in [`COPPER_PVC`].
pub fn conductor_for(size_mm2: f64) -> Option<&'static ConductorSize> {
    COPPER_PVC
        .iter()
        .find(|row| (row.size_mm2 - size_mm2).abs() < 1e-9)
}

/// Correction factors applied to the base current rating.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeratingFactors {
    /// Grouping with other circuits.
    pub grouping: f64,
    /// Ambient temperature.
    pub ambient: f64,
    /// Installation method (ducts, burial, thermal insulation).
    pub installation: f64,
}

impl DeratingFactors {
    /// Product of all factors.
    pub fn combined(&self) -> f64 {
        self.grouping * self.ambient * self.installation
    }
}

impl Default for DeratingFactors {
    fn default() -> Self {
        Self {
            grouping: 1.0,
            ambient: 1.0,
            installation: 1.0,
        }
    }
}

/// Voltage drop in volts: `k × I × L × R / 1000`.
pub fn voltage_drop_v(phase: Phase, current_a: f64, length_m: f64, resistance_ohm_per_km: f64) -> f64 {
    phase.drop_factor() * current_a * length_m * resistance_ohm_per_km / 1000.0
}

/// Voltage drop as a percentage of the supply voltage.
///
/// `None` when the supply voltage is not a positive finite number.
pub fn voltage_drop_percent(drop_v: f64, voltage_v: f64) -> Option<f64> {
    (voltage_v.is_finite() && voltage_v > 0.0).then(|| drop_v / voltage_v * 100.0)
}

/// Current rating after applying `factors`.
pub fn derated_rating(conductor: &ConductorSize, factors: &DeratingFactors) -> f64 {
    conductor.base_rating_a * factors.combined()
}

/// Circuit parameters used for sizing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circuit {
    /// Design load current in A.
    pub load_current_a: f64,
    /// Route length in m.
    pub length_m: f64,
    /// Supply voltage in V.
    pub voltage_v: f64,
    /// Supply configuration.
    pub phase: Phase,
}

impl Circuit {
    /// Whether voltage and length are positive and the load is non-negative, all finite.
    pub fn is_valid(&self) -> bool {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        positive(self.voltage_v)
            && positive(self.length_m)
            && self.load_current_a.is_finite()
            && self.load_current_a >= 0.0
    }

    /// Voltage drop in percent when run on `conductor`; `None` for an invalid circuit.
    pub fn drop_percent(&self, conductor: &ConductorSize) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        let drop = voltage_drop_v(
            self.phase,
            self.load_current_a,
            self.length_m,
            conductor.resistance_ohm_per_km,
        );
        voltage_drop_percent(drop, self.voltage_v)
    }
}

/// Smallest conductor whose derated rating carries the load within the voltage drop limit.
///
/// Invalid circuits get no recommendation.
pub fn recommend_size(
    circuit: &Circuit,
    max_drop_percent: f64,
    factors: &DeratingFactors,
) -> Option<&'static ConductorSize> {
    COPPER_PVC.iter().find(|conductor| {
        derated_rating(conductor, factors) >= circuit.load_current_a
            && circuit
                .drop_percent(conductor)
                .is_some_and(|percent| percent <= max_drop_percent)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn circuit(load: f64, length: f64) -> Circuit {
        Circuit {
            load_current_a: load,
            length_m: length,
            voltage_v: 400.0,
            phase: Phase::Three,
        }
    }

    #[test]
    fn table_is_sorted_by_size() {
        assert!(COPPER_PVC.windows(2).all(|pair| pair[0].size_mm2 < pair[1].size_mm2));
        assert_eq!(conductor_for(16.0).map(|c| c.base_rating_a), Some(85.0));
        assert!(conductor_for(17.0).is_none());
    }

    #[test]
    fn single_phase_drop_uses_both_conductors() {
        let drop = voltage_drop_v(Phase::Single, 10.0, 50.0, 7.41);
        assert!((drop - 7.41).abs() < 1e-9);
        assert!((voltage_drop_percent(drop, 230.0).unwrap() - 3.2217).abs() < 1e-3);
        assert_eq!(voltage_drop_percent(drop, 0.0), None);
        assert_eq!(voltage_drop_percent(drop, -230.0), None);
    }

    #[test]
    fn derating_reduces_rating() {
        let factors = DeratingFactors {
            grouping: 0.8,
            ambient: 0.9,
            ..DeratingFactors::default()
        };
        let rating = derated_rating(conductor_for(10.0).unwrap(), &factors);
        assert!((rating - 45.36).abs() < 1e-9);
    }

    #[test]
    fn recommendation_respects_drop_limit() {
        // 40 A fits a 6 mm² cable thermally but the drop over 200 m needs a larger size.
        let pick = recommend_size(&circuit(40.0, 200.0), 5.0, &DeratingFactors::default()).unwrap();
        assert!(pick.size_mm2 > 6.0);
        assert!(circuit(40.0, 200.0).drop_percent(pick).unwrap() <= 5.0);
    }

    #[test]
    fn invalid_circuits_have_no_recommendation() {
        let factors = DeratingFactors::default();
        for bad in [
            Circuit { voltage_v: 0.0, ..circuit(10.0, 20.0) },
            Circuit { voltage_v: -400.0, ..circuit(10.0, 20.0) },
            circuit(10.0, -20.0),
            circuit(10.0, 0.0),
            circuit(-10.0, 20.0),
            circuit(f64::NAN, 20.0),
        ] {
            assert!(!bad.is_valid(), "{bad:?}");
            assert!(bad.drop_percent(&COPPER_PVC[0]).is_none());
            assert!(recommend_size(&bad, 5.0, &factors).is_none());
        }
        assert!(circuit(10.0, 20.0).is_valid());
    }

    #[test]
    fn impossible_loads_have_no_recommendation() {
        assert!(recommend_size(&circuit(900.0, 10.0), 5.0, &DeratingFactors::default()).is_none());
    }

    proptest! {
        #[test]
        fn drop_is_linear_in_length_and_current(
            current in 0.1f64..400.0,
            length in 0.1f64..500.0,
            scale in 1.0f64..10.0,
        ) {
            let base = voltage_drop_v(Phase::Three, current, length, 1.15);
            let longer = voltage_drop_v(Phase::Three, current, length * scale, 1.15);
            let heavier = voltage_drop_v(Phase::Three, current * scale, length, 1.15);
            prop_assert!((longer - base * scale).abs() <= 1e-9 * longer.max(1.0));
            prop_assert!((heavier - base * scale).abs() <= 1e-9 * heavier.max(1.0));
        }

        #[test]
        fn recommended_sizes_meet_both_limits(
            load in 1.0f64..500.0,
            length in 1.0f64..300.0,
            limit in 1.0f64..10.0,
        ) {
            let circuit = circuit(load, length);
            let factors = DeratingFactors::default();
            if let Some(pick) = recommend_size(&circuit, limit, &factors) {
                prop_assert!(derated_rating(pick, &factors) >= load);
                prop_assert!(circuit.drop_percent(pick).unwrap() <= limit);
            }
        }
    }
}
