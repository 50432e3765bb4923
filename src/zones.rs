//! Risk and readiness zones for form (TSB %) and ACWR
//!
//! Both classifiers are fixed-threshold functions of a single value. Bounds
//! are inclusive below and exclusive above, except for the open-ended
//! extreme zones. Each day is classified on its own; there is no hysteresis.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::pmc::TrainingState;

/// Form zone from TSB percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormZone {
    HighRisk,        // below -30
    OptimalTraining, // -30 to -10
    GreyZone,        // -10 to +5
    Fresh,           // +5 to +20
    Transition,      // +20 and above
}

impl FormZone {
    pub fn from_tsb_percent(tsb_percent: Decimal) -> Self {
        if tsb_percent < dec!(-30) {
            FormZone::HighRisk
        } else if tsb_percent < dec!(-10) {
            FormZone::OptimalTraining
        } else if tsb_percent < dec!(5) {
            FormZone::GreyZone
        } else if tsb_percent < dec!(20) {
            FormZone::Fresh
        } else {
            FormZone::Transition
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormZone::HighRisk => "High Risk",
            FormZone::OptimalTraining => "Optimal Training",
            FormZone::GreyZone => "Grey Zone",
            FormZone::Fresh => "Fresh",
            FormZone::Transition => "Transition/Detraining",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FormZone::HighRisk => "Fatigue far exceeds fitness",
            FormZone::OptimalTraining => "Productive overload",
            FormZone::GreyZone => "Maintenance load with little adaptation",
            FormZone::Fresh => "Recovered and ready to perform",
            FormZone::Transition => "Load too low to maintain fitness",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            FormZone::HighRisk => "Prioritize rest and recovery before resuming hard sessions",
            FormZone::OptimalTraining => "Continue the current block and monitor recovery",
            FormZone::GreyZone => "Add targeted stimulus to drive adaptation",
            FormZone::Fresh => "Good window for competition or key sessions",
            FormZone::Transition => "Rebuild training load progressively",
        }
    }

    pub fn all() -> [FormZone; 5] {
        [
            FormZone::HighRisk,
            FormZone::OptimalTraining,
            FormZone::GreyZone,
            FormZone::Fresh,
            FormZone::Transition,
        ]
    }
}

impl fmt::Display for FormZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Injury-risk zone from the acute:chronic workload ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrZone {
    Low,  // below 0.8
    Safe, // 0.8 to 1.5 inclusive
    High, // above 1.5
}

impl AcwrZone {
    pub fn from_acwr(acwr: Decimal) -> Self {
        if acwr > dec!(1.5) {
            AcwrZone::High
        } else if acwr < dec!(0.8) {
            AcwrZone::Low
        } else {
            AcwrZone::Safe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcwrZone::Low => "Low — insufficient stimulus",
            AcwrZone::Safe => "Safe/moderate",
            AcwrZone::High => "High — reduce load",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            AcwrZone::Low => "Increase training volume gradually",
            AcwrZone::Safe => "Workload progression is within the safe range",
            AcwrZone::High => "Acute load spike detected, reduce load in coming days",
        }
    }

    pub fn all() -> [AcwrZone; 3] {
        [AcwrZone::Low, AcwrZone::Safe, AcwrZone::High]
    }
}

impl fmt::Display for AcwrZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of days spent in each zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDistribution {
    pub form: BTreeMap<FormZone, usize>,
    pub acwr: BTreeMap<AcwrZone, usize>,
}

impl ZoneDistribution {
    pub fn form_days(&self, zone: FormZone) -> usize {
        self.form.get(&zone).copied().unwrap_or(0)
    }

    pub fn acwr_days(&self, zone: AcwrZone) -> usize {
        self.acwr.get(&zone).copied().unwrap_or(0)
    }
}

/// Count days per form zone and per ACWR zone
pub fn zone_distribution(states: &[TrainingState]) -> ZoneDistribution {
    let mut distribution = ZoneDistribution::default();
    for state in states {
        *distribution.form.entry(state.form_zone).or_insert(0) += 1;
        *distribution.acwr.entry(state.acwr_zone).or_insert(0) += 1;
    }
    distribution
}
