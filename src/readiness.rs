//! Readiness estimation from resting heart rate and vertical jump
//!
//! Produces three field estimates per readiness record:
//!
//! - VO2max from the heart rate ratio method: `15.3 × (220 − age) / RHR`
//! - jump power: `2.5 × VJ`, a simplified constant
//! - readiness score: 60% jump relative to baseline, 40% inverse resting
//!   heart rate relative to baseline
//!
//! Sayers peak power (`60.7 × VJ + 45.3 × mass − 2055`) is reported as a
//! separate quantity when body mass is known. It is not interchangeable with
//! the simplified jump power.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, Result};
use crate::models::{age_on, ReadinessRecord};

/// Readiness estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Age used for VO2max when the birth date is unknown
    pub assumed_age: u32,

    /// Reference vertical jump in cm
    pub baseline_vertical_jump_cm: Decimal,

    /// Reference resting heart rate in bpm
    pub baseline_resting_hr: Decimal,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            assumed_age: 25,
            baseline_vertical_jump_cm: dec!(50),
            baseline_resting_hr: dec!(60),
        }
    }
}

impl ReadinessConfig {
    pub fn validate(&self) -> std::result::Result<(), CalculationError> {
        if self.assumed_age >= MAX_HR_INTERCEPT {
            return Err(invalid_parameter(
                "assumed_age",
                self.assumed_age.to_string(),
            ));
        }
        if self.baseline_vertical_jump_cm <= Decimal::ZERO {
            return Err(invalid_parameter(
                "baseline_vertical_jump_cm",
                self.baseline_vertical_jump_cm.to_string(),
            ));
        }
        if self.baseline_resting_hr <= Decimal::ZERO {
            return Err(invalid_parameter(
                "baseline_resting_hr",
                self.baseline_resting_hr.to_string(),
            ));
        }
        Ok(())
    }
}

/// Age-predicted maximum heart rate intercept (220 − age)
const MAX_HR_INTERCEPT: u32 = 220;

fn invalid_parameter(parameter: &str, value: String) -> CalculationError {
    CalculationError::InvalidParameter {
        calculation: "readiness".to_string(),
        parameter: parameter.to_string(),
        value,
    }
}

/// Estimates derived from one readiness record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessMetrics {
    pub date: NaiveDate,

    /// VO2max in ml/kg/min
    pub vo2max: Decimal,

    /// Simplified jump power (2.5 × VJ)
    pub power: Decimal,

    /// Sayers peak power in watts, when body mass was recorded
    pub peak_power: Option<Decimal>,

    /// Composite readiness score, 100 at baseline
    pub readiness_score: Decimal,

    /// Age used for the VO2max estimate
    pub age_used: u32,

    /// True when `age_used` is the configured assumption rather than calendar age
    pub age_assumed: bool,
}

/// Current, average, minimum and maximum of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub current: Decimal,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

impl MetricSummary {
    /// Summarize date-ordered values; the last value is current
    fn from_values(values: &[Decimal]) -> Option<Self> {
        let current = *values.last()?;
        let min = *values.iter().min()?;
        let max = *values.iter().max()?;
        let average = values.iter().sum::<Decimal>() / Decimal::from(values.len());

        Some(MetricSummary {
            current,
            average,
            min,
            max,
        })
    }
}

/// Readiness summary over a set of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessSummary {
    pub readiness_score: MetricSummary,
    pub vo2max: MetricSummary,
    pub power: MetricSummary,
    pub record_count: usize,
    pub date_range: (NaiveDate, NaiveDate),
}

/// Readiness estimator
#[derive(Debug, Clone, Default)]
pub struct ReadinessEstimator {
    config: ReadinessConfig,
}

impl ReadinessEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadinessConfig) -> Self {
        ReadinessEstimator { config }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// VO2max (ml/kg/min) = 15.3 × (220 − age) / resting HR
    ///
    /// # Errors
    /// Division by zero for a resting heart rate of 0, invalid parameter for
    /// an age of 220 or more.
    pub fn vo2max(resting_heart_rate: u16, age: u32) -> std::result::Result<Decimal, CalculationError> {
        if resting_heart_rate == 0 {
            return Err(CalculationError::DivisionByZero {
                calculation: "vo2max".to_string(),
            });
        }
        if age >= MAX_HR_INTERCEPT {
            return Err(invalid_parameter("age", age.to_string()));
        }

        Ok(dec!(15.3) * Decimal::from(MAX_HR_INTERCEPT - age) / Decimal::from(resting_heart_rate))
    }

    /// Simplified jump power: 2.5 × vertical jump (cm)
    pub fn power(vertical_jump_cm: Decimal) -> Decimal {
        dec!(2.5) * vertical_jump_cm
    }

    /// Sayers peak power (W) = 60.7 × VJ (cm) + 45.3 × mass (kg) − 2055
    pub fn peak_power_sayers(vertical_jump_cm: Decimal, body_mass_kg: Decimal) -> Decimal {
        dec!(60.7) * vertical_jump_cm + dec!(45.3) * body_mass_kg - dec!(2055)
    }

    /// Composite readiness: 0.6 × jump ratio + 0.4 × inverse heart rate ratio, in percent
    pub fn readiness_score(
        &self,
        vertical_jump_cm: Decimal,
        resting_heart_rate: u16,
    ) -> std::result::Result<Decimal, CalculationError> {
        self.config.validate()?;
        if resting_heart_rate == 0 {
            return Err(CalculationError::DivisionByZero {
                calculation: "readiness_score".to_string(),
            });
        }

        let percent_of = |value: Decimal, reference: Decimal| {
            value.checked_div(reference)?.checked_mul(dec!(100))
        };
        let score = percent_of(vertical_jump_cm, self.config.baseline_vertical_jump_cm)
            .zip(percent_of(
                self.config.baseline_resting_hr,
                Decimal::from(resting_heart_rate),
            ))
            .and_then(|(jump_ratio, heart_ratio)| {
                (dec!(0.6) * jump_ratio).checked_add(dec!(0.4) * heart_ratio)
            });

        score.ok_or_else(|| CalculationError::Overflow {
            calculation: "readiness_score".to_string(),
        })
    }

    /// Estimate all readiness metrics for one record.
    ///
    /// Calendar age on the record date is used when `birth_date` is known;
    /// the configured assumed age only otherwise.
    pub fn estimate(
        &self,
        record: &ReadinessRecord,
        birth_date: Option<NaiveDate>,
    ) -> Result<ReadinessMetrics> {
        let (age_used, age_assumed) = match birth_date {
            Some(birth_date) => (age_on(birth_date, record.date())?, false),
            None => (self.config.assumed_age, true),
        };

        let vertical_jump_cm = record.vertical_jump_cm();

        Ok(ReadinessMetrics {
            date: record.date(),
            vo2max: Self::vo2max(record.resting_heart_rate(), age_used)?,
            power: Self::power(vertical_jump_cm),
            peak_power: record
                .body_mass_kg()
                .map(|mass| Self::peak_power_sayers(vertical_jump_cm, mass)),
            readiness_score: self.readiness_score(vertical_jump_cm, record.resting_heart_rate())?,
            age_used,
            age_assumed,
        })
    }

    /// Summarize readiness, VO2max and power over a set of records.
    ///
    /// Returns None when there are no records. The most recent record is
    /// reported as current.
    pub fn summarize(
        &self,
        records: &[ReadinessRecord],
        birth_date: Option<NaiveDate>,
    ) -> Result<Option<ReadinessSummary>> {
        let mut metrics = records
            .iter()
            .map(|record| self.estimate(record, birth_date))
            .collect::<Result<Vec<_>>>()?;
        metrics.sort_by_key(|m| m.date);

        let (first, last) = match (metrics.first(), metrics.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Ok(None),
        };

        let scores: Vec<Decimal> = metrics.iter().map(|m| m.readiness_score).collect();
        let vo2max: Vec<Decimal> = metrics.iter().map(|m| m.vo2max).collect();
        let power: Vec<Decimal> = metrics.iter().map(|m| m.power).collect();

        match (
            MetricSummary::from_values(&scores),
            MetricSummary::from_values(&vo2max),
            MetricSummary::from_values(&power),
        ) {
            (Some(readiness_score), Some(vo2max), Some(power)) => Ok(Some(ReadinessSummary {
                readiness_score,
                vo2max,
                power,
                record_count: metrics.len(),
                date_range: (first, last),
            })),
            _ => Ok(None),
        }
    }
}
