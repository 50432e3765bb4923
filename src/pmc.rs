//! Performance Management Chart: fitness, fatigue, form and workload ratio
//!
//! CTL and ATL are exponentially weighted moving averages of daily load with
//! `α = 1 − e^(−1/τ)` and a zero starting state. ACWR uses simple trailing
//! means over the acute and chronic windows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalculationError, Result};
use crate::models::Session;
use crate::resample::{resample, DateRange, LoadSeries};
use crate::zones::{AcwrZone, FormZone};

/// PMC configuration with customizable time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcConfig {
    /// CTL time constant in days (default: 42)
    pub ctl_time_constant: u16,

    /// ATL time constant in days (default: 7)
    pub atl_time_constant: u16,

    /// Trailing window for the acute mean load (default: 7)
    pub acute_window_days: u16,

    /// Trailing window for the chronic mean load (default: 28)
    pub chronic_window_days: u16,

    /// Symmetric clamp applied to TSB percentage (default: 40)
    pub tsb_percent_limit: Decimal,

    /// Minimum days required for trend analysis
    pub min_data_days: u16,
}

impl Default for PmcConfig {
    fn default() -> Self {
        PmcConfig {
            ctl_time_constant: 42,
            atl_time_constant: 7,
            acute_window_days: 7,
            chronic_window_days: 28,
            tsb_percent_limit: dec!(40),
            min_data_days: 14,
        }
    }
}

impl PmcConfig {
    pub fn validate(&self) -> std::result::Result<(), CalculationError> {
        let invalid = |parameter: &str, value: String| CalculationError::InvalidParameter {
            calculation: "pmc".to_string(),
            parameter: parameter.to_string(),
            value,
        };

        if self.ctl_time_constant == 0 {
            return Err(invalid("ctl_time_constant", "0".to_string()));
        }
        if self.atl_time_constant == 0 {
            return Err(invalid("atl_time_constant", "0".to_string()));
        }
        if self.acute_window_days == 0 || self.acute_window_days > self.chronic_window_days {
            return Err(invalid(
                "acute_window_days",
                self.acute_window_days.to_string(),
            ));
        }
        if self.tsb_percent_limit <= Decimal::ZERO {
            return Err(invalid(
                "tsb_percent_limit",
                self.tsb_percent_limit.to_string(),
            ));
        }
        Ok(())
    }
}

/// Training state for one day of a load series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub date: NaiveDate,

    /// Daily load used in calculations
    pub load: Decimal,

    /// Chronic Training Load ("fitness")
    pub ctl: Decimal,

    /// Acute Training Load ("fatigue")
    pub atl: Decimal,

    /// Training Stress Balance ("form"), CTL - ATL
    pub tsb: Decimal,

    /// TSB as a clamped percentage of CTL
    pub tsb_percent: Decimal,

    /// Day-over-day CTL change
    pub ramp: Decimal,

    /// Trailing acute mean load
    pub acute_load: Decimal,

    /// Trailing chronic mean load
    pub chronic_load: Decimal,

    /// Acute:chronic workload ratio, 0 when the chronic mean is 0
    pub acwr: Decimal,

    pub form_zone: FormZone,
    pub acwr_zone: AcwrZone,
}

/// Smoothing factor `1 − e^(−1/τ)` for a time constant in days
pub fn smoothing_factor(tau_days: Decimal) -> std::result::Result<Decimal, CalculationError> {
    let invalid = || CalculationError::InvalidParameter {
        calculation: "ewma".to_string(),
        parameter: "tau_days".to_string(),
        value: tau_days.to_string(),
    };

    if tau_days <= Decimal::ZERO {
        return Err(invalid());
    }

    let decay = (-(Decimal::ONE / tau_days)).checked_exp().ok_or_else(invalid)?;
    Ok(Decimal::ONE - decay)
}

/// Exponentially weighted moving average, one output per input value.
///
/// `state₀ = 0`, `stateᵢ = stateᵢ₋₁ + α(valueᵢ − stateᵢ₋₁)`.
pub fn ewma(
    values: &[Decimal],
    tau_days: Decimal,
) -> std::result::Result<Vec<Decimal>, CalculationError> {
    let alpha = smoothing_factor(tau_days)?;
    let mut state = Decimal::ZERO;

    values
        .iter()
        .map(|value| -> std::result::Result<Decimal, CalculationError> {
            state = value
                .checked_sub(state)
                .and_then(move |delta| state.checked_add(alpha * delta))
                .ok_or_else(|| CalculationError::Overflow {
                    calculation: "ewma".to_string(),
                })?;
            Ok(state)
        })
        .collect()
}

/// Mean over the trailing `window` values ending at each index.
///
/// Near the start of the series only the available values are averaged.
/// Uses a running window sum, so the cost per value is constant.
pub fn trailing_means(
    values: &[Decimal],
    window: usize,
) -> std::result::Result<Vec<Decimal>, CalculationError> {
    let window = window.max(1);
    let overflow = || CalculationError::Overflow {
        calculation: "trailing mean".to_string(),
    };
    let mut sum = Decimal::ZERO;
    let mut non_zero = 0usize;

    values
        .iter()
        .enumerate()
        .map(|(i, value)| -> std::result::Result<Decimal, CalculationError> {
            sum = sum.checked_add(*value).ok_or_else(overflow)?;
            if !value.is_zero() {
                non_zero += 1;
            }
            if i >= window {
                let leaving = values[i - window];
                sum = sum.checked_sub(leaving).ok_or_else(overflow)?;
                if !leaving.is_zero() {
                    non_zero -= 1;
                }
            }
            // Rounding can leave a residue after the last load leaves the window
            if non_zero == 0 {
                sum = Decimal::ZERO;
            }
            Ok(sum / Decimal::from(window.min(i + 1)))
        })
        .collect()
}

/// PMC trend analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcTrends {
    pub ctl_trend: TrendDirection,
    pub atl_trend: TrendDirection,
    pub tsb_trend: TrendDirection,

    /// Average CTL change per week over the period
    pub avg_weekly_ramp: Decimal,

    /// Days classified in the high ACWR zone
    pub high_acwr_days: usize,

    /// Days classified in the high-risk form zone
    pub high_risk_form_days: usize,

    /// Days since the most recent high ACWR day
    pub days_since_high_acwr: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

/// Core PMC calculation engine
#[derive(Debug, Clone, Default)]
pub struct PmcCalculator {
    config: PmcConfig,
}

impl PmcCalculator {
    /// Create new PMC calculator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new PMC calculator with custom configuration
    pub fn with_config(config: PmcConfig) -> Self {
        PmcCalculator { config }
    }

    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// Calculate the training state for every day of a load series
    pub fn calculate_series(&self, series: &LoadSeries) -> Result<Vec<TrainingState>> {
        self.config.validate()?;

        let loads: Vec<Decimal> = series.loads().collect();
        let ctl = ewma(&loads, Decimal::from(self.config.ctl_time_constant))?;
        let atl = ewma(&loads, Decimal::from(self.config.atl_time_constant))?;
        let acute = trailing_means(&loads, self.config.acute_window_days as usize)?;
        let chronic = trailing_means(&loads, self.config.chronic_window_days as usize)?;
        let limit = self.config.tsb_percent_limit;

        let states = series
            .days()
            .iter()
            .enumerate()
            .map(|(i, day)| -> Result<TrainingState> {
                // Non-negative loads keep CTL and ATL in [0, max load], so
                // their differences cannot overflow.
                let tsb = ctl[i] - atl[i];
                let tsb_percent = if ctl[i] > Decimal::ZERO {
                    tsb.checked_div(ctl[i])
                        .and_then(|ratio| ratio.checked_mul(dec!(100)))
                        .map_or(limit * tsb.signum(), |percent| {
                            percent.clamp(-limit, limit)
                        })
                } else {
                    Decimal::ZERO
                };
                let ramp = if i == 0 {
                    Decimal::ZERO
                } else {
                    ctl[i] - ctl[i - 1]
                };
                let acwr = if chronic[i] > Decimal::ZERO {
                    acute[i]
                        .checked_div(chronic[i])
                        .ok_or_else(|| CalculationError::Overflow {
                            calculation: "acwr".to_string(),
                        })?
                } else {
                    Decimal::ZERO
                };

                Ok(TrainingState {
                    date: day.date,
                    load: day.load,
                    ctl: ctl[i],
                    atl: atl[i],
                    tsb,
                    tsb_percent,
                    ramp,
                    acute_load: acute[i],
                    chronic_load: chronic[i],
                    acwr,
                    form_zone: FormZone::from_tsb_percent(tsb_percent),
                    acwr_zone: AcwrZone::from_acwr(acwr),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(days = states.len(), "Calculated PMC series");
        Ok(states)
    }

    /// Resample sessions and calculate the full training state series
    pub fn analyze_sessions(&self, sessions: &[Session]) -> Result<Vec<TrainingState>> {
        self.calculate_series(&resample(sessions, None)?)
    }

    /// Training states for `start..=end`, computed over the full history.
    ///
    /// Sessions before `start` still warm up CTL and ATL. Rest days after the
    /// last session are padded through `end`.
    pub fn series_between(
        &self,
        sessions: &[Session],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrainingState>> {
        let window = DateRange::new(start, end)?;
        let history: Vec<&Session> = sessions.iter().filter(|s| s.date() <= end).collect();

        let series = resample(&history, None)?.extend_to(end);
        let states = self.calculate_series(&series)?;

        Ok(states
            .into_iter()
            .filter(|state| window.contains(state.date))
            .collect())
    }

    /// Training state as of a date, or None when no session precedes it
    pub fn latest_state(
        &self,
        sessions: &[Session],
        as_of: NaiveDate,
    ) -> Result<Option<TrainingState>> {
        Ok(self.series_between(sessions, as_of, as_of)?.pop())
    }

    /// Analyze PMC trends over a period
    pub fn analyze_trends(&self, states: &[TrainingState]) -> Result<PmcTrends> {
        let (first, last) = match (states.first(), states.last()) {
            (Some(first), Some(last)) if states.len() >= self.config.min_data_days as usize => {
                (first, last)
            }
            _ => {
                return Err(CalculationError::InsufficientData {
                    calculation: "PMC trends".to_string(),
                    reason: format!(
                        "need at least {} days, got {}",
                        self.config.min_data_days,
                        states.len()
                    ),
                }
                .into())
            }
        };

        // Daily ramps telescope to the overall CTL change
        let avg_daily_ramp = if states.len() > 1 {
            (last.ctl - first.ctl) / Decimal::from(states.len())
        } else {
            Decimal::ZERO
        };

        let high_acwr_days = states
            .iter()
            .filter(|s| s.acwr_zone == AcwrZone::High)
            .count();
        let high_risk_form_days = states
            .iter()
            .filter(|s| s.form_zone == FormZone::HighRisk)
            .count();
        let days_since_high_acwr = states
            .iter()
            .rev()
            .position(|s| s.acwr_zone == AcwrZone::High);

        Ok(PmcTrends {
            ctl_trend: Self::determine_trend(first.ctl, last.ctl),
            atl_trend: Self::determine_trend(first.atl, last.atl),
            tsb_trend: Self::determine_trend(first.tsb, last.tsb),
            avg_weekly_ramp: avg_daily_ramp.saturating_mul(dec!(7)),
            high_acwr_days,
            high_risk_form_days,
            days_since_high_acwr,
        })
    }

    /// Determine trend direction between two values
    fn determine_trend(start: Decimal, end: Decimal) -> TrendDirection {
        let change_threshold = dec!(0.05);
        let percent_change = (end - start) / start.abs().max(Decimal::ONE);

        if percent_change > change_threshold {
            TrendDirection::Increasing
        } else if percent_change < -change_threshold {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    /// Generate training recommendations for one day
    pub fn generate_recommendations(&self, state: &TrainingState) -> Vec<String> {
        let mut recommendations = vec![state.form_zone.recommendation().to_string()];

        if state.acwr_zone != AcwrZone::Safe {
            recommendations.push(state.acwr_zone.recommendation().to_string());
        }

        let weekly_ramp = state.ramp.saturating_mul(dec!(7));
        if weekly_ramp > dec!(8) {
            recommendations.push("CTL ramp rate is aggressive, monitor for overreaching".to_string());
        } else if weekly_ramp < dec!(-5) {
            recommendations.push("CTL is declining rapidly, consider increasing load".to_string());
        }

        if state.form_zone == FormZone::HighRisk {
            recommendations.push("Prioritize sleep, nutrition, and active recovery".to_string());
        }

        recommendations
    }
}
