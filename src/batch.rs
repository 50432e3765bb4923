//! Parallel analysis of many athletes using rayon
//!
//! Each athlete is analyzed independently on the rayon pool. Invalid rows or
//! failed calculations for one athlete are recorded in that athlete's
//! outcome and never affect the others.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CalculationError, Result, TrainLoadError, ValidationError};
use crate::models::{ReadinessRecord, ReadinessRow, Session, SessionRow};
use crate::pmc::{PmcCalculator, PmcTrends, TrainingState};
use crate::readiness::{ReadinessEstimator, ReadinessSummary};
use crate::zones::{zone_distribution, ZoneDistribution};

/// Configuration for batch analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads; rayon's default (one per CPU) when unset
    pub num_threads: Option<usize>,
}

/// Raw data for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteInput {
    pub athlete_id: String,
    #[serde(default)]
    pub sessions: Vec<SessionRow>,
    #[serde(default)]
    pub readiness: Vec<ReadinessRow>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// One athlete's entry in a batch file, decoded independently of the others
#[derive(Debug, Clone, PartialEq)]
pub enum AthleteEntry {
    Parsed(AthleteInput),

    /// Entry whose fields do not decode; reported as that athlete's failure
    Malformed { athlete_id: String, reason: String },
}

impl AthleteEntry {
    /// Decode one JSON value. Entries without a string `athlete_id` are
    /// named by their 1-based position.
    pub fn from_json(index: usize, value: serde_json::Value) -> Self {
        let athlete_id = value
            .get("athlete_id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index + 1));

        match serde_json::from_value::<AthleteInput>(value) {
            Ok(input) => AthleteEntry::Parsed(input),
            Err(e) => AthleteEntry::Malformed {
                athlete_id,
                reason: e.to_string(),
            },
        }
    }
}

trait BatchItem: Sync {
    fn athlete_id(&self) -> &str;
}

impl BatchItem for AthleteInput {
    fn athlete_id(&self) -> &str {
        &self.athlete_id
    }
}

impl BatchItem for AthleteEntry {
    fn athlete_id(&self) -> &str {
        match self {
            AthleteEntry::Parsed(input) => &input.athlete_id,
            AthleteEntry::Malformed { athlete_id, .. } => athlete_id,
        }
    }
}

/// Everything computed for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteReport {
    pub states: Vec<TrainingState>,
    pub latest: Option<TrainingState>,

    /// None when the series is shorter than the configured minimum
    pub trends: Option<PmcTrends>,

    pub zones: ZoneDistribution,
    pub readiness: Option<ReadinessSummary>,
}

/// Result of analyzing one athlete
#[derive(Debug)]
pub struct AthleteOutcome {
    pub athlete_id: String,
    pub duration_ms: u128,
    pub result: Result<AthleteReport>,
}

impl AthleteOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch run
#[derive(Debug)]
pub struct BatchSummary {
    pub total_athletes: usize,
    pub successful_athletes: usize,
    pub failed_athletes: usize,
    pub total_duration_ms: u128,

    /// Per-athlete outcomes in input order
    pub outcomes: Vec<AthleteOutcome>,
}

impl BatchSummary {
    /// Check if every athlete was analyzed
    pub fn is_fully_successful(&self) -> bool {
        self.failed_athletes == 0
    }

    pub fn outcome(&self, athlete_id: &str) -> Option<&AthleteOutcome> {
        self.outcomes.iter().find(|o| o.athlete_id == athlete_id)
    }

    /// Failed athletes with their error messages
    pub fn errors(&self) -> Vec<(&str, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(e) => Some((o.athlete_id.as_str(), e.to_string())),
                Ok(_) => None,
            })
            .collect()
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Analysis Summary\n  \
             Athletes: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             Total Time: {:.2}s",
            self.total_athletes,
            self.successful_athletes,
            self.failed_athletes,
            self.total_duration_ms as f64 / 1000.0
        )
    }
}

/// Fans athlete analysis out over a rayon pool
#[derive(Debug, Clone, Default)]
pub struct BatchAnalyzer {
    config: BatchConfig,
    pmc: PmcCalculator,
    readiness: ReadinessEstimator,
}

impl BatchAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(
        config: BatchConfig,
        pmc: PmcCalculator,
        readiness: ReadinessEstimator,
    ) -> Self {
        BatchAnalyzer {
            config,
            pmc,
            readiness,
        }
    }

    /// Analyze all athletes in parallel.
    ///
    /// Only a failure to build the thread pool is returned as an error;
    /// per-athlete failures are reported in the summary.
    pub fn analyze(&self, inputs: &[AthleteInput]) -> Result<BatchSummary> {
        self.run(inputs, |input| self.analyze_athlete(input))
    }

    /// Analyze decoded batch entries. Malformed entries become failed
    /// outcomes without affecting the others.
    pub fn analyze_entries(&self, entries: &[AthleteEntry]) -> Result<BatchSummary> {
        self.run(entries, |entry| match entry {
            AthleteEntry::Parsed(input) => self.analyze_athlete(input),
            AthleteEntry::Malformed { reason, .. } => Err(ValidationError::MalformedRecord {
                reason: reason.clone(),
            }
            .into()),
        })
    }

    fn run<T, F>(&self, items: &[T], analyze: F) -> Result<BatchSummary>
    where
        T: BatchItem,
        F: Fn(&T) -> Result<AthleteReport> + Sync,
    {
        let start_time = Instant::now();
        info!("Starting batch analysis of {} athletes", items.len());

        let outcomes = match self.config.num_threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| {
                        TrainLoadError::Configuration(format!(
                            "Failed to create thread pool: {}",
                            e
                        ))
                    })?;
                pool.install(|| Self::analyze_parallel(items, &analyze))
            }
            None => Self::analyze_parallel(items, &analyze),
        };

        let successful_athletes = outcomes.iter().filter(|o| o.is_success()).count();
        let summary = BatchSummary {
            total_athletes: outcomes.len(),
            successful_athletes,
            failed_athletes: outcomes.len() - successful_athletes,
            total_duration_ms: start_time.elapsed().as_millis(),
            outcomes,
        };

        info!(
            "Batch analysis complete: {}/{} athletes successful in {}ms",
            summary.successful_athletes, summary.total_athletes, summary.total_duration_ms
        );

        Ok(summary)
    }

    fn analyze_parallel<T, F>(items: &[T], analyze: &F) -> Vec<AthleteOutcome>
    where
        T: BatchItem,
        F: Fn(&T) -> Result<AthleteReport> + Sync,
    {
        items
            .par_iter()
            .map(|item| {
                let started = Instant::now();
                let result = analyze(item);

                if let Err(e) = &result {
                    warn!(athlete = %item.athlete_id(), "Athlete analysis failed: {}", e);
                }

                AthleteOutcome {
                    athlete_id: item.athlete_id().to_string(),
                    duration_ms: started.elapsed().as_millis(),
                    result,
                }
            })
            .collect()
    }

    /// Analyze one athlete sequentially
    pub fn analyze_athlete(&self, input: &AthleteInput) -> Result<AthleteReport> {
        let sessions = input
            .sessions
            .iter()
            .cloned()
            .map(Session::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let records = input
            .readiness
            .iter()
            .cloned()
            .map(ReadinessRecord::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let states = self.pmc.analyze_sessions(&sessions)?;
        let trends = match self.pmc.analyze_trends(&states) {
            Ok(trends) => Some(trends),
            Err(TrainLoadError::Calculation(CalculationError::InsufficientData { .. })) => None,
            Err(e) => return Err(e),
        };
        let readiness = self.readiness.summarize(&records, input.birth_date)?;

        debug!(
            athlete = %input.athlete_id,
            sessions = sessions.len(),
            days = states.len(),
            "Analyzed athlete"
        );

        Ok(AthleteReport {
            zones: zone_distribution(&states),
            latest: states.last().cloned(),
            trends,
            readiness,
            states,
        })
    }
}
