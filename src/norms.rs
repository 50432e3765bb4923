//! Norm-referenced classification of biomotor test results
//!
//! A norm table partitions the value range of each (test, sex, age bracket)
//! into five ordered tiers using four ascending cut points. Cut points are
//! inclusive lower bounds of the tier above them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{CalculationError, NormError, Result, ValidationError};
use crate::models::{age_on, AthleteProfile, BiomotorTestResult, Sex, TestCategory};

/// Age bracket used to select reference norms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    Youth,      // under 18
    YoungAdult, // 18-25
    Adult,      // 26-35
    Senior,     // over 35
}

impl AgeBracket {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=17 => AgeBracket::Youth,
            18..=25 => AgeBracket::YoungAdult,
            26..=35 => AgeBracket::Adult,
            _ => AgeBracket::Senior,
        }
    }

    /// Bracket for calendar age on `on`
    pub fn on(birth_date: NaiveDate, on: NaiveDate) -> std::result::Result<Self, ValidationError> {
        age_on(birth_date, on).map(Self::from_age)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Youth => "youth",
            AgeBracket::YoungAdult => "young_adult",
            AgeBracket::Adult => "adult",
            AgeBracket::Senior => "senior",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five ordered performance tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    VeryLow,
    Low,
    Fair,
    Good,
    VeryGood,
}

impl Tier {
    const ASCENDING: [Tier; 5] = [Tier::VeryLow, Tier::Low, Tier::Fair, Tier::Good, Tier::VeryGood];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::VeryLow => "Very Low",
            Tier::Low => "Low",
            Tier::Fair => "Fair",
            Tier::Good => "Good",
            Tier::VeryGood => "Very Good",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a norm table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormEntry {
    pub test_id: String,
    pub sex: Sex,
    pub age_bracket: AgeBracket,

    /// Strictly ascending boundaries between the five tiers
    pub cut_points: [Decimal; 4],

    /// Values are divided by body weight before lookup
    #[serde(default)]
    pub body_weight_relative: bool,

    #[serde(default = "default_higher_is_better")]
    pub higher_is_better: bool,
}

fn default_higher_is_better() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NormKey {
    test_id: String,
    sex: Sex,
    age_bracket: AgeBracket,
}

impl NormKey {
    fn new(test_id: &str, sex: Sex, age_bracket: AgeBracket) -> Self {
        NormKey {
            test_id: test_id.to_string(),
            sex,
            age_bracket,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NormTableFile {
    version: String,
    #[serde(default)]
    norms: Vec<NormEntry>,
}

/// Versioned lookup of norm entries by (test, sex, age bracket)
#[derive(Debug, Clone, PartialEq)]
pub struct NormTable {
    version: String,
    entries: HashMap<NormKey, NormEntry>,
}

/// Outcome of evaluating one test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvaluation {
    pub test_id: String,
    pub category: TestCategory,
    pub raw_value: Decimal,

    /// Value compared against the norms, relative to body weight where required
    pub evaluated_value: Decimal,

    pub age_bracket: AgeBracket,
    pub tier: Tier,
}

impl NormTable {
    /// Build a table, rejecting non-ascending cut points and duplicate keys
    pub fn new(
        version: impl Into<String>,
        entries: Vec<NormEntry>,
    ) -> std::result::Result<Self, NormError> {
        let mut table = HashMap::with_capacity(entries.len());

        for entry in entries {
            if !entry.cut_points.windows(2).all(|w| w[0] < w[1]) {
                return Err(NormError::InvalidTable {
                    reason: format!(
                        "cut points for {} ({}, {}) must be strictly ascending",
                        entry.test_id, entry.sex, entry.age_bracket
                    ),
                });
            }

            let key = NormKey::new(&entry.test_id, entry.sex, entry.age_bracket);
            if table.contains_key(&key) {
                return Err(NormError::InvalidTable {
                    reason: format!(
                        "duplicate norm for {} ({}, {})",
                        entry.test_id, entry.sex, entry.age_bracket
                    ),
                });
            }
            table.insert(key, entry);
        }

        Ok(NormTable {
            version: version.into(),
            entries: table,
        })
    }

    /// Parse a table from TOML
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, NormError> {
        let file: NormTableFile = toml::from_str(content).map_err(|e| NormError::Parse {
            reason: e.to_string(),
        })?;
        Self::new(file.version, file.norms)
    }

    /// Load a table from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let table = Self::from_toml_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            version = %table.version,
            entries = table.len(),
            "Loaded norm table"
        );
        Ok(table)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, test_id: &str, sex: Sex, age_bracket: AgeBracket) -> Option<&NormEntry> {
        self.entries.get(&NormKey::new(test_id, sex, age_bracket))
    }

    fn require(
        &self,
        test_id: &str,
        sex: Sex,
        age_bracket: AgeBracket,
    ) -> std::result::Result<&NormEntry, NormError> {
        self.get(test_id, sex, age_bracket)
            .ok_or_else(|| NormError::MissingNorm {
                test_id: test_id.to_string(),
                sex: sex.to_string(),
                age_bracket: age_bracket.to_string(),
            })
    }

    /// Tier of `value` for the given key.
    ///
    /// With cut points c1 < c2 < c3 < c4 and `higher_is_better`, a value
    /// below c1 is very low and a value at or above c4 is very good. The
    /// order is mirrored when lower values are better.
    pub fn classify(
        &self,
        test_id: &str,
        value: Decimal,
        sex: Sex,
        age_bracket: AgeBracket,
        higher_is_better: bool,
    ) -> std::result::Result<Tier, NormError> {
        let entry = self.require(test_id, sex, age_bracket)?;
        Ok(tier_for(value, &entry.cut_points, higher_is_better))
    }

    /// Evaluate a test result for an athlete on a given date
    pub fn evaluate(
        &self,
        result: &BiomotorTestResult,
        athlete: &AthleteProfile,
        on: NaiveDate,
    ) -> Result<TestEvaluation> {
        let birth_date = athlete
            .birth_date
            .ok_or_else(|| ValidationError::MissingBirthDate {
                athlete_id: athlete.id.clone(),
            })?;
        let age_bracket = AgeBracket::on(birth_date, on)?;
        let entry = self.require(&result.test_id, athlete.sex, age_bracket)?;

        let evaluated_value = if entry.body_weight_relative {
            let weight = result
                .body_weight_at_test
                .filter(|w| *w > Decimal::ZERO)
                .ok_or_else(|| ValidationError::MissingBodyWeight {
                    test_id: result.test_id.clone(),
                })?;
            result
                .raw_value
                .checked_div(weight)
                .ok_or_else(|| CalculationError::Overflow {
                    calculation: format!("relative {}", result.test_id),
                })?
        } else {
            result.raw_value
        };

        Ok(TestEvaluation {
            test_id: result.test_id.clone(),
            category: result.category,
            raw_value: result.raw_value,
            evaluated_value,
            age_bracket,
            tier: tier_for(evaluated_value, &entry.cut_points, entry.higher_is_better),
        })
    }
}

fn tier_for(value: Decimal, cut_points: &[Decimal; 4], higher_is_better: bool) -> Tier {
    let band = cut_points.iter().filter(|c| value >= **c).count();
    let index = if higher_is_better { band } else { 4 - band };
    Tier::ASCENDING[index]
}
