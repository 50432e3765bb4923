use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::load;

/// Rate of Perceived Exertion, validated to 1-10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rpe(u8);

impl Rpe {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rpe(value as u8))
        } else {
            Err(ValidationError::RpeOutOfRange { value })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// All valid ratings in ascending order
    pub fn all() -> impl Iterator<Item = Rpe> {
        (Self::MIN..=Self::MAX).map(Rpe)
    }
}

impl TryFrom<i64> for Rpe {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rpe::new(value)
    }
}

impl From<Rpe> for u8 {
    fn from(rpe: Rpe) -> Self {
        rpe.0
    }
}

impl fmt::Display for Rpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Training program phase a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    GeneralPreparation,
    SpecificPreparation,
    Competition,
    Transition,
    Recovery,
}

impl FromStr for ProgramType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "general_preparation" | "general" | "gpp" => Ok(ProgramType::GeneralPreparation),
            "specific_preparation" | "specific" | "spp" => Ok(ProgramType::SpecificPreparation),
            "competition" | "competitive" => Ok(ProgramType::Competition),
            "transition" => Ok(ProgramType::Transition),
            "recovery" => Ok(ProgramType::Recovery),
            _ => Err(ValidationError::UnknownVariant {
                kind: "program type",
                value: s.to_string(),
            }),
        }
    }
}

/// Biological sex used to select reference norms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(ValidationError::UnknownVariant {
                kind: "sex",
                value: s.to_string(),
            }),
        }
    }
}

/// Biomotor test categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Strength,
    Power,
    Speed,
    Agility,
    Endurance,
    Flexibility,
    BodyComposition,
}

impl FromStr for TestCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "strength" => Ok(TestCategory::Strength),
            "power" => Ok(TestCategory::Power),
            "speed" => Ok(TestCategory::Speed),
            "agility" => Ok(TestCategory::Agility),
            "endurance" => Ok(TestCategory::Endurance),
            "flexibility" => Ok(TestCategory::Flexibility),
            "body_composition" => Ok(TestCategory::BodyComposition),
            _ => Err(ValidationError::UnknownVariant {
                kind: "test category",
                value: s.to_string(),
            }),
        }
    }
}

/// Session row as delivered by the persistence layer, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub date: NaiveDate,
    pub rpe: i64,
    pub duration_minutes: Decimal,
    #[serde(default)]
    pub program: Option<String>,
}

/// A recorded training session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRow")]
pub struct Session {
    date: NaiveDate,
    rpe: Rpe,
    duration_minutes: Decimal,
    program: Option<ProgramType>,
    #[serde(skip_serializing)]
    load: Decimal,
}

impl Session {
    /// Longest accepted session, one calendar day
    pub const MAX_DURATION_MINUTES: Decimal = dec!(1440);

    pub fn new(
        date: NaiveDate,
        rpe: Rpe,
        duration_minutes: Decimal,
    ) -> Result<Self, ValidationError> {
        if duration_minutes <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveDuration {
                minutes: duration_minutes,
            });
        }
        if duration_minutes > Self::MAX_DURATION_MINUTES {
            return Err(ValidationError::DurationTooLong {
                minutes: duration_minutes,
                max: Self::MAX_DURATION_MINUTES,
            });
        }

        Ok(Session {
            date,
            rpe,
            duration_minutes,
            program: None,
            load: load::training_load(rpe, duration_minutes)?,
        })
    }

    /// Tag the session with the program phase it was logged under
    pub fn with_program(mut self, program: ProgramType) -> Self {
        self.program = Some(program);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rpe(&self) -> Rpe {
        self.rpe
    }

    pub fn duration_minutes(&self) -> Decimal {
        self.duration_minutes
    }

    pub fn program(&self) -> Option<ProgramType> {
        self.program
    }

    /// Training load of this session
    pub fn load(&self) -> Decimal {
        self.load
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = ValidationError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let session = Session::new(row.date, Rpe::new(row.rpe)?, row.duration_minutes)?;
        match row.program.as_deref() {
            Some(program) if !program.trim().is_empty() => {
                Ok(session.with_program(program.parse()?))
            }
            _ => Ok(session),
        }
    }
}

/// Readiness row as delivered by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessRow {
    pub date: NaiveDate,
    pub resting_heart_rate: i64,
    pub vertical_jump_cm: Decimal,
    #[serde(default)]
    pub body_mass_kg: Option<Decimal>,
}

/// Daily readiness measurements, one per athlete per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReadinessRow")]
pub struct ReadinessRecord {
    date: NaiveDate,
    resting_heart_rate: u16,
    vertical_jump_cm: Decimal,
    body_mass_kg: Option<Decimal>,
}

impl ReadinessRecord {
    pub const MIN_RESTING_HR: u16 = 30;
    pub const MAX_RESTING_HR: u16 = 220;
    pub const MAX_VERTICAL_JUMP_CM: Decimal = dec!(200);
    pub const MAX_BODY_MASS_KG: Decimal = dec!(500);

    pub fn new(
        date: NaiveDate,
        resting_heart_rate: u16,
        vertical_jump_cm: Decimal,
    ) -> Result<Self, ValidationError> {
        if !(Self::MIN_RESTING_HR..=Self::MAX_RESTING_HR).contains(&resting_heart_rate) {
            return Err(ValidationError::RestingHeartRateOutOfRange {
                bpm: resting_heart_rate.into(),
            });
        }

        if vertical_jump_cm <= Decimal::ZERO || vertical_jump_cm > Self::MAX_VERTICAL_JUMP_CM {
            return Err(ValidationError::VerticalJumpOutOfRange {
                cm: vertical_jump_cm,
            });
        }

        Ok(ReadinessRecord {
            date,
            resting_heart_rate,
            vertical_jump_cm,
            body_mass_kg: None,
        })
    }

    /// Attach body mass measured on the same day
    pub fn with_body_mass(mut self, body_mass_kg: Decimal) -> Result<Self, ValidationError> {
        if body_mass_kg <= Decimal::ZERO || body_mass_kg > Self::MAX_BODY_MASS_KG {
            return Err(ValidationError::BodyMassOutOfRange { kg: body_mass_kg });
        }
        self.body_mass_kg = Some(body_mass_kg);
        Ok(self)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn resting_heart_rate(&self) -> u16 {
        self.resting_heart_rate
    }

    pub fn vertical_jump_cm(&self) -> Decimal {
        self.vertical_jump_cm
    }

    pub fn body_mass_kg(&self) -> Option<Decimal> {
        self.body_mass_kg
    }
}

impl TryFrom<ReadinessRow> for ReadinessRecord {
    type Error = ValidationError;

    fn try_from(row: ReadinessRow) -> Result<Self, Self::Error> {
        let resting_heart_rate = u16::try_from(row.resting_heart_rate).map_err(|_| {
            ValidationError::RestingHeartRateOutOfRange {
                bpm: row.resting_heart_rate,
            }
        })?;
        let record = ReadinessRecord::new(row.date, resting_heart_rate, row.vertical_jump_cm)?;
        match row.body_mass_kg {
            Some(mass) => record.with_body_mass(mass),
            None => Ok(record),
        }
    }
}

/// Athlete attributes needed by the readiness and norm evaluators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Unique athlete identifier
    pub id: String,

    /// Date of birth for age-based calculations
    pub birth_date: Option<NaiveDate>,

    pub sex: Sex,

    /// Weight in kilograms
    pub body_mass_kg: Option<Decimal>,
}

impl AthleteProfile {
    /// Calendar age on `on`, or None when the birth date is unknown
    pub fn age_on(&self, on: NaiveDate) -> Result<Option<u32>, ValidationError> {
        self.birth_date
            .map(|birth_date| age_on(birth_date, on))
            .transpose()
    }
}

/// A single biomotor test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomotorTestResult {
    pub category: TestCategory,
    pub test_id: String,
    pub raw_value: Decimal,
    pub body_weight_at_test: Option<Decimal>,
}

/// Completed years between `birth_date` and `on`.
///
/// A birthday not yet reached in the year of `on` does not count.
pub fn age_on(birth_date: NaiveDate, on: NaiveDate) -> Result<u32, ValidationError> {
    on.years_since(birth_date)
        .ok_or(ValidationError::BirthDateAfterEvaluation { birth_date, on })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rpe_bounds() {
        assert!(Rpe::new(0).is_err());
        assert!(Rpe::new(11).is_err());
        assert_eq!(Rpe::new(1).unwrap().value(), 1);
        assert_eq!(Rpe::new(10).unwrap().value(), 10);
        assert_eq!(Rpe::all().count(), 10);
    }

    #[test]
    fn test_session_rejects_non_positive_duration() {
        let rpe = Rpe::new(5).unwrap();
        assert_eq!(
            Session::new(date(2024, 3, 1), rpe, Decimal::ZERO),
            Err(ValidationError::NonPositiveDuration {
                minutes: Decimal::ZERO
            })
        );
        assert!(Session::new(date(2024, 3, 1), rpe, dec!(-10)).is_err());
        assert!(Session::new(date(2024, 3, 1), rpe, dec!(45)).is_ok());
    }

    #[test]
    fn test_session_rejects_duration_beyond_one_day() {
        let rpe = Rpe::new(10).unwrap();
        let day = date(2024, 3, 1);

        let longest = Session::new(day, rpe, dec!(1440)).unwrap();
        assert_eq!(longest.load(), dec!(3360));

        assert_eq!(
            Session::new(day, rpe, dec!(1440.5)),
            Err(ValidationError::DurationTooLong {
                minutes: dec!(1440.5),
                max: dec!(1440)
            })
        );
        assert!(Session::new(day, rpe, Decimal::MAX).is_err());
    }

    #[test]
    fn test_session_row_conversion() {
        let row = SessionRow {
            date: date(2024, 3, 1),
            rpe: 7,
            duration_minutes: dec!(90),
            program: Some("Specific Preparation".to_string()),
        };
        let session = Session::try_from(row).unwrap();
        assert_eq!(session.rpe().value(), 7);
        assert_eq!(session.program(), Some(ProgramType::SpecificPreparation));
        assert_eq!(session.load(), dec!(120));

        let bad = SessionRow {
            date: date(2024, 3, 1),
            rpe: 12,
            duration_minutes: dec!(60),
            program: None,
        };
        assert_eq!(
            Session::try_from(bad),
            Err(ValidationError::RpeOutOfRange { value: 12 })
        );
    }

    #[test]
    fn test_session_deserialization_validates() {
        let ok: Session =
            serde_json::from_str(r#"{"date":"2024-03-01","rpe":5,"duration_minutes":60}"#)
                .unwrap();
        assert_eq!(ok.load(), dec!(60));

        let bad = serde_json::from_str::<Session>(
            r#"{"date":"2024-03-01","rpe":5,"duration_minutes":0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_readiness_record_validation() {
        let day = date(2024, 3, 1);
        assert!(ReadinessRecord::new(day, 29, dec!(50)).is_err());
        assert!(ReadinessRecord::new(day, 221, dec!(50)).is_err());
        assert!(ReadinessRecord::new(day, 60, Decimal::ZERO).is_err());
        assert!(ReadinessRecord::new(day, 60, dec!(200.1)).is_err());
        assert!(ReadinessRecord::new(day, 30, dec!(200)).is_ok());
        assert!(ReadinessRecord::new(day, 220, dec!(0.5)).is_ok());

        let record = ReadinessRecord::new(day, 60, dec!(50)).unwrap();
        assert!(record.clone().with_body_mass(Decimal::ZERO).is_err());
        assert!(record.clone().with_body_mass(dec!(500.1)).is_err());
        assert!(record.clone().with_body_mass(Decimal::MAX).is_err());
        assert_eq!(
            record.with_body_mass(dec!(72.5)).unwrap().body_mass_kg(),
            Some(dec!(72.5))
        );
    }

    #[test]
    fn test_readiness_row_heart_rate_outside_u16() {
        for bpm in [-5, 70000] {
            let row = ReadinessRow {
                date: date(2024, 3, 1),
                resting_heart_rate: bpm,
                vertical_jump_cm: dec!(50),
                body_mass_kg: None,
            };
            assert_eq!(
                ReadinessRecord::try_from(row),
                Err(ValidationError::RestingHeartRateOutOfRange { bpm })
            );
        }
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(
            "body composition".parse::<TestCategory>().unwrap(),
            TestCategory::BodyComposition
        );
        assert!("balance".parse::<TestCategory>().is_err());
        assert_eq!("gpp".parse::<ProgramType>().unwrap(), ProgramType::GeneralPreparation);
        assert!("taper-ish".parse::<ProgramType>().is_err());
    }

    #[test]
    fn test_calendar_age() {
        let birth = date(2006, 6, 15);
        assert_eq!(age_on(birth, date(2024, 6, 14)).unwrap(), 17);
        assert_eq!(age_on(birth, date(2024, 6, 15)).unwrap(), 18);
        assert_eq!(age_on(birth, date(2024, 12, 31)).unwrap(), 18);
        assert!(age_on(birth, date(2006, 6, 14)).is_err());
    }

    #[test]
    fn test_profile_age_unknown_birth_date() {
        let athlete = AthleteProfile {
            id: "a1".to_string(),
            birth_date: None,
            sex: Sex::Male,
            body_mass_kg: None,
        };
        assert_eq!(athlete.age_on(date(2024, 1, 1)).unwrap(), None);
    }
}
