//! Unified error hierarchy for trainload
//!
//! Every fallible engine operation returns one of these typed errors. Bad
//! data for one athlete is reported to the caller and never aborts the
//! process, so batch computation for other athletes can continue.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error type for all trainload operations
#[derive(Debug, Error)]
pub enum TrainLoadError {
    /// Input rejected before entering the engine
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Norm table lookup or loading errors
    #[error("Norm error: {0}")]
    Norm(#[from] NormError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// RPE outside 1-10
    #[error("RPE must be between 1 and 10, got {value}")]
    RpeOutOfRange { value: i64 },

    /// Session duration of zero or less
    #[error("Session duration must be positive, got {minutes} min")]
    NonPositiveDuration { minutes: Decimal },

    /// Session longer than a calendar day
    #[error("Session duration cannot exceed {max} min, got {minutes} min")]
    DurationTooLong { minutes: Decimal, max: Decimal },

    /// Negative duration passed to the load function
    #[error("Duration cannot be negative, got {minutes} min")]
    NegativeDuration { minutes: Decimal },

    /// Duration so large that the load cannot be represented
    #[error("Duration of {minutes} min is too large to compute a load")]
    LoadOverflow { minutes: Decimal },

    /// Resting heart rate outside 30-220 bpm
    #[error("Resting heart rate must be between 30 and 220 bpm, got {bpm}")]
    RestingHeartRateOutOfRange { bpm: i64 },

    /// Vertical jump outside (0, 200] cm
    #[error("Vertical jump must be in (0, 200] cm, got {cm}")]
    VerticalJumpOutOfRange { cm: Decimal },

    /// Body mass outside (0, 500] kg
    #[error("Body mass must be in (0, 500] kg, got {kg} kg")]
    BodyMassOutOfRange { kg: Decimal },

    /// Range start after range end
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Birth date later than the evaluation date
    #[error("Birth date {birth_date} is after evaluation date {on}")]
    BirthDateAfterEvaluation { birth_date: NaiveDate, on: NaiveDate },

    /// Age-dependent evaluation for an athlete without a birth date
    #[error("Athlete {athlete_id} has no birth date")]
    MissingBirthDate { athlete_id: String },

    /// Body-weight-relative test without a usable body weight
    #[error("Test {test_id} is body-weight relative but no body weight was recorded")]
    MissingBodyWeight { test_id: String },

    /// String did not match any variant of a closed enum
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    /// Record whose fields do not have the expected types
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },
}

/// Calculation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// Insufficient data for calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Division by zero
    #[error("Division by zero in {calculation}")]
    DivisionByZero { calculation: String },

    /// Intermediate value exceeded the decimal range
    #[error("Numeric overflow in {calculation}")]
    Overflow { calculation: String },
}

/// Norm table errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormError {
    /// No norm entry for the requested key
    #[error("No norm for test {test_id} ({sex}, {age_bracket})")]
    MissingNorm {
        test_id: String,
        sex: String,
        age_bracket: String,
    },

    /// Table content violates its invariants
    #[error("Invalid norm table: {reason}")]
    InvalidTable { reason: String },

    /// Table could not be parsed
    #[error("Failed to parse norm table: {reason}")]
    Parse { reason: String },
}

/// Result type alias for trainload operations
pub type Result<T> = std::result::Result<T, TrainLoadError>;

impl TrainLoadError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrainLoadError::Validation(_) => ErrorSeverity::Warning,
            TrainLoadError::Calculation(CalculationError::InsufficientData { .. }) => {
                ErrorSeverity::Info
            }
            TrainLoadError::Calculation(_) => ErrorSeverity::Error,
            TrainLoadError::Norm(NormError::MissingNorm { .. }) => ErrorSeverity::Warning,
            TrainLoadError::Norm(_) => ErrorSeverity::Error,
            TrainLoadError::Configuration(_) => ErrorSeverity::Error,
            TrainLoadError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrainLoadError::Validation(ValidationError::RpeOutOfRange { value }) => {
                format!("Session effort must be rated 1 to 10 (got {}).", value)
            }
            TrainLoadError::Calculation(CalculationError::InsufficientData {
                calculation,
                ..
            }) => {
                format!(
                    "Not enough training history to calculate {} yet.",
                    calculation
                )
            }
            TrainLoadError::Norm(NormError::MissingNorm { test_id, .. }) => {
                format!("No reference norms are available for test '{}'.", test_id)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
