// Library interface for trainload modules
// This allows integration tests and the CLI to access the core functionality

pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod load;
pub mod logging;
pub mod models;
pub mod norms;
pub mod pmc;
pub mod readiness;
pub mod resample;
pub mod zones;

// Re-export commonly used types for convenience
pub use batch::{AthleteEntry, AthleteInput, BatchAnalyzer, BatchConfig, BatchSummary};
pub use config::EngineConfig;
pub use error::{CalculationError, NormError, Result, TrainLoadError, ValidationError};
pub use load::training_load;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use norms::{AgeBracket, NormTable, TestEvaluation, Tier};
pub use pmc::{PmcCalculator, PmcConfig, TrainingState};
pub use readiness::{ReadinessConfig, ReadinessEstimator, ReadinessMetrics};
pub use resample::{resample, DailyLoad, DateRange, DatedLoad, LoadSeries};
pub use zones::{AcwrZone, FormZone};
