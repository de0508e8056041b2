// Cycle Tracker - Core Library
// Exposes the predictor and its value types for the CLI, TUI, API server, and tests

pub mod clock;
pub mod config;
pub mod error;
pub mod import;
pub mod period;
pub mod phase;
pub mod predictor;
pub mod report;
pub mod stats;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::config::{AppConfig, ConfigError, PredictionConfig, ServerConfig};
pub use error::{ErrorKind, PredictionError};
pub use import::{load_periods, load_periods_from_reader};
pub use period::{PeriodHistory, PeriodRange, DATE_FORMAT};
pub use phase::{CyclePhase, Phase};
pub use predictor::{
    Confidence, CyclePredictor, DateRange, FertilityWindow, Prediction, PredictionBasis,
    PredictionStrategy, RoundingMode,
};
pub use report::{CycleReport, Outcome};
pub use stats::CycleStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fewest / most period rows the entry form offers
pub const MIN_FORM_PERIODS: usize = 2;
pub const MAX_FORM_PERIODS: usize = 12;
pub const DEFAULT_FORM_PERIODS: usize = 4;
