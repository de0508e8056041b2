// 📋 Cycle Report - every query in one serializable value
//
// Presentation layers (CLI, TUI, HTTP) render this instead of calling the
// predictor piecemeal. A query that declines to answer is recorded as
// Unavailable and the rest of the report is still filled in.

use crate::error::{ErrorKind, PredictionError};
use crate::phase::CyclePhase;
use crate::predictor::{CyclePredictor, FertilityWindow, Prediction, PredictionStrategy};
use crate::stats::CycleStats;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok { value: T },
    Unavailable { kind: ErrorKind, message: String },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok { value } => Some(value),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    fn from_result(query: &str, result: Result<T, PredictionError>) -> Self {
        match result {
            Ok(value) => Outcome::Ok { value },
            Err(err) => {
                warn!(query, kind = ?err.kind(), "{}", err);
                Outcome::Unavailable {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub strategy: PredictionStrategy,
    /// Date the phase was evaluated for
    pub as_of: NaiveDate,
    pub prediction: Outcome<Prediction>,
    pub phase: Outcome<CyclePhase>,
    pub fertility: Outcome<FertilityWindow>,
    pub stats: CycleStats,
}

impl CycleReport {
    /// Run every query; `as_of = None` means today per the predictor's clock
    pub fn build(predictor: &CyclePredictor, as_of: Option<NaiveDate>) -> Self {
        let as_of = as_of.unwrap_or_else(|| predictor.today());

        CycleReport {
            strategy: predictor.strategy(),
            as_of,
            prediction: Outcome::from_result("prediction", predictor.predict_next_period()),
            phase: Outcome::from_result("phase", predictor.current_phase(Some(as_of))),
            fertility: Outcome::from_result("fertility", predictor.fertility_window()),
            stats: predictor.stats(),
        }
    }

    /// Plain-text rendering used by the CLI
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match &self.prediction {
            Outcome::Ok { value } => {
                lines.push(format!("Predicted Start Date: {}", value.predicted_start));
                lines.push(format!("Prediction Range: {}", value.range));
                lines.push(format!(
                    "Confidence: {} — Based on {}",
                    value.confidence, value.basis
                ));
            }
            Outcome::Unavailable { message, .. } => lines.push(format!("Prediction: {}", message)),
        }

        match &self.phase {
            Outcome::Ok { value } => lines.push(format!("Phase on {}: {}", self.as_of, value)),
            Outcome::Unavailable { message, .. } => lines.push(format!("Phase: {}", message)),
        }

        match &self.fertility {
            Outcome::Ok { value } => {
                lines.push(format!("Estimated Ovulation: {}", value.ovulation_day));
                lines.push(format!("Fertile Window: {}", value.window));
            }
            Outcome::Unavailable { message, .. } => lines.push(format!("Fertility: {}", message)),
        }

        lines
    }
}
