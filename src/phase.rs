// 🌙 Cycle Phase - where "today" falls in the current cycle

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl Phase {
    /// Classify by whole days elapsed since the last period started (0-based).
    /// Negative offsets are before the period began and have no phase.
    pub fn from_days_since_start(days: i64) -> Option<Self> {
        match days {
            0..=5 => Some(Phase::Menstrual),
            6..=12 => Some(Phase::Follicular),
            13..=15 => Some(Phase::Ovulatory),
            16.. => Some(Phase::Luteal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Menstrual => "Menstrual",
            Phase::Follicular => "Follicular",
            Phase::Ovulatory => "Ovulatory",
            Phase::Luteal => "Luteal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Day-of-cycle plus its phase. Display gives the user-facing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePhase {
    /// 1-based: the day a period starts is cycle day 1
    pub day: u32,
    pub phase: Phase,
}

impl CyclePhase {
    /// `None` when `days` is negative
    pub(crate) fn from_days_since_start(days: i64) -> Option<Self> {
        Some(CyclePhase {
            phase: Phase::from_days_since_start(days)?,
            day: u32::try_from(days + 1).unwrap_or(u32::MAX),
        })
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cycle Day {} — {} Phase", self.day, self.phase)
    }
}
