// 📊 Cycle Statistics - summary numbers for the history view

use crate::period::PeriodHistory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub periods_logged: usize,
    pub cycles: usize,
    pub avg_cycle_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub avg_period_length: Option<f64>,
}

impl CycleStats {
    pub fn from_history(history: &PeriodHistory) -> Self {
        let cycle_lengths = history.cycle_lengths();
        let period_lengths: Vec<i64> = history.ranges().iter().map(|r| r.length_days()).collect();

        CycleStats {
            periods_logged: history.len(),
            cycles: cycle_lengths.len(),
            avg_cycle_length: mean(cycle_lengths),
            shortest_cycle: cycle_lengths.iter().copied().min(),
            longest_cycle: cycle_lengths.iter().copied().max(),
            avg_period_length: mean(&period_lengths),
        }
    }
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodRange;
    use chrono::NaiveDate;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> PeriodRange {
        PeriodRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
    }

    #[test]
    fn test_stats_for_three_periods() {
        let history = PeriodHistory::new(vec![
            range((2024, 1, 1), (2024, 1, 5)),
            range((2024, 1, 29), (2024, 2, 1)),
            range((2024, 2, 25), (2024, 3, 1)),
        ]);

        let stats = CycleStats::from_history(&history);

        assert_eq!(stats.periods_logged, 3);
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.avg_cycle_length, Some(27.5));
        assert_eq!(stats.shortest_cycle, Some(27));
        assert_eq!(stats.longest_cycle, Some(28));
        assert_eq!(stats.avg_period_length, Some(5.0));
    }

    #[test]
    fn test_stats_for_empty_history() {
        let stats = CycleStats::from_history(&PeriodHistory::default());

        assert_eq!(stats.periods_logged, 0);
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.avg_cycle_length, None);
        assert_eq!(stats.avg_period_length, None);
    }
}
