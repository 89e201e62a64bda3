//! Summary statistics derived from the overview table.

use serde::{Deserialize, Serialize};

use crate::core::error::ReportError;
use crate::core::format;
use crate::workbook::OverviewRow;

/// Headline metrics for one solver. Values keep full precision; round only
/// through [`Metrics::average_score_label`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean of `Student Score` across areas.
    pub average_score: f64,
    /// `100 * Σ completed / Σ total`.
    pub completion_percent: f64,
    pub areas: usize,
    pub tasks_total: u64,
    pub tasks_completed: u64,
}

impl Metrics {
    /// Fails with `DivisionByZero` rather than ever yielding NaN or infinity.
    pub fn derive(rows: &[OverviewRow]) -> Result<Self, ReportError> {
        if rows.is_empty() {
            return Err(ReportError::DivisionByZero {
                reason: "overview table has no rows",
            });
        }

        let tasks_total: u64 = rows.iter().map(|row| u64::from(row.tasks_total)).sum();
        let tasks_completed: u64 = rows.iter().map(|row| u64::from(row.tasks_completed)).sum();
        if tasks_total == 0 {
            return Err(ReportError::DivisionByZero {
                reason: "overview table assigns zero tasks",
            });
        }

        let average_score = mean(rows.iter().map(|row| row.student_score));
        let completion_percent = 100.0 * tasks_completed as f64 / tasks_total as f64;

        if !average_score.is_finite() || !completion_percent.is_finite() {
            return Err(ReportError::DivisionByZero {
                reason: "overview values overflow",
            });
        }

        Ok(Self {
            average_score,
            completion_percent,
            areas: rows.len(),
            tasks_total,
            tasks_completed,
        })
    }

    pub fn average_score_label(&self) -> String {
        format::format_score(self.average_score)
    }

    pub fn completion_label(&self) -> String {
        format::format_percent(self.completion_percent)
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let len = values.len();
    values.sum::<f64>() / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(total: u32, completed: u32, score: f64) -> OverviewRow {
        OverviewRow {
            area: "Area".into(),
            tasks_total: total,
            tasks_completed: completed,
            total_score: 55.0,
            student_score: score,
            overall_percent: 50.0,
        }
    }

    #[test]
    fn nine_areas_ninety_of_ninety_nine() {
        let mut rows: Vec<_> = (0..9).map(|_| row(11, 10, 40.0)).collect();
        rows[0].student_score = 49.0;

        let metrics = Metrics::derive(&rows).unwrap();
        assert_eq!(metrics.tasks_total, 99);
        assert_eq!(metrics.tasks_completed, 90);
        assert_eq!(metrics.completion_label(), "90.9%");
        assert_eq!(metrics.average_score, 41.0);
        assert_eq!(metrics.average_score_label(), "41.0");
        // Full precision is retained internally.
        assert!((metrics.completion_percent - 90.909_090_909).abs() < 1e-6);
    }

    #[test]
    fn empty_overview_is_division_by_zero() {
        assert!(matches!(
            Metrics::derive(&[]),
            Err(ReportError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn zero_total_tasks_is_division_by_zero() {
        let rows = vec![row(0, 0, 10.0), row(0, 0, 20.0)];
        assert!(matches!(
            Metrics::derive(&rows),
            Err(ReportError::DivisionByZero { .. })
        ));
    }

    proptest! {
        #[test]
        fn completion_bounded_and_average_is_mean(
            raw in prop::collection::vec((0u32..50, 0u32..=100, -100.0f64..100.0), 1..20)
        ) {
            let rows: Vec<_> = raw
                .iter()
                .map(|(total, pct, score)| row(*total, total * pct / 100, *score))
                .collect();
            prop_assume!(rows.iter().any(|r| r.tasks_total > 0));

            let metrics = Metrics::derive(&rows).unwrap();
            prop_assert!((0.0..=100.0).contains(&metrics.completion_percent));

            let expected = rows.iter().map(|r| r.student_score).sum::<f64>() / rows.len() as f64;
            prop_assert!((metrics.average_score - expected).abs() < 1e-9);
        }

        #[test]
        fn zero_totals_never_yield_nan(scores in prop::collection::vec(-10.0f64..10.0, 0..10)) {
            let rows: Vec<_> = scores.iter().map(|score| row(0, 0, *score)).collect();
            let is_div_zero = matches!(Metrics::derive(&rows), Err(ReportError::DivisionByZero { .. }));
            prop_assert!(is_div_zero);
        }
    }
}
