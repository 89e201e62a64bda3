//! Typed rows projected out of the raw sheets.

use serde::{Deserialize, Serialize};

/// Aggregate scoring record for one intelligence area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub area: String,
    pub tasks_total: u32,
    pub tasks_completed: u32,
    pub total_score: f64,
    pub student_score: f64,
    pub overall_percent: f64,
}

impl OverviewRow {
    /// `false` when more tasks are marked completed than exist. Such rows are
    /// kept as-is and reported through a [`LoadWarning`].
    pub fn is_consistent(&self) -> bool {
        self.tasks_completed <= self.tasks_total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub area: String,
    pub task: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverProfile {
    pub name: String,
    pub top_intelligence: String,
    pub recommended_track: String,
}

/// One row of the career table. Each field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerSuggestion {
    pub career: Option<String>,
    pub university_degree: Option<String>,
    pub tvet_course: Option<String>,
    pub school: Option<String>,
}

/// The career table collapsed into display phrases: the first `limit`
/// non-empty entries of each column joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerLists {
    pub careers: String,
    pub university_degrees: String,
    pub tvet_courses: String,
    pub schools: String,
}

impl CareerLists {
    pub fn from_suggestions(rows: &[CareerSuggestion], limit: usize) -> Self {
        let join = |pick: fn(&CareerSuggestion) -> Option<&String>| {
            rows.iter()
                .filter_map(pick)
                .map(|entry| entry.trim())
                .filter(|entry| !entry.is_empty())
                .take(limit)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            careers: join(|row| row.career.as_ref()),
            university_degrees: join(|row| row.university_degree.as_ref()),
            tvet_courses: join(|row| row.tvet_course.as_ref()),
            schools: join(|row| row.school.as_ref()),
        }
    }
}

/// Well-typed but suspicious data found while loading. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    CompletedExceedsTotal {
        area: String,
        row: usize,
        completed: u32,
        total: u32,
    },
    OutOfRange {
        sheet: String,
        column: String,
        row: usize,
        value: f64,
        min: f64,
        max: f64,
    },
    RowDropped {
        sheet: String,
        row: usize,
        missing: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn suggestion(career: Option<&str>, school: Option<&str>) -> CareerSuggestion {
        CareerSuggestion {
            career: career.map(str::to_string),
            school: school.map(str::to_string),
            ..CareerSuggestion::default()
        }
    }

    #[test]
    fn lists_skip_blanks_and_cap_entries() {
        let rows: Vec<_> = ["A", "", "B", "C", "D", "E", "F"]
            .iter()
            .map(|name| suggestion(Some(name), None))
            .collect();

        let lists = CareerLists::from_suggestions(&rows, 5);
        assert_eq!(lists.careers, "A, B, C, D, E");
    }

    #[test]
    fn all_empty_column_joins_to_empty_string() {
        let rows = vec![suggestion(Some("Engineer"), None), suggestion(None, None)];
        let lists = CareerLists::from_suggestions(&rows, 5);
        assert_eq!(lists.schools, "");
        assert_eq!(lists.university_degrees, "");
        assert_eq!(lists.careers, "Engineer");
    }

    #[test]
    fn overview_consistency() {
        let mut row = OverviewRow {
            area: "Logical".into(),
            tasks_total: 11,
            tasks_completed: 11,
            total_score: 55.0,
            student_score: 40.0,
            overall_percent: 72.7,
        };
        assert!(row.is_consistent());
        row.tasks_completed = 12;
        assert!(!row.is_consistent());
    }
}
