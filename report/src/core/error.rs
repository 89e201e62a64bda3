//! Error taxonomy for report synthesis.
//!
//! Every variant carries enough context (sheet / column / row / stage) to log
//! precisely. None of it is meant for end users: callers surface
//! [`ReportError::user_message`] and log the structured value.

use thiserror::Error;

use crate::pipeline::Stage;

/// Generic notice shown to end users for any failure.
pub const USER_FAILURE_MESSAGE: &str = "Failed to load your report. Please contact support.";

#[derive(Debug, Error)]
pub enum ReportError {
    /// The byte buffer is not a readable spreadsheet.
    #[error("workbook could not be read: {0}")]
    UnreadableWorkbook(#[from] calamine::Error),

    /// A required sheet is absent (as opposed to present but empty).
    #[error("required sheet `{sheet}` is missing")]
    MissingSheet { sheet: String },

    /// A required column is absent from a sheet's header row.
    #[error("sheet `{sheet}` is missing required column `{column}`")]
    Schema { sheet: String, column: String },

    /// A cell could not be interpreted as its declared type.
    #[error("sheet `{sheet}`, column `{column}`, row {row}: cannot read {value:?} as {expected}")]
    TypeCoercion {
        sheet: String,
        column: String,
        /// 1-based spreadsheet row number.
        row: usize,
        value: String,
        expected: &'static str,
    },

    /// Metrics input is degenerate (no rows, or zero total tasks).
    #[error("metrics cannot be derived: {reason}")]
    DivisionByZero { reason: &'static str },

    /// A chart could not be rasterised.
    #[error("failed to render {chart} chart: {reason}")]
    Render { chart: &'static str, reason: String },

    /// Document layout or serialisation failed.
    #[error("failed to compose document: {0}")]
    Compose(String),

    /// The caller cancelled before the named stage started.
    #[error("synthesis cancelled before {stage}")]
    Cancelled { stage: Stage },

    /// The blocking worker running the synthesis panicked or was aborted.
    #[error("synthesis worker failed: {0}")]
    Worker(String),
}

impl ReportError {
    pub fn schema(sheet: &str, column: &str) -> Self {
        Self::Schema {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }
    }

    pub fn render(chart: &'static str, reason: impl ToString) -> Self {
        Self::Render {
            chart,
            reason: reason.to_string(),
        }
    }

    /// The only text an end user should ever see for this error.
    pub fn user_message(&self) -> &'static str {
        USER_FAILURE_MESSAGE
    }
}

impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        Self::Compose(err.to_string())
    }
}

impl From<png::DecodingError> for ReportError {
    fn from(err: png::DecodingError) -> Self {
        Self::Compose(format!("embedded chart is not a readable PNG: {err}"))
    }
}

/// A [`ReportError`] tagged with the stage the pipeline was in when it failed.
#[derive(Debug, Error)]
#[error("pipeline failed while {stage}: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: ReportError,
}

impl PipelineError {
    pub fn user_message(&self) -> &'static str {
        self.error.user_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_never_leaks_detail() {
        let err = ReportError::schema("Assessment Overview", "Student Score");
        assert_eq!(err.user_message(), USER_FAILURE_MESSAGE);
        assert!(err.to_string().contains("Student Score"));
        assert!(!err.user_message().contains("Student Score"));
    }

    #[test]
    fn coercion_error_names_location() {
        let err = ReportError::TypeCoercion {
            sheet: "Task Scores".into(),
            column: "Score (out of 5)".into(),
            row: 7,
            value: "n/a".into(),
            expected: "a number",
        };
        let text = err.to_string();
        assert!(text.contains("Task Scores"));
        assert!(text.contains("row 7"));
        assert!(text.contains("\"n/a\""));
    }
}
