//! Sheet and column names agreed with the upstream workbook producer.
//!
//! These strings are a versioned contract: renaming one here is a schema
//! change and every drifting workbook surfaces as a `Schema` error.

pub const SCHEMA_VERSION: u32 = 1;

pub const OVERVIEW_SHEET: &str = "Assessment Overview";
pub const TASKS_SHEET: &str = "Task Scores";
pub const SUMMARY_SHEET: &str = "Summary";
pub const SOLVER_SHEET: &str = "Siri Solvers Info";
pub const CAREERS_SHEET: &str = "Career Suggestions";

/// Every sheet the loader insists on, in validation order.
pub const REQUIRED_SHEETS: [&str; 5] = [
    OVERVIEW_SHEET,
    TASKS_SHEET,
    SUMMARY_SHEET,
    SOLVER_SHEET,
    CAREERS_SHEET,
];

pub mod overview {
    pub const AREA: &str = "Intelligence Area";
    pub const TASKS_TOTAL: &str = "Number of Tasks";
    pub const TASKS_COMPLETED: &str = "Tasks_Completed";
    pub const TOTAL_SCORE: &str = "Total Score";
    pub const STUDENT_SCORE: &str = "Student Score";
    pub const OVERALL_PERCENT: &str = "Overall %";

    pub const REQUIRED: [&str; 6] = [
        AREA,
        TASKS_TOTAL,
        TASKS_COMPLETED,
        TOTAL_SCORE,
        STUDENT_SCORE,
        OVERALL_PERCENT,
    ];
}

pub mod tasks {
    pub const AREA: &str = "Intelligence Area";
    pub const TASK: &str = "Task";
    pub const SCORE: &str = "Score (out of 5)";
    /// Optional column; rows without comments are kept.
    pub const COMMENTS: &str = "Comments";

    pub const REQUIRED: [&str; 3] = [AREA, TASK, SCORE];
    pub const MAX_SCORE: f64 = 5.0;
}

/// The narrative lives at a fixed cell of the unheadered summary block:
/// second row, third column.
pub mod summary {
    pub const TEXT_CELL: (usize, usize) = (1, 2);
}

/// Profile fields come from the first data row only.
pub mod solver {
    pub const NAME: &str = "Name";
    pub const TOP_INTELLIGENCE: &str = "Top Intelligence";
    pub const TRACK: &str = "Shaba Track";
}

pub mod careers {
    pub const CAREER: &str = "Career";
    pub const UNIVERSITY_DEGREE: &str = "Related University Degrees (Kenya/Online)";
    pub const TVET_COURSE: &str = "Related TVET Courses (Kenya/Online)";
    pub const SCHOOL: &str = "School";

    pub const REQUIRED: [&str; 4] = [CAREER, UNIVERSITY_DEGREE, TVET_COURSE, SCHOOL];
}
