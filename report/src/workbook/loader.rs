//! Schema projection from raw sheets to typed records.
//!
//! Policy, applied identically to the overview and task tables:
//! - a missing required column is a `Schema` error;
//! - a row with any required cell blank is dropped (and recorded);
//! - a non-blank cell that cannot be read as its declared type is a
//!   `TypeCoercion` error for the whole load;
//! - unknown columns are ignored.

use tracing::{debug, warn};

use crate::core::config::DefaultsConfig;
use crate::core::error::ReportError;

use super::records::{CareerSuggestion, LoadWarning, OverviewRow, SolverProfile, TaskRow};
use super::schema::{self, careers, overview, solver, summary, tasks};
use super::table::{CellValue, Table, Workbook};

/// Everything the rest of the pipeline consumes from one workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWorkbook {
    pub overview: Vec<OverviewRow>,
    pub tasks: Vec<TaskRow>,
    pub summary: String,
    pub profile: SolverProfile,
    pub careers: Vec<CareerSuggestion>,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkbookLoader {
    defaults: DefaultsConfig,
}

impl WorkbookLoader {
    pub fn new(defaults: DefaultsConfig) -> Self {
        Self { defaults }
    }

    pub fn load(&self, bytes: &[u8]) -> Result<LoadedWorkbook, ReportError> {
        let workbook = Workbook::from_bytes(bytes)?;
        self.project(&workbook)
    }

    /// Validate sheet presence and project every sheet through its schema.
    pub fn project(&self, workbook: &Workbook) -> Result<LoadedWorkbook, ReportError> {
        for name in schema::REQUIRED_SHEETS {
            workbook.sheet(name)?;
        }

        let mut warnings = Vec::new();
        let overview = load_overview(workbook.sheet(schema::OVERVIEW_SHEET)?, &mut warnings)?;
        let tasks = load_tasks(workbook.sheet(schema::TASKS_SHEET)?, &mut warnings)?;
        let summary = self.load_summary(workbook.sheet(schema::SUMMARY_SHEET)?);
        let profile = self.load_profile(workbook.sheet(schema::SOLVER_SHEET)?);
        let careers = load_careers(workbook.sheet(schema::CAREERS_SHEET)?)?;

        debug!(
            schema_version = schema::SCHEMA_VERSION,
            areas = overview.len(),
            tasks = tasks.len(),
            careers = careers.len(),
            warnings = warnings.len(),
            "workbook projected"
        );

        Ok(LoadedWorkbook {
            overview,
            tasks,
            summary,
            profile,
            careers,
            warnings,
        })
    }

    fn load_summary(&self, table: &Table) -> String {
        let (row, col) = summary::TEXT_CELL;
        match table.cell_at(row, col) {
            cell if cell.is_blank() => self.defaults.summary.clone(),
            cell => cell.display(),
        }
    }

    fn load_profile(&self, table: &Table) -> SolverProfile {
        let field = |column: &str, fallback: &str| {
            table
                .column_index(column)
                .and_then(|idx| table.rows.first().map(|row| &row[idx]))
                .filter(|cell| !cell.is_blank())
                .map(CellValue::display)
                .unwrap_or_else(|| fallback.to_string())
        };

        if table.is_empty() {
            debug!(sheet = schema::SOLVER_SHEET, "solver sheet empty, using defaults");
        }

        SolverProfile {
            name: field(solver::NAME, &self.defaults.solver_name),
            top_intelligence: field(solver::TOP_INTELLIGENCE, &self.defaults.not_available),
            recommended_track: field(solver::TRACK, &self.defaults.not_available),
        }
    }
}

/// Column positions for one sheet, resolved once against its header.
struct Projection<'t> {
    sheet: &'static str,
    table: &'t Table,
}

impl<'t> Projection<'t> {
    fn new(sheet: &'static str, table: &'t Table) -> Self {
        Self { sheet, table }
    }

    fn require(&self, columns: &[&str]) -> Result<Vec<usize>, ReportError> {
        columns
            .iter()
            .map(|column| {
                self.table
                    .column_index(column)
                    .ok_or_else(|| ReportError::schema(self.sheet, column))
            })
            .collect()
    }

    /// Yields `(row_number, cells)` for every row whose `required` cells are
    /// all filled. Dropped rows are recorded unless wholly blank.
    fn complete_rows<'a>(
        &'a self,
        required: &'a [(usize, &'a str)],
        warnings: &'a mut Vec<LoadWarning>,
    ) -> impl Iterator<Item = (usize, &'t [CellValue])> + 'a {
        self.table
            .rows
            .iter()
            .enumerate()
            .filter_map(move |(idx, cells)| {
                let row = self.table.sheet_row_number(idx);
                if cells.iter().all(CellValue::is_blank) {
                    return None;
                }
                if let Some((_, column)) = required.iter().find(|(col, _)| cells[*col].is_blank()) {
                    debug!(sheet = self.sheet, row, column, "dropping incomplete row");
                    warnings.push(LoadWarning::RowDropped {
                        sheet: self.sheet.to_string(),
                        row,
                        missing: column.to_string(),
                    });
                    return None;
                }
                Some((row, cells.as_slice()))
            })
    }

    fn number(&self, cell: &CellValue, column: &str, row: usize) -> Result<f64, ReportError> {
        let parsed = match cell {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => {
                let trimmed = text.trim();
                trimmed
                    .strip_suffix('%')
                    .unwrap_or(trimmed)
                    .trim()
                    .parse::<f64>()
                    .ok()
            }
            CellValue::Date(_) | CellValue::Empty => None,
        };

        parsed
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.coercion(cell, column, row, "a number"))
    }

    fn count(&self, cell: &CellValue, column: &str, row: usize) -> Result<u32, ReportError> {
        let value = self
            .number(cell, column, row)
            .map_err(|_| self.coercion(cell, column, row, "a whole number"))?;
        if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
            return Err(self.coercion(cell, column, row, "a whole number"));
        }
        Ok(value as u32)
    }

    fn coercion(&self, cell: &CellValue, column: &str, row: usize, expected: &'static str) -> ReportError {
        ReportError::TypeCoercion {
            sheet: self.sheet.to_string(),
            column: column.to_string(),
            row,
            value: cell.display(),
            expected,
        }
    }
}

fn range_check(
    warnings: &mut Vec<LoadWarning>,
    sheet: &str,
    column: &str,
    row: usize,
    value: f64,
    (min, max): (f64, f64),
) {
    if value < min || value > max {
        warn!(sheet, column, row, value, min, max, "value outside expected range");
        warnings.push(LoadWarning::OutOfRange {
            sheet: sheet.to_string(),
            column: column.to_string(),
            row,
            value,
            min,
            max,
        });
    }
}

fn load_overview(table: &Table, warnings: &mut Vec<LoadWarning>) -> Result<Vec<OverviewRow>, ReportError> {
    let projection = Projection::new(schema::OVERVIEW_SHEET, table);
    let cols = projection.require(&overview::REQUIRED)?;
    let required: Vec<(usize, &str)> = cols.iter().copied().zip(overview::REQUIRED).collect();

    let mut found = Vec::new();
    let mut rows = Vec::new();
    for (row, cells) in projection.complete_rows(&required, &mut found) {
        rows.push((row, cells));
    }
    warnings.append(&mut found);

    let mut out = Vec::with_capacity(rows.len());
    for (row, cells) in rows {
        let parsed = OverviewRow {
            area: cells[cols[0]].display(),
            tasks_total: projection.count(&cells[cols[1]], overview::TASKS_TOTAL, row)?,
            tasks_completed: projection.count(&cells[cols[2]], overview::TASKS_COMPLETED, row)?,
            total_score: projection.number(&cells[cols[3]], overview::TOTAL_SCORE, row)?,
            student_score: projection.number(&cells[cols[4]], overview::STUDENT_SCORE, row)?,
            overall_percent: projection.number(&cells[cols[5]], overview::OVERALL_PERCENT, row)?,
        };

        if !parsed.is_consistent() {
            warn!(
                area = %parsed.area,
                row,
                completed = parsed.tasks_completed,
                total = parsed.tasks_total,
                "more tasks completed than assigned"
            );
            warnings.push(LoadWarning::CompletedExceedsTotal {
                area: parsed.area.clone(),
                row,
                completed: parsed.tasks_completed,
                total: parsed.tasks_total,
            });
        }
        range_check(
            warnings,
            schema::OVERVIEW_SHEET,
            overview::OVERALL_PERCENT,
            row,
            parsed.overall_percent,
            (0.0, 100.0),
        );

        out.push(parsed);
    }

    Ok(out)
}

fn load_tasks(table: &Table, warnings: &mut Vec<LoadWarning>) -> Result<Vec<TaskRow>, ReportError> {
    let projection = Projection::new(schema::TASKS_SHEET, table);
    let cols = projection.require(&tasks::REQUIRED)?;
    let comments_col = table.column_index(tasks::COMMENTS);
    let required: Vec<(usize, &str)> = cols.iter().copied().zip(tasks::REQUIRED).collect();

    let mut found = Vec::new();
    let rows: Vec<_> = projection.complete_rows(&required, &mut found).collect();
    warnings.append(&mut found);

    let mut out = Vec::with_capacity(rows.len());
    for (row, cells) in rows {
        let score = projection.number(&cells[cols[2]], tasks::SCORE, row)?;
        range_check(warnings, schema::TASKS_SHEET, tasks::SCORE, row, score, (0.0, tasks::MAX_SCORE));

        out.push(TaskRow {
            area: cells[cols[0]].display(),
            task: cells[cols[1]].display(),
            score,
            comments: comments_col
                .map(|idx| &cells[idx])
                .filter(|cell| !cell.is_blank())
                .map(CellValue::display),
        });
    }

    Ok(out)
}

fn load_careers(table: &Table) -> Result<Vec<CareerSuggestion>, ReportError> {
    let projection = Projection::new(schema::CAREERS_SHEET, table);
    let cols = projection.require(&careers::REQUIRED)?;

    let optional = |cells: &[CellValue], idx: usize| {
        let cell = &cells[idx];
        (!cell.is_blank()).then(|| cell.display())
    };

    Ok(table
        .rows
        .iter()
        .filter(|cells| !cells.iter().all(CellValue::is_blank))
        .map(|cells| CareerSuggestion {
            career: optional(cells, cols[0]),
            university_degree: optional(cells, cols[1]),
            tvet_course: optional(cells, cols[2]),
            school: optional(cells, cols[3]),
        })
        .collect())
}
