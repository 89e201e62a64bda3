//! Workbook import: raw sheet tables, the fixed schema, and the typed
//! projection the rest of the pipeline consumes.

mod loader;
mod records;
pub mod schema;
mod table;

pub use loader::{LoadedWorkbook, WorkbookLoader};
pub use records::{CareerLists, CareerSuggestion, LoadWarning, OverviewRow, SolverProfile, TaskRow};
pub use table::{CellValue, Table, Workbook};
