//! Raw, untyped view of a workbook: ordered sheets of header-keyed rows.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use indexmap::IndexMap;
use serde::Serialize;

use crate::core::error::ReportError;

/// A single cell after import. Spreadsheet types collapse to the three the
/// pipeline understands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Spreadsheet date or time serial. Displayed, never read as a number.
    Date(f64),
    Empty,
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// Text shown for the cell; numbers keep their spreadsheet spelling.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(value) | CellValue::Date(value) => crate::core::format::format_number(*value),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => CellValue::Empty,
            Data::String(text) => CellValue::Text(text.clone()),
            Data::Float(number) => CellValue::Number(*number),
            Data::Int(number) => CellValue::Number(*number as f64),
            Data::Bool(flag) => CellValue::Text(flag.to_string()),
            Data::DateTime(stamp) => CellValue::Date(stamp.as_f64()),
            Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
            Data::Error(err) => CellValue::Text(format!("#{err:?}")),
        }
    }
}

/// One sheet. `header` is the first row of the used range; `rows` are the
/// rows below it, each padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Zero-based sheet row of `rows[0]`, for error messages.
    pub first_data_row: usize,
    /// Cells keyed by absolute (row, column), used for unheadered blocks.
    #[serde(skip)]
    grid: Vec<Vec<CellValue>>,
    #[serde(skip)]
    origin: (usize, usize),
}

impl Table {
    fn from_range(range: &Range<Data>) -> Self {
        let origin = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or((0, 0));

        let grid = range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();

        Self::from_grid_at(grid, origin)
    }

    /// Build a table from cells anchored at `A1`; the first row is the header.
    pub fn from_grid(grid: Vec<Vec<CellValue>>) -> Self {
        Self::from_grid_at(grid, (0, 0))
    }

    fn from_grid_at(grid: Vec<Vec<CellValue>>, origin: (usize, usize)) -> Self {
        let header: Vec<String> = grid
            .first()
            .map(|row| row.iter().map(CellValue::display).collect())
            .unwrap_or_default();

        let width = header.len();
        let rows = grid
            .iter()
            .skip(1)
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self {
            header,
            rows,
            first_data_row: origin.0 + 1,
            grid,
            origin,
        }
    }

    /// Whether the sheet has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|header| header.trim() == name)
    }

    /// 1-based spreadsheet row number of data row `idx`.
    pub fn sheet_row_number(&self, idx: usize) -> usize {
        self.first_data_row + idx + 1
    }

    /// Cell at an absolute zero-based (row, column) position, ignoring headers.
    pub fn cell_at(&self, row: usize, col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        let (origin_row, origin_col) = self.origin;
        if row < origin_row || col < origin_col {
            return EMPTY;
        }
        self.grid
            .get(row - origin_row)
            .and_then(|cells| cells.get(col - origin_col))
            .unwrap_or(EMPTY)
    }
}

/// Ordered mapping from sheet name to its table, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: IndexMap<String, Table>,
}

impl Workbook {
    /// Parse any spreadsheet format calamine recognises (xlsx, xlsm, xlsb, xls, ods).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReportError> {
        let mut source = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let mut sheets = IndexMap::new();

        for name in source.sheet_names() {
            let range = source.worksheet_range(&name)?;
            sheets.insert(name, Table::from_range(&range));
        }

        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Result<&Table, ReportError> {
        self.sheets.get(name).ok_or_else(|| ReportError::MissingSheet {
            sheet: name.to_string(),
        })
    }
}
