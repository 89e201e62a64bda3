//! Workbook fixtures written as real `.xlsx` bytes.

#![allow(dead_code)]

use report::ReportConfig;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Written as a real date cell (`yyyy-mm-dd` number format).
    Date(u16, u8, u8),
    Blank,
}

pub fn t(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub fn n(value: f64) -> Cell {
    Cell::Number(value)
}

#[derive(Debug, Clone)]
pub struct SheetFixture {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone)]
pub struct WorkbookFixture {
    pub sheets: Vec<SheetFixture>,
}

pub const AREAS: [&str; 9] = [
    "Linguistic",
    "Logical-Mathematical",
    "Spatial",
    "Bodily-Kinesthetic",
    "Musical",
    "Interpersonal",
    "Intrapersonal",
    "Naturalist",
    "Existential",
];

impl WorkbookFixture {
    /// Nine areas of eleven tasks each (99 total), ten completed per area.
    pub fn standard() -> Self {
        let mut overview = vec![vec![
            t("Intelligence Area"),
            t("Number of Tasks"),
            t("Tasks_Completed"),
            t("Total Score"),
            t("Student Score"),
            t("Overall %"),
            t("Notes"),
        ]];
        for (idx, area) in AREAS.iter().enumerate() {
            let score = 30.0 + idx as f64;
            overview.push(vec![
                t(area),
                n(11.0),
                n(10.0),
                n(55.0),
                n(score),
                n(score / 55.0 * 100.0),
                t("ignored"),
            ]);
        }

        let mut tasks = vec![vec![
            t("Intelligence Area"),
            t("Task"),
            t("Score (out of 5)"),
            t("Comments"),
        ]];
        for area in AREAS {
            tasks.push(vec![t(area), t(&format!("{area} puzzle")), n(4.0), t("Solid, steady work.")]);
            tasks.push(vec![t(area), t(&format!("{area} challenge")), n(3.0), Cell::Blank]);
        }

        let summary = vec![
            vec![t("Uwazi"), Cell::Blank, Cell::Blank],
            vec![
                t("Narrative"),
                t("Summary"),
                t("Amani reasons carefully and works well with others."),
            ],
        ];

        let solver = vec![
            vec![t("ID"), t("Name"), t("Age"), t("Top Intelligence"), t("Shaba Track")],
            vec![n(17.0), t("Amani Wanjiru"), n(15.0), t("Logical-Mathematical"), t("STEM")],
        ];

        let mut careers = vec![vec![
            t("Career"),
            t("Related University Degrees (Kenya/Online)"),
            t("Related TVET Courses (Kenya/Online)"),
            t("School"),
        ]];
        for idx in 1..=6 {
            careers.push(vec![
                t(&format!("Career {idx}")),
                t(&format!("Degree {idx}")),
                if idx % 2 == 0 { Cell::Blank } else { t(&format!("Course {idx}")) },
                Cell::Blank,
            ]);
        }

        Self {
            sheets: vec![
                SheetFixture {
                    name: "Assessment Overview".into(),
                    rows: overview,
                },
                SheetFixture {
                    name: "Task Scores".into(),
                    rows: tasks,
                },
                SheetFixture {
                    name: "Summary".into(),
                    rows: summary,
                },
                SheetFixture {
                    name: "Siri Solvers Info".into(),
                    rows: solver,
                },
                SheetFixture {
                    name: "Career Suggestions".into(),
                    rows: careers,
                },
            ],
        }
    }

    pub fn sheet_mut(&mut self, name: &str) -> &mut SheetFixture {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .unwrap_or_else(|| panic!("fixture has no sheet {name}"))
    }

    pub fn without_sheet(mut self, name: &str) -> Self {
        self.sheets.retain(|sheet| sheet.name != name);
        self
    }

    /// Remove a column (by header text) from a headed sheet.
    pub fn without_column(mut self, sheet: &str, column: &str) -> Self {
        let sheet = self.sheet_mut(sheet);
        let idx = sheet.rows[0]
            .iter()
            .position(|cell| *cell == t(column))
            .unwrap_or_else(|| panic!("no column {column}"));
        for row in &mut sheet.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        self
    }

    pub fn to_xlsx(&self) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name).unwrap();
            for (row, cells) in sheet.rows.iter().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    let (row, col) = (row as u32, col as u16);
                    match cell {
                        Cell::Text(value) => {
                            worksheet.write_string(row, col, value).unwrap();
                        }
                        Cell::Number(value) => {
                            worksheet.write_number(row, col, *value).unwrap();
                        }
                        Cell::Date(year, month, day) => {
                            let date = ExcelDateTime::from_ymd(*year, *month, *day).unwrap();
                            worksheet.write_datetime_with_format(row, col, &date, &date_format).unwrap();
                        }
                        Cell::Blank => {}
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }
}

/// Default config with small charts. System fonts stay on so chart labels
/// are really drawn.
pub fn test_config() -> ReportConfig {
    let mut config = ReportConfig::default();
    config.charts.width_px = 450;
    config.charts.height_px = 270;
    config
}
