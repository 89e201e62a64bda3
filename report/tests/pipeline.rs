mod common;

use std::sync::Arc;

use common::{n, t, test_config, Cell, WorkbookFixture};
use pretty_assertions::assert_eq;
use report::workbook::{LoadWarning, Workbook, WorkbookLoader};
use report::{CancelFlag, ReportError, ReportPipeline, RunOptions, Stage};

fn pipeline() -> ReportPipeline {
    ReportPipeline::new(test_config()).unwrap()
}

fn pdf_page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
}

#[test]
fn nine_area_workbook_produces_full_report() {
    let output = pipeline().synthesize(&WorkbookFixture::standard().to_xlsx()).unwrap();

    assert_eq!(output.metrics.tasks_total, 99);
    assert_eq!(output.metrics.tasks_completed, 90);
    assert_eq!(output.metrics.completion_label(), "90.9%");
    assert_eq!(output.metrics.average_score_label(), "34.0");
    assert_eq!(output.overview.len(), 9);
    assert_eq!(output.overview[0].area, "Linguistic");
    assert_eq!(output.tasks.len(), 18);

    assert_eq!(output.profile.name, "Amani Wanjiru");
    assert_eq!(output.profile.recommended_track, "STEM");
    assert_eq!(output.summary, "Amani reasons carefully and works well with others.");
    assert_eq!(output.filename, "Amani_Wanjiru_Report.pdf");
    assert_eq!(output.content_type, "application/pdf");

    assert!(output.document.bytes.starts_with(b"%PDF-"));
    assert_eq!(output.document.section_count, 7);
    assert_eq!(pdf_page_count(&output.document.bytes), output.document.page_count);
    assert_eq!(output.document.replaced_chars, 0);
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn missing_student_score_column_halts_while_loading() {
    let bytes = WorkbookFixture::standard()
        .without_column("Assessment Overview", "Student Score")
        .to_xlsx();
    let err = pipeline().synthesize(&bytes).unwrap_err();

    assert_eq!(err.stage, Stage::Loading);
    match err.error {
        ReportError::Schema { sheet, column } => {
            assert_eq!(sheet, "Assessment Overview");
            assert_eq!(column, "Student Score");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn empty_solver_sheet_falls_back_to_defaults() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Siri Solvers Info").rows.clear();
    let output = pipeline().synthesize(&fixture.to_xlsx()).unwrap();

    assert_eq!(output.profile.name, "Unnamed Solver");
    assert_eq!(output.profile.top_intelligence, "Not Available");
    assert_eq!(output.profile.recommended_track, "Not Available");
    assert_eq!(output.filename, "Unnamed_Solver_Report.pdf");
}

#[test]
fn non_latin_comments_are_replaced_not_fatal() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Task Scores").rows[1][3] = t("Kazi nzuri 很好 🙂");
    fixture.sheet_mut("Siri Solvers Info").rows[1][1] = t("Zoë Ндлову");
    let output = pipeline().synthesize(&fixture.to_xlsx()).unwrap();

    // 2 CJK + 1 emoji in the comment; 6 Cyrillic letters in the name, which
    // appears in the title and the welcome line.
    assert_eq!(output.document.replaced_chars, 3 + 6 * 2);
    assert_eq!(output.filename, "Zoë_Ндлову_Report.pdf");
    assert_eq!(pdf_page_count(&output.document.bytes), output.document.page_count);
}

#[test]
fn loading_the_same_bytes_twice_is_identical() {
    let bytes = WorkbookFixture::standard().to_xlsx();
    assert_eq!(Workbook::from_bytes(&bytes).unwrap(), Workbook::from_bytes(&bytes).unwrap());

    let loader = WorkbookLoader::default();
    assert_eq!(loader.load(&bytes).unwrap(), loader.load(&bytes).unwrap());
}

#[test]
fn composition_is_deterministic() {
    let pipeline = pipeline();
    let bytes = WorkbookFixture::standard().to_xlsx();
    let first = pipeline.synthesize(&bytes).unwrap();
    let second = pipeline.synthesize(&bytes).unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.document.section_count, second.document.section_count);
    assert_eq!(first.document.page_count, second.document.page_count);
    assert_eq!(first.bar_chart.png, second.bar_chart.png);
    assert_eq!(first.document.bytes, second.document.bytes);
}

#[test]
fn empty_career_column_joins_to_empty_string() {
    let output = pipeline().synthesize(&WorkbookFixture::standard().to_xlsx()).unwrap();
    let lists = &output.career_lists;

    assert_eq!(lists.schools, "");
    // Six careers on the sheet, capped at five.
    assert_eq!(lists.careers, "Career 1, Career 2, Career 3, Career 4, Career 5");
    assert_eq!(lists.tvet_courses, "Course 1, Course 3, Course 5");
}

#[test]
fn missing_sheet_differs_from_empty_sheet() {
    let missing = WorkbookFixture::standard().without_sheet("Summary").to_xlsx();
    let err = pipeline().synthesize(&missing).unwrap_err();
    assert_eq!(err.stage, Stage::Loading);
    assert!(matches!(err.error, ReportError::MissingSheet { ref sheet } if sheet == "Summary"));

    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Summary").rows.clear();
    let output = pipeline().synthesize(&fixture.to_xlsx()).unwrap();
    assert_eq!(output.summary, "No summary available");
}

#[test]
fn zero_tasks_fail_before_rendering() {
    let mut fixture = WorkbookFixture::standard();
    for row in fixture.sheet_mut("Assessment Overview").rows.iter_mut().skip(1) {
        row[1] = n(0.0);
        row[2] = n(0.0);
    }
    let err = pipeline().synthesize(&fixture.to_xlsx()).unwrap_err();

    assert_eq!(err.stage, Stage::Deriving);
    assert!(matches!(err.error, ReportError::DivisionByZero { .. }));
}

#[test]
fn incomplete_rows_are_dropped_in_both_tables() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Assessment Overview").rows[2][4] = Cell::Blank;
    fixture.sheet_mut("Task Scores").rows[3][2] = Cell::Blank;
    let output = pipeline().synthesize(&fixture.to_xlsx()).unwrap();

    assert_eq!(output.overview.len(), 8);
    assert_eq!(output.tasks.len(), 17);
    let dropped: Vec<_> = output
        .warnings
        .iter()
        .filter_map(|warning| match warning {
            LoadWarning::RowDropped { sheet, row, .. } => Some((sheet.as_str(), *row)),
            _ => None,
        })
        .collect();
    assert_eq!(dropped, vec![("Assessment Overview", 3), ("Task Scores", 4)]);
}

#[test]
fn uncoercible_score_names_sheet_column_and_row() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Task Scores").rows[5][2] = t("four");
    let err = pipeline().synthesize(&fixture.to_xlsx()).unwrap_err();

    assert_eq!(err.stage, Stage::Loading);
    match err.error {
        ReportError::TypeCoercion { sheet, column, row, .. } => {
            assert_eq!(sheet, "Task Scores");
            assert_eq!(column, "Score (out of 5)");
            assert_eq!(row, 6);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn date_typed_into_a_score_column_is_rejected() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Assessment Overview").rows[3][4] = Cell::Date(2024, 3, 5);
    let err = pipeline().synthesize(&fixture.to_xlsx()).unwrap_err();

    assert_eq!(err.stage, Stage::Loading);
    match err.error {
        ReportError::TypeCoercion { sheet, column, row, .. } => {
            assert_eq!(sheet, "Assessment Overview");
            assert_eq!(column, "Student Score");
            assert_eq!(row, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn radar_values_out_of_range_are_clamped_with_warning() {
    let mut fixture = WorkbookFixture::standard();
    fixture.sheet_mut("Assessment Overview").rows[1][5] = n(140.0);
    let output = pipeline().synthesize(&fixture.to_xlsx()).unwrap();

    assert_eq!(output.radar_chart.warnings.len(), 1);
    assert!(output
        .warnings
        .iter()
        .any(|warning| matches!(warning, LoadWarning::OutOfRange { value, .. } if *value == 140.0)));
}

#[test]
fn charts_without_fonts_fail_while_rendering() {
    let mut config = test_config();
    config.charts.load_system_fonts = false;
    config.charts.font_files.clear();
    let err = ReportPipeline::new(config)
        .unwrap()
        .synthesize(&WorkbookFixture::standard().to_xlsx())
        .unwrap_err();

    assert_eq!(err.stage, Stage::Rendering);
    assert!(matches!(err.error, ReportError::Render { chart: "bar", .. }));
}

#[test]
fn cancelled_run_stops_at_the_next_boundary() {
    let options = RunOptions {
        cancel: CancelFlag::new(),
        ..RunOptions::default()
    };
    options.cancel.cancel();
    let err = pipeline()
        .synthesize_with(&WorkbookFixture::standard().to_xlsx(), &options)
        .unwrap_err();

    assert!(matches!(err.error, ReportError::Cancelled { .. }));
    assert_eq!(err.user_message(), "Failed to load your report. Please contact support.");
}

#[test]
fn display_view_inlines_charts() {
    let output = pipeline().synthesize(&WorkbookFixture::standard().to_xlsx()).unwrap();
    let view = serde_json::to_value(output.view()).unwrap();

    assert_eq!(view["task_completion"], "90.9%");
    assert_eq!(view["filename"], "Amani_Wanjiru_Report.pdf");
    assert_eq!(view["bar_chart"]["kind"], "bar");
    assert!(view["bar_chart"]["data_uri"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(view["overview"].as_array().unwrap().len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_pipeline() {
    let pipeline = Arc::new(pipeline());
    let bytes = WorkbookFixture::standard().to_xlsx();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let bytes = bytes.clone();
            tokio::spawn(async move { pipeline.synthesize_async(bytes, RunOptions::default()).await })
        })
        .collect();

    let mut pages = Vec::new();
    for handle in handles {
        let output = handle.await.unwrap().unwrap();
        assert_eq!(output.metrics.completion_label(), "90.9%");
        pages.push(output.document.page_count);
    }
    assert!(pages.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn branding_and_page_size_come_from_config() {
    let config = report::ReportConfig::from_toml_str(
        r##"
        [branding]
        title_prefix = "Siri Solvers Report"
        font_family = "courier"

        [page]
        size = "letter"
        margin_pt = 54.0

        [sections]
        include_task_table = false
        "##,
    )
    .unwrap();

    let output = ReportPipeline::new(config)
        .unwrap()
        .synthesize(&WorkbookFixture::standard().to_xlsx())
        .unwrap();

    let pdf = lopdf::Document::load_mem(&output.document.bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), output.document.page_count);
    let first_page = pdf.get_pages().into_values().next().unwrap();
    let media_box = pdf
        .get_object(first_page)
        .and_then(|page| page.as_dict())
        .and_then(|page| page.get(b"Parent"))
        .and_then(|parent| parent.as_reference())
        .and_then(|parent| pdf.get_dictionary(parent))
        .and_then(|pages| pages.get(b"MediaBox"))
        .and_then(|media_box| media_box.as_array())
        .unwrap();
    assert_eq!(media_box[2].as_float().unwrap(), 612.0);
}
