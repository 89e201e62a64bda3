use std::sync::Arc;

use time::macros::format_description;
use time::Date;
use tracing::{debug, warn};

use crate::charts::ChartImage;
use crate::core::config::ReportConfig;
use crate::core::error::ReportError;
use crate::core::format::{format_number, format_percent, format_score};
use crate::metrics::Metrics;
use crate::workbook::{CareerLists, OverviewRow, SolverProfile, TaskRow};

use super::fonts::Fonts;
use super::layout::{Layout, PageGeometry};
use super::pdf::PdfWriter;
use super::text::TextPolicy;
use super::{Block, ComposedDocument, Document, Section, SectionKind, TextStyle};

/// Everything one report is built from. Borrowed so the pipeline keeps
/// ownership of the loaded data and can still hand it back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub profile: &'a SolverProfile,
    pub metrics: &'a Metrics,
    pub overview: &'a [OverviewRow],
    pub tasks: &'a [TaskRow],
    pub careers: &'a CareerLists,
    pub summary: &'a str,
    pub bar_chart: &'a ChartImage,
    pub radar_chart: &'a ChartImage,
    /// Printed under the title when present.
    pub issued_on: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct DocumentComposer {
    config: Arc<ReportConfig>,
}

impl DocumentComposer {
    pub fn new(config: Arc<ReportConfig>) -> Self {
        Self { config }
    }

    pub fn title(&self, profile: &SolverProfile) -> String {
        format!("{} - {}", self.config.branding.title_prefix, profile.name)
    }

    /// Build the section tree in the fixed report order.
    pub fn build(&self, content: &ReportContent<'_>) -> Document {
        let sections = vec![
            self.title_section(content),
            self.summary_section(content),
            self.scores_section(content),
            Section {
                kind: SectionKind::BarChart,
                heading: Some("Scores by Intelligence".to_string()),
                body: vec![Block::Image {
                    png: content.bar_chart.png.clone(),
                    width_fraction: 1.0,
                }],
            },
            Section {
                kind: SectionKind::RadarChart,
                heading: Some("Overall Intelligence Strengths".to_string()),
                body: vec![Block::Image {
                    png: content.radar_chart.png.clone(),
                    width_fraction: 0.85,
                }],
            },
            self.careers_section(content),
            Section {
                kind: SectionKind::Disclaimer,
                heading: None,
                body: vec![Block::paragraph(
                    self.config.sections.disclaimer.clone(),
                    TextStyle::Note,
                )],
            },
        ];

        Document {
            title: self.title(content.profile),
            sections,
        }
    }

    /// Lay out and serialise a built document.
    pub fn render(&self, document: &Document) -> Result<ComposedDocument, ReportError> {
        let geometry = PageGeometry::new(&self.config.page);
        let fonts = Fonts::new(self.config.branding.font_family);
        let policy = TextPolicy::new(self.config.text.placeholder);

        let laid = Layout::new(geometry, fonts, &policy, self.config.accent().unit()).run(document)?;
        let replaced_chars = policy.replaced();
        if replaced_chars > 0 {
            warn!(
                replaced = replaced_chars,
                placeholder = %self.config.text.placeholder,
                "document text contained characters outside the font encoding"
            );
        }

        let writer = PdfWriter {
            geometry,
            fonts,
            policy: &policy,
        };
        let bytes = writer.write(&document.title, &laid.pages, &laid.images)?;
        debug!(
            pages = laid.pages.len(),
            sections = document.sections.len(),
            bytes = bytes.len(),
            "document composed"
        );

        Ok(ComposedDocument {
            bytes,
            page_count: laid.pages.len(),
            section_count: document.sections.len(),
            replaced_chars,
        })
    }

    pub fn compose(&self, content: &ReportContent<'_>) -> Result<ComposedDocument, ReportError> {
        self.render(&self.build(content))
    }

    fn title_section(&self, content: &ReportContent<'_>) -> Section {
        let mut body = vec![Block::paragraph(self.title(content.profile), TextStyle::Title)];
        if let Some(date) = content.issued_on {
            let format = format_description!("[day] [month repr:long] [year]");
            match date.format(&format) {
                Ok(label) => body.push(Block::paragraph(format!("Issued {label}"), TextStyle::Note)),
                Err(err) => warn!(error = %err, "issue date could not be formatted"),
            }
        }
        Section {
            kind: SectionKind::Title,
            heading: None,
            body,
        }
    }

    fn summary_section(&self, content: &ReportContent<'_>) -> Section {
        let mut body = vec![Block::paragraph(
            format!(
                "Welcome, {}! This report summarizes your performance across {} psychometric tasks \
                 in the Uwazi assessment. It is intended to give insight into your learning strengths \
                 and future pathways.",
                content.profile.name, content.metrics.tasks_total
            ),
            TextStyle::Body,
        )];

        // Each non-blank line of the workbook summary becomes its own paragraph.
        body.extend(
            content
                .summary
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Block::paragraph(line, TextStyle::Body)),
        );

        body.push(Block::KeyValueList(vec![
            ("Average Score".to_string(), content.metrics.average_score_label()),
            ("Task Completion".to_string(), content.metrics.completion_label()),
        ]));

        Section {
            kind: SectionKind::Summary,
            heading: Some("Intelligence Summary".to_string()),
            body,
        }
    }

    fn scores_section(&self, content: &ReportContent<'_>) -> Section {
        let mut body = vec![Block::KeyValueList(
            content
                .overview
                .iter()
                .map(|row| {
                    (
                        row.area.clone(),
                        format!(
                            "{} ({})",
                            format_number(row.student_score),
                            format_percent(row.overall_percent)
                        ),
                    )
                })
                .collect(),
        )];

        if self.config.sections.include_task_table && !content.tasks.is_empty() {
            body.push(Block::paragraph("Task Scores and Insights", TextStyle::Subheading));
            body.push(Block::Table {
                header: ["Intelligence Area", "Task", "Score", "Comments"]
                    .map(String::from)
                    .to_vec(),
                rows: content
                    .tasks
                    .iter()
                    .map(|task| {
                        vec![
                            task.area.clone(),
                            task.task.clone(),
                            format_score(task.score),
                            task.comments.clone().unwrap_or_default(),
                        ]
                    })
                    .collect(),
                widths: vec![2.2, 3.0, 1.0, 3.8],
            });
        }

        Section {
            kind: SectionKind::Scores,
            heading: Some("Scores by Intelligence Area".to_string()),
            body,
        }
    }

    fn careers_section(&self, content: &ReportContent<'_>) -> Section {
        let careers = content.careers;
        let items = [
            ("Top Intelligence", content.profile.top_intelligence.as_str()),
            ("Recommended Shaba Track", content.profile.recommended_track.as_str()),
            ("Suggested Careers", careers.careers.as_str()),
            ("University Programs", careers.university_degrees.as_str()),
            ("TVET Programs", careers.tvet_courses.as_str()),
            ("Schools", careers.schools.as_str()),
        ];

        Section {
            kind: SectionKind::Careers,
            heading: Some("Career Recommendations".to_string()),
            body: vec![Block::KeyValueList(
                items
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            )],
        }
    }
}
