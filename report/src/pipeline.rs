//! The synthesis entry point.
//!
//! One call walks `Idle → Loading → Deriving → Rendering → Composing → Done`
//! and stops at the first failure. Nothing is retried: the input is an
//! already-fetched byte buffer and every stage is deterministic.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::charts::{ChartImage, ChartRenderer};
use crate::core::cancel::CancelFlag;
use crate::core::config::{ConfigError, ReportConfig};
use crate::core::error::{PipelineError, ReportError};
use crate::core::format::report_filename;
use crate::document::{ComposedDocument, DocumentComposer, ReportContent};
use crate::metrics::Metrics;
use crate::workbook::{CareerLists, LoadWarning, OverviewRow, SolverProfile, TaskRow, WorkbookLoader};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Loading,
    Deriving,
    Rendering,
    Composing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Idle => "idle",
            Stage::Loading => "loading",
            Stage::Deriving => "deriving",
            Stage::Rendering => "rendering",
            Stage::Composing => "composing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// Per-call options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Date printed under the report title. The pipeline never reads the clock.
    pub issued_on: Option<Date>,
    pub cancel: CancelFlag,
}

/// Everything one synthesis produces: the display payload and the document.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub run_id: Uuid,
    pub metrics: Metrics,
    pub bar_chart: ChartImage,
    pub radar_chart: ChartImage,
    pub document: ComposedDocument,
    pub profile: SolverProfile,
    pub overview: Vec<OverviewRow>,
    pub tasks: Vec<TaskRow>,
    pub career_lists: CareerLists,
    pub summary: String,
    /// Suggested download name, `{solver}_Report.pdf`.
    pub filename: String,
    pub content_type: &'static str,
    pub warnings: Vec<LoadWarning>,
}

impl ReportOutput {
    /// Serialisable view for an interactive shell, charts inlined as data URIs.
    pub fn view(&self) -> ReportView<'_> {
        ReportView {
            run_id: self.run_id.to_string(),
            profile: &self.profile,
            metrics: &self.metrics,
            average_score: self.metrics.average_score_label(),
            task_completion: self.metrics.completion_label(),
            summary: &self.summary,
            overview: &self.overview,
            tasks: &self.tasks,
            career_lists: &self.career_lists,
            bar_chart: ChartView::new(&self.bar_chart),
            radar_chart: ChartView::new(&self.radar_chart),
            filename: &self.filename,
            content_type: self.content_type,
            page_count: self.document.page_count,
            warnings: &self.warnings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub run_id: String,
    pub profile: &'a SolverProfile,
    pub metrics: &'a Metrics,
    pub average_score: String,
    pub task_completion: String,
    pub summary: &'a str,
    pub overview: &'a [OverviewRow],
    pub tasks: &'a [TaskRow],
    pub career_lists: &'a CareerLists,
    pub bar_chart: ChartView<'a>,
    pub radar_chart: ChartView<'a>,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub page_count: usize,
    pub warnings: &'a [LoadWarning],
}

#[derive(Debug, Serialize)]
pub struct ChartView<'a> {
    #[serde(flatten)]
    pub image: &'a ChartImage,
    pub data_uri: String,
}

impl<'a> ChartView<'a> {
    fn new(image: &'a ChartImage) -> Self {
        Self {
            image,
            data_uri: image.data_uri(),
        }
    }
}

/// Stage bookkeeping for one call.
struct Run<'a> {
    stage: Stage,
    cancel: &'a CancelFlag,
}

impl<'a> Run<'a> {
    fn new(cancel: &'a CancelFlag) -> Self {
        Self {
            stage: Stage::Idle,
            cancel,
        }
    }

    fn checkpoint(&self, next: Stage) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            warn!(stage = %self.stage, next = %next, "synthesis cancelled");
            return Err(PipelineError {
                stage: self.stage,
                error: ReportError::Cancelled { stage: next },
            });
        }
        Ok(())
    }

    fn enter(&mut self, next: Stage) -> Result<(), PipelineError> {
        self.checkpoint(next)?;
        debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
        Ok(())
    }

    fn fail(&mut self, error: ReportError) -> PipelineError {
        let stage = self.stage;
        debug!(from = %stage, to = %Stage::Failed, "stage transition");
        self.stage = Stage::Failed;
        PipelineError { stage, error }
    }

    fn finish(&mut self) {
        debug!(from = %self.stage, to = %Stage::Done, "stage transition");
        self.stage = Stage::Done;
    }
}

/// Loader, renderer and composer wired to one configuration. Holds no
/// per-request state, so one pipeline can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    config: Arc<ReportConfig>,
    loader: WorkbookLoader,
    renderer: ChartRenderer,
    composer: DocumentComposer,
}

impl ReportPipeline {
    pub fn new(config: ReportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let renderer = ChartRenderer::new(&config.charts, config.accent(), config.text.placeholder);
        Ok(Self {
            loader: WorkbookLoader::new(config.defaults.clone()),
            renderer,
            composer: DocumentComposer::new(Arc::clone(&config)),
            config,
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn synthesize(&self, workbook: &[u8]) -> Result<ReportOutput, PipelineError> {
        self.synthesize_with(workbook, &RunOptions::default())
    }

    pub fn synthesize_with(&self, workbook: &[u8], options: &RunOptions) -> Result<ReportOutput, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("synthesize", %run_id, bytes = workbook.len());
        let _enter = span.enter();

        let mut run = Run::new(&options.cancel);
        let result = self.run(&mut run, run_id, workbook, options);
        match &result {
            Ok(output) => info!(
                solver = %output.profile.name,
                pages = output.document.page_count,
                warnings = output.warnings.len(),
                "report synthesised"
            ),
            Err(err) => error!(stage = %err.stage, error = %err.error, "report synthesis failed"),
        }
        result
    }

    /// Run on the blocking pool so async callers are not stalled by parsing
    /// and rasterisation.
    pub async fn synthesize_async(
        self: Arc<Self>,
        workbook: Vec<u8>,
        options: RunOptions,
    ) -> Result<ReportOutput, PipelineError> {
        tokio::task::spawn_blocking(move || self.synthesize_with(&workbook, &options))
            .await
            .unwrap_or_else(|err| {
                Err(PipelineError {
                    stage: Stage::Failed,
                    error: ReportError::Worker(err.to_string()),
                })
            })
    }

    fn run(
        &self,
        run: &mut Run<'_>,
        run_id: Uuid,
        workbook: &[u8],
        options: &RunOptions,
    ) -> Result<ReportOutput, PipelineError> {
        run.enter(Stage::Loading)?;
        let loaded = self.loader.load(workbook).map_err(|err| run.fail(err))?;

        run.enter(Stage::Deriving)?;
        let metrics = Metrics::derive(&loaded.overview).map_err(|err| run.fail(err))?;

        run.enter(Stage::Rendering)?;
        let bar_chart = self.renderer.render_bar(&loaded.overview).map_err(|err| run.fail(err))?;
        run.checkpoint(Stage::Rendering)?;
        let radar_chart = self.renderer.render_radar(&loaded.overview).map_err(|err| run.fail(err))?;

        run.enter(Stage::Composing)?;
        let career_lists = CareerLists::from_suggestions(&loaded.careers, self.config.sections.career_list_limit);
        let content = ReportContent {
            profile: &loaded.profile,
            metrics: &metrics,
            overview: &loaded.overview,
            tasks: &loaded.tasks,
            careers: &career_lists,
            summary: &loaded.summary,
            bar_chart: &bar_chart,
            radar_chart: &radar_chart,
            issued_on: options.issued_on,
        };
        let document = self.composer.compose(&content).map_err(|err| run.fail(err))?;
        run.finish();

        let filename = report_filename(&loaded.profile.name, "pdf");
        Ok(ReportOutput {
            run_id,
            metrics,
            bar_chart,
            radar_chart,
            document,
            profile: loaded.profile,
            overview: loaded.overview,
            tasks: loaded.tasks,
            career_lists,
            summary: loaded.summary,
            filename,
            content_type: PDF_CONTENT_TYPE,
            warnings: loaded.warnings,
        })
    }
}
