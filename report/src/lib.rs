//! Report synthesis for Uwazi assessment workbooks.
//!
//! The crate turns one solver's multi-sheet workbook into display metrics, two
//! chart images and a paginated PDF. Everything is request-scoped: build a
//! [`ReportPipeline`] once from a [`ReportConfig`] and call
//! [`ReportPipeline::synthesize`] per workbook.

pub mod charts;
pub mod core;
pub mod document;
pub mod metrics;
pub mod pipeline;
pub mod workbook;

pub use crate::core::cancel::CancelFlag;
pub use crate::core::config::{ConfigError, ReportConfig};
pub use crate::core::error::{PipelineError, ReportError};
pub use metrics::Metrics;
pub use pipeline::{ReportOutput, ReportPipeline, ReportView, RunOptions, Stage};
