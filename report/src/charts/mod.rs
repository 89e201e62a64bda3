//! Chart specifications and their rasterised images.
//!
//! A [`ChartSpec`] is plain data derived from the overview table. The
//! [`ChartRenderer`] turns it into SVG markup and then a PNG; the same spec
//! always produces the same bytes for a given font set.

mod raster;
mod svg;

pub use raster::ChartRenderer;

use base64::Engine;
use serde::Serialize;

use crate::document::text::TextPolicy;
use crate::workbook::OverviewRow;

/// Fixed value domain of the radar chart's radial axis.
pub const RADAR_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Radar,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Radar => "radar",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    /// One bar per category, in input order.
    Bar {
        title: String,
        categories: Vec<(String, f64)>,
    },
    /// One axis per entry, values on a fixed `range`.
    Radar {
        title: String,
        axes: Vec<(String, f64)>,
        range: (f64, f64),
    },
}

impl ChartSpec {
    /// Student score per area, preserving the table's row order.
    pub fn bar(rows: &[OverviewRow]) -> Self {
        ChartSpec::Bar {
            title: "Scores by Intelligence".to_string(),
            categories: rows
                .iter()
                .map(|row| (row.area.clone(), row.student_score))
                .collect(),
        }
    }

    /// Overall percentage per area on the fixed `[0, 100]` domain.
    pub fn radar(rows: &[OverviewRow]) -> Self {
        ChartSpec::Radar {
            title: "Overall Intelligence Strengths".to_string(),
            axes: rows
                .iter()
                .map(|row| (row.area.clone(), row.overall_percent))
                .collect(),
            range: RADAR_RANGE,
        }
    }

    /// Title and labels mapped through the document's text policy, so the
    /// images and the surrounding text agree on every character.
    pub(crate) fn sanitized(&self, policy: &TextPolicy) -> Self {
        let labels = |items: &Vec<(String, f64)>| -> Vec<(String, f64)> {
            items
                .iter()
                .map(|(label, value)| (policy.sanitize(label), *value))
                .collect()
        };
        match self {
            ChartSpec::Bar { title, categories } => ChartSpec::Bar {
                title: policy.sanitize(title),
                categories: labels(categories),
            },
            ChartSpec::Radar { title, axes, range } => ChartSpec::Radar {
                title: policy.sanitize(title),
                axes: labels(axes),
                range: *range,
            },
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Bar { .. } => ChartKind::Bar,
            ChartSpec::Radar { .. } => ChartKind::Radar,
        }
    }
}

/// A rendered chart: PNG bytes plus whatever was adjusted to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartImage {
    pub kind: ChartKind,
    #[serde(skip)]
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Values clamped or otherwise altered at render time.
    pub warnings: Vec<String>,
}

impl ChartImage {
    /// Inline form for HTML shells: `data:image/png;base64,…`.
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        format!("data:image/png;base64,{encoded}")
    }
}
