//! SVG → PNG rasterisation via usvg/resvg.

use std::sync::Arc;

use tiny_skia::{Pixmap, Transform};
use tracing::{debug, warn};
use usvg::fontdb;

use crate::core::config::{ChartConfig, Rgb};
use crate::core::error::ReportError;
use crate::document::text::TextPolicy;
use crate::workbook::OverviewRow;

use super::svg::{self, Canvas};
use super::{ChartImage, ChartSpec};

/// Stateless chart renderer. The font database is loaded once and shared
/// read-only, so one renderer can serve concurrent requests.
#[derive(Clone)]
pub struct ChartRenderer {
    fontdb: Arc<fontdb::Database>,
    canvas: Canvas,
    placeholder: char,
}

impl std::fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("faces", &self.fontdb.len())
            .field("canvas", &self.canvas)
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl ChartRenderer {
    /// `placeholder` is the document's stand-in character; chart labels
    /// follow the same text policy as the pages around them.
    pub fn new(config: &ChartConfig, accent: Rgb, placeholder: char) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for path in &config.font_files {
            if let Err(err) = db.load_font_file(path) {
                warn!(path = %path.display(), error = %err, "chart font could not be loaded");
            }
        }
        if db.len() == 0 {
            warn!("no fonts available; charts cannot be labelled");
        }
        debug!(faces = db.len(), "chart font database ready");

        Self {
            fontdb: Arc::new(db),
            canvas: Canvas {
                width: config.width_px,
                height: config.height_px,
                font_family: config.label_font.clone(),
                accent,
            },
            placeholder,
        }
    }

    pub fn render_bar(&self, rows: &[OverviewRow]) -> Result<ChartImage, ReportError> {
        self.render(&ChartSpec::bar(rows))
    }

    pub fn render_radar(&self, rows: &[OverviewRow]) -> Result<ChartImage, ReportError> {
        self.render(&ChartSpec::radar(rows))
    }

    pub fn render(&self, spec: &ChartSpec) -> Result<ChartImage, ReportError> {
        let kind = spec.kind();
        if self.fontdb.len() == 0 {
            return Err(ReportError::render(kind.label(), "no fonts available for chart labels"));
        }

        let policy = TextPolicy::new(self.placeholder);
        let spec = spec.sanitized(&policy);
        let mut warnings = Vec::new();
        if policy.replaced() > 0 {
            warn!(chart = kind.label(), replaced = policy.replaced(), "chart labels contained unencodable characters");
            warnings.push(format!(
                "{} characters in chart labels replaced with '{}'",
                policy.replaced(),
                self.placeholder
            ));
        }

        let markup = match &spec {
            ChartSpec::Bar { title, categories } => {
                svg::bar_chart(&self.canvas, title, categories, &mut warnings)
            }
            ChartSpec::Radar { title, axes, range } => {
                svg::radar_chart(&self.canvas, title, axes, *range, &mut warnings)
            }
        };

        let png = self.rasterize(&markup).map_err(|reason| ReportError::render(kind.label(), reason))?;
        debug!(chart = kind.label(), bytes = png.len(), "chart rendered");

        Ok(ChartImage {
            kind,
            png,
            width: self.canvas.width,
            height: self.canvas.height,
            warnings,
        })
    }

    fn rasterize(&self, markup: &str) -> Result<Vec<u8>, String> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        options.font_family = self.canvas.font_family.clone();

        let tree = usvg::Tree::from_str(markup, &options).map_err(|err| err.to_string())?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| format!("cannot allocate {}x{} canvas", size.width(), size.height()))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        encode_png(&pixmap)
    }
}

/// Straight-alpha RGBA PNG from a premultiplied pixmap.
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .map_err(|err| err.to_string())?
            .write_image_data(&data)
            .map_err(|err| err.to_string())?;
    }

    Ok(buffer)
}
