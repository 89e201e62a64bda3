//! Flow layout: blocks are placed top to bottom and a new page starts
//! whenever the next unit does not fit in what is left of the current one.
//!
//! Units are whole paragraphs (split by line only when taller than a page),
//! whole key/value items, whole images and whole table rows. Images are
//! scaled down to the page's content box, so they are never clipped.

use tracing::trace;

use crate::core::config::PageConfig;
use crate::core::error::ReportError;

use super::fonts::{FontWeight, Fonts, TextMetrics};
use super::pdf::ImageData;
use super::text::TextPolicy;
use super::{Block, Document, Section, TextStyle};

const INK: [f32; 3] = [0.114, 0.137, 0.188];
const MUTED: [f32; 3] = [0.42, 0.45, 0.50];
const GRID: [f32; 3] = [0.835, 0.855, 0.882];

const HEADING_SIZE: f32 = 14.0;
const TABLE_SIZE: f32 = 9.5;
const CELL_PAD: f32 = 3.0;
const BLOCK_GAP: f32 = 6.0;
const SECTION_GAP: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub fn new(page: &PageConfig) -> Self {
        let (width, height) = page.size.dimensions_pt();
        Self {
            width,
            height,
            margin: page.margin_pt,
        }
    }

    /// Shared by text wrapping, images and tables.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    fn top(&self) -> f32 {
        self.margin
    }

    fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// One drawing instruction in top-down page coordinates (points).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        weight: FontWeight,
        color: [f32; 3],
        /// Already sanitised by the text policy.
        text: String,
    },
    Image {
        index: usize,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        color: [f32; 3],
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Page {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug)]
pub(crate) struct LaidOut {
    pub pages: Vec<Page>,
    pub images: Vec<ImageData>,
}

#[derive(Debug, Clone, Copy)]
struct Face {
    weight: FontWeight,
    size: f32,
    color: [f32; 3],
}

pub(crate) struct Layout<'a> {
    geometry: PageGeometry,
    fonts: Fonts,
    policy: &'a TextPolicy,
    accent: [f32; 3],
    pages: Vec<Page>,
    images: Vec<ImageData>,
    cursor: f32,
}

impl<'a> Layout<'a> {
    pub fn new(geometry: PageGeometry, fonts: Fonts, policy: &'a TextPolicy, accent: [f32; 3]) -> Self {
        Self {
            geometry,
            fonts,
            policy,
            accent,
            pages: vec![Page::default()],
            images: Vec::new(),
            cursor: geometry.top(),
        }
    }

    pub fn run(mut self, document: &Document) -> Result<LaidOut, ReportError> {
        for section in &document.sections {
            self.section(section)?;
        }
        trace!(pages = self.pages.len(), images = self.images.len(), "layout finished");
        Ok(LaidOut {
            pages: self.pages,
            images: self.images,
        })
    }

    fn face(&self, style: TextStyle) -> Face {
        match style {
            TextStyle::Title => Face {
                weight: FontWeight::Bold,
                size: 18.0,
                color: self.accent,
            },
            TextStyle::Subheading => Face {
                weight: FontWeight::Bold,
                size: 12.0,
                color: INK,
            },
            TextStyle::Body => Face {
                weight: FontWeight::Regular,
                size: 11.0,
                color: INK,
            },
            TextStyle::Emphasis => Face {
                weight: FontWeight::Bold,
                size: 11.0,
                color: INK,
            },
            TextStyle::Note => Face {
                weight: FontWeight::Italic,
                size: 9.0,
                color: MUTED,
            },
        }
    }

    fn metrics(&self, size: f32) -> TextMetrics {
        self.fonts.metrics(size)
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn page_is_fresh(&self) -> bool {
        self.cursor <= self.geometry.top() + f32::EPSILON
    }

    fn remaining(&self) -> f32 {
        self.geometry.bottom() - self.cursor
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.geometry.top();
    }

    /// Break before a unit of `height` that does not fit. A fresh page is
    /// never abandoned, so a unit taller than a page cannot loop.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.page_is_fresh() {
            self.new_page();
        }
    }

    fn gap(&mut self, amount: f32) {
        if !self.page_is_fresh() {
            self.cursor += amount;
        }
    }

    fn text(&mut self, x: f32, baseline: f32, face: Face, text: String) {
        if text.is_empty() {
            return;
        }
        self.page().ops.push(DrawOp::Text {
            x,
            baseline,
            size: face.size,
            weight: face.weight,
            color: face.color,
            text,
        });
    }

    fn section(&mut self, section: &Section) -> Result<(), ReportError> {
        if let Some(heading) = &section.heading {
            let heading = self.policy.sanitize(heading);
            let face = Face {
                weight: FontWeight::Bold,
                size: HEADING_SIZE,
                color: self.accent,
            };
            let m = self.metrics(face.size);
            let lead = match section.body.first() {
                Some(block) => self.lead_height(block)?,
                None => 0.0,
            };
            // Keep the heading with the first unit of its body.
            self.ensure(m.line_h + 4.0 + lead);
            let baseline = self.cursor + m.asc;
            let x = self.geometry.margin;
            self.text(x, baseline, face, heading);
            self.cursor += m.line_h;
            let y = self.cursor;
            let x2 = self.geometry.margin + self.geometry.content_width();
            let color = self.accent;
            self.page().ops.push(DrawOp::Rule {
                x1: x,
                x2,
                y,
                thickness: 0.75,
                color,
            });
            self.cursor += 4.0;
        }

        for (idx, block) in section.body.iter().enumerate() {
            if idx > 0 {
                self.gap(BLOCK_GAP);
            }
            self.block(block)?;
        }
        self.gap(SECTION_GAP);
        Ok(())
    }

    /// Height of the first unit `block` will place.
    fn lead_height(&self, block: &Block) -> Result<f32, ReportError> {
        Ok(match block {
            Block::Paragraph { style, .. } => self.metrics(self.face(*style).size).line_h,
            Block::KeyValueList(_) => self.metrics(self.face(TextStyle::Body).size).line_h,
            Block::Image { png, width_fraction } => {
                let (w, h) = ImageData::dimensions(png)?;
                self.image_size(w, h, *width_fraction).1
            }
            Block::Table { .. } => 2.0 * (self.metrics(TABLE_SIZE).line_h + 2.0 * CELL_PAD),
        })
    }

    fn block(&mut self, block: &Block) -> Result<(), ReportError> {
        match block {
            Block::Paragraph { text, style } => self.paragraph(text, *style),
            Block::KeyValueList(items) => self.key_values(items),
            Block::Image { png, width_fraction } => self.image(png, *width_fraction)?,
            Block::Table { header, rows, widths } => self.table(header, rows, widths),
        }
        Ok(())
    }

    fn paragraph(&mut self, raw: &str, style: TextStyle) {
        let face = self.face(style);
        let m = self.metrics(face.size);
        let width = self.geometry.content_width();
        let text = self.policy.sanitize(raw);
        let lines = self.fonts.wrap(face.weight, face.size, &text, width);
        if lines.is_empty() {
            return;
        }

        let total = lines.len() as f32 * m.line_h;
        if total <= self.geometry.content_height() {
            self.ensure(total);
        }

        for line in lines {
            self.ensure(m.line_h);
            let x = match style {
                TextStyle::Title => {
                    let line_w = self.fonts.width(face.weight, face.size, &line);
                    self.geometry.margin + ((width - line_w) / 2.0).max(0.0)
                }
                _ => self.geometry.margin,
            };
            let baseline = self.cursor + m.asc;
            self.text(x, baseline, face, line);
            self.cursor += m.line_h;
        }
    }

    /// Each pair is one unit: bold `key:` followed by the value, with
    /// continuation lines indented under the value. A label wider than half
    /// the column wraps on lines of its own and the value starts below it.
    fn key_values(&mut self, items: &[(String, String)]) {
        let body = self.face(TextStyle::Body);
        let key_face = self.face(TextStyle::Emphasis);
        let m = self.metrics(body.size);
        let width = self.geometry.content_width();
        let x = self.geometry.margin;

        for (key, value) in items {
            let label = format!("{}:", self.policy.sanitize(key));
            let indent = self.fonts.width(key_face.weight, key_face.size, &format!("{label} "));
            let value = self.policy.sanitize(value);

            if indent < width / 2.0 {
                let lines = self.fonts.wrap(body.weight, body.size, &value, width - indent);
                let total = lines.len().max(1) as f32 * m.line_h;
                if total <= self.geometry.content_height() {
                    self.ensure(total);
                }

                self.ensure(m.line_h);
                let baseline = self.cursor + m.asc;
                self.text(x, baseline, key_face, label);
                for (idx, line) in lines.into_iter().enumerate() {
                    if idx > 0 {
                        self.cursor += m.line_h;
                        self.ensure(m.line_h);
                    }
                    let baseline = self.cursor + m.asc;
                    self.text(x + indent, baseline, body, line);
                }
                self.cursor += m.line_h;
                continue;
            }

            let label_lines = self.fonts.wrap(key_face.weight, key_face.size, &label, width);
            let value_lines = self.fonts.wrap(body.weight, body.size, &value, width);
            let total = (label_lines.len() + value_lines.len()) as f32 * m.line_h;
            if total <= self.geometry.content_height() {
                self.ensure(total);
            }

            let lines = label_lines
                .into_iter()
                .map(|line| (key_face, line))
                .chain(value_lines.into_iter().map(|line| (body, line)));
            for (face, line) in lines {
                self.ensure(m.line_h);
                let baseline = self.cursor + m.asc;
                self.text(x, baseline, face, line);
                self.cursor += m.line_h;
            }
        }
    }

    /// Target size in points: `fraction` of the content width, shrunk to the
    /// content height when the aspect ratio would overflow a page.
    fn image_size(&self, px_w: u32, px_h: u32, fraction: f32) -> (f32, f32) {
        let fraction = if fraction.is_finite() && fraction > 0.0 { fraction.min(1.0) } else { 1.0 };
        let aspect = px_h.max(1) as f32 / px_w.max(1) as f32;
        let mut width = self.geometry.content_width() * fraction;
        let mut height = width * aspect;
        let max_h = self.geometry.content_height();
        if height > max_h {
            height = max_h;
            width = height / aspect;
        }
        (width, height)
    }

    fn image(&mut self, png: &[u8], fraction: f32) -> Result<(), ReportError> {
        let image = ImageData::decode(png)?;
        let (width, height) = self.image_size(image.width, image.height, fraction);
        self.ensure(height);

        let index = self.images.len();
        self.images.push(image);
        let x = self.geometry.margin + (self.geometry.content_width() - width) / 2.0;
        let top = self.cursor;
        self.page().ops.push(DrawOp::Image {
            index,
            x,
            top,
            width,
            height,
        });
        self.cursor += height;
        Ok(())
    }

    fn table(&mut self, header: &[String], rows: &[Vec<String>], weights: &[f32]) {
        let columns = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
        if columns == 0 {
            return;
        }
        let widths = column_widths(weights, columns, self.geometry.content_width());
        let m = self.metrics(TABLE_SIZE);
        let head_face = Face {
            weight: FontWeight::Bold,
            size: TABLE_SIZE,
            color: INK,
        };
        let cell_face = Face {
            weight: FontWeight::Regular,
            size: TABLE_SIZE,
            color: INK,
        };

        let head = self.wrap_cells(header, &widths, head_face);
        let head_h = band_height(&head, m);
        let body: Vec<Vec<Vec<String>>> = rows
            .iter()
            .map(|row| self.wrap_cells(row, &widths, cell_face))
            .collect();

        let first_h = body.first().map(|cells| band_height(cells, m)).unwrap_or(0.0);
        self.ensure(head_h + first_h.min(self.geometry.content_height() - head_h));
        self.table_row(&head, &widths, head_face, m, 0.75);

        for cells in &body {
            let row_h = band_height(cells, m);
            if row_h <= self.geometry.content_height() - head_h {
                if row_h > self.remaining() {
                    self.new_page();
                    self.table_row(&head, &widths, head_face, m, 0.75);
                }
                self.table_row(cells, &widths, cell_face, m, 0.25);
                continue;
            }

            // Taller than a page: flow the row line by line.
            let tallest = cells.iter().map(Vec::len).max().unwrap_or(0);
            self.cursor += CELL_PAD;
            for line_idx in 0..tallest {
                if m.line_h + CELL_PAD > self.remaining() {
                    self.new_page();
                    self.table_row(&head, &widths, head_face, m, 0.75);
                }
                let baseline = self.cursor + m.asc;
                let mut x = self.geometry.margin;
                for (col, lines) in cells.iter().enumerate() {
                    if let Some(line) = lines.get(line_idx) {
                        self.text(x + CELL_PAD, baseline, cell_face, line.clone());
                    }
                    x += widths[col];
                }
                self.cursor += m.line_h;
            }
            self.cursor += CELL_PAD;
            self.rule_across(0.25);
        }
    }

    fn wrap_cells(&self, cells: &[String], widths: &[f32], face: Face) -> Vec<Vec<String>> {
        widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let raw = cells.get(col).map(String::as_str).unwrap_or("");
                let text = self.policy.sanitize(raw);
                self.fonts.wrap(face.weight, face.size, &text, (width - 2.0 * CELL_PAD).max(1.0))
            })
            .collect()
    }

    fn table_row(&mut self, cells: &[Vec<String>], widths: &[f32], face: Face, m: TextMetrics, rule: f32) {
        let top = self.cursor;
        let mut x = self.geometry.margin;
        for (col, lines) in cells.iter().enumerate() {
            for (idx, line) in lines.iter().enumerate() {
                let baseline = top + CELL_PAD + m.asc + idx as f32 * m.line_h;
                self.text(x + CELL_PAD, baseline, face, line.clone());
            }
            x += widths[col];
        }
        self.cursor = top + band_height(cells, m);
        self.rule_across(rule);
    }

    fn rule_across(&mut self, thickness: f32) {
        let x1 = self.geometry.margin;
        let x2 = x1 + self.geometry.content_width();
        let y = self.cursor;
        self.page().ops.push(DrawOp::Rule {
            x1,
            x2,
            y,
            thickness,
            color: GRID,
        });
    }
}

fn band_height(cells: &[Vec<String>], m: TextMetrics) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
    lines as f32 * m.line_h + 2.0 * CELL_PAD
}

/// Relative weights scaled to `total`; missing or invalid weights share the
/// width equally.
fn column_widths(weights: &[f32], columns: usize, total: f32) -> Vec<f32> {
    let valid = weights.len() == columns && weights.iter().all(|w| w.is_finite() && *w > 0.0);
    if !valid {
        return vec![total / columns as f32; columns];
    }
    let sum: f32 = weights.iter().sum();
    weights.iter().map(|w| w / sum * total).collect()
}
