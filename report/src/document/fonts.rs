//! Font measurement for document layout.
//!
//! The document only uses the standard PDF fonts, so glyph advances come from
//! their published AFM tables instead of parsing font files. Vertical metrics
//! follow the same heuristic rhythm the export renderer always used:
//! - line height: `size * 1.28`
//! - ascender:    `size * 0.92`
//! - descender:   the remainder, never below `size * 0.08`
//!
//! Widths are only needed for the ASCII range; every other encodable glyph
//! falls back to the width of a lowercase `n`, which slightly over-estimates
//! accented capitals and keeps wrapping conservative.

use std::fmt;

use crate::core::config::FontFamily;

/// Lightweight face indicator so callers avoid stringly-typed lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
    Italic,
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontWeight::Regular => "Regular",
            FontWeight::Bold => "Bold",
            FontWeight::Italic => "Italic",
        })
    }
}

/// Vertical metrics used by layout, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Chosen vertical line height for layout rhythm.
    pub line_h: f32,
    /// Estimated ascender distance above baseline.
    pub asc: f32,
    /// Estimated descender distance below baseline (positive number).
    pub desc: f32,
}

/// Helvetica advances for 0x20..=0x7E, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advances for 0x20..=0x7E, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER_ADVANCE: u16 = 600;

/// Measurement for one configured family.
#[derive(Clone, Copy, Debug)]
pub struct Fonts {
    family: FontFamily,
}

impl Fonts {
    pub fn new(family: FontFamily) -> Self {
        Self { family }
    }

    /// PostScript name of the face, as written into the PDF font dictionary.
    pub fn base_font(&self, weight: FontWeight) -> &'static str {
        match (self.family, weight) {
            (FontFamily::Helvetica, FontWeight::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontWeight::Bold) => "Helvetica-Bold",
            (FontFamily::Helvetica, FontWeight::Italic) => "Helvetica-Oblique",
            (FontFamily::Courier, FontWeight::Regular) => "Courier",
            (FontFamily::Courier, FontWeight::Bold) => "Courier-Bold",
            (FontFamily::Courier, FontWeight::Italic) => "Courier-Oblique",
        }
    }

    pub fn metrics(&self, size: f32) -> TextMetrics {
        let line_h = (size * 1.28).round();
        let asc = (size * 0.92).round();
        let desc = (line_h - asc).max(size * 0.08).round();
        TextMetrics { line_h, asc, desc }
    }

    fn advance(&self, weight: FontWeight, ch: char) -> u16 {
        if self.family == FontFamily::Courier {
            return COURIER_ADVANCE;
        }
        let table = match weight {
            FontWeight::Bold => &HELVETICA_BOLD,
            // The oblique face shares the upright advances.
            FontWeight::Regular | FontWeight::Italic => &HELVETICA,
        };
        match ch as u32 {
            code @ 0x20..=0x7E => table[(code - 0x20) as usize],
            _ => table[(b'n' - 0x20) as usize],
        }
    }

    /// Advance width of `text` in points.
    pub fn width(&self, weight: FontWeight, size: f32, text: &str) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(self.advance(weight, ch))).sum();
        units as f32 * size / 1000.0
    }

    /// Greedy word wrap to `max_width` points. Words wider than a line are
    /// broken between characters. Empty input yields no lines.
    pub fn wrap(&self, weight: FontWeight, size: f32, text: &str, max_width: f32) -> Vec<String> {
        let space = self.width(weight, size, " ");
        let mut lines = Vec::new();
        let mut line = String::new();
        let mut line_w = 0.0;

        for word in text.split_whitespace() {
            let word_w = self.width(weight, size, word);

            if word_w > max_width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0.0;
                }
                for ch in word.chars() {
                    let ch_w = self.width(weight, size, ch.encode_utf8(&mut [0; 4]));
                    if line_w + ch_w > max_width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        line_w = 0.0;
                    }
                    line.push(ch);
                    line_w += ch_w;
                }
                continue;
            }

            let needed = if line.is_empty() { word_w } else { line_w + space + word_w };
            if needed > max_width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
                line_w = word_w;
            } else {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
                line_w = needed;
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helvetica() -> Fonts {
        Fonts::new(FontFamily::Helvetica)
    }

    #[test]
    fn metrics_increase_with_size() {
        let small = helvetica().metrics(12.0);
        let large = helvetica().metrics(48.0);
        assert!(large.line_h > small.line_h);
        assert!(large.asc > small.asc);
    }

    #[test]
    fn baseline_consistency_ratio() {
        let m = helvetica().metrics(32.0);
        let baseline_ratio = m.asc / 32.0;
        assert!(baseline_ratio > 0.80 && baseline_ratio < 1.05);
    }

    #[test]
    fn afm_widths() {
        // "Hello" = 722 + 556 + 222 + 222 + 556 = 2278 units.
        let width = helvetica().width(FontWeight::Regular, 10.0, "Hello");
        assert!((width - 22.78).abs() < 1e-4);
        assert!(helvetica().width(FontWeight::Bold, 10.0, "Hello") > width);
        assert_eq!(Fonts::new(FontFamily::Courier).width(FontWeight::Regular, 10.0, "ab"), 12.0);
    }

    #[test]
    fn wrap_respects_width() {
        let fonts = helvetica();
        let text = "Linguistic intelligence shows up in storytelling, debate and careful reading.";
        let lines = fonts.wrap(FontWeight::Regular, 11.0, text, 150.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.width(FontWeight::Regular, 11.0, line) <= 150.0, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let fonts = helvetica();
        let lines = fonts.wrap(FontWeight::Regular, 11.0, &"W".repeat(40), 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));
    }

    #[test]
    fn wrap_empty_yields_nothing() {
        assert!(helvetica().wrap(FontWeight::Regular, 11.0, "   ", 100.0).is_empty());
    }

    #[test]
    fn base_font_names() {
        assert_eq!(helvetica().base_font(FontWeight::Italic), "Helvetica-Oblique");
        assert_eq!(Fonts::new(FontFamily::Courier).base_font(FontWeight::Bold), "Courier-Bold");
    }
}
