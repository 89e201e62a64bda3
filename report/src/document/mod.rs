//! Paginated report document.
//!
//! The composer first builds a [`Document`] (plain data: sections of blocks
//! in their fixed order), then lays it out onto pages and serialises it to
//! PDF. Building and rendering are separate so the structure can be inspected
//! without producing bytes.

mod composer;
pub mod fonts;
mod layout;
mod pdf;
pub mod text;

pub use composer::{DocumentComposer, ReportContent};

/// Sections in the order they appear in every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Title,
    Summary,
    Scores,
    BarChart,
    RadarChart,
    Careers,
    Disclaimer,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 7] = [
        SectionKind::Title,
        SectionKind::Summary,
        SectionKind::Scores,
        SectionKind::BarChart,
        SectionKind::RadarChart,
        SectionKind::Careers,
        SectionKind::Disclaimer,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Centred document title.
    Title,
    Subheading,
    Body,
    Emphasis,
    /// Small italic print (issue date, disclaimer).
    Note,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph {
        text: String,
        style: TextStyle,
    },
    /// `key: value` pairs, one per line, keys in bold.
    KeyValueList(Vec<(String, String)>),
    /// PNG bytes drawn at `width_fraction` of the content width.
    Image { png: Vec<u8>, width_fraction: f32 },
    /// Column `widths` are relative weights of the content width.
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        widths: Vec<f32>,
    },
}

impl Block {
    pub fn paragraph(text: impl Into<String>, style: TextStyle) -> Self {
        Block::Paragraph {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: Option<String>,
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Shown in the PDF's document information dictionary.
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|section| section.kind).collect()
    }
}

/// Serialised document plus layout facts callers may want to log or check.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub section_count: usize,
    /// Characters swapped for the placeholder by the text policy.
    pub replaced_chars: usize,
}
