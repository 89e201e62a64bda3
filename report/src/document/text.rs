//! Text policy for the generated document.
//!
//! The document uses the standard PDF fonts under `WinAnsiEncoding`. Any code
//! point outside that encoding is replaced with a placeholder, and every string
//! in the document goes through [`TextPolicy::sanitize`] before it is measured
//! or written, so no block can end up with a different rule.

use std::cell::Cell;

use tracing::debug;

/// WinAnsi bytes 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// The WinAnsi byte for `ch`, if the encoding has one.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(candidate, _)| *candidate == ch)
            .map(|(_, byte)| *byte),
    }
}

pub fn is_encodable(ch: char) -> bool {
    win_ansi_byte(ch).is_some()
}

/// Lossy sanitiser shared by layout and serialisation for one document.
#[derive(Debug)]
pub struct TextPolicy {
    placeholder: char,
    replaced: Cell<usize>,
}

impl TextPolicy {
    /// `placeholder` must itself be encodable; config validation enforces it.
    pub fn new(placeholder: char) -> Self {
        let placeholder = if is_encodable(placeholder) { placeholder } else { '?' };
        Self {
            placeholder,
            replaced: Cell::new(0),
        }
    }

    /// Map `raw` onto the encodable alphabet. Whitespace and control
    /// characters become plain spaces; anything else unencodable becomes the
    /// placeholder.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut replaced = 0;
        for ch in raw.chars() {
            if ch.is_whitespace() || ch.is_control() {
                out.push(' ');
            } else if is_encodable(ch) {
                out.push(ch);
            } else {
                out.push(self.placeholder);
                replaced += 1;
            }
        }
        if replaced > 0 {
            debug!(replaced, "replaced unencodable characters");
            self.replaced.set(self.replaced.get() + replaced);
        }
        out
    }

    /// Bytes for a string already passed through [`Self::sanitize`].
    pub fn encode(&self, sanitized: &str) -> Vec<u8> {
        sanitized
            .chars()
            .map(|ch| win_ansi_byte(ch).unwrap_or(b'?'))
            .collect()
    }

    /// Characters replaced so far.
    pub fn replaced(&self) -> usize {
        self.replaced.get()
    }
}
