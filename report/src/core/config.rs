//! Report configuration.
//!
//! Branding and layout differences between report variants are expressed here
//! rather than in code. A `ReportConfig` is built (or loaded from TOML) by the
//! caller and handed to [`crate::ReportPipeline::new`]; the pipeline never
//! reads configuration from anywhere else.
//!
//! ```toml
//! [branding]
//! title_prefix = "Uwazi Talent Report"
//! accent_color = "#1F6FB2"
//! font_family = "helvetica"
//!
//! [page]
//! size = "a4"
//! margin_pt = 36.0
//!
//! [charts]
//! width_px = 900
//! height_px = 540
//! font_files = ["assets/Inter-Regular.ttf"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::text::is_encodable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub branding: BrandingConfig,
    pub page: PageConfig,
    pub text: TextConfig,
    pub defaults: DefaultsConfig,
    pub sections: SectionsConfig,
    pub charts: ChartConfig,
}

impl ReportConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Rgb::parse_hex(&self.branding.accent_color).ok_or_else(|| ConfigError::InvalidValue {
            field: "branding.accent_color",
            reason: format!("expected #RRGGBB, got {:?}", self.branding.accent_color),
        })?;

        let (width, height) = self.page.size.dimensions_pt();
        let margin = self.page.margin_pt;
        if !margin.is_finite() || margin < 0.0 || margin * 2.0 >= width.min(height) {
            return Err(ConfigError::InvalidValue {
                field: "page.margin_pt",
                reason: format!("{margin} leaves no content area on a {width}x{height}pt page"),
            });
        }

        if !is_encodable(self.text.placeholder) {
            return Err(ConfigError::InvalidValue {
                field: "text.placeholder",
                reason: format!("{:?} is not representable in the document encoding", self.text.placeholder),
            });
        }

        if self.charts.width_px == 0 || self.charts.height_px == 0 {
            return Err(ConfigError::InvalidValue {
                field: "charts",
                reason: "chart dimensions must be non-zero".to_string(),
            });
        }

        if self.sections.career_list_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sections.career_list_limit",
                reason: "must list at least one entry".to_string(),
            });
        }

        Ok(())
    }

    pub fn accent(&self) -> Rgb {
        Rgb::parse_hex(&self.branding.accent_color).unwrap_or(Rgb::DEFAULT_ACCENT)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BrandingConfig {
    /// Title line reads `{title_prefix} - {solver name}`.
    pub title_prefix: String,
    pub accent_color: String,
    pub font_family: FontFamily,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            title_prefix: "Uwazi Talent Report".to_string(),
            accent_color: "#1F6FB2".to_string(),
            font_family: FontFamily::Helvetica,
        }
    }
}

/// Standard PDF font families; both ship with every viewer so nothing is
/// embedded.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Helvetica,
    Courier,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    /// Symmetric margin on all four sides, in points.
    pub margin_pt: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin_pt: 36.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    pub fn dimensions_pt(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// Stand-in for characters the document encoding cannot represent.
    pub placeholder: char,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { placeholder: '?' }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub solver_name: String,
    pub not_available: String,
    pub summary: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            solver_name: "Unnamed Solver".to_string(),
            not_available: "Not Available".to_string(),
            summary: "No summary available".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SectionsConfig {
    /// Adds the per-task table under the scores-by-area listing.
    pub include_task_table: bool,
    pub career_list_limit: usize,
    pub disclaimer: String,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            include_task_table: true,
            career_list_limit: 5,
            disclaimer: "Disclaimer: This report is designed for developmental purposes only. \
                It is not a diagnostic tool or substitute for professional psychological evaluation."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub width_px: u32,
    pub height_px: u32,
    /// Extra font files made available to chart labels.
    pub font_files: Vec<PathBuf>,
    pub load_system_fonts: bool,
    /// Font family name requested by chart labels.
    pub label_font: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width_px: 900,
            height_px: 540,
            font_files: Vec::new(),
            load_system_fonts: true,
            label_font: "sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const DEFAULT_ACCENT: Rgb = Rgb(0x1F, 0x6F, 0xB2);

    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Channels as PDF colour operands in `0.0..=1.0`.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.defaults.solver_name, "Unnamed Solver");
        assert_eq!(config.defaults.not_available, "Not Available");
        assert_eq!(config.sections.career_list_limit, 5);
        assert_eq!(config.accent(), Rgb::DEFAULT_ACCENT);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ReportConfig::from_toml_str(
            r##"
            [branding]
            accent_color = "#AA3300"
            font_family = "courier"

            [page]
            size = "letter"
            "##,
        )
        .unwrap();

        assert_eq!(config.branding.font_family, FontFamily::Courier);
        assert_eq!(config.page.size, PageSize::Letter);
        assert_eq!(config.page.margin_pt, 36.0);
        assert_eq!(config.accent(), Rgb(0xAA, 0x33, 0x00));
        assert_eq!(config.branding.title_prefix, "Uwazi Talent Report");
    }

    #[test]
    fn rejects_bad_colour() {
        let err = ReportConfig::from_toml_str("[branding]\naccent_color = \"blue\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "branding.accent_color",
                ..
            }
        ));
    }

    #[test]
    fn rejects_margin_without_content_area() {
        let err = ReportConfig::from_toml_str("[page]\nmargin_pt = 400.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "page.margin_pt", .. }));
    }

    #[test]
    fn rejects_unencodable_placeholder() {
        let err = ReportConfig::from_toml_str("[text]\nplaceholder = \"☃\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "text.placeholder", .. }));
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(Rgb::parse_hex("#1f6fb2").map(Rgb::to_hex).as_deref(), Some("#1F6FB2"));
        assert_eq!(Rgb::parse_hex("1F6FB2"), None);
    }
}
