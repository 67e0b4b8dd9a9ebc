// Engine configuration, loaded from JSON with defaults for every field

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::card_type::{CardCategory, TypeStyle};
use crate::error::DeckError;
use crate::text::{FontFamily, FontSpec};

// ============================================================================
// Sections
// ============================================================================

/// Physical page plus card measurements taken from a reference raster.
///
/// Pixel values live on a raster `reference_width_px` wide that maps onto
/// `page_width_mm`; they are converted to millimeters once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub reference_width_px: f32,
    pub card_px: [f32; 2],
    pub origin_px: [f32; 2],
    pub bleed_px: f32,
    pub border_px: f32,
    pub title_bar_px: f32,
    /// Paragraph band start, measured from the card's top edge
    pub paragraph_start_px: f32,
    pub paragraph_height_mm: f32,
    pub cross_px: f32,
    pub cross_line_width_mm: f32,
    pub text_inset_mm: f32,
    pub title_padding_mm: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            reference_width_px: 2480.0,
            card_px: [744.0, 1039.0],
            origin_px: [124.0, 194.0],
            bleed_px: 24.0,
            border_px: 35.0,
            title_bar_px: 100.0,
            paragraph_start_px: 1012.0 - 194.0,
            paragraph_height_mm: 14.903,
            cross_px: 31.0,
            cross_line_width_mm: 0.2,
            text_inset_mm: 5.0,
            title_padding_mm: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub icons: bool,
    pub images: bool,
    pub interrupts: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            icons: true,
            images: true,
            interrupts: true,
        }
    }
}

/// Font per text role. A role with a `file` embeds that font, which is
/// needed for text outside WinAnsi such as Esperanto letters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub title: FontSpec,
    pub body: FontSpec,
    pub ending: FontSpec,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            title: FontSpec::new(FontFamily::HelveticaBold, 10.0),
            body: FontSpec::new(FontFamily::Helvetica, 9.0),
            ending: FontSpec::new(FontFamily::Helvetica, 14.0),
        }
    }
}

/// Hex colors for text and the interrupt marker's substitution key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub title: String,
    pub body: String,
    pub marker_key: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            title: "FFFFFF".to_string(),
            body: "640000".to_string(),
            marker_key: "000000".to_string(),
        }
    }
}

/// What to do when a card references an asset that cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetPolicy {
    #[default]
    Abort,
    Skip,
}

// ============================================================================
// Engine Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub geometry: GeometryConfig,
    /// Overrides per category; categories left out keep their built-in style
    pub palette: BTreeMap<CardCategory, TypeStyle>,
    pub features: Features,
    pub fonts: Fonts,
    pub colors: ColorConfig,
    pub interrupt_marker: String,
    pub header_rows: usize,
    pub asset_policy: AssetPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            palette: BTreeMap::new(),
            features: Features::default(),
            fonts: Fonts::default(),
            colors: ColorConfig::default(),
            interrupt_marker: "interrupt.png".to_string(),
            header_rows: 3,
            asset_policy: AssetPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeckError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DeckError> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| DeckError::Config(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Style for a category, falling back to the built-in palette.
    pub fn style_for(&self, category: CardCategory) -> TypeStyle {
        self.palette
            .get(&category)
            .cloned()
            .unwrap_or_else(|| TypeStyle::default_for(category))
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        let g = &self.geometry;
        let positive = [
            ("page_width_mm", g.page_width_mm),
            ("page_height_mm", g.page_height_mm),
            ("reference_width_px", g.reference_width_px),
            ("card_px[0]", g.card_px[0]),
            ("card_px[1]", g.card_px[1]),
            ("paragraph_height_mm", g.paragraph_height_mm),
            ("cross_px", g.cross_px),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(DeckError::Config(format!(
                    "geometry.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if g.title_bar_px < g.border_px {
            return Err(DeckError::Config(format!(
                "geometry.title_bar_px ({}) must not be smaller than border_px ({})",
                g.title_bar_px, g.border_px
            )));
        }
        for (role, font) in [
            ("title", &self.fonts.title),
            ("body", &self.fonts.body),
            ("ending", &self.fonts.ending),
        ] {
            if !(font.size > 0.0) {
                return Err(DeckError::Config(format!(
                    "fonts.{}.size must be positive, got {}",
                    role, font.size
                )));
            }
        }
        Ok(())
    }
}
