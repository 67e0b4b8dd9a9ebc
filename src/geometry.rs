// Millimeter geometry derived once from the configuration

use crate::config::GeometryConfig;
use crate::draw::{Point, Rect};
use crate::units::from_reference_grid;

pub const GRID_COLUMNS: usize = 3;
pub const GRID_ROWS: usize = 3;
pub const CARDS_PER_PAGE: usize = GRID_COLUMNS * GRID_ROWS;

/// Every length the engine draws with, in millimeters. Read-only after setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub page_width: f32,
    pub page_height: f32,
    pub card_width: f32,
    pub card_height: f32,
    /// Top-left corner of slot 0 on the page
    pub grid_origin: Point,
    pub bleed: f32,
    pub border: f32,
    pub title_bar: f32,
    pub paragraph_start: f32,
    pub paragraph_height: f32,
    pub cross_arm: f32,
    pub cross_line_width: f32,
    pub text_inset: f32,
    pub title_padding: f32,
}

impl Geometry {
    pub fn from_config(config: &GeometryConfig) -> Self {
        let mm = |px: f32| from_reference_grid(px, config.reference_width_px, config.page_width_mm);
        Self {
            page_width: config.page_width_mm,
            page_height: config.page_height_mm,
            card_width: mm(config.card_px[0]),
            card_height: mm(config.card_px[1]),
            grid_origin: Point::new(mm(config.origin_px[0]), mm(config.origin_px[1])),
            bleed: mm(config.bleed_px),
            border: mm(config.border_px),
            title_bar: mm(config.title_bar_px),
            paragraph_start: mm(config.paragraph_start_px),
            paragraph_height: config.paragraph_height_mm,
            cross_arm: mm(config.cross_px),
            cross_line_width: config.cross_line_width_mm,
            text_inset: config.text_inset_mm,
            title_padding: config.title_padding_mm,
        }
    }

    /// The card's cut outline in card-local coordinates.
    pub fn card_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.card_width, self.card_height)
    }

    /// Card rectangle grown by the bleed on every side.
    pub fn bleed_rect(&self) -> Rect {
        self.card_rect().inset(-self.bleed)
    }

    /// Colored strip across the top of the card holding the display name.
    pub fn title_strip(&self) -> Rect {
        Rect::new(0.0, 0.0, self.card_width, self.title_bar)
    }

    /// Unpainted area inside the border frame, below the title strip.
    pub fn interior(&self) -> Rect {
        Rect::new(
            self.border,
            self.title_bar,
            self.card_width - 2.0 * self.border,
            self.card_height - self.title_bar - self.border,
        )
    }

    /// Band reserved for body text of regular cards.
    pub fn paragraph_band(&self) -> Rect {
        Rect::new(
            self.text_inset,
            self.paragraph_start,
            self.wrap_width(),
            self.paragraph_height,
        )
    }

    pub fn wrap_width(&self) -> f32 {
        self.card_width - 2.0 * self.text_inset
    }

    /// Page position of a grid slot (0-8, row-major).
    pub fn slot_origin(&self, slot: usize) -> Point {
        let col = slot % GRID_COLUMNS;
        let row = slot / GRID_COLUMNS;
        Point::new(
            self.grid_origin.x + col as f32 * self.card_width,
            self.grid_origin.y + row as f32 * self.card_height,
        )
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::from_config(&GeometryConfig::default())
    }
}
