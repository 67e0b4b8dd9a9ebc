//! Card frame rendering: turns one [`CardRecord`] into a card-local drawing.
//!
//! Coordinates are millimeters with the origin at the card's top-left corner.
//! Commands are emitted back to front: frame, title, interrupt marker,
//! illustration, icon, body text.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::assets::{AssetSource, RasterAsset};
use crate::config::{EngineConfig, Features, Fonts};
use crate::draw::{fit_within, Drawing, Rect, Rgb};
use crate::error::{AssetError, DeckError};
use crate::geometry::Geometry;
use crate::record::CardRecord;
use crate::text::{measure_and_place, Alignment, TextMeasurer};

/// A rendered card in two layers. The pager paints the bleed of every card
/// on a page before any card face, so a bleed never lands on a neighbour.
#[derive(Debug, Clone, Default)]
pub struct CardDrawing {
    /// Card color outside the cut line
    pub bleed: Drawing,
    pub face: Drawing,
}

pub struct CardFrameRenderer<'a> {
    geometry: Geometry,
    fonts: Fonts,
    features: Features,
    title_color: Rgb,
    body_color: Rgb,
    marker: String,
    marker_key: [u8; 3],
    recolored_markers: RefCell<HashMap<[u8; 3], Rc<RasterAsset>>>,
    measurer: &'a dyn TextMeasurer,
    assets: &'a dyn AssetSource,
}

impl<'a> CardFrameRenderer<'a> {
    pub fn new(
        config: &EngineConfig,
        measurer: &'a dyn TextMeasurer,
        assets: &'a dyn AssetSource,
    ) -> Result<Self, DeckError> {
        let color = |context: &str, hex: &str| {
            Rgb::from_hex(hex).map_err(|source| DeckError::Color {
                context: context.to_string(),
                source,
            })
        };
        Ok(Self {
            geometry: Geometry::from_config(&config.geometry),
            fonts: config.fonts.clone(),
            features: config.features,
            title_color: color("title color", &config.colors.title)?,
            body_color: color("body color", &config.colors.body)?,
            marker: config.interrupt_marker.clone(),
            marker_key: color("marker key color", &config.colors.marker_key)?.to_bytes(),
            recolored_markers: RefCell::new(HashMap::new()),
            measurer,
            assets,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Render a card. A missing asset fails the whole card; nothing partial
    /// is returned.
    pub fn render(&self, card: &CardRecord) -> Result<CardDrawing, AssetError> {
        let g = &self.geometry;
        let card_type = card.card_type;

        let mut bleed = Drawing::new();
        bleed.fill_frame(g.bleed_rect(), g.card_rect(), card_type.color);

        // Border frame; the title strip is the frame's top side
        let mut drawing = Drawing::new();
        drawing.fill_frame(g.card_rect(), g.interior(), card_type.color);

        let title_band = Rect::new(
            g.border + g.title_padding,
            g.border,
            g.card_width - 2.0 * (g.border + g.title_padding),
            g.title_bar - g.border,
        );
        let title = measure_and_place(
            self.measurer,
            &card_type.display_name,
            &self.fonts.title,
            title_band.width,
            title_band,
            Alignment::RIGHT_MIDDLE,
        );
        drawing.text(title, self.title_color);

        if card.interrupt && self.features.interrupts {
            let marker = self.marker_for(card_type.color)?;
            let (width, height) = fit_within(marker.aspect_ratio(), g.title_bar, g.title_bar);
            let rect = Rect::new(g.border, (g.card_height - height) / 2.0, width, height);
            drawing.image(marker, rect, Rgb::WHITE);
        } else if card.interrupt {
            log::debug!("line {}: interrupt markers disabled", card.line);
        }

        if let (Some(reference), true) = (&card.image, self.features.images) {
            let illustration = self.assets.load(reference)?;
            let rect = g.interior().fit_centered(illustration.aspect_ratio());
            drawing.image(illustration, rect, Rgb::WHITE);
        }

        if let Some(icon) = &card_type.icon {
            let max_height = g.title_bar - g.border;
            let (width, height) = fit_within(icon.aspect_ratio(), g.card_width / 2.0, max_height);
            let rect = Rect::new(g.border, g.border, width, height);
            drawing.image(Rc::clone(icon), rect, card_type.color);
        }

        let body = if card_type.is_ending() {
            let interior = g.interior();
            let band = Rect::new(g.text_inset, interior.y, g.wrap_width(), interior.height);
            measure_and_place(
                self.measurer,
                &card.body_text,
                &self.fonts.ending,
                g.wrap_width(),
                band,
                Alignment::CENTERED,
            )
        } else {
            measure_and_place(
                self.measurer,
                &card.body_text,
                &self.fonts.body,
                g.wrap_width(),
                g.paragraph_band(),
                Alignment::BOTTOM_CENTER,
            )
        };
        drawing.text(body, self.body_color);

        Ok(CardDrawing {
            bleed,
            face: drawing,
        })
    }

    /// The interrupt marker with its key color swapped for `color`.
    fn marker_for(&self, color: Rgb) -> Result<Rc<RasterAsset>, AssetError> {
        let target = color.to_bytes();
        if let Some(marker) = self.recolored_markers.borrow().get(&target) {
            return Ok(Rc::clone(marker));
        }
        let base = self.assets.load(&self.marker)?;
        let marker = Rc::new(base.recolored(self.marker_key, target));
        self.recolored_markers
            .borrow_mut()
            .insert(target, Rc::clone(&marker));
        Ok(marker)
    }
}
