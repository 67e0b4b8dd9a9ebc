// Grid pagination: nine cards per page plus registration crosses

use std::f32::consts::PI;

use crate::draw::{Drawing, Path, Point, Rgb};
use crate::error::DeckError;
use crate::frame::CardDrawing;
use crate::geometry::{Geometry, CARDS_PER_PAGE, GRID_COLUMNS, GRID_ROWS};

// ============================================================================
// Pages and Sinks
// ============================================================================

/// A finished page, in page millimeters with the origin at the top-left.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub cards: usize,
    pub drawing: Drawing,
}

/// Receives pages in order as the pager flushes them.
pub trait PageSink {
    fn emit_page(&mut self, page: Page) -> Result<(), DeckError>;
}

/// Keeps flushed pages in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub pages: Vec<Page>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageSink for MemorySink {
    fn emit_page(&mut self, page: Page) -> Result<(), DeckError> {
        self.pages.push(page);
        Ok(())
    }
}

// ============================================================================
// Registration Marks
// ============================================================================

/// Page positions of every registration cross, each grid corner exactly once.
///
/// Every cell contributes its top-left corner; the rightmost column also
/// contributes its right edge and the bottom row its bottom edge, so shared
/// internal lines are never marked twice.
pub fn registration_points(geometry: &Geometry) -> Vec<Point> {
    let mut points = Vec::with_capacity((GRID_COLUMNS + 1) * (GRID_ROWS + 1));
    for y in 0..GRID_ROWS {
        for x in 0..GRID_COLUMNS {
            for off_x in [0.0, geometry.card_width] {
                if x != GRID_COLUMNS - 1 && off_x > 0.0 {
                    continue;
                }
                for off_y in [0.0, geometry.card_height] {
                    if y != GRID_ROWS - 1 && off_y > 0.0 {
                        continue;
                    }
                    points.push(Point::new(
                        geometry.grid_origin.x + x as f32 * geometry.card_width + off_x,
                        geometry.grid_origin.y + y as f32 * geometry.card_height + off_y,
                    ));
                }
            }
        }
    }
    points
}

/// Plus sign with arms of length `arm`, ringed by four quarter arcs of radius
/// `arm` joining adjacent arm tips. Centered on the origin.
pub fn registration_cross(arm: f32) -> Path {
    let mut path = Path::new();
    path.move_to(Point::new(-arm, 0.0))
        .rel_line_to(arm * 2.0, 0.0)
        .move_to(Point::new(0.0, -arm))
        .rel_line_to(0.0, arm * 2.0)
        .arc(Point::new(arm, arm), arm, PI, 3.0 * PI / 2.0)
        .arc(Point::new(arm, -arm), arm, PI / 2.0, PI)
        .arc(Point::new(-arm, -arm), arm, 0.0, PI / 2.0)
        .arc(Point::new(-arm, arm), arm, 3.0 * PI / 2.0, PI * 2.0);
    path
}

// ============================================================================
// Grid Pager
// ============================================================================

/// Places card drawings into the 3x3 grid and flushes full pages.
///
/// Bleeds are collected apart from card faces and painted first, so each
/// card's border stays its own color after cutting.
#[derive(Debug)]
pub struct GridPager {
    geometry: Geometry,
    occupied: [bool; CARDS_PER_PAGE],
    page_number: u32,
    bleeds: Drawing,
    faces: Drawing,
}

impl GridPager {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            occupied: [false; CARDS_PER_PAGE],
            page_number: 1,
            bleeds: Drawing::new(),
            faces: Drawing::new(),
        }
    }

    /// Lowest free slot on the active page (0-8), if any.
    pub fn slot(&self) -> Option<usize> {
        self.occupied.iter().position(|taken| !taken)
    }

    pub fn cards_on_page(&self) -> usize {
        self.occupied.iter().filter(|taken| **taken).count()
    }

    pub fn pages_emitted(&self) -> u32 {
        self.page_number - 1
    }

    /// Position a card at a grid slot of the active page. The slot must be
    /// in range and still free.
    pub fn place(&mut self, card: CardDrawing, slot: usize) -> Result<(), DeckError> {
        match self.occupied.get(slot) {
            None => return Err(DeckError::Slot { slot, reason: "out of range" }),
            Some(true) => return Err(DeckError::Slot { slot, reason: "already occupied" }),
            Some(false) => {}
        }
        let origin = self.geometry.slot_origin(slot);
        self.bleeds.group(origin, card.bleed);
        self.faces.group(origin, card.face);
        self.occupied[slot] = true;
        Ok(())
    }

    /// Place a card in the lowest free slot, flushing the page once it is full.
    pub fn push(&mut self, card: CardDrawing, sink: &mut dyn PageSink) -> Result<(), DeckError> {
        let slot = match self.slot() {
            Some(slot) => slot,
            None => {
                self.end_page(sink)?;
                0
            }
        };
        self.place(card, slot)?;
        if self.slot().is_none() {
            self.end_page(sink)?;
        }
        Ok(())
    }

    /// Draw the registration crosses and hand the page to the sink.
    pub fn end_page(&mut self, sink: &mut dyn PageSink) -> Result<(), DeckError> {
        let cards = self.cards_on_page();
        let mut drawing = std::mem::take(&mut self.bleeds);
        drawing.append(std::mem::take(&mut self.faces));

        let cross = registration_cross(self.geometry.cross_arm);
        for point in registration_points(&self.geometry) {
            let mut mark = Drawing::new();
            mark.stroke(cross.clone(), self.geometry.cross_line_width, Rgb::BLACK);
            drawing.group(point, mark);
        }

        let page = Page {
            number: self.page_number,
            width: self.geometry.page_width,
            height: self.geometry.page_height,
            cards,
            drawing,
        };
        log::debug!("Flushing page {} with {} cards", page.number, page.cards);
        sink.emit_page(page)?;

        self.page_number += 1;
        self.occupied = [false; CARDS_PER_PAGE];
        Ok(())
    }

    /// Flush the last partial page. A deck with no cards still gets one page
    /// of registration marks. Returns the number of pages emitted.
    pub fn finish(mut self, sink: &mut dyn PageSink) -> Result<u32, DeckError> {
        if self.cards_on_page() > 0 || self.pages_emitted() == 0 {
            self.end_page(sink)?;
        }
        Ok(self.pages_emitted())
    }
}
