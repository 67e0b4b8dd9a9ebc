// PDF output: replays page drawings onto printpdf layers

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Polygon, Px,
};

use crate::draw::{DrawCommand, PathSegment, Point, Rect, Rgb};
use crate::error::DeckError;
use crate::fonts::{winansi_text, FontLibrary};
use crate::geometry::Geometry;
use crate::pager::{Page, PageSink};
use crate::text::{FontFace, FontFamily, TextBlock};
use crate::units::{dpi_for, to_page_units};

const LAYER_NAME: &str = "Cards";

/// Writes flushed pages into a single PDF document.
pub struct PdfWriter {
    doc: PdfDocumentReference,
    /// The page `PdfDocument::new` creates up front, used for the first flush
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
    fonts: HashMap<FontFace, IndirectFontRef>,
    page_width: f32,
    page_height: f32,
    pages: u32,
}

impl PdfWriter {
    /// Builtin faces are always registered; every file in `library` is
    /// embedded.
    pub fn new(
        title: &str,
        geometry: &Geometry,
        document_id: &str,
        library: &FontLibrary,
    ) -> Result<Self, DeckError> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            Mm(geometry.page_width),
            Mm(geometry.page_height),
            LAYER_NAME,
        );
        let doc = doc.with_document_id(document_id.to_string());

        let mut fonts = HashMap::new();
        for (family, builtin) in [
            (FontFamily::Helvetica, BuiltinFont::Helvetica),
            (FontFamily::HelveticaBold, BuiltinFont::HelveticaBold),
        ] {
            let font = doc
                .add_builtin_font(builtin)
                .map_err(|e| DeckError::Pdf(e.to_string()))?;
            fonts.insert(FontFace::Builtin(family), font);
        }
        for file in library.files() {
            let font = doc
                .add_external_font(file.data())
                .map_err(|e| DeckError::Font {
                    path: file.path().display().to_string(),
                    message: e.to_string(),
                })?;
            fonts.insert(FontFace::File(file.path().to_path_buf()), font);
        }

        Ok(Self {
            doc,
            first_page: Some((page1, layer1)),
            fonts,
            page_width: geometry.page_width,
            page_height: geometry.page_height,
            pages: 0,
        })
    }

    /// Pages fully written so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn save(self, output_path: &Path) -> Result<(), DeckError> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        self.doc
            .save(&mut writer)
            .map_err(|e| DeckError::Pdf(e.to_string()))?;
        Ok(())
    }

    fn next_layer(&mut self) -> PdfLayerReference {
        let (page, layer) = match self.first_page.take() {
            Some(first) => first,
            None => self
                .doc
                .add_page(Mm(self.page_width), Mm(self.page_height), LAYER_NAME),
        };
        self.doc.get_page(page).get_layer(layer)
    }
}

impl PageSink for PdfWriter {
    fn emit_page(&mut self, page: Page) -> Result<(), DeckError> {
        let layer = self.next_layer();
        let canvas = Canvas {
            layer: &layer,
            fonts: &self.fonts,
            page_height: self.page_height,
        };
        log::debug!("Writing page {} to PDF", page.number);
        canvas.draw(page.drawing.commands(), Point::ORIGIN)?;
        self.pages += 1;
        Ok(())
    }
}

// ============================================================================
// Drawing onto a layer
// ============================================================================

/// Converts top-left millimeter coordinates into PDF's bottom-left space.
struct Canvas<'a> {
    layer: &'a PdfLayerReference,
    fonts: &'a HashMap<FontFace, IndirectFontRef>,
    page_height: f32,
}

impl Canvas<'_> {
    fn y(&self, origin: Point, y: f32) -> Mm {
        Mm(self.page_height - (origin.y + y))
    }

    fn point(&self, origin: Point, p: Point) -> printpdf::Point {
        printpdf::Point::new(Mm(origin.x + p.x), self.y(origin, p.y))
    }

    fn rect_ring(&self, origin: Point, rect: &Rect) -> Vec<(printpdf::Point, bool)> {
        [
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.right(), rect.bottom()),
            Point::new(rect.x, rect.bottom()),
        ]
        .into_iter()
        .map(|p| (self.point(origin, p), false))
        .collect()
    }

    fn draw(&self, commands: &[DrawCommand], origin: Point) -> Result<(), DeckError> {
        for command in commands {
            match command {
                DrawCommand::Group { offset, commands } => {
                    self.layer.save_graphics_state();
                    let result = self.draw(commands, origin.offset(*offset));
                    self.layer.restore_graphics_state();
                    result?;
                }
                DrawCommand::FillFrame { outer, inner, color } => {
                    self.layer.set_fill_color(pdf_color(*color));
                    self.layer.add_polygon(Polygon {
                        rings: vec![self.rect_ring(origin, outer), self.rect_ring(origin, inner)],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::EvenOdd,
                    });
                }
                DrawCommand::FillRect { rect, color } => {
                    self.layer.set_fill_color(pdf_color(*color));
                    self.layer.add_polygon(Polygon {
                        rings: vec![self.rect_ring(origin, rect)],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::NonZero,
                    });
                }
                DrawCommand::Text { block, color } => self.text(origin, block, *color)?,
                DrawCommand::Image { asset, rect, matte } => {
                    let rgb_image = asset.composite_rgb(matte.to_bytes());
                    let (width, height) = rgb_image.dimensions();
                    let image = Image::from(ImageXObject {
                        width: Px(width as usize),
                        height: Px(height as usize),
                        color_space: ColorSpace::Rgb,
                        bits_per_component: ColorBits::Bit8,
                        interpolate: true,
                        image_data: rgb_image.into_raw(),
                        image_filter: None,
                        clipping_bbox: None,
                        smask: None,
                    });
                    // printpdf anchors images at their bottom-left corner
                    image.add_to_layer(
                        self.layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm(origin.x + rect.x)),
                            translate_y: Some(self.y(origin, rect.bottom())),
                            dpi: Some(dpi_for(width, rect.width)),
                            ..Default::default()
                        },
                    );
                }
                DrawCommand::Stroke { path, width, color } => {
                    self.layer.set_outline_color(pdf_color(*color));
                    self.layer.set_outline_thickness(to_page_units(*width));
                    for points in subpaths(path.segments()) {
                        self.layer.add_line(Line {
                            points: points
                                .into_iter()
                                .map(|(p, bezier)| (self.point(origin, p), bezier))
                                .collect(),
                            is_closed: false,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn text(&self, origin: Point, block: &TextBlock, color: Rgb) -> Result<(), DeckError> {
        let face = block.font.face();
        let font = self
            .fonts
            .get(&face)
            .ok_or_else(|| DeckError::Pdf(format!("font {:?} not loaded", face)))?;
        self.layer.set_fill_color(pdf_color(color));
        for line in &block.lines {
            let text = match &face {
                FontFace::Builtin(_) => winansi_text(&line.text),
                FontFace::File(_) => Cow::Borrowed(line.text.as_str()),
            };
            self.layer.use_text(
                &*text,
                block.font.size,
                Mm(origin.x + line.x),
                self.y(origin, line.baseline),
                font,
            );
        }
        Ok(())
    }
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(color.r, color.g, color.b, None))
}

/// Split a path into printpdf point lists. A `true` flag on a point and its
/// successor starts a cubic bezier through the next three points.
fn subpaths(segments: &[PathSegment]) -> Vec<Vec<(Point, bool)>> {
    let mut out: Vec<Vec<(Point, bool)>> = Vec::new();
    for segment in segments {
        match *segment {
            PathSegment::MoveTo(p) => out.push(vec![(p, false)]),
            PathSegment::LineTo(p) => match out.last_mut() {
                Some(current) => current.push((p, false)),
                None => out.push(vec![(p, false)]),
            },
            PathSegment::CurveTo(c1, c2, end) => {
                if out.is_empty() {
                    out.push(vec![(c1, false)]);
                }
                if let Some(current) = out.last_mut() {
                    if let Some(last) = current.last_mut() {
                        last.1 = true;
                    }
                    current.extend([(c1, true), (c2, false), (end, false)]);
                }
            }
        }
    }
    out.retain(|points| points.len() > 1);
    out
}
