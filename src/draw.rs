// Device-independent draw commands in millimeters, origin top-left, y down

use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use crate::assets::RasterAsset;
use crate::error::MalformedColor;
use crate::text::TextBlock;

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrink by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }

    pub fn contains(&self, other: &Rect, tolerance: f32) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    /// Largest rectangle with the given aspect ratio (width / height) that
    /// fits inside this one, centered.
    pub fn fit_centered(&self, aspect_ratio: f32) -> Rect {
        let (width, height) = fit_within(aspect_ratio, self.width, self.height);
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// Dimensions preserving `aspect_ratio` inside a `max_width` x `max_height` box.
pub fn fit_within(aspect_ratio: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if max_width / max_height > aspect_ratio {
        // Height-constrained
        (max_height * aspect_ratio, max_height)
    } else {
        // Width-constrained
        (max_width, max_width / aspect_ratio)
    }
}

// ============================================================================
// Color
// ============================================================================

/// RGB color with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode a `RRGGBB` string (an optional leading `#` is accepted).
    pub fn from_hex(hex: &str) -> Result<Rgb, MalformedColor> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MalformedColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| MalformedColor(hex.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("{:02X}{:02X}{:02X}", r, g, b)
    }
}

// ============================================================================
// Paths
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic bezier: two control points, then the end point
    CurveTo(Point, Point, Point),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
    current: Option<Point>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        match self.current {
            Some(_) => self.segments.push(PathSegment::LineTo(p)),
            None => self.segments.push(PathSegment::MoveTo(p)),
        }
        self.current = Some(p);
        self
    }

    pub fn rel_line_to(&mut self, dx: f32, dy: f32) -> &mut Self {
        let from = self.current.unwrap_or(Point::ORIGIN);
        self.line_to(Point::new(from.x + dx, from.y + dy))
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        if self.current.is_none() {
            self.segments.push(PathSegment::MoveTo(c1));
        }
        self.segments.push(PathSegment::CurveTo(c1, c2, end));
        self.current = Some(end);
        self
    }

    /// Circular arc from `start` to `end` radians, clockwise on screen
    /// (angles grow toward +y). Connects from the current point with a
    /// straight line when it is not already at the arc start.
    pub fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32) -> &mut Self {
        let at = |angle: f32| {
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        };
        let first = at(start);
        match self.current {
            Some(p) if (p.x - first.x).abs() < 1e-4 && (p.y - first.y).abs() < 1e-4 => {}
            Some(_) => {
                self.line_to(first);
            }
            None => {
                self.move_to(first);
            }
        }

        let sweep = end - start;
        // At most a quarter turn per bezier; float noise must not add a piece
        let pieces = (sweep.abs() / FRAC_PI_2 - 1e-4).ceil().max(1.0) as usize;
        let step = sweep / pieces as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        for i in 0..pieces {
            let a0 = start + step * i as f32;
            let a1 = a0 + step;
            let p0 = at(a0);
            let p3 = at(a1);
            let c1 = Point::new(p0.x - k * radius * a0.sin(), p0.y + k * radius * a0.cos());
            let c2 = Point::new(p3.x + k * radius * a1.sin(), p3.y - k * radius * a1.cos());
            self.curve_to(c1, c2, p3);
        }
        self
    }

    /// Every point the path passes through or uses as a control point.
    pub fn points(&self) -> Vec<Point> {
        self.segments
            .iter()
            .flat_map(|segment| match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
                PathSegment::CurveTo(c1, c2, end) => vec![c1, c2, end],
            })
            .collect()
    }
}

// ============================================================================
// Draw commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Nested commands drawn with their origin moved to `offset`. Writers
    /// bracket a group with save/restore of the graphics state.
    Group {
        offset: Point,
        commands: Vec<DrawCommand>,
    },
    /// Fill `outer` minus `inner` (even-odd)
    FillFrame { outer: Rect, inner: Rect, color: Rgb },
    FillRect { rect: Rect, color: Rgb },
    Text { block: TextBlock, color: Rgb },
    /// Raster image scaled into `rect`, transparent pixels blended onto `matte`
    Image {
        asset: Rc<RasterAsset>,
        rect: Rect,
        matte: Rgb,
    },
    Stroke { path: Path, width: f32, color: Rgb },
}

/// An ordered list of draw commands; later commands paint over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    commands: Vec<DrawCommand>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Move every command of `other` to the end of this drawing.
    pub fn append(&mut self, other: Drawing) {
        self.commands.extend(other.commands);
    }

    pub fn fill_frame(&mut self, outer: Rect, inner: Rect, color: Rgb) {
        self.push(DrawCommand::FillFrame { outer, inner, color });
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.push(DrawCommand::FillRect { rect, color });
    }

    pub fn text(&mut self, block: TextBlock, color: Rgb) {
        self.push(DrawCommand::Text { block, color });
    }

    pub fn image(&mut self, asset: Rc<RasterAsset>, rect: Rect, matte: Rgb) {
        self.push(DrawCommand::Image { asset, rect, matte });
    }

    pub fn stroke(&mut self, path: Path, width: f32, color: Rgb) {
        self.push(DrawCommand::Stroke { path, width, color });
    }

    /// Append `inner` as a self-contained group translated by `offset`.
    pub fn group(&mut self, offset: Point, inner: Drawing) {
        self.push(DrawCommand::Group {
            offset,
            commands: inner.commands,
        });
    }

    /// Leaf commands paired with their absolute origin.
    pub fn flatten(&self) -> Vec<(Point, &DrawCommand)> {
        let mut out = Vec::new();
        flatten_into(&self.commands, Point::ORIGIN, &mut out);
        out
    }
}

fn flatten_into<'a>(
    commands: &'a [DrawCommand],
    origin: Point,
    out: &mut Vec<(Point, &'a DrawCommand)>,
) {
    for command in commands {
        match command {
            DrawCommand::Group { offset, commands } => {
                flatten_into(commands, origin.offset(*offset), out)
            }
            leaf => out.push((origin, leaf)),
        }
    }
}
