//! Text measurement and block placement.
//!
//! Measurement happens in points through a [`TextMeasurer`]; placement turns
//! the measured box into millimeters inside a card-local band.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::draw::Rect;
use crate::fonts::winansi_text;
use crate::units::{from_page_units, to_page_units};

/// Line height as a multiple of the font size
pub const LINE_SPACING: f32 = 1.2;

// ============================================================================
// Fonts
// ============================================================================

/// Builtin PDF faces. They only encode WinAnsi text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    Helvetica,
    HelveticaBold,
}

/// A font at a size in points. When `file` is set the TrueType/OpenType
/// file is embedded and measured instead of the builtin `family`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default)]
    pub family: FontFamily,
    pub size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl FontSpec {
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            size,
            file: None,
        }
    }

    pub fn from_file(file: impl Into<PathBuf>, size: f32) -> Self {
        Self {
            family: FontFamily::default(),
            size,
            file: Some(file.into()),
        }
    }

    pub fn face(&self) -> FontFace {
        match &self.file {
            Some(path) => FontFace::File(path.clone()),
            None => FontFace::Builtin(self.family),
        }
    }
}

/// Identifies the face a block is drawn with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontFace {
    Builtin(FontFamily),
    File(PathBuf),
}

// ============================================================================
// Measurement
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredLine {
    pub text: String,
    /// Advance width in points
    pub width: f32,
}

/// Logical extents of wrapped text, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredText {
    pub lines: Vec<MeasuredLine>,
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
    pub cap_height: f32,
}

/// Shapes and measures text. Implementations wrap at `wrap_width` points.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: f32) -> MeasuredText;
}

/// Greedy word wrap over a per-character advance function (in points).
pub(crate) fn wrap_lines(text: &str, wrap_width: f32, advance: impl Fn(char) -> f32) -> Vec<MeasuredLine> {
    let width_of = |s: &str| s.chars().map(&advance).sum::<f32>();
    let space = advance(' ');
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;
        for word in paragraph.split_whitespace() {
            let word_width = width_of(word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space + word_width <= wrap_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            } else {
                lines.push(MeasuredLine {
                    text: std::mem::take(&mut current),
                    width: current_width,
                });
                current.push_str(word);
                current_width = word_width;
            }
        }
        lines.push(MeasuredLine {
            text: current,
            width: current_width,
        });
    }
    lines
}

pub(crate) fn layout_lines(lines: Vec<MeasuredLine>, font: &FontSpec, cap_height_em: f32) -> MeasuredText {
    let line_height = font.size * LINE_SPACING;
    let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
    MeasuredText {
        height: line_height * lines.len() as f32,
        lines,
        width,
        line_height,
        cap_height: font.size * cap_height_em,
    }
}

/// Advance widths of the standard PDF Helvetica faces, in 1/1000 em.
/// Index = (char as usize) - 32, covering 0x20 (space) through 0x7E (~).
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // : - @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [ - `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // { - ~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // : - @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [ - `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // { - ~
];

/// Metrics for the builtin PDF fonts the document writer embeds.
///
/// Text is first reduced to what WinAnsi can encode, so the measured lines
/// are exactly what gets drawn. Characters outside printable ASCII fall back
/// to the average lowercase width.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl BuiltinMetrics {
    const CAP_HEIGHT: f32 = 0.718;
    const FALLBACK_WIDTH: u16 = 556;

    fn table(family: FontFamily) -> &'static [u16; 95] {
        match family {
            FontFamily::Helvetica => &HELVETICA_WIDTHS,
            FontFamily::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    pub fn char_width(family: FontFamily, c: char, size: f32) -> f32 {
        let code = c as usize;
        let units = if (32..=126).contains(&code) {
            Self::table(family)[code - 32]
        } else {
            Self::FALLBACK_WIDTH
        };
        units as f32 * size / 1000.0
    }
}

impl TextMeasurer for BuiltinMetrics {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: f32) -> MeasuredText {
        let text = winansi_text(text);
        let lines = wrap_lines(&text, wrap_width, |c| {
            BuiltinMetrics::char_width(font.family, c, font.size)
        });
        layout_lines(lines, font, Self::CAP_HEIGHT)
    }
}

/// Every character advances by `advance_em` times the font size.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    pub advance_em: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasurer for MonospaceMetrics {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: f32) -> MeasuredText {
        let advance = self.advance_em * font.size;
        let lines = wrap_lines(text, wrap_width, |_| advance);
        layout_lines(lines, font, 0.7)
    }
}

// ============================================================================
// Placement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl Alignment {
    pub const CENTERED: Alignment = Alignment {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Center,
    };
    pub const BOTTOM_CENTER: Alignment = Alignment {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Bottom,
    };
    pub const RIGHT_MIDDLE: Alignment = Alignment {
        horizontal: HorizontalAlign::Right,
        vertical: VerticalAlign::Center,
    };
}

/// One line of a placed block; `x` is the left edge, `baseline` in mm.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
}

/// Measured text positioned in card-local millimeters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub font: FontSpec,
    pub lines: Vec<PlacedLine>,
    pub bounds: Rect,
    /// Measured height exceeded the band; the text is drawn anyway
    pub overflow: bool,
}

impl TextBlock {
    pub fn height(&self) -> f32 {
        self.bounds.height
    }
}

/// Measure `text` wrapped at `wrap_width` mm and place it inside `band`.
pub fn measure_and_place(
    measurer: &dyn TextMeasurer,
    text: &str,
    font: &FontSpec,
    wrap_width: f32,
    band: Rect,
    alignment: Alignment,
) -> TextBlock {
    let measured = measurer.measure(text, font, to_page_units(wrap_width));
    let height = from_page_units(measured.height);
    let line_height = from_page_units(measured.line_height);
    let baseline_offset = (line_height + from_page_units(measured.cap_height)) / 2.0;

    let top = match alignment.vertical {
        VerticalAlign::Center => band.center().y - height / 2.0,
        VerticalAlign::Bottom => band.bottom() - height,
    };

    let line_x = |width: f32| match alignment.horizontal {
        HorizontalAlign::Left => band.x,
        HorizontalAlign::Center => band.x + (band.width - width) / 2.0,
        HorizontalAlign::Right => band.right() - width,
    };

    let lines: Vec<PlacedLine> = measured
        .lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| PlacedLine {
            x: line_x(from_page_units(line.width)),
            baseline: top + i as f32 * line_height + baseline_offset,
            text: line.text,
        })
        .collect();

    let width = from_page_units(measured.width);
    let overflow = height > band.height + 1e-4;
    if overflow {
        log::warn!(
            "Text overflows its band ({:.2}mm > {:.2}mm): {:?}",
            height,
            band.height,
            text.chars().take(40).collect::<String>()
        );
    }

    TextBlock {
        font: font.clone(),
        lines,
        bounds: Rect::new(line_x(width), top, width, height),
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: FontSpec = FontSpec {
        family: FontFamily::Helvetica,
        size: 10.0,
        file: None,
    };

    #[test]
    fn test_builtin_widths() {
        // "Hello" in Helvetica: H 722 e 556 l 222 l 222 o 556
        let measured = BuiltinMetrics.measure("Hello", &BODY, 1000.0);
        assert_eq!(measured.lines.len(), 1);
        assert!((measured.width - 22.78).abs() < 1e-3);
        assert!((measured.height - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_builtin_lines_hold_encodable_text() {
        let title = FontSpec::new(FontFamily::HelveticaBold, 10.0);
        let measured = BuiltinMetrics.measure("Aĵo", &title, 1000.0);
        assert_eq!(measured.lines[0].text, "Ajo");
    }

    #[test]
    fn test_font_spec_json() {
        let spec: FontSpec =
            serde_json::from_str(r#"{ "file": "fonts/KaushanScript.ttf", "size": 9 }"#).unwrap();
        assert_eq!(spec, FontSpec::from_file("fonts/KaushanScript.ttf", 9.0));
        assert_eq!(spec.face(), FontFace::File(PathBuf::from("fonts/KaushanScript.ttf")));
        assert_eq!(BODY.face(), FontFace::Builtin(FontFamily::Helvetica));
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        let metrics = MonospaceMetrics { advance_em: 1.0 };
        // Each char is 10pt; "aaa bbb" needs 70pt
        let measured = metrics.measure("aaa bbb ccc", &BODY, 75.0);
        let texts: Vec<_> = measured.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc"]);
        assert!((measured.height - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_hard_breaks_are_kept() {
        let measured = MonospaceMetrics::default().measure("one\ntwo", &BODY, 1000.0);
        assert_eq!(measured.lines.len(), 2);
    }

    #[test]
    fn test_overlong_word_gets_its_own_line() {
        let metrics = MonospaceMetrics { advance_em: 1.0 };
        let measured = metrics.measure("a bbbbbbbbbb c", &BODY, 30.0);
        let texts: Vec<_> = measured.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "bbbbbbbbbb", "c"]);
    }

    #[test]
    fn test_vertical_centering() {
        let band = Rect::new(5.0, 40.0, 50.0, 20.0);
        let block = measure_and_place(
            &MonospaceMetrics::default(),
            "centered text",
            &BODY,
            50.0,
            band,
            Alignment::CENTERED,
        );
        let top_gap = block.bounds.y - band.y;
        let bottom_gap = band.bottom() - block.bounds.bottom();
        assert!((top_gap - bottom_gap).abs() < 1e-4);
        assert!(!block.overflow);
        let bounds_center = block.bounds.x + block.bounds.width / 2.0;
        assert!((bounds_center - band.center().x).abs() < 1e-4);
    }

    #[test]
    fn test_bottom_alignment_height_matches_measurement() {
        let band = Rect::new(5.0, 69.0, 53.0, 14.9);
        let metrics = MonospaceMetrics::default();
        let block = measure_and_place(
            &metrics,
            "a few words of body text",
            &BODY,
            53.0,
            band,
            Alignment::BOTTOM_CENTER,
        );
        let measured = metrics.measure("a few words of body text", &BODY, to_page_units(53.0));
        assert!((block.height() - from_page_units(measured.height)).abs() < 1e-4);
        assert!((block.bounds.bottom() - band.bottom()).abs() < 1e-4);
    }

    #[test]
    fn test_right_alignment_flush_with_band() {
        let band = Rect::new(0.0, 0.0, 60.0, 8.0);
        let block = measure_and_place(
            &BuiltinMetrics,
            "Evento",
            &BODY,
            60.0,
            band,
            Alignment::RIGHT_MIDDLE,
        );
        assert!((block.bounds.right() - 60.0).abs() < 1e-4);
        assert!((block.lines[0].x - block.bounds.x).abs() < 1e-4);
    }

    #[test]
    fn test_overflow_is_flagged_not_masked() {
        let band = Rect::new(0.0, 0.0, 20.0, 3.0);
        let block = measure_and_place(
            &MonospaceMetrics::default(),
            "this text will not fit into a tiny band at all",
            &BODY,
            20.0,
            band,
            Alignment::BOTTOM_CENTER,
        );
        assert!(block.overflow);
        assert_eq!(block.font, BODY);
        assert!((block.bounds.bottom() - band.bottom()).abs() < 1e-4);
    }
}
