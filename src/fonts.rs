//! Font files embedded into the document, and the WinAnsi fallback for the
//! builtin faces.
//!
//! A [`FontLibrary`] holds every font file the configuration names. The same
//! bytes are measured here with ttf-parser and embedded by the PDF writer, so
//! wrapped line widths match what is drawn.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Fonts;
use crate::error::DeckError;
use crate::text::{
    layout_lines, wrap_lines, BuiltinMetrics, FontSpec, MeasuredText, TextMeasurer,
};

const FALLBACK_CAP_HEIGHT: f32 = 0.7;

// ============================================================================
// Font Files
// ============================================================================

/// A parsed-once font file kept as raw bytes.
#[derive(Clone)]
pub struct FontFile {
    path: PathBuf,
    data: Vec<u8>,
    units_per_em: f32,
    cap_height: f32,
}

impl std::fmt::Debug for FontFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFile")
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FontFile {
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let data = std::fs::read(path).map_err(|e| DeckError::Font {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(path, data)
    }

    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self, DeckError> {
        let path = path.into();
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| DeckError::Font {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let units_per_em = face.units_per_em() as f32;
        let cap_height = face
            .capital_height()
            .map(|h| h as f32 / units_per_em)
            .unwrap_or(FALLBACK_CAP_HEIGHT);
        log::debug!(
            "Loaded font {} ({} glyphs, {} units/em)",
            path.display(),
            face.number_of_glyphs(),
            units_per_em
        );
        Ok(Self {
            path,
            data,
            units_per_em,
            cap_height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the file has a glyph for every character of `text`.
    pub fn covers(&self, text: &str) -> bool {
        match ttf_parser::Face::parse(&self.data, 0) {
            Ok(face) => text
                .chars()
                .filter(|c| !c.is_whitespace())
                .all(|c| face.glyph_index(c).is_some()),
            Err(_) => false,
        }
    }

    fn measure(&self, text: &str, font: &FontSpec, wrap_width: f32) -> MeasuredText {
        let face = match ttf_parser::Face::parse(&self.data, 0) {
            Ok(face) => face,
            Err(_) => return BuiltinMetrics.measure(text, font, wrap_width),
        };
        let scale = font.size / self.units_per_em;
        // Characters without a glyph are dropped by the writer, so they take no room
        let advance = |c: char| {
            face.glyph_index(c)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map(|units| units as f32 * scale)
                .unwrap_or(0.0)
        };
        let lines = wrap_lines(text, wrap_width, advance);
        layout_lines(lines, font, self.cap_height)
    }
}

// ============================================================================
// Font Library
// ============================================================================

/// Font files by configured path. Specs without a file use the builtin faces.
#[derive(Debug, Default)]
pub struct FontLibrary {
    files: HashMap<PathBuf, FontFile>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font file named by a text role.
    pub fn load(fonts: &Fonts) -> Result<Self, DeckError> {
        let mut library = Self::new();
        for spec in [&fonts.title, &fonts.body, &fonts.ending] {
            if let Some(path) = &spec.file {
                if !library.files.contains_key(path) {
                    library.insert(FontFile::load(path)?);
                }
            }
        }
        Ok(library)
    }

    pub fn insert(&mut self, file: FontFile) {
        self.files.insert(file.path.clone(), file);
    }

    pub fn get(&self, path: &Path) -> Option<&FontFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &FontFile> {
        self.files.values()
    }

    /// Whether `text` survives drawing with `spec` unchanged.
    pub fn can_draw(&self, spec: &FontSpec, text: &str) -> bool {
        match &spec.file {
            Some(path) => self.get(path).map_or(false, |file| file.covers(text)),
            None => matches!(winansi_text(text), Cow::Borrowed(_)),
        }
    }
}

impl TextMeasurer for FontLibrary {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: f32) -> MeasuredText {
        match font.file.as_deref().and_then(|path| self.get(path)) {
            Some(file) => file.measure(text, font, wrap_width),
            None => BuiltinMetrics.measure(text, font, wrap_width),
        }
    }
}

// ============================================================================
// WinAnsi fallback
// ============================================================================

/// Windows-1252 characters outside Latin-1 that WinAnsi still encodes.
const WINANSI_EXTRA: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

fn winansi_encodable(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF) || WINANSI_EXTRA.contains(c)
}

/// Text the builtin faces can show. Esperanto letters lose their diacritic
/// (`ĵ` becomes `j`), anything else unencodable becomes `?`.
pub fn winansi_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(|c| winansi_encodable(c) || c == '\n') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                'ĉ' => 'c',
                'ĝ' => 'g',
                'ĥ' => 'h',
                'ĵ' => 'j',
                'ŝ' => 's',
                'ŭ' => 'u',
                'Ĉ' => 'C',
                'Ĝ' => 'G',
                'Ĥ' => 'H',
                'Ĵ' => 'J',
                'Ŝ' => 'S',
                'Ŭ' => 'U',
                '\n' => '\n',
                c if winansi_encodable(c) => c,
                _ => '?',
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::FontFamily;

    const DEJAVU: &[u8] = include_bytes!("../tests/fixtures/DejaVuSans.ttf");

    fn dejavu() -> FontFile {
        FontFile::from_bytes("DejaVuSans.ttf", DEJAVU.to_vec()).unwrap()
    }

    #[test]
    fn test_winansi_text() {
        assert_eq!(winansi_text("Aĵo"), "Ajo");
        assert_eq!(winansi_text("Ŝipo ĉe la ĥoro"), "Sipo ce la horo");
        assert!(matches!(winansi_text("café – “quoted”"), Cow::Borrowed(_)));
        assert_eq!(winansi_text("日"), "?");
    }

    #[test]
    fn test_font_file_covers_esperanto() {
        let file = dejavu();
        assert!(file.covers("Aĵo ŝ ĉ ĝ ĥ ŭ"));
        assert!(file.data().starts_with(&DEJAVU[..4]));
    }

    #[test]
    fn test_garbage_font_rejected() {
        match FontFile::from_bytes("broken.ttf", vec![0, 1, 2, 3]) {
            Err(DeckError::Font { path, .. }) => assert_eq!(path, "broken.ttf"),
            other => panic!("expected font error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_font_file() {
        let mut fonts = Fonts::default();
        fonts.body = FontSpec::from_file("/nonexistent/font.ttf", 9.0);
        assert!(matches!(FontLibrary::load(&fonts), Err(DeckError::Font { .. })));
    }

    #[test]
    fn test_library_measures_with_file_metrics() {
        let mut library = FontLibrary::new();
        library.insert(dejavu());
        let spec = FontSpec::from_file("DejaVuSans.ttf", 10.0);

        let measured = library.measure("Aĵo", &spec, 1000.0);
        assert_eq!(measured.lines[0].text, "Aĵo");
        assert!(measured.width > 0.0);
        // wider than the two letters alone: ĵ has an advance of its own
        let without = library.measure("Ao", &spec, 1000.0);
        assert!(measured.width > without.width);
        assert!(library.can_draw(&spec, "Aĵo"));
    }

    #[test]
    fn test_library_falls_back_to_builtin() {
        let library = FontLibrary::new();
        let spec = FontSpec::new(FontFamily::Helvetica, 10.0);
        assert_eq!(
            library.measure("Hello", &spec, 1000.0),
            BuiltinMetrics.measure("Hello", &spec, 1000.0)
        );
        assert!(!library.can_draw(&spec, "Aĵo"));
        assert!(library.can_draw(&spec, "Evento"));
    }
}
