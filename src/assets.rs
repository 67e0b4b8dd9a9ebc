// Raster assets for icons, illustrations and the interrupt marker

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use ::image::{DynamicImage, Rgba, RgbaImage, RgbImage};

use crate::error::AssetError;

// ============================================================================
// Raster Asset
// ============================================================================

/// A decoded RGBA image together with the reference it was loaded from.
#[derive(Clone, PartialEq)]
pub struct RasterAsset {
    reference: String,
    pixels: RgbaImage,
}

impl fmt::Debug for RasterAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterAsset")
            .field("reference", &self.reference)
            .field("width_px", &self.width_px())
            .field("height_px", &self.height_px())
            .finish()
    }
}

impl RasterAsset {
    pub fn new(reference: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            reference: reference.into(),
            pixels,
        }
    }

    pub fn from_image(reference: impl Into<String>, image: &DynamicImage) -> Self {
        Self::new(reference, image.to_rgba8())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height_px() == 0 {
            return 1.0;
        }
        self.width_px() as f32 / self.height_px() as f32
    }

    /// Copy with every pixel of color `key` replaced by `to`, alpha untouched.
    pub fn recolored(&self, key: [u8; 3], to: [u8; 3]) -> RasterAsset {
        let mut pixels = self.pixels.clone();
        for pixel in pixels.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            if [r, g, b] == key {
                *pixel = Rgba([to[0], to[1], to[2], a]);
            }
        }
        RasterAsset {
            reference: format!("{}#{:02X}{:02X}{:02X}", self.reference, to[0], to[1], to[2]),
            pixels,
        }
    }

    /// Flatten transparency onto a solid `matte` color.
    pub fn composite_rgb(&self, matte: [u8; 3]) -> RgbImage {
        let (width_px, height_px) = self.pixels.dimensions();
        let mut rgb_image = RgbImage::new(width_px, height_px);
        for (x, y, pixel) in self.pixels.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let alpha = a as f32 / 255.0;
            let blend = |c: u8, bg: u8| (c as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
            rgb_image.put_pixel(
                x,
                y,
                ::image::Rgb([blend(r, matte[0]), blend(g, matte[1]), blend(b, matte[2])]),
            );
        }
        rgb_image
    }
}

// ============================================================================
// Asset Sources
// ============================================================================

/// Resolves asset references (relative paths) to decoded images.
pub trait AssetSource {
    fn load(&self, reference: &str) -> Result<Rc<RasterAsset>, AssetError>;
}

/// Loads PNG/JPEG files below a root directory, caching by reference.
pub struct DirectoryAssets {
    root: PathBuf,
    cache: RefCell<HashMap<String, Rc<RasterAsset>>>,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn read(&self, reference: &str) -> Result<RasterAsset, AssetError> {
        let path = self.root.join(reference);
        let bytes = std::fs::read(&path)
            .map_err(|_| AssetError::NotFound(path.display().to_string()))?;
        let image = ::image::load_from_memory(&bytes).map_err(|e| AssetError::Decode {
            reference: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(RasterAsset::from_image(reference, &image))
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self, reference: &str) -> Result<Rc<RasterAsset>, AssetError> {
        if let Some(asset) = self.cache.borrow().get(reference) {
            return Ok(Rc::clone(asset));
        }
        let asset = Rc::new(self.read(reference)?);
        log::debug!(
            "Loaded asset {} ({}x{} px)",
            reference,
            asset.width_px(),
            asset.height_px()
        );
        self.cache
            .borrow_mut()
            .insert(reference.to_string(), Rc::clone(&asset));
        Ok(asset)
    }
}

/// Assets held in memory, keyed by reference.
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    assets: HashMap<String, Rc<RasterAsset>>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, pixels: RgbaImage) {
        self.assets
            .insert(reference.to_string(), Rc::new(RasterAsset::new(reference, pixels)));
    }

    pub fn with(mut self, reference: &str, pixels: RgbaImage) -> Self {
        self.insert(reference, pixels);
        self
    }
}

impl AssetSource for InMemoryAssets {
    fn load(&self, reference: &str) -> Result<Rc<RasterAsset>, AssetError> {
        self.assets
            .get(reference)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(reference.to_string()))
    }
}
