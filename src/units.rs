// Unit conversions between millimeters, PDF points and reference raster grids

/// PDF points per millimeter (72 / 25.4)
pub const POINTS_PER_MM: f32 = 2.8346457;

/// Millimeters per inch, used for DPI computations
pub const MM_PER_INCH: f32 = 25.4;

/// Convert millimeters into page units (points).
pub fn to_page_units(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert page units (points) back into millimeters.
pub fn from_page_units(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

/// Rescale a value measured on a reference raster into millimeters.
///
/// `reference_side_px` is the raster's extent along the side that maps onto
/// `target_side_mm` of the physical page.
pub fn from_reference_grid(px: f32, reference_side_px: f32, target_side_mm: f32) -> f32 {
    px * target_side_mm / reference_side_px
}

/// DPI at which `width_px` pixels cover `width_mm` millimeters.
pub fn dpi_for(width_px: u32, width_mm: f32) -> f32 {
    width_px as f32 / (width_mm / MM_PER_INCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_units_round_trip() {
        let pt = to_page_units(210.0);
        assert!((pt - 595.2756).abs() < 0.001);
        assert!((from_page_units(pt) - 210.0).abs() < 1e-4);
    }

    #[test]
    fn test_reference_grid_card_width() {
        // 744 px on a 2480 px wide A4 raster is a 63 mm card
        let mm = from_reference_grid(744.0, 2480.0, 210.0);
        assert!((mm - 63.0).abs() < 1e-4);
    }

    #[test]
    fn test_dpi_for_one_inch() {
        assert!((dpi_for(300, 25.4) - 300.0).abs() < 1e-3);
    }
}
