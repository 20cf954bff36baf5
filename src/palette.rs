//! The 16-color STIC palette
//!
//! Every color field in the model is an index 0-15 into a palette like this
//! one; RGBA values only matter when a figure is materialized into a pixel
//! buffer. The default entries are the jzIntv-measured Intellivision colors.

use image::Rgba;

/// Number of palette entries
pub const PALETTE_SIZE: usize = 16;

/// Highest valid color index
pub const COLOR_MAX: u8 = 15;

/// jzIntv-accurate STIC colors, primary set (0-7) then extended set (8-15).
const STIC_COLORS: [(Rgba<u8>, &str); PALETTE_SIZE] = [
    (Rgba([0x0C, 0x00, 0x05, 255]), "Black"),
    (Rgba([0x00, 0x2D, 0xFF, 255]), "Blue"),
    (Rgba([0xFF, 0x3E, 0x00, 255]), "Red"),
    (Rgba([0xC9, 0xCF, 0xAB, 255]), "Tan"),
    (Rgba([0x38, 0x6B, 0x3F, 255]), "Dark Green"),
    (Rgba([0x00, 0xA7, 0x56, 255]), "Green"),
    (Rgba([0xFA, 0xEB, 0x27, 255]), "Yellow"),
    (Rgba([0xFC, 0xFF, 0xFF, 255]), "White"),
    (Rgba([0xA7, 0xA8, 0xA8, 255]), "Gray"),
    (Rgba([0x5A, 0xCB, 0xFF, 255]), "Cyan"),
    (Rgba([0xFF, 0xA0, 0x48, 255]), "Orange"),
    (Rgba([0xBD, 0x84, 0x38, 255]), "Brown"),
    (Rgba([0xFF, 0x32, 0x76, 255]), "Pink"),
    (Rgba([0x5E, 0xB5, 0xFF, 255]), "Light Blue"),
    (Rgba([0xC3, 0xD9, 0x59, 255]), "Yellow-Green"),
    (Rgba([0xC4, 0x5C, 0xEC, 255]), "Purple"),
];

/// A 16-entry color lookup supplied to the compositor by reference.
///
/// The core never mutates a palette; custom palettes (alternate emulator
/// measurements, accessibility variants) can be built with [`Palette::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgba<u8>; PALETTE_SIZE],
}

impl Palette {
    /// Palette from 16 explicit RGBA entries.
    pub fn new(colors: [Rgba<u8>; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// RGBA value for a color index.
    ///
    /// Indices are validated at the figure boundary; the high bits of an
    /// out-of-range index are ignored here rather than panicking.
    pub fn color(&self, index: u8) -> Rgba<u8> {
        self.colors[usize::from(index) % PALETTE_SIZE]
    }

    /// Conventional name of a default-palette index ("Black", "Tan", ...).
    pub fn name(index: u8) -> &'static str {
        STIC_COLORS[usize::from(index) % PALETTE_SIZE].1
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: STIC_COLORS.map(|(rgba, _)| rgba),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_values() {
        let palette = Palette::default();
        assert_eq!(palette.color(0), Rgba([0x0C, 0x00, 0x05, 255]));
        assert_eq!(palette.color(7), Rgba([0xFC, 0xFF, 0xFF, 255]));
        assert_eq!(palette.color(15), Rgba([0xC4, 0x5C, 0xEC, 255]));
    }

    #[test]
    fn test_color_names() {
        assert_eq!(Palette::name(0), "Black");
        assert_eq!(Palette::name(3), "Tan");
        assert_eq!(Palette::name(11), "Brown");
    }

    #[test]
    fn test_custom_palette() {
        let red = Rgba([255, 0, 0, 255]);
        let palette = Palette::new([red; PALETTE_SIZE]);
        assert_eq!(palette.color(9), red);
    }
}
