//! Glyph bitmaps and the source they come from
//!
//! Cards are 8x8 one-bit bitmaps stored as 8 row bytes, most significant bit
//! leftmost. The core only reads them: GROM (0-255) ships in the console,
//! GRAM (256-319) is loaded by the cartridge, and both live with the caller.

use std::collections::HashMap;

/// Lowest glyph index in the programmable (GRAM) bank
pub const GRAM_FIRST: u16 = 256;
/// Highest glyph index GRAM can actually address (64 slots)
pub const GRAM_LAST: u16 = 319;
/// Highest glyph index a tile word can carry.
///
/// 320-511 is representable in the 9-bit field but maps to no physical
/// card; such indices round-trip through the codec and render blank.
pub const GLYPH_INDEX_MAX: u16 = 511;

/// An 8x8 one-bit bitmap, one byte per row, MSB = leftmost pixel.
pub type Glyph = [u8; 8];

/// Read-only lookup from glyph index to bitmap.
///
/// `None` means the index has no card; the compositor substitutes a blank
/// bitmap rather than failing the render.
pub trait GlyphSource {
    fn glyph(&self, index: u16) -> Option<Glyph>;
}

impl GlyphSource for HashMap<u16, Glyph> {
    fn glyph(&self, index: u16) -> Option<Glyph> {
        self.get(&index).copied()
    }
}

impl<S: GlyphSource + ?Sized> GlyphSource for &S {
    fn glyph(&self, index: u16) -> Option<Glyph> {
        (**self).glyph(index)
    }
}

/// A source with no cards at all; every tile and sprite renders blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlyphs;

impl GlyphSource for NoGlyphs {
    fn glyph(&self, _index: u16) -> Option<Glyph> {
        None
    }
}

/// Whether a glyph bit is set, with (0, 0) the top-left pixel.
pub fn glyph_bit(glyph: &Glyph, row: usize, col: usize) -> bool {
    (glyph[row] >> (7 - col)) & 1 == 1
}
