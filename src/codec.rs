//! Bit-exact STIC register word codec
//!
//! Encodes and decodes the three hardware word formats - the BACKTAB tile
//! word and the per-MOB position / Y / attribute words - so figures can
//! interoperate with real hardware and third-party tooling.
//!
//! Tile word, both modes (bits 3-11 always the 9-bit glyph index):
//!
//! ```text
//! color stack:  15 14 | 13  | 12  | 11..3 | 2..0
//!               unused| adv | fg3 | glyph | fg2..0
//! fg/bg:        15..13| 12  | 11..3 | 2..0
//!               fg    | bg3 | glyph | bg2..0
//! ```
//!
//! Sprite words:
//!
//! ```text
//! position:   15..11 | 10 | 9   | 8      | 7..0
//!             unused | dw | vis | intact | x
//! y:          15..12 | 11 | 10 | 9..8  | 7    | 6..0
//!             unused | fv | fh | scale | dh   | y
//! attribute:  15..14 | 13  | 12  | 11..3 | 2..0
//!             unused | pri | c3  | glyph | c2..0
//! ```
//!
//! Decoding is lenient by default: unused bits are ignored, so assets
//! written by other tools load even when they carry garbage there.
//! [`DecodePolicy::Strict`] rejects nonzero unused bits instead.

use crate::coords::{GRID_COLS, GRID_TILES, SPRITE_X_MAX, SPRITE_Y_MAX};
use crate::figure::{
    DisplayMode, Sprite, SpriteSize, SticFigure, Tile, COLOR_STACK_SIZE, SPRITE_SLOTS,
};
use crate::glyph::{GRAM_FIRST, GRAM_LAST};
use thiserror::Error;

/// Register words per sprite slot (position, Y, attribute)
pub const SPRITE_WORDS: usize = 3;

/// A word carried a bit pattern outside the codec's total mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedWord {
    /// Unused bits were set and strict decoding was requested
    #[error("reserved bits {bits:#06x} set in {word} word")]
    ReservedBits { word: &'static str, bits: u16 },
    /// (double-height, scale) pairing no sprite size maps to
    #[error("undisplayable size bits: double-height={double_height}, scale={scale}")]
    UnreachableSize { double_height: bool, scale: u8 },
    /// Sprite glyph field outside the addressable GRAM range
    #[error("sprite glyph index {0} outside GRAM range 256-319")]
    SpriteGlyph(u16),
    /// Sprite x field beyond the device width
    #[error("sprite x {0} exceeds 175")]
    SpriteX(u16),
    /// Sprite y field beyond the device height
    #[error("sprite y {0} exceeds 111")]
    SpriteY(u16),
    /// Color stack register outside 0-15
    #[error("color stack entry {0} out of range 0-15")]
    ColorStackEntry(u8),
    /// Register block of unexpected byte length
    #[error("register block length {0}, expected 528 or 532 bytes")]
    BlockLength(usize),
}

/// How to treat unused bits on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Ignore unused bits (default)
    #[default]
    Lenient,
    /// Reject words with nonzero unused bits
    Strict,
}

const GLYPH_SHIFT: u16 = 3;
const GLYPH_MASK: u16 = 0x01FF;
const COLOR_LOW_MASK: u16 = 0x0007;
const COLOR_HIGH_BIT: u16 = 1 << 12;

const TILE_ADVANCE_BIT: u16 = 1 << 13;
const TILE_CS_RESERVED: u16 = 0xC000;

const POS_X_MASK: u16 = 0x00FF;
const POS_INTERACTION_BIT: u16 = 1 << 8;
const POS_VISIBLE_BIT: u16 = 1 << 9;
const POS_DOUBLE_WIDTH_BIT: u16 = 1 << 10;
const POS_RESERVED: u16 = 0xF800;

const Y_MASK: u16 = 0x007F;
const Y_DOUBLE_HEIGHT_BIT: u16 = 1 << 7;
const Y_SCALE_SHIFT: u16 = 8;
const Y_SCALE_MASK: u16 = 0x0003;
const Y_FLIP_H_BIT: u16 = 1 << 10;
const Y_FLIP_V_BIT: u16 = 1 << 11;
const Y_RESERVED: u16 = 0xF000;

const ATTR_PRIORITY_BIT: u16 = 1 << 13;
const ATTR_RESERVED: u16 = 0xC000;

fn check_reserved(
    word: u16,
    mask: u16,
    name: &'static str,
    policy: DecodePolicy,
) -> Result<(), MalformedWord> {
    if policy == DecodePolicy::Strict && word & mask != 0 {
        return Err(MalformedWord::ReservedBits {
            word: name,
            bits: word & mask,
        });
    }
    Ok(())
}

/// Split a 4-bit color into the low-3-bits / high-bit word fields.
fn pack_color(color: u8) -> u16 {
    let color = u16::from(color & 0x0F);
    (color & COLOR_LOW_MASK) | ((color >> 3) << 12)
}

fn unpack_color(word: u16) -> u8 {
    ((word & COLOR_LOW_MASK) | ((word & COLOR_HIGH_BIT) >> 9)) as u8
}

/// Encode one BACKTAB tile word.
///
/// Fields the mode has no room for (`background_color` in color stack mode,
/// `advance_stack` in fg/bg mode) are not represented in the word; decode
/// restores them to their defaults.
pub fn encode_tile(tile: &Tile, mode: DisplayMode) -> u16 {
    let glyph = (tile.glyph_index & GLYPH_MASK) << GLYPH_SHIFT;
    match mode {
        DisplayMode::ColorStack => {
            let mut word = pack_color(tile.foreground_color) | glyph;
            if tile.advance_stack {
                word |= TILE_ADVANCE_BIT;
            }
            word
        }
        DisplayMode::ForegroundBackground => {
            pack_color(tile.background_color)
                | glyph
                | (u16::from(tile.foreground_color & 0x07) << 13)
        }
    }
}

/// Decode one BACKTAB tile word.
///
/// Glyph indices 320-511 are accepted and preserved even though no physical
/// card backs them.
pub fn decode_tile(word: u16, mode: DisplayMode, policy: DecodePolicy) -> Result<Tile, MalformedWord> {
    let glyph_index = (word >> GLYPH_SHIFT) & GLYPH_MASK;
    match mode {
        DisplayMode::ColorStack => {
            check_reserved(word, TILE_CS_RESERVED, "tile", policy)?;
            Ok(Tile {
                glyph_index,
                foreground_color: unpack_color(word),
                background_color: 0,
                advance_stack: word & TILE_ADVANCE_BIT != 0,
            })
        }
        DisplayMode::ForegroundBackground => Ok(Tile {
            glyph_index,
            foreground_color: (word >> 13) as u8,
            background_color: unpack_color(word),
            advance_stack: false,
        }),
    }
}

/// Decoded sprite position word.
///
/// The interaction flag is not part of the sprite model; it is always
/// encoded set and surfaced here so word-level consumers can preserve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePosition {
    pub x: u16,
    pub interaction: bool,
    pub visible: bool,
    pub double_width: bool,
}

/// Decoded sprite Y word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteY {
    pub y: u16,
    pub double_height: bool,
    pub scale: u8,
    pub flip_h: bool,
    pub flip_v: bool,
}

/// Decoded sprite attribute word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteAttributes {
    pub glyph_index: u16,
    pub color: u8,
    pub priority: bool,
}

/// Size to (double-width, double-height, scale) register bits. Total: every
/// size maps to exactly one combination.
fn size_bits(size: SpriteSize) -> (bool, bool, u8) {
    match size {
        SpriteSize::Size8x8 => (false, false, 0),
        SpriteSize::Size16x8 => (true, false, 0),
        SpriteSize::Size8x16 => (false, true, 1),
        SpriteSize::Size16x16 => (true, true, 1),
    }
}

/// Register bits back to a size. Double-height and scale must move together;
/// any other pairing is not displayable and fails decode.
fn size_from_bits(
    double_width: bool,
    double_height: bool,
    scale: u8,
) -> Result<SpriteSize, MalformedWord> {
    match (double_width, double_height, scale) {
        (false, false, 0) => Ok(SpriteSize::Size8x8),
        (true, false, 0) => Ok(SpriteSize::Size16x8),
        (false, true, 1) => Ok(SpriteSize::Size8x16),
        (true, true, 1) => Ok(SpriteSize::Size16x16),
        _ => Err(MalformedWord::UnreachableSize {
            double_height,
            scale,
        }),
    }
}

/// Encode a sprite's position word. The interaction bit is always set.
pub fn encode_sprite_position(sprite: &Sprite) -> u16 {
    let (double_width, _, _) = size_bits(sprite.size);
    let mut word = (sprite.x & POS_X_MASK) | POS_INTERACTION_BIT;
    if sprite.visible {
        word |= POS_VISIBLE_BIT;
    }
    if double_width {
        word |= POS_DOUBLE_WIDTH_BIT;
    }
    word
}

pub fn decode_sprite_position(
    word: u16,
    policy: DecodePolicy,
) -> Result<SpritePosition, MalformedWord> {
    check_reserved(word, POS_RESERVED, "sprite position", policy)?;
    let x = word & POS_X_MASK;
    if x > SPRITE_X_MAX {
        return Err(MalformedWord::SpriteX(x));
    }
    Ok(SpritePosition {
        x,
        interaction: word & POS_INTERACTION_BIT != 0,
        visible: word & POS_VISIBLE_BIT != 0,
        double_width: word & POS_DOUBLE_WIDTH_BIT != 0,
    })
}

/// Encode a sprite's Y word (y position, vertical size bits, flips).
pub fn encode_sprite_y(sprite: &Sprite) -> u16 {
    let (_, double_height, scale) = size_bits(sprite.size);
    let mut word = (sprite.y & Y_MASK) | ((u16::from(scale) & Y_SCALE_MASK) << Y_SCALE_SHIFT);
    if double_height {
        word |= Y_DOUBLE_HEIGHT_BIT;
    }
    if sprite.flip_h {
        word |= Y_FLIP_H_BIT;
    }
    if sprite.flip_v {
        word |= Y_FLIP_V_BIT;
    }
    word
}

pub fn decode_sprite_y(word: u16, policy: DecodePolicy) -> Result<SpriteY, MalformedWord> {
    check_reserved(word, Y_RESERVED, "sprite y", policy)?;
    let y = word & Y_MASK;
    if y > SPRITE_Y_MAX {
        return Err(MalformedWord::SpriteY(y));
    }
    Ok(SpriteY {
        y,
        double_height: word & Y_DOUBLE_HEIGHT_BIT != 0,
        scale: ((word >> Y_SCALE_SHIFT) & Y_SCALE_MASK) as u8,
        flip_h: word & Y_FLIP_H_BIT != 0,
        flip_v: word & Y_FLIP_V_BIT != 0,
    })
}

/// Encode a sprite's attribute word (glyph, color, priority).
pub fn encode_sprite_attributes(sprite: &Sprite) -> u16 {
    let mut word =
        pack_color(sprite.color) | ((sprite.glyph_index & GLYPH_MASK) << GLYPH_SHIFT);
    if sprite.priority {
        word |= ATTR_PRIORITY_BIT;
    }
    word
}

pub fn decode_sprite_attributes(
    word: u16,
    policy: DecodePolicy,
) -> Result<SpriteAttributes, MalformedWord> {
    check_reserved(word, ATTR_RESERVED, "sprite attribute", policy)?;
    let glyph_index = (word >> GLYPH_SHIFT) & GLYPH_MASK;
    if glyph_index < GRAM_FIRST || glyph_index > GRAM_LAST {
        return Err(MalformedWord::SpriteGlyph(glyph_index));
    }
    Ok(SpriteAttributes {
        glyph_index,
        color: unpack_color(word),
        priority: word & ATTR_PRIORITY_BIT != 0,
    })
}

/// Encode one sprite slot as its three register words.
pub fn encode_sprite(sprite: &Sprite) -> [u16; SPRITE_WORDS] {
    [
        encode_sprite_position(sprite),
        encode_sprite_y(sprite),
        encode_sprite_attributes(sprite),
    ]
}

/// Decode one sprite slot from its three register words.
pub fn decode_sprite(
    words: [u16; SPRITE_WORDS],
    policy: DecodePolicy,
) -> Result<Sprite, MalformedWord> {
    let position = decode_sprite_position(words[0], policy)?;
    let y = decode_sprite_y(words[1], policy)?;
    let attributes = decode_sprite_attributes(words[2], policy)?;
    let size = size_from_bits(position.double_width, y.double_height, y.scale)?;
    Ok(Sprite {
        visible: position.visible,
        glyph_index: attributes.glyph_index,
        x: position.x,
        y: y.y,
        color: attributes.color,
        priority: attributes.priority,
        size,
        flip_h: y.flip_h,
        flip_v: y.flip_v,
    })
}

/// A figure's full register state, ready for the wire.
///
/// The color stack block is present exactly when the figure is in color
/// stack mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterImage {
    /// 240 tile words in row-major scan order
    pub backtab: [u16; GRID_TILES],
    /// 8 slots of (position, y, attribute) words
    pub sprites: [[u16; SPRITE_WORDS]; SPRITE_SLOTS],
    /// Color stack registers, color stack mode only
    pub color_stack: Option<[u8; COLOR_STACK_SIZE]>,
}

const BACKTAB_BYTES: usize = GRID_TILES * 2;
const SPRITE_TABLE_BYTES: usize = SPRITE_SLOTS * SPRITE_WORDS * 2;

impl RegisterImage {
    /// Serialize as little-endian bytes: BACKTAB, sprite table, then the
    /// color stack block when present.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BACKTAB_BYTES + SPRITE_TABLE_BYTES + 4);
        for word in self.backtab {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        for slot in self.sprites {
            for word in slot {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
        if let Some(stack) = self.color_stack {
            bytes.extend_from_slice(&stack);
        }
        bytes
    }

    /// Parse a byte block produced by [`RegisterImage::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedWord> {
        let has_stack = match bytes.len() {
            len if len == BACKTAB_BYTES + SPRITE_TABLE_BYTES => false,
            len if len == BACKTAB_BYTES + SPRITE_TABLE_BYTES + COLOR_STACK_SIZE => true,
            len => return Err(MalformedWord::BlockLength(len)),
        };

        let word_at = |i: usize| u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);

        let mut backtab = [0u16; GRID_TILES];
        for (i, word) in backtab.iter_mut().enumerate() {
            *word = word_at(i);
        }

        let mut sprites = [[0u16; SPRITE_WORDS]; SPRITE_SLOTS];
        for (slot, words) in sprites.iter_mut().enumerate() {
            for (j, word) in words.iter_mut().enumerate() {
                *word = word_at(GRID_TILES + slot * SPRITE_WORDS + j);
            }
        }

        let color_stack = if has_stack {
            let start = BACKTAB_BYTES + SPRITE_TABLE_BYTES;
            let mut stack = [0u8; COLOR_STACK_SIZE];
            stack.copy_from_slice(&bytes[start..start + COLOR_STACK_SIZE]);
            for &entry in &stack {
                if entry > 15 {
                    return Err(MalformedWord::ColorStackEntry(entry));
                }
            }
            Some(stack)
        } else {
            None
        };

        Ok(Self {
            backtab,
            sprites,
            color_stack,
        })
    }
}

/// Encode a figure's complete register state.
pub fn encode_figure(figure: &SticFigure) -> RegisterImage {
    let mode = figure.display_mode();
    let mut backtab = [0u16; GRID_TILES];
    for (word, tile) in backtab.iter_mut().zip(figure.tiles()) {
        *word = encode_tile(tile, mode);
    }
    let mut sprites = [[0u16; SPRITE_WORDS]; SPRITE_SLOTS];
    for (slot, sprite) in figure.sprites().iter().enumerate() {
        sprites[slot] = encode_sprite(sprite);
    }
    RegisterImage {
        backtab,
        sprites,
        color_stack: match mode {
            DisplayMode::ColorStack => Some(figure.color_stack()),
            DisplayMode::ForegroundBackground => None,
        },
    }
}

/// Rebuild a figure from its register state.
///
/// The display mode is implied by the presence of the color stack block.
/// The wire format does not carry the figure name; the caller supplies one.
pub fn decode_figure(
    image: &RegisterImage,
    name: impl Into<String>,
    policy: DecodePolicy,
) -> Result<SticFigure, MalformedWord> {
    let mut figure = SticFigure::new(name);
    let mode = match image.color_stack {
        Some(stack) => {
            for &entry in &stack {
                if entry > 15 {
                    return Err(MalformedWord::ColorStackEntry(entry));
                }
            }
            figure
                .set_color_stack(stack)
                .expect("stack entries checked above");
            DisplayMode::ColorStack
        }
        None => DisplayMode::ForegroundBackground,
    };
    figure
        .set_display_mode(mode)
        .expect("default tiles satisfy both modes");

    for (i, &word) in image.backtab.iter().enumerate() {
        let tile = decode_tile(word, mode, policy)?;
        figure
            .set_tile(i / GRID_COLS, i % GRID_COLS, tile)
            .expect("decoded tile fields are in range");
    }
    for (slot, &words) in image.sprites.iter().enumerate() {
        let sprite = decode_sprite(words, policy)?;
        figure
            .set_sprite(slot, sprite)
            .expect("decoded sprite fields are in range");
    }
    Ok(figure)
}
