//! The STIC figure data model
//!
//! A [`SticFigure`] is one complete screen: the 20x12 BACKTAB tile grid, the
//! 8 MOB sprites, the color stack, the border, and the display mode. All 240
//! tiles and 8 sprites exist from construction; mutation goes through
//! validating setters so that the codec and compositor never see a value
//! outside its hardware range.

use crate::coords::{GRID_COLS, GRID_ROWS, GRID_TILES, SPRITE_X_MAX, SPRITE_Y_MAX};
use crate::glyph::{GLYPH_INDEX_MAX, GRAM_FIRST, GRAM_LAST};
use crate::palette::COLOR_MAX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of MOB sprite slots
pub const SPRITE_SLOTS: usize = 8;

/// Number of color stack registers
pub const COLOR_STACK_SIZE: usize = 4;

/// Highest foreground color a tile may carry in foreground/background mode.
///
/// The FB tile word stores the foreground in 3 bits (see [`crate::codec`]),
/// so colors 8-15 are only reachable in color stack mode.
pub const FGBG_FOREGROUND_MAX: u8 = 7;

/// A settable field was given a value outside its documented domain.
///
/// Raised synchronously at the mutation site, never deferred to render or
/// encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeViolation {
    /// Color index outside 0-15
    #[error("color index {0} out of range 0-15")]
    Color(u8),
    /// Tile glyph index outside the 9-bit field
    #[error("tile glyph index {0} out of range 0-511")]
    TileGlyph(u16),
    /// Sprite glyph index outside the addressable GRAM range
    #[error("sprite glyph index {0} outside GRAM range 256-319")]
    SpriteGlyph(u16),
    /// Sprite x register outside 0-175
    #[error("sprite x {0} out of range 0-175")]
    SpriteX(u16),
    /// Sprite y register outside 0-111
    #[error("sprite y {0} out of range 0-111")]
    SpriteY(u16),
    /// Grid position outside the 20x12 BACKTAB
    #[error("tile position ({row}, {col}) outside the 20x12 grid")]
    TilePosition { row: usize, col: usize },
    /// Sprite slot outside 0-7
    #[error("sprite slot {0} out of range 0-7")]
    SpriteSlot(usize),
    /// Foreground color above 7 while in foreground/background mode
    #[error("foreground color {0} exceeds 7 in foreground/background mode")]
    FgBgForeground(u8),
}

/// Structured-form load error: bad shape or a field out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FigureError {
    #[error(transparent)]
    Range(#[from] RangeViolation),
    /// BACKTAB list was not exactly 240 entries
    #[error("expected 240 backtab entries, got {0}")]
    TileCount(usize),
    /// Sprite list was not exactly 8 entries
    #[error("expected 8 sprite entries, got {0}")]
    SpriteCount(usize),
    /// Color stack was not exactly 4 entries
    #[error("expected 4 color stack entries, got {0}")]
    ColorStackLen(usize),
    /// Two BACKTAB entries claimed the same grid cell
    #[error("duplicate backtab entry for ({0}, {1})")]
    DuplicateTile(usize, usize),
}

/// How tile background colors are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Backgrounds come from the 4-register color stack, advanced per tile
    #[serde(rename = "color_stack")]
    ColorStack,
    /// Each tile carries its own background color
    #[serde(rename = "fg_bg")]
    ForegroundBackground,
}

/// Border configuration around the 160x96 playfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub visible: bool,
    pub color: u8,
    pub show_left: bool,
    pub show_top: bool,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            visible: true,
            color: 0,
            show_left: true,
            show_top: true,
        }
    }
}

/// One BACKTAB cell: a glyph reference plus color configuration.
///
/// `background_color` is meaningful only in foreground/background mode;
/// `advance_stack` only in color stack mode. Both are stored regardless so
/// that switching modes loses nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub glyph_index: u16,
    pub foreground_color: u8,
    pub background_color: u8,
    pub advance_stack: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            glyph_index: 0,
            foreground_color: 7,
            background_color: 0,
            advance_stack: false,
        }
    }
}

impl Tile {
    fn validate(&self, mode: DisplayMode) -> Result<(), RangeViolation> {
        if self.glyph_index > GLYPH_INDEX_MAX {
            return Err(RangeViolation::TileGlyph(self.glyph_index));
        }
        if self.foreground_color > COLOR_MAX {
            return Err(RangeViolation::Color(self.foreground_color));
        }
        if self.background_color > COLOR_MAX {
            return Err(RangeViolation::Color(self.background_color));
        }
        if mode == DisplayMode::ForegroundBackground && self.foreground_color > FGBG_FOREGROUND_MAX
        {
            return Err(RangeViolation::FgBgForeground(self.foreground_color));
        }
        Ok(())
    }
}

/// Pixel replication factor of a sprite, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteSize {
    #[serde(rename = "8x8")]
    Size8x8,
    #[serde(rename = "8x16")]
    Size8x16,
    #[serde(rename = "16x8")]
    Size16x8,
    #[serde(rename = "16x16")]
    Size16x16,
}

impl SpriteSize {
    /// Horizontal replication factor
    pub fn width_factor(self) -> u32 {
        match self {
            SpriteSize::Size8x8 | SpriteSize::Size8x16 => 1,
            SpriteSize::Size16x8 | SpriteSize::Size16x16 => 2,
        }
    }

    /// Vertical replication factor
    pub fn height_factor(self) -> u32 {
        match self {
            SpriteSize::Size8x8 | SpriteSize::Size16x8 => 1,
            SpriteSize::Size8x16 | SpriteSize::Size16x16 => 2,
        }
    }
}

/// One MOB. Slot index (0-7) is its identity and lives in the figure; only
/// field values change over a sprite's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub visible: bool,
    pub glyph_index: u16,
    pub x: u16,
    pub y: u16,
    pub color: u8,
    /// false = beneath the tile foreground layer, true = above it
    pub priority: bool,
    pub size: SpriteSize,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            visible: false,
            glyph_index: GRAM_FIRST,
            x: 0,
            y: 0,
            color: 7,
            priority: false,
            size: SpriteSize::Size8x8,
            flip_h: false,
            flip_v: false,
        }
    }
}

impl Sprite {
    fn validate(&self) -> Result<(), RangeViolation> {
        if self.glyph_index < GRAM_FIRST || self.glyph_index > GRAM_LAST {
            return Err(RangeViolation::SpriteGlyph(self.glyph_index));
        }
        if self.x > SPRITE_X_MAX {
            return Err(RangeViolation::SpriteX(self.x));
        }
        if self.y > SPRITE_Y_MAX {
            return Err(RangeViolation::SpriteY(self.y));
        }
        if self.color > COLOR_MAX {
            return Err(RangeViolation::Color(self.color));
        }
        Ok(())
    }
}

/// A complete STIC screen configuration.
///
/// Constructed with blank tiles, hidden sprites, and the default color stack
/// `[0, 1, 2, 3]`; never partially built. Serializes to the structured form
/// persisted by the host application, with every range re-validated on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FigureRepr", try_from = "FigureRepr")]
pub struct SticFigure {
    name: String,
    display_mode: DisplayMode,
    border: Border,
    color_stack: [u8; COLOR_STACK_SIZE],
    tiles: Vec<Tile>,
    sprites: [Sprite; SPRITE_SLOTS],
}

impl SticFigure {
    /// New figure in color stack mode with all defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_mode: DisplayMode::ColorStack,
            border: Border::default(),
            color_stack: [0, 1, 2, 3],
            tiles: vec![Tile::default(); GRID_TILES],
            sprites: [Sprite::default(); SPRITE_SLOTS],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Switch display mode.
    ///
    /// Entering foreground/background mode requires every tile's foreground
    /// color to fit the mode's 3-bit field; the switch is rejected otherwise
    /// so the figure is always encodable as-is.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), RangeViolation> {
        if mode == DisplayMode::ForegroundBackground {
            for tile in &self.tiles {
                if tile.foreground_color > FGBG_FOREGROUND_MAX {
                    return Err(RangeViolation::FgBgForeground(tile.foreground_color));
                }
            }
        }
        self.display_mode = mode;
        Ok(())
    }

    pub fn border(&self) -> Border {
        self.border
    }

    pub fn set_border(&mut self, border: Border) -> Result<(), RangeViolation> {
        if border.color > COLOR_MAX {
            return Err(RangeViolation::Color(border.color));
        }
        self.border = border;
        Ok(())
    }

    pub fn color_stack(&self) -> [u8; COLOR_STACK_SIZE] {
        self.color_stack
    }

    pub fn set_color_stack(&mut self, stack: [u8; COLOR_STACK_SIZE]) -> Result<(), RangeViolation> {
        for &color in &stack {
            if color > COLOR_MAX {
                return Err(RangeViolation::Color(color));
            }
        }
        self.color_stack = stack;
        Ok(())
    }

    /// Tile at a grid position, `None` outside the 20x12 grid.
    pub fn tile(&self, row: usize, col: usize) -> Option<&Tile> {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return None;
        }
        Some(&self.tiles[row * GRID_COLS + col])
    }

    /// All 240 tiles in row-major scan order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn set_tile(&mut self, row: usize, col: usize, tile: Tile) -> Result<(), RangeViolation> {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return Err(RangeViolation::TilePosition { row, col });
        }
        tile.validate(self.display_mode)?;
        self.tiles[row * GRID_COLS + col] = tile;
        Ok(())
    }

    /// Set every BACKTAB cell to the same tile.
    pub fn fill_tiles(&mut self, tile: Tile) -> Result<(), RangeViolation> {
        tile.validate(self.display_mode)?;
        self.tiles.fill(tile);
        Ok(())
    }

    /// Sprite in a slot, `None` for slots past 7.
    pub fn sprite(&self, slot: usize) -> Option<&Sprite> {
        self.sprites.get(slot)
    }

    /// All 8 sprites in slot order.
    pub fn sprites(&self) -> &[Sprite; SPRITE_SLOTS] {
        &self.sprites
    }

    pub fn set_sprite(&mut self, slot: usize, sprite: Sprite) -> Result<(), RangeViolation> {
        if slot >= SPRITE_SLOTS {
            return Err(RangeViolation::SpriteSlot(slot));
        }
        sprite.validate()?;
        self.sprites[slot] = sprite;
        Ok(())
    }
}

/// Serialized shape of a figure, with every tile carrying its grid position
/// explicitly.
#[derive(Serialize, Deserialize)]
struct FigureRepr {
    name: String,
    mode: DisplayMode,
    border: Border,
    color_stack: Vec<u8>,
    backtab: Vec<TileRecord>,
    sprites: Vec<Sprite>,
}

#[derive(Serialize, Deserialize)]
struct TileRecord {
    row: usize,
    col: usize,
    #[serde(flatten)]
    tile: Tile,
}

impl From<SticFigure> for FigureRepr {
    fn from(figure: SticFigure) -> Self {
        let backtab = figure
            .tiles
            .iter()
            .enumerate()
            .map(|(i, &tile)| TileRecord {
                row: i / GRID_COLS,
                col: i % GRID_COLS,
                tile,
            })
            .collect();
        FigureRepr {
            name: figure.name,
            mode: figure.display_mode,
            border: figure.border,
            color_stack: figure.color_stack.to_vec(),
            backtab,
            sprites: figure.sprites.to_vec(),
        }
    }
}

impl TryFrom<FigureRepr> for SticFigure {
    type Error = FigureError;

    fn try_from(repr: FigureRepr) -> Result<Self, FigureError> {
        let mut figure = SticFigure::new(repr.name);
        figure.set_display_mode(repr.mode)?;

        figure.set_border(repr.border)?;

        let stack: [u8; COLOR_STACK_SIZE] = repr
            .color_stack
            .as_slice()
            .try_into()
            .map_err(|_| FigureError::ColorStackLen(repr.color_stack.len()))?;
        figure.set_color_stack(stack)?;

        if repr.backtab.len() != GRID_TILES {
            return Err(FigureError::TileCount(repr.backtab.len()));
        }
        let mut seen = [false; GRID_TILES];
        for record in repr.backtab {
            figure.set_tile(record.row, record.col, record.tile)?;
            let index = record.row * GRID_COLS + record.col;
            if seen[index] {
                return Err(FigureError::DuplicateTile(record.row, record.col));
            }
            seen[index] = true;
        }

        if repr.sprites.len() != SPRITE_SLOTS {
            return Err(FigureError::SpriteCount(repr.sprites.len()));
        }
        for (slot, sprite) in repr.sprites.into_iter().enumerate() {
            figure.set_sprite(slot, sprite)?;
        }

        Ok(figure)
    }
}
