//! Screen geometry and coordinate mapping
//!
//! Three coordinate systems are in play:
//! - Grid: (row, col) addressing of the 20x12 BACKTAB
//! - World: pixel coordinates over the full device area, border included
//! - Device: pixel coordinates in the render buffer (world times an
//!   integer zoom factor)

/// BACKTAB columns
pub const GRID_COLS: usize = 20;
/// BACKTAB rows
pub const GRID_ROWS: usize = 12;
/// Total BACKTAB entries
pub const GRID_TILES: usize = GRID_COLS * GRID_ROWS;

/// Card edge length in pixels
pub const TILE_SIZE: u32 = 8;
/// Border thickness in pixels on every edge
pub const BORDER_SIZE: u32 = 8;

/// Playfield width (20 cards of 8 pixels)
pub const PLAYFIELD_WIDTH: u32 = GRID_COLS as u32 * TILE_SIZE;
/// Playfield height (12 cards of 8 pixels)
pub const PLAYFIELD_HEIGHT: u32 = GRID_ROWS as u32 * TILE_SIZE;

/// Full device width, border included
pub const SCREEN_WIDTH: u32 = PLAYFIELD_WIDTH + 2 * BORDER_SIZE;
/// Full device height, border included
pub const SCREEN_HEIGHT: u32 = PLAYFIELD_HEIGHT + 2 * BORDER_SIZE;

/// Largest valid sprite x register value
pub const SPRITE_X_MAX: u16 = SCREEN_WIDTH as u16 - 1;
/// Largest valid sprite y register value
pub const SPRITE_Y_MAX: u16 = SCREEN_HEIGHT as u16 - 1;

/// World pixel of a grid cell's top-left corner.
///
/// Column 0 starts just right of the 8-pixel border, so
/// `grid_to_world(0, 0) == (8, 8)`.
pub fn grid_to_world(row: usize, col: usize) -> (u32, u32) {
    (
        BORDER_SIZE + col as u32 * TILE_SIZE,
        BORDER_SIZE + row as u32 * TILE_SIZE,
    )
}

/// Grid cell containing a world pixel, or `None` for border/off-grid pixels.
///
/// Only defined over the 160x96 playfield; the surrounding border has no
/// cell. Range validation of world coordinates belongs to the figure
/// boundary, not here.
pub fn world_to_grid(x: u32, y: u32) -> Option<(usize, usize)> {
    if x < BORDER_SIZE || y < BORDER_SIZE {
        return None;
    }
    let col = (x - BORDER_SIZE) / TILE_SIZE;
    let row = (y - BORDER_SIZE) / TILE_SIZE;
    if col >= GRID_COLS as u32 || row >= GRID_ROWS as u32 {
        return None;
    }
    Some((row as usize, col as usize))
}

/// Device origin of a sprite, given its x/y registers and the render zoom.
///
/// Sprite x registers sit one unit to the left of the tile grid's x origin:
/// a register value of 7 lines the sprite up with tile column 0 (device
/// x = 8). The correction is applied before the zoom multiply. The y
/// register has no such offset.
pub fn sprite_world_to_device(x: u16, y: u16, scale: u32) -> (u32, u32) {
    ((u32::from(x) + 1) * scale, u32::from(y) * scale)
}
