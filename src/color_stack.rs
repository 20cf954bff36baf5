//! Color stack background resolution
//!
//! In color stack mode a tile has no background color of its own. The STIC
//! keeps a pointer into the 4 color stack registers; every tile's background
//! is the register under the pointer, and a tile with the advance flag set
//! rotates the pointer after it is scanned. The pointer runs across the
//! whole grid in scan order and never resets mid-screen, so one edited flag
//! changes the background of every tile after it.

use crate::coords::GRID_TILES;
use crate::figure::{Tile, COLOR_STACK_SIZE};

/// Resolve the background color of all 240 tiles in scan order.
///
/// Pure fold: same tiles and stack always produce the same output. Re-run
/// whenever any tile's advance flag or the stack contents change. Only
/// meaningful in color stack mode; in fg/bg mode every tile carries its own
/// background color and this function is bypassed.
pub fn resolve(tiles: &[Tile], color_stack: [u8; COLOR_STACK_SIZE]) -> Vec<u8> {
    debug_assert_eq!(tiles.len(), GRID_TILES);
    let mut pointer = 0usize;
    tiles
        .iter()
        .map(|tile| {
            let color = color_stack[pointer];
            if tile.advance_stack {
                pointer = (pointer + 1) % COLOR_STACK_SIZE;
            }
            color
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advancing_tile() -> Tile {
        Tile {
            advance_stack: true,
            ..Tile::default()
        }
    }

    #[test]
    fn test_no_advance_holds_slot_zero() {
        let tiles = vec![Tile::default(); GRID_TILES];
        let colors = resolve(&tiles, [9, 1, 2, 3]);
        assert!(colors.iter().all(|&c| c == 9));
        assert_eq!(colors.len(), 240);
    }

    #[test]
    fn test_advance_takes_effect_after_the_flagged_tile() {
        // Stack [1,3,0,5]; tiles 0-2 plain, tile 3 advances.
        let mut tiles = vec![Tile::default(); GRID_TILES];
        tiles[3] = advancing_tile();
        let colors = resolve(&tiles, [1, 3, 0, 5]);
        assert_eq!(&colors[0..4], &[1, 1, 1, 1]);
        assert_eq!(colors[4], 3);
    }

    #[test]
    fn test_pointer_wraps_modulo_four() {
        let mut tiles = vec![Tile::default(); GRID_TILES];
        for i in 0..5 {
            tiles[i] = advancing_tile();
        }
        let colors = resolve(&tiles, [1, 3, 0, 5]);
        assert_eq!(&colors[0..6], &[1, 3, 0, 5, 1, 3]);
    }

    #[test]
    fn test_pointer_persists_across_rows() {
        // Advance on the last tile of row 0 changes row 1's first tile.
        let mut tiles = vec![Tile::default(); GRID_TILES];
        tiles[19] = advancing_tile();
        let colors = resolve(&tiles, [1, 3, 0, 5]);
        assert_eq!(colors[19], 1);
        assert_eq!(colors[20], 3);
        assert_eq!(colors[239], 3);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let mut tiles = vec![Tile::default(); GRID_TILES];
        for i in (0..GRID_TILES).step_by(7) {
            tiles[i] = advancing_tile();
        }
        let first = resolve(&tiles, [4, 8, 12, 2]);
        let second = resolve(&tiles, [4, 8, 12, 2]);
        assert_eq!(first, second);
    }
}
