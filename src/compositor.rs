//! Deterministic figure rendering
//!
//! Renders a [`SticFigure`] plus a [`GlyphSource`] into an RGBA buffer with
//! the STIC's fixed layering: border, tile backgrounds, background sprites,
//! tile foregrounds, foreground sprites. Rendering is total - a missing
//! glyph draws blank instead of failing, and pixels outside the buffer are
//! clipped, never an error.

use crate::color_stack;
use crate::coords::{
    grid_to_world, sprite_world_to_device, world_to_grid, BORDER_SIZE, GRID_COLS, SCREEN_HEIGHT,
    SCREEN_WIDTH, TILE_SIZE,
};
use crate::figure::{DisplayMode, Sprite, SticFigure};
use crate::glyph::{glyph_bit, GlyphSource};
use crate::palette::Palette;
use image::{Rgba, RgbaImage};

/// Render a figure at device resolution (176x112).
pub fn render(figure: &SticFigure, glyphs: &impl GlyphSource, palette: &Palette) -> RgbaImage {
    render_scaled(figure, glyphs, palette, 1)
}

/// Render a figure at an integer zoom (the host editor previews at 3x).
///
/// Every render call allocates its own buffer and reads its inputs by
/// shared reference, so concurrent renders of different figures are safe.
/// Unpainted pixels (suppressed border edges, hidden border) stay
/// transparent.
pub fn render_scaled(
    figure: &SticFigure,
    glyphs: &impl GlyphSource,
    palette: &Palette,
    scale: u32,
) -> RgbaImage {
    let scale = scale.max(1);
    let mut image = RgbaImage::new(SCREEN_WIDTH * scale, SCREEN_HEIGHT * scale);

    paint_border(&mut image, figure, palette, scale);
    paint_tile_backgrounds(&mut image, figure, palette, scale);
    paint_sprites(&mut image, figure, glyphs, palette, scale, false);
    paint_tile_foregrounds(&mut image, figure, glyphs, palette, scale);
    paint_sprites(&mut image, figure, glyphs, palette, scale, true);

    image
}

/// Fill the device block for one world pixel.
fn fill_world_pixel(image: &mut RgbaImage, x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    for dy in y * scale..(y + 1) * scale {
        for dx in x * scale..(x + 1) * scale {
            image.put_pixel(dx, dy, color);
        }
    }
}

/// Pass 1: the border region. Left and top strips can be suppressed; the
/// right and bottom strips always paint while the border is visible.
fn paint_border(image: &mut RgbaImage, figure: &SticFigure, palette: &Palette, scale: u32) {
    let border = figure.border();
    if !border.visible {
        return;
    }
    let color = palette.color(border.color);
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            if world_to_grid(x, y).is_some() {
                continue;
            }
            if x < BORDER_SIZE && !border.show_left {
                continue;
            }
            if y < BORDER_SIZE && !border.show_top {
                continue;
            }
            fill_world_pixel(image, x, y, scale, color);
        }
    }
}

/// Pass 2: every tile's background, from the color stack resolver or the
/// tile's own background color depending on mode.
fn paint_tile_backgrounds(
    image: &mut RgbaImage,
    figure: &SticFigure,
    palette: &Palette,
    scale: u32,
) {
    let backgrounds: Vec<u8> = match figure.display_mode() {
        DisplayMode::ColorStack => color_stack::resolve(figure.tiles(), figure.color_stack()),
        DisplayMode::ForegroundBackground => figure
            .tiles()
            .iter()
            .map(|tile| tile.background_color)
            .collect(),
    };
    for (i, &background) in backgrounds.iter().enumerate() {
        let (wx, wy) = grid_to_world(i / GRID_COLS, i % GRID_COLS);
        let color = palette.color(background);
        for py in 0..TILE_SIZE {
            for px in 0..TILE_SIZE {
                fill_world_pixel(image, wx + px, wy + py, scale, color);
            }
        }
    }
}

/// Pass 4: every tile's ink pixels over whatever is painted beneath.
fn paint_tile_foregrounds(
    image: &mut RgbaImage,
    figure: &SticFigure,
    glyphs: &impl GlyphSource,
    palette: &Palette,
    scale: u32,
) {
    for (i, tile) in figure.tiles().iter().enumerate() {
        let Some(glyph) = glyphs.glyph(tile.glyph_index) else {
            // No card at this index: blank, not an error
            continue;
        };
        let (wx, wy) = grid_to_world(i / GRID_COLS, i % GRID_COLS);
        let color = palette.color(tile.foreground_color);
        for row in 0..8 {
            for col in 0..8 {
                if glyph_bit(&glyph, row, col) {
                    fill_world_pixel(image, wx + col as u32, wy + row as u32, scale, color);
                }
            }
        }
    }
}

/// Passes 3 and 5: sprites of one priority class in ascending slot order,
/// so a higher slot overwrites a lower one where their ink overlaps.
fn paint_sprites(
    image: &mut RgbaImage,
    figure: &SticFigure,
    glyphs: &impl GlyphSource,
    palette: &Palette,
    scale: u32,
    priority: bool,
) {
    for sprite in figure.sprites() {
        if sprite.visible && sprite.priority == priority {
            paint_sprite(image, sprite, glyphs, palette, scale);
        }
    }
}

fn paint_sprite(
    image: &mut RgbaImage,
    sprite: &Sprite,
    glyphs: &impl GlyphSource,
    palette: &Palette,
    scale: u32,
) {
    let Some(glyph) = glyphs.glyph(sprite.glyph_index) else {
        // Missing glyph substitutes an all-background bitmap: nothing to draw
        return;
    };
    let width_factor = sprite.size.width_factor() * scale;
    let height_factor = sprite.size.height_factor() * scale;
    let (origin_x, origin_y) = sprite_world_to_device(sprite.x, sprite.y, scale);
    let color = palette.color(sprite.color);

    for sy in 0..8u32 {
        // Flips mirror the source bit indices, not the destination
        let src_row = (if sprite.flip_v { 7 - sy } else { sy }) as usize;
        for sx in 0..8u32 {
            let src_col = (if sprite.flip_h { 7 - sx } else { sx }) as usize;
            if !glyph_bit(&glyph, src_row, src_col) {
                // Background pixels are transparent
                continue;
            }
            let block_x = origin_x + sx * width_factor;
            let block_y = origin_y + sy * height_factor;
            for dy in block_y..block_y + height_factor {
                for dx in block_x..block_x + width_factor {
                    if dx < image.width() && dy < image.height() {
                        image.put_pixel(dx, dy, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Border, SpriteSize, Tile};
    use crate::glyph::{Glyph, NoGlyphs};
    use std::collections::HashMap;

    const SOLID: Glyph = [0xFF; 8];

    fn glyphs_with(entries: &[(u16, Glyph)]) -> HashMap<u16, Glyph> {
        entries.iter().copied().collect()
    }

    fn visible_sprite(glyph_index: u16, x: u16, y: u16) -> Sprite {
        Sprite {
            visible: true,
            glyph_index,
            x,
            y,
            color: 13,
            priority: false,
            size: SpriteSize::Size8x8,
            flip_h: false,
            flip_v: false,
        }
    }

    #[test]
    fn test_render_dimensions() {
        let figure = SticFigure::new("f");
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);
        assert_eq!((image.width(), image.height()), (176, 112));
        let zoomed = render_scaled(&figure, &NoGlyphs, &palette, 3);
        assert_eq!((zoomed.width(), zoomed.height()), (528, 336));
    }

    #[test]
    fn test_border_and_playfield_backgrounds() {
        let mut figure = SticFigure::new("f");
        figure
            .set_border(Border {
                visible: true,
                color: 2,
                show_left: true,
                show_top: true,
            })
            .unwrap();
        figure.set_color_stack([5, 0, 0, 0]).unwrap();
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);

        assert_eq!(*image.get_pixel(0, 0), palette.color(2));
        assert_eq!(*image.get_pixel(175, 111), palette.color(2));
        // Playfield pixels come from color stack slot 0
        assert_eq!(*image.get_pixel(8, 8), palette.color(5));
        assert_eq!(*image.get_pixel(167, 103), palette.color(5));
    }

    #[test]
    fn test_border_edge_suppression() {
        let mut figure = SticFigure::new("f");
        figure
            .set_border(Border {
                visible: true,
                color: 2,
                show_left: false,
                show_top: false,
            })
            .unwrap();
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);

        // Suppressed edges stay unpainted
        assert_eq!(*image.get_pixel(0, 50), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(50, 0), Rgba([0, 0, 0, 0]));
        // Right and bottom strips always paint
        assert_eq!(*image.get_pixel(175, 50), palette.color(2));
        assert_eq!(*image.get_pixel(50, 111), palette.color(2));
    }

    #[test]
    fn test_hidden_border() {
        let mut figure = SticFigure::new("f");
        figure
            .set_border(Border {
                visible: false,
                color: 2,
                show_left: true,
                show_top: true,
            })
            .unwrap();
        let image = render(&figure, &NoGlyphs, &Palette::default());
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_fgbg_mode_uses_tile_background() {
        let mut figure = SticFigure::new("f");
        figure
            .set_display_mode(DisplayMode::ForegroundBackground)
            .unwrap();
        figure
            .set_tile(
                0,
                0,
                Tile {
                    background_color: 10,
                    ..Tile::default()
                },
            )
            .unwrap();
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);
        assert_eq!(*image.get_pixel(8, 8), palette.color(10));
        // Neighbor tile keeps its own (default) background
        assert_eq!(*image.get_pixel(16, 8), palette.color(0));
    }

    #[test]
    fn test_color_stack_advance_changes_later_tiles() {
        let mut figure = SticFigure::new("f");
        figure.set_color_stack([1, 3, 0, 5]).unwrap();
        figure
            .set_tile(
                0,
                3,
                Tile {
                    advance_stack: true,
                    ..Tile::default()
                },
            )
            .unwrap();
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);
        // Tile (0,3) itself still slot 0; tile (0,4) sees the advanced stack
        assert_eq!(*image.get_pixel(8 + 3 * 8, 8), palette.color(1));
        assert_eq!(*image.get_pixel(8 + 4 * 8, 8), palette.color(3));
    }

    #[test]
    fn test_tile_foreground_over_background() {
        let mut figure = SticFigure::new("f");
        figure
            .set_tile(
                0,
                0,
                Tile {
                    glyph_index: 1,
                    foreground_color: 2,
                    ..Tile::default()
                },
            )
            .unwrap();
        let glyphs = glyphs_with(&[(1, [0x80, 0, 0, 0, 0, 0, 0, 0])]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        // Ink pixel at the tile's top-left, background next to it
        assert_eq!(*image.get_pixel(8, 8), palette.color(2));
        assert_eq!(*image.get_pixel(9, 8), palette.color(0));
    }

    #[test]
    fn test_background_sprite_hides_under_tile_ink() {
        let mut figure = SticFigure::new("f");
        figure
            .set_tile(
                1,
                1,
                Tile {
                    glyph_index: 1,
                    foreground_color: 2,
                    ..Tile::default()
                },
            )
            .unwrap();
        // Sprite covering tile (1,1): register x 15 maps to device 16
        figure.set_sprite(0, visible_sprite(300, 15, 16)).unwrap();
        let glyphs = glyphs_with(&[(1, SOLID), (300, SOLID)]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        // Tile ink (pass 4) covers the background sprite (pass 3)
        assert_eq!(*image.get_pixel(16, 16), palette.color(2));
    }

    #[test]
    fn test_foreground_sprite_covers_tile_ink() {
        let mut figure = SticFigure::new("f");
        figure
            .set_tile(
                1,
                1,
                Tile {
                    glyph_index: 1,
                    foreground_color: 2,
                    ..Tile::default()
                },
            )
            .unwrap();
        let mut sprite = visible_sprite(300, 15, 16);
        sprite.priority = true;
        figure.set_sprite(0, sprite).unwrap();
        let glyphs = glyphs_with(&[(1, SOLID), (300, SOLID)]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(16, 16), palette.color(13));
    }

    #[test]
    fn test_sprite_transparency_leaves_destination() {
        let mut figure = SticFigure::new("f");
        figure.set_color_stack([5, 0, 0, 0]).unwrap();
        // Only the top-left sprite pixel is ink
        figure.set_sprite(0, visible_sprite(300, 15, 16)).unwrap();
        let glyphs = glyphs_with(&[(300, [0x80, 0, 0, 0, 0, 0, 0, 0])]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(16, 16), palette.color(13));
        // Everything else under the sprite keeps the tile background
        assert_eq!(*image.get_pixel(17, 16), palette.color(5));
        assert_eq!(*image.get_pixel(16, 17), palette.color(5));
    }

    #[test]
    fn test_overlapping_sprites_higher_slot_wins() {
        let mut figure = SticFigure::new("f");
        let mut first = visible_sprite(300, 40, 40);
        first.priority = true;
        first.color = 2;
        let mut second = visible_sprite(300, 40, 40);
        second.priority = true;
        second.color = 6;
        figure.set_sprite(0, first).unwrap();
        figure.set_sprite(1, second).unwrap();
        let glyphs = glyphs_with(&[(300, SOLID)]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(41, 40), palette.color(6));
    }

    #[test]
    fn test_sprite_x_register_alignment() {
        // Register x 7 puts the sprite's left column on tile column 0
        let mut figure = SticFigure::new("f");
        figure.set_sprite(0, visible_sprite(300, 7, 8)).unwrap();
        let glyphs = glyphs_with(&[(300, [0x80; 8])]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(8, 8), palette.color(13));
        assert_ne!(*image.get_pixel(7, 8), palette.color(13));
    }

    #[test]
    fn test_sprite_flips_mirror_source_bits() {
        let mut figure = SticFigure::new("f");
        let mut sprite = visible_sprite(300, 39, 40);
        sprite.flip_h = true;
        figure.set_sprite(0, sprite).unwrap();
        // Ink only in the top-left source pixel; flipped it lands at the right edge
        let glyphs = glyphs_with(&[(300, [0x80, 0, 0, 0, 0, 0, 0, 0])]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(40 + 7, 40), palette.color(13));
        assert_ne!(*image.get_pixel(40, 40), palette.color(13));

        let mut sprite = visible_sprite(300, 39, 40);
        sprite.flip_v = true;
        figure.set_sprite(0, sprite).unwrap();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(40, 40 + 7), palette.color(13));
    }

    #[test]
    fn test_sprite_size_replication() {
        let mut figure = SticFigure::new("f");
        let mut sprite = visible_sprite(300, 39, 40);
        sprite.size = SpriteSize::Size16x16;
        figure.set_sprite(0, sprite).unwrap();
        let glyphs = glyphs_with(&[(300, [0x80, 0, 0, 0, 0, 0, 0, 0])]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        // One source pixel becomes a 2x2 device block
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(*image.get_pixel(40 + dx, 40 + dy), palette.color(13));
        }
        assert_ne!(*image.get_pixel(42, 40), palette.color(13));
    }

    #[test]
    fn test_sprite_clipped_at_buffer_edge() {
        let mut figure = SticFigure::new("f");
        figure.set_sprite(0, visible_sprite(300, 175, 111)).unwrap();
        let glyphs = glyphs_with(&[(300, SOLID)]);
        // Off-buffer pixels are dropped silently; must not panic
        let image = render(&figure, &glyphs, &Palette::default());
        assert_eq!((image.width(), image.height()), (176, 112));
    }

    #[test]
    fn test_invisible_sprite_skipped() {
        let mut figure = SticFigure::new("f");
        let mut sprite = visible_sprite(300, 40, 40);
        sprite.visible = false;
        figure.set_sprite(0, sprite).unwrap();
        let glyphs = glyphs_with(&[(300, SOLID)]);
        let palette = Palette::default();
        let image = render(&figure, &glyphs, &palette);
        assert_eq!(*image.get_pixel(41, 40), palette.color(0));
    }

    #[test]
    fn test_missing_glyph_renders_blank() {
        let mut figure = SticFigure::new("f");
        figure.set_sprite(0, visible_sprite(300, 40, 40)).unwrap();
        figure
            .set_tile(
                0,
                0,
                Tile {
                    glyph_index: 400,
                    ..Tile::default()
                },
            )
            .unwrap();
        let palette = Palette::default();
        let image = render(&figure, &NoGlyphs, &palette);
        // Tile cell shows only its background; sprite draws nothing
        assert_eq!(*image.get_pixel(8, 8), palette.color(0));
        assert_eq!(*image.get_pixel(41, 40), palette.color(0));
    }

    #[test]
    fn test_scaled_render_replicates_blocks() {
        let mut figure = SticFigure::new("f");
        figure
            .set_tile(
                0,
                0,
                Tile {
                    glyph_index: 1,
                    foreground_color: 2,
                    ..Tile::default()
                },
            )
            .unwrap();
        let glyphs = glyphs_with(&[(1, [0x80, 0, 0, 0, 0, 0, 0, 0])]);
        let palette = Palette::default();
        let image = render_scaled(&figure, &glyphs, &palette, 3);
        // World pixel (8,8) becomes the 3x3 block at (24,24)
        for dy in 24..27 {
            for dx in 24..27 {
                assert_eq!(*image.get_pixel(dx, dy), palette.color(2));
            }
        }
        assert_eq!(*image.get_pixel(27, 24), palette.color(0));
    }
}
