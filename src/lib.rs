//! Sticworks - Intellivision STIC screen composition model
//!
//! This library provides functionality to:
//! - Model a full STIC screen (20x12 BACKTAB, 8 MOB sprites, color stack,
//!   border) as a validated value type
//! - Render a screen deterministically to an RGBA pixel buffer
//! - Encode and decode the chip's bit-packed register words, with both
//!   lenient and strict decode modes
//!
//! Glyph bitmaps (GROM/GRAM cards) and the RGBA palette are supplied by the
//! caller; the core only reads them.

pub mod codec;
pub mod color_stack;
pub mod compositor;
pub mod coords;
pub mod figure;
pub mod glyph;
pub mod palette;
