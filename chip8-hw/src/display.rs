//! Monochrome display surface.
use std::fmt::{self, Write as FmtWrite};

use crate::constants::*;

/// Screen buffer that sprites are drawn to.
///
/// Stored row-major, one `bool` per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Display {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.pixels.iter().filter(|px| **px).count();
        f.debug_struct("Display").field("lit", &lit).finish()
    }
}

impl Display {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Pixel state at the given coordinate.
    ///
    /// # Panics
    ///
    /// When the coordinate lies outside of the 64x32 surface.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)]
    }

    /// Set the pixel state at the given coordinate.
    ///
    /// # Panics
    ///
    /// When the coordinate lies outside of the 64x32 surface.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        self.pixels[Self::index(x, y)] = on;
    }

    #[inline(always)]
    fn index(x: usize, y: usize) -> usize {
        assert!(
            x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT,
            "pixel ({x}, {y}) outside of display"
        );
        x + y * DISPLAY_WIDTH
    }

    /// Row-major pixel buffer, for renderers.
    pub fn buffer(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            for px in row {
                if *px {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}
