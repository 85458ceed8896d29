//! 1-bit packed framebuffer in native panel scan order.

use crate::{Orientation, PanelGeometry};

/// Two-level draw color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Packed byte for eight pixels of this color.
    pub fn fill_byte(&self) -> u8 {
        match self {
            Color::White => 0xFF,
            Color::Black => 0x00,
        }
    }

    /// 8-bit grey level of this color.
    pub fn luma(&self) -> u8 {
        match self {
            Color::White => 0xFF,
            Color::Black => 0x00,
        }
    }
}

/// Monochrome framebuffer. Rows are padded to whole bytes, MSB is the
/// leftmost pixel, a set bit is white.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    data: Vec<u8>,
    width: u16,
    height: u16,
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Framebuffer {
    /// Creates a white framebuffer with the given native dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self::filled(width, height, Color::White)
    }

    /// Creates a framebuffer sized for the given panel.
    pub fn for_geometry(geometry: &PanelGeometry) -> Self {
        Self::new(geometry.width, geometry.height)
    }

    /// Creates a framebuffer of a single color.
    pub fn filled(width: u16, height: u16, color: Color) -> Self {
        let len = (width as usize).div_ceil(8) * height as usize;
        Self {
            data: vec![color.fill_byte(); len],
            width,
            height,
        }
    }

    /// Returns the width of the framebuffer.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height of the framebuffer.
    pub fn height(&self) -> u16 {
        self.height
    }

    fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Returns the packed pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fills the framebuffer with a solid color.
    pub fn fill(&mut self, color: Color) {
        self.data.fill(color.fill_byte());
    }

    /// Sets a pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.bytes_per_row() + x as usize / 8;
        let mask = 0x80u8 >> (x % 8);
        match color {
            Color::White => self.data[idx] |= mask,
            Color::Black => self.data[idx] &= !mask,
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.bytes_per_row() + x as usize / 8;
        let mask = 0x80u8 >> (x % 8);
        if self.data[idx] & mask != 0 {
            Some(Color::White)
        } else {
            Some(Color::Black)
        }
    }

    /// Returns true if every visible pixel has the given color.
    pub fn is_uniform(&self, color: Color) -> bool {
        (0..self.height).all(|y| (0..self.width).all(|x| self.get_pixel(x, y) == Some(color)))
    }

    /// Expands to one grey byte per pixel in logical orientation, row-major.
    ///
    /// Returns the logical (width, height) alongside the pixels.
    pub fn to_gray8(&self, orientation: Orientation) -> (u16, u16, Vec<u8>) {
        let (width, height) = orientation.logical_dimensions(self.width, self.height);
        let mut gray = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let (nx, ny) = orientation.to_native(x, y, self.width, self.height);
                gray.push(self.get_pixel(nx, ny).unwrap_or_default().luma());
            }
        }
        (width, height, gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_white() {
        let fb = Framebuffer::new(122, 250);
        assert_eq!(fb.data().len(), 16 * 250);
        assert!(fb.data().iter().all(|&b| b == 0xFF));
        assert!(fb.is_uniform(Color::White));
    }

    #[test]
    fn test_pixel_packing() {
        let mut fb = Framebuffer::new(122, 250);
        fb.set_pixel(0, 0, Color::Black);
        assert_eq!(fb.data()[0], 0x7F);

        fb.set_pixel(9, 1, Color::Black);
        assert_eq!(fb.data()[16 + 1], 0xBF);
        assert_eq!(fb.get_pixel(9, 1), Some(Color::Black));

        fb.set_pixel(9, 1, Color::White);
        assert_eq!(fb.get_pixel(9, 1), Some(Color::White));

        // Padding bits past column 121 are never touched.
        fb.set_pixel(122, 0, Color::Black);
        assert_eq!(fb.data()[15], 0xFF);
        assert_eq!(fb.get_pixel(122, 0), None);
    }

    #[test]
    fn test_fill() {
        let mut fb = Framebuffer::new(16, 2);
        fb.fill(Color::Black);
        assert!(fb.is_uniform(Color::Black));
        fb.fill(Color::White);
        assert!(fb.is_uniform(Color::White));
    }

    #[test]
    fn test_gray8_in_logical_orientation() {
        let mut fb = Framebuffer::new(122, 250);
        // Logical (0, 0) under a 90 degree mounting is native (121, 0).
        fb.set_pixel(121, 0, Color::Black);

        let (w, h, gray) = fb.to_gray8(Orientation::Rotate90);
        assert_eq!((w, h), (250, 122));
        assert_eq!(gray.len(), 250 * 122);
        assert_eq!(gray[0], 0x00);
        assert_eq!(gray[1], 0xFF);

        let (w, h, gray) = fb.to_gray8(Orientation::Native);
        assert_eq!((w, h), (122, 250));
        assert_eq!(gray[121], 0x00);
    }
}
