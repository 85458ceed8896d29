//! Canvas for composing a frame before it is sent to the panel.

use inkpanel_hw::{Color, Framebuffer, Orientation};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use super::assets::Asset;
use super::text::{TextExtent, TextRenderer};
use super::RenderError;

/// Luminance at or above this level becomes a white panel pixel.
const WHITE_THRESHOLD: u32 = 128;

/// Drawing surface in logical (mounted) coordinates.
///
/// The mounting transform is fixed when the canvas is created and applied
/// only when the finished canvas is converted to a [`Framebuffer`].
pub struct Canvas {
    pixmap: Pixmap,
    orientation: Orientation,
    native_width: u16,
    native_height: u16,
    color: Color,
}

impl Canvas {
    /// Creates a white canvas for a panel of the given native size.
    pub fn new(
        orientation: Orientation,
        native_width: u16,
        native_height: u16,
    ) -> Result<Self, RenderError> {
        let (width, height) = orientation.logical_dimensions(native_width, native_height);
        let pixmap = Pixmap::new(width as u32, height as u32).ok_or(RenderError::Canvas {
            width: width as u32,
            height: height as u32,
        })?;

        let mut canvas = Self {
            pixmap,
            orientation,
            native_width,
            native_height,
            color: Color::Black,
        };
        canvas.clear();
        Ok(canvas)
    }

    /// Returns the logical canvas dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Sets the color used by subsequent text drawing.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Fills the canvas with white.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::WHITE);
    }

    /// Draws text anchored at `(x, y)`; see [`TextRenderer::draw_anchored`].
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        font: &TextRenderer,
        text: &str,
        x: f32,
        y: f32,
        anchor_x: f32,
        anchor_y: f32,
        size: f32,
    ) -> Option<TextExtent> {
        font.draw_anchored(
            &mut self.pixmap,
            text,
            x,
            y,
            anchor_x,
            anchor_y,
            size,
            self.color,
        )
    }

    /// Composites an asset centred on its anchor.
    pub fn draw_asset(&mut self, asset: &Asset) {
        let pixmap = asset.pixmap();
        let left = (asset.anchor().x - pixmap.width() as f64 / 2.0).round() as i32;
        let top = (asset.anchor().y - pixmap.height() as f64 / 2.0).round() as i32;
        self.pixmap.draw_pixmap(
            left,
            top,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Luminance-thresholded color of a logical pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let pixel = self.pixmap.pixel(x, y)?;
        // Premultiplied; un-blended coverage over transparent reads as white.
        let alpha = pixel.alpha() as u32;
        let luma = (pixel.red() as u32 * 299 + pixel.green() as u32 * 587 + pixel.blue() as u32 * 114)
            / 1000
            + (255 - alpha);
        if luma >= WHITE_THRESHOLD {
            Some(Color::White)
        } else {
            Some(Color::Black)
        }
    }

    /// Converts the canvas to a native panel framebuffer.
    pub fn to_framebuffer(&self) -> Framebuffer {
        let mut fb = Framebuffer::new(self.native_width, self.native_height);
        let (width, height) = self.dimensions();
        for y in 0..height {
            for x in 0..width {
                if self.pixel(x, y) == Some(Color::Black) {
                    let (nx, ny) = self.orientation.to_native(
                        x as u16,
                        y as u16,
                        self.native_width,
                        self.native_height,
                    );
                    fb.set_pixel(nx, ny, Color::Black);
                }
            }
        }
        fb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::assets::Coordinates;

    #[test]
    fn test_canvas_is_landscape_and_white() {
        let canvas = Canvas::new(Orientation::Rotate90, 122, 250).unwrap();
        assert_eq!(canvas.dimensions(), (250, 122));
        assert!(canvas.to_framebuffer().is_uniform(Color::White));
    }

    #[test]
    fn test_framebuffer_mapping() {
        let mut canvas = Canvas::new(Orientation::Rotate90, 122, 250).unwrap();
        // A black 1x1 asset at logical (10, 3).
        let mut dot = Pixmap::new(1, 1).unwrap();
        dot.fill(tiny_skia::Color::BLACK);
        let asset = Asset::from_pixmap(dot, Coordinates::new(10.5, 3.5));
        canvas.draw_asset(&asset);
        assert_eq!(canvas.pixel(10, 3), Some(Color::Black));

        let fb = canvas.to_framebuffer();
        // logical (x, y) -> native (width - 1 - y, x)
        assert_eq!(fb.get_pixel(122 - 1 - 3, 10), Some(Color::Black));
        assert_eq!(fb.get_pixel(122 - 1 - 10, 3), Some(Color::White));
    }

    #[test]
    fn test_threshold() {
        let mut canvas = Canvas::new(Orientation::Native, 16, 16).unwrap();
        let mut grey = Pixmap::new(2, 1).unwrap();
        grey.pixels_mut()[0] = tiny_skia::ColorU8::from_rgba(100, 100, 100, 255).premultiply();
        grey.pixels_mut()[1] = tiny_skia::ColorU8::from_rgba(200, 200, 200, 255).premultiply();
        canvas.draw_asset(&Asset::from_pixmap(grey, Coordinates::new(1.0, 0.5)));
        assert_eq!(canvas.pixel(0, 0), Some(Color::Black));
        assert_eq!(canvas.pixel(1, 0), Some(Color::White));
    }

    #[test]
    fn test_clear_resets() {
        let mut canvas = Canvas::new(Orientation::Rotate90, 122, 250).unwrap();
        let mut block = Pixmap::new(20, 20).unwrap();
        block.fill(tiny_skia::Color::BLACK);
        canvas.draw_asset(&Asset::from_pixmap(block, Coordinates::new(125.0, 61.0)));
        assert!(!canvas.to_framebuffer().is_uniform(Color::White));
        canvas.clear();
        assert!(canvas.to_framebuffer().is_uniform(Color::White));
    }
}
