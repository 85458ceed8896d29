//! Text rendering using fontdue.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings, Metrics};
use inkpanel_hw::Color;
use tiny_skia::Pixmap;

use super::RenderError;

/// Ink bounding box of a glyph run, relative to the pen origin on the
/// baseline. Y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextExtent {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// A glyph placed relative to the pen origin.
struct PlacedGlyph {
    ch: char,
    left: i32,
    top: i32,
    metrics: Metrics,
}

/// Text renderer over a font loaded from disk.
pub struct TextRenderer {
    font: Font,
    path: PathBuf,
}

impl TextRenderer {
    /// Loads a TrueType/OpenType font file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|e| RenderError::FontLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let font =
            Font::from_bytes(data, FontSettings::default()).map_err(|e| RenderError::FontLoad {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { font, path })
    }

    /// Path the font was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn layout(&self, text: &str, size: f32) -> Vec<PlacedGlyph> {
        let mut pen = 0.0f32;
        let mut glyphs = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let metrics = self.font.metrics(ch, size);
            glyphs.push(PlacedGlyph {
                ch,
                left: pen.round() as i32 + metrics.xmin,
                top: -(metrics.ymin + metrics.height as i32),
                metrics,
            });
            pen += metrics.advance_width;
        }
        glyphs
    }

    /// Measures the ink box of `text`. Returns `None` if nothing would be drawn.
    pub fn measure(&self, text: &str, size: f32) -> Option<TextExtent> {
        self.layout(text, size)
            .iter()
            .filter(|g| g.metrics.width > 0 && g.metrics.height > 0)
            .fold(None, |extent: Option<TextExtent>, g| {
                let right = g.left + g.metrics.width as i32;
                let bottom = g.top + g.metrics.height as i32;
                Some(match extent {
                    None => TextExtent {
                        min_x: g.left,
                        min_y: g.top,
                        max_x: right,
                        max_y: bottom,
                    },
                    Some(e) => TextExtent {
                        min_x: e.min_x.min(g.left),
                        min_y: e.min_y.min(g.top),
                        max_x: e.max_x.max(right),
                        max_y: e.max_y.max(bottom),
                    },
                })
            })
    }

    /// Draws `text` so that the point `(anchor_x, anchor_y)` of its ink box,
    /// given as fractions of the box, lands on `(x, y)`.
    ///
    /// Returns the drawn box in pixmap coordinates.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_anchored(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        y: f32,
        anchor_x: f32,
        anchor_y: f32,
        size: f32,
        color: Color,
    ) -> Option<TextExtent> {
        let extent = self.measure(text, size)?;
        let origin_x =
            (x - extent.min_x as f32 - anchor_x * extent.width() as f32).round() as i32;
        let origin_y =
            (y - extent.min_y as f32 - anchor_y * extent.height() as f32).round() as i32;

        let ink = color.luma() as f32;
        let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);

        for glyph in self.layout(text, size) {
            if glyph.metrics.width == 0 || glyph.metrics.height == 0 {
                continue;
            }
            let (metrics, bitmap) = self.font.rasterize(glyph.ch, size);
            let data = pixmap.data_mut();

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = origin_x + glyph.left + gx as i32;
                    let py = origin_y + glyph.top + gy as i32;
                    if px < 0 || py < 0 || px >= width || py >= height {
                        continue;
                    }
                    let idx = (py * width + px) as usize * 4;

                    // Alpha blend the glyph
                    let alpha = coverage as f32 / 255.0;
                    let inv_alpha = 1.0 - alpha;
                    for channel in &mut data[idx..idx + 3] {
                        *channel = (ink * alpha + *channel as f32 * inv_alpha) as u8;
                    }
                    data[idx + 3] = 255;
                }
            }
        }

        Some(TextExtent {
            min_x: origin_x + extent.min_x,
            min_y: origin_y + extent.min_y,
            max_x: origin_x + extent.max_x,
            max_y: origin_y + extent.max_y,
        })
    }
}

/// Font bundled with the crate for tests.
#[cfg(test)]
pub(crate) fn test_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts/DejaVuSansMono.ttf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_is_load_error() {
        let result = TextRenderer::load("/nonexistent/font.ttf");
        assert!(matches!(result, Err(RenderError::FontLoad { .. })));
    }

    #[test]
    fn test_garbage_font_is_load_error() {
        let path = std::env::temp_dir().join("inkpanel-not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let result = TextRenderer::load(&path);
        assert!(matches!(result, Err(RenderError::FontLoad { .. })));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_measure() {
        let renderer = TextRenderer::load(test_font()).unwrap();
        let extent = renderer.measure("Loading", 18.0).unwrap();
        assert!(extent.width() > 0);
        assert!(extent.height() > 0);
        // Ink sits above the baseline apart from descenders.
        assert!(extent.min_y < 0);
        assert!(renderer.measure("   ", 18.0).is_none());
    }

    #[test]
    fn test_centered_text_ink_box() {
        let renderer = TextRenderer::load(test_font()).unwrap();
        let mut pixmap = Pixmap::new(250, 122).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);

        renderer
            .draw_anchored(&mut pixmap, "Loading", 125.0, 61.0, 0.5, 0.5, 18.0, Color::Black)
            .unwrap();

        // Bounding box of every non-white pixel
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for (i, pixel) in pixmap.pixels().iter().enumerate() {
            if pixel.red() < 255 {
                let (x, y) = ((i % 250) as i32, (i / 250) as i32);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x + 1);
                max_y = max_y.max(y + 1);
            }
        }
        let center_x = (min_x + max_x) as f32 / 2.0;
        let center_y = (min_y + max_y) as f32 / 2.0;
        assert!((center_x - 125.0).abs() <= 1.0, "center x {}", center_x);
        assert!((center_y - 61.0).abs() <= 1.0, "center y {}", center_y);
    }
}
