//! Icon bitmaps loaded once at startup.

use std::path::Path;

use image::imageops::FilterType;
use tiny_skia::{ColorU8, Pixmap};
use tracing::debug;

use super::RenderError;
use crate::config::{AssetConfig, AssetsConfig};

/// A named anchor point in logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A decoded, resampled bitmap and the point its centre is drawn at.
pub struct Asset {
    pixmap: Pixmap,
    anchor: Coordinates,
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("anchor", &self.anchor)
            .finish()
    }
}

/// Target size for a `width` x `height` image scaled by `scale`.
///
/// Width is `round(width * scale)`; height keeps the aspect ratio.
fn scaled_size(width: u32, height: u32, scale: f64) -> Option<(u32, u32)> {
    let new_width = (width as f64 * scale).round();
    if !new_width.is_finite() || new_width < 1.0 || new_width > u32::MAX as f64 {
        return None;
    }
    let new_height = (height as f64 * new_width / width as f64).round().max(1.0);
    Some((new_width as u32, new_height as u32))
}

impl Asset {
    /// Decodes an image and resamples it with a Lanczos filter.
    pub fn load<P: AsRef<Path>>(
        path: P,
        scale: f64,
        anchor: Coordinates,
    ) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let load_error = |reason: String| RenderError::AssetLoad {
            path: path.to_path_buf(),
            reason,
        };

        let decoded = image::open(path).map_err(|e| load_error(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        let (new_width, new_height) = scaled_size(width, height, scale)
            .ok_or_else(|| load_error(format!("scale {} leaves no pixels", scale)))?;

        let resized =
            image::imageops::resize(&decoded.to_rgba8(), new_width, new_height, FilterType::Lanczos3);

        let mut pixmap = Pixmap::new(new_width, new_height).ok_or_else(|| {
            load_error(format!("cannot allocate {}x{}", new_width, new_height))
        })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(resized.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        debug!(
            "Loaded asset {:?}: {}x{} -> {}x{}",
            path, width, height, new_width, new_height
        );
        Ok(Self { pixmap, anchor })
    }

    /// Wraps an already rendered pixmap.
    #[cfg(test)]
    pub fn from_pixmap(pixmap: Pixmap, anchor: Coordinates) -> Self {
        Self { pixmap, anchor }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn anchor(&self) -> Coordinates {
        self.anchor
    }
}

/// The icon set used by the status line.
#[derive(Debug)]
pub struct Assets {
    pub wifi_on: Asset,
    pub wifi_off: Asset,
}

impl Assets {
    pub fn load(config: &AssetsConfig) -> Result<Self, RenderError> {
        Ok(Self {
            wifi_on: load_configured(&config.wifi_on)?,
            wifi_off: load_configured(&config.wifi_off)?,
        })
    }
}

fn load_configured(config: &AssetConfig) -> Result<Asset, RenderError> {
    Asset::load(
        &config.path,
        config.scale,
        Coordinates::new(config.x, config.y),
    )
}

/// Writes an opaque test image and returns its path.
#[cfg(test)]
pub(crate) fn write_test_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("inkpanel-{}-{}.png", name, std::process::id()));
    image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
        .save(&path)
        .unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled_size(100, 50, 0.5), Some((50, 25)));
        assert_eq!(scaled_size(640, 480, 0.04), Some((26, 20)));
        assert_eq!(scaled_size(3, 1000, 0.5), Some((2, 667)));
        assert_eq!(scaled_size(10, 10, 0.01), None);
        assert_eq!(scaled_size(10, 10, f64::NAN), None);
    }

    #[test]
    fn test_load_resamples_and_keeps_anchor() {
        let path = write_test_png("asset-load", 400, 200);
        let anchor = Coordinates::new(240.0, 10.0);

        let first = Asset::load(&path, 0.25, anchor).unwrap();
        assert_eq!((first.pixmap().width(), first.pixmap().height()), (100, 50));
        assert_eq!(first.anchor(), anchor);

        // Loading again gives the same result.
        let second = Asset::load(&path, 0.25, anchor).unwrap();
        assert_eq!((second.pixmap().width(), second.pixmap().height()), (100, 50));
        assert_eq!(first.pixmap().data(), second.pixmap().data());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_asset_is_load_error() {
        let result = Asset::load("/nonexistent/icon.png", 1.0, Coordinates::new(0.0, 0.0));
        assert!(matches!(result, Err(RenderError::AssetLoad { .. })));
    }

    #[test]
    fn test_zero_scale_is_load_error() {
        let path = write_test_png("asset-zero", 10, 10);
        let result = Asset::load(&path, 0.0, Coordinates::new(0.0, 0.0));
        assert!(matches!(result, Err(RenderError::AssetLoad { .. })));
        let _ = std::fs::remove_file(path);
    }
}
