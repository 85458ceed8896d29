//! Mounting orientation support.
//!
//! The panel controller only scans in its native portrait direction. Any other
//! mounting is handled by mapping logical drawing coordinates onto native
//! framebuffer coordinates once, when a finished canvas is converted.

use crate::{Error, Result};
use std::str::FromStr;

/// Rotation of the logical drawing space relative to the native panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Native portrait scan order.
    Native,
    /// Landscape, rotated 90° clockwise. Standard HAT mounting.
    #[default]
    Rotate90,
    /// Portrait upside-down.
    Rotate180,
    /// Landscape, rotated 90° counter-clockwise.
    Rotate270,
}

impl Orientation {
    /// Returns true if the logical space swaps width and height.
    pub fn is_landscape(&self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }

    /// Returns the logical drawing dimensions for a panel of the given native size.
    pub fn logical_dimensions(&self, native_width: u16, native_height: u16) -> (u16, u16) {
        if self.is_landscape() {
            (native_height, native_width)
        } else {
            (native_width, native_height)
        }
    }

    /// Maps a logical pixel to the native framebuffer pixel.
    ///
    /// `x` and `y` must lie inside [`Orientation::logical_dimensions`].
    pub fn to_native(&self, x: u16, y: u16, native_width: u16, native_height: u16) -> (u16, u16) {
        match self {
            Orientation::Native => (x, y),
            Orientation::Rotate90 => (native_width - 1 - y, x),
            Orientation::Rotate180 => (native_width - 1 - x, native_height - 1 - y),
            Orientation::Rotate270 => (y, native_height - 1 - x),
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "native" | "rotate-0" | "portrait" => Ok(Orientation::Native),
            "rotate-90" | "rotate_90" | "landscape" => Ok(Orientation::Rotate90),
            "rotate-180" | "rotate_180" => Ok(Orientation::Rotate180),
            "rotate-270" | "rotate_270" => Ok(Orientation::Rotate270),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Native => write!(f, "native"),
            Orientation::Rotate90 => write!(f, "rotate-90"),
            Orientation::Rotate180 => write!(f, "rotate-180"),
            Orientation::Rotate270 => write!(f, "rotate-270"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_dimensions() {
        assert_eq!(Orientation::Rotate90.logical_dimensions(122, 250), (250, 122));
        assert_eq!(Orientation::Native.logical_dimensions(122, 250), (122, 250));
        assert_eq!(Orientation::Rotate270.logical_dimensions(122, 250), (250, 122));
    }

    #[test]
    fn test_rotate_90_corners() {
        let o = Orientation::Rotate90;
        // Logical top-left lands on the native top-right.
        assert_eq!(o.to_native(0, 0, 122, 250), (121, 0));
        assert_eq!(o.to_native(249, 0, 122, 250), (121, 249));
        assert_eq!(o.to_native(0, 121, 122, 250), (0, 0));
        assert_eq!(o.to_native(249, 121, 122, 250), (0, 249));
    }

    #[test]
    fn test_mapping_is_bijective() {
        for o in [
            Orientation::Native,
            Orientation::Rotate90,
            Orientation::Rotate180,
            Orientation::Rotate270,
        ] {
            let (lw, lh) = o.logical_dimensions(122, 250);
            let mut seen = vec![false; 122 * 250];
            for y in 0..lh {
                for x in 0..lw {
                    let (nx, ny) = o.to_native(x, y, 122, 250);
                    let idx = ny as usize * 122 + nx as usize;
                    assert!(!seen[idx], "{} maps two pixels onto ({}, {})", o, nx, ny);
                    seen[idx] = true;
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "rotate-90".parse::<Orientation>().unwrap(),
            Orientation::Rotate90
        );
        assert_eq!(
            "landscape".parse::<Orientation>().unwrap(),
            Orientation::Rotate90
        );
        assert_eq!(
            "rotate-180".parse::<Orientation>().unwrap(),
            Orientation::Rotate180
        );
        assert!("sideways".parse::<Orientation>().is_err());
    }
}
