//! Rendering module: canvas, text, icon assets and screen composition.

mod assets;
mod canvas;
mod screen;
mod text;

use std::path::PathBuf;

use inkpanel_hw::Framebuffer;
use thiserror::Error;

pub use screen::{ScreenRenderer, ScreenState};

#[cfg(test)]
pub use screen::Request;

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load font {path:?}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("Failed to load asset {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("Cannot create a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}

/// Produces finished framebuffers for the display worker.
pub trait FrameRenderer {
    /// The "Loading" screen shown while the rest of startup runs.
    fn welcome(&mut self) -> Result<Framebuffer, RenderError>;

    /// Decodes and resamples icon bitmaps.
    fn load_assets(&mut self) -> Result<(), RenderError>;

    /// Renders the screen for the given state.
    fn compose(&mut self, state: &ScreenState) -> Result<Framebuffer, RenderError>;
}
