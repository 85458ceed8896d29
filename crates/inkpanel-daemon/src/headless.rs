//! Panel stand-in that writes each frame to a PNG file.
//!
//! Used when no panel is wired up, e.g. when developing layouts on a
//! desktop machine.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use inkpanel_hw::{
    Color, Error, Framebuffer, Orientation, Panel, PanelGeometry, PanelState, RefreshMode, Result,
};
use tracing::{debug, info};

pub struct HeadlessPanel {
    geometry: PanelGeometry,
    orientation: Orientation,
    path: PathBuf,
    state: PanelState,
    frames: u64,
}

impl HeadlessPanel {
    pub fn new(geometry: PanelGeometry, orientation: Orientation, path: PathBuf) -> Self {
        info!("Running headless, frames go to {:?}", path);
        Self {
            geometry,
            orientation,
            path,
            state: PanelState::Uninitialized,
            frames: 0,
        }
    }

    /// Number of frames written so far.
    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn write_snapshot(&mut self, frame: &Framebuffer) -> Result<()> {
        let (width, height, gray) = frame.to_gray8(self.orientation);
        encode_png(&self.path, width as u32, height as u32, &gray)
            .map_err(|e| Error::Transmission(format!("snapshot {:?}: {}", self.path, e)))?;
        self.frames += 1;
        debug!("Snapshot {} written", self.frames);
        Ok(())
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        match self.state {
            PanelState::Idle => Ok(()),
            state => Err(Error::InvalidState { operation, state }),
        }
    }
}

fn encode_png(path: &Path, width: u32, height: u32, gray: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(gray)?;
    writer.finish()?;
    Ok(())
}

impl Panel for HeadlessPanel {
    fn dimensions(&self) -> (u16, u16) {
        (self.geometry.width, self.geometry.height)
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn initialize(&mut self, mode: RefreshMode) -> Result<()> {
        if self.state == PanelState::Released {
            return Err(Error::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }
        debug!("Headless panel initialized ({} refresh)", mode);
        self.state = PanelState::Idle;
        Ok(())
    }

    fn draw(&mut self, frame: &Framebuffer) -> Result<()> {
        self.require_idle("draw")?;
        if frame.width() != self.geometry.width || frame.height() != self.geometry.height {
            return Err(Error::FramebufferSize {
                expected: self.geometry.buffer_len(),
                actual: frame.data().len(),
            });
        }
        self.write_snapshot(frame)
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.require_idle("clear")?;
        let frame = Framebuffer::filled(self.geometry.width, self.geometry.height, color);
        self.write_snapshot(&frame)
    }

    fn sleep(&mut self) -> Result<()> {
        if self.state != PanelState::Sleeping {
            self.require_idle("sleep")?;
            self.state = PanelState::Sleeping;
        }
        Ok(())
    }

    fn wake(&mut self) -> Result<()> {
        match self.state {
            PanelState::Sleeping | PanelState::Idle => {
                self.state = PanelState::Idle;
                Ok(())
            }
            state => Err(Error::InvalidState {
                operation: "wake",
                state,
            }),
        }
    }

    fn teardown(&mut self) -> Result<()> {
        self.state = PanelState::Released;
        Ok(())
    }
}
