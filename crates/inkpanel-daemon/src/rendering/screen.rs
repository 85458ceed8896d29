//! Screen layout: what the worker shows and how it is drawn.

use inkpanel_hw::{Color, Framebuffer, Orientation, PanelGeometry};
use tracing::debug;

use super::assets::Assets;
use super::canvas::Canvas;
use super::text::TextRenderer;
use super::{FrameRenderer, RenderError};
use crate::config::{AssetsConfig, FontConfig};
use crate::events::{Event, Track};
use crate::status::{ConnectionStatus, StatusIcon};

/// Status line text anchor (right edge, vertical centre).
const STATUS_LABEL_X: f32 = 230.0;
const STATUS_LABEL_Y: f32 = 10.0;

/// Vertical gap between the track title and artist lines.
const TRACK_LINE_GAP: f32 = 14.0;

const WELCOME_TEXT: &str = "Loading";

/// Last user request seen by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Record,
    Play,
}

/// Everything the display worker currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenState {
    pub recording: bool,
    pub thinking: bool,
    pub track: Option<Track>,
    pub request: Option<Request>,
    pub connection: ConnectionStatus,
}

impl ScreenState {
    /// Folds an event into the state.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::RecordRequested => self.request = Some(Request::Record),
            Event::PlayRequested => self.request = Some(Request::Play),
            Event::FetchCompleted(track) => {
                self.track = Some(track.clone());
                self.thinking = false;
            }
            Event::DisplayRecordState(on) => self.recording = *on,
            Event::DisplayThinkingState(on) => self.thinking = *on,
        }
    }

    /// Headline for the centre of the screen, if any.
    fn headline(&self) -> Option<&'static str> {
        if self.recording {
            Some("Recording")
        } else if self.thinking {
            Some("Thinking")
        } else if self.track.is_some() {
            None
        } else {
            match self.request {
                Some(Request::Record) => Some("Listening"),
                Some(Request::Play) => Some("Playing"),
                None => None,
            }
        }
    }
}

/// Renders screens onto a canvas mounted in the configured orientation.
pub struct ScreenRenderer {
    canvas: Canvas,
    font: TextRenderer,
    fonts: FontConfig,
    assets_config: AssetsConfig,
    assets: Option<Assets>,
}

impl ScreenRenderer {
    /// Creates the canvas and loads the font. A missing font is fatal.
    pub fn new(
        geometry: &PanelGeometry,
        orientation: Orientation,
        fonts: &FontConfig,
        assets: &AssetsConfig,
    ) -> Result<Self, RenderError> {
        let canvas = Canvas::new(orientation, geometry.width, geometry.height)?;
        let font = TextRenderer::load(&fonts.path)?;
        debug!("Font loaded from {:?}", font.path());
        Ok(Self {
            canvas,
            font,
            fonts: fonts.clone(),
            assets_config: assets.clone(),
            assets: None,
        })
    }

    fn center(&self) -> (f32, f32) {
        let (width, height) = self.canvas.dimensions();
        (width as f32 / 2.0, height as f32 / 2.0)
    }

    fn draw_status(&mut self, status: &ConnectionStatus) {
        self.canvas.set_color(Color::Black);
        self.canvas.draw_text(
            &self.font,
            &status.label,
            STATUS_LABEL_X,
            STATUS_LABEL_Y,
            1.0,
            0.5,
            self.fonts.status_size,
        );
        if let Some(assets) = &self.assets {
            let icon = match status.icon() {
                StatusIcon::WifiOn => &assets.wifi_on,
                StatusIcon::WifiOff => &assets.wifi_off,
            };
            self.canvas.draw_asset(icon);
        }
    }

    fn draw_body(&mut self, state: &ScreenState) {
        let (cx, cy) = self.center();
        self.canvas.set_color(Color::Black);

        if let Some(headline) = state.headline() {
            self.canvas
                .draw_text(&self.font, headline, cx, cy, 0.5, 0.5, self.fonts.title_size);
        } else if let Some(track) = &state.track {
            self.canvas.draw_text(
                &self.font,
                &track.title,
                cx,
                cy - TRACK_LINE_GAP / 2.0,
                0.5,
                1.0,
                self.fonts.title_size,
            );
            self.canvas.draw_text(
                &self.font,
                &track.artist,
                cx,
                cy + TRACK_LINE_GAP / 2.0,
                0.5,
                0.0,
                self.fonts.status_size,
            );
        }
    }
}

impl FrameRenderer for ScreenRenderer {
    fn welcome(&mut self) -> Result<Framebuffer, RenderError> {
        let (cx, cy) = self.center();
        self.canvas.clear();
        self.canvas.set_color(Color::Black);
        self.canvas
            .draw_text(&self.font, WELCOME_TEXT, cx, cy, 0.5, 0.5, self.fonts.title_size);
        let frame = self.canvas.to_framebuffer();
        self.canvas.clear();
        Ok(frame)
    }

    fn load_assets(&mut self) -> Result<(), RenderError> {
        self.assets = Some(Assets::load(&self.assets_config)?);
        Ok(())
    }

    fn compose(&mut self, state: &ScreenState) -> Result<Framebuffer, RenderError> {
        self.canvas.clear();
        self.draw_status(&state.connection);
        self.draw_body(state);
        Ok(self.canvas.to_framebuffer())
    }
}
